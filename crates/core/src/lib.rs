//! MUD Core - Shared identifiers and errors

mod error;
mod types;

pub use error::*;
pub use types::*;
