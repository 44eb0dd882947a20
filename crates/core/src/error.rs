//! Core error types for the MUD workspace

#[derive(thiserror::Error, Debug)]
pub enum MudError {
    #[error("Prog error: {0}")]
    Prog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, MudError>;
