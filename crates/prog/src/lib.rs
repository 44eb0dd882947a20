//! # Prog Engine
//!
//! Statically typed scripting for MUD content. Builders write progs that
//! hooks and triggers run against the game world.
//!
//! ## Pipeline
//! - Lexer and parser turn each source line into an untyped syntax line
//! - The statement compiler type-checks lines against the function registry
//!   and builds an executable tree
//! - The runtime walks the tree with a fresh variable space per invocation
//!
//! ## Language
//!
//! Line-oriented, one statement per line:
//! - `var NAME as TYPE = EXPR`, `NAME = EXPR`, `return EXPR`
//! - `if` / `else if` / `else` / `end if`, `while` / `end while`,
//!   `foreach NAME in EXPR` / `end foreach`, `break`, `continue`
//! - Operators and named functions resolve through the same overload rules
//!
//! ## Errors
//!
//! Compile problems come back as a single [`CompileError`] with a line
//! number. Runtime problems are [`RuntimeFault`] values returned from the
//! invocation; nothing in the engine panics on bad progs.

pub mod builtins;
pub mod cache;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod program;
pub mod registry;
pub mod runtime;
pub mod syntax;
pub mod types;
pub mod value;
pub mod world;

pub use cache::{CacheStats, ProgCache};
pub use compiler::{CompileResult, CompiledStatement, StatementCompiler, VariableTypes};
pub use engine::{EngineOptions, ProgEngine};
pub use error::{CompileError, ProgError, Result, RuntimeFault};
pub use program::{CompiledProgram, ProgParameter};
pub use registry::{FunctionRegistry, FunctionSpec, HelpEntry, RegistryBuilder};
pub use runtime::{CancelToken, ExecContext};
pub use types::{ElementType, ProgType, TypeSet};
pub use value::Value;
pub use world::{MemoryWorld, World};
