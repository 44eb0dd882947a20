//! Error types for the prog engine

use crate::types::ProgType;
use mud_core::MudError;

/// A compile diagnostic
///
/// `line` is 1-based. Line 0 refers to the parameter signature rather than
/// to the source text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Compile error at line {line}: {message}")]
pub struct CompileError {
    pub line: usize,
    pub message: String,
}

impl CompileError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A fault raised while a compiled program runs
///
/// Faults are ordinary return values. Every node checks for them and hands
/// them to its parent untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeFault {
    /// A built-in function rejected its operands
    #[error("{function}: {message}")]
    Function { function: String, message: String },

    /// Invocation supplied the wrong number of arguments
    #[error("Expected {expected} arguments but got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// Invocation supplied an argument of the wrong type
    #[error("Argument {position} ({name}) should be {expected} but was {actual}")]
    ArgumentType {
        position: usize,
        name: String,
        expected: ProgType,
        actual: ProgType,
    },

    /// The invocation ran out of execution steps
    #[error("Step limit of {0} exceeded")]
    StepLimit(u64),

    /// The host cancelled the invocation
    #[error("Execution cancelled")]
    Cancelled,

    /// A non-void program ran off its last statement
    #[error("Program ended without returning a {0} value")]
    MissingReturn(ProgType),

    /// A compiled variable reference found nothing in the variable space
    #[error("Variable '{0}' is missing from the variable space")]
    MissingVariable(String),

    /// Any other broken engine invariant
    #[error("Engine invariant violated: {0}")]
    Invariant(String),
}

impl RuntimeFault {
    /// Fault raised by a built-in function
    pub fn function(name: &str, message: impl Into<String>) -> Self {
        RuntimeFault::Function {
            function: name.to_string(),
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        RuntimeFault::Invariant(message.into())
    }

    /// True when the fault indicates an engine bug rather than an author mistake
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, RuntimeFault::MissingVariable(_) | RuntimeFault::Invariant(_))
    }
}

/// Umbrella error for callers that both compile and run progs
#[derive(Debug, thiserror::Error)]
pub enum ProgError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeFault),

    #[error("Load error in {path}: {message}")]
    Load { path: String, message: String },
}

impl From<ProgError> for MudError {
    fn from(err: ProgError) -> Self {
        MudError::Prog(err.to_string())
    }
}

/// Result type for prog operations
pub type Result<T> = std::result::Result<T, ProgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::new(3, "Undeclared variable 'x'");
        assert_eq!(err.to_string(), "Compile error at line 3: Undeclared variable 'x'");
    }

    #[test]
    fn test_fault_classification() {
        assert!(RuntimeFault::MissingVariable("x".into()).is_invariant_violation());
        assert!(!RuntimeFault::function("at", "index 4 is out of range").is_invariant_violation());
        assert_eq!(
            RuntimeFault::function("at", "index 4 is out of range").to_string(),
            "at: index 4 is out of range"
        );
    }

    #[test]
    fn test_into_core_error() {
        let err: MudError = ProgError::from(CompileError::new(1, "bad")).into();
        assert!(matches!(err, MudError::Prog(_)));
    }
}
