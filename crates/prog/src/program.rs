//! Compiled programs
//!
//! A [`CompiledProgram`] is immutable once built. Each invocation gets its
//! own [`VariableSpace`], so one program can be shared behind an `Arc` and
//! run by many callers at once.

use crate::error::RuntimeFault;
use crate::node::{disassemble, Statement};
use crate::runtime::{execute_sequence, ExecContext, StatementResult, VariableSpace};
use crate::types::ProgType;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry in a program's parameter signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgParameter {
    pub name: String,
    pub ty: ProgType,
}

impl ProgParameter {
    pub fn new(name: impl Into<String>, ty: ProgType) -> Self {
        Self { name: name.into(), ty }
    }
}

impl fmt::Display for ProgParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// Root of the executable tree for one prog
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    return_type: ProgType,
    parameters: Vec<ProgParameter>,
    statements: Vec<Statement>,
}

impl CompiledProgram {
    pub(crate) fn new(return_type: ProgType, parameters: Vec<ProgParameter>, statements: Vec<Statement>) -> Self {
        Self {
            return_type,
            parameters,
            statements,
        }
    }

    pub fn return_type(&self) -> ProgType {
        self.return_type
    }

    pub fn parameters(&self) -> &[ProgParameter] {
        &self.parameters
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Render the tree as indented text
    ///
    /// Two compiles of the same source render identically.
    pub fn disassemble(&self, name: &str) -> String {
        disassemble(&self.statements, name)
    }

    /// Run the program with positional arguments
    ///
    /// Void programs yield [`Value::Void`]. Any other result has exactly the
    /// declared return type.
    pub fn invoke(&self, ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
        let vars = self.bind(args)?;
        let result = self.run(ctx, vars);

        if let Err(fault) = &result {
            if fault.is_invariant_violation() {
                tracing::error!("Prog aborted by engine fault: {}", fault);
            }
        }
        result
    }

    fn bind(&self, args: &[Value]) -> Result<VariableSpace, RuntimeFault> {
        if args.len() != self.parameters.len() {
            return Err(RuntimeFault::ArgumentCount {
                expected: self.parameters.len(),
                actual: args.len(),
            });
        }

        let mut vars = VariableSpace::new();
        for (position, (parameter, value)) in self.parameters.iter().zip(args).enumerate() {
            if value.prog_type() != parameter.ty {
                return Err(RuntimeFault::ArgumentType {
                    position: position + 1,
                    name: parameter.name.clone(),
                    expected: parameter.ty,
                    actual: value.prog_type(),
                });
            }
            vars.declare(&parameter.name, value.clone());
        }
        Ok(vars)
    }

    fn run(&self, ctx: &mut ExecContext<'_>, mut vars: VariableSpace) -> Result<Value, RuntimeFault> {
        match execute_sequence(&self.statements, ctx, &mut vars)? {
            StatementResult::Return(value) if value.prog_type() == self.return_type => Ok(value),
            StatementResult::Return(value) => Err(RuntimeFault::invariant(format!(
                "prog declared {} but returned {}",
                self.return_type,
                value.prog_type()
            ))),
            StatementResult::Normal if self.return_type.is_void() => Ok(Value::Void),
            StatementResult::Normal => Err(RuntimeFault::MissingReturn(self.return_type)),
            StatementResult::Break | StatementResult::Continue => {
                Err(RuntimeFault::invariant("loop control escaped the program body"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Expr;
    use crate::world::MemoryWorld;

    fn returns_parameter() -> CompiledProgram {
        CompiledProgram::new(
            ProgType::Number,
            vec![ProgParameter::new("amount", ProgType::Number)],
            vec![Statement::Return(Some(Expr::Variable {
                name: "amount".into(),
                ty: ProgType::Number,
            }))],
        )
    }

    #[test]
    fn test_binds_parameters() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        let result = returns_parameter().invoke(&mut ctx, &[Value::Number(7.0)]).unwrap();
        assert_eq!(result, Value::Number(7.0));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        let program = returns_parameter();

        assert_eq!(
            program.invoke(&mut ctx, &[]).unwrap_err(),
            RuntimeFault::ArgumentCount { expected: 1, actual: 0 }
        );
        assert_eq!(
            program.invoke(&mut ctx, &[Value::text("seven")]).unwrap_err(),
            RuntimeFault::ArgumentType {
                position: 1,
                name: "amount".into(),
                expected: ProgType::Number,
                actual: ProgType::Text,
            }
        );
    }

    #[test]
    fn test_missing_return() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        let program = CompiledProgram::new(ProgType::Text, Vec::new(), Vec::new());
        assert_eq!(
            program.invoke(&mut ctx, &[]).unwrap_err(),
            RuntimeFault::MissingReturn(ProgType::Text)
        );

        let program = CompiledProgram::new(ProgType::Void, Vec::new(), Vec::new());
        assert_eq!(program.invoke(&mut ctx, &[]).unwrap(), Value::Void);
    }

    #[test]
    fn test_parameter_display() {
        let parameter = ProgParameter::new("actor", ProgType::Character);
        assert_eq!(parameter.to_string(), "character actor");
    }
}
