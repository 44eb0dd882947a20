//! Prog runtime
//!
//! Walks the compiled tree. Every node returns a `Result`: the `Err` side is
//! the fault channel and is propagated by each parent without inspection, so
//! a fault anywhere stops the invocation at the first failing node.

use crate::error::RuntimeFault;
use crate::node::{Expr, FunctionCall, Statement};
use crate::value::Value;
use crate::world::World;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of a statement that did not fault
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// Continue with the next statement
    Normal,
    /// Leave the innermost loop
    Break,
    /// Skip to the next iteration of the innermost loop
    Continue,
    /// Leave the program with a value
    Return(Value),
}

/// Cooperative cancellation flag shared between a host and an invocation
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-invocation execution state
///
/// Owns nothing shared with other invocations except the read-only world
/// handle and the cancellation flag.
pub struct ExecContext<'w> {
    world: &'w dyn World,
    steps: u64,
    step_budget: Option<u64>,
    cancel: Option<CancelToken>,
}

impl<'w> ExecContext<'w> {
    pub fn new(world: &'w dyn World) -> Self {
        Self {
            world,
            steps: 0,
            step_budget: None,
            cancel: None,
        }
    }

    /// Limit the number of statements and loop iterations this invocation may run
    pub fn with_step_budget(mut self, budget: Option<u64>) -> Self {
        self.step_budget = budget;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn world(&self) -> &'w dyn World {
        self.world
    }

    /// Steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Count one step and abort if the budget is spent or the host cancelled
    pub fn checkpoint(&mut self) -> Result<(), RuntimeFault> {
        self.steps += 1;

        if let Some(budget) = self.step_budget {
            if self.steps > budget {
                return Err(RuntimeFault::StepLimit(budget));
            }
        }

        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(RuntimeFault::Cancelled);
        }

        Ok(())
    }
}

/// Variables visible to a running prog
///
/// A stack of scopes. The root scope holds parameters and top-level
/// declarations; each block pushes a scope that is dropped when it exits.
#[derive(Debug, Clone)]
pub struct VariableSpace {
    scopes: Vec<HashMap<String, Value>>,
}

impl VariableSpace {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Drop the innermost scope; the root scope is never dropped
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare a variable in the innermost scope
    pub fn declare(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Overwrite the nearest visible variable with this name
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeFault> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(RuntimeFault::MissingVariable(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&Value, RuntimeFault> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| RuntimeFault::MissingVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
    }
}

impl Default for VariableSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl Expr {
    /// Evaluate this expression
    pub fn evaluate(&self, ctx: &mut ExecContext<'_>, vars: &VariableSpace) -> Result<Value, RuntimeFault> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Variable { name, .. } => vars.get(name).cloned(),

            Expr::Call(call) => call.invoke(ctx, vars),

            Expr::And(left, right) => {
                if !left.evaluate_condition(ctx, vars)? {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(right.evaluate_condition(ctx, vars)?))
            }

            Expr::Or(left, right) => {
                if left.evaluate_condition(ctx, vars)? {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(right.evaluate_condition(ctx, vars)?))
            }

            Expr::Choose {
                condition,
                when_true,
                when_false,
            } => {
                if condition.evaluate_condition(ctx, vars)? {
                    when_true.evaluate(ctx, vars)
                } else {
                    when_false.evaluate(ctx, vars)
                }
            }

            Expr::Collection { element, items } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item.evaluate(ctx, vars)?);
                }
                Ok(Value::collection(*element, values))
            }
        }
    }

    /// Evaluate an expression the compiler typed as boolean
    pub fn evaluate_condition(&self, ctx: &mut ExecContext<'_>, vars: &VariableSpace) -> Result<bool, RuntimeFault> {
        let value = self.evaluate(ctx, vars)?;
        value.as_bool().ok_or_else(|| {
            RuntimeFault::invariant(format!(
                "condition {} produced a {} value",
                self,
                value.prog_type()
            ))
        })
    }
}

impl FunctionCall {
    /// Evaluate arguments left to right, then run the implementation
    ///
    /// The first faulting argument ends the call; later arguments and the
    /// function body never run.
    pub fn invoke(&self, ctx: &mut ExecContext<'_>, vars: &VariableSpace) -> Result<Value, RuntimeFault> {
        let mut values = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            values.push(arg.evaluate(ctx, vars)?);
        }

        let result = (self.native)(ctx, &values)?;
        if result.prog_type() != self.return_type {
            return Err(RuntimeFault::invariant(format!(
                "{} returned a {} value but is declared to return {}",
                self.name,
                result.prog_type(),
                self.return_type
            )));
        }
        Ok(result)
    }
}

impl Statement {
    /// Execute this statement
    pub fn execute(&self, ctx: &mut ExecContext<'_>, vars: &mut VariableSpace) -> Result<StatementResult, RuntimeFault> {
        match self {
            Statement::Declare { name, ty, initializer } => {
                let value = match initializer {
                    Some(init) => init.evaluate(ctx, vars)?,
                    None => Value::default_for(*ty),
                };
                vars.declare(name, value);
                Ok(StatementResult::Normal)
            }

            Statement::Assign { name, value } => {
                let value = value.evaluate(ctx, vars)?;
                vars.assign(name, value)?;
                Ok(StatementResult::Normal)
            }

            Statement::Expression(expr) => {
                expr.evaluate(ctx, vars)?;
                Ok(StatementResult::Normal)
            }

            Statement::Return(Some(expr)) => Ok(StatementResult::Return(expr.evaluate(ctx, vars)?)),

            Statement::Return(None) => Ok(StatementResult::Return(Value::Void)),

            Statement::If { branches, otherwise } => {
                for branch in branches {
                    if branch.condition.evaluate_condition(ctx, vars)? {
                        return execute_block(&branch.body, ctx, vars);
                    }
                }
                match otherwise {
                    Some(body) => execute_block(body, ctx, vars),
                    None => Ok(StatementResult::Normal),
                }
            }

            Statement::While { condition, body } => {
                loop {
                    ctx.checkpoint()?;
                    if !condition.evaluate_condition(ctx, vars)? {
                        break;
                    }
                    match execute_block(body, ctx, vars)? {
                        StatementResult::Normal | StatementResult::Continue => {}
                        StatementResult::Break => break,
                        StatementResult::Return(value) => return Ok(StatementResult::Return(value)),
                    }
                }
                Ok(StatementResult::Normal)
            }

            Statement::ForEach {
                variable,
                source,
                body,
                ..
            } => {
                let items = match source.evaluate(ctx, vars)? {
                    Value::Collection { items, .. } => items,
                    Value::Dictionary { entries, .. } => entries.into_values().collect(),
                    other => {
                        return Err(RuntimeFault::invariant(format!(
                            "foreach over a {} value",
                            other.prog_type()
                        )))
                    }
                };

                for item in items {
                    ctx.checkpoint()?;
                    vars.push_scope();
                    vars.declare(variable, item);
                    let result = execute_sequence(body, ctx, vars);
                    vars.pop_scope();

                    match result? {
                        StatementResult::Normal | StatementResult::Continue => {}
                        StatementResult::Break => break,
                        StatementResult::Return(value) => return Ok(StatementResult::Return(value)),
                    }
                }
                Ok(StatementResult::Normal)
            }

            Statement::Break => Ok(StatementResult::Break),

            Statement::Continue => Ok(StatementResult::Continue),
        }
    }
}

/// Execute statements in a fresh nested scope
pub fn execute_block(
    statements: &[Statement],
    ctx: &mut ExecContext<'_>,
    vars: &mut VariableSpace,
) -> Result<StatementResult, RuntimeFault> {
    vars.push_scope();
    let result = execute_sequence(statements, ctx, vars);
    vars.pop_scope();
    result
}

/// Execute statements in the current scope, stopping at the first
/// non-normal result
pub fn execute_sequence(
    statements: &[Statement],
    ctx: &mut ExecContext<'_>,
    vars: &mut VariableSpace,
) -> Result<StatementResult, RuntimeFault> {
    for statement in statements {
        ctx.checkpoint()?;
        match statement.execute(ctx, vars)? {
            StatementResult::Normal => {}
            other => return Ok(other),
        }
    }
    Ok(StatementResult::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Branch;
    use crate::types::ProgType;
    use crate::world::MemoryWorld;

    fn number(n: f64) -> Expr {
        Expr::Literal(Value::Number(n))
    }

    fn boolean(b: bool) -> Expr {
        Expr::Literal(Value::Boolean(b))
    }

    fn fail(_: &mut ExecContext<'_>, _: &[Value]) -> Result<Value, RuntimeFault> {
        Err(RuntimeFault::function("fail", "boom"))
    }

    #[test]
    fn test_variable_space_scoping() {
        let mut vars = VariableSpace::new();
        vars.declare("outer", Value::Number(1.0));
        vars.push_scope();
        vars.declare("inner", Value::Number(2.0));
        vars.assign("outer", Value::Number(3.0)).unwrap();
        assert!(vars.contains("inner"));
        vars.pop_scope();

        assert!(!vars.contains("inner"));
        assert_eq!(vars.get("outer").unwrap(), &Value::Number(3.0));
        assert_eq!(
            vars.get("inner"),
            Err(RuntimeFault::MissingVariable("inner".into()))
        );
    }

    #[test]
    fn test_root_scope_survives_pop() {
        let mut vars = VariableSpace::new();
        vars.declare("x", Value::Boolean(true));
        vars.pop_scope();
        assert_eq!(vars.depth(), 1);
        assert!(vars.contains("x"));
    }

    #[test]
    fn test_missing_variable_is_invariant_fault() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        let vars = VariableSpace::new();
        let expr = Expr::Variable {
            name: "ghost".into(),
            ty: ProgType::Number,
        };
        let fault = expr.evaluate(&mut ctx, &vars).unwrap_err();
        assert!(fault.is_invariant_violation());
    }

    #[test]
    fn test_and_short_circuits() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        let vars = VariableSpace::new();
        let failing = Expr::Call(FunctionCall {
            name: "fail".into(),
            args: vec![],
            return_type: ProgType::Boolean,
            native: fail,
        });
        let expr = Expr::And(Box::new(boolean(false)), Box::new(failing));
        assert_eq!(expr.evaluate(&mut ctx, &vars).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_block_discards_declarations() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        let mut vars = VariableSpace::new();
        let statement = Statement::If {
            branches: vec![Branch {
                condition: boolean(true),
                body: vec![Statement::Declare {
                    name: "temp".into(),
                    ty: ProgType::Number,
                    initializer: Some(number(4.0)),
                }],
            }],
            otherwise: None,
        };
        assert_eq!(statement.execute(&mut ctx, &mut vars).unwrap(), StatementResult::Normal);
        assert!(!vars.contains("temp"));
    }

    #[test]
    fn test_break_ends_loop_normally() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        let mut vars = VariableSpace::new();
        let statement = Statement::While {
            condition: boolean(true),
            body: vec![Statement::Break],
        };
        assert_eq!(statement.execute(&mut ctx, &mut vars).unwrap(), StatementResult::Normal);
    }

    #[test]
    fn test_return_propagates_out_of_loop() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        let mut vars = VariableSpace::new();
        let statement = Statement::While {
            condition: boolean(true),
            body: vec![Statement::Return(Some(number(9.0)))],
        };
        assert_eq!(
            statement.execute(&mut ctx, &mut vars).unwrap(),
            StatementResult::Return(Value::Number(9.0))
        );
    }

    #[test]
    fn test_step_budget_stops_runaway_loop() {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world).with_step_budget(Some(50));
        let mut vars = VariableSpace::new();
        let statement = Statement::While {
            condition: boolean(true),
            body: vec![],
        };
        assert_eq!(
            statement.execute(&mut ctx, &mut vars),
            Err(RuntimeFault::StepLimit(50))
        );
    }

    #[test]
    fn test_cancel_token_stops_loop() {
        let world = MemoryWorld::new();
        let token = CancelToken::new();
        token.cancel();
        let mut ctx = ExecContext::new(&world).with_cancel_token(token);
        let mut vars = VariableSpace::new();
        let statement = Statement::While {
            condition: boolean(true),
            body: vec![],
        };
        assert_eq!(statement.execute(&mut ctx, &mut vars), Err(RuntimeFault::Cancelled));
    }
}
