//! Flow-control functions

use super::text_arg;
use crate::error::RuntimeFault;
use crate::node::Expr;
use crate::registry::{Factory, FunctionSpec, ParamType, RegistryBuilder, ReturnType};
use crate::runtime::ExecContext;
use crate::types::{ProgType, TypeSet};
use crate::value::Value;

const CATEGORY: &str = "flow";

pub(super) fn register_flow_functions(registry: &mut RegistryBuilder) {
    registry
        .register(
            FunctionSpec::new("ifelse", CATEGORY, ReturnType::SameAs(1), Factory::Node(build_choose))
                .param("condition", TypeSet::BOOLEAN, "")
                .param("when_true", TypeSet::ANYTHING, "Value when the condition holds")
                .param_type("when_false", ParamType::SameAs(1), "Value otherwise")
                .help("Picks one of two values; only the chosen one is evaluated"),
        )
        .register(
            FunctionSpec::native("fail", CATEGORY, ProgType::Void, builtin_fail)
                .param("message", TypeSet::TEXT, "")
                .help("Stops the prog with a runtime fault carrying the message"),
        );
}

fn build_choose(args: Vec<Expr>, _return_type: ProgType) -> Result<Expr, String> {
    let [condition, when_true, when_false]: [Expr; 3] = args
        .try_into()
        .map_err(|args: Vec<Expr>| format!("ifelse takes 3 arguments, not {}", args.len()))?;

    Ok(Expr::Choose {
        condition: Box::new(condition),
        when_true: Box::new(when_true),
        when_false: Box::new(when_false),
    })
}

fn builtin_fail(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Err(RuntimeFault::function("fail", text_arg("fail", args, 0)?))
}
