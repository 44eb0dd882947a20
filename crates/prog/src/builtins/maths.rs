//! Numeric functions

use super::number_arg;
use crate::error::RuntimeFault;
use crate::node::NativeFn;
use crate::registry::{FunctionSpec, RegistryBuilder};
use crate::runtime::ExecContext;
use crate::types::{ProgType, TypeSet};
use crate::value::Value;
use rand::Rng;

const CATEGORY: &str = "maths";

pub(super) fn register_math_functions(registry: &mut RegistryBuilder) {
    unary(registry, "abs", builtin_abs, "Absolute value");
    unary(registry, "round", builtin_round, "Nearest whole number, halves rounded away from zero");
    unary(registry, "floor", builtin_floor, "Largest whole number not above the value");
    unary(registry, "ceiling", builtin_ceiling, "Smallest whole number not below the value");

    registry
        .register(
            FunctionSpec::native("min", CATEGORY, ProgType::Number, builtin_min)
                .param("first", TypeSet::NUMBER, "")
                .param("second", TypeSet::NUMBER, "")
                .help("The smaller of two numbers"),
        )
        .register(
            FunctionSpec::native("max", CATEGORY, ProgType::Number, builtin_max)
                .param("first", TypeSet::NUMBER, "")
                .param("second", TypeSet::NUMBER, "")
                .help("The larger of two numbers"),
        )
        .register(
            FunctionSpec::native("random", CATEGORY, ProgType::Number, builtin_random)
                .param("minimum", TypeSet::NUMBER, "Lowest possible result")
                .param("maximum", TypeSet::NUMBER, "Highest possible result")
                .help("A random whole number between minimum and maximum inclusive"),
        );
}

fn unary(registry: &mut RegistryBuilder, name: &str, native: NativeFn, help: &str) {
    registry.register(
        FunctionSpec::native(name, CATEGORY, ProgType::Number, native)
            .param("value", TypeSet::NUMBER, "")
            .help(help),
    );
}

fn builtin_abs(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("abs", args, 0)?.abs()))
}

fn builtin_round(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("round", args, 0)?.round()))
}

fn builtin_floor(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("floor", args, 0)?.floor()))
}

fn builtin_ceiling(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("ceiling", args, 0)?.ceil()))
}

fn builtin_min(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("min", args, 0)?.min(number_arg("min", args, 1)?)))
}

fn builtin_max(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("max", args, 0)?.max(number_arg("max", args, 1)?)))
}

/// Largest magnitude at which every whole number is still a distinct `f64`
const RANDOM_LIMIT: f64 = 9_007_199_254_740_992.0;

fn builtin_random(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let low = number_arg("random", args, 0)?.ceil();
    let high = number_arg("random", args, 1)?.floor();

    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(RuntimeFault::function(
            "random",
            format!("no whole number lies between {} and {}", low, high),
        ));
    }

    if low < -RANDOM_LIMIT || high > RANDOM_LIMIT {
        return Err(RuntimeFault::function(
            "random",
            format!("bounds must lie between {} and {}", -RANDOM_LIMIT, RANDOM_LIMIT),
        ));
    }

    let value = rand::thread_rng().gen_range(low as i64..=high as i64);
    Ok(Value::Number(value as f64))
}
