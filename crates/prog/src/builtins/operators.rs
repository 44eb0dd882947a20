//! Operators, registered under their symbols so they resolve like calls

use super::{arg, bool_arg, number_arg, text::builtin_concat};
use crate::error::RuntimeFault;
use crate::node::NativeFn;
use crate::registry::{FunctionSpec, ParamType, RegistryBuilder, ReturnType, Factory};
use crate::runtime::ExecContext;
use crate::syntax::INDEX_FUNCTION;
use crate::types::{ProgType, TypeSet};
use crate::value::Value;
use std::cmp::Ordering;

const CATEGORY: &str = "operators";

pub(super) fn register_operator_functions(registry: &mut RegistryBuilder) {
    numeric(registry, "+", builtin_add, "Adds two numbers");
    numeric(registry, "-", builtin_subtract, "Subtracts the right number from the left");
    numeric(registry, "*", builtin_multiply, "Multiplies two numbers");
    numeric(registry, "/", builtin_divide, "Divides the left number by the right");
    numeric(registry, "%", builtin_remainder, "Remainder of dividing the left number by the right");

    for (left, right) in [
        (TypeSet::TEXT, TypeSet::TEXT),
        (TypeSet::TEXT, TypeSet::NUMBER),
        (TypeSet::NUMBER, TypeSet::TEXT),
    ] {
        registry.register(
            FunctionSpec::native("+", CATEGORY, ProgType::Text, builtin_concat)
                .param("left", left, "Rendered first")
                .param("right", right, "Rendered second")
                .help("Joins the two values as text"),
        );
    }

    comparison(registry, "<", builtin_less, "True when the left value sorts before the right");
    comparison(registry, ">", builtin_greater, "True when the left value sorts after the right");
    comparison(registry, "<=", builtin_less_equal, "True unless the left value sorts after the right");
    comparison(registry, ">=", builtin_greater_equal, "True unless the left value sorts before the right");

    for (name, native, help) in [
        ("==", builtin_equal as NativeFn, "True when both values are the same"),
        ("!=", builtin_not_equal as NativeFn, "True when the values differ"),
    ] {
        registry.register(
            FunctionSpec::native(name, CATEGORY, ProgType::Boolean, native)
                .param("left", TypeSet::COLLECTION_ITEM, "")
                .param_type("right", ParamType::SameAs(0), "Must have the same type as left")
                .help(help),
        );
    }

    registry
        .register(
            FunctionSpec::native("negate", CATEGORY, ProgType::Number, builtin_negate)
                .param("value", TypeSet::NUMBER, "")
                .help("Unary minus"),
        )
        .register(
            FunctionSpec::native("not", CATEGORY, ProgType::Boolean, builtin_not)
                .param("value", TypeSet::BOOLEAN, "")
                .help("Logical negation"),
        )
        .register(
            FunctionSpec::new(INDEX_FUNCTION, CATEGORY, ReturnType::ElementOf(0), Factory::Native(builtin_index))
                .param("collection", TypeSet::ANY_COLLECTION, "")
                .param("position", TypeSet::NUMBER, "Zero-based position")
                .help("The element at a position in a collection"),
        )
        .register(
            FunctionSpec::new(INDEX_FUNCTION, CATEGORY, ReturnType::ElementOf(0), Factory::Native(builtin_index))
                .param("dictionary", TypeSet::ANY_DICTIONARY, "")
                .param("key", TypeSet::TEXT, "")
                .help("The value stored under a key in a dictionary"),
        );
}

fn numeric(registry: &mut RegistryBuilder, name: &str, native: NativeFn, help: &str) {
    registry.register(
        FunctionSpec::native(name, CATEGORY, ProgType::Number, native)
            .param("left", TypeSet::NUMBER, "")
            .param("right", TypeSet::NUMBER, "")
            .help(help),
    );
}

fn comparison(registry: &mut RegistryBuilder, name: &str, native: NativeFn, help: &str) {
    for accepts in [TypeSet::NUMBER, TypeSet::TEXT] {
        registry.register(
            FunctionSpec::native(name, CATEGORY, ProgType::Boolean, native)
                .param("left", accepts, "")
                .param("right", accepts, "")
                .help(help),
        );
    }
}

// ============================================================================
// ARITHMETIC
// ============================================================================

fn builtin_add(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("+", args, 0)? + number_arg("+", args, 1)?))
}

fn builtin_subtract(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("-", args, 0)? - number_arg("-", args, 1)?))
}

fn builtin_multiply(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(number_arg("*", args, 0)? * number_arg("*", args, 1)?))
}

fn builtin_divide(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let divisor = number_arg("/", args, 1)?;
    if divisor == 0.0 {
        return Err(RuntimeFault::function("/", "division by zero"));
    }
    Ok(Value::Number(number_arg("/", args, 0)? / divisor))
}

fn builtin_remainder(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let divisor = number_arg("%", args, 1)?;
    if divisor == 0.0 {
        return Err(RuntimeFault::function("%", "division by zero"));
    }
    Ok(Value::Number(number_arg("%", args, 0)? % divisor))
}

fn builtin_negate(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(-number_arg("negate", args, 0)?))
}

fn builtin_not(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(!bool_arg("not", args, 0)?))
}

// ============================================================================
// COMPARISON
// ============================================================================

fn compare(function: &str, args: &[Value]) -> Result<Ordering, RuntimeFault> {
    match (arg(function, args, 0)?, arg(function, args, 1)?) {
        (Value::Number(left), Value::Number(right)) => left
            .partial_cmp(right)
            .ok_or_else(|| RuntimeFault::function(function, "cannot compare a value that is not a number")),
        (Value::Text(left), Value::Text(right)) => Ok(left.cmp(right)),
        (left, right) => Err(RuntimeFault::invariant(format!(
            "{} cannot compare {} with {}",
            function,
            left.prog_type(),
            right.prog_type()
        ))),
    }
}

fn builtin_less(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(compare("<", args)? == Ordering::Less))
}

fn builtin_greater(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(compare(">", args)? == Ordering::Greater))
}

fn builtin_less_equal(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(compare("<=", args)? != Ordering::Greater))
}

fn builtin_greater_equal(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(compare(">=", args)? != Ordering::Less))
}

fn builtin_equal(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(arg("==", args, 0)? == arg("==", args, 1)?))
}

fn builtin_not_equal(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(arg("!=", args, 0)? != arg("!=", args, 1)?))
}

// ============================================================================
// INDEXING
// ============================================================================

fn builtin_index(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    match (arg(INDEX_FUNCTION, args, 0)?, arg(INDEX_FUNCTION, args, 1)?) {
        (Value::Collection { items, .. }, Value::Number(position)) => {
            let found = if position.fract() == 0.0 && *position >= 0.0 {
                items.get(*position as usize)
            } else {
                None
            };
            found.cloned().ok_or_else(|| {
                RuntimeFault::function(
                    INDEX_FUNCTION,
                    format!(
                        "index {} is out of range for a collection of {} items",
                        position,
                        items.len()
                    ),
                )
            })
        }
        (Value::Dictionary { entries, .. }, Value::Text(key)) => entries
            .get(key)
            .cloned()
            .ok_or_else(|| RuntimeFault::function(INDEX_FUNCTION, format!("no entry for key '{}'", key))),
        (target, index) => Err(RuntimeFault::invariant(format!(
            "cannot index {} with {}",
            target.prog_type(),
            index.prog_type()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementType;
    use crate::world::MemoryWorld;

    fn call(native: NativeFn, args: &[Value]) -> Result<Value, RuntimeFault> {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        native(&mut ctx, args)
    }

    #[test]
    fn test_division_by_zero_faults() {
        let err = call(builtin_divide, &[Value::Number(1.0), Value::Number(0.0)]).unwrap_err();
        assert_eq!(err, RuntimeFault::function("/", "division by zero"));
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn test_text_comparison() {
        let result = call(builtin_less, &[Value::text("apple"), Value::text("banana")]).unwrap();
        assert_eq!(result, Value::Boolean(true));
    }

    #[test]
    fn test_index_collection() {
        let list = Value::collection(
            ElementType::Number,
            vec![Value::Number(10.0), Value::Number(20.0)],
        );
        assert_eq!(
            call(builtin_index, &[list.clone(), Value::Number(1.0)]).unwrap(),
            Value::Number(20.0)
        );

        let err = call(builtin_index, &[list.clone(), Value::Number(2.0)]).unwrap_err();
        assert_eq!(err.to_string(), "[]: index 2 is out of range for a collection of 2 items");

        assert!(call(builtin_index, &[list, Value::Number(0.5)]).is_err());
    }

    #[test]
    fn test_index_dictionary_missing_key() {
        let dict = Value::dictionary(ElementType::Text, Default::default());
        let err = call(builtin_index, &[dict, Value::text("gold")]).unwrap_err();
        assert_eq!(err.to_string(), "[]: no entry for key 'gold'");
    }
}
