//! Text functions

use super::{arg, text_arg};
use crate::error::RuntimeFault;
use crate::registry::{FunctionSpec, RegistryBuilder};
use crate::runtime::ExecContext;
use crate::types::{ProgType, TypeSet};
use crate::value::Value;

const CATEGORY: &str = "text";

pub(super) fn register_text_functions(registry: &mut RegistryBuilder) {
    registry
        .register(
            FunctionSpec::native("concat", CATEGORY, ProgType::Text, builtin_concat)
                .param("first", TypeSet::TEXT, "")
                .param("second", TypeSet::TEXT, "")
                .help("Joins two pieces of text"),
        )
        .register(
            FunctionSpec::native("concat", CATEGORY, ProgType::Text, builtin_concat)
                .param("first", TypeSet::NUMBER, "")
                .param("second", TypeSet::NUMBER, "")
                .help("Joins two numbers as text, so concat(1, 2) is \"12\""),
        )
        .register(
            FunctionSpec::native("length", CATEGORY, ProgType::Number, builtin_length)
                .param("text", TypeSet::TEXT, "")
                .help("Number of characters in the text"),
        )
        .register(
            FunctionSpec::native("upper", CATEGORY, ProgType::Text, builtin_upper)
                .param("text", TypeSet::TEXT, "")
                .help("The text in upper case"),
        )
        .register(
            FunctionSpec::native("lower", CATEGORY, ProgType::Text, builtin_lower)
                .param("text", TypeSet::TEXT, "")
                .help("The text in lower case"),
        )
        .register(
            FunctionSpec::native("contains", CATEGORY, ProgType::Boolean, builtin_contains)
                .param("text", TypeSet::TEXT, "Text to search")
                .param("fragment", TypeSet::TEXT, "Text to look for")
                .help("True when the fragment appears in the text"),
        )
        .register(
            FunctionSpec::native("tostring", CATEGORY, ProgType::Text, builtin_tostring)
                .param("value", TypeSet::ANYTHING, "")
                .help("The value rendered as text"),
        )
        .register(
            FunctionSpec::native("tonumber", CATEGORY, ProgType::Number, builtin_tonumber)
                .param("text", TypeSet::TEXT, "")
                .help("Parses a number; faults when the text is not one"),
        );
}

/// Render both arguments and join them
pub(super) fn builtin_concat(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let first = arg("concat", args, 0)?;
    let second = arg("concat", args, 1)?;
    Ok(Value::Text(format!("{}{}", first, second)))
}

fn builtin_length(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(text_arg("length", args, 0)?.chars().count() as f64))
}

fn builtin_upper(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::text(text_arg("upper", args, 0)?.to_uppercase()))
}

fn builtin_lower(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::text(text_arg("lower", args, 0)?.to_lowercase()))
}

fn builtin_contains(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let text = text_arg("contains", args, 0)?;
    let fragment = text_arg("contains", args, 1)?;
    Ok(Value::Boolean(text.contains(fragment)))
}

fn builtin_tostring(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Text(arg("tostring", args, 0)?.to_string()))
}

fn builtin_tonumber(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let text = text_arg("tonumber", args, 0)?;
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Value::Number(value)),
        _ => Err(RuntimeFault::function(
            "tonumber",
            format!("'{}' is not a number", text),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NativeFn;
    use crate::world::MemoryWorld;

    fn call(native: NativeFn, args: &[Value]) -> Result<Value, RuntimeFault> {
        let world = MemoryWorld::new();
        let mut ctx = ExecContext::new(&world);
        native(&mut ctx, args)
    }

    #[test]
    fn test_concat_numbers_renders_digits() {
        let result = call(builtin_concat, &[Value::Number(1.0), Value::Number(2.0)]).unwrap();
        assert_eq!(result, Value::text("12"));
    }

    #[test]
    fn test_length_counts_characters() {
        assert_eq!(call(builtin_length, &[Value::text("héllo")]).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_tonumber() {
        assert_eq!(call(builtin_tonumber, &[Value::text(" 42.5 ")]).unwrap(), Value::Number(42.5));

        let err = call(builtin_tonumber, &[Value::text("many")]).unwrap_err();
        assert_eq!(err.to_string(), "tonumber: 'many' is not a number");

        assert!(call(builtin_tonumber, &[Value::text("NaN")]).is_err());
    }
}
