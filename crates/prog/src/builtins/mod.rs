//! Standard library of built-in functions
//!
//! Every category registers its signatures into a [`RegistryBuilder`] in a
//! fixed order, so overload ties always break the same way.

mod collections;
mod flow;
mod maths;
mod operators;
mod text;
mod world;

use crate::error::RuntimeFault;
use crate::registry::RegistryBuilder;
use crate::value::Value;

/// Register all built-in functions
pub fn register_standard_library(registry: &mut RegistryBuilder) {
    operators::register_operator_functions(registry);
    maths::register_math_functions(registry);
    text::register_text_functions(registry);
    collections::register_collection_functions(registry);
    world::register_world_functions(registry);
    flow::register_flow_functions(registry);
}

// ============================================================================
// ARGUMENT ACCESS
// ============================================================================
//
// Argument types are checked when a call is compiled, so a mismatch here is
// an engine fault rather than an author mistake.

fn bad_argument(function: &str, args: &[Value], index: usize, expected: &str) -> RuntimeFault {
    let found = args
        .get(index)
        .map(|value| value.prog_type().to_string())
        .unwrap_or_else(|| "nothing".to_string());
    RuntimeFault::invariant(format!(
        "{} expected {} at argument {} but received {}",
        function,
        expected,
        index + 1,
        found
    ))
}

fn arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a Value, RuntimeFault> {
    args.get(index)
        .ok_or_else(|| bad_argument(function, args, index, "a value"))
}

fn number_arg(function: &str, args: &[Value], index: usize) -> Result<f64, RuntimeFault> {
    args.get(index)
        .and_then(Value::as_number)
        .ok_or_else(|| bad_argument(function, args, index, "a number"))
}

fn text_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a str, RuntimeFault> {
    args.get(index)
        .and_then(Value::as_text)
        .ok_or_else(|| bad_argument(function, args, index, "text"))
}

fn bool_arg(function: &str, args: &[Value], index: usize) -> Result<bool, RuntimeFault> {
    args.get(index)
        .and_then(Value::as_bool)
        .ok_or_else(|| bad_argument(function, args, index, "a boolean"))
}

#[cfg(test)]
mod tests {
    use crate::registry::FunctionRegistry;
    use crate::types::{ElementType, ProgType};

    #[test]
    fn test_standard_categories() {
        let registry = FunctionRegistry::standard();
        assert_eq!(
            registry.categories(),
            vec!["collections", "flow", "maths", "operators", "text", "world"]
        );
        assert!(registry.functions_in_category("maths").contains(&"random"));
    }

    #[test]
    fn test_overloads_share_names_across_categories() {
        let registry = FunctionRegistry::standard();

        let text = registry
            .resolve("contains", &[ProgType::Text, ProgType::Text])
            .unwrap();
        assert_eq!(text.entry.category, "text");

        let list = registry
            .resolve(
                "contains",
                &[ProgType::Collection(ElementType::Item), ProgType::Item],
            )
            .unwrap();
        assert_eq!(list.entry.category, "collections");
    }

    #[test]
    fn test_every_signature_has_help() {
        let registry = FunctionRegistry::standard();
        for category in registry.categories() {
            for name in registry.functions_in_category(category) {
                for entry in registry.describe_signatures(name) {
                    assert!(!entry.help.is_empty(), "{} has no help text", entry.signature);
                }
            }
        }
    }
}
