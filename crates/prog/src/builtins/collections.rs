//! Collection and dictionary functions
//!
//! Values are immutable: `append` and `put` return a new container, so a
//! prog updates a variable with `items = append(items, thing)`.

use super::{arg, text_arg};
use crate::error::RuntimeFault;
use crate::registry::{Factory, FunctionSpec, ParamType, RegistryBuilder, ReturnType};
use crate::runtime::ExecContext;
use crate::types::{ElementType, ProgType, TypeSet};
use crate::value::Value;
use std::collections::BTreeMap;

const CATEGORY: &str = "collections";

const ANY_CONTAINER: TypeSet = TypeSet::ANY_COLLECTION.union(TypeSet::ANY_DICTIONARY);

pub(super) fn register_collection_functions(registry: &mut RegistryBuilder) {
    registry
        .register(
            FunctionSpec::native("count", CATEGORY, ProgType::Number, builtin_count)
                .param("container", ANY_CONTAINER, "")
                .help("Number of elements in a collection or entries in a dictionary"),
        )
        .register(
            FunctionSpec::native("isempty", CATEGORY, ProgType::Boolean, builtin_is_empty)
                .param("container", ANY_CONTAINER, "")
                .help("True when the collection or dictionary holds nothing"),
        )
        .register(
            FunctionSpec::new("first", CATEGORY, ReturnType::ElementOf(0), Factory::Native(builtin_first))
                .param("collection", TypeSet::ANY_COLLECTION, "")
                .help("The first element; faults when the collection is empty"),
        )
        .register(
            FunctionSpec::new("last", CATEGORY, ReturnType::ElementOf(0), Factory::Native(builtin_last))
                .param("collection", TypeSet::ANY_COLLECTION, "")
                .help("The last element; faults when the collection is empty"),
        )
        .register(
            FunctionSpec::native("contains", CATEGORY, ProgType::Boolean, builtin_contains)
                .param("collection", TypeSet::ANY_COLLECTION, "")
                .param_type("element", ParamType::ElementOf(0), "Value to look for")
                .help("True when the collection holds the element"),
        )
        .register(
            FunctionSpec::new("append", CATEGORY, ReturnType::SameAs(0), Factory::Native(builtin_append))
                .param("collection", TypeSet::ANY_COLLECTION, "")
                .param_type("element", ParamType::ElementOf(0), "Value to add at the end")
                .help("A copy of the collection with the element added"),
        )
        .register(
            FunctionSpec::new("get", CATEGORY, ReturnType::ElementOf(0), Factory::Native(builtin_get))
                .param("dictionary", TypeSet::ANY_DICTIONARY, "")
                .param("key", TypeSet::TEXT, "")
                .help("The value under a key; faults when the key is absent"),
        )
        .register(
            FunctionSpec::native("haskey", CATEGORY, ProgType::Boolean, builtin_has_key)
                .param("dictionary", TypeSet::ANY_DICTIONARY, "")
                .param("key", TypeSet::TEXT, "")
                .help("True when the dictionary has an entry for the key"),
        )
        .register(
            FunctionSpec::native("keys", CATEGORY, ProgType::Collection(ElementType::Text), builtin_keys)
                .param("dictionary", TypeSet::ANY_DICTIONARY, "")
                .help("The dictionary's keys in sorted order"),
        )
        .register(
            FunctionSpec::new("put", CATEGORY, ReturnType::SameAs(0), Factory::Native(builtin_put))
                .param("dictionary", TypeSet::ANY_DICTIONARY, "")
                .param("key", TypeSet::TEXT, "")
                .param_type("value", ParamType::ElementOf(0), "")
                .help("A copy of the dictionary with the key set to the value"),
        );
}

fn collection_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<(ElementType, &'a [Value]), RuntimeFault> {
    match arg(function, args, index)? {
        Value::Collection { element, items } => Ok((*element, items.as_slice())),
        other => Err(RuntimeFault::invariant(format!(
            "{} expected a collection but received {}",
            function,
            other.prog_type()
        ))),
    }
}

fn dictionary_arg<'a>(
    function: &str,
    args: &'a [Value],
    index: usize,
) -> Result<(ElementType, &'a BTreeMap<String, Value>), RuntimeFault> {
    match arg(function, args, index)? {
        Value::Dictionary { element, entries } => Ok((*element, entries)),
        other => Err(RuntimeFault::invariant(format!(
            "{} expected a dictionary but received {}",
            function,
            other.prog_type()
        ))),
    }
}

fn container_len(function: &str, args: &[Value]) -> Result<usize, RuntimeFault> {
    match arg(function, args, 0)? {
        Value::Collection { items, .. } => Ok(items.len()),
        Value::Dictionary { entries, .. } => Ok(entries.len()),
        other => Err(RuntimeFault::invariant(format!(
            "{} expected a collection or dictionary but received {}",
            function,
            other.prog_type()
        ))),
    }
}

fn builtin_count(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Number(container_len("count", args)? as f64))
}

fn builtin_is_empty(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(container_len("isempty", args)? == 0))
}

fn builtin_first(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let (_, items) = collection_arg("first", args, 0)?;
    items
        .first()
        .cloned()
        .ok_or_else(|| RuntimeFault::function("first", "the collection is empty"))
}

fn builtin_last(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let (_, items) = collection_arg("last", args, 0)?;
    items
        .last()
        .cloned()
        .ok_or_else(|| RuntimeFault::function("last", "the collection is empty"))
}

fn builtin_contains(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let (_, items) = collection_arg("contains", args, 0)?;
    let needle = arg("contains", args, 1)?;
    Ok(Value::Boolean(items.contains(needle)))
}

fn builtin_append(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let (element, items) = collection_arg("append", args, 0)?;
    let mut items = items.to_vec();
    items.push(arg("append", args, 1)?.clone());
    Ok(Value::collection(element, items))
}

fn builtin_get(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let (_, entries) = dictionary_arg("get", args, 0)?;
    let key = text_arg("get", args, 1)?;
    entries
        .get(key)
        .cloned()
        .ok_or_else(|| RuntimeFault::function("get", format!("no entry for key '{}'", key)))
}

fn builtin_has_key(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let (_, entries) = dictionary_arg("haskey", args, 0)?;
    Ok(Value::Boolean(entries.contains_key(text_arg("haskey", args, 1)?)))
}

fn builtin_keys(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let (_, entries) = dictionary_arg("keys", args, 0)?;
    let keys = entries.keys().map(|key| Value::text(key.as_str())).collect();
    Ok(Value::collection(ElementType::Text, keys))
}

fn builtin_put(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let (element, entries) = dictionary_arg("put", args, 0)?;
    let mut entries = entries.clone();
    entries.insert(
        text_arg("put", args, 1)?.to_string(),
        arg("put", args, 2)?.clone(),
    );
    Ok(Value::dictionary(element, entries))
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

    fn numbers(values: &[f64]) -> Value {
        Value::collection(
            ElementType::Number,
            values.iter().map(|n| Value::Number(*n)).collect(),
        )
    }

    #[test]
    fn test_first_and_last() {
        let list = numbers(&[3.0, 4.0, 5.0]);
        assert_eq!(call(builtin_first, &[list.clone()]).unwrap(), Value::Number(3.0));
        assert_eq!(call(builtin_last, &[list]).unwrap(), Value::Number(5.0));

        let err = call(builtin_first, &[numbers(&[])]).unwrap_err();
        assert_eq!(err.to_string(), "first: the collection is empty");
    }

    #[test]
    fn test_append_leaves_original_untouched() {
        let list = numbers(&[1.0]);
        let longer = call(builtin_append, &[list.clone(), Value::Number(2.0)]).unwrap();
        assert_eq!(longer, numbers(&[1.0, 2.0]));
        assert_eq!(list, numbers(&[1.0]));
    }

    #[test]
    fn test_dictionary_updates() {
        let empty = Value::dictionary(ElementType::Number, BTreeMap::new());
        let stocked = call(builtin_put, &[empty, Value::text("gold"), Value::Number(12.0)]).unwrap();

        assert_eq!(
            call(builtin_get, &[stocked.clone(), Value::text("gold")]).unwrap(),
            Value::Number(12.0)
        );
        assert_eq!(
            call(builtin_has_key, &[stocked.clone(), Value::text("silver")]).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            call(builtin_keys, &[stocked.clone()]).unwrap(),
            Value::collection(ElementType::Text, vec![Value::text("gold")])
        );
        assert_eq!(call(builtin_count, &[stocked]).unwrap(), Value::Number(1.0));
    }
}
