//! Game-world functions, answered through the [`World`](crate::world::World) collaborator

use super::{arg, text_arg};
use crate::error::RuntimeFault;
use crate::registry::{FunctionSpec, RegistryBuilder};
use crate::runtime::ExecContext;
use crate::types::{ElementType, ProgType, TypeSet};
use crate::value::Value;
use mud_core::{CharacterId, ItemId, LocationId};

const CATEGORY: &str = "world";

pub(super) fn register_world_functions(registry: &mut RegistryBuilder) {
    registry
        .register(
            FunctionSpec::native("name", CATEGORY, ProgType::Text, builtin_character_name)
                .param("character", TypeSet::CHARACTER, "")
                .help("The character's name"),
        )
        .register(
            FunctionSpec::native("name", CATEGORY, ProgType::Text, builtin_item_name)
                .param("item", TypeSet::ITEM, "")
                .help("The item's short description"),
        )
        .register(
            FunctionSpec::native("name", CATEGORY, ProgType::Text, builtin_location_name)
                .param("location", TypeSet::LOCATION, "")
                .help("The location's name"),
        )
        .register(
            FunctionSpec::native("location", CATEGORY, ProgType::Location, builtin_location)
                .param("character", TypeSet::CHARACTER, "")
                .help("Where the character is; null when they are nowhere"),
        )
        .register(
            FunctionSpec::native(
                "characters",
                CATEGORY,
                ProgType::Collection(ElementType::Character),
                builtin_characters,
            )
            .param("location", TypeSet::LOCATION, "")
            .help("Everyone present in the location"),
        )
        .register(
            FunctionSpec::native("items", CATEGORY, ProgType::Collection(ElementType::Item), builtin_items)
                .param("location", TypeSet::LOCATION, "")
                .help("Items lying in the location"),
        )
        .register(
            FunctionSpec::native("inventory", CATEGORY, ProgType::Collection(ElementType::Item), builtin_inventory)
                .param("character", TypeSet::CHARACTER, "")
                .help("Items the character carries"),
        )
        .register(
            FunctionSpec::native("isnull", CATEGORY, ProgType::Boolean, builtin_is_null)
                .param("target", TypeSet::PERCEIVABLE, "")
                .help("True when the reference points at nothing"),
        )
        .register(
            FunctionSpec::native("send", CATEGORY, ProgType::Void, builtin_send)
                .param("character", TypeSet::CHARACTER, "Recipient")
                .param("message", TypeSet::TEXT, "")
                .help("Shows a message to one character"),
        )
        .register(
            FunctionSpec::native("echo", CATEGORY, ProgType::Void, builtin_echo)
                .param("location", TypeSet::LOCATION, "")
                .param("message", TypeSet::TEXT, "")
                .help("Shows a message to everyone in a location"),
        );
}

// ============================================================================
// REFERENCES
// ============================================================================

fn character_arg(function: &str, args: &[Value], index: usize) -> Result<CharacterId, RuntimeFault> {
    match arg(function, args, index)? {
        Value::Character(Some(id)) => Ok(*id),
        Value::Character(None) => Err(RuntimeFault::function(function, "the character is null")),
        other => Err(RuntimeFault::invariant(format!(
            "{} expected a character but received {}",
            function,
            other.prog_type()
        ))),
    }
}

fn item_arg(function: &str, args: &[Value], index: usize) -> Result<ItemId, RuntimeFault> {
    match arg(function, args, index)? {
        Value::Item(Some(id)) => Ok(*id),
        Value::Item(None) => Err(RuntimeFault::function(function, "the item is null")),
        other => Err(RuntimeFault::invariant(format!(
            "{} expected an item but received {}",
            function,
            other.prog_type()
        ))),
    }
}

fn location_arg(function: &str, args: &[Value], index: usize) -> Result<LocationId, RuntimeFault> {
    match arg(function, args, index)? {
        Value::Location(Some(id)) => Ok(*id),
        Value::Location(None) => Err(RuntimeFault::function(function, "the location is null")),
        other => Err(RuntimeFault::invariant(format!(
            "{} expected a location but received {}",
            function,
            other.prog_type()
        ))),
    }
}

fn missing(function: &str, what: impl std::fmt::Display) -> RuntimeFault {
    RuntimeFault::function(function, format!("{} does not exist", what))
}

// ============================================================================
// LOOKUPS
// ============================================================================

fn builtin_character_name(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let id = character_arg("name", args, 0)?;
    let name = ctx.world().character_name(id).ok_or_else(|| missing("name", id))?;
    Ok(Value::Text(name))
}

fn builtin_item_name(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let id = item_arg("name", args, 0)?;
    let name = ctx.world().item_name(id).ok_or_else(|| missing("name", id))?;
    Ok(Value::Text(name))
}

fn builtin_location_name(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let id = location_arg("name", args, 0)?;
    let name = ctx.world().location_name(id).ok_or_else(|| missing("name", id))?;
    Ok(Value::Text(name))
}

fn builtin_location(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let id = character_arg("location", args, 0)?;
    Ok(Value::Location(ctx.world().character_location(id)))
}

fn builtin_characters(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let location = location_arg("characters", args, 0)?;
    let present = ctx
        .world()
        .characters_at(location)
        .into_iter()
        .map(Value::character)
        .collect();
    Ok(Value::collection(ElementType::Character, present))
}

fn builtin_items(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let location = location_arg("items", args, 0)?;
    let items = ctx.world().items_at(location).into_iter().map(Value::item).collect();
    Ok(Value::collection(ElementType::Item, items))
}

fn builtin_inventory(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let id = character_arg("inventory", args, 0)?;
    let items = ctx.world().inventory(id).into_iter().map(Value::item).collect();
    Ok(Value::collection(ElementType::Item, items))
}

fn builtin_is_null(_ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Boolean(arg("isnull", args, 0)?.is_null()))
}

// ============================================================================
// OUTPUT
// ============================================================================

fn builtin_send(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let id = character_arg("send", args, 0)?;
    ctx.world().send(id, text_arg("send", args, 1)?);
    Ok(Value::Void)
}

fn builtin_echo(ctx: &mut ExecContext<'_>, args: &[Value]) -> Result<Value, RuntimeFault> {
    let location = location_arg("echo", args, 0)?;
    ctx.world().echo(location, text_arg("echo", args, 1)?);
    Ok(Value::Void)
}
