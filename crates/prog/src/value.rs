//! Program variables
//!
//! A [`Value`] is a runtime value paired with its resolved type. The type is
//! derived from the variant, so a value can never carry a union type.

use crate::types::{ElementType, ProgType};
use mud_core::{CharacterId, ItemId, LocationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Runtime value
///
/// World objects are optional because a prog can hold a reference to nothing,
/// for example the location of a character who is not in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Void,
    Boolean(bool),
    Number(f64),
    Text(String),
    Character(Option<CharacterId>),
    Item(Option<ItemId>),
    Location(Option<LocationId>),
    Collection {
        element: ElementType,
        items: Vec<Value>,
    },
    /// Text-keyed; ordered so iteration is deterministic
    Dictionary {
        element: ElementType,
        entries: BTreeMap<String, Value>,
    },
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    pub fn character(id: CharacterId) -> Self {
        Value::Character(Some(id))
    }

    pub fn item(id: ItemId) -> Self {
        Value::Item(Some(id))
    }

    pub fn location(id: LocationId) -> Self {
        Value::Location(Some(id))
    }

    pub fn collection(element: ElementType, items: Vec<Value>) -> Self {
        Value::Collection { element, items }
    }

    pub fn dictionary(element: ElementType, entries: BTreeMap<String, Value>) -> Self {
        Value::Dictionary { element, entries }
    }

    /// The value an uninitialised variable of `ty` starts with
    pub fn default_for(ty: ProgType) -> Self {
        match ty {
            ProgType::Void => Value::Void,
            ProgType::Boolean => Value::Boolean(false),
            ProgType::Number => Value::Number(0.0),
            ProgType::Text => Value::Text(String::new()),
            ProgType::Character => Value::Character(None),
            ProgType::Item => Value::Item(None),
            ProgType::Location => Value::Location(None),
            ProgType::Collection(element) => Value::collection(element, Vec::new()),
            ProgType::Dictionary(element) => Value::dictionary(element, BTreeMap::new()),
        }
    }

    /// Resolved type of this value
    pub fn prog_type(&self) -> ProgType {
        match self {
            Value::Void => ProgType::Void,
            Value::Boolean(_) => ProgType::Boolean,
            Value::Number(_) => ProgType::Number,
            Value::Text(_) => ProgType::Text,
            Value::Character(_) => ProgType::Character,
            Value::Item(_) => ProgType::Item,
            Value::Location(_) => ProgType::Location,
            Value::Collection { element, .. } => ProgType::Collection(*element),
            Value::Dictionary { element, .. } => ProgType::Dictionary(*element),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for a world-object value that refers to nothing
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Character(None) | Value::Item(None) | Value::Location(None)
        )
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Character(Some(id)) => write!(f, "{}", id),
            Value::Item(Some(id)) => write!(f, "{}", id),
            Value::Location(Some(id)) => write!(f, "{}", id),
            Value::Character(None) | Value::Item(None) | Value::Location(None) => f.write_str("null"),
            Value::Collection { items, .. } => {
                let rendered: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Dictionary { entries, .. } => {
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}
