//! Prog variable types
//!
//! Two separate concepts live here:
//! - [`ProgType`] is the resolved type of a value or a declared variable. It is
//!   a closed enum and can never name more than one type.
//! - [`TypeSet`] is a union of types, used only by function signatures to say
//!   which argument types a parameter accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Scalar types, the only types a collection or dictionary can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementType {
    Boolean,
    Number,
    Text,
    Character,
    Item,
    Location,
}

impl ElementType {
    pub const ALL: [ElementType; 6] = [
        ElementType::Boolean,
        ElementType::Number,
        ElementType::Text,
        ElementType::Character,
        ElementType::Item,
        ElementType::Location,
    ];

    /// Name as written in prog source
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Boolean => "boolean",
            ElementType::Number => "number",
            ElementType::Text => "text",
            ElementType::Character => "character",
            ElementType::Item => "item",
            ElementType::Location => "location",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name().eq_ignore_ascii_case(name))
    }

    const fn bit(self) -> u32 {
        match self {
            ElementType::Boolean => TypeSet::BOOLEAN.0,
            ElementType::Number => TypeSet::NUMBER.0,
            ElementType::Text => TypeSet::TEXT.0,
            ElementType::Character => TypeSet::CHARACTER.0,
            ElementType::Item => TypeSet::ITEM.0,
            ElementType::Location => TypeSet::LOCATION.0,
        }
    }
}

/// Resolved type of a value or variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgType {
    Void,
    Boolean,
    Number,
    Text,
    Character,
    Item,
    Location,
    Collection(ElementType),
    Dictionary(ElementType),
}

impl ProgType {
    /// The scalar this type is, if it is one
    pub fn as_element(self) -> Option<ElementType> {
        match self {
            ProgType::Boolean => Some(ElementType::Boolean),
            ProgType::Number => Some(ElementType::Number),
            ProgType::Text => Some(ElementType::Text),
            ProgType::Character => Some(ElementType::Character),
            ProgType::Item => Some(ElementType::Item),
            ProgType::Location => Some(ElementType::Location),
            ProgType::Void | ProgType::Collection(_) | ProgType::Dictionary(_) => None,
        }
    }

    /// The element type held by a collection or dictionary
    pub fn contained(self) -> Option<ElementType> {
        match self {
            ProgType::Collection(element) | ProgType::Dictionary(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_void(self) -> bool {
        self == ProgType::Void
    }

    /// Parse a type as written in source: `number`, `character collection`,
    /// `text dictionary`, `void`
    pub fn parse(text: &str) -> Option<Self> {
        let words: Vec<&str> = text.split_whitespace().collect();
        match words.as_slice() {
            [single] if single.eq_ignore_ascii_case("void") => Some(ProgType::Void),
            [single] => ElementType::from_name(single).map(ProgType::from),
            [element, container] => {
                let element = ElementType::from_name(element)?;
                match container.to_lowercase().as_str() {
                    "collection" => Some(ProgType::Collection(element)),
                    "dictionary" => Some(ProgType::Dictionary(element)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl From<ElementType> for ProgType {
    fn from(element: ElementType) -> Self {
        match element {
            ElementType::Boolean => ProgType::Boolean,
            ElementType::Number => ProgType::Number,
            ElementType::Text => ProgType::Text,
            ElementType::Character => ProgType::Character,
            ElementType::Item => ProgType::Item,
            ElementType::Location => ProgType::Location,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ProgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgType::Void => f.write_str("void"),
            ProgType::Collection(element) => write!(f, "{} collection", element),
            ProgType::Dictionary(element) => write!(f, "{} dictionary", element),
            other => match other.as_element() {
                Some(element) => write!(f, "{}", element),
                None => Ok(()),
            },
        }
    }
}

/// Set of types a signature parameter accepts
///
/// Scalar bits name element types. When a container bit is present the scalar
/// bits describe the container's elements instead, so
/// `TypeSet::COLLECTION | TypeSet::CHARACTER` means "a collection of
/// characters" and does not accept a bare character.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSet(u32);

impl TypeSet {
    pub const EMPTY: TypeSet = TypeSet(0);

    pub const BOOLEAN: TypeSet = TypeSet(1 << 0);
    pub const NUMBER: TypeSet = TypeSet(1 << 1);
    pub const TEXT: TypeSet = TypeSet(1 << 2);
    pub const CHARACTER: TypeSet = TypeSet(1 << 3);
    pub const ITEM: TypeSet = TypeSet(1 << 4);
    pub const LOCATION: TypeSet = TypeSet(1 << 5);

    pub const COLLECTION: TypeSet = TypeSet(1 << 8);
    pub const DICTIONARY: TypeSet = TypeSet(1 << 9);
    pub const VOID: TypeSet = TypeSet(1 << 10);
    /// Any non-void value, containers included
    pub const ANYTHING: TypeSet = TypeSet(1 << 11);

    /// Every scalar type
    pub const COLLECTION_ITEM: TypeSet = TypeSet(0b11_1111);
    pub const PERCEIVABLE: TypeSet = TypeSet(Self::CHARACTER.0 | Self::ITEM.0 | Self::LOCATION.0);
    pub const NUMBER_OR_TEXT: TypeSet = TypeSet(Self::NUMBER.0 | Self::TEXT.0);
    pub const ANY_COLLECTION: TypeSet = TypeSet(Self::COLLECTION.0 | Self::COLLECTION_ITEM.0);
    pub const ANY_DICTIONARY: TypeSet = TypeSet(Self::DICTIONARY.0 | Self::COLLECTION_ITEM.0);

    const CONTAINERS: u32 = Self::COLLECTION.0 | Self::DICTIONARY.0;

    pub const fn union(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 | other.0)
    }

    pub const fn contains(self, other: TypeSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// The set accepting exactly one resolved type
    pub const fn of(ty: ProgType) -> TypeSet {
        match ty {
            ProgType::Void => Self::VOID,
            ProgType::Boolean => Self::BOOLEAN,
            ProgType::Number => Self::NUMBER,
            ProgType::Text => Self::TEXT,
            ProgType::Character => Self::CHARACTER,
            ProgType::Item => Self::ITEM,
            ProgType::Location => Self::LOCATION,
            ProgType::Collection(element) => TypeSet(Self::COLLECTION.0 | element.bit()),
            ProgType::Dictionary(element) => TypeSet(Self::DICTIONARY.0 | element.bit()),
        }
    }

    /// Whether a resolved type belongs to this set
    pub fn accepts(self, ty: ProgType) -> bool {
        if ty.is_void() {
            return self.contains(Self::VOID);
        }
        if self.contains(Self::ANYTHING) {
            return true;
        }

        match ty {
            ProgType::Collection(element) => {
                self.contains(Self::COLLECTION) && self.0 & element.bit() != 0
            }
            ProgType::Dictionary(element) => {
                self.contains(Self::DICTIONARY) && self.0 & element.bit() != 0
            }
            scalar => match scalar.as_element() {
                Some(element) => self.0 & Self::CONTAINERS == 0 && self.0 & element.bit() != 0,
                None => false,
            },
        }
    }

    /// Breadth of the set; lower is more specific
    pub fn specificity(self) -> u32 {
        if self.contains(Self::ANYTHING) {
            return 32;
        }
        self.0.count_ones()
    }

    fn element_names(self) -> Vec<&'static str> {
        ElementType::ALL
            .into_iter()
            .filter(|element| self.0 & element.bit() != 0)
            .map(ElementType::name)
            .collect()
    }
}

impl BitOr for TypeSet {
    type Output = TypeSet;

    fn bitor(self, rhs: TypeSet) -> TypeSet {
        self.union(rhs)
    }
}

impl From<ProgType> for TypeSet {
    fn from(ty: ProgType) -> Self {
        TypeSet::of(ty)
    }
}

impl fmt::Debug for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeSet({})", self)
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Self::ANYTHING) {
            return f.write_str("anything");
        }

        let elements = if *self & Self::COLLECTION_ITEM == Self::COLLECTION_ITEM {
            "any type".to_string()
        } else {
            self.element_names().join(" or ")
        };

        let mut parts = Vec::new();
        if self.contains(Self::COLLECTION) {
            parts.push(format!("collection of {}", elements));
        }
        if self.contains(Self::DICTIONARY) {
            parts.push(format!("dictionary of {}", elements));
        }
        if parts.is_empty() && !elements.is_empty() {
            parts.push(elements);
        }
        if self.contains(Self::VOID) {
            parts.push("void".to_string());
        }

        f.write_str(&parts.join(" or "))
    }
}

impl std::ops::BitAnd for TypeSet {
    type Output = TypeSet;

    fn bitand(self, rhs: TypeSet) -> TypeSet {
        TypeSet(self.0 & rhs.0)
    }
}

/// Whether a resolved type may be passed where `required` is expected
pub fn is_compatible(candidate: ProgType, required: TypeSet) -> bool {
    required.accepts(candidate)
}

/// Human-readable name for diagnostics and help text
pub fn describe(ty: ProgType) -> String {
    ty.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_compatibility() {
        assert!(is_compatible(ProgType::Number, TypeSet::NUMBER_OR_TEXT));
        assert!(is_compatible(ProgType::Text, TypeSet::NUMBER_OR_TEXT));
        assert!(!is_compatible(ProgType::Boolean, TypeSet::NUMBER_OR_TEXT));
    }

    #[test]
    fn test_collection_unwraps_element() {
        let characters = ProgType::Collection(ElementType::Character);
        assert!(TypeSet::ANY_COLLECTION.accepts(characters));
        assert!((TypeSet::COLLECTION | TypeSet::CHARACTER).accepts(characters));
        assert!(!(TypeSet::COLLECTION | TypeSet::ITEM).accepts(characters));
        assert!(!TypeSet::ANY_DICTIONARY.accepts(characters));
    }

    #[test]
    fn test_container_set_rejects_scalars() {
        assert!(!TypeSet::ANY_COLLECTION.accepts(ProgType::Character));
        assert!(!TypeSet::CHARACTER.accepts(ProgType::Collection(ElementType::Character)));
    }

    #[test]
    fn test_anything_and_void() {
        assert!(TypeSet::ANYTHING.accepts(ProgType::Dictionary(ElementType::Text)));
        assert!(!TypeSet::ANYTHING.accepts(ProgType::Void));
        assert!(TypeSet::VOID.accepts(ProgType::Void));
    }

    #[test]
    fn test_specificity() {
        assert_eq!(TypeSet::NUMBER.specificity(), 1);
        assert_eq!(TypeSet::NUMBER_OR_TEXT.specificity(), 2);
        assert!(TypeSet::ANYTHING.specificity() > TypeSet::ANY_COLLECTION.specificity());
    }

    #[test]
    fn test_exact_set_accepts_only_its_type() {
        for element in ElementType::ALL {
            let ty = ProgType::from(element);
            assert!(TypeSet::of(ty).accepts(ty));
            assert!(TypeSet::of(ProgType::Collection(element)).accepts(ProgType::Collection(element)));
        }
        assert!(!TypeSet::of(ProgType::Number).accepts(ProgType::Text));
    }

    #[test]
    fn test_parse_type_names() {
        assert_eq!(ProgType::parse("number"), Some(ProgType::Number));
        assert_eq!(
            ProgType::parse("character collection"),
            Some(ProgType::Collection(ElementType::Character))
        );
        assert_eq!(
            ProgType::parse("Text Dictionary"),
            Some(ProgType::Dictionary(ElementType::Text))
        );
        assert_eq!(ProgType::parse("void"), Some(ProgType::Void));
        assert_eq!(ProgType::parse("number list"), None);
        assert_eq!(ProgType::parse("widget"), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(ProgType::Collection(ElementType::Item)), "item collection");
        assert_eq!(TypeSet::NUMBER_OR_TEXT.to_string(), "number or text");
        assert_eq!(TypeSet::ANY_COLLECTION.to_string(), "collection of any type");
        assert_eq!((TypeSet::COLLECTION | TypeSet::CHARACTER).to_string(), "collection of character");
        assert_eq!(TypeSet::ANYTHING.to_string(), "anything");
    }
}
