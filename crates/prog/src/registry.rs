//! Built-in function registry
//!
//! Functions are registered once through a [`RegistryBuilder`]. The built
//! [`FunctionRegistry`] is immutable and shared by reference between the
//! compiler and any number of concurrent compilations.
//!
//! Several entries may share a name. A call site resolves to the compatible
//! entry with the lowest total specificity; on a tie the entry registered
//! first wins.

use crate::node::{Expr, FunctionCall, NativeFn};
use crate::types::{ProgType, TypeSet};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Builds a bespoke node from compiled arguments and the resolved return type
pub type NodeFn = fn(Vec<Expr>, ProgType) -> Result<Expr, String>;

/// How a resolved call becomes an executable node
#[derive(Clone, Copy)]
pub enum Factory {
    /// Evaluate every argument, then call the native function
    Native(NativeFn),
    /// Build a custom node, for functions that control evaluation themselves
    Node(NodeFn),
}

/// Accepted type of one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Any type in the set
    Set(TypeSet),
    /// The element type of the container passed at this position
    ElementOf(usize),
    /// Exactly the type passed at this position
    SameAs(usize),
}

/// Result type of a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Fixed(ProgType),
    /// Whatever type was passed at this position
    SameAs(usize),
    /// The element type of the container passed at this position
    ElementOf(usize),
}

/// One named, documented parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
    pub description: String,
}

/// A function signature waiting to be registered
pub struct FunctionSpec {
    name: String,
    category: String,
    parameters: Vec<Parameter>,
    returns: ReturnType,
    factory: Factory,
    help: String,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>, category: impl Into<String>, returns: ReturnType, factory: Factory) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            parameters: Vec::new(),
            returns,
            factory,
            help: String::new(),
        }
    }

    /// Shorthand for a native function with a fixed return type
    pub fn native(name: &str, category: &str, returns: ProgType, native: NativeFn) -> Self {
        Self::new(name, category, ReturnType::Fixed(returns), Factory::Native(native))
    }

    pub fn returns(mut self, returns: ReturnType) -> Self {
        self.returns = returns;
        self
    }

    pub fn param(self, name: &str, accepts: TypeSet, description: &str) -> Self {
        self.param_type(name, ParamType::Set(accepts), description)
    }

    pub fn param_type(mut self, name: &str, ty: ParamType, description: &str) -> Self {
        self.parameters.push(Parameter {
            name: name.to_string(),
            ty,
            description: description.to_string(),
        });
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }
}

/// A registered signature
#[derive(Clone)]
pub struct FunctionEntry {
    pub name: String,
    pub category: String,
    pub parameters: Vec<Parameter>,
    pub returns: ReturnType,
    pub help: String,
    factory: Factory,
}

impl FunctionEntry {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Total specificity and concrete return type when `args` fit this signature
    fn bind(&self, args: &[ProgType]) -> Option<(u32, ProgType)> {
        if args.len() != self.parameters.len() {
            return None;
        }

        let mut specificity = 0;
        for (param, &arg) in self.parameters.iter().zip(args) {
            specificity += match param.ty {
                ParamType::Set(accepts) => {
                    if !accepts.accepts(arg) {
                        return None;
                    }
                    accepts.specificity()
                }
                ParamType::ElementOf(index) => {
                    let element = args.get(index).and_then(|ty| ty.contained())?;
                    if arg != ProgType::from(element) {
                        return None;
                    }
                    1
                }
                ParamType::SameAs(index) => {
                    if args.get(index) != Some(&arg) {
                        return None;
                    }
                    1
                }
            };
        }

        let return_type = match self.returns {
            ReturnType::Fixed(ty) => ty,
            ReturnType::SameAs(index) => *args.get(index)?,
            ReturnType::ElementOf(index) => ProgType::from(args.get(index)?.contained()?),
        };

        Some((specificity, return_type))
    }

    /// Build the executable node for a call to this entry
    pub fn instantiate(&self, args: Vec<Expr>, return_type: ProgType) -> Result<Expr, String> {
        match self.factory {
            Factory::Native(native) => Ok(Expr::Call(FunctionCall {
                name: self.name.clone(),
                args,
                return_type,
                native,
            })),
            Factory::Node(build) => build(args, return_type),
        }
    }

    fn describe_param(&self, ty: ParamType) -> String {
        let name_of = |index: usize| {
            self.parameters
                .get(index)
                .map(|param| param.name.as_str())
                .unwrap_or("?")
        };
        match ty {
            ParamType::Set(accepts) => accepts.to_string(),
            ParamType::ElementOf(index) => format!("element of {}", name_of(index)),
            ParamType::SameAs(index) => format!("same as {}", name_of(index)),
        }
    }

    /// Human-readable signature, e.g. `concat(first: text, second: text) -> text`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|param| format!("{}: {}", param.name, self.describe_param(param.ty)))
            .collect();

        let returns = match self.returns {
            ReturnType::Fixed(ty) => ty.to_string(),
            ReturnType::SameAs(index) => self.describe_param(ParamType::SameAs(index)),
            ReturnType::ElementOf(index) => self.describe_param(ParamType::ElementOf(index)),
        };

        format!("{}({}) -> {}", self.name, params.join(", "), returns)
    }

    pub fn help_entry(&self) -> HelpEntry {
        HelpEntry {
            name: self.name.clone(),
            category: self.category.clone(),
            signature: self.signature(),
            parameters: self
                .parameters
                .iter()
                .map(|param| HelpParameter {
                    name: param.name.clone(),
                    accepts: self.describe_param(param.ty),
                    description: param.description.clone(),
                })
                .collect(),
            help: self.help.clone(),
        }
    }
}

impl fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Author-facing help for one signature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelpEntry {
    pub name: String,
    pub category: String,
    pub signature: String,
    pub parameters: Vec<HelpParameter>,
    pub help: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelpParameter {
    pub name: String,
    pub accepts: String,
    pub description: String,
}

/// A call site that did not resolve
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("No matching overload for {name}({}); candidates take {} arguments: {}",
        describe_arguments(.arguments), .arities, .candidates.join(", "))]
    NoMatchingOverload {
        name: String,
        arguments: Vec<ProgType>,
        arities: String,
        candidates: Vec<String>,
    },
}

fn describe_arguments(arguments: &[ProgType]) -> String {
    arguments
        .iter()
        .map(|ty| ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A successful resolution
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'r> {
    pub entry: &'r FunctionEntry,
    pub return_type: ProgType,
}

/// Collects registrations before the registry is frozen
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<FunctionEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature; entries sharing a name are overloads
    pub fn register(&mut self, spec: FunctionSpec) -> &mut Self {
        tracing::trace!("Registering {}", spec.name);
        self.entries.push(FunctionEntry {
            name: spec.name,
            category: spec.category,
            parameters: spec.parameters,
            returns: spec.returns,
            help: spec.help,
            factory: spec.factory,
        });
        self
    }

    pub fn build(self) -> FunctionRegistry {
        let count = self.entries.len();
        let mut functions: HashMap<String, Vec<FunctionEntry>> = HashMap::new();
        for entry in self.entries {
            functions.entry(entry.name.clone()).or_default().push(entry);
        }

        tracing::debug!(
            "Function registry built with {} signatures across {} names",
            count,
            functions.len()
        );

        FunctionRegistry { functions }
    }
}

/// Immutable catalogue of built-in functions
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Vec<FunctionEntry>>,
}

impl FunctionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding the full standard library
    pub fn standard() -> Self {
        let mut builder = Self::builder();
        crate::builtins::register_standard_library(&mut builder);
        builder.build()
    }

    /// Resolve a call site from its arguments' static types
    pub fn resolve(&self, name: &str, args: &[ProgType]) -> Result<Resolved<'_>, ResolveError> {
        let entries = self
            .functions
            .get(name)
            .ok_or_else(|| ResolveError::UnknownFunction(name.to_string()))?;

        let mut best: Option<(u32, Resolved<'_>)> = None;
        for entry in entries {
            if let Some((specificity, return_type)) = entry.bind(args) {
                // Strictly lower only, so the earliest registration keeps a tie
                if best.as_ref().map_or(true, |(lowest, _)| specificity < *lowest) {
                    best = Some((specificity, Resolved { entry, return_type }));
                }
            }
        }

        best.map(|(_, resolved)| resolved).ok_or_else(|| {
            let arities: BTreeSet<usize> = entries.iter().map(FunctionEntry::arity).collect();
            ResolveError::NoMatchingOverload {
                name: name.to_string(),
                arguments: args.to_vec(),
                arities: arities
                    .iter()
                    .map(|arity| arity.to_string())
                    .collect::<Vec<_>>()
                    .join(" or "),
                candidates: entries.iter().map(FunctionEntry::signature).collect(),
            }
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered signatures
    pub fn len(&self) -> usize {
        self.functions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Every signature registered under `name`, in registration order
    pub fn entries(&self, name: &str) -> &[FunctionEntry] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn describe_signatures(&self, name: &str) -> Vec<HelpEntry> {
        self.entries(name).iter().map(FunctionEntry::help_entry).collect()
    }

    /// Help entries for `name` as pretty-printed JSON
    pub fn help_json(&self, name: &str) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.describe_signatures(name))
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<&str> {
        let categories: BTreeSet<&str> = self
            .functions
            .values()
            .flatten()
            .map(|entry| entry.category.as_str())
            .collect();
        categories.into_iter().collect()
    }

    /// Names with at least one signature in `category`, sorted
    pub fn functions_in_category(&self, category: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .functions
            .iter()
            .filter(|(_, entries)| entries.iter().any(|entry| entry.category == category))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
