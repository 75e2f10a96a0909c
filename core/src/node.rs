#![deny(missing_docs)]

//! # Validation Nodes
//!
//! The input grammar: a recursive description of expected data shapes and
//! their constraints, as attached to routes by the host framework.
//!
//! Reusable shapes live in a [`SchemaSet`] arena and are pointed at with
//! [`Shape::Ref`]. Declaration identity (the arena index) is what the
//! definition registry deduplicates on, never structural equality.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Index of a reusable declaration inside a [`SchemaSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Size or encoding hint attached to a primitive rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatHint {
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// Single precision number.
    Float,
    /// Double precision number.
    Double,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// Base64 encoded bytes.
    Byte,
    /// Raw octets.
    Binary,
    /// Obscured input.
    Password,
}

impl FormatHint {
    /// The format string emitted into the document.
    pub fn as_str(self) -> &'static str {
        match self {
            FormatHint::Int32 => "int32",
            FormatHint::Int64 => "int64",
            FormatHint::Float => "float",
            FormatHint::Double => "double",
            FormatHint::Date => "date",
            FormatHint::DateTime => "date-time",
            FormatHint::Byte => "byte",
            FormatHint::Binary => "binary",
            FormatHint::Password => "password",
        }
    }
}

/// Encoding of an array value inside a single non-body parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    /// Comma separated.
    #[default]
    Csv,
    /// Space separated.
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated.
    Pipes,
    /// Repeated parameter instances.
    Multi,
}

/// Kind-specific constraints. Which fields apply depends on the node's shape:
/// `min`/`max`/`length` bound values for numbers, characters for strings and
/// items for arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Inclusive lower bound.
    pub min: Option<Number>,
    /// Inclusive upper bound.
    pub max: Option<Number>,
    /// Exact length (strings, arrays).
    pub length: Option<u64>,
    /// Exclusive lower bound (numbers).
    pub greater: Option<Number>,
    /// Exclusive upper bound (numbers).
    pub less: Option<Number>,
    /// Value must be a multiple of this (numbers).
    pub multiple: Option<Number>,
    /// Allowed literal values, in declaration order.
    pub allowed: Vec<Value>,
    /// Regular expression the value must match (strings).
    pub pattern: Option<String>,
    /// Size or encoding hint.
    pub format: Option<FormatHint>,
    /// Items must be unique (arrays).
    pub unique: bool,
    /// Delimiter convention when the array is a non-body parameter.
    pub collection_format: Option<CollectionFormat>,
}

/// The shape of a node, with kind-specific children.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Named properties in declaration order.
    Object(IndexMap<String, ValidationNode>),
    /// Homogeneous list with one item shape.
    Array(Box<ValidationNode>),
    /// Text.
    String,
    /// Floating point number.
    Number,
    /// Whole number.
    Integer,
    /// True or false.
    Boolean,
    /// File upload or raw octets.
    Binary,
    /// Timestamp carried as text.
    Date,
    /// Ordered union of candidate shapes.
    Alternatives(Vec<ValidationNode>),
    /// Usage of a reusable declaration.
    Ref(SchemaId),
    /// A kind outside this grammar, kept by name.
    Unknown(String),
}

impl Shape {
    /// The kind name as written in manifests.
    pub fn kind_name(&self) -> &str {
        match self {
            Shape::Object(_) => "object",
            Shape::Array(_) => "array",
            Shape::String => "string",
            Shape::Number => "number",
            Shape::Integer => "integer",
            Shape::Boolean => "boolean",
            Shape::Binary => "binary",
            Shape::Date => "date",
            Shape::Alternatives(_) => "alternatives",
            Shape::Ref(_) => "ref",
            Shape::Unknown(name) => name,
        }
    }

    /// Whether the shape maps to a single primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Shape::String
                | Shape::Number
                | Shape::Integer
                | Shape::Boolean
                | Shape::Binary
                | Shape::Date
        )
    }
}

/// One validation rule, possibly with children.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationNode {
    /// Kind plus kind-specific children.
    pub shape: Shape,
    /// Whether the value must be present.
    pub required: bool,
    /// Value assumed when absent.
    pub default: Option<Value>,
    /// Human readable description.
    pub description: Option<String>,
    /// Example value.
    pub example: Option<Value>,
    /// Preferred definition name when the shape is registered.
    pub label: Option<String>,
    /// Kind-specific constraints.
    pub constraints: Constraints,
}

impl ValidationNode {
    /// Creates an optional, unconstrained node of the given shape.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            required: false,
            default: None,
            description: None,
            example: None,
            label: None,
            constraints: Constraints::default(),
        }
    }

    /// A string rule.
    pub fn string() -> Self {
        Self::new(Shape::String)
    }

    /// A number rule.
    pub fn number() -> Self {
        Self::new(Shape::Number)
    }

    /// An integer rule.
    pub fn integer() -> Self {
        Self::new(Shape::Integer)
    }

    /// A boolean rule.
    pub fn boolean() -> Self {
        Self::new(Shape::Boolean)
    }

    /// A binary (file) rule.
    pub fn binary() -> Self {
        Self::new(Shape::Binary)
    }

    /// A date rule.
    pub fn date() -> Self {
        Self::new(Shape::Date)
    }

    /// An object rule with properties in the given order.
    pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, ValidationNode)>) -> Self {
        Self::new(Shape::Object(
            properties
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        ))
    }

    /// An array rule.
    pub fn array(items: ValidationNode) -> Self {
        Self::new(Shape::Array(Box::new(items)))
    }

    /// A union rule.
    pub fn alternatives(branches: impl IntoIterator<Item = ValidationNode>) -> Self {
        Self::new(Shape::Alternatives(branches.into_iter().collect()))
    }

    /// A usage of a reusable declaration.
    pub fn reference(id: SchemaId) -> Self {
        Self::new(Shape::Ref(id))
    }

    /// Marks the node as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the example value.
    pub fn with_example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the definition label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the format hint.
    pub fn with_format(mut self, format: FormatHint) -> Self {
        self.constraints.format = Some(format);
        self
    }

    /// Restricts the value to the given literals.
    pub fn with_allowed<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.constraints.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the inclusive lower bound.
    pub fn with_min(mut self, min: impl Into<Number>) -> Self {
        self.constraints.min = Some(min.into());
        self
    }

    /// Sets the inclusive upper bound.
    pub fn with_max(mut self, max: impl Into<Number>) -> Self {
        self.constraints.max = Some(max.into());
        self
    }

    /// Sets the exact length.
    pub fn with_length(mut self, length: u64) -> Self {
        self.constraints.length = Some(length);
        self
    }

    /// Sets the regular expression.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// Requires unique array items.
    pub fn unique(mut self) -> Self {
        self.constraints.unique = true;
        self
    }

    /// Sets the collection format used when this array is a non-body parameter.
    pub fn with_collection_format(mut self, format: CollectionFormat) -> Self {
        self.constraints.collection_format = Some(format);
        self
    }

    /// The kind name as written in manifests.
    pub fn kind_name(&self) -> &str {
        self.shape.kind_name()
    }
}

/// Arena of reusable declarations.
///
/// A declaration may be reserved before it is defined so that it can refer
/// to itself, directly or through other declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSet {
    declarations: Vec<Option<ValidationNode>>,
}

impl SchemaSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration and returns its identity.
    pub fn declare(&mut self, node: ValidationNode) -> SchemaId {
        self.declarations.push(Some(node));
        SchemaId(self.declarations.len() - 1)
    }

    /// Reserves an identity to be defined later.
    pub fn reserve(&mut self) -> SchemaId {
        self.declarations.push(None);
        SchemaId(self.declarations.len() - 1)
    }

    /// Defines (or redefines) a reserved identity.
    ///
    /// Returns `false` if the identity does not belong to this set.
    pub fn define(&mut self, id: SchemaId, node: ValidationNode) -> bool {
        match self.declarations.get_mut(id.0) {
            Some(slot) => {
                *slot = Some(node);
                true
            }
            None => false,
        }
    }

    /// Looks up a declaration. Reserved but undefined identities yield `None`.
    pub fn get(&self, id: SchemaId) -> Option<&ValidationNode> {
        self.declarations.get(id.0).and_then(Option::as_ref)
    }

    /// Number of identities handed out.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether no identity was handed out.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_flags() {
        let node = ValidationNode::integer()
            .required()
            .with_format(FormatHint::Int64)
            .with_description("ID of pet");
        assert!(node.required);
        assert_eq!(node.constraints.format, Some(FormatHint::Int64));
        assert_eq!(node.kind_name(), "integer");
    }

    #[test]
    fn test_object_preserves_property_order() {
        let node = ValidationNode::object([
            ("zeta", ValidationNode::string()),
            ("alpha", ValidationNode::string()),
        ]);
        let Shape::Object(props) = &node.shape else {
            panic!("expected object");
        };
        let keys: Vec<_> = props.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_reserve_then_define() {
        let mut set = SchemaSet::new();
        let id = set.reserve();
        assert!(set.get(id).is_none());
        let node = ValidationNode::object([("next", ValidationNode::reference(id))]);
        assert!(set.define(id, node));
        assert!(set.get(id).is_some());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_identities_are_distinct() {
        let mut set = SchemaSet::new();
        let a = set.declare(ValidationNode::object([("x", ValidationNode::string())]));
        let b = set.declare(ValidationNode::object([("x", ValidationNode::string())]));
        assert_ne!(a, b);
        assert_eq!(set.get(a), set.get(b));
    }

    #[test]
    fn test_format_hint_serde_names() {
        let hint: FormatHint = serde_json::from_str("\"date-time\"").unwrap();
        assert_eq!(hint, FormatHint::DateTime);
        assert_eq!(FormatHint::Int64.as_str(), "int64");
        let cf: CollectionFormat = serde_json::from_str("\"pipes\"").unwrap();
        assert_eq!(cf, CollectionFormat::Pipes);
    }
}
