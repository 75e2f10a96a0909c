#![deny(missing_docs)]

//! # Type Mapping
//!
//! Converts a single primitive validation rule into the document's
//! `(type, format, validations)` vocabulary.
//!
//! | kind    | type                  | format                        |
//! |---------|-----------------------|-------------------------------|
//! | integer | integer               | int32 / int64 per hint        |
//! | number  | number                | float / double per hint       |
//! | string  | string                | date, date-time, byte, ...    |
//! | date    | string                | date-time (date per hint)     |
//! | boolean | boolean               |                               |
//! | binary  | file (formData)       | binary elsewhere (as string)  |

use crate::node::{Constraints, FormatHint, Shape, ValidationNode};
use crate::swagger::models::{DataType, Location, Validations};
use derive_more::Display;
use regex::Regex;
use serde_json::Number;

/// Where the mapped value ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Body parameter schema or a named definition.
    Body,
    /// Response schema.
    Response,
    /// Non-body parameter or response header.
    Parameter(Location),
}

/// Output of a successful mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    /// Document type.
    pub data_type: DataType,
    /// Format refinement.
    pub format: Option<String>,
    /// Validation keywords derived from the rule's constraints.
    pub validations: Validations,
    /// A format hint that does not fit the kind and was left out.
    pub ignored_hint: Option<FormatHint>,
}

impl TypeInfo {
    fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            format: None,
            validations: Validations::default(),
            ignored_hint: None,
        }
    }

    fn formatted(data_type: DataType, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::new(data_type)
        }
    }

    /// Uses `hint` as format when it is one of `accepted`, otherwise records it as ignored.
    fn apply_hint(mut self, hint: Option<FormatHint>, accepted: &[FormatHint]) -> Self {
        if let Some(hint) = hint {
            if accepted.contains(&hint) {
                self.format = Some(hint.as_str().to_string());
            } else {
                self.ignored_hint = Some(hint);
            }
        }
        self
    }
}

/// Why a rule could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum MapError {
    /// The kind is not a primitive this mapper knows.
    #[display("unrecognized kind '{_0}'")]
    UnsupportedKind(String),
    /// A constraint value cannot be expressed.
    #[display("invalid constraint: {_0}")]
    InvalidConstraint(String),
}

/// Trait for converting primitive validation rules to document types.
pub trait TypeMapper {
    /// Maps one primitive rule. Pure; never inspects children.
    fn map(&self, node: &ValidationNode, target: Target) -> Result<TypeInfo, MapError>;
}

/// The standard Swagger 2.0 implementation of `TypeMapper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwaggerTypeMapper;

impl TypeMapper for SwaggerTypeMapper {
    fn map(&self, node: &ValidationNode, target: Target) -> Result<TypeInfo, MapError> {
        let c = &node.constraints;
        let mut info = match &node.shape {
            Shape::Integer => numeric(DataType::Integer, c)?
                .apply_hint(c.format, &[FormatHint::Int32, FormatHint::Int64]),
            Shape::Number => numeric(DataType::Number, c)?
                .apply_hint(c.format, &[FormatHint::Float, FormatHint::Double]),
            Shape::String => textual(c)?.apply_hint(
                c.format,
                &[
                    FormatHint::Date,
                    FormatHint::DateTime,
                    FormatHint::Byte,
                    FormatHint::Binary,
                    FormatHint::Password,
                ],
            ),
            Shape::Date => TypeInfo::formatted(DataType::String, FormatHint::DateTime.as_str())
                .apply_hint(c.format, &[FormatHint::Date, FormatHint::DateTime]),
            Shape::Boolean => TypeInfo::new(DataType::Boolean).apply_hint(c.format, &[]),
            Shape::Binary => {
                let info = match target {
                    Target::Parameter(Location::FormData) => TypeInfo::new(DataType::File),
                    _ => TypeInfo::formatted(DataType::String, FormatHint::Binary.as_str()),
                };
                info.apply_hint(c.format, &[FormatHint::Binary])
            }
            other => return Err(MapError::UnsupportedKind(other.kind_name().to_string())),
        };

        if !c.allowed.is_empty() {
            info.validations.enum_values = Some(c.allowed.clone());
        }
        Ok(info)
    }
}

fn numeric(data_type: DataType, c: &Constraints) -> Result<TypeInfo, MapError> {
    let mut info = TypeInfo::new(data_type);
    let v = &mut info.validations;

    if let Some(greater) = &c.greater {
        v.minimum = Some(greater.clone());
        v.exclusive_minimum = true;
    } else {
        v.minimum = c.min.clone();
    }
    if let Some(less) = &c.less {
        v.maximum = Some(less.clone());
        v.exclusive_maximum = true;
    } else {
        v.maximum = c.max.clone();
    }
    if let Some(multiple) = &c.multiple {
        if multiple.as_f64().is_some_and(|m| m <= 0.0) {
            return Err(MapError::InvalidConstraint(format!(
                "multiple must be positive, got {}",
                multiple
            )));
        }
        v.multiple_of = Some(multiple.clone());
    }
    Ok(info)
}

fn textual(c: &Constraints) -> Result<TypeInfo, MapError> {
    let mut info = TypeInfo::new(DataType::String);
    let v = &mut info.validations;

    v.min_length = c.min.as_ref().map(|n| count_bound(n, "min")).transpose()?;
    v.max_length = c.max.as_ref().map(|n| count_bound(n, "max")).transpose()?;
    if let Some(length) = c.length {
        v.min_length = Some(length);
        v.max_length = Some(length);
    }
    if let Some(pattern) = &c.pattern {
        Regex::new(pattern).map_err(|e| {
            MapError::InvalidConstraint(format!("pattern '{}' does not compile: {}", pattern, e))
        })?;
        v.pattern = Some(pattern.clone());
    }
    Ok(info)
}

/// Converts a bound that counts characters or items.
pub(crate) fn count_bound(value: &Number, which: &str) -> Result<u64, MapError> {
    value.as_u64().ok_or_else(|| {
        MapError::InvalidConstraint(format!(
            "{} must be a non-negative integer, got {}",
            which, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(node: &ValidationNode) -> TypeInfo {
        SwaggerTypeMapper.map(node, Target::Body).unwrap()
    }

    #[test]
    fn test_primitive_mapping() {
        let cases = vec![
            (ValidationNode::integer(), DataType::Integer),
            (ValidationNode::number(), DataType::Number),
            (ValidationNode::boolean(), DataType::Boolean),
            (ValidationNode::string(), DataType::String),
        ];

        for (input, expected) in cases {
            let res = map(&input);
            assert_eq!(res.data_type, expected);
            assert_eq!(res.format, None);
        }
    }

    #[test]
    fn test_size_hints() {
        let res = map(&ValidationNode::integer().with_format(FormatHint::Int64));
        assert_eq!(res.format.as_deref(), Some("int64"));

        let res = map(&ValidationNode::number().with_format(FormatHint::Float));
        assert_eq!(res.format.as_deref(), Some("float"));

        let res = map(&ValidationNode::string().with_format(FormatHint::Byte));
        assert_eq!(res.format.as_deref(), Some("byte"));
    }

    #[test]
    fn test_incompatible_hint_is_reported() {
        let res = map(&ValidationNode::integer().with_format(FormatHint::Date));
        assert_eq!(res.format, None);
        assert_eq!(res.ignored_hint, Some(FormatHint::Date));
    }

    #[test]
    fn test_binary_depends_on_target() {
        let node = ValidationNode::binary();
        let form = SwaggerTypeMapper
            .map(&node, Target::Parameter(Location::FormData))
            .unwrap();
        assert_eq!(form.data_type, DataType::File);
        assert_eq!(form.format, None);

        let body = SwaggerTypeMapper.map(&node, Target::Body).unwrap();
        assert_eq!(body.data_type, DataType::String);
        assert_eq!(body.format.as_deref(), Some("binary"));
    }

    #[test]
    fn test_date_defaults_to_date_time() {
        assert_eq!(
            map(&ValidationNode::date()).format.as_deref(),
            Some("date-time")
        );
        assert_eq!(
            map(&ValidationNode::date().with_format(FormatHint::Date))
                .format
                .as_deref(),
            Some("date")
        );
    }

    #[test]
    fn test_enum_order_preserved() {
        let res = map(&ValidationNode::string().with_allowed(["available", "pending", "sold"]));
        assert_eq!(
            res.validations.enum_values,
            Some(vec![json!("available"), json!("pending"), json!("sold")])
        );
    }

    #[test]
    fn test_string_bounds_and_pattern() {
        let res = map(
            &ValidationNode::string()
                .with_min(2)
                .with_max(10)
                .with_pattern("^[a-z]+$"),
        );
        assert_eq!(res.validations.min_length, Some(2));
        assert_eq!(res.validations.max_length, Some(10));
        assert_eq!(res.validations.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(res.validations.minimum, None);
    }

    #[test]
    fn test_numeric_bounds() {
        let mut node = ValidationNode::integer().with_max(100);
        node.constraints.greater = Some(0.into());
        let res = map(&node);
        assert_eq!(res.validations.minimum, Some(Number::from(0)));
        assert!(res.validations.exclusive_minimum);
        assert_eq!(res.validations.maximum, Some(Number::from(100)));
        assert!(!res.validations.exclusive_maximum);
        assert_eq!(res.validations.min_length, None);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = SwaggerTypeMapper
            .map(&ValidationNode::string().with_pattern("(unclosed"), Target::Body)
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidConstraint(_)));
    }

    #[test]
    fn test_negative_length_rejected() {
        let err = SwaggerTypeMapper
            .map(&ValidationNode::string().with_min(-1), Target::Body)
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidConstraint(_)));
    }

    #[test]
    fn test_unknown_kind_fails() {
        let node = ValidationNode::new(Shape::Unknown("func".into()));
        let err = SwaggerTypeMapper.map(&node, Target::Body).unwrap_err();
        assert_eq!(err, MapError::UnsupportedKind("func".into()));
        assert_eq!(err.to_string(), "unrecognized kind 'func'");
    }
}
