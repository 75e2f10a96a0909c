#![deny(missing_docs)]

//! # Parameter Assembly
//!
//! Turns the located validation rules of one operation into its ordered
//! parameter list.
//!
//! Non-body locations are flat by the document grammar: each field must be a
//! primitive or an array of primitives, and arrays carry a `collectionFormat`
//! (`csv` unless the rule says otherwise). The body location always yields
//! exactly one parameter named `body` holding a schema or a reference.

use crate::error::{AppError, AppResult};
use crate::node::{CollectionFormat, Shape, ValidationNode};
use crate::swagger::models::{
    DataType, Location, Parameter, ResponseHeader, SchemaObject, SchemaRef, SimpleSchema,
};
use crate::type_mapping::{Target, TypeMapper};
use crate::walker::{Overlay, SchemaWalker, WalkContext};
use indexmap::IndexMap;
use serde_json::Value;

/// Per-field documentation overlays, keyed by field name.
pub type FieldDocs = IndexMap<String, Overlay>;

/// A flat parameter type plus the annotations lifted out of it.
struct Flattened {
    simple: SimpleSchema,
    description: Option<String>,
    example: Option<Value>,
}

/// Assembles the parameters of one non-body location, in declared order.
///
/// `rules` must be an object rule (or a reference to a declared one); each
/// property becomes one parameter.
pub fn assemble<M: TypeMapper>(
    walker: &mut SchemaWalker<'_, M>,
    location: Location,
    rules: &ValidationNode,
    docs: &FieldDocs,
    origin: &str,
) -> AppResult<Vec<Parameter>> {
    if location == Location::Body {
        return Err(AppError::schema(
            origin,
            "body rules must be assembled as a single body parameter",
        ));
    }

    let path = format!("{} {}", origin, location);
    let fields = object_fields(walker, rules, &path)?;
    let mut parameters = Vec::with_capacity(fields.len());

    for (name, rule) in fields {
        let field_path = format!("{}.{}", path, name);
        let flat = flatten(walker, rule, location, docs.get(name), &field_path)?;
        parameters.push(Parameter {
            name: name.clone(),
            location,
            description: flat.description,
            // Path parameters are always required by the grammar.
            required: location == Location::Path || rule.required,
            schema: None,
            simple: Some(flat.simple),
            example: flat.example,
        });
    }

    Ok(parameters)
}

/// Assembles the single body parameter of a JSON payload.
///
/// Anonymous top-level objects are hoisted into a definition so the body
/// schema is always a reference for object payloads.
pub fn assemble_body<M: TypeMapper>(
    walker: &mut SchemaWalker<'_, M>,
    payload: &ValidationNode,
    overlay: Option<&Overlay>,
    origin: &str,
) -> AppResult<Parameter> {
    let ctx = WalkContext::new(Target::Body, format!("{} body", origin))
        .with_overlay(overlay)
        .hoisting();
    let schema = walker.walk(payload, &ctx)?;
    let description = overlay
        .and_then(|o| o.description.clone())
        .or_else(|| payload.description.clone());

    Ok(Parameter {
        name: "body".to_string(),
        location: Location::Body,
        description,
        required: payload.required,
        schema: Some(schema),
        simple: None,
        example: None,
    })
}

/// Assembles the headers documented on one response.
pub fn assemble_headers<M: TypeMapper>(
    walker: &mut SchemaWalker<'_, M>,
    rules: &ValidationNode,
    origin: &str,
) -> AppResult<IndexMap<String, ResponseHeader>> {
    let path = format!("{} headers", origin);
    let fields = object_fields(walker, rules, &path)?;
    let mut headers = IndexMap::with_capacity(fields.len());

    for (name, rule) in fields {
        let field_path = format!("{}.{}", path, name);
        let flat = flatten(walker, rule, Location::Header, None, &field_path)?;
        headers.insert(
            name.clone(),
            ResponseHeader {
                description: flat.description,
                simple: flat.simple,
            },
        );
    }

    Ok(headers)
}

/// The properties of an object rule, looking through a declaration reference.
fn object_fields<'n, 's: 'n, M: TypeMapper>(
    walker: &SchemaWalker<'s, M>,
    rules: &'n ValidationNode,
    path: &str,
) -> AppResult<&'n IndexMap<String, ValidationNode>> {
    let resolved = resolve(walker, rules);
    match &resolved.shape {
        Shape::Object(fields) => Ok(fields),
        other => Err(AppError::schema(
            path,
            format!("expected an object of named fields, got {}", other.kind_name()),
        )),
    }
}

fn resolve<'n, 's: 'n, M: TypeMapper>(
    walker: &SchemaWalker<'s, M>,
    node: &'n ValidationNode,
) -> &'n ValidationNode {
    match &node.shape {
        Shape::Ref(id) => walker.declaration(*id).unwrap_or(node),
        _ => node,
    }
}

fn flatten<M: TypeMapper>(
    walker: &mut SchemaWalker<'_, M>,
    rule: &ValidationNode,
    location: Location,
    overlay: Option<&Overlay>,
    path: &str,
) -> AppResult<Flattened> {
    let ctx = WalkContext::new(Target::Parameter(location), path).with_overlay(overlay);
    let schema = match walker.walk(rule, &ctx)? {
        SchemaRef::Inline(schema) => *schema,
        SchemaRef::Ref(r) => {
            return Err(AppError::schema(
                path,
                format!(
                    "{} parameters cannot reference a definition ({})",
                    location, r.reference
                ),
            ))
        }
    };

    let description = schema.description.clone();
    let example = schema.example.clone();
    let mut simple = simple_schema(schema, location, path, false)?;

    if simple.data_type == DataType::Array {
        let format = resolve(walker, rule)
            .constraints
            .collection_format
            .unwrap_or_default();
        if format == CollectionFormat::Multi
            && !matches!(location, Location::Query | Location::FormData)
        {
            return Err(AppError::schema(
                path,
                format!("collection format 'multi' is not allowed in {}", location),
            ));
        }
        simple.collection_format = Some(format);
    }

    Ok(Flattened {
        simple,
        description,
        example,
    })
}

fn simple_schema(
    schema: SchemaObject,
    location: Location,
    path: &str,
    nested: bool,
) -> AppResult<SimpleSchema> {
    let data_type = schema
        .data_type
        .ok_or_else(|| AppError::schema(path, format!("{} parameter has no type", location)))?;

    match data_type {
        DataType::Object => {
            return Err(AppError::schema(
                path,
                format!("{} parameters cannot be objects", location),
            ))
        }
        DataType::File if nested || location != Location::FormData => {
            return Err(AppError::schema(
                path,
                "files are only allowed as top-level formData parameters",
            ))
        }
        _ => {}
    }

    let items = match schema.items {
        Some(items) => match *items {
            SchemaRef::Inline(item) => Some(Box::new(simple_schema(*item, location, path, true)?)),
            SchemaRef::Ref(r) => {
                return Err(AppError::schema(
                    path,
                    format!(
                        "{} parameter items cannot reference a definition ({})",
                        location, r.reference
                    ),
                ))
            }
        },
        None => None,
    };

    Ok(SimpleSchema {
        data_type,
        format: schema.format,
        items,
        collection_format: None,
        default: schema.default,
        validations: schema.validations,
    })
}
