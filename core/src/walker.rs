#![deny(missing_docs)]

//! # Schema Walker
//!
//! Recursive descent from a [`ValidationNode`] tree to a schema fragment or a
//! reference into the [`DefinitionRegistry`].
//!
//! - Primitives are delegated to the [`TypeMapper`].
//! - Arrays wrap their walked item; object items are hoisted into definitions.
//! - Declared objects and arrays become definitions; declared primitives and
//!   unions are expanded inline.
//! - Anonymous objects stay inline, except at the top of a body or response.
//! - Unions keep their first resolvable branch and report the rest.
//!
//! The walker never mutates its input. One walker serves one build.

use crate::config::{BuildConfig, UnknownKindPolicy};
use crate::error::{AppError, AppResult};
use crate::node::{SchemaId, SchemaSet, Shape, ValidationNode};
use crate::registry::{DefinitionRegistry, Registration};
use crate::swagger::models::{DataType, SchemaObject, SchemaRef};
use crate::type_mapping::{count_bound, MapError, SwaggerTypeMapper, Target, TypeMapper};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::fmt;
use tracing::warn;

/// Caller-supplied documentation for one usage site. Wins over the rule's own
/// description and example.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Overlay {
    /// Description override.
    #[serde(default)]
    pub description: Option<String>,
    /// Example override.
    #[serde(default)]
    pub example: Option<Value>,
}

impl Overlay {
    /// An overlay carrying only a description.
    pub fn describe(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            example: None,
        }
    }
}

/// A lossy conversion that did not abort the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildWarning {
    /// Location of the rule, e.g. `POST /pet body.owner`.
    pub path: String,
    /// What was lost.
    pub message: String,
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Per-call walking context.
#[derive(Debug, Clone)]
pub struct WalkContext<'a> {
    /// Where the result is used.
    pub target: Target,
    /// Wrap the result as `{type: array, items: <result>}`.
    pub wrap_array: bool,
    /// Usage-site documentation.
    pub overlay: Option<&'a Overlay>,
    /// Register an anonymous top-level object instead of inlining it.
    pub hoist_objects: bool,
    /// Human readable location for diagnostics.
    pub path: String,
}

impl<'a> WalkContext<'a> {
    /// A context for the given target, with nothing wrapped or hoisted.
    pub fn new(target: Target, path: impl Into<String>) -> Self {
        Self {
            target,
            wrap_array: false,
            overlay: None,
            hoist_objects: false,
            path: path.into(),
        }
    }

    /// Applies a usage-site overlay.
    pub fn with_overlay(mut self, overlay: Option<&'a Overlay>) -> Self {
        self.overlay = overlay;
        self
    }

    /// Requests an array wrapper around the result.
    pub fn wrapped_in_array(mut self, wrap: bool) -> Self {
        self.wrap_array = wrap;
        self
    }

    /// Hoists an anonymous top-level object into a definition.
    pub fn hoisting(mut self) -> Self {
        self.hoist_objects = true;
        self
    }

    fn child(&self, segment: &str) -> WalkContext<'a> {
        WalkContext {
            target: self.target,
            wrap_array: false,
            overlay: None,
            hoist_objects: false,
            path: format!("{}.{}", self.path, segment),
        }
    }

    fn definition(&self, key: &str) -> WalkContext<'a> {
        WalkContext {
            target: Target::Body,
            wrap_array: false,
            overlay: None,
            hoist_objects: false,
            path: format!("definitions.{}", key),
        }
    }

    fn unwrapped(&self) -> WalkContext<'a> {
        WalkContext {
            wrap_array: false,
            ..self.clone()
        }
    }
}

/// Walks validation trees for one build.
pub struct SchemaWalker<'s, M: TypeMapper = SwaggerTypeMapper> {
    schemas: &'s SchemaSet,
    config: &'s BuildConfig,
    mapper: M,
    registry: DefinitionRegistry,
    warnings: Vec<BuildWarning>,
    expanding: Vec<SchemaId>,
}

impl<'s> SchemaWalker<'s> {
    /// Creates a walker with the standard type mapper and an empty registry.
    pub fn new(schemas: &'s SchemaSet, config: &'s BuildConfig) -> Self {
        Self::with_mapper(schemas, config, SwaggerTypeMapper)
    }
}

impl<'s, M: TypeMapper> SchemaWalker<'s, M> {
    /// Creates a walker with a custom type mapper.
    pub fn with_mapper(schemas: &'s SchemaSet, config: &'s BuildConfig, mapper: M) -> Self {
        Self {
            schemas,
            config,
            mapper,
            registry: DefinitionRegistry::new(),
            warnings: Vec::new(),
            expanding: Vec::new(),
        }
    }

    /// The registry accumulated so far.
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// Warnings accumulated so far.
    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Looks up a declaration.
    pub fn declaration(&self, id: SchemaId) -> Option<&'s ValidationNode> {
        self.schemas.get(id)
    }

    /// Ends the walk, yielding the definitions table and the warnings.
    pub fn finish(self) -> (IndexMap<String, SchemaObject>, Vec<BuildWarning>) {
        (self.registry.into_definitions(), self.warnings)
    }

    /// Converts `node` into an inline fragment or a definition reference.
    pub fn walk(&mut self, node: &ValidationNode, ctx: &WalkContext<'_>) -> AppResult<SchemaRef> {
        let walked = self.walk_shape(node, ctx)?;
        if ctx.wrap_array {
            return Ok(SchemaRef::inline(SchemaObject::array_of(walked)));
        }
        Ok(walked)
    }

    fn walk_shape(&mut self, node: &ValidationNode, ctx: &WalkContext<'_>) -> AppResult<SchemaRef> {
        match &node.shape {
            Shape::Object(properties) => {
                let object = self.walk_object(node, properties, ctx)?;
                if ctx.hoist_objects {
                    Ok(self
                        .registry
                        .register_anonymous(node.label.as_deref(), object))
                } else {
                    Ok(SchemaRef::inline(object))
                }
            }
            Shape::Array(item) => self.walk_array(node, item, ctx).map(SchemaRef::inline),
            Shape::Alternatives(branches) => self.walk_alternatives(node, branches, ctx),
            Shape::Ref(id) => self.walk_declared(node, *id, ctx),
            _ => self.walk_primitive(node, ctx).map(SchemaRef::inline),
        }
    }

    fn walk_object(
        &mut self,
        node: &ValidationNode,
        properties: &IndexMap<String, ValidationNode>,
        ctx: &WalkContext<'_>,
    ) -> AppResult<SchemaObject> {
        let mut schema = SchemaObject::of_type(DataType::Object);
        let mut walked = IndexMap::new();

        for (name, child) in properties {
            let fragment = self.walk(child, &ctx.child(name))?;
            walked.insert(name.clone(), fragment);
            if child.required {
                schema.required.push(name.clone());
            }
        }

        schema.properties = Some(walked);
        annotate(&mut schema, node, ctx.overlay);
        Ok(schema)
    }

    fn walk_array(
        &mut self,
        node: &ValidationNode,
        item: &ValidationNode,
        ctx: &WalkContext<'_>,
    ) -> AppResult<SchemaObject> {
        let item_ctx = ctx.child("[]");
        let items = match &item.shape {
            // Object items are referenced so that they can be reused.
            Shape::Object(properties) if !matches!(ctx.target, Target::Parameter(_)) => {
                let object = self.walk_object(item, properties, &item_ctx)?;
                self.registry
                    .register_anonymous(item.label.as_deref(), object)
            }
            _ => self.walk(item, &item_ctx)?,
        };

        let mut schema = SchemaObject::array_of(items);
        let c = &node.constraints;
        let bound =
            |n: &Number, which: &str| count_bound(n, which).map_err(|e| schema_error(ctx, e));
        schema.validations.min_items = c.min.as_ref().map(|n| bound(n, "min")).transpose()?;
        schema.validations.max_items = c.max.as_ref().map(|n| bound(n, "max")).transpose()?;
        if let Some(length) = c.length {
            schema.validations.min_items = Some(length);
            schema.validations.max_items = Some(length);
        }
        schema.validations.unique_items = c.unique;
        annotate(&mut schema, node, ctx.overlay);
        Ok(schema)
    }

    fn walk_alternatives(
        &mut self,
        node: &ValidationNode,
        branches: &[ValidationNode],
        ctx: &WalkContext<'_>,
    ) -> AppResult<SchemaRef> {
        let Some(chosen) = branches
            .iter()
            .position(|b| self.is_resolvable(b, ctx.target))
        else {
            return Err(AppError::schema(
                &ctx.path,
                "alternatives have no branch that can be expressed",
            ));
        };

        if branches.len() > 1 && self.config.union_warnings {
            self.warn(
                &ctx.path,
                format!(
                    "alternatives cannot be expressed in Swagger 2.0; emitted branch {} ({}) and dropped {} other branch(es)",
                    chosen,
                    branches[chosen].kind_name(),
                    branches.len() - 1
                ),
            );
        }

        let mut walked = self.walk(&branches[chosen], &ctx.unwrapped())?;
        if let SchemaRef::Inline(schema) = &mut walked {
            annotate(schema, node, ctx.overlay);
        }
        Ok(walked)
    }

    fn walk_declared(
        &mut self,
        usage: &ValidationNode,
        id: SchemaId,
        ctx: &WalkContext<'_>,
    ) -> AppResult<SchemaRef> {
        let schemas = self.schemas;
        let declared = schemas.get(id).ok_or_else(|| {
            AppError::schema(&ctx.path, format!("reference to undefined declaration {}", id))
        })?;

        match &declared.shape {
            Shape::Object(properties) => self.define(id, declared, ctx, |walker, def_ctx| {
                walker.walk_object(declared, properties, def_ctx)
            }),
            // Parameters are flat, so declared arrays are expanded in place there.
            Shape::Array(item) if !matches!(ctx.target, Target::Parameter(_)) => {
                self.define(id, declared, ctx, |walker, def_ctx| {
                    walker.walk_array(declared, item, def_ctx)
                })
            }
            _ => {
                if self.expanding.contains(&id) {
                    return Err(AppError::schema(
                        &ctx.path,
                        format!(
                            "declaration {} refers to itself without passing through an object or array",
                            id
                        ),
                    ));
                }
                self.expanding.push(id);
                let result = self.walk_shape(declared, &ctx.unwrapped());
                self.expanding.pop();
                let mut walked = result?;
                if let SchemaRef::Inline(schema) = &mut walked {
                    apply_usage(schema, usage);
                    if let Some(overlay) = ctx.overlay {
                        apply_overlay(schema, overlay);
                    }
                }
                Ok(walked)
            }
        }
    }

    fn define(
        &mut self,
        id: SchemaId,
        declared: &ValidationNode,
        ctx: &WalkContext<'_>,
        body: impl FnOnce(&mut Self, &WalkContext<'_>) -> AppResult<SchemaObject>,
    ) -> AppResult<SchemaRef> {
        match self.registry.register(id, declared.label.as_deref()) {
            Registration::Existing(key) => Ok(SchemaRef::to_definition(&key)),
            Registration::Reserved(key) => {
                let def_ctx = ctx.definition(&key);
                let schema = body(self, &def_ctx)?;
                self.registry.complete(id, schema).ok_or_else(|| {
                    AppError::schema(&ctx.path, format!("definition '{}' vanished", key))
                })
            }
        }
    }

    fn walk_primitive(
        &mut self,
        node: &ValidationNode,
        ctx: &WalkContext<'_>,
    ) -> AppResult<SchemaObject> {
        let info = match self.mapper.map(node, ctx.target) {
            Ok(info) => info,
            Err(MapError::UnsupportedKind(kind)) => {
                return match self.config.unknown_kinds {
                    UnknownKindPolicy::Reject => Err(AppError::schema(
                        &ctx.path,
                        format!("unrecognized kind '{}'", kind),
                    )),
                    UnknownKindPolicy::Placeholder => {
                        self.warn(
                            &ctx.path,
                            format!("unrecognized kind '{}' emitted as type string", kind),
                        );
                        let mut schema = SchemaObject::of_type(DataType::String);
                        annotate(&mut schema, node, ctx.overlay);
                        Ok(schema)
                    }
                };
            }
            Err(e) => return Err(schema_error(ctx, e)),
        };

        if let Some(hint) = info.ignored_hint {
            self.warn(
                &ctx.path,
                format!(
                    "format hint '{}' does not apply to kind '{}' and was ignored",
                    hint.as_str(),
                    node.kind_name()
                ),
            );
        }

        let mut schema = SchemaObject {
            data_type: Some(info.data_type),
            format: info.format,
            validations: info.validations,
            ..SchemaObject::default()
        };
        annotate(&mut schema, node, ctx.overlay);
        Ok(schema)
    }

    /// Whether a branch can be walked for `target` without hitting an
    /// unrecoverable kind or a shape the target cannot hold.
    fn is_resolvable(&self, node: &ValidationNode, target: Target) -> bool {
        self.resolvable(node, target, &mut Vec::new())
    }

    fn resolvable(&self, node: &ValidationNode, target: Target, seen: &mut Vec<SchemaId>) -> bool {
        let in_parameter = matches!(target, Target::Parameter(_));
        match &node.shape {
            Shape::Unknown(_) => self.config.unknown_kinds == UnknownKindPolicy::Placeholder,
            Shape::Object(properties) => {
                !in_parameter
                    && properties
                        .values()
                        .all(|child| self.resolvable(child, target, seen))
            }
            Shape::Array(item) => self.resolvable(item, target, seen),
            Shape::Alternatives(branches) => {
                branches.iter().any(|b| self.resolvable(b, target, seen))
            }
            Shape::Ref(id) => {
                let Some(declared) = self.schemas.get(*id) else {
                    return false;
                };
                if seen.contains(id) {
                    // A cycle is only walkable through a definition.
                    return !in_parameter
                        && matches!(declared.shape, Shape::Object(_) | Shape::Array(_));
                }
                seen.push(*id);
                let resolvable = self.resolvable(declared, target, seen);
                seen.pop();
                resolvable
            }
            _ => true,
        }
    }

    fn warn(&mut self, path: &str, message: String) {
        warn!(path = %path, "{}", message);
        self.warnings.push(BuildWarning {
            path: path.to_string(),
            message,
        });
    }
}

/// Copies description, example and default from the rule, then the overlay.
fn annotate(schema: &mut SchemaObject, node: &ValidationNode, overlay: Option<&Overlay>) {
    if schema.description.is_none() {
        schema.description = node.description.clone();
    }
    if schema.example.is_none() {
        schema.example = node.example.clone();
    }
    if schema.default.is_none() {
        schema.default = node.default.clone();
    }
    if let Some(overlay) = overlay {
        apply_overlay(schema, overlay);
    }
}

/// Usage-site annotations on a reference win over the declaration's own.
fn apply_usage(schema: &mut SchemaObject, usage: &ValidationNode) {
    if let Some(description) = &usage.description {
        schema.description = Some(description.clone());
    }
    if let Some(example) = &usage.example {
        schema.example = Some(example.clone());
    }
    if let Some(default) = &usage.default {
        schema.default = Some(default.clone());
    }
}

fn apply_overlay(schema: &mut SchemaObject, overlay: &Overlay) {
    if let Some(description) = &overlay.description {
        schema.description = Some(description.clone());
    }
    if let Some(example) = &overlay.example {
        schema.example = Some(example.clone());
    }
}

fn schema_error(ctx: &WalkContext<'_>, err: MapError) -> AppError {
    AppError::schema(&ctx.path, err.to_string())
}
