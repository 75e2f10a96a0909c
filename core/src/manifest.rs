#![deny(missing_docs)]

//! # Route Manifests
//!
//! Reads a YAML or JSON manifest into build input. A manifest has four
//! optional sections:
//!
//! ```yaml
//! config:  { unknownKinds: placeholder, sortPaths: path-method }
//! options: { info: { title: Petstore, version: 1.0.0 }, basePath: /v2 }
//! schemas:
//!   Pet:
//!     type: object
//!     properties:
//!       name: { type: string, required: true }
//!       tags: { type: array, items: { ref: Tag } }
//!   Tag: { type: object, properties: { name: { type: string } } }
//! routes:
//!   - method: get
//!     path: /pet/{petId}
//!     validate:
//!       params: { petId: { type: integer, format: int64 } }
//!     responses:
//!       "200": { description: successful operation, schema: { ref: Pet } }
//! ```
//!
//! Named schemas are reusable declarations; `ref` resolves by name, in any
//! order, so schemas may refer to themselves or to each other. A named schema
//! is labelled with its name unless it carries its own `label`.

use crate::config::BuildConfig;
use crate::error::{AppError, AppResult};
use crate::node::{CollectionFormat, Constraints, FormatHint, SchemaId, SchemaSet, Shape, ValidationNode};
use crate::routes::{ParamDocs, PayloadKind, ResponseSpec, RouteSpec};
use crate::swagger::document::RootOptions;
use crate::swagger::models::{HttpMethod, SecurityRequirement};
use crate::swagger::params::FieldDocs;
use crate::walker::Overlay;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Number, Value};

/// Everything a build needs, read from one manifest.
#[derive(Debug, Clone, Default)]
pub struct LoadedManifest {
    /// Build policies.
    pub config: BuildConfig,
    /// Root options.
    pub options: RootOptions,
    /// Reusable declarations.
    pub schemas: SchemaSet,
    /// Routes in manifest order.
    pub routes: Vec<RouteSpec>,
}

/// Parses a YAML manifest.
pub fn load_yaml(source: &str) -> AppResult<LoadedManifest> {
    let raw: RawManifest = serde_yaml::from_str(source)?;
    raw.resolve()
}

/// Parses a JSON manifest.
pub fn load_json(source: &str) -> AppResult<LoadedManifest> {
    let raw: RawManifest = serde_json::from_str(source)?;
    raw.resolve()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawManifest {
    config: BuildConfig,
    options: RootOptions,
    schemas: IndexMap<String, RawNode>,
    routes: Vec<RawRoute>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct RawNode {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
    required: bool,
    default: Option<Value>,
    description: Option<String>,
    example: Option<Value>,
    label: Option<String>,
    properties: Option<IndexMap<String, RawNode>>,
    items: Option<Box<RawNode>>,
    alternatives: Option<Vec<RawNode>>,
    min: Option<Number>,
    max: Option<Number>,
    length: Option<u64>,
    greater: Option<Number>,
    less: Option<Number>,
    multiple: Option<Number>,
    #[serde(rename = "enum")]
    allowed: Vec<Value>,
    pattern: Option<String>,
    format: Option<FormatHint>,
    unique: bool,
    collection_format: Option<CollectionFormat>,
}

/// A bare `{ ref: Name }`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRef {
    #[serde(rename = "ref")]
    reference: String,
}

/// Field rules: a reference to a declared object, or the fields themselves.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRules {
    Ref(RawRef),
    Fields(IndexMap<String, RawNode>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawValidate {
    params: Option<RawRules>,
    query: Option<RawRules>,
    headers: Option<RawRules>,
    payload: Option<RawNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDocs {
    params: FieldDocs,
    query: FieldDocs,
    headers: FieldDocs,
    payload: FieldDocs,
    body: Option<Overlay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct RawResponse {
    description: Option<String>,
    schema: Option<RawNode>,
    as_array: bool,
    headers: Option<RawRules>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRoute {
    method: String,
    path: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, alias = "notes")]
    description: Option<String>,
    #[serde(default)]
    operation_id: Option<String>,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    consumes: Option<Vec<String>>,
    #[serde(default)]
    produces: Option<Vec<String>>,
    #[serde(default)]
    security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    validate: RawValidate,
    #[serde(default)]
    payload_type: PayloadKind,
    #[serde(default)]
    docs: RawDocs,
    #[serde(default)]
    responses: IndexMap<String, RawResponse>,
}

impl RawManifest {
    fn resolve(self) -> AppResult<LoadedManifest> {
        let mut schemas = SchemaSet::new();
        let names: IndexMap<String, SchemaId> = self
            .schemas
            .keys()
            .map(|name| (name.clone(), schemas.reserve()))
            .collect();
        let resolver = Resolver { names: &names };

        for (name, raw) in &self.schemas {
            let mut node = resolver.node(raw, &format!("schemas.{}", name))?;
            if node.label.is_none() {
                node.label = Some(name.clone());
            }
            if let Some(id) = names.get(name) {
                schemas.define(*id, node);
            }
        }

        let routes = self
            .routes
            .into_iter()
            .map(|raw| resolver.route(raw))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(LoadedManifest {
            config: self.config,
            options: self.options,
            schemas,
            routes,
        })
    }
}

struct Resolver<'a> {
    names: &'a IndexMap<String, SchemaId>,
}

impl Resolver<'_> {
    fn lookup(&self, name: &str, at: &str) -> AppResult<SchemaId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| AppError::Manifest(format!("{}: unknown schema '{}'", at, name)))
    }

    fn node(&self, raw: &RawNode, at: &str) -> AppResult<ValidationNode> {
        let shape = match (&raw.reference, raw.kind.as_deref()) {
            (Some(_), Some(kind)) => {
                return Err(AppError::Manifest(format!(
                    "{}: 'ref' cannot be combined with type '{}'",
                    at, kind
                )))
            }
            (Some(name), None) => Shape::Ref(self.lookup(name, at)?),
            (None, Some("object")) | (None, None) if raw.properties.is_some() => {
                Shape::Object(self.fields(raw.properties.iter().flatten(), at)?)
            }
            (None, Some("object")) => Shape::Object(IndexMap::new()),
            (None, Some("array")) => {
                let items = raw.items.as_deref().ok_or_else(|| {
                    AppError::Manifest(format!("{}: array needs 'items'", at))
                })?;
                Shape::Array(Box::new(self.node(items, &format!("{}[]", at))?))
            }
            (None, Some("alternatives")) => {
                let branches = raw.alternatives.iter().flatten().enumerate();
                Shape::Alternatives(
                    branches
                        .map(|(i, b)| self.node(b, &format!("{}|{}", at, i)))
                        .collect::<AppResult<_>>()?,
                )
            }
            (None, Some("string")) => Shape::String,
            (None, Some("number")) => Shape::Number,
            (None, Some("integer")) => Shape::Integer,
            (None, Some("boolean")) => Shape::Boolean,
            (None, Some("binary")) | (None, Some("file")) => Shape::Binary,
            (None, Some("date")) => Shape::Date,
            (None, Some(other)) => Shape::Unknown(other.to_string()),
            (None, None) => {
                return Err(AppError::Manifest(format!(
                    "{}: a rule needs 'type' or 'ref'",
                    at
                )))
            }
        };

        Ok(ValidationNode {
            shape,
            required: raw.required,
            default: raw.default.clone(),
            description: raw.description.clone(),
            example: raw.example.clone(),
            label: raw.label.clone(),
            constraints: Constraints {
                min: raw.min.clone(),
                max: raw.max.clone(),
                length: raw.length,
                greater: raw.greater.clone(),
                less: raw.less.clone(),
                multiple: raw.multiple.clone(),
                allowed: raw.allowed.clone(),
                pattern: raw.pattern.clone(),
                format: raw.format,
                unique: raw.unique,
                collection_format: raw.collection_format,
            },
        })
    }

    fn fields<'r>(
        &self,
        fields: impl Iterator<Item = (&'r String, &'r RawNode)>,
        at: &str,
    ) -> AppResult<IndexMap<String, ValidationNode>> {
        fields
            .map(|(name, raw)| Ok((name.clone(), self.node(raw, &format!("{}.{}", at, name))?)))
            .collect()
    }

    fn rules(&self, raw: Option<&RawRules>, at: &str) -> AppResult<Option<ValidationNode>> {
        Ok(match raw {
            None => None,
            Some(RawRules::Ref(r)) => Some(ValidationNode::reference(self.lookup(&r.reference, at)?)),
            Some(RawRules::Fields(fields)) => {
                Some(ValidationNode::new(Shape::Object(self.fields(fields.iter(), at)?)))
            }
        })
    }

    fn route(&self, raw: RawRoute) -> AppResult<RouteSpec> {
        let at = format!("{} {}", raw.method.to_ascii_uppercase(), raw.path);
        let method: HttpMethod = raw
            .method
            .parse()
            .map_err(|e: String| AppError::route(&at, e))?;

        let mut responses = IndexMap::with_capacity(raw.responses.len());
        for (status, response) in &raw.responses {
            let site = format!("{} response {}", at, status);
            responses.insert(
                status.clone(),
                ResponseSpec {
                    description: response.description.clone(),
                    schema: response
                        .schema
                        .as_ref()
                        .map(|s| self.node(s, &site))
                        .transpose()?,
                    as_array: response.as_array,
                    headers: self.rules(response.headers.as_ref(), &format!("{} headers", site))?,
                },
            );
        }

        let validate = &raw.validate;
        Ok(RouteSpec {
            method,
            tags: raw.tags,
            summary: raw.summary,
            description: raw.description,
            operation_id: raw.operation_id,
            deprecated: raw.deprecated,
            consumes: raw.consumes,
            produces: raw.produces,
            security: raw.security,
            path_rules: self.rules(validate.params.as_ref(), &format!("{} params", at))?,
            query: self.rules(validate.query.as_ref(), &format!("{} query", at))?,
            headers: self.rules(validate.headers.as_ref(), &format!("{} headers", at))?,
            payload: validate
                .payload
                .as_ref()
                .map(|p| self.node(p, &format!("{} payload", at)))
                .transpose()?,
            payload_kind: raw.payload_type,
            responses,
            docs: ParamDocs {
                path: raw.docs.params,
                query: raw.docs.query,
                headers: raw.docs.headers,
                payload: raw.docs.payload,
                body: raw.docs.body,
            },
            path: raw.path,
        })
    }
}
