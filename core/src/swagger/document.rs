#![deny(missing_docs)]

//! # Document Assembly
//!
//! Drives one build: root defaults, caller options, request facts, then one
//! operation per route, then the definitions collected while walking.
//!
//! The assembled document is serialised and checked by the meta validator
//! before it is returned; a build never yields a document that failed it.
//!
//! A `DocumentBuilder` holds only read-only templates. Every call to
//! [`DocumentBuilder::build`] works on its own copy of the defaults and its
//! own definition registry, so concurrent builds cannot see each other.

use crate::config::{BuildConfig, PathSort};
use crate::error::{AppError, AppResult};
use crate::node::SchemaSet;
use crate::routes::{
    derive_operation_id, is_status_key, normalize_template, strip_base_path, PayloadKind,
    RouteSpec,
};
use crate::swagger::models::{
    Contact, DataType, DocumentRoot, ExternalDocs, HttpMethod, License, Location, OperationDoc,
    Parameter, ResponseDoc, Scheme, SecurityRequirement, SecurityScheme, SimpleSchema, Tag,
    Validations,
};
use crate::swagger::params::{assemble, assemble_body, assemble_headers};
use crate::swagger::validation::{validate_document, validate_info};
use crate::type_mapping::Target;
use crate::walker::{BuildWarning, SchemaWalker, WalkContext};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

const MULTIPART: &str = "multipart/form-data";
const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Process-wide document defaults. Read-only; cloned into every build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDefaults {
    /// Version tag.
    pub swagger: String,
    /// Base path when the caller does not supply one.
    pub base_path: String,
    /// Schemes when the request does not reveal one.
    pub schemes: Vec<Scheme>,
    /// Accepted media types.
    pub consumes: Vec<String>,
    /// Produced media types.
    pub produces: Vec<String>,
}

impl Default for RootDefaults {
    fn default() -> Self {
        Self {
            swagger: "2.0".to_string(),
            base_path: "/".to_string(),
            schemes: vec![Scheme::Http],
            consumes: vec!["application/json".to_string()],
            produces: vec!["application/json".to_string()],
        }
    }
}

/// The caller-supplied info block, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InfoOptions {
    /// API title. Required.
    pub title: Option<String>,
    /// API version. Required.
    pub version: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Terms of service URL.
    pub terms_of_service: Option<String>,
    /// Contact details.
    pub contact: Option<Contact>,
    /// License details.
    pub license: Option<License>,
}

/// Caller-supplied root options.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RootOptions {
    /// Info block; defaults apply when absent.
    pub info: Option<InfoOptions>,
    /// Base path override.
    pub base_path: Option<String>,
    /// Accepted media types override.
    pub consumes: Option<Vec<String>>,
    /// Produced media types override.
    pub produces: Option<Vec<String>>,
    /// Tag metadata.
    pub tags: Vec<Tag>,
    /// Security schemes by name.
    pub security_definitions: IndexMap<String, SecurityScheme>,
    /// Root security requirements.
    pub security: Vec<SecurityRequirement>,
    /// External documentation.
    pub external_docs: Option<ExternalDocs>,
}

/// What the incoming documentation request reveals about the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFacts {
    /// `x-forwarded-host` header.
    pub forwarded_host: Option<String>,
    /// `host` header.
    pub host: Option<String>,
    /// `x-forwarded-proto` header.
    pub forwarded_proto: Option<String>,
    /// Protocol the server saw, e.g. `http`.
    pub protocol: Option<String>,
}

impl RequestFacts {
    /// Sets the `host` header.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the `x-forwarded-host` header.
    pub fn with_forwarded_host(mut self, host: impl Into<String>) -> Self {
        self.forwarded_host = Some(host.into());
        self
    }

    /// Sets the `x-forwarded-proto` header.
    pub fn with_forwarded_proto(mut self, proto: impl Into<String>) -> Self {
        self.forwarded_proto = Some(proto.into());
        self
    }

    /// Sets the server protocol.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// The host to document: forwarded host first, then the host header.
    pub fn resolved_host(&self) -> Option<String> {
        self.forwarded_host
            .as_deref()
            .and_then(first_entry)
            .or_else(|| self.host.as_deref().and_then(first_entry))
            .map(str::to_string)
    }

    /// The scheme to document, if the request reveals a known one.
    pub fn resolved_scheme(&self) -> Option<Scheme> {
        let forwarded = self
            .forwarded_proto
            .as_deref()
            .and_then(first_entry)
            .and_then(|p| p.parse().ok());
        forwarded.or_else(|| {
            self.protocol
                .as_deref()
                .and_then(first_entry)
                .and_then(|p| p.parse().ok())
        })
    }
}

fn first_entry(value: &str) -> Option<&str> {
    value
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    /// The validated document.
    pub document: DocumentRoot,
    /// Lossy conversions that did not abort the build.
    pub warnings: Vec<BuildWarning>,
}

/// Builds Swagger 2.0 documents from routes.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    defaults: RootDefaults,
    config: BuildConfig,
}

impl DocumentBuilder {
    /// A builder with the standard defaults.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            defaults: RootDefaults::default(),
            config,
        }
    }

    /// Replaces the defaults template.
    pub fn with_defaults(mut self, defaults: RootDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// The build policies.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Builds and validates one document.
    pub fn build(
        &self,
        options: &RootOptions,
        facts: &RequestFacts,
        schemas: &SchemaSet,
        routes: &[RouteSpec],
    ) -> AppResult<BuildOutput> {
        let defaults = self.defaults.clone();
        let info = validate_info(options.info.as_ref())?;
        let base_path = normalize_base_path(
            options
                .base_path
                .as_deref()
                .unwrap_or(&defaults.base_path),
        );
        let schemes = facts
            .resolved_scheme()
            .map(|scheme| vec![scheme])
            .unwrap_or(defaults.schemes);

        let mut walker = SchemaWalker::new(schemas, &self.config);
        let mut paths: IndexMap<String, IndexMap<HttpMethod, OperationDoc>> = IndexMap::new();
        let mut operation_ids = HashSet::new();

        for route in routes.iter().filter(|r| self.is_documented(r)) {
            let (path, operation) = self.build_operation(&mut walker, route, &base_path)?;
            if !operation_ids.insert(operation.operation_id.clone()) {
                return Err(AppError::route(
                    route.origin(),
                    format!("duplicate operationId '{}'", operation.operation_id),
                ));
            }
            let item = paths.entry(path.clone()).or_default();
            if item.contains_key(&route.method) {
                return Err(AppError::route(
                    route.origin(),
                    format!(
                        "{} {} is declared more than once",
                        route.method.as_str(),
                        path
                    ),
                ));
            }
            item.insert(route.method, operation);
        }

        if self.config.sort_paths == PathSort::PathMethod {
            paths.sort_keys();
            for item in paths.values_mut() {
                item.sort_keys();
            }
        }

        let (definitions, warnings) = walker.finish();
        let document = DocumentRoot {
            swagger: defaults.swagger,
            info,
            host: facts.resolved_host(),
            base_path,
            tags: options.tags.clone(),
            schemes,
            consumes: options.consumes.clone().unwrap_or(defaults.consumes),
            produces: options.produces.clone().unwrap_or(defaults.produces),
            paths,
            security_definitions: options.security_definitions.clone(),
            security: options.security.clone(),
            definitions,
            external_docs: options.external_docs.clone(),
        };

        let value = document
            .to_value()
            .map_err(|e| AppError::assembly("", format!("document does not serialise: {}", e)))?;
        validate_document(&value)?;

        debug!(
            paths = document.paths.len(),
            definitions = document.definitions.len(),
            warnings = warnings.len(),
            "built document"
        );
        Ok(BuildOutput { document, warnings })
    }

    fn is_documented(&self, route: &RouteSpec) -> bool {
        match &self.config.required_tag {
            Some(tag) => route.tags.iter().any(|t| t == tag),
            None => true,
        }
    }

    fn build_operation(
        &self,
        walker: &mut SchemaWalker<'_>,
        route: &RouteSpec,
        base_path: &str,
    ) -> AppResult<(String, OperationDoc)> {
        let origin = route.origin();
        let normalized = normalize_template(&route.path);
        let path = strip_base_path(&normalized.template, base_path);
        if !path.starts_with('/') {
            return Err(AppError::route(&origin, "path must start with '/'"));
        }

        let mut parameters = path_parameters(walker, route, &normalized.placeholders, &origin)?;
        if let Some(query) = &route.query {
            parameters.extend(assemble(
                walker,
                Location::Query,
                query,
                &route.docs.query,
                &origin,
            )?);
        }
        if let Some(headers) = &route.headers {
            parameters.extend(assemble(
                walker,
                Location::Header,
                headers,
                &route.docs.headers,
                &origin,
            )?);
        }

        let mut consumes = route.consumes.clone();
        if let Some(payload) = &route.payload {
            match route.payload_kind {
                PayloadKind::Json => {
                    parameters.push(assemble_body(
                        walker,
                        payload,
                        route.docs.body.as_ref(),
                        &origin,
                    )?);
                }
                PayloadKind::Form => {
                    let fields = assemble(
                        walker,
                        Location::FormData,
                        payload,
                        &route.docs.payload,
                        &origin,
                    )?;
                    let has_file = fields.iter().any(|p| {
                        p.simple
                            .as_ref()
                            .is_some_and(|s| s.data_type == DataType::File)
                    });
                    if consumes.is_none() {
                        let media = if has_file { MULTIPART } else { URLENCODED };
                        consumes = Some(vec![media.to_string()]);
                    }
                    parameters.extend(fields);
                }
            }
        }

        let responses = self.build_responses(walker, route, &origin)?;
        let tags = route
            .tags
            .iter()
            .filter(|t| self.config.required_tag.as_ref() != Some(*t))
            .cloned()
            .collect();
        let operation_id = route
            .operation_id
            .clone()
            .unwrap_or_else(|| derive_operation_id(route.method, &path));

        let operation = OperationDoc {
            tags,
            summary: route.summary.clone(),
            description: route.description.clone(),
            operation_id,
            consumes,
            produces: route.produces.clone(),
            parameters,
            responses,
            deprecated: route.deprecated,
            security: route.security.clone(),
        };
        Ok((path, operation))
    }

    fn build_responses(
        &self,
        walker: &mut SchemaWalker<'_>,
        route: &RouteSpec,
        origin: &str,
    ) -> AppResult<IndexMap<String, ResponseDoc>> {
        let default_description = &self.config.default_response_description;
        let mut responses = IndexMap::new();

        if route.responses.is_empty() {
            responses.insert(
                "default".to_string(),
                ResponseDoc {
                    description: default_description.clone(),
                    schema: None,
                    headers: IndexMap::new(),
                },
            );
            return Ok(responses);
        }

        for (status, spec) in &route.responses {
            if !is_status_key(status) {
                return Err(AppError::route(
                    origin,
                    format!(
                        "response key '{}' is neither 'default' nor a status code",
                        status
                    ),
                ));
            }
            let site = format!("{} response {}", origin, status);
            let schema = match &spec.schema {
                Some(node) => {
                    let ctx = WalkContext::new(Target::Response, site.as_str())
                        .wrapped_in_array(spec.as_array)
                        .hoisting();
                    Some(walker.walk(node, &ctx)?)
                }
                None => None,
            };
            let headers = match &spec.headers {
                Some(rules) => assemble_headers(walker, rules, &site)?,
                None => IndexMap::new(),
            };
            responses.insert(
                status.clone(),
                ResponseDoc {
                    description: spec
                        .description
                        .clone()
                        .unwrap_or_else(|| default_description.clone()),
                    schema,
                    headers,
                },
            );
        }
        Ok(responses)
    }
}

/// Path parameters in placeholder order. Placeholders without a rule become
/// required strings; rules without a placeholder and repeated placeholders
/// are rejected.
fn path_parameters(
    walker: &mut SchemaWalker<'_>,
    route: &RouteSpec,
    placeholders: &[String],
    origin: &str,
) -> AppResult<Vec<Parameter>> {
    let mut seen = HashSet::new();
    if let Some(repeated) = placeholders.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(AppError::route(
            origin,
            format!("path placeholder '{}' appears more than once", repeated),
        ));
    }

    let mut declared = match &route.path_rules {
        Some(rules) => assemble(walker, Location::Path, rules, &route.docs.path, origin)?,
        None => Vec::new(),
    };

    if let Some(stray) = declared
        .iter()
        .find(|p| !placeholders.iter().any(|name| *name == p.name))
    {
        return Err(AppError::route(
            origin,
            format!(
                "path parameter '{}' does not appear in the path template",
                stray.name
            ),
        ));
    }

    let mut parameters = Vec::with_capacity(placeholders.len());
    for name in placeholders {
        match declared.iter().position(|p| p.name == *name) {
            Some(index) => parameters.push(declared.swap_remove(index)),
            None => parameters.push(implicit_path_parameter(name)),
        }
    }
    Ok(parameters)
}

fn implicit_path_parameter(name: &str) -> Parameter {
    Parameter {
        name: name.to_string(),
        location: Location::Path,
        description: None,
        required: true,
        schema: None,
        simple: Some(SimpleSchema {
            data_type: DataType::String,
            format: None,
            items: None,
            collection_format: None,
            default: None,
            validations: Validations::default(),
        }),
        example: None,
    }
}

/// Ensures a single leading slash.
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnknownKindPolicy;
    use crate::node::{FormatHint, Shape, ValidationNode};
    use crate::routes::ResponseSpec;
    use crate::ErrorKind;
    use serde_json::json;

    fn build(routes: &[RouteSpec]) -> AppResult<BuildOutput> {
        DocumentBuilder::default().build(
            &RootOptions::default(),
            &RequestFacts::default(),
            &SchemaSet::new(),
            routes,
        )
    }

    #[test]
    fn test_empty_build_uses_defaults() {
        let output = build(&[]).unwrap();
        let value = output.document.to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "swagger": "2.0",
                "info": { "title": "API documentation", "version": "0.0.1" },
                "basePath": "/",
                "schemes": ["http"],
                "consumes": ["application/json"],
                "produces": ["application/json"],
                "paths": {},
                "definitions": {}
            })
        );
    }

    #[test]
    fn test_missing_title_fails() {
        let options = RootOptions {
            info: Some(InfoOptions::default()),
            ..RootOptions::default()
        };
        let err = DocumentBuilder::default()
            .build(&options, &RequestFacts::default(), &SchemaSet::new(), &[])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Info);
        assert_eq!(err.path(), Some("title"));
    }

    #[test]
    fn test_request_facts() {
        let facts = RequestFacts::default()
            .with_forwarded_host("api.example.com, proxy.internal")
            .with_host("localhost:3000")
            .with_forwarded_proto("https,http")
            .with_protocol("http");
        assert_eq!(facts.resolved_host().as_deref(), Some("api.example.com"));
        assert_eq!(facts.resolved_scheme(), Some(Scheme::Https));

        let bogus = RequestFacts::default()
            .with_forwarded_proto("gopher")
            .with_protocol("http");
        assert_eq!(bogus.resolved_scheme(), Some(Scheme::Http));
        assert_eq!(bogus.resolved_host(), None);
    }

    #[test]
    fn test_implicit_and_ordered_path_parameters() {
        let route = RouteSpec::new(HttpMethod::Get, "/store/{storeId}/order/{orderId?}")
            .with_path_rules(ValidationNode::object([(
                "orderId",
                ValidationNode::integer().with_format(FormatHint::Int64),
            )]));
        let output = build(&[route]).unwrap();
        let op = output
            .document
            .operation("/store/{storeId}/order/{orderId}", HttpMethod::Get)
            .unwrap();
        let names: Vec<_> = op.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["storeId", "orderId"]);
        assert!(op.parameters.iter().all(|p| p.required));
        assert_eq!(op.operation_id, "getStoreStoreIdOrderOrderId");
        assert!(op.responses.contains_key("default"));
    }

    #[test]
    fn test_stray_path_rule_is_route_error() {
        let route = RouteSpec::new(HttpMethod::Get, "/pet")
            .with_path_rules(ValidationNode::object([("petId", ValidationNode::integer())]));
        let err = build(&[route]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Route);
    }

    #[test]
    fn test_repeated_placeholder_is_route_error() {
        let route = RouteSpec::new(HttpMethod::Get, "/a/{id}/b/{id?}");
        let err = build(&[route]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Route);
        assert_eq!(err.path(), Some("GET /a/{id}/b/{id?}"));
    }

    #[test]
    fn test_example_with_ref_key_builds() {
        let route = RouteSpec::new(HttpMethod::Get, "/links").with_response(
            "200",
            ResponseSpec::new("ok").with_schema(
                ValidationNode::object([("href", ValidationNode::string())])
                    .with_example(json!({ "$ref": "some-string" })),
            ),
        );
        let output = build(&[route]).unwrap();
        assert_eq!(
            output.document.definitions["Model1"].example,
            Some(json!({ "$ref": "some-string" }))
        );
    }

    #[test]
    fn test_duplicates_rejected() {
        let a = RouteSpec::new(HttpMethod::Get, "/pet").with_operation_id("listPets");
        let b = RouteSpec::new(HttpMethod::Post, "/pet").with_operation_id("listPets");
        assert_eq!(build(&[a, b]).unwrap_err().kind(), ErrorKind::Route);

        let c = RouteSpec::new(HttpMethod::Get, "/pet/{id}");
        let d = RouteSpec::new(HttpMethod::Get, "/pet/{id?}").with_operation_id("other");
        assert_eq!(build(&[c, d]).unwrap_err().kind(), ErrorKind::Route);
    }

    #[test]
    fn test_invalid_status_key() {
        let route = RouteSpec::new(HttpMethod::Get, "/pet")
            .with_response("2XX", ResponseSpec::new("fine"));
        assert_eq!(build(&[route]).unwrap_err().kind(), ErrorKind::Route);
    }

    #[test]
    fn test_form_payload_with_file() {
        let route = RouteSpec::new(HttpMethod::Post, "/pet/{petId}/uploadImage").with_payload(
            ValidationNode::object([
                ("additionalMetadata", ValidationNode::string()),
                ("file", ValidationNode::binary()),
            ]),
            PayloadKind::Form,
        );
        let output = build(&[route]).unwrap();
        let op = output
            .document
            .operation("/pet/{petId}/uploadImage", HttpMethod::Post)
            .unwrap();
        assert_eq!(op.consumes, Some(vec![MULTIPART.to_string()]));
        let value = serde_json::to_value(&op.parameters[2]).unwrap();
        assert_eq!(
            value,
            json!({ "name": "file", "in": "formData", "required": false, "type": "file" })
        );
    }

    #[test]
    fn test_form_payload_without_file() {
        let route = RouteSpec::new(HttpMethod::Post, "/login").with_payload(
            ValidationNode::object([("user", ValidationNode::string().required())]),
            PayloadKind::Form,
        );
        let output = build(&[route]).unwrap();
        let op = output.document.operation("/login", HttpMethod::Post).unwrap();
        assert_eq!(op.consumes, Some(vec![URLENCODED.to_string()]));
    }

    #[test]
    fn test_base_path_is_stripped() {
        let options = RootOptions {
            base_path: Some("v2".into()),
            ..RootOptions::default()
        };
        let routes = [RouteSpec::new(HttpMethod::Get, "/v2/pet")];
        let output = DocumentBuilder::default()
            .build(&options, &RequestFacts::default(), &SchemaSet::new(), &routes)
            .unwrap();
        assert_eq!(output.document.base_path, "/v2");
        assert!(output.document.paths.contains_key("/pet"));
    }

    #[test]
    fn test_required_tag_filters_and_strips() {
        let config = BuildConfig::default().with_required_tag("api");
        let routes = [
            RouteSpec::new(HttpMethod::Get, "/pet").with_tags(["api", "pet"]),
            RouteSpec::new(HttpMethod::Get, "/internal").with_tags(["admin"]),
        ];
        let output = DocumentBuilder::new(config)
            .build(
                &RootOptions::default(),
                &RequestFacts::default(),
                &SchemaSet::new(),
                &routes,
            )
            .unwrap();
        assert_eq!(output.document.paths.len(), 1);
        let op = output.document.operation("/pet", HttpMethod::Get).unwrap();
        assert_eq!(op.tags, vec!["pet"]);
    }

    #[test]
    fn test_sorted_paths() {
        let config = BuildConfig::default().with_sort_paths(PathSort::PathMethod);
        let routes = [
            RouteSpec::new(HttpMethod::Post, "/user"),
            RouteSpec::new(HttpMethod::Get, "/pet"),
            RouteSpec::new(HttpMethod::Get, "/user"),
        ];
        let output = DocumentBuilder::new(config)
            .build(
                &RootOptions::default(),
                &RequestFacts::default(),
                &SchemaSet::new(),
                &routes,
            )
            .unwrap();
        let keys: Vec<_> = output.document.paths.keys().cloned().collect();
        assert_eq!(keys, vec!["/pet", "/user"]);
        let methods: Vec<_> = output.document.paths["/user"].keys().copied().collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Post]);
    }

    #[test]
    fn test_unknown_kind_policy_reaches_build() {
        let route = RouteSpec::new(HttpMethod::Get, "/x").with_response(
            "200",
            ResponseSpec::new("ok").with_schema(ValidationNode::new(Shape::Unknown("func".into()))),
        );
        let err = build(&[route.clone()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);

        let config = BuildConfig::default().with_unknown_kinds(UnknownKindPolicy::Placeholder);
        let output = DocumentBuilder::new(config)
            .build(
                &RootOptions::default(),
                &RequestFacts::default(),
                &SchemaSet::new(),
                &[route],
            )
            .unwrap();
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_array_response_of_anonymous_object() {
        let route = RouteSpec::new(HttpMethod::Get, "/orders").with_response(
            "200",
            ResponseSpec::new("ok")
                .with_schema(ValidationNode::object([("id", ValidationNode::integer())]))
                .as_array(),
        );
        let output = build(&[route]).unwrap();
        let op = output.document.operation("/orders", HttpMethod::Get).unwrap();
        assert_eq!(
            serde_json::to_value(&op.responses["200"]).unwrap(),
            json!({
                "description": "ok",
                "schema": { "type": "array", "items": { "$ref": "#/definitions/Model1" } }
            })
        );
    }
}
