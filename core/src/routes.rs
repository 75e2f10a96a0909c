#![deny(missing_docs)]

//! # Routes
//!
//! The per-route input of a build, as handed over by the host framework, and
//! the path helpers used to turn it into document paths:
//!
//! - hapi-style placeholders (`{id?}`, `{path*}`, `{path*2}`) normalised to `{id}`,
//! - base path stripping,
//! - default `operationId` derivation (`GET /pet/{petId}` -> `getPetPetId`).

use crate::node::ValidationNode;
use crate::swagger::models::{HttpMethod, SecurityRequirement};
use crate::swagger::params::FieldDocs;
use crate::walker::Overlay;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// How the payload rule is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// One body parameter.
    #[default]
    Json,
    /// One formData parameter per payload field.
    Form,
}

/// One documented response of a route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSpec {
    /// Description; the configured default is used when absent.
    pub description: Option<String>,
    /// Shape of the response body.
    pub schema: Option<ValidationNode>,
    /// Wrap the schema as an array of it.
    pub as_array: bool,
    /// Object rule describing the response headers.
    pub headers: Option<ValidationNode>,
}

impl ResponseSpec {
    /// A response with a description and no body.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Sets the body shape.
    pub fn with_schema(mut self, schema: ValidationNode) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Documents the body as an array of the schema.
    pub fn as_array(mut self) -> Self {
        self.as_array = true;
        self
    }

    /// Sets the response header rules.
    pub fn with_headers(mut self, headers: ValidationNode) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Documentation overlays for the parameters of a route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamDocs {
    /// Path parameters.
    pub path: FieldDocs,
    /// Query parameters.
    pub query: FieldDocs,
    /// Header parameters.
    pub headers: FieldDocs,
    /// Form payload fields.
    pub payload: FieldDocs,
    /// The body parameter.
    pub body: Option<Overlay>,
}

/// A registered route and its validation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSpec {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template, possibly with hapi-style placeholders.
    pub path: String,
    /// Grouping tags.
    pub tags: Vec<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Explicit operation id.
    pub operation_id: Option<String>,
    /// Whether the route is deprecated.
    pub deprecated: bool,
    /// Accepted media types, overriding the document's.
    pub consumes: Option<Vec<String>>,
    /// Produced media types, overriding the document's.
    pub produces: Option<Vec<String>>,
    /// Security requirements, overriding the document's.
    pub security: Option<Vec<SecurityRequirement>>,
    /// Object rule for path parameters.
    pub path_rules: Option<ValidationNode>,
    /// Object rule for query parameters.
    pub query: Option<ValidationNode>,
    /// Object rule for header parameters.
    pub headers: Option<ValidationNode>,
    /// Payload rule.
    pub payload: Option<ValidationNode>,
    /// How the payload is sent.
    pub payload_kind: PayloadKind,
    /// Responses keyed by status code or `default`.
    pub responses: IndexMap<String, ResponseSpec>,
    /// Parameter documentation overlays.
    pub docs: ParamDocs,
}

impl RouteSpec {
    /// A route with no rules.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            tags: Vec::new(),
            summary: None,
            description: None,
            operation_id: None,
            deprecated: false,
            consumes: None,
            produces: None,
            security: None,
            path_rules: None,
            query: None,
            headers: None,
            payload: None,
            payload_kind: PayloadKind::default(),
            responses: IndexMap::new(),
            docs: ParamDocs::default(),
        }
    }

    /// Sets the tags.
    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the operation id.
    pub fn with_operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Sets the path parameter rules.
    pub fn with_path_rules(mut self, rules: ValidationNode) -> Self {
        self.path_rules = Some(rules);
        self
    }

    /// Sets the query parameter rules.
    pub fn with_query(mut self, rules: ValidationNode) -> Self {
        self.query = Some(rules);
        self
    }

    /// Sets the header parameter rules.
    pub fn with_headers(mut self, rules: ValidationNode) -> Self {
        self.headers = Some(rules);
        self
    }

    /// Sets the payload rule and how it is sent.
    pub fn with_payload(mut self, payload: ValidationNode, kind: PayloadKind) -> Self {
        self.payload = Some(payload);
        self.payload_kind = kind;
        self
    }

    /// Adds a response.
    pub fn with_response(mut self, status: impl Into<String>, response: ResponseSpec) -> Self {
        self.responses.insert(status.into(), response);
        self
    }

    /// `METHOD /path`, for diagnostics.
    pub fn origin(&self) -> String {
        format!("{} {}", self.method.as_str().to_ascii_uppercase(), self.path)
    }
}

/// A path template with hapi modifiers removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    /// The template, e.g. `/file/{path}`.
    pub template: String,
    /// Placeholder names in order of appearance.
    pub placeholders: Vec<String>,
}

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"\{([^{}?*]+)(?:\?|\*\d*)?\}").expect("Invalid regex"))
}

/// Strips optional and multi-segment markers from placeholders.
///
/// `/file/{path*2}` becomes `/file/{path}`, `/user/{id?}` becomes `/user/{id}`.
pub fn normalize_template(path: &str) -> NormalizedPath {
    let re = placeholder_re();
    let placeholders = re
        .captures_iter(path)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    let template = re.replace_all(path, "{$1}").into_owned();
    NormalizedPath {
        template,
        placeholders,
    }
}

/// Removes `base_path` from the front of `path`. A base path of `/` is a no-op.
pub fn strip_base_path(path: &str, base_path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    if base.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(base) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

/// Derives a camelCase operation id from method and path.
///
/// e.g. `GET /pet/{petId}` -> `getPetPetId`
pub fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.as_str().to_string();
    for word in path.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            id.push(first.to_ascii_uppercase());
            id.push_str(chars.as_str());
        }
    }
    id
}

/// Whether `key` is `default` or a three digit status code in 100..=599.
pub fn is_status_key(key: &str) -> bool {
    if key == "default" {
        return true;
    }
    key.len() == 3
        && key.bytes().all(|b| b.is_ascii_digit())
        && key.parse::<u16>().is_ok_and(|code| (100..=599).contains(&code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_template() {
        let cases = vec![
            ("/pet/{petId}", "/pet/{petId}", vec!["petId"]),
            ("/user/{id?}", "/user/{id}", vec!["id"]),
            ("/file/{path*}", "/file/{path}", vec!["path"]),
            ("/a/{x}/b/{y*2}", "/a/{x}/b/{y}", vec!["x", "y"]),
            ("/plain", "/plain", vec![]),
        ];
        for (input, template, names) in cases {
            let normalized = normalize_template(input);
            assert_eq!(normalized.template, template);
            assert_eq!(normalized.placeholders, names);
        }
    }

    #[test]
    fn test_strip_base_path() {
        assert_eq!(strip_base_path("/v2/pet", "/v2"), "/pet");
        assert_eq!(strip_base_path("/v2", "/v2"), "/");
        assert_eq!(strip_base_path("/v2pet", "/v2"), "/v2pet");
        assert_eq!(strip_base_path("/pet", "/"), "/pet");
        assert_eq!(strip_base_path("/v2/pet", "/v2/"), "/pet");
    }

    #[test]
    fn test_derive_operation_id() {
        assert_eq!(derive_operation_id(HttpMethod::Get, "/pet/{petId}"), "getPetPetId");
        assert_eq!(
            derive_operation_id(HttpMethod::Post, "/pet/{petId}/uploadImage"),
            "postPetPetIdUploadImage"
        );
        assert_eq!(derive_operation_id(HttpMethod::Get, "/store-inventory"), "getStoreInventory");
        assert_eq!(derive_operation_id(HttpMethod::Get, "/"), "get");
    }

    #[test]
    fn test_status_keys() {
        assert!(is_status_key("200"));
        assert!(is_status_key("default"));
        assert!(is_status_key("599"));
        assert!(!is_status_key("600"));
        assert!(!is_status_key("099"));
        assert!(!is_status_key("2XX"));
        assert!(!is_status_key("+20"));
    }

    #[test]
    fn test_route_builder_and_origin() {
        let route = RouteSpec::new(HttpMethod::Delete, "/pet/{petId}")
            .with_tags(["pet"])
            .with_response("400", ResponseSpec::new("Invalid ID supplied"));
        assert_eq!(route.origin(), "DELETE /pet/{petId}");
        assert_eq!(route.tags, vec!["pet"]);
        assert_eq!(route.responses.len(), 1);
    }
}
