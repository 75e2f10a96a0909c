#![deny(missing_docs)]

//! # Swagger Models
//!
//! The Swagger 2.0 document model produced by a build.
//!
//! Field order follows the order Swagger tooling conventionally prints, so a
//! serialised document reads like a hand-written one.

use crate::node::CollectionFormat;
use crate::swagger::ref_utils::definition_pointer;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Primitive and structural types of the document grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `string`
    String,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
    /// `file`, only valid for formData parameters.
    File,
}

/// Transfer protocol of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
    /// WebSocket.
    Ws,
    /// WebSocket over TLS.
    Wss,
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "ws" => Ok(Scheme::Ws),
            "wss" => Ok(Scheme::Wss),
            other => Err(format!("unknown scheme '{}'", other)),
        }
    }
}

/// Where a parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// Path template placeholder.
    #[serde(rename = "path")]
    Path,
    /// Query string.
    #[serde(rename = "query")]
    Query,
    /// Request header.
    #[serde(rename = "header")]
    Header,
    /// Form field.
    #[serde(rename = "formData")]
    FormData,
    /// Request body.
    #[serde(rename = "body")]
    Body,
}

impl Location {
    /// The name used in the document.
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::FormData => "formData",
            Location::Body => "body",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP methods an operation can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
}

impl HttpMethod {
    /// Lowercase method name as used for path item keys.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "put" => Ok(HttpMethod::Put),
            "post" => Ok(HttpMethod::Post),
            "delete" => Ok(HttpMethod::Delete),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            "patch" => Ok(HttpMethod::Patch),
            other => Err(format!("unsupported HTTP method '{}'", other)),
        }
    }
}

/// Validation keywords shared by schemas, parameters and items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validations {
    /// Upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// Whether `maximum` is exclusive.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_maximum: bool,
    /// Lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// Whether `minimum` is exclusive.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_minimum: bool,
    /// Longest allowed string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Shortest allowed string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Regular expression, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Most items allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Fewest items allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Items must be unique.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
    /// Allowed literals, source order preserved.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Value must be a multiple of this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
}

/// A pointer to a named definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// JSON pointer, e.g. `#/definitions/Pet`.
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// Either a reference into `definitions` or an inline schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaRef {
    /// `{"$ref": ...}`
    Ref(Reference),
    /// Inline schema fragment.
    Inline(Box<SchemaObject>),
}

impl SchemaRef {
    /// Wraps an inline schema.
    pub fn inline(schema: SchemaObject) -> Self {
        SchemaRef::Inline(Box::new(schema))
    }

    /// Points at a definition key.
    pub fn to_definition(key: &str) -> Self {
        SchemaRef::Ref(Reference {
            reference: definition_pointer(key),
        })
    }

    /// The reference pointer, if this is a reference.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            SchemaRef::Ref(r) => Some(&r.reference),
            SchemaRef::Inline(_) => None,
        }
    }

    /// The inline schema, if this is not a reference.
    pub fn as_inline(&self) -> Option<&SchemaObject> {
        match self {
            SchemaRef::Inline(s) => Some(s),
            SchemaRef::Ref(_) => None,
        }
    }
}

/// A Swagger schema object (body, response and definition shapes).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaObject {
    /// Data type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    /// Format refinement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Names of required properties, declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Object properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaRef>>,
    /// Array item schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaRef>>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Validation keywords.
    #[serde(flatten)]
    pub validations: Validations,
}

impl SchemaObject {
    /// A schema of the given type.
    pub fn of_type(data_type: DataType) -> Self {
        Self {
            data_type: Some(data_type),
            ..Self::default()
        }
    }

    /// An array schema around the given item schema.
    pub fn array_of(items: SchemaRef) -> Self {
        Self {
            data_type: Some(DataType::Array),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }
}

/// A Swagger "items object": the flat type description used by non-body
/// parameters and response headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSchema {
    /// Data type; never `object`.
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Format refinement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Nested item type for arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SimpleSchema>>,
    /// Array encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<CollectionFormat>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Validation keywords.
    #[serde(flatten)]
    pub validations: Validations,
}

/// One operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Parameter name; `body` for the body parameter.
    pub name: String,
    /// Location.
    #[serde(rename = "in")]
    pub location: Location,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter must be sent.
    pub required: bool,
    /// Body schema (body parameters only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    /// Flat type (non-body parameters only).
    #[serde(flatten)]
    pub simple: Option<SimpleSchema>,
    /// Example value, as a vendor extension.
    #[serde(rename = "x-example", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// A response header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseHeader {
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Flat type.
    #[serde(flatten)]
    pub simple: SimpleSchema,
}

/// One documented response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDoc {
    /// Description (mandatory in the grammar).
    pub description: String,
    /// Body shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    /// Headers sent with the response.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, ResponseHeader>,
}

/// Scopes required per security scheme name.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// One documented operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDoc {
    /// Grouping tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique operation identifier.
    pub operation_id: String,
    /// Accepted media types, when they differ from the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumes: Option<Vec<String>>,
    /// Produced media types, when they differ from the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produces: Option<Vec<String>>,
    /// Ordered parameters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code or `default`.
    pub responses: IndexMap<String, ResponseDoc>,
    /// Whether the operation is deprecated.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Security requirements overriding the root ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// Operations of one path template, keyed by method.
pub type PathItem = IndexMap<HttpMethod, OperationDoc>;

/// Contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Contact e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License details. `name` is mandatory once a license is given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// License name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// License URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The validated info block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Terms of service URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    /// Contact details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// License details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// Pointer to external documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDocs {
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target URL.
    pub url: String,
}

/// Root-level tag metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// External documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// Query string.
    Query,
    /// Request header.
    Header,
}

/// OAuth2 grant flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OAuthFlow {
    /// Implicit grant.
    Implicit,
    /// Resource owner password grant.
    Password,
    /// Client credentials grant.
    Application,
    /// Authorization code grant.
    AccessCode,
}

/// A security scheme definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    /// HTTP basic authentication.
    #[serde(rename = "basic")]
    Basic {
        /// Description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// API key in a header or query parameter.
    #[serde(rename = "apiKey")]
    ApiKey {
        /// Header or query parameter name.
        name: String,
        /// Where the key is sent.
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        /// Description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// OAuth2.
    #[serde(rename = "oauth2", rename_all = "camelCase")]
    OAuth2 {
        /// Grant flow.
        flow: OAuthFlow,
        /// Authorization endpoint (implicit, accessCode).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization_url: Option<String>,
        /// Token endpoint (password, application, accessCode).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_url: Option<String>,
        /// Available scopes and their descriptions.
        #[serde(default)]
        scopes: IndexMap<String, String>,
        /// Description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// The complete Swagger 2.0 document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRoot {
    /// Version tag, always `2.0`.
    pub swagger: String,
    /// Info block.
    pub info: Info,
    /// Host (and optional port) serving the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Path prefix of every operation.
    pub base_path: String,
    /// Tag metadata.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// Transfer protocols.
    pub schemes: Vec<Scheme>,
    /// Default accepted media types.
    pub consumes: Vec<String>,
    /// Default produced media types.
    pub produces: Vec<String>,
    /// Operations keyed by path template.
    pub paths: IndexMap<String, PathItem>,
    /// Security scheme definitions.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub security_definitions: IndexMap<String, SecurityScheme>,
    /// Root security requirements.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    /// Named schema definitions.
    pub definitions: IndexMap<String, SchemaObject>,
    /// External documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

impl DocumentRoot {
    /// Serialises the document into a JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Looks up an operation by path template and method.
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&OperationDoc> {
        self.paths.get(path).and_then(|item| item.get(&method))
    }
}
