#![deny(missing_docs)]

//! # Routedoc Core
//!
//! Converts routes annotated with validation rules into Swagger 2.0 documents.
//!
//! A build goes leaves first: the type mapper handles single primitives, the
//! definition registry names reusable shapes, the schema walker descends
//! rule trees, and the document builder assembles and self-validates the
//! result.

/// Shared error types.
pub mod error;

/// Validation rule tree (the input grammar).
pub mod node;

/// Build policies.
pub mod config;

/// Type mapping logic (validation rule -> document type).
pub mod type_mapping;

/// Named definition bookkeeping.
pub mod registry;

/// Recursive schema conversion.
pub mod walker;

/// Route input and path helpers.
pub mod routes;

/// Swagger document model, assembly and validation.
pub mod swagger;

/// YAML/JSON route manifests.
pub mod manifest;

pub use config::{BuildConfig, PathSort, UnknownKindPolicy};
pub use error::{AppError, AppResult, ErrorKind};
pub use manifest::{load_json, load_yaml, LoadedManifest};
pub use node::{CollectionFormat, FormatHint, SchemaId, SchemaSet, Shape, ValidationNode};
pub use registry::DefinitionRegistry;
pub use routes::{PayloadKind, ResponseSpec, RouteSpec};
pub use swagger::{
    BuildOutput, DocumentBuilder, DocumentRoot, HttpMethod, InfoOptions, RequestFacts,
    RootDefaults, RootOptions,
};
pub use type_mapping::{SwaggerTypeMapper, TypeMapper};
pub use walker::{BuildWarning, Overlay, SchemaWalker};
