#![deny(missing_docs)]

//! # Swagger Document Module
//!
//! - **models**: The Swagger 2.0 document model.
//! - **ref_utils**: `#/definitions/...` pointer handling.
//! - **params**: Parameter assembly per location.
//! - **document**: Root assembly, request facts and the builder.
//! - **validation**: Info checks and the meta validator.

pub mod document;
pub mod models;
pub mod params;
pub mod ref_utils;
pub mod validation;

pub use document::{BuildOutput, DocumentBuilder, InfoOptions, RequestFacts, RootDefaults, RootOptions};
pub use models::{DocumentRoot, HttpMethod, Location, OperationDoc, Parameter, SchemaObject, SchemaRef};
pub use validation::{validate_document, validate_info};
