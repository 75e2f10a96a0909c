#![deny(missing_docs)]

//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Build failures fall into four caller-visible kinds (see [`ErrorKind`]).
//! Every one aborts the whole build; no partial document is ever returned.

use derive_more::{Display, From};

/// Coarse classification of a failed build, for callers that only need to
/// tell input mistakes apart from converter bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A validation rule cannot be expressed where it is used.
    Schema,
    /// The caller-supplied info block is incomplete or malformed.
    Info,
    /// Route declarations conflict or are malformed.
    Route,
    /// The assembled document failed its own meta validation.
    Assembly,
    /// A manifest could not be read into routes and options.
    Manifest,
}

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Only the manifest parsing errors convert implicitly; the build errors are
/// always constructed with their offending path.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Unsupported kind, or a kind used where the document grammar cannot express it.
    #[from(ignore)]
    #[display("Schema Error at '{path}': {message}")]
    Schema {
        /// Location of the offending rule, e.g. `GET /pet/{petId} query.tags`.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The info block failed its required-field check.
    #[from(ignore)]
    #[display("Info Error: '{field}' {message}")]
    Info {
        /// The missing or malformed field, e.g. `title`.
        field: String,
        /// What went wrong.
        message: String,
    },

    /// Conflicting or malformed route declarations.
    #[from(ignore)]
    #[display("Route Error at '{path}': {message}")]
    Route {
        /// The route, e.g. `GET /pet/{petId}`.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The assembled document violates the document grammar.
    ///
    /// This indicates a converter bug rather than bad input.
    #[from(ignore)]
    #[display("Assembly Error at '{path}': {message}")]
    Assembly {
        /// Pointer into the assembled document, e.g. `/paths/~1pet/get/responses`.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// Manifest content that cannot be turned into build input.
    #[display("Manifest Error: {_0}")]
    Manifest(String),

    /// Wrapper for YAML decoding errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Wrapper for JSON decoding errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl AppError {
    /// Creates a schema error.
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an info validation error.
    pub fn info(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Info {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a route error.
    pub fn route(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Route {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an assembly validation error.
    pub fn assembly(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Assembly {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Info { .. } => ErrorKind::Info,
            Self::Route { .. } => ErrorKind::Route,
            Self::Assembly { .. } => ErrorKind::Assembly,
            Self::Manifest(_) | Self::Yaml(_) | Self::Json(_) => ErrorKind::Manifest,
        }
    }

    /// Returns the offending path or field, when the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Schema { path, .. } | Self::Route { path, .. } | Self::Assembly { path, .. } => {
                Some(path)
            }
            Self::Info { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = AppError::schema("GET /a header.x", "nested objects are not allowed");
        assert_eq!(
            err.to_string(),
            "Schema Error at 'GET /a header.x': nested objects are not allowed"
        );
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.path(), Some("GET /a header.x"));
    }

    #[test]
    fn test_info_error_names_field() {
        let err = AppError::info("title", "is required");
        assert_eq!(err.to_string(), "Info Error: 'title' is required");
        assert_eq!(err.path(), Some("title"));
    }

    #[test]
    fn test_assembly_is_distinguishable() {
        let err = AppError::assembly("/swagger", "must be \"2.0\"");
        assert_eq!(err.kind(), ErrorKind::Assembly);
        assert_ne!(err.kind(), ErrorKind::Schema);
        assert_ne!(err.kind(), ErrorKind::Info);
    }

    #[test]
    fn test_yaml_conversion() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let app_err: AppError = yaml_err.into();
        assert!(matches!(app_err, AppError::Yaml(_)));
        assert_eq!(app_err.kind(), ErrorKind::Manifest);
        assert!(app_err.path().is_none());
    }
}
