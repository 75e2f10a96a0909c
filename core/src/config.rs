#![deny(missing_docs)]

//! # Build Configuration
//!
//! Policies that shape a build. A `BuildConfig` is owned by one
//! `DocumentBuilder` and only ever read during a build.

use serde::Deserialize;

/// What to do with a rule whose kind the type mapper does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKindPolicy {
    /// Emit a permissive `type: string` placeholder and a warning.
    Placeholder,
    /// Abort the build with a schema error.
    #[default]
    Reject,
}

/// Ordering of the `paths` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathSort {
    /// Route declaration order.
    #[default]
    Unsorted,
    /// Lexicographic by path, then by method.
    PathMethod,
}

/// Policies applied while building a document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    /// Handling of unrecognised kinds.
    pub unknown_kinds: UnknownKindPolicy,
    /// Whether dropped union branches are reported as warnings.
    pub union_warnings: bool,
    /// Ordering of the `paths` section.
    pub sort_paths: PathSort,
    /// Only routes carrying this tag are documented; the tag itself is
    /// removed from the emitted operation tags.
    pub required_tag: Option<String>,
    /// Description used for responses that do not declare one.
    pub default_response_description: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            unknown_kinds: UnknownKindPolicy::default(),
            union_warnings: true,
            sort_paths: PathSort::default(),
            required_tag: None,
            default_response_description: "Successful".to_string(),
        }
    }
}

impl BuildConfig {
    /// Sets the unknown kind policy.
    pub fn with_unknown_kinds(mut self, policy: UnknownKindPolicy) -> Self {
        self.unknown_kinds = policy;
        self
    }

    /// Sets the path ordering.
    pub fn with_sort_paths(mut self, sort: PathSort) -> Self {
        self.sort_paths = sort;
        self
    }

    /// Restricts documentation to routes carrying `tag`.
    pub fn with_required_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tag = Some(tag.into());
        self
    }

    /// Enables or disables union warnings.
    pub fn with_union_warnings(mut self, enabled: bool) -> Self {
        self.union_warnings = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.unknown_kinds, UnknownKindPolicy::Reject);
        assert!(config.union_warnings);
        assert_eq!(config.default_response_description, "Successful");
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: BuildConfig =
            serde_json::from_str(r#"{"unknownKinds": "placeholder", "sortPaths": "path-method"}"#)
                .unwrap();
        assert_eq!(config.unknown_kinds, UnknownKindPolicy::Placeholder);
        assert_eq!(config.sort_paths, PathSort::PathMethod);
        assert!(config.union_warnings);
        assert!(config.required_tag.is_none());
    }
}
