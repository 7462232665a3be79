use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One KMP-aware Maven artifact coordinate, as produced by the crawl.
///
/// For multiplatform artifacts the platform suffix is NOT part of
/// `artifact_id`; platform availability lives in `supported_platforms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Maven group id (namespace), e.g. `org.jetbrains.kotlinx`.
    pub group_id: String,

    /// Maven artifact id, e.g. `kotlinx-coroutines-core`.
    pub artifact_id: String,

    /// Version string as published, e.g. `1.8.0`.
    pub version: String,

    /// Supported platforms in KMP terms. `None` if the artifact is not
    /// multiplatform.
    ///
    /// Tags are either a bare platform name (`jvm`, `js`) or
    /// `native:<target>` (`native:linux_x64`, `native:ios_arm64`).
    pub supported_platforms: Option<BTreeSet<String>>,

    /// Whether this version is the repository's latest for the coordinate.
    pub is_latest_version: bool,
}

/// Errors that can occur when validating an [`Artifact`].
#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    /// A required field (group, artifact id, or version) is empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    /// A coordinate component contains characters unsafe for a repository path.
    #[error("Path-unsafe {field}: '{value}'")]
    PathUnsafe { field: &'static str, value: String },
}

impl Artifact {
    /// Validates that all coordinate components are non-empty and path-safe.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::EmptyField`] for a missing component, or
    /// [`ArtifactError::PathUnsafe`] if a component would escape the
    /// repository path layout (`/`, `..`, whitespace).
    pub fn validate(&self) -> Result<(), ArtifactError> {
        for (field, value) in [
            ("group_id", &self.group_id),
            ("artifact_id", &self.artifact_id),
            ("version", &self.version),
        ] {
            if value.is_empty() {
                return Err(ArtifactError::EmptyField(field));
            }
            if !is_path_safe(value) {
                return Err(ArtifactError::PathUnsafe {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Returns a copy annotated with the given platform set.
    ///
    /// An empty set is normalized to "not multiplatform": classification
    /// that found no platform variants leaves the artifact unchanged.
    #[must_use]
    pub fn with_platforms(self, platforms: BTreeSet<String>) -> Self {
        if platforms.is_empty() {
            self
        } else {
            Self {
                supported_platforms: Some(platforms),
                ..self
            }
        }
    }

    /// `group:artifact:version` display form.
    pub fn coordinate(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

fn is_path_safe(s: &str) -> bool {
    !s.contains('/')
        && !s.contains('\\')
        && !s.split('.').any(|seg| seg.is_empty())
        && !s.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(group: &str, name: &str, version: &str) -> Artifact {
        Artifact {
            group_id: group.into(),
            artifact_id: name.into(),
            version: version.into(),
            supported_platforms: None,
            is_latest_version: false,
        }
    }

    #[test]
    fn validate_accepts_regular_coordinates() {
        assert!(artifact("io.ktor", "ktor-client-core", "2.3.7")
            .validate()
            .is_ok());
    }

    #[test]
    fn validate_rejects_empty_and_unsafe_components() {
        assert!(artifact("", "a", "1").validate().is_err());
        assert!(artifact("org..example", "a", "1").validate().is_err());
        assert!(artifact("org.example", "a/b", "1").validate().is_err());
        assert!(artifact("org.example", "a", "1 0").validate().is_err());
    }

    #[test]
    fn empty_platform_set_normalizes_to_not_multiplatform() {
        let plain = artifact("g", "a", "1").with_platforms(BTreeSet::new());
        assert_eq!(plain.supported_platforms, None);

        let kmp = artifact("g", "a", "1")
            .with_platforms(BTreeSet::from(["jvm".to_string(), "js".to_string()]));
        assert_eq!(kmp.supported_platforms.unwrap().len(), 2);
    }
}
