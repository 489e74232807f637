//! Dependency information structures

use super::VersionClass;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope assumed when a `<dependency>` declares none
pub const DEFAULT_SCOPE: &str = "compile";

/// A dependency declared in a manifest, with its version already resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Maven group identifier (e.g., `org.apache.commons`)
    pub group_id: String,
    /// Maven artifact identifier (e.g., `commons-lang3`)
    pub artifact_id: String,
    /// Version after `${property}` substitution
    pub version: String,
    /// Dependency scope (`compile`, `test`, `provided`, ...)
    pub scope: String,
}

impl Dependency {
    /// Creates a new dependency with the default `compile` scope
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Sets the scope (builder pattern)
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Version-independent identity: `groupId:artifactId`
    pub fn coordinate(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// Version-specific identity: `groupId:artifactId:version`
    ///
    /// This is the exact string stored in the ignore registry.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }

    /// Returns true if the version is pinned to an exact string
    pub fn is_locked(&self) -> bool {
        VersionClass::of(&self.version).is_locked()
    }

    /// Lexical classification of the version constraint
    pub fn version_class(&self) -> VersionClass {
        VersionClass::of(&self.version)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
