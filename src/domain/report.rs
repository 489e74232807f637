//! Per-dependency audit results
//!
//! Provides the record produced for every parsed dependency once its
//! oracle lookups have completed, and the bucketing rules applied to it.

use super::{Dependency, RemediationInfo, VersionClass};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Freshness of a dependency relative to the latest known release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// A different latest version is known
    Outdated,
    /// The version in use equals the latest known release
    UpToDate,
    /// No latest-version information is available
    Unknown,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::Outdated => write!(f, "outdated"),
            Freshness::UpToDate => write!(f, "up to date"),
            Freshness::Unknown => write!(f, "no version info"),
        }
    }
}

/// Oracle answers for one dependency
///
/// Every field defaults to "no info"; a failed lookup leaves its field at
/// the default and records the error message instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    /// Latest release for the coordinate
    pub latest_version: Option<String>,
    /// Whether the exact version has known vulnerabilities
    pub vulnerable: bool,
    /// Structured fix data, only when vulnerable
    pub remediation: Option<RemediationInfo>,
    /// Messages from lookups that failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Audit result for a single dependency in a single manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Manifest the dependency was declared in
    pub manifest: PathBuf,
    /// The dependency as parsed
    pub dependency: Dependency,
    /// Lexical classification of the version constraint
    pub version_class: VersionClass,
    /// Whether the coordinate:version is in the ignore registry
    pub ignored: bool,
    /// Oracle answers
    #[serde(flatten)]
    pub lookup: LookupResult,
}

impl DependencyReport {
    /// Creates a new report
    pub fn new(
        manifest: impl Into<PathBuf>,
        dependency: Dependency,
        ignored: bool,
        lookup: LookupResult,
    ) -> Self {
        let version_class = dependency.version_class();
        Self {
            manifest: manifest.into(),
            dependency,
            version_class,
            ignored,
            lookup,
        }
    }

    /// Freshness relative to the latest known release
    ///
    /// Any difference from the latest string counts as outdated, including
    /// range versions and versions newer than the published latest.
    pub fn freshness(&self) -> Freshness {
        match &self.lookup.latest_version {
            Some(latest) if *latest != self.dependency.version => Freshness::Outdated,
            Some(_) => Freshness::UpToDate,
            None => Freshness::Unknown,
        }
    }

    /// Returns true if a newer release is known
    pub fn is_outdated(&self) -> bool {
        self.freshness() == Freshness::Outdated
    }

    /// Returns true if the exact version has known vulnerabilities
    pub fn is_vulnerable(&self) -> bool {
        self.lookup.vulnerable
    }

    /// Version an update action would move to
    ///
    /// The latest release when outdated, otherwise the minimal fixed version
    /// of a vulnerable dependency.
    pub fn suggested_version(&self) -> Option<&str> {
        if self.is_outdated() {
            return self.lookup.latest_version.as_deref();
        }
        if self.is_vulnerable() {
            return self.lookup.remediation.as_ref().and_then(|r| r.minimal_fix());
        }
        None
    }

    /// Sort key used to make bucket listings deterministic
    pub fn sort_key(&self) -> (String, String, PathBuf) {
        (
            self.dependency.coordinate(),
            self.dependency.version.clone(),
            self.manifest.clone(),
        )
    }
}
