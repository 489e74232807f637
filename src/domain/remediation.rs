//! Vulnerability advisories and remediation guidance

use crate::oracle::compare_versions;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single published advisory affecting a specific dependency version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Advisory identifier (e.g., `GHSA-xxxx-xxxx-xxxx`, `CVE-2022-42889`)
    pub id: String,
    /// One-line description, possibly empty
    pub summary: String,
    /// Versions reported as fixing this advisory
    pub fixed_versions: Vec<String>,
}

impl Advisory {
    /// Creates a new advisory
    pub fn new(id: impl Into<String>, summary: impl Into<String>, fixed: Vec<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            fixed_versions: fixed,
        }
    }
}

/// Structured fix guidance for a vulnerable dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationInfo {
    /// True if at least one fixed version is known
    pub has_remediation: bool,
    /// Fixed versions in ascending order; the first is the minimal recommended fix
    pub fixed_versions: Vec<String>,
    /// Description of the issue
    pub summary: String,
}

impl RemediationInfo {
    /// Derive remediation guidance from the advisories of one dependency version
    ///
    /// Returns `None` when there are no advisories at all. Fixed versions not
    /// newer than `current_version` are discarded.
    pub fn from_advisories(current_version: &str, advisories: &[Advisory]) -> Option<Self> {
        if advisories.is_empty() {
            return None;
        }

        let mut fixed: Vec<String> = advisories
            .iter()
            .flat_map(|a| a.fixed_versions.iter())
            .filter(|v| compare_versions(v, current_version) == Ordering::Greater)
            .cloned()
            .collect();
        fixed.sort_by(|a, b| compare_versions(a, b).then_with(|| a.cmp(b)));
        fixed.dedup();

        let summary = advisories
            .iter()
            .map(|a| a.summary.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                advisories
                    .iter()
                    .map(|a| a.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            });

        Some(Self {
            has_remediation: !fixed.is_empty(),
            fixed_versions: fixed,
            summary,
        })
    }

    /// The minimal recommended fix, if any
    pub fn minimal_fix(&self) -> Option<&str> {
        if !self.has_remediation {
            return None;
        }
        self.fixed_versions.first().map(String::as_str)
    }
}
