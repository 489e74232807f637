//! Version information from Maven Central
//!
//! This module provides the VersionInfo struct that represents
//! a published artifact version with its release date, plus the
//! numeric-segment comparator used to rank versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Qualifiers that mark a Maven version as a pre-release
const PRERELEASE_QUALIFIERS: [&str; 8] = [
    "alpha", "beta", "rc", "cr", "snapshot", "milestone", "preview", "ea",
];

/// Information about an artifact version from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// The version string (e.g., "1.2.3")
    pub version: String,
    /// When this version was released
    pub released_at: DateTime<Utc>,
}

impl VersionInfo {
    /// Create a new VersionInfo
    pub fn new(version: impl Into<String>, released_at: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            released_at,
        }
    }

    /// Create a VersionInfo with current time as release date
    pub fn now(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            released_at: Utc::now(),
        }
    }

    /// Returns true if this version carries a pre-release qualifier
    pub fn is_prerelease(&self) -> bool {
        is_prerelease_version(&self.version)
    }
}

impl Ord for VersionInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version)
    }
}

impl PartialOrd for VersionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version strings by their numeric segments
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse_parts = |s: &str| -> Vec<u64> {
        let s = s.strip_prefix('v').unwrap_or(s);
        s.split(['.', '-']).filter_map(|p| p.parse().ok()).collect()
    };

    let parts_a = parse_parts(a);
    let parts_b = parse_parts(b);

    for (pa, pb) in parts_a.iter().zip(parts_b.iter()) {
        match pa.cmp(pb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    // If all common parts are equal, the longer version is greater
    parts_a.len().cmp(&parts_b.len())
}

/// Returns true if any qualifier segment of the version marks a pre-release
///
/// Matches `1.0-alpha1`, `2.0.0-RC2`, `1.0-SNAPSHOT`, `6.0.0.M1`.
pub fn is_prerelease_version(version: &str) -> bool {
    version
        .split(['.', '-', '_'])
        .map(|segment| segment.to_ascii_lowercase())
        .any(|segment| {
            let word = segment.trim_end_matches(|c: char| c.is_ascii_digit());
            if PRERELEASE_QUALIFIERS.contains(&word) {
                return true;
            }
            // Milestones: M1, M2 ...
            word == "m" && segment.len() > 1
        })
}

/// Pick the latest version, preferring stable releases
///
/// Pre-releases are only considered when no stable version exists.
pub fn latest_of(versions: &[VersionInfo]) -> Option<&VersionInfo> {
    versions
        .iter()
        .filter(|v| !v.is_prerelease())
        .max()
        .or_else(|| versions.iter().max())
}
