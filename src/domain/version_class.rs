//! Version constraint classification
//!
//! Maven versions are either an exact string (`1.2.3`, `1.2.3-SNAPSHOT`) or
//! interval notation (`[1.0,2.0)`, `(,1.0]`, `[1.5,)`). The classification is
//! purely lexical: any bracket, parenthesis or comma marks a range.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters that only appear in Maven range notation
const RANGE_MARKERS: [char; 5] = ['[', ']', '(', ')', ','];

/// Whether a version string pins an exact release or allows a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionClass {
    /// Exact version; upgrading requires an explicit edit
    Locked,
    /// Range notation; the build tool may resolve newer releases on its own
    Flexible,
}

impl VersionClass {
    /// Classify a version string
    pub fn of(version: &str) -> Self {
        if is_locked(Some(version)) {
            VersionClass::Locked
        } else {
            VersionClass::Flexible
        }
    }

    /// Returns true for [`VersionClass::Locked`]
    pub fn is_locked(&self) -> bool {
        matches!(self, VersionClass::Locked)
    }

    /// Short label: `LOCKED` or `FLEXIBLE`
    pub fn label(&self) -> &'static str {
        match self {
            VersionClass::Locked => "LOCKED",
            VersionClass::Flexible => "FLEXIBLE",
        }
    }

    /// Label with a human-readable explanation, as shown in reports
    pub fn description(&self) -> &'static str {
        match self {
            VersionClass::Locked => "LOCKED (specific version pinned)",
            VersionClass::Flexible => "FLEXIBLE (version range allows upgrades)",
        }
    }
}

impl fmt::Display for VersionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returns true if the version contains no range syntax.
///
/// An absent version is never locked.
pub fn is_locked(version: Option<&str>) -> bool {
    match version {
        Some(v) => !v.contains(RANGE_MARKERS),
        None => false,
    }
}

/// `"LOCKED"` or `"FLEXIBLE"`, agreeing with [`is_locked`]
pub fn constraint_label(version: Option<&str>) -> &'static str {
    if is_locked(version) {
        VersionClass::Locked.label()
    } else {
        VersionClass::Flexible.label()
    }
}
