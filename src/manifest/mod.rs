//! Manifest parsing and rewriting
//!
//! This module provides functionality to:
//! - Parse dependencies from a pom.xml, resolving `${property}` placeholders
//! - Rewrite a dependency's version in place without disturbing formatting

mod pom;
mod writer;

pub use pom::{parse_manifest, resolve_properties, PomParser};
pub use writer::{read_manifest, rewrite_version, write_manifest, MatchPolicy, RewriteOutcome};
pub(crate) use writer::temp_path;

/// File name the manifest parser is designed for
pub const MANIFEST_FILENAME: &str = "pom.xml";
