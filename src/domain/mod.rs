//! Core domain models for feraldeps
//!
//! This module contains the fundamental types used throughout the application:
//! - Dependency records parsed from a manifest
//! - Lexical version constraint classification
//! - Advisories and remediation guidance
//! - Per-dependency audit reports

mod dependency;
mod remediation;
mod report;
mod version_class;

pub use dependency::{Dependency, DEFAULT_SCOPE};
pub use remediation::{Advisory, RemediationInfo};
pub use report::{DependencyReport, Freshness, LookupResult};
pub use version_class::{constraint_label, is_locked, VersionClass};
