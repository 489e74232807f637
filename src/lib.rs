//! feraldeps - Maven dependency auditor library
//!
//! This library provides the core functionality for auditing the
//! dependencies declared in a pom.xml:
//! - Parsing dependencies with `${property}` resolution
//! - Looking up latest releases (Maven Central) and advisories (OSV)
//! - Classifying version constraints as locked or flexible
//! - Per-project ignore lists
//! - Rewriting versions in place, with build verification and revert

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod manifest;
pub mod oracle;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod update;
