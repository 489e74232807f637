//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of scan sessions, grouped by manifest
//! - Update outcomes and ignore registries as plain objects

use crate::domain::{DependencyReport, Freshness, RemediationInfo};
use crate::ignore::IgnoreRegistry;
use crate::orchestrator::{ManifestScan, ScanSession, ScanSummary};
use crate::output::OutputFormatter;
use crate::update::UpdateOutcome;
use chrono::Utc;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

/// JSON representation of a whole scan
#[derive(Serialize)]
struct JsonOutput<'a> {
    /// RFC 3339 timestamp of when the report was written
    generated_at: String,
    /// True if the scan stopped early
    cancelled: bool,
    /// Totals across all manifests
    summary: ScanSummary,
    /// Per-manifest results
    manifests: Vec<JsonManifest<'a>>,
}

/// JSON representation of one manifest
#[derive(Serialize)]
struct JsonManifest<'a> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    dependencies: Vec<JsonDependency<'a>>,
}

/// JSON representation of one dependency report
#[derive(Serialize)]
struct JsonDependency<'a> {
    group_id: &'a str,
    artifact_id: &'a str,
    version: &'a str,
    scope: &'a str,
    /// `LOCKED` or `FLEXIBLE`
    version_constraint: &'static str,
    freshness: Freshness,
    latest_version: Option<&'a str>,
    vulnerable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    remediation: Option<&'a RemediationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_version: Option<&'a str>,
    ignored: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    errors: &'a [String],
}

/// JSON representation of an ignore registry
#[derive(Serialize)]
struct JsonIgnoreList<'a> {
    path: String,
    entries: Vec<&'a str>,
}

impl<'a> From<&'a DependencyReport> for JsonDependency<'a> {
    fn from(report: &'a DependencyReport) -> Self {
        let dep = &report.dependency;
        Self {
            group_id: &dep.group_id,
            artifact_id: &dep.artifact_id,
            version: &dep.version,
            scope: &dep.scope,
            version_constraint: report.version_class.label(),
            freshness: report.freshness(),
            latest_version: report.lookup.latest_version.as_deref(),
            vulnerable: report.is_vulnerable(),
            remediation: report.lookup.remediation.as_ref(),
            suggested_version: report.suggested_version(),
            ignored: report.ignored,
            errors: &report.lookup.errors,
        }
    }
}

impl<'a> From<&'a ManifestScan> for JsonManifest<'a> {
    fn from(scan: &'a ManifestScan) -> Self {
        Self {
            path: scan.path.display().to_string(),
            error: scan.error.as_deref(),
            dependencies: scan.dependencies.iter().map(JsonDependency::from).collect(),
        }
    }
}

fn write_pretty<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}

impl OutputFormatter for JsonFormatter {
    fn format_session(
        &self,
        session: &ScanSession,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonOutput {
            generated_at: Utc::now().to_rfc3339(),
            cancelled: session.cancelled,
            summary: session.summary(),
            manifests: session.manifests.iter().map(JsonManifest::from).collect(),
        };
        write_pretty(&output, writer)
    }

    fn format_update(
        &self,
        outcome: &UpdateOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        write_pretty(outcome, writer)
    }

    fn format_ignore_list(
        &self,
        registry: &IgnoreRegistry,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonIgnoreList {
            path: registry.path().display().to_string(),
            entries: registry.entries().collect(),
        };
        write_pretty(&output, writer)
    }
}
