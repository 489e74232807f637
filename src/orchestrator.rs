//! Scan orchestration
//!
//! This module provides:
//! - Workflow coordination: parse -> look up -> record, one manifest at a time
//! - Bounded parallel oracle lookups within a manifest
//! - `ScanSession`, the value handed to presentation code, with bucket queries
//! - Cooperative cancellation between manifests
//!
//! A manifest that fails to parse is recorded and skipped; lookup failures
//! are recorded on the dependency and never abort the scan.

use crate::config::{project_dir, DEFAULT_CONCURRENCY};
use crate::domain::{DependencyReport, Freshness};
use crate::ignore::{IgnoreRegistry, IGNORE_FILENAME};
use crate::manifest::parse_manifest;
use crate::oracle::{lookup, VulnerabilityOracle};
use crate::progress::Progress;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared flag used to stop a scan between manifests
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of scanning one manifest
#[derive(Debug, Clone, Serialize)]
pub struct ManifestScan {
    /// Manifest path as given
    pub path: PathBuf,
    /// Reports in document order
    pub dependencies: Vec<DependencyReport>,
    /// Parse failure, if the manifest could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ManifestScan {
    fn failed(path: &Path, error: String) -> Self {
        Self {
            path: path.to_path_buf(),
            dependencies: Vec::new(),
            error: Some(error),
        }
    }

    /// Returns true if the manifest was parsed
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub files: usize,
    pub dependencies: usize,
    pub outdated: usize,
    pub vulnerable: usize,
    pub ignored: usize,
    pub parse_failures: usize,
}

/// Accumulated results of a scan
///
/// Bucket queries are sorted by coordinate, version and manifest path, so
/// their order never depends on lookup completion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSession {
    /// One entry per manifest scanned, in the order requested
    pub manifests: Vec<ManifestScan>,
    /// True if the scan stopped early
    pub cancelled: bool,
}

impl ScanSession {
    /// Every report, manifest by manifest, in document order
    pub fn reports(&self) -> impl Iterator<Item = &DependencyReport> {
        self.manifests.iter().flat_map(|m| m.dependencies.iter())
    }

    fn bucket<F>(&self, include_ignored: bool, predicate: F) -> Vec<&DependencyReport>
    where
        F: Fn(&DependencyReport) -> bool,
    {
        let mut reports: Vec<&DependencyReport> = self
            .reports()
            .filter(|r| r.ignored == include_ignored && predicate(r))
            .collect();
        reports.sort_by_key(|r| r.sort_key());
        reports
    }

    /// Non-ignored dependencies with a newer release
    pub fn outdated(&self) -> Vec<&DependencyReport> {
        self.bucket(false, |r| r.freshness() == Freshness::Outdated)
    }

    /// Non-ignored dependencies with known vulnerabilities
    pub fn vulnerable(&self) -> Vec<&DependencyReport> {
        self.bucket(false, DependencyReport::is_vulnerable)
    }

    /// Non-ignored dependencies already at the latest release
    pub fn up_to_date(&self) -> Vec<&DependencyReport> {
        self.bucket(false, |r| r.freshness() == Freshness::UpToDate)
    }

    /// Non-ignored dependencies with no latest-version information
    pub fn unknown(&self) -> Vec<&DependencyReport> {
        self.bucket(false, |r| r.freshness() == Freshness::Unknown)
    }

    /// Dependencies suppressed by an ignore registry
    pub fn ignored(&self) -> Vec<&DependencyReport> {
        self.bucket(true, |_| true)
    }

    /// Manifests that could not be parsed
    pub fn failed_manifests(&self) -> impl Iterator<Item = &ManifestScan> {
        self.manifests.iter().filter(|m| !m.is_ok())
    }

    /// Returns true if any manifest failed to parse
    pub fn has_parse_failures(&self) -> bool {
        self.failed_manifests().next().is_some()
    }

    /// Totals across the session
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            files: self.manifests.len(),
            dependencies: self.reports().count(),
            outdated: self.outdated().len(),
            vulnerable: self.vulnerable().len(),
            ignored: self.ignored().len(),
            parse_failures: self.failed_manifests().count(),
        }
    }
}

/// Coordinates parsing and lookups for a set of manifests
pub struct Orchestrator {
    oracle: Arc<dyn VulnerabilityOracle>,
    concurrency: usize,
    semaphore: Arc<Semaphore>,
    ignore_file: String,
    cancel: CancelFlag,
    show_progress: bool,
}

impl Orchestrator {
    /// Create an orchestrator over the given oracle
    pub fn new(oracle: Arc<dyn VulnerabilityOracle>) -> Self {
        Self {
            oracle,
            concurrency: DEFAULT_CONCURRENCY,
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            ignore_file: IGNORE_FILENAME.to_string(),
            cancel: CancelFlag::new(),
            show_progress: false,
        }
    }

    /// Bound the number of in-flight lookups
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        self.concurrency = concurrency;
        self.semaphore = Arc::new(Semaphore::new(concurrency));
        self
    }

    /// Use a different ignore file name in each project directory
    pub fn with_ignore_file(mut self, name: impl Into<String>) -> Self {
        self.ignore_file = name.into();
        self
    }

    /// Share a cancellation flag with the caller
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Draw progress on stderr
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Scan manifests in order, stopping early if cancelled
    pub async fn scan(&self, paths: &[PathBuf]) -> ScanSession {
        let mut progress = Progress::new(self.show_progress);
        let mut registries: HashMap<PathBuf, IgnoreRegistry> = HashMap::new();
        let mut session = ScanSession::default();

        for path in paths {
            if self.cancel.is_cancelled() {
                tracing::info!("scan cancelled before {}", path.display());
                session.cancelled = true;
                break;
            }

            let ignore_path = project_dir(path).join(&self.ignore_file);
            let registry = registries
                .entry(ignore_path.clone())
                .or_insert_with(|| IgnoreRegistry::load(ignore_path));

            let scan = self.scan_manifest(path, registry, &mut progress).await;
            session.manifests.push(scan);
        }

        progress.finish_and_clear();
        session
    }

    /// Parse one manifest and look up each of its dependencies
    pub async fn scan_manifest(
        &self,
        path: &Path,
        registry: &IgnoreRegistry,
        progress: &mut Progress,
    ) -> ManifestScan {
        progress.spinner(&format!("Parsing {}...", path.display()));
        let dependencies = match parse_manifest(path) {
            Ok(deps) => deps,
            Err(e) => {
                progress.finish_and_clear();
                tracing::warn!("{}", e);
                return ManifestScan::failed(path, e.to_string());
            }
        };
        tracing::debug!(path = %path.display(), count = dependencies.len(), "parsed manifest");

        progress.start_lookups(dependencies.len(), &path.display().to_string());
        let progress = &*progress;
        let oracle = self.oracle.as_ref();

        let mut reports: Vec<(usize, DependencyReport)> = stream::iter(
            dependencies.into_iter().enumerate(),
        )
        .map(|(index, dependency)| async move {
            let result = {
                let _permit = self.semaphore.acquire().await.ok();
                lookup(oracle, &dependency).await
            };
            progress.lookup_done(&dependency);
            let ignored = registry.is_ignored(&dependency);
            (index, DependencyReport::new(path, dependency, ignored, result))
        })
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        reports.sort_by_key(|(index, _)| *index);

        ManifestScan {
            path: path.to_path_buf(),
            dependencies: reports.into_iter().map(|(_, report)| report).collect(),
            error: None,
        }
    }
}
