//! Update, verify and revert protocol for a single manifest
//!
//! This module provides:
//! - `UpdateEngine`, which rewrites a dependency's version on disk
//! - Optional build verification through a `BuildVerifier`
//! - Revert to the exact original bytes when verification fails
//!
//! States: `Pending -> Written -> (done | Testing) -> Verified | Reverted | FailedKept`.
//! A failed build with `FailureAction::Ask` stops in `Failed` and hands the
//! caller a `PendingRevert` to decide with.
//!
//! Only one update sequence runs per manifest path at a time. A pending
//! decision keeps that path locked until it is resolved.

mod verify;

pub use verify::{tail_chars, BuildOutput, BuildVerifier, CommandVerifier};

use crate::config::{project_dir, Config};
use crate::domain::Dependency;
use crate::error::UpdateError;
use crate::manifest::{read_manifest, rewrite_version, write_manifest, MatchPolicy};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Default number of build output characters kept for display
pub const DEFAULT_OUTPUT_TAIL_CHARS: usize = 500;

/// Where an update sequence currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    /// Nothing written yet
    Pending,
    /// New version on disk, no verification requested
    Written,
    /// Build running against the new version
    Testing,
    /// Build failed; waiting for a revert/keep decision
    Failed,
    /// Build succeeded with the new version
    Verified,
    /// Build failed and the original content was restored
    Reverted,
    /// Build failed and the new version was kept anyway
    FailedKept,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpdateState::Pending => "pending",
            UpdateState::Written => "written",
            UpdateState::Testing => "testing",
            UpdateState::Failed => "failed",
            UpdateState::Verified => "verified",
            UpdateState::Reverted => "reverted",
            UpdateState::FailedKept => "failed (kept)",
        };
        write!(f, "{}", label)
    }
}

/// What to do when the verification build fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureAction {
    /// Restore the original content
    #[default]
    Revert,
    /// Leave the new version in place
    Keep,
    /// Return a `PendingRevert` and let the caller decide
    Ask,
}

impl std::str::FromStr for FailureAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revert" => Ok(FailureAction::Revert),
            "keep" => Ok(FailureAction::Keep),
            "ask" => Ok(FailureAction::Ask),
            other => Err(format!(
                "invalid failure action '{}': expected 'revert', 'keep' or 'ask'",
                other
            )),
        }
    }
}

/// How far an update goes after writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Write the new version and stop
    WriteOnly,
    /// Write, then run the build
    Verify { on_failure: FailureAction },
}

/// Record of one update sequence
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    /// `groupId:artifactId`
    pub coordinate: String,
    /// Version before the update, as parsed
    pub old_version: String,
    /// Version written
    pub new_version: String,
    /// Manifest that was updated
    pub path: PathBuf,
    /// Final (or current) state
    pub state: UpdateState,
    /// 1-based line numbers that were rewritten
    pub matched_lines: Vec<usize>,
    /// Exit code of the verification build, if one ran
    pub exit_code: Option<i32>,
    /// End of the verification build output, if one ran
    pub output_tail: Option<String>,
}

impl UpdateOutcome {
    /// Returns true if the new version is on disk and nothing failed
    pub fn is_success(&self) -> bool {
        matches!(self.state, UpdateState::Written | UpdateState::Verified)
    }
}

/// A failed verification awaiting a decision
///
/// Holds the original manifest content and the per-path lock. Dropping it
/// without deciding behaves like `keep`.
pub struct PendingRevert {
    outcome: UpdateOutcome,
    original: String,
    _guard: OwnedMutexGuard<()>,
}

impl PendingRevert {
    /// The failed outcome, including the build output tail
    pub fn outcome(&self) -> &UpdateOutcome {
        &self.outcome
    }

    /// Restore the exact original bytes
    pub async fn revert(mut self) -> Result<UpdateOutcome, UpdateError> {
        restore(&self.outcome, &self.original).await?;
        self.outcome.state = UpdateState::Reverted;
        Ok(self.outcome)
    }

    /// Keep the unverified new version
    pub fn keep(mut self) -> UpdateOutcome {
        tracing::info!(
            coordinate = %self.outcome.coordinate,
            version = %self.outcome.new_version,
            "keeping unverified version"
        );
        self.outcome.state = UpdateState::FailedKept;
        self.outcome
    }
}

impl fmt::Debug for PendingRevert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRevert")
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// Result of `UpdateEngine::apply`
#[derive(Debug)]
pub enum Applied {
    /// The sequence finished
    Done(UpdateOutcome),
    /// The build failed and the caller must choose
    NeedsDecision(PendingRevert),
}

async fn restore(outcome: &UpdateOutcome, original: &str) -> Result<(), UpdateError> {
    write_manifest(&outcome.path, original)
        .await
        .map_err(|e| UpdateError::WriteError {
            coordinate: outcome.coordinate.clone(),
            version: outcome.new_version.clone(),
            path: outcome.path.clone(),
            source: e,
        })?;
    tracing::info!(
        coordinate = %outcome.coordinate,
        version = %outcome.old_version,
        path = %outcome.path.display(),
        "reverted to original version"
    );
    Ok(())
}

/// Applies version changes to manifests
pub struct UpdateEngine {
    verifier: Arc<dyn BuildVerifier>,
    match_policy: MatchPolicy,
    output_tail_chars: usize,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl UpdateEngine {
    /// Create an engine that verifies with the given build
    pub fn new(verifier: Arc<dyn BuildVerifier>) -> Self {
        Self {
            verifier,
            match_policy: MatchPolicy::default(),
            output_tail_chars: DEFAULT_OUTPUT_TAIL_CHARS,
            locks: DashMap::new(),
        }
    }

    /// Create an engine from project configuration
    pub fn from_config(config: &Config) -> Self {
        let verifier = CommandVerifier::from_command(&config.verify.command)
            .unwrap_or_else(CommandVerifier::maven)
            .with_timeout(config.verify.timeout());
        Self::new(Arc::new(verifier))
            .with_match_policy(config.update.match_policy)
            .with_output_tail_chars(config.verify.output_tail_chars)
    }

    /// Set which matching blocks are rewritten
    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    /// Set how much build output is kept on failure
    pub fn with_output_tail_chars(mut self, chars: usize) -> Self {
        self.output_tail_chars = chars;
        self
    }

    async fn lock_path(&self, path: &Path) -> OwnedMutexGuard<()> {
        let key = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Write `new_version` for `dependency` without verifying
    pub async fn apply_version(
        &self,
        dependency: &Dependency,
        new_version: &str,
        path: &Path,
    ) -> Result<UpdateOutcome, UpdateError> {
        match self
            .apply(dependency, new_version, path, UpdateMode::WriteOnly)
            .await?
        {
            Applied::Done(outcome) => Ok(outcome),
            Applied::NeedsDecision(pending) => Ok(pending.keep()),
        }
    }

    /// Run the update sequence for one dependency in one manifest
    ///
    /// Nothing is written when no `<version>` line changes; that case is
    /// `UpdateError::NotFound`. A build that cannot be run leaves the new
    /// version on disk and returns `UpdateError::VerificationTool`.
    pub async fn apply(
        &self,
        dependency: &Dependency,
        new_version: &str,
        path: &Path,
        mode: UpdateMode,
    ) -> Result<Applied, UpdateError> {
        let guard = self.lock_path(path).await;
        let coordinate = dependency.coordinate();

        let mut outcome = UpdateOutcome {
            coordinate: coordinate.clone(),
            old_version: dependency.version.clone(),
            new_version: new_version.to_string(),
            path: path.to_path_buf(),
            state: UpdateState::Pending,
            matched_lines: Vec::new(),
            exit_code: None,
            output_tail: None,
        };

        let original = read_manifest(path)
            .await
            .map_err(|e| UpdateError::ReadError {
                coordinate: coordinate.clone(),
                version: new_version.to_string(),
                path: path.to_path_buf(),
                source: e,
            })?;

        let rewrite = rewrite_version(
            &original,
            &dependency.group_id,
            &dependency.artifact_id,
            new_version,
            self.match_policy,
        );
        if !rewrite.changed {
            return Err(UpdateError::not_found(&coordinate, new_version, path));
        }

        write_manifest(path, &rewrite.content)
            .await
            .map_err(|e| UpdateError::WriteError {
                coordinate: coordinate.clone(),
                version: new_version.to_string(),
                path: path.to_path_buf(),
                source: e,
            })?;
        outcome.matched_lines = rewrite.matched_lines;
        outcome.state = UpdateState::Written;
        tracing::info!(
            coordinate = %coordinate,
            from = %dependency.version,
            to = %new_version,
            path = %path.display(),
            lines = ?outcome.matched_lines,
            "wrote new version"
        );

        let on_failure = match mode {
            UpdateMode::WriteOnly => return Ok(Applied::Done(outcome)),
            UpdateMode::Verify { on_failure } => on_failure,
        };

        outcome.state = UpdateState::Testing;
        let build = self
            .verifier
            .verify(&project_dir(path))
            .await
            .map_err(|e| {
                UpdateError::verification_tool(&coordinate, new_version, path, e.to_string())
            })?;

        outcome.exit_code = build.exit_code;
        if build.success() {
            outcome.state = UpdateState::Verified;
            tracing::info!(coordinate = %coordinate, version = %new_version, "build verified");
            return Ok(Applied::Done(outcome));
        }

        outcome.output_tail = Some(build.tail(self.output_tail_chars).to_string());
        outcome.state = UpdateState::Failed;
        tracing::warn!(
            coordinate = %coordinate,
            version = %new_version,
            exit_code = ?build.exit_code,
            "verification build failed"
        );

        let pending = PendingRevert {
            outcome,
            original,
            _guard: guard,
        };
        match on_failure {
            FailureAction::Revert => Ok(Applied::Done(pending.revert().await?)),
            FailureAction::Keep => Ok(Applied::Done(pending.keep())),
            FailureAction::Ask => Ok(Applied::NeedsDecision(pending)),
        }
    }
}
