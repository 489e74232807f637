//! Per-project configuration
//!
//! Reads an optional `feraldeps.toml` next to the manifest. Every key is
//! optional; a missing file means defaults. Command-line flags are applied
//! on top with [`Config::apply_overrides`].
//!
//! ```toml
//! concurrency = 6
//! ignore_file = ".feraldeps-ignore"
//!
//! [oracle]
//! maven_central_url = "https://search.maven.org/solrsearch/select"
//! osv_url = "https://api.osv.dev"
//! timeout_secs = 30
//! max_retries = 3
//!
//! [verify]
//! command = ["mvn", "clean", "compile"]
//! timeout_secs = 600
//! output_tail_chars = 500
//!
//! [update]
//! match_policy = "all"
//! ```

use crate::error::ConfigError;
use crate::ignore::IGNORE_FILENAME;
use crate::manifest::MatchPolicy;
use crate::oracle::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, MAVEN_CENTRAL_API_URL, OSV_API_URL};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file name looked up next to the manifest
pub const CONFIG_FILENAME: &str = "feraldeps.toml";

/// Default number of in-flight oracle lookups
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Upper bound for the lookup worker pool
pub const MAX_CONCURRENCY: usize = 32;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Concurrent oracle lookups
    pub concurrency: usize,
    /// Ignore file name, relative to the project directory
    pub ignore_file: String,
    /// Remote oracle settings
    pub oracle: OracleConfig,
    /// Build verification settings
    pub verify: VerifyConfig,
    /// Version rewrite settings
    pub update: UpdateConfig,
    /// Keys not recognised by this version
    #[serde(flatten)]
    unknown: BTreeMap<String, toml::Value>,
}

/// Remote oracle settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub maven_central_url: String,
    pub osv_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Build verification settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Program and arguments, run in the manifest's directory
    pub command: Vec<String>,
    /// Kill the build after this many seconds; 0 waits forever
    pub timeout_secs: u64,
    /// How much of the build output to show on failure
    pub output_tail_chars: usize,
}

/// Version rewrite settings
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub match_policy: MatchPolicy,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub concurrency: Option<usize>,
    pub verify_timeout_secs: Option<u64>,
    pub match_policy: Option<MatchPolicy>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            ignore_file: IGNORE_FILENAME.to_string(),
            oracle: OracleConfig::default(),
            verify: VerifyConfig::default(),
            update: UpdateConfig::default(),
            unknown: BTreeMap::new(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            maven_central_url: MAVEN_CENTRAL_API_URL.to_string(),
            osv_url: OSV_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            command: vec!["mvn".to_string(), "clean".to_string(), "compile".to_string()],
            timeout_secs: 600,
            output_tail_chars: 500,
        }
    }
}

impl VerifyConfig {
    /// Build timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Config {
    /// Parse configuration text
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| ConfigError::InvalidFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        for key in config.unknown.keys() {
            tracing::warn!("unknown config key '{}' in {} ignored", key, path.display());
        }
        config.unknown.clear();

        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content, path)
    }

    /// Load `feraldeps.toml` from a directory, or defaults if absent
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading config");
        Self::load_from_path(&path)
    }

    /// Load the config that applies to a manifest file
    pub fn for_manifest(manifest: &Path) -> Result<Self, ConfigError> {
        Self::discover(&project_dir(manifest))
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.verify.command.is_empty() || self.verify.command[0].trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "verify.command".to_string(),
                value: format!("{:?}", self.verify.command),
                message: "must name a program to run".to_string(),
            });
        }
        if self.ignore_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "ignore_file".to_string(),
                value: self.ignore_file.clone(),
                message: "must not be empty".to_string(),
            });
        }
        self.concurrency = clamp_concurrency(self.concurrency);
        Ok(())
    }

    /// Apply command-line values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = clamp_concurrency(concurrency);
        }
        if let Some(timeout) = overrides.verify_timeout_secs {
            self.verify.timeout_secs = timeout;
        }
        if let Some(policy) = overrides.match_policy {
            self.update.match_policy = policy;
        }
    }

    /// Ignore file for the project containing `manifest`
    pub fn ignore_path(&self, manifest: &Path) -> PathBuf {
        project_dir(manifest).join(&self.ignore_file)
    }
}

/// Directory a manifest lives in (`.` for a bare file name)
pub fn project_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn clamp_concurrency(value: usize) -> usize {
    value.clamp(1, MAX_CONCURRENCY)
}
