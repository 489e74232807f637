//! Vulnerability and latest-version authority
//!
//! This module provides:
//! - The `VulnerabilityOracle` trait the scan and report code depend on
//! - HTTP client shared foundation with retry logic
//! - Maven Central adapter for latest versions
//! - OSV.dev client for advisories
//! - Caching and offline oracles
//! - `lookup`, which turns one dependency into a `LookupResult` without failing

mod caching;
mod client;
mod maven_central;
mod osv;
mod version_info;

pub use caching::CachingOracle;
pub use client::{HttpClient, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use maven_central::{MavenCentralAdapter, MAVEN_CENTRAL_API_URL};
pub use osv::{OsvClient, OSV_API_URL};
pub use version_info::{compare_versions, is_prerelease_version, latest_of, VersionInfo};

use crate::config::OracleConfig;
use crate::domain::{Advisory, Dependency, LookupResult, RemediationInfo};
use crate::error::OracleError;
use async_trait::async_trait;
use std::time::Duration;

/// Source of latest-version and vulnerability answers
///
/// `latest_version` is keyed by coordinate only; the vulnerability lookups
/// are keyed by the exact coordinate and version.
#[async_trait]
pub trait VulnerabilityOracle: Send + Sync {
    /// Most recent known release of a `groupId:artifactId`
    async fn latest_version(&self, coordinate: &str) -> Result<Option<String>, OracleError>;

    /// Advisories affecting this exact dependency version
    async fn advisories(&self, dependency: &Dependency) -> Result<Vec<Advisory>, OracleError>;

    /// Returns true if at least one advisory affects this version
    async fn is_vulnerable(&self, dependency: &Dependency) -> Result<bool, OracleError> {
        Ok(!self.advisories(dependency).await?.is_empty())
    }

    /// Fix guidance for this version, absent when it is not vulnerable
    async fn remediation_info(
        &self,
        dependency: &Dependency,
    ) -> Result<Option<RemediationInfo>, OracleError> {
        let advisories = self.advisories(dependency).await?;
        Ok(RemediationInfo::from_advisories(&dependency.version, &advisories))
    }
}

/// Oracle backed by Maven Central and OSV.dev
#[derive(Clone)]
pub struct RemoteOracle {
    maven: MavenCentralAdapter,
    osv: OsvClient,
}

impl RemoteOracle {
    /// Combine a version source and an advisory source
    pub fn new(maven: MavenCentralAdapter, osv: OsvClient) -> Self {
        Self { maven, osv }
    }

    /// Build both clients from configuration
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?
            .with_max_retries(config.max_retries);
        Ok(Self::new(
            MavenCentralAdapter::with_base_url(client.clone(), &config.maven_central_url),
            OsvClient::with_base_url(client, &config.osv_url),
        ))
    }
}

#[async_trait]
impl VulnerabilityOracle for RemoteOracle {
    async fn latest_version(&self, coordinate: &str) -> Result<Option<String>, OracleError> {
        self.maven.latest_version(coordinate).await
    }

    async fn advisories(&self, dependency: &Dependency) -> Result<Vec<Advisory>, OracleError> {
        self.osv.advisories(dependency).await
    }
}

/// Oracle that knows nothing; every dependency reports "no info"
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

#[async_trait]
impl VulnerabilityOracle for OfflineOracle {
    async fn latest_version(&self, _coordinate: &str) -> Result<Option<String>, OracleError> {
        Ok(None)
    }

    async fn advisories(&self, _dependency: &Dependency) -> Result<Vec<Advisory>, OracleError> {
        Ok(Vec::new())
    }
}

/// Run every lookup for one dependency, recording failures instead of
/// returning them
///
/// The latest-version and vulnerability lookups run concurrently. Remediation
/// is only requested for vulnerable versions.
pub async fn lookup<O>(oracle: &O, dependency: &Dependency) -> LookupResult
where
    O: VulnerabilityOracle + ?Sized,
{
    let coordinate = dependency.coordinate();
    let (latest, vulnerable) = tokio::join!(
        oracle.latest_version(&coordinate),
        oracle.is_vulnerable(dependency)
    );

    let mut result = LookupResult::default();

    match latest {
        Ok(latest) => result.latest_version = latest,
        Err(e) => {
            tracing::warn!(dependency = %dependency, "latest version lookup failed: {}", e);
            result.errors.push(e.to_string());
        }
    }

    match vulnerable {
        Ok(true) => {
            result.vulnerable = true;
            match oracle.remediation_info(dependency).await {
                Ok(info) => result.remediation = info,
                Err(e) => {
                    tracing::warn!(dependency = %dependency, "remediation lookup failed: {}", e);
                    result.errors.push(e.to_string());
                }
            }
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(dependency = %dependency, "vulnerability lookup failed: {}", e);
            result.errors.push(e.to_string());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Oracle with fixed answers for tests
    struct FixedOracle {
        latest: Result<Option<String>, OracleError>,
        advisories: Result<Vec<Advisory>, OracleError>,
    }

    #[async_trait]
    impl VulnerabilityOracle for FixedOracle {
        async fn latest_version(&self, _coordinate: &str) -> Result<Option<String>, OracleError> {
            self.latest.clone()
        }

        async fn advisories(&self, _dependency: &Dependency) -> Result<Vec<Advisory>, OracleError> {
            self.advisories.clone()
        }
    }

    fn dep() -> Dependency {
        Dependency::new("org.x", "lib", "1.0")
    }

    #[tokio::test]
    async fn test_offline_oracle_reports_nothing() {
        let result = lookup(&OfflineOracle, &dep()).await;
        assert_eq!(result, LookupResult::default());
    }

    #[tokio::test]
    async fn test_lookup_vulnerable_with_remediation() {
        let oracle = FixedOracle {
            latest: Ok(Some("2.0".to_string())),
            advisories: Ok(vec![Advisory::new(
                "CVE-2024-1",
                "Deserialization flaw",
                vec!["1.2".to_string()],
            )]),
        };

        let result = lookup(&oracle, &dep()).await;
        assert_eq!(result.latest_version.as_deref(), Some("2.0"));
        assert!(result.vulnerable);
        let remediation = result.remediation.unwrap();
        assert_eq!(remediation.fixed_versions, vec!["1.2".to_string()]);
        assert_eq!(remediation.summary, "Deserialization flaw");
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_no_info() {
        let oracle = FixedOracle {
            latest: Err(OracleError::timeout("org.x:lib", "Maven Central")),
            advisories: Err(OracleError::network_error("org.x:lib", "OSV", "refused")),
        };

        let result = lookup(&oracle, &dep()).await;
        assert!(result.latest_version.is_none());
        assert!(!result.vulnerable);
        assert!(result.remediation.is_none());
        assert_eq!(result.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_answer() {
        let oracle = FixedOracle {
            latest: Ok(Some("3.0".to_string())),
            advisories: Err(OracleError::rate_limit_exceeded("OSV")),
        };

        let result = lookup(&oracle, &dep()).await;
        assert_eq!(result.latest_version.as_deref(), Some("3.0"));
        assert!(!result.vulnerable);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_trait_object_lookup() {
        let oracle: Box<dyn VulnerabilityOracle> = Box::new(OfflineOracle);
        let result = lookup(oracle.as_ref(), &dep()).await;
        assert!(result.latest_version.is_none());
    }

    #[test]
    fn test_remote_oracle_from_config() {
        let oracle = RemoteOracle::from_config(&OracleConfig::default());
        assert!(oracle.is_ok());
    }
}
