//! In-memory memoisation for oracle lookups
//!
//! Wraps any `VulnerabilityOracle` and remembers successful answers for the
//! lifetime of the wrapper: latest versions per coordinate, advisories per
//! coordinate:version. Failures are not cached so a later call may retry.

use super::VulnerabilityOracle;
use crate::domain::{Advisory, Dependency};
use crate::error::OracleError;
use async_trait::async_trait;
use dashmap::DashMap;

/// Caching decorator over another oracle
pub struct CachingOracle<O: VulnerabilityOracle> {
    inner: O,
    latest: DashMap<String, Option<String>>,
    advisories: DashMap<String, Vec<Advisory>>,
}

impl<O: VulnerabilityOracle> CachingOracle<O> {
    /// Wrap an oracle with empty caches
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            latest: DashMap::new(),
            advisories: DashMap::new(),
        }
    }

    /// The wrapped oracle
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Number of cached entries (latest versions, advisory lists)
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.latest.len(), self.advisories.len())
    }
}

#[async_trait]
impl<O: VulnerabilityOracle> VulnerabilityOracle for CachingOracle<O> {
    async fn latest_version(&self, coordinate: &str) -> Result<Option<String>, OracleError> {
        if let Some(cached) = self.latest.get(coordinate) {
            tracing::debug!(coordinate, "latest version cache hit");
            return Ok(cached.clone());
        }

        let latest = self.inner.latest_version(coordinate).await?;
        self.latest.insert(coordinate.to_string(), latest.clone());
        Ok(latest)
    }

    async fn advisories(&self, dependency: &Dependency) -> Result<Vec<Advisory>, OracleError> {
        let key = dependency.key();
        if let Some(cached) = self.advisories.get(&key) {
            tracing::debug!(dependency = %key, "advisory cache hit");
            return Ok(cached.clone());
        }

        let advisories = self.inner.advisories(dependency).await?;
        self.advisories.insert(key, advisories.clone());
        Ok(advisories)
    }
}
