//! OSV.dev vulnerability lookups
//!
//! Queries `POST {base}/v1/query` with the Maven ecosystem and the exact
//! version in use, and turns each returned vulnerability into an `Advisory`.

use super::HttpClient;
use crate::domain::{Advisory, Dependency};
use crate::error::OracleError;
use serde::{Deserialize, Serialize};

/// OSV API base URL
pub const OSV_API_URL: &str = "https://api.osv.dev";

/// OSV ecosystem name for Maven artifacts
const ECOSYSTEM: &str = "Maven";

/// Service name used in errors and logs
const SERVICE: &str = "OSV";

/// OSV API client
#[derive(Clone)]
pub struct OsvClient {
    client: HttpClient,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct OsvQuery<'a> {
    package: OsvPackage<'a>,
    version: &'a str,
}

#[derive(Debug, Serialize)]
struct OsvPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

#[derive(Debug, Deserialize)]
struct OsvResponse {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    package: Option<OsvAffectedPackage>,
    #[serde(default)]
    ranges: Vec<OsvRange>,
}

#[derive(Debug, Deserialize)]
struct OsvAffectedPackage {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Debug, Deserialize)]
struct OsvEvent {
    #[serde(default)]
    fixed: Option<String>,
}

impl OsvClient {
    /// Create a client against the public OSV endpoint
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, OSV_API_URL)
    }

    /// Create a client against a mirror or test endpoint
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Advisories affecting this exact coordinate and version
    pub async fn advisories(&self, dependency: &Dependency) -> Result<Vec<Advisory>, OracleError> {
        let coordinate = dependency.coordinate();
        let query = OsvQuery {
            package: OsvPackage {
                name: &coordinate,
                ecosystem: ECOSYSTEM,
            },
            version: &dependency.version,
        };

        let url = format!("{}/v1/query", self.base_url);
        let response: OsvResponse = self
            .client
            .post_json(&url, &query, &dependency.key(), SERVICE)
            .await?;

        let advisories = to_advisories(&coordinate, response);
        tracing::debug!(
            dependency = %dependency,
            count = advisories.len(),
            "OSV advisories"
        );
        Ok(advisories)
    }
}

/// Convert an OSV response, taking fixed versions only from ranges that
/// belong to this coordinate
fn to_advisories(coordinate: &str, response: OsvResponse) -> Vec<Advisory> {
    response
        .vulns
        .into_iter()
        .map(|vuln| {
            let fixed: Vec<String> = vuln
                .affected
                .iter()
                .filter(|a| {
                    a.package
                        .as_ref()
                        .map_or(true, |p| p.name.is_empty() || p.name == coordinate)
                })
                .flat_map(|a| a.ranges.iter())
                .flat_map(|r| r.events.iter())
                .filter_map(|e| e.fixed.clone())
                .collect();
            Advisory::new(vuln.id, vuln.summary.unwrap_or_default(), fixed)
        })
        .collect()
}
