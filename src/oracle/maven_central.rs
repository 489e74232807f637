//! Maven Central Search API adapter
//!
//! Fetches the published versions of a `groupId:artifactId` coordinate.
//! API endpoint: https://search.maven.org/solrsearch/select
//!
//! Query format: q=g:{groupId}+AND+a:{artifactId}&core=gav&rows=100&wt=json

use super::{latest_of, HttpClient, VersionInfo};
use crate::error::OracleError;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Maven Central Search API base URL
pub const MAVEN_CENTRAL_API_URL: &str = "https://search.maven.org/solrsearch/select";

/// Service name used in errors and logs
const SERVICE: &str = "Maven Central";

/// Maximum number of versions to fetch
const MAX_VERSIONS: u32 = 100;

/// Maven Central adapter
#[derive(Clone)]
pub struct MavenCentralAdapter {
    client: HttpClient,
    base_url: String,
}

/// Maven Central search response
#[derive(Debug, Deserialize)]
struct MavenSearchResponse {
    response: MavenResponseBody,
}

/// Maven Central response body
#[derive(Debug, Deserialize)]
struct MavenResponseBody {
    #[serde(rename = "numFound", default)]
    num_found: u64,
    #[serde(default)]
    docs: Vec<MavenVersionDoc>,
}

/// Maven Central version document
#[derive(Debug, Deserialize)]
struct MavenVersionDoc {
    /// Version string
    v: String,
    /// Timestamp in milliseconds since epoch
    #[serde(default)]
    timestamp: i64,
}

impl MavenCentralAdapter {
    /// Create an adapter against the public search endpoint
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, MAVEN_CENTRAL_API_URL)
    }

    /// Create an adapter against a mirror or test endpoint
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build search URL for group:artifact
    fn build_url(&self, coordinate: &str) -> Result<String, OracleError> {
        let (group, artifact) = split_coordinate(coordinate)?;
        Ok(format!(
            "{}?q=g:{}+AND+a:{}&core=gav&rows={}&wt=json",
            self.base_url, group, artifact, MAX_VERSIONS
        ))
    }

    /// Convert timestamp in milliseconds to DateTime<Utc>
    fn timestamp_to_datetime(timestamp_ms: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(timestamp_ms).single()
    }

    fn versions_from(response: MavenSearchResponse) -> Vec<VersionInfo> {
        let mut versions: Vec<VersionInfo> = response
            .response
            .docs
            .into_iter()
            .filter_map(|doc| {
                Self::timestamp_to_datetime(doc.timestamp)
                    .map(|released_at| VersionInfo::new(doc.v, released_at))
            })
            .collect();
        versions.sort();
        versions
    }

    /// Fetch every published version, sorted ascending
    pub async fn fetch_versions(&self, coordinate: &str) -> Result<Vec<VersionInfo>, OracleError> {
        let url = self.build_url(coordinate)?;
        let response: MavenSearchResponse = self.client.get_json(&url, coordinate, SERVICE).await?;
        tracing::debug!(
            coordinate,
            found = response.response.num_found,
            "Maven Central versions"
        );
        Ok(Self::versions_from(response))
    }

    /// Highest stable release, or highest pre-release if nothing stable exists
    ///
    /// An unknown coordinate yields `None` rather than an error.
    pub async fn latest_version(&self, coordinate: &str) -> Result<Option<String>, OracleError> {
        let versions = match self.fetch_versions(coordinate).await {
            Ok(versions) => versions,
            Err(OracleError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(latest_of(&versions).map(|v| v.version.clone()))
    }
}

/// Split `groupId:artifactId`, rejecting anything else
pub(crate) fn split_coordinate(coordinate: &str) -> Result<(&str, &str), OracleError> {
    match coordinate.split(':').collect::<Vec<_>>().as_slice() {
        [group, artifact] if !group.is_empty() && !artifact.is_empty() => Ok((group, artifact)),
        _ => Err(OracleError::InvalidCoordinate {
            coordinate: coordinate.to_string(),
        }),
    }
}
