//! HTTP client shared by the Maven Central and OSV adapters
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry on 429 and transport errors
//! - JSON GET and POST helpers that map failures to `OracleError`

use crate::error::OracleError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("feraldeps/", env!("CARGO_PKG_VERSION"));

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, OracleError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                OracleError::network_error(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create a client with the given timeout and the default User-Agent
    pub fn with_timeout(timeout: Duration) -> Result<Self, OracleError> {
        Self::with_config(timeout, DEFAULT_USER_AGENT)
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Send a request, retrying rate limits and transport failures
    ///
    /// `build` is called once per attempt since a `RequestBuilder` is consumed
    /// by `send`. 404 maps to `NotFound` and is never retried.
    async fn send_with_retry<F>(
        &self,
        build: F,
        coordinate: &str,
        service: &str,
    ) -> Result<reqwest::Response, OracleError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            match build(&self.client).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(OracleError::rate_limit_exceeded(service));
                    } else if status == StatusCode::NOT_FOUND {
                        return Err(OracleError::not_found(coordinate, service));
                    } else if !status.is_success() {
                        return Err(OracleError::network_error(
                            coordinate,
                            service,
                            format!("HTTP {}", status),
                        ));
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) if e.is_timeout() => {
                    last_error = Some(OracleError::timeout(coordinate, service));
                }
                Err(e) => {
                    last_error = Some(OracleError::network_error(
                        coordinate,
                        service,
                        e.to_string(),
                    ));
                }
            }

            if attempt < self.max_retries {
                tracing::debug!(
                    service,
                    coordinate,
                    attempt = attempt + 1,
                    delay_ms = delay,
                    "retrying request"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay *= 2;
            }
        }

        Err(last_error
            .unwrap_or_else(|| OracleError::network_error(coordinate, service, "unknown error")))
    }

    async fn decode_json<T: DeserializeOwned>(
        response: reqwest::Response,
        coordinate: &str,
        service: &str,
    ) -> Result<T, OracleError> {
        response
            .json::<T>()
            .await
            .map_err(|e| OracleError::InvalidResponse {
                coordinate: coordinate.to_string(),
                service: service.to_string(),
                message: format!("failed to parse JSON: {}", e),
            })
    }

    /// Perform a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        coordinate: &str,
        service: &str,
    ) -> Result<T, OracleError> {
        let response = self
            .send_with_retry(|client| client.get(url), coordinate, service)
            .await?;
        Self::decode_json(response, coordinate, service).await
    }

    /// POST a JSON body and parse the JSON response
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        body: &B,
        coordinate: &str,
        service: &str,
    ) -> Result<T, OracleError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .send_with_retry(|client| client.post(url).json(body), coordinate, service)
            .await?;
        Self::decode_json(response, coordinate, service).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_http_client_with_config() {
        let client = HttpClient::with_config(Duration::from_secs(60), "test-agent/1.0");
        assert!(client.is_ok());
    }

    #[test]
    fn test_http_client_with_max_retries() {
        let client = HttpClient::new().unwrap().with_max_retries(5);
        assert_eq!(client.max_retries, 5);
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert!(DEFAULT_USER_AGENT.starts_with("feraldeps/"));
        assert_eq!(DEFAULT_MAX_RETRIES, 3);
        assert_eq!(BASE_DELAY_MS, 100);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = HttpClient::with_timeout(Duration::from_secs(2))
            .unwrap()
            .with_max_retries(0);
        let result: Result<serde_json::Value, _> = client
            .get_json("http://127.0.0.1:1/unreachable", "org.x:lib", "Test")
            .await;
        assert!(matches!(
            result,
            Err(OracleError::NetworkError { .. }) | Err(OracleError::Timeout { .. })
        ));
    }
}
