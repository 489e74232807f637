//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: manifest could not be read or parsed (per file, non-fatal to a scan)
//! - OracleError: a lookup against Maven Central or OSV failed (per dependency, non-fatal)
//! - UpdateError: a version rewrite or its verification failed (per operation)
//! - PersistenceError: the ignore file could not be read or written (logged, non-fatal)
//! - ConfigError: invalid configuration file or values

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Vulnerability/version authority errors
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Update protocol errors
    #[error(transparent)]
    Update(#[from] UpdateError),

    /// Ignore file errors
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to reading and parsing a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed XML
    #[error("failed to parse XML in {path}: {message}")]
    XmlParseError { path: PathBuf, message: String },
}

/// Errors returned by the vulnerability/version authority
#[derive(Error, Debug, Clone)]
pub enum OracleError {
    /// Artifact unknown to the service
    #[error("'{coordinate}' not found in {service}")]
    NotFound { coordinate: String, service: String },

    /// Network request failed
    #[error("failed to query {service} for '{coordinate}': {message}")]
    NetworkError {
        coordinate: String,
        service: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {service}")]
    RateLimitExceeded { service: String },

    /// Response body could not be understood
    #[error("invalid response from {service} for '{coordinate}': {message}")]
    InvalidResponse {
        coordinate: String,
        service: String,
        message: String,
    },

    /// Request timed out
    #[error("timeout while querying {service} for '{coordinate}'")]
    Timeout { coordinate: String, service: String },

    /// Coordinate is not in `groupId:artifactId` form
    #[error("invalid coordinate '{coordinate}': expected 'groupId:artifactId'")]
    InvalidCoordinate { coordinate: String },
}

/// Errors from the update/verify/revert protocol
///
/// Every variant carries the coordinate, the attempted version and the
/// manifest path so the caller can retry or revert by hand.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// No `<version>` line could be rewritten
    #[error(
        "could not find {coordinate} in {path} (it may be inherited from a parent POM); \
         {version} not applied"
    )]
    NotFound {
        coordinate: String,
        version: String,
        path: PathBuf,
    },

    /// Reading the manifest before the write failed
    #[error("failed to read {path} while updating {coordinate} to {version}: {source}")]
    ReadError {
        coordinate: String,
        version: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the new (or original) content failed
    #[error("failed to write {path} while updating {coordinate} to {version}: {source}")]
    WriteError {
        coordinate: String,
        version: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build could not be run; the new version stays on disk unverified
    #[error(
        "verification of {coordinate} {version} in {path} could not run: {message} \
         (the new version was written but not verified)"
    )]
    VerificationTool {
        coordinate: String,
        version: String,
        path: PathBuf,
        message: String,
    },
}

/// Errors reading or writing the ignore file
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to read the ignore file
    #[error("failed to read ignore file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the ignore file
    #[error("failed to write ignore file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("invalid config file {path}: {message}")]
    InvalidFile { path: PathBuf, message: String },

    /// A value is out of range or malformed
    #[error("invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

impl ManifestError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new XmlParseError
    pub fn xml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::XmlParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl OracleError {
    /// Creates a new NotFound error
    pub fn not_found(coordinate: impl Into<String>, service: impl Into<String>) -> Self {
        OracleError::NotFound {
            coordinate: coordinate.into(),
            service: service.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        coordinate: impl Into<String>,
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        OracleError::NetworkError {
            coordinate: coordinate.into(),
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(service: impl Into<String>) -> Self {
        OracleError::RateLimitExceeded {
            service: service.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(coordinate: impl Into<String>, service: impl Into<String>) -> Self {
        OracleError::Timeout {
            coordinate: coordinate.into(),
            service: service.into(),
        }
    }
}

impl UpdateError {
    /// Creates a new NotFound error
    pub fn not_found(
        coordinate: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        UpdateError::NotFound {
            coordinate: coordinate.into(),
            version: version.into(),
            path: path.into(),
        }
    }

    /// Creates a new VerificationTool error
    pub fn verification_tool(
        coordinate: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        UpdateError::VerificationTool {
            coordinate: coordinate.into(),
            version: version.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Manifest path the failed operation targeted
    pub fn path(&self) -> &std::path::Path {
        match self {
            UpdateError::NotFound { path, .. }
            | UpdateError::ReadError { path, .. }
            | UpdateError::WriteError { path, .. }
            | UpdateError::VerificationTool { path, .. } => path,
        }
    }
}
