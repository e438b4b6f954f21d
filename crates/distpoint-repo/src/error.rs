//! Error types for distribution point operations

use std::fmt;
use std::time::Duration;

use distpoint_core::CoreError;
use thiserror::Error;

/// Distribution point operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("Repository not found: {name}")]
    RepositoryNotFound { name: String },

    #[error("Repository already exists: {name}")]
    RepositoryAlreadyExists { name: String },

    #[error("No distribution points configured")]
    EmptySet,

    #[error("Artifact not found: {path}")]
    ArtifactNotFound { path: String },

    // ============ Connection Errors ============
    #[error("Mount failed for {repo}: {message}")]
    MountFailed { repo: String, message: String },

    #[error("Authentication failed for {repo}: {message}")]
    AuthFailed { repo: String, message: String },

    #[error("Network error for {repo}: {message}")]
    NetworkError { repo: String, message: String },

    #[error("{repo} timed out after {}", humantime::format_duration(.limit.to_owned()))]
    Timeout { repo: String, limit: Duration },

    // ============ Upload Errors ============
    #[error("Upload to {repo} failed ({kind}): {message}")]
    Upload {
        repo: String,
        kind: UploadErrorKind,
        message: String,
    },

    #[error("{repo} does not support {operation}")]
    Unsupported {
        repo: String,
        operation: &'static str,
    },

    // ============ Aggregate ============
    #[error("Every distribution point failed ({count} attempted)")]
    AllFailed { count: usize },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Why an upload failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorKind {
    /// The endpoint refused the artifact
    Rejected,
    /// No multipart boundary distinct from the payload could be found, so
    /// the body was never sent
    BoundaryCollision,
}

impl fmt::Display for UploadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadErrorKind::Rejected => f.write_str("rejected"),
            UploadErrorKind::BoundaryCollision => f.write_str("boundary collision"),
        }
    }
}

/// Coarse grouping callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Connection,
    Upload,
    Io,
}

impl RepoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RepoError::Config(_)
            | RepoError::RepositoryNotFound { .. }
            | RepoError::RepositoryAlreadyExists { .. }
            | RepoError::EmptySet
            | RepoError::ArtifactNotFound { .. } => ErrorCategory::Configuration,
            RepoError::MountFailed { .. }
            | RepoError::AuthFailed { .. }
            | RepoError::NetworkError { .. }
            | RepoError::Timeout { .. } => ErrorCategory::Connection,
            RepoError::Upload { .. } | RepoError::Unsupported { .. } | RepoError::AllFailed { .. } => {
                ErrorCategory::Upload
            }
            RepoError::Io(_) | RepoError::Serialization(_) => ErrorCategory::Io,
        }
    }

    pub fn is_connection(&self) -> bool {
        self.category() == ErrorCategory::Connection
    }

    /// Repository the error is attributed to, when it names one
    pub fn repository(&self) -> Option<&str> {
        match self {
            RepoError::MountFailed { repo, .. }
            | RepoError::AuthFailed { repo, .. }
            | RepoError::NetworkError { repo, .. }
            | RepoError::Timeout { repo, .. }
            | RepoError::Upload { repo, .. }
            | RepoError::Unsupported { repo, .. } => Some(repo),
            RepoError::RepositoryNotFound { name } | RepoError::RepositoryAlreadyExists { name } => {
                Some(name)
            }
            _ => None,
        }
    }

    /// Map a transport error from `repo`'s HTTP session
    pub fn from_reqwest(repo: &str, timeout: Duration, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RepoError::Timeout {
                repo: repo.to_string(),
                limit: timeout,
            }
        } else if e.is_connect() {
            RepoError::NetworkError {
                repo: repo.to_string(),
                message: format!("Connection failed: {}", e),
            }
        } else {
            RepoError::NetworkError {
                repo: repo.to_string(),
                message: e.to_string(),
            }
        }
    }
}

/// Result type for distribution point operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}
