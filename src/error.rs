//! Error types for the storage, viewport and routing seams
//!
//! None of these escape the coordinator's public lifecycle calls; they exist
//! so the backends can use `?` and the coordinator can log what went wrong.

use thiserror::Error;

/// Session store failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// No storage facility (private mode, missing window, ...)
    #[error("session storage is unavailable")]
    Unavailable,

    /// Write rejected because the store is full
    #[error("storage quota exceeded writing {key} ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// Host-level error reported by the backend
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failure decoding or encoding one storage representation
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scroll offset {0:?}")]
    InvalidOffset(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Viewport query or scroll command failure
#[derive(Debug, Error)]
pub enum ViewportError {
    #[error("viewport is not available")]
    Unavailable,

    #[error("viewport reported an invalid metric: {0}")]
    InvalidMetric(&'static str),

    #[error("scroll command failed: {0}")]
    Command(String),
}

/// Routing collaborator failure
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("router is not available")]
    Unavailable,

    #[error("navigation to {path} failed: {reason}")]
    Navigation { path: String, reason: String },
}

/// Invalid coordinator configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("attempt delays must not be empty")]
    NoAttempts,

    #[error("attempt delays must be ascending (found {previous} before {next})")]
    NotAscending { previous: u64, next: u64 },

    #[error("history capacity must be at least 1")]
    ZeroHistoryCapacity,
}
