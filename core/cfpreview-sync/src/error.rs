//! Error types for the live preview layer.
//!
//! Only configuration errors escape to callers. Everything that can go wrong
//! while the session is running (bad messages, failing subscribers, a missing
//! host window) is logged and counted instead.

use thiserror::Error;

/// Result type for live preview operations.
pub type PreviewResult<T> = Result<T, PreviewError>;

/// Errors that can occur in the live preview layer.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Required configuration is missing or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The host window could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No async runtime is available to schedule drains on.
    #[error("no runtime available: {0}")]
    NoRuntime(String),
}

/// Error a subscriber callback may return. It is reported, never propagated.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by subscriber callbacks.
pub type SubscriberResult = Result<(), SubscriberError>;
