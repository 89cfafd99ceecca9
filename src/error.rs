//! Error types for Reprise

use thiserror::Error;

use crate::matcher::RequestParts;

/// Result type for Reprise operations
pub type Result<T> = std::result::Result<T, RepriseError>;

/// Errors that can occur in Reprise
#[derive(Debug, Error)]
pub enum RepriseError {
    /// Malformed archive interchange document
    #[error("Invalid archive format: {0}")]
    ArchiveFormat(String),

    /// Playback-mode miss: no recorded entry matched the request
    #[error("No recorded entry matches {} {}", request.method, request.url)]
    NoMatchFound {
        /// The request that failed to match, kept for diagnostics
        request: Box<RequestParts>,
    },

    /// Unrecognized explicit recording mode value
    #[error("Invalid recording mode: {0:?}")]
    InvalidRecordingMode(String),

    /// Request could not be parsed into comparable form
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Pass-through network failure, propagated unchanged
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepriseError {
    /// Wrap a transport-layer failure without reinterpreting it.
    pub fn network<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network(Box::new(source))
    }
}
