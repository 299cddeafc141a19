//! Error types for Gleaner.
//!
//! One error hierarchy, derived with `thiserror`, shared by every crate in the
//! workspace. The variants mirror the failure classes a caller can act on:
//! transport failures are retryable, service errors carry the indexer's own
//! message, and content resolution collapses to `NotFound`.

use thiserror::Error;

/// Result type alias using `GleanerError`.
pub type Result<T> = std::result::Result<T, GleanerError>;

/// Main error type for all Gleaner operations.
#[derive(Debug, Error)]
pub enum GleanerError {
    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSPORT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// An HTTP call completed with a non-success status.
    #[error("Request failed with HTTP status {status}")]
    Transport {
        /// HTTP status code
        status: u16,
    },

    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("Network error: {0}")]
    Network(String),

    /// The per-attempt deadline elapsed before the request completed.
    #[error("Request timed out after {millis}ms")]
    Timeout {
        /// Deadline that elapsed, in milliseconds
        millis: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // INDEXER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The indexer answered with a well-formed response reporting an error.
    #[error("Indexer error: {0}")]
    Service(String),

    /// The indexer answered successfully but without a data payload.
    #[error("No data returned from indexer")]
    NoData,

    // ═══════════════════════════════════════════════════════════════════════════
    // CONTENT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Content could not be retrieved from any source.
    #[error("Content not found: {0}")]
    NotFound(String),

    /// A payload was not valid structured data.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A content reference could not be normalized to a CID.
    #[error("Invalid content reference: {0}")]
    InvalidReference(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// An identity (wallet address) was empty or malformed.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for GleanerError {
    fn from(err: serde_json::Error) -> Self {
        GleanerError::Parse(err.to_string())
    }
}

impl GleanerError {
    /// Returns true if the failure happened below the application layer
    /// (bad status, no response, or deadline).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GleanerError::Transport { .. } | GleanerError::Network(_) | GleanerError::Timeout { .. }
        )
    }

    /// Returns true if the indexer itself reported the error.
    pub fn is_service_error(&self) -> bool {
        matches!(self, GleanerError::Service(_) | GleanerError::NoData)
    }

    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        self.is_transport() || matches!(self, GleanerError::Service(_))
    }
}
