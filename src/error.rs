use crate::client::sources::SourceError;
use std::time::Duration;
use thiserror::Error;

/// Crate-level error type.
///
/// Per-source failures are represented by [`SourceError`] and stay contained
/// to that source's contribution; this type covers configuration problems,
/// invalid caller input, and the one aggregate case where an enrichment pass
/// produced nothing at all.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    // Serialization errors (usually permanent)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Every eligible enrichment source failed for this paper.
    ///
    /// Partial success is not an error: as long as one source contributed,
    /// enrichment returns `Ok` and the failures ride along in the report.
    #[error("all {} enrichment sources failed", failures.len())]
    AllSourcesFailed { failures: Vec<SourceFailure> },

    /// No configured source could derive a usable query from the supplied
    /// identifier set.
    #[error("no source can resolve the supplied identifiers")]
    NoUsableIdentifier,

    /// The enrichment queue is empty.
    #[error("enrichment queue is empty")]
    QueueEmpty,
}

/// One source's recorded failure within an enrichment pass.
#[derive(Debug)]
pub struct SourceFailure {
    /// Source id (e.g. `"crossref"`).
    pub source: String,
    /// What went wrong for that source.
    pub error: SourceError,
}

/// Error categorization for caller retry strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Permanent errors - should not retry
    Permanent,
    /// Transient errors - safe to retry
    Transient,
    /// Rate limited - retry after the hint elapses
    RateLimited,
}

impl Error {
    /// Categorize error for caller-side retry logic
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_)
            | Self::InvalidInput { .. }
            | Self::Serde(_)
            | Self::NoUsableIdentifier
            | Self::QueueEmpty => ErrorCategory::Permanent,

            Self::AllSourcesFailed { failures } => {
                // An all-rate-limited pass is worth retrying after the hint;
                // anything with a transient member is worth retrying too.
                if failures
                    .iter()
                    .all(|f| matches!(f.error, SourceError::RateLimited { .. }))
                {
                    ErrorCategory::RateLimited
                } else if failures.iter().any(|f| f.error.is_transient()) {
                    ErrorCategory::Transient
                } else {
                    ErrorCategory::Permanent
                }
            }
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::RateLimited
        )
    }

    /// Longest server-supplied retry-after hint, when every failed source
    /// was rate limited.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::AllSourcesFailed { failures } => failures
                .iter()
                .filter_map(|f| match f.error {
                    SourceError::RateLimited { retry_after } => retry_after,
                    _ => None,
                })
                .max(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
