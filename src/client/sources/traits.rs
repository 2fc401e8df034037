//! The enrichment source contract every external catalog integration
//! implements.

use crate::identifier::IdentifierSet;
use crate::model::{EnrichmentCapability, EnrichmentData};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors a single source can produce during one enrichment attempt.
///
/// Every variant is contained to that source's contribution; a failing
/// source never aborts sibling fetches.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The supplied identifier set is insufficient for this source. Not
    /// retried; the source is simply skipped.
    #[error("no usable identifier for this source")]
    NoIdentifier,

    /// Missing or invalid credential. Surfaced to the caller, never retried
    /// automatically.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// The source has no record of this paper. Terminal for the source, not
    /// an error for the batch.
    #[error("record not found")]
    NotFound,

    /// HTTP 429, optionally with a server-supplied retry-after hint. The
    /// orchestrator does not auto-retry; callers may retry once the hint
    /// elapses.
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Connectivity failure or 5xx. Terminal for this attempt.
    #[error("network error: {0}")]
    Network(String),

    /// The per-source call deadline elapsed.
    #[error("timeout occurred")]
    Timeout,

    /// Malformed or unexpected response shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// Whether a later attempt could plausibly succeed without caller action
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

/// What one successful enrichment call produced: the (already merged) fact
/// sheet plus any identifiers the source discovered along the way, e.g. its
/// own catalog id for the paper.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    pub data: EnrichmentData,
    pub resolved: IdentifierSet,
}

/// One external catalog integration.
///
/// Implementations are constructed with their collaborators (HTTP client,
/// their own [`RateLimiter`](crate::client::RateLimiter), a
/// [`CredentialStore`](crate::credentials::CredentialStore)) and hold no
/// global state.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// Stable source id (e.g. `"openalex"`); also the credential and
    /// rate-budget lookup key.
    fn name(&self) -> &str;

    /// Human-readable description of the catalog
    fn description(&self) -> &str;

    /// Enrichment facts this source can supply. Read without I/O.
    fn capabilities(&self) -> Vec<EnrichmentCapability>;

    /// Derive the lookup key this source needs from whatever identifiers are
    /// already known, without performing any fetch. `None` means the source
    /// cannot do anything with this identifier set.
    fn resolve_query(&self, ids: &IdentifierSet) -> Option<String>;

    /// Fetch and parse enrichment facts for one paper.
    ///
    /// Must wait on this source's rate limiter before issuing the request
    /// and map HTTP failures onto [`SourceError`]. When `existing` is
    /// supplied the returned sheet is `merge(new, existing)`, so a single call
    /// is always a net gain of information, never a net loss.
    async fn enrich(
        &self,
        ids: &IdentifierSet,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentOutcome, SourceError>;
}

/// Map a non-success HTTP status onto the error taxonomy.
///
/// `retry_after` carries the raw `Retry-After` header value when present
/// (either delta-seconds or an HTTP-date).
pub(crate) fn error_for_status(status: u16, retry_after: Option<&str>) -> SourceError {
    match status {
        404 | 410 => SourceError::NotFound,
        401 | 403 => SourceError::AuthenticationRequired(format!("HTTP {status}")),
        429 => SourceError::RateLimited {
            retry_after: retry_after.and_then(parse_retry_after),
        },
        _ => SourceError::Network(format!("HTTP {status}")),
    }
}

/// Parse a `Retry-After` header value: delta-seconds, or an RFC 2822
/// HTTP-date relative to now.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delta = date.signed_duration_since(chrono::Utc::now());
    delta.to_std().ok()
}

/// Shared response handling for the JSON catalogs: reject non-success
/// statuses via the taxonomy, otherwise hand back the body for parsing.
pub(crate) async fn read_success_body(
    response: reqwest::Response,
) -> Result<String, SourceError> {
    let status = response.status();
    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        return Err(error_for_status(status.as_u16(), retry_after.as_deref()));
    }

    response
        .text()
        .await
        .map_err(|e| SourceError::Network(format!("failed to read response: {e}")))
}

/// Map a reqwest transport error onto the taxonomy.
pub(crate) fn transport_error(e: &reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::Network(format!("connection failed: {e}"))
    } else {
        SourceError::Network(format!("request failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert!(matches!(error_for_status(404, None), SourceError::NotFound));
        assert!(matches!(
            error_for_status(401, None),
            SourceError::AuthenticationRequired(_)
        ));
        assert!(matches!(
            error_for_status(429, Some("7")),
            SourceError::RateLimited {
                retry_after: Some(d)
            } if d == Duration::from_secs(7)
        ));
        assert!(matches!(
            error_for_status(503, None),
            SourceError::Network(_)
        ));
    }

    #[test]
    fn retry_after_parses_seconds_and_http_date() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));

        let future = chrono::Utc::now() + chrono::Duration::seconds(90);
        let parsed = parse_retry_after(&future.to_rfc2822()).unwrap();
        assert!(parsed <= Duration::from_secs(90));
        assert!(parsed >= Duration::from_secs(80));

        assert_eq!(parse_retry_after("not a date"), None);
    }

    #[test]
    fn transient_classification() {
        assert!(SourceError::Timeout.is_transient());
        assert!(SourceError::Network("reset".to_string()).is_transient());
        assert!(!SourceError::NotFound.is_transient());
        assert!(!SourceError::RateLimited { retry_after: None }.is_transient());
        assert!(!SourceError::AuthenticationRequired("key".to_string()).is_transient());
    }
}
