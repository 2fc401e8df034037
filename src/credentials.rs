//! Credential collaborator interface.
//!
//! Actual credential storage lives outside the core; sources receive a
//! [`CredentialStore`] handle at construction and query it per request, so
//! key rotation takes effect without rebuilding sources.

use std::collections::HashMap;

/// Supplies per-source credentials. Some catalogs want an API key; others
/// accept an email address for a "polite" access tier instead.
pub trait CredentialStore: Send + Sync {
    /// API key for a source id, if one is configured
    fn api_key(&self, source_id: &str) -> Option<String>;

    /// Contact email for a source id's polite tier, if one is configured
    fn email(&self, source_id: &str) -> Option<String>;
}

/// Map-backed credential store for hosts that hold credentials in memory
/// (and for tests).
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    api_keys: HashMap<String, String>,
    emails: HashMap<String, String>,
}

impl StaticCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_api_key(mut self, source_id: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(source_id.into(), key.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, source_id: impl Into<String>, email: impl Into<String>) -> Self {
        self.emails.insert(source_id.into(), email.into());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn api_key(&self, source_id: &str) -> Option<String> {
        self.api_keys.get(source_id).cloned()
    }

    fn email(&self, source_id: &str) -> Option<String> {
        self.emails.get(source_id).cloned()
    }
}

/// A store with no credentials at all. Sources that require a credential
/// will report authentication-required.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn api_key(&self, _source_id: &str) -> Option<String> {
        None
    }

    fn email(&self, _source_id: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_store_returns_configured_values() {
        let store = StaticCredentials::new()
            .with_api_key("adsabs", "key-123")
            .with_email("unpaywall", "lab@example.org");

        assert_eq!(store.api_key("adsabs").as_deref(), Some("key-123"));
        assert_eq!(store.email("unpaywall").as_deref(), Some("lab@example.org"));
        assert!(store.api_key("unpaywall").is_none());
        assert!(store.email("adsabs").is_none());
    }

    #[test]
    fn no_credentials_returns_nothing() {
        assert!(NoCredentials.api_key("any").is_none());
        assert!(NoCredentials.email("any").is_none());
    }
}
