//! NASA ADS (SciX) search API integration.
//!
//! The astronomy/physics bibliographic index, keyed by bibcode. Every
//! request needs a bearer token; a missing key surfaces as
//! authentication-required. Besides citation counts and abstracts, ADS is
//! the one source that resolves a bibcode for works found elsewhere.

use super::traits::{
    read_success_body, transport_error, EnrichmentOutcome, EnrichmentSource, SourceError,
};
use crate::client::RateLimiter;
use crate::credentials::CredentialStore;
use crate::identifier::{IdentifierKind, IdentifierSet};
use crate::model::{EnrichmentCapability, EnrichmentData};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<AdsDoc>,
}

#[derive(Debug, Deserialize)]
struct AdsDoc {
    #[serde(default)]
    bibcode: Option<String>,
    #[serde(default)]
    citation_count: Option<u64>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    #[serde(rename = "pub", default)]
    publication: Option<String>,
}

/// NASA ADS catalog integration
pub struct AdsSource {
    client: Client,
    limiter: Arc<RateLimiter>,
    credentials: Arc<dyn CredentialStore>,
    base_url: String,
}

impl AdsSource {
    pub fn new(
        client: Client,
        limiter: Arc<RateLimiter>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            limiter,
            credentials,
            base_url: "https://api.adsabs.harvard.edu".to_string(),
        }
    }

    /// Point the source at a different endpoint (tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl EnrichmentSource for AdsSource {
    fn name(&self) -> &str {
        "adsabs"
    }

    fn description(&self) -> &str {
        "NASA ADS - astronomy and physics bibliographic index"
    }

    fn capabilities(&self) -> Vec<EnrichmentCapability> {
        vec![
            EnrichmentCapability::CitationCount,
            EnrichmentCapability::Abstract,
            EnrichmentCapability::Venue,
        ]
    }

    fn resolve_query(&self, ids: &IdentifierSet) -> Option<String> {
        // identifier: matches bibcodes, DOIs, and arXiv ids alike.
        if let Some(bibcode) = ids.get(IdentifierKind::Bibcode) {
            return Some(format!("identifier:\"{bibcode}\""));
        }
        if let Some(doi) = ids.normalized(IdentifierKind::Doi) {
            return Some(format!("identifier:\"{doi}\""));
        }
        if let Some(arxiv) = ids.normalized(IdentifierKind::Arxiv) {
            return Some(format!("identifier:\"arXiv:{arxiv}\""));
        }
        None
    }

    async fn enrich(
        &self,
        ids: &IdentifierSet,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentOutcome, SourceError> {
        let query = self.resolve_query(ids).ok_or(SourceError::NoIdentifier)?;

        let api_key = self.credentials.api_key(self.name()).ok_or_else(|| {
            SourceError::AuthenticationRequired("ADS requires an API token".to_string())
        })?;

        self.limiter.wait_if_needed().await;

        let url = format!(
            "{}/v1/search/query?q={}&fl=bibcode,citation_count,abstract,pub&rows=1",
            self.base_url,
            urlencoding::encode(&query)
        );
        debug!(%url, "querying adsabs");

        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let body = read_success_body(response).await?;

        let envelope: SearchEnvelope = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("failed to parse JSON: {e}")))?;

        if envelope.response.num_found == 0 {
            return Err(SourceError::NotFound);
        }
        let doc = envelope
            .response
            .docs
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::Parse("numFound > 0 but docs empty".to_string()))?;

        let mut data = EnrichmentData::from_source(self.name());
        data.citation_count = doc.citation_count;
        data.abstract_text = doc.abstract_text;
        data.venue = doc.publication;

        let mut resolved = IdentifierSet::new();
        if let Some(bibcode) = doc.bibcode {
            resolved.insert(IdentifierKind::Bibcode, bibcode);
        }

        info!(
            citations = data.citation_count.unwrap_or(0),
            "adsabs enrichment complete"
        );

        let data = match existing {
            Some(existing) => EnrichmentData::merge(data, existing.clone()),
            None => data,
        };

        Ok(EnrichmentOutcome { data, resolved })
    }
}
