//! Unpaywall open-access lookup.
//!
//! DOI-keyed open-access status and every known OA location. The API has no
//! key tier at all: a contact email is mandatory on every request, so a
//! missing email surfaces as authentication-required rather than a network
//! failure.

use super::traits::{
    read_success_body, transport_error, EnrichmentOutcome, EnrichmentSource, SourceError,
};
use crate::client::RateLimiter;
use crate::credentials::CredentialStore;
use crate::identifier::{IdentifierKind, IdentifierSet};
use crate::model::{EnrichmentCapability, EnrichmentData, OpenAccessStatus};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct UnpaywallResponse {
    #[serde(default)]
    oa_status: Option<String>,
    #[serde(default)]
    best_oa_location: Option<OaLocation>,
    #[serde(default)]
    oa_locations: Vec<OaLocation>,
}

#[derive(Debug, Deserialize)]
struct OaLocation {
    #[serde(default)]
    url_for_pdf: Option<String>,
}

/// Unpaywall open-access catalog integration
pub struct UnpaywallSource {
    client: Client,
    limiter: Arc<RateLimiter>,
    credentials: Arc<dyn CredentialStore>,
    base_url: String,
}

impl UnpaywallSource {
    pub fn new(
        client: Client,
        limiter: Arc<RateLimiter>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            limiter,
            credentials,
            base_url: "https://api.unpaywall.org".to_string(),
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
impl EnrichmentSource for UnpaywallSource {
    fn name(&self) -> &str {
        "unpaywall"
    }

    fn description(&self) -> &str {
        "Unpaywall - open-access availability for DOI-registered works"
    }

    fn capabilities(&self) -> Vec<EnrichmentCapability> {
        vec![
            EnrichmentCapability::OpenAccessStatus,
            EnrichmentCapability::PdfUrl,
        ]
    }

    fn resolve_query(&self, ids: &IdentifierSet) -> Option<String> {
        ids.normalized(IdentifierKind::Doi)
    }

    async fn enrich(
        &self,
        ids: &IdentifierSet,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentOutcome, SourceError> {
        let doi = self.resolve_query(ids).ok_or(SourceError::NoIdentifier)?;

        let email = self.credentials.email(self.name()).ok_or_else(|| {
            SourceError::AuthenticationRequired(
                "unpaywall requires a contact email".to_string(),
            )
        })?;

        self.limiter.wait_if_needed().await;

        let url = format!(
            "{}/v2/{}?email={}",
            self.base_url,
            urlencoding::encode(&doi),
            urlencoding::encode(&email)
        );
        debug!(%url, "querying unpaywall");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let body = read_success_body(response).await?;

        let record: UnpaywallResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("failed to parse JSON: {e}")))?;

        let mut data = EnrichmentData::from_source(self.name());
        data.oa_status = record.oa_status.as_deref().map(OpenAccessStatus::parse);

        let mut pdf_urls: Vec<String> = Vec::new();
        if let Some(url) = record.best_oa_location.and_then(|l| l.url_for_pdf) {
            pdf_urls.push(url);
        }
        for location in record.oa_locations {
            if let Some(url) = location.url_for_pdf {
                if !pdf_urls.contains(&url) {
                    pdf_urls.push(url);
                }
            }
        }
        if !pdf_urls.is_empty() {
            data.oa_pdf_urls = Some(pdf_urls);
        }

        info!(
            oa_status = %data.oa_status.map(|s| s.to_string()).unwrap_or_default(),
            locations = data.oa_pdf_urls.as_ref().map_or(0, Vec::len),
            "unpaywall enrichment complete"
        );

        let data = match existing {
            Some(existing) => EnrichmentData::merge(data, existing.clone()),
            None => data,
        };

        Ok(EnrichmentOutcome {
            data,
            resolved: IdentifierSet::new(),
        })
    }
}
