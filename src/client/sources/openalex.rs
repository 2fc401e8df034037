//! OpenAlex works API integration.
//!
//! OpenAlex stores abstracts as a word -> positions inverted index (a
//! licensing workaround); this module reconstructs the plain text. Also
//! supplies citation counts, open-access status and locations, and the
//! venue. Adding a contact email routes requests through the faster
//! "polite pool".

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
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct WorkResponse {
    #[serde(default)]
    ids: Option<WorkIds>,
    #[serde(default)]
    cited_by_count: Option<u64>,
    #[serde(default)]
    abstract_inverted_index: Option<HashMap<String, Vec<u32>>>,
    #[serde(default)]
    open_access: Option<OpenAccessBlock>,
    #[serde(default)]
    best_oa_location: Option<Location>,
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    primary_location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct WorkIds {
    #[serde(default)]
    openalex: Option<String>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    pmid: Option<String>,
    #[serde(default)]
    pmcid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAccessBlock {
    #[serde(default)]
    oa_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(default)]
    pdf_url: Option<String>,
    #[serde(default)]
    source: Option<LocationSource>,
}

#[derive(Debug, Deserialize)]
struct LocationSource {
    #[serde(default)]
    display_name: Option<String>,
}

/// OpenAlex catalog integration
pub struct OpenAlexSource {
    client: Client,
    limiter: Arc<RateLimiter>,
    credentials: Arc<dyn CredentialStore>,
    base_url: String,
}

impl OpenAlexSource {
    pub fn new(
        client: Client,
        limiter: Arc<RateLimiter>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            limiter,
            credentials,
            base_url: "https://api.openalex.org".to_string(),
        }
    }

    /// Point the source at a different endpoint (tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Rebuild an abstract from OpenAlex's word -> positions inverted index.
    #[must_use]
    pub fn reconstruct_abstract(index: &HashMap<String, Vec<u32>>) -> Option<String> {
        if index.is_empty() {
            return None;
        }
        let mut positioned: Vec<(u32, &str)> = index
            .iter()
            .flat_map(|(word, positions)| positions.iter().map(move |&p| (p, word.as_str())))
            .collect();
        positioned.sort_unstable();
        let words: Vec<&str> = positioned.into_iter().map(|(_, word)| word).collect();
        Some(words.join(" "))
    }

    fn strip_id_url(value: &str) -> String {
        value
            .trim_start_matches("https://openalex.org/")
            .trim_start_matches("https://pubmed.ncbi.nlm.nih.gov/")
            .trim_start_matches("https://www.ncbi.nlm.nih.gov/pmc/articles/")
            .trim_start_matches("https://doi.org/")
            .trim_end_matches('/')
            .to_string()
    }
}

#[async_trait]
impl EnrichmentSource for OpenAlexSource {
    fn name(&self) -> &str {
        "openalex"
    }

    fn description(&self) -> &str {
        "OpenAlex - open catalog of scholarly works, authors, and venues"
    }

    fn capabilities(&self) -> Vec<EnrichmentCapability> {
        vec![
            EnrichmentCapability::CitationCount,
            EnrichmentCapability::Abstract,
            EnrichmentCapability::PdfUrl,
            EnrichmentCapability::OpenAccessStatus,
            EnrichmentCapability::Venue,
        ]
    }

    fn resolve_query(&self, ids: &IdentifierSet) -> Option<String> {
        if let Some(work_id) = ids.get(IdentifierKind::OpenAlex) {
            return Some(Self::strip_id_url(work_id));
        }
        if let Some(doi) = ids.normalized(IdentifierKind::Doi) {
            return Some(format!("https://doi.org/{doi}"));
        }
        if let Some(pmid) = ids.get(IdentifierKind::Pubmed) {
            return Some(format!("pmid:{pmid}"));
        }
        None
    }

    async fn enrich(
        &self,
        ids: &IdentifierSet,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentOutcome, SourceError> {
        let key = self.resolve_query(ids).ok_or(SourceError::NoIdentifier)?;

        self.limiter.wait_if_needed().await;

        let mut url = format!("{}/works/{}", self.base_url, key);
        if let Some(email) = self.credentials.email(self.name()) {
            url = format!("{url}?mailto={}", urlencoding::encode(&email));
        }
        debug!(%url, "querying openalex");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let body = read_success_body(response).await?;

        let work: WorkResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("failed to parse JSON: {e}")))?;

        let mut data = EnrichmentData::from_source(self.name());
        data.citation_count = work.cited_by_count;
        data.abstract_text = work
            .abstract_inverted_index
            .as_ref()
            .and_then(Self::reconstruct_abstract);
        data.oa_status = work
            .open_access
            .as_ref()
            .and_then(|oa| oa.oa_status.as_deref())
            .map(OpenAccessStatus::parse);

        // Best location first, then every other location with a PDF.
        let mut pdf_urls: Vec<String> = Vec::new();
        if let Some(url) = work.best_oa_location.as_ref().and_then(|l| l.pdf_url.clone()) {
            pdf_urls.push(url);
        }
        for location in &work.locations {
            if let Some(url) = &location.pdf_url {
                if !pdf_urls.contains(url) {
                    pdf_urls.push(url.clone());
                }
            }
        }
        if !pdf_urls.is_empty() {
            data.oa_pdf_urls = Some(pdf_urls);
        }

        data.venue = work
            .primary_location
            .and_then(|l| l.source)
            .and_then(|s| s.display_name);

        let mut resolved = IdentifierSet::new();
        if let Some(ids) = work.ids {
            if let Some(openalex) = ids.openalex {
                resolved.insert(IdentifierKind::OpenAlex, Self::strip_id_url(&openalex));
            }
            if let Some(doi) = ids.doi {
                resolved.insert(IdentifierKind::Doi, Self::strip_id_url(&doi));
            }
            if let Some(pmid) = ids.pmid {
                resolved.insert(IdentifierKind::Pubmed, Self::strip_id_url(&pmid));
            }
            if let Some(pmcid) = ids.pmcid {
                resolved.insert(IdentifierKind::PubmedCentral, Self::strip_id_url(&pmcid));
            }
        }

        info!(
            citations = data.citation_count.unwrap_or(0),
            oa_status = %data.oa_status.map(|s| s.to_string()).unwrap_or_default(),
            "openalex enrichment complete"
        );

        let data = match existing {
            Some(existing) => EnrichmentData::merge(data, existing.clone()),
            None => data,
        };

        Ok(EnrichmentOutcome { data, resolved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RateBudget;
    use crate::credentials::NoCredentials;
    use std::time::Duration;

    fn source() -> OpenAlexSource {
        OpenAlexSource::new(
            Client::new(),
            Arc::new(RateLimiter::new(RateBudget::new(100, Duration::from_secs(1)))),
            Arc::new(NoCredentials),
        )
    }

    #[test]
    fn abstract_reconstruction_orders_by_position() {
        let mut index = HashMap::new();
        index.insert("networks".to_string(), vec![3]);
        index.insert("neural".to_string(), vec![2]);
        index.insert("deep".to_string(), vec![0, 4]);
        index.insert("learning".to_string(), vec![1]);

        assert_eq!(
            OpenAlexSource::reconstruct_abstract(&index).as_deref(),
            Some("deep learning neural networks deep")
        );
        assert_eq!(OpenAlexSource::reconstruct_abstract(&HashMap::new()), None);
    }

    #[test]
    fn resolve_prefers_native_work_id() {
        let mut ids = IdentifierSet::new();
        ids.insert(IdentifierKind::OpenAlex, "https://openalex.org/W2741809807");
        ids.insert(IdentifierKind::Doi, "10.1/x");
        assert_eq!(source().resolve_query(&ids).as_deref(), Some("W2741809807"));
    }

    #[test]
    fn resolve_falls_back_to_doi_url() {
        let mut ids = IdentifierSet::new();
        ids.insert(IdentifierKind::Doi, "10.7717/PEERJ.4375");
        assert_eq!(
            source().resolve_query(&ids).as_deref(),
            Some("https://doi.org/10.7717/peerj.4375")
        );
    }
}
