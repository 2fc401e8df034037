//! Crossref works API integration.
//!
//! The publisher-registered record of a DOI: cited-by count, the deposited
//! reference list, and the container title. Abstracts arrive as JATS XML
//! fragments and are stripped to plain text. A contact email in the
//! User-Agent routes requests into Crossref's polite pool.

use super::traits::{
    read_success_body, transport_error, EnrichmentOutcome, EnrichmentSource, SourceError,
};
use crate::client::RateLimiter;
use crate::credentials::CredentialStore;
use crate::identifier::{IdentifierKind, IdentifierSet};
use crate::model::{EnrichmentCapability, EnrichmentData, PaperStub};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::LazyLock;
use tracing::{debug, info};

static JATS_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Deserialize)]
struct WorksEnvelope {
    message: WorkMessage,
}

#[derive(Debug, Deserialize)]
struct WorkMessage {
    #[serde(rename = "is-referenced-by-count", default)]
    is_referenced_by_count: Option<u64>,
    #[serde(rename = "references-count", default)]
    references_count: Option<u64>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(rename = "abstract", default)]
    abstract_jats: Option<String>,
    #[serde(default)]
    reference: Vec<ReferenceEntry>,
}

#[derive(Debug, Deserialize)]
struct ReferenceEntry {
    #[serde(rename = "article-title", default)]
    article_title: Option<String>,
    #[serde(default)]
    unstructured: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(rename = "DOI", default)]
    doi: Option<String>,
}

/// Crossref catalog integration
pub struct CrossrefSource {
    client: Client,
    limiter: Arc<RateLimiter>,
    credentials: Arc<dyn CredentialStore>,
    base_url: String,
    reference_limit: usize,
}

impl CrossrefSource {
    pub fn new(
        client: Client,
        limiter: Arc<RateLimiter>,
        credentials: Arc<dyn CredentialStore>,
        reference_limit: usize,
    ) -> Self {
        Self {
            client,
            limiter,
            credentials,
            base_url: "https://api.crossref.org".to_string(),
            reference_limit,
        }
    }

    /// Point the source at a different endpoint (tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Strip a JATS XML abstract fragment down to plain text.
    #[must_use]
    pub fn strip_jats(raw: &str) -> String {
        let stripped = JATS_TAG.replace_all(raw, " ");
        WHITESPACE_RUN.replace_all(stripped.trim(), " ").into_owned()
    }

    fn stub_from(entry: ReferenceEntry) -> Option<PaperStub> {
        let title = entry.article_title.or(entry.unstructured)?;
        Some(PaperStub {
            title,
            authors: entry.author.into_iter().collect(),
            year: entry.year.and_then(|y| y.parse().ok()),
            doi: entry.doi,
        })
    }
}

#[async_trait]
impl EnrichmentSource for CrossrefSource {
    fn name(&self) -> &str {
        "crossref"
    }

    fn description(&self) -> &str {
        "Crossref - publisher-registered DOI metadata and reference lists"
    }

    fn capabilities(&self) -> Vec<EnrichmentCapability> {
        vec![
            EnrichmentCapability::CitationCount,
            EnrichmentCapability::References,
            EnrichmentCapability::Abstract,
            EnrichmentCapability::Venue,
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

        self.limiter.wait_if_needed().await;

        let mut url = format!("{}/works/{}", self.base_url, urlencoding::encode(&doi));
        if let Some(email) = self.credentials.email(self.name()) {
            url = format!("{url}?mailto={}", urlencoding::encode(&email));
        }
        debug!(%url, "querying crossref");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let body = read_success_body(response).await?;

        let envelope: WorksEnvelope = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("failed to parse JSON: {e}")))?;
        let work = envelope.message;

        let mut data = EnrichmentData::from_source(self.name());
        data.citation_count = work.is_referenced_by_count;
        data.reference_count = work.references_count;
        data.venue = work.container_title.into_iter().next().filter(|v| !v.is_empty());
        data.abstract_text = work
            .abstract_jats
            .map(|raw| Self::strip_jats(&raw))
            .filter(|text| !text.is_empty());

        let references: Vec<PaperStub> = work
            .reference
            .into_iter()
            .take(self.reference_limit)
            .filter_map(Self::stub_from)
            .collect();
        if !references.is_empty() {
            data.references = Some(references);
        }

        info!(
            citations = data.citation_count.unwrap_or(0),
            references = data.references.as_ref().map_or(0, Vec::len),
            "crossref enrichment complete"
        );

        let data = match existing {
            Some(existing) => EnrichmentData::merge(data, existing.clone()),
            None => data,
        };

        // Crossref reports no identifiers beyond the DOI it was asked about.
        Ok(EnrichmentOutcome {
            data,
            resolved: IdentifierSet::new(),
        })
    }
}
