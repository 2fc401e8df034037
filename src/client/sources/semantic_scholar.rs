//! Semantic Scholar Graph API integration.
//!
//! The broadest single source: citation and reference counts, embedded
//! reference and citing-paper lists, abstract, venue, open-access PDF, and
//! per-author statistics. Works without a key at the public tier; an API
//! key (sent as `x-api-key`) unlocks higher limits.

use super::traits::{
    read_success_body, transport_error, EnrichmentOutcome, EnrichmentSource, SourceError,
};
use crate::client::RateLimiter;
use crate::credentials::CredentialStore;
use crate::identifier::{IdentifierKind, IdentifierSet};
use crate::model::{AuthorStats, EnrichmentCapability, EnrichmentData, PaperStub};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

const PAPER_FIELDS: &str = "title,abstract,venue,year,citationCount,referenceCount,externalIds,\
openAccessPdf,references.title,references.year,references.authors,references.externalIds,\
citations.title,citations.year,citations.authors,citations.externalIds,\
authors.name,authors.hIndex,authors.citationCount,authors.paperCount,authors.affiliations";

#[derive(Debug, Deserialize)]
struct PaperResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    #[serde(default)]
    venue: Option<String>,
    #[serde(rename = "citationCount", default)]
    citation_count: Option<u64>,
    #[serde(rename = "referenceCount", default)]
    reference_count: Option<u64>,
    #[serde(rename = "externalIds", default)]
    external_ids: Option<ExternalIds>,
    #[serde(rename = "openAccessPdf", default)]
    open_access_pdf: Option<OpenAccessPdf>,
    #[serde(default)]
    references: Vec<LinkedPaper>,
    #[serde(default)]
    citations: Vec<LinkedPaper>,
    #[serde(default)]
    authors: Vec<AuthorEntry>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(rename = "DOI", default)]
    doi: Option<String>,
    #[serde(rename = "ArXiv", default)]
    arxiv: Option<String>,
    #[serde(rename = "PubMed", default)]
    pubmed: Option<String>,
    #[serde(rename = "PubMedCentral", default)]
    pubmed_central: Option<String>,
    #[serde(rename = "DBLP", default)]
    dblp: Option<String>,
    #[serde(rename = "CorpusId", default)]
    corpus_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OpenAccessPdf {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkedPaper {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    authors: Vec<AuthorEntry>,
    #[serde(rename = "externalIds", default)]
    external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
struct AuthorEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "hIndex", default)]
    h_index: Option<u32>,
    #[serde(rename = "citationCount", default)]
    citation_count: Option<u64>,
    #[serde(rename = "paperCount", default)]
    paper_count: Option<u32>,
    #[serde(default)]
    affiliations: Vec<String>,
}

/// Semantic Scholar catalog integration
pub struct SemanticScholarSource {
    client: Client,
    limiter: Arc<RateLimiter>,
    credentials: Arc<dyn CredentialStore>,
    base_url: String,
    reference_limit: usize,
}

impl SemanticScholarSource {
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
            base_url: "https://api.semanticscholar.org".to_string(),
            reference_limit,
        }
    }

    /// Point the source at a different endpoint (tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn stub_from(&self, linked: LinkedPaper) -> Option<PaperStub> {
        let title = linked.title?;
        Some(PaperStub {
            title,
            authors: linked
                .authors
                .into_iter()
                .filter_map(|a| a.name)
                .collect(),
            year: linked.year,
            doi: linked.external_ids.and_then(|ids| ids.doi),
        })
    }

    fn resolved_from(external_ids: Option<ExternalIds>) -> IdentifierSet {
        let mut resolved = IdentifierSet::new();
        let Some(ids) = external_ids else {
            return resolved;
        };
        if let Some(doi) = ids.doi {
            resolved.insert(IdentifierKind::Doi, doi);
        }
        if let Some(arxiv) = ids.arxiv {
            resolved.insert(IdentifierKind::Arxiv, arxiv);
        }
        if let Some(pmid) = ids.pubmed {
            resolved.insert(IdentifierKind::Pubmed, pmid);
        }
        if let Some(pmcid) = ids.pubmed_central {
            resolved.insert(IdentifierKind::PubmedCentral, pmcid);
        }
        if let Some(dblp) = ids.dblp {
            resolved.insert(IdentifierKind::Dblp, dblp);
        }
        // CorpusId comes back as a bare number.
        if let Some(corpus) = ids.corpus_id {
            let value = match corpus {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                _ => String::new(),
            };
            resolved.insert(IdentifierKind::SemanticScholar, value);
        }
        resolved
    }
}

#[async_trait]
impl EnrichmentSource for SemanticScholarSource {
    fn name(&self) -> &str {
        "semantic_scholar"
    }

    fn description(&self) -> &str {
        "Semantic Scholar - AI-curated citation graph across all fields"
    }

    fn capabilities(&self) -> Vec<EnrichmentCapability> {
        vec![
            EnrichmentCapability::CitationCount,
            EnrichmentCapability::References,
            EnrichmentCapability::Citations,
            EnrichmentCapability::Abstract,
            EnrichmentCapability::PdfUrl,
            EnrichmentCapability::Venue,
            EnrichmentCapability::AuthorStats,
        ]
    }

    fn resolve_query(&self, ids: &IdentifierSet) -> Option<String> {
        // The catalog's own id is the most direct route; otherwise any of
        // the prefixed lookup keys the Graph API accepts.
        if let Some(corpus) = ids.get(IdentifierKind::SemanticScholar) {
            return Some(format!("CorpusId:{corpus}"));
        }
        if let Some(doi) = ids.normalized(IdentifierKind::Doi) {
            return Some(format!("DOI:{doi}"));
        }
        if let Some(arxiv) = ids.normalized(IdentifierKind::Arxiv) {
            return Some(format!("ARXIV:{arxiv}"));
        }
        if let Some(pmid) = ids.get(IdentifierKind::Pubmed) {
            return Some(format!("PMID:{pmid}"));
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

        let url = format!(
            "{}/graph/v1/paper/{}?fields={}",
            self.base_url,
            urlencoding::encode(&key),
            PAPER_FIELDS
        );
        debug!(%url, "querying semantic scholar");

        let mut request = self.client.get(&url);
        if let Some(api_key) = self.credentials.api_key(self.name()) {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let body = read_success_body(response).await?;

        let paper: PaperResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("failed to parse JSON: {e}")))?;

        let mut data = EnrichmentData::from_source(self.name());
        data.citation_count = paper.citation_count;
        data.reference_count = paper.reference_count;
        data.abstract_text = paper.abstract_text;
        data.venue = paper.venue.filter(|v| !v.is_empty());
        data.oa_pdf_urls = paper
            .open_access_pdf
            .and_then(|pdf| pdf.url)
            .map(|url| vec![url]);

        // Embedded lists are capped; counts still report the full totals.
        let references: Vec<PaperStub> = paper
            .references
            .into_iter()
            .take(self.reference_limit)
            .filter_map(|linked| self.stub_from(linked))
            .collect();
        if !references.is_empty() {
            data.references = Some(references);
        }
        let citations: Vec<PaperStub> = paper
            .citations
            .into_iter()
            .take(self.reference_limit)
            .filter_map(|linked| self.stub_from(linked))
            .collect();
        if !citations.is_empty() {
            data.citations = Some(citations);
        }

        let author_stats: Vec<AuthorStats> = paper
            .authors
            .into_iter()
            .filter_map(|author| {
                author.name.map(|name| AuthorStats {
                    name,
                    h_index: author.h_index,
                    citation_count: author.citation_count,
                    paper_count: author.paper_count,
                    affiliations: author.affiliations,
                })
            })
            .collect();
        if !author_stats.is_empty() {
            data.author_stats = Some(author_stats);
        }

        let resolved = Self::resolved_from(paper.external_ids);

        info!(
            title = paper.title.as_deref().unwrap_or("<untitled>"),
            citations = data.citation_count.unwrap_or(0),
            "semantic scholar enrichment complete"
        );

        let data = match existing {
            Some(existing) => EnrichmentData::merge(data, existing.clone()),
            None => data,
        };

        Ok(EnrichmentOutcome { data, resolved })
    }
}
