//! arXiv API integration.
//!
//! Preprint lookup over the Atom export API. Supplies the abstract and the
//! free PDF link, and resolves a DOI when the feed carries one (set once a
//! preprint is published).

use super::traits::{
    error_for_status, transport_error, EnrichmentOutcome, EnrichmentSource, SourceError,
};
use crate::client::RateLimiter;
use crate::identifier::{IdentifierKind, IdentifierSet};
use crate::model::{EnrichmentCapability, EnrichmentData};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// arXiv catalog integration
pub struct ArxivSource {
    client: Client,
    limiter: Arc<RateLimiter>,
    base_url: String,
}

#[derive(Debug)]
struct ParsedEntry {
    abstract_text: Option<String>,
    pdf_url: Option<String>,
    doi: Option<String>,
    arxiv_id: Option<String>,
}

impl ArxivSource {
    pub fn new(client: Client, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client,
            limiter,
            base_url: "http://export.arxiv.org".to_string(),
        }
    }

    /// Point the source at a different endpoint (tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parse the first entry of an arXiv Atom feed.
    fn parse_response(response_text: &str) -> Result<Option<ParsedEntry>, SourceError> {
        use roxmltree::Document;

        let doc = Document::parse(response_text)
            .map_err(|e| SourceError::Parse(format!("failed to parse XML: {e}")))?;

        let Some(entry) = doc.descendants().find(|n| n.has_tag_name("entry")) else {
            return Ok(None);
        };

        let mut parsed = ParsedEntry {
            abstract_text: None,
            pdf_url: None,
            doi: None,
            arxiv_id: None,
        };

        for child in entry.children().filter(roxmltree::Node::is_element) {
            match child.tag_name().name() {
                "id" => {
                    if let Some(id) = child.text() {
                        // The entry id is a URL ending in the arXiv id.
                        if let Some(arxiv_id) = id.rsplit('/').next() {
                            parsed.arxiv_id = Some(arxiv_id.to_string());
                        }
                    }
                }
                "summary" => {
                    if let Some(summary) = child.text() {
                        parsed.abstract_text =
                            Some(summary.trim().replace('\n', " ").replace("  ", " "));
                    }
                }
                "doi" => {
                    if let Some(doi) = child.text() {
                        parsed.doi = Some(doi.trim().to_string());
                    }
                }
                "link" => {
                    if let (Some(href), Some("application/pdf")) =
                        (child.attribute("href"), child.attribute("type"))
                    {
                        parsed.pdf_url = Some(href.to_string());
                    }
                }
                _ => {}
            }
        }

        Ok(Some(parsed))
    }
}

#[async_trait]
impl EnrichmentSource for ArxivSource {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn description(&self) -> &str {
        "arXiv.org - open access e-prints in physics, mathematics, computer science, and more"
    }

    fn capabilities(&self) -> Vec<EnrichmentCapability> {
        vec![EnrichmentCapability::Abstract, EnrichmentCapability::PdfUrl]
    }

    fn resolve_query(&self, ids: &IdentifierSet) -> Option<String> {
        ids.normalized(IdentifierKind::Arxiv)
    }

    async fn enrich(
        &self,
        ids: &IdentifierSet,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentOutcome, SourceError> {
        let arxiv_id = self.resolve_query(ids).ok_or(SourceError::NoIdentifier)?;

        self.limiter.wait_if_needed().await;

        let mut url = Url::parse(&self.base_url)
            .and_then(|base| base.join("/api/query"))
            .map_err(|e| SourceError::Parse(format!("invalid base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("id_list", &arxiv_id)
            .append_pair("max_results", "1");
        debug!(%url, "querying arxiv");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), None));
        }
        let response_text = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("failed to read response: {e}")))?;

        let entry = Self::parse_response(&response_text)?.ok_or(SourceError::NotFound)?;

        let mut data = EnrichmentData::from_source(self.name());
        data.abstract_text = entry.abstract_text;
        data.oa_pdf_urls = entry.pdf_url.map(|url| vec![url]);

        let mut resolved = IdentifierSet::new();
        if let Some(doi) = entry.doi {
            resolved.insert(IdentifierKind::Doi, doi);
        }
        if let Some(id) = entry.arxiv_id {
            resolved.insert(IdentifierKind::Arxiv, id);
        }

        info!(
            has_abstract = data.abstract_text.is_some(),
            has_pdf = data.oa_pdf_urls.is_some(),
            "arxiv enrichment complete"
        );

        let data = match existing {
            Some(existing) => EnrichmentData::merge(data, existing.clone()),
            None => data,
        };

        Ok(EnrichmentOutcome { data, resolved })
    }
}
