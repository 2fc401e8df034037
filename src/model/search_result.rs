//! One catalog's view of a paper, and the merged multi-catalog view.

use crate::identifier::IdentifierSet;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A single catalog's report of one paper.
///
/// Immutable once constructed. Equality and hashing consider only the
/// `(id, source_id)` pair: two results from different sources are never
/// equal even when they describe the same work; deciding that is the
/// deduplication engine's job, not the type's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Opaque per-source result id
    pub id: String,
    /// Source that produced this result (e.g. `"crossref"`)
    pub source_id: String,
    /// Paper title
    pub title: String,
    /// Author display strings, in the catalog's order
    pub authors: Vec<String>,
    /// Publication year
    pub year: Option<u32>,
    /// Venue (journal, conference, repository)
    pub venue: Option<String>,
    /// Abstract
    pub abstract_text: Option<String>,
    /// Identifiers this catalog knows for the paper
    pub identifiers: IdentifierSet,
    /// Remote PDF URL
    pub pdf_url: Option<String>,
    /// Landing page URL
    pub web_url: Option<String>,
    /// Machine-readable citation export URL (e.g. BibTeX endpoint)
    pub citation_export_url: Option<String>,
}

impl SearchResult {
    /// Create a result with the mandatory fields; the rest default to absent.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            title: title.into(),
            authors: Vec::new(),
            year: None,
            venue: None,
            abstract_text: None,
            identifiers: IdentifierSet::new(),
            pdf_url: None,
            web_url: None,
            citation_export_url: None,
        }
    }

    /// The `(id, source_id)` identity pair
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.id, &self.source_id)
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SearchResult {}

impl Hash for SearchResult {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.source_id.hash(state);
    }
}

/// A group of [`SearchResult`]s believed to describe the same work.
///
/// `primary` is the canonical display record; `alternates` holds the other
/// sources' records in the order they were supplied. The unified
/// `identifiers` mapping is the union of all members', with the primary's
/// values winning conflicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeduplicatedResult {
    pub primary: SearchResult,
    pub alternates: Vec<SearchResult>,
    pub identifiers: IdentifierSet,
}

impl DeduplicatedResult {
    /// Wrap a single result with no alternates.
    #[must_use]
    pub fn single(primary: SearchResult) -> Self {
        let identifiers = primary.identifiers.clone();
        Self {
            primary,
            alternates: Vec::new(),
            identifiers,
        }
    }

    /// Build a group from a primary and its alternates, computing the
    /// unified identifier mapping.
    #[must_use]
    pub fn new(primary: SearchResult, alternates: Vec<SearchResult>) -> Self {
        let mut identifiers = primary.identifiers.clone();
        for alternate in &alternates {
            identifiers.merge_missing(&alternate.identifiers);
        }
        Self {
            primary,
            alternates,
            identifiers,
        }
    }

    /// All member results, primary first
    pub fn members(&self) -> impl Iterator<Item = &SearchResult> {
        std::iter::once(&self.primary).chain(self.alternates.iter())
    }

    /// Best available PDF URL: primary's, else the first alternate's.
    #[must_use]
    pub fn best_pdf_url(&self) -> Option<&str> {
        self.members().find_map(|r| r.pdf_url.as_deref())
    }

    /// Best available citation-export URL: primary's, else the first
    /// alternate's.
    #[must_use]
    pub fn best_citation_export_url(&self) -> Option<&str> {
        self.members().find_map(|r| r.citation_export_url.as_deref())
    }
}
