//! Partial, mergeable enrichment facts about one paper.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Open-access availability classes, as reported by OA-aware catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAccessStatus {
    Gold,
    Green,
    Bronze,
    Hybrid,
    Closed,
    Unknown,
}

impl OpenAccessStatus {
    /// Parse a catalog-reported status string (case-insensitive).
    /// Unrecognized values map to `Unknown` rather than failing.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "gold" => Self::Gold,
            "green" => Self::Green,
            "bronze" => Self::Bronze,
            "hybrid" => Self::Hybrid,
            "closed" => Self::Closed,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for OpenAccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gold => "gold",
            Self::Green => "green",
            Self::Bronze => "bronze",
            Self::Hybrid => "hybrid",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// A reference-list or citing-paper entry: just enough to display and to
/// chase the identifier later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperStub {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<u32>,
    pub doi: Option<String>,
}

/// Per-author statistics, as supplied by citation-graph catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStats {
    pub name: String,
    pub h_index: Option<u32>,
    pub citation_count: Option<u64>,
    pub paper_count: Option<u32>,
    pub affiliations: Vec<String>,
}

/// Kinds of enrichment facts a source can supply; declared per source
/// without I/O and used by the orchestrator to skip sources that cannot
/// answer any missing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentCapability {
    CitationCount,
    References,
    Citations,
    Abstract,
    PdfUrl,
    OpenAccessStatus,
    Venue,
    AuthorStats,
}

/// A partial fact sheet about one paper. Every field may be absent;
/// enrichment sources vary widely in coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentData {
    /// Number of papers citing this one
    pub citation_count: Option<u64>,
    /// Number of papers this one cites
    pub reference_count: Option<u64>,
    /// Reference-list stubs
    pub references: Option<Vec<PaperStub>>,
    /// Citing-paper stubs
    pub citations: Option<Vec<PaperStub>>,
    /// Abstract text
    pub abstract_text: Option<String>,
    /// Open-access PDF URLs
    pub oa_pdf_urls: Option<Vec<String>>,
    /// Open-access status
    pub oa_status: Option<OpenAccessStatus>,
    /// Venue name
    pub venue: Option<String>,
    /// Per-author statistics
    pub author_stats: Option<Vec<AuthorStats>>,
    /// Which source produced this sheet
    pub source: Option<String>,
}

impl EnrichmentData {
    /// An empty sheet tagged with its producing source.
    #[must_use]
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// True when no fact field is present (the source tag does not count).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.citation_count.is_none()
            && self.reference_count.is_none()
            && self.references.is_none()
            && self.citations.is_none()
            && self.abstract_text.is_none()
            && self.oa_pdf_urls.is_none()
            && self.oa_status.is_none()
            && self.venue.is_none()
            && self.author_stats.is_none()
    }

    /// True when `capability`'s fact field is present.
    #[must_use]
    pub fn covers(&self, capability: EnrichmentCapability) -> bool {
        match capability {
            EnrichmentCapability::CitationCount => self.citation_count.is_some(),
            EnrichmentCapability::References => self.references.is_some(),
            EnrichmentCapability::Citations => self.citations.is_some(),
            EnrichmentCapability::Abstract => self.abstract_text.is_some(),
            EnrichmentCapability::PdfUrl => self.oa_pdf_urls.is_some(),
            EnrichmentCapability::OpenAccessStatus => self.oa_status.is_some(),
            EnrichmentCapability::Venue => self.venue.is_some(),
            EnrichmentCapability::AuthorStats => self.author_stats.is_some(),
        }
    }

    /// Field-wise merge: for every field, prefer the non-absent value from
    /// `a`; fall back to `b`'s. A right-biased fill, not a union: call with
    /// the newest fetch as `a` so fresh fields are never discarded by stale
    /// data while gaps still backfill.
    #[must_use]
    pub fn merge(a: Self, b: Self) -> Self {
        Self {
            citation_count: a.citation_count.or(b.citation_count),
            reference_count: a.reference_count.or(b.reference_count),
            references: a.references.or(b.references),
            citations: a.citations.or(b.citations),
            abstract_text: a.abstract_text.or(b.abstract_text),
            oa_pdf_urls: a.oa_pdf_urls.or(b.oa_pdf_urls),
            oa_status: a.oa_status.or(b.oa_status),
            venue: a.venue.or(b.venue),
            author_stats: a.author_stats.or(b.author_stats),
            source: a.source.or(b.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_a() -> EnrichmentData {
        EnrichmentData {
            citation_count: Some(42),
            abstract_text: Some("fresh abstract".to_string()),
            source: Some("semantic_scholar".to_string()),
            ..EnrichmentData::default()
        }
    }

    fn sheet_b() -> EnrichmentData {
        EnrichmentData {
            citation_count: Some(7),
            venue: Some("Nature".to_string()),
            oa_status: Some(OpenAccessStatus::Green),
            source: Some("openalex".to_string()),
            ..EnrichmentData::default()
        }
    }

    #[test]
    fn merge_prefers_left_and_backfills_right() {
        let merged = EnrichmentData::merge(sheet_a(), sheet_b());
        assert_eq!(merged.citation_count, Some(42));
        assert_eq!(merged.abstract_text.as_deref(), Some("fresh abstract"));
        assert_eq!(merged.venue.as_deref(), Some("Nature"));
        assert_eq!(merged.oa_status, Some(OpenAccessStatus::Green));
        assert_eq!(merged.source.as_deref(), Some("semantic_scholar"));
    }

    #[test]
    fn merge_never_invents_fields() {
        let merged = EnrichmentData::merge(EnrichmentData::default(), EnrichmentData::default());
        assert!(merged.is_empty());
        assert!(merged.source.is_none());
    }

    #[test]
    fn merge_with_empty_right_is_identity() {
        let merged = EnrichmentData::merge(sheet_a(), EnrichmentData::default());
        assert_eq!(merged, sheet_a());
    }

    #[test]
    fn covers_reflects_presence() {
        let sheet = sheet_b();
        assert!(sheet.covers(EnrichmentCapability::Venue));
        assert!(sheet.covers(EnrichmentCapability::OpenAccessStatus));
        assert!(!sheet.covers(EnrichmentCapability::Abstract));
        assert!(!sheet.covers(EnrichmentCapability::References));
    }

    #[test]
    fn oa_status_parse_is_lenient() {
        assert_eq!(OpenAccessStatus::parse("GOLD"), OpenAccessStatus::Gold);
        assert_eq!(OpenAccessStatus::parse("diamond"), OpenAccessStatus::Unknown);
    }
}
