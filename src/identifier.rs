//! Publication identifier model and normalization.
//!
//! Catalogs report the same work under different key spaces (DOI, arXiv id,
//! PubMed id, bibcode, catalog-native ids). This module makes those values
//! comparable: each kind has a normalization rule, and extraction from a
//! bibliographic field map follows a per-kind priority list of historically
//! used field names. Absence is never an error: a missing field simply
//! yields no identifier of that kind.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static ARXIV_VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"v\d+$").unwrap());

/// Closed set of identifier kinds the aggregator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Digital Object Identifier
    Doi,
    /// arXiv e-print identifier
    Arxiv,
    /// PubMed identifier
    Pubmed,
    /// PubMed Central identifier
    PubmedCentral,
    /// ADS bibcode
    Bibcode,
    /// Semantic Scholar corpus identifier
    SemanticScholar,
    /// OpenAlex work identifier
    OpenAlex,
    /// DBLP record key
    Dblp,
}

impl IdentifierKind {
    /// All kinds, in the order identifier-exact grouping considers them.
    pub const ALL: [Self; 8] = [
        Self::Doi,
        Self::Arxiv,
        Self::Pubmed,
        Self::PubmedCentral,
        Self::Bibcode,
        Self::SemanticScholar,
        Self::OpenAlex,
        Self::Dblp,
    ];

    /// Field names this kind may appear under in a bibliographic field set,
    /// in decreasing priority. The first present field wins.
    #[must_use]
    pub const fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Doi => &["doi"],
            // "eprint" predates the dedicated arXiv field and is still the
            // most common carrier in BibTeX exports.
            Self::Arxiv => &["arxivid", "eprint", "arxiv"],
            Self::Pubmed => &["pmid", "pubmed"],
            Self::PubmedCentral => &["pmcid", "pmc"],
            Self::Bibcode => &["bibcode", "adsbibcode"],
            Self::SemanticScholar => &["corpusid", "s2id"],
            Self::OpenAlex => &["openalex"],
            Self::Dblp => &["dblp", "biburl"],
        }
    }

    /// Normalize a raw value of this kind into its comparable form.
    ///
    /// arXiv ids lose any `arXiv:` prefix and trailing version suffix and are
    /// lowercased. DOIs lose common URL/scheme prefixes and compare
    /// case-insensitively. PMC ids compare uppercase. Bibcodes and
    /// catalog-native ids compare as exact strings.
    #[must_use]
    pub fn normalize(self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self {
            Self::Doi => {
                let stripped = trimmed
                    .trim_start_matches("https://doi.org/")
                    .trim_start_matches("http://doi.org/")
                    .trim_start_matches("http://dx.doi.org/");
                let stripped = strip_prefix_ci(stripped, "doi:");
                stripped.to_lowercase()
            }
            Self::Arxiv => {
                let stripped = strip_prefix_ci(trimmed, "arxiv:");
                ARXIV_VERSION_SUFFIX.replace(stripped, "").to_lowercase()
            }
            Self::PubmedCentral => trimmed.to_uppercase(),
            Self::Pubmed
            | Self::Bibcode
            | Self::SemanticScholar
            | Self::OpenAlex
            | Self::Dblp => trimmed.to_string(),
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Doi => "doi",
            Self::Arxiv => "arxiv",
            Self::Pubmed => "pmid",
            Self::PubmedCentral => "pmcid",
            Self::Bibcode => "bibcode",
            Self::SemanticScholar => "corpus_id",
            Self::OpenAlex => "openalex",
            Self::Dblp => "dblp",
        };
        write!(f, "{name}")
    }
}

fn strip_prefix_ci<'a>(value: &'a str, prefix: &str) -> &'a str {
    if value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        &value[prefix.len()..]
    } else {
        value
    }
}

/// A mapping from identifier kind to raw value; at most one value per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSet {
    values: HashMap<IdentifierKind, String>,
}

impl IdentifierSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any existing value of the same kind.
    /// Empty values are ignored.
    pub fn insert(&mut self, kind: IdentifierKind, raw: impl Into<String>) {
        let raw = raw.into();
        if !raw.trim().is_empty() {
            self.values.insert(kind, raw.trim().to_string());
        }
    }

    /// Raw stored value for a kind
    #[must_use]
    pub fn get(&self, kind: IdentifierKind) -> Option<&str> {
        self.values.get(&kind).map(String::as_str)
    }

    /// Normalized comparable value for a kind
    #[must_use]
    pub fn normalized(&self, kind: IdentifierKind) -> Option<String> {
        self.get(kind).map(|raw| kind.normalize(raw))
    }

    #[must_use]
    pub fn contains(&self, kind: IdentifierKind) -> bool {
        self.values.contains_key(&kind)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(kind, raw value)` pairs in kind order
    pub fn iter(&self) -> impl Iterator<Item = (IdentifierKind, &str)> {
        IdentifierKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|v| (kind, v)))
    }

    /// Copy in every entry of `other` whose kind is not yet present.
    /// Existing values always win.
    pub fn merge_missing(&mut self, other: &Self) {
        for (kind, value) in other.iter() {
            self.values
                .entry(kind)
                .or_insert_with(|| value.to_string());
        }
    }

    /// Union of `self` and `other`, with `self`'s values taking precedence
    /// on conflicting kinds.
    #[must_use]
    pub fn union_preferring_self(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge_missing(other);
        merged
    }

    /// True if the two sets share a normalized value for any kind.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        IdentifierKind::ALL.into_iter().any(|kind| {
            matches!(
                (self.normalized(kind), other.normalized(kind)),
                (Some(a), Some(b)) if a == b
            )
        })
    }

    /// Extract identifiers from a bibliographic field set (field name ->
    /// value, field names compared case-insensitively). For every kind the
    /// first present field in its priority list wins.
    #[must_use]
    pub fn extract_from_fields(fields: &HashMap<String, String>) -> Self {
        let lowered: HashMap<String, &str> = fields
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.as_str()))
            .collect();

        let mut set = Self::new();
        for kind in IdentifierKind::ALL {
            for field in kind.field_names() {
                if let Some(value) = lowered.get(*field) {
                    if !value.trim().is_empty() {
                        set.insert(kind, *value);
                        break;
                    }
                }
            }
        }
        set
    }
}

impl FromIterator<(IdentifierKind, String)> for IdentifierSet {
    fn from_iter<T: IntoIterator<Item = (IdentifierKind, String)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (kind, value) in iter {
            set.insert(kind, value);
        }
        set
    }
}
