//! External catalog integrations.
//!
//! One module per catalog; each implements [`EnrichmentSource`] and owns the
//! quirks of its wire format (inverted-index abstracts, Atom feeds, embedded
//! reference lists).

pub mod adsabs;
pub mod arxiv;
pub mod crossref;
pub mod openalex;
pub mod semantic_scholar;
pub mod traits;
pub mod unpaywall;

pub use adsabs::AdsSource;
pub use arxiv::ArxivSource;
pub use crossref::CrossrefSource;
pub use openalex::OpenAlexSource;
pub use semantic_scholar::SemanticScholarSource;
pub use traits::{EnrichmentOutcome, EnrichmentSource, SourceError};
pub use unpaywall::UnpaywallSource;
