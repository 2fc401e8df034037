//! Value types shared across the aggregation core.
//!
//! Everything here is an immutable value passed by clone; no type in this
//! module performs I/O or holds shared state.

pub mod enrichment;
pub mod search_result;

pub use enrichment::{
    AuthorStats, EnrichmentCapability, EnrichmentData, OpenAccessStatus, PaperStub,
};
pub use search_result::{DeduplicatedResult, SearchResult};
