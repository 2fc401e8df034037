//! bibfuse - cross-catalog bibliographic metadata aggregation.
//!
//! Aggregates search results for one publication from several independent
//! catalogs, reconciles the duplicates they return for the same underlying
//! work, and incrementally enriches a unified record with citation counts,
//! reference/citation graphs, abstracts, open-access links, and author
//! statistics. Persistence, format parsing, scheduling, and UI are host
//! concerns; this crate is the identity-resolution and enrichment core.

pub mod client;
pub mod config;
pub mod credentials;
pub mod dedupe;
pub mod error;
pub mod identifier;
pub mod model;
pub mod orchestrator;

pub use client::sources::{EnrichmentOutcome, EnrichmentSource, SourceError};
pub use client::{RateBudget, RateLimiter};
pub use config::Config;
pub use credentials::{CredentialStore, NoCredentials, StaticCredentials};
pub use dedupe::Deduplicator;
pub use error::{Error, ErrorCategory, Result, SourceFailure};
pub use identifier::{IdentifierKind, IdentifierSet};
pub use model::{
    AuthorStats, DeduplicatedResult, EnrichmentCapability, EnrichmentData, OpenAccessStatus,
    PaperStub, SearchResult,
};
pub use orchestrator::{EnrichmentOrchestrator, EnrichmentReport, QueuePriority};
