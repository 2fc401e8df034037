//! Enrichment orchestration across all configured sources.
//!
//! For one paper's identifier set, the orchestrator fans out to every
//! capable source concurrently, then folds the partial sheets together in
//! source-priority order, never arrival order, so a slow high-priority
//! source is not overridden by a fast low-priority one. Each source is its
//! own failure domain: one source failing never aborts the rest, and only a
//! pass with zero successes surfaces an error.

use crate::client::sources::{EnrichmentSource, SourceError};
use crate::client::{build_http_client, RateLimiter};
use crate::client::sources::{
    AdsSource, ArxivSource, CrossrefSource, OpenAlexSource, SemanticScholarSource,
    UnpaywallSource,
};
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result, SourceFailure};
use crate::identifier::IdentifierSet;
use crate::model::{EnrichmentCapability, EnrichmentData};
use futures::future::join_all;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{self, AtomicU64};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// What one enrichment pass produced.
#[derive(Debug, Default)]
pub struct EnrichmentReport {
    /// Merged fact sheet, precedence in source-priority order
    pub data: EnrichmentData,
    /// Input identifiers plus everything successful sources resolved
    pub identifiers: IdentifierSet,
    /// Sources that contributed, in priority order
    pub succeeded: Vec<String>,
    /// Per-source failures, recorded for observability; the pass itself
    /// still succeeded if anything landed in `succeeded`
    pub failures: Vec<SourceFailure>,
    /// Sources skipped without an attempt (unusable identifiers, or nothing
    /// left for their capabilities to fill)
    pub skipped: Vec<String>,
}

/// Queue priority for background enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QueuePriority {
    Low,
    Normal,
    High,
}

struct QueuedTarget {
    priority: QueuePriority,
    // Tie-breaker: FIFO within a priority level.
    seq: u64,
    identifiers: IdentifierSet,
}

impl PartialEq for QueuedTarget {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedTarget {}

impl Ord for QueuedTarget {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then(other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orchestrates enrichment for one paper at a time across the configured
/// sources. The unit of work is always "enrich one paper now"; batching is
/// the host scheduler's concern.
pub struct EnrichmentOrchestrator {
    sources: Vec<Arc<dyn EnrichmentSource>>,
    per_source_timeout: Duration,
    max_parallel_sources: usize,
    queue: Mutex<BinaryHeap<QueuedTarget>>,
    queue_seq: AtomicU64,
}

impl EnrichmentOrchestrator {
    /// Build an orchestrator over an explicit source list, highest priority
    /// first.
    #[must_use]
    pub fn new(
        sources: Vec<Arc<dyn EnrichmentSource>>,
        per_source_timeout: Duration,
        max_parallel_sources: usize,
    ) -> Self {
        info!(
            sources = sources.len(),
            "initialized enrichment orchestrator"
        );
        Self {
            sources,
            per_source_timeout,
            max_parallel_sources: max_parallel_sources.max(1),
            queue: Mutex::new(BinaryHeap::new()),
            queue_seq: AtomicU64::new(0),
        }
    }

    /// Build the standard source set from configuration and a credential
    /// store, ordered and filtered per `config.sources`.
    pub fn from_config(config: &Config, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        config.validate()?;
        let client = build_http_client(&config.http)?;
        let limiter = |name: &str| {
            Arc::new(RateLimiter::new(config.rate_limits.budget_for(name).into()))
        };
        let reference_limit = config.enrichment.reference_list_limit;

        let mut by_name: Vec<Arc<dyn EnrichmentSource>> = vec![
            Arc::new(SemanticScholarSource::new(
                client.clone(),
                limiter("semantic_scholar"),
                Arc::clone(&credentials),
                reference_limit,
            )),
            Arc::new(OpenAlexSource::new(
                client.clone(),
                limiter("openalex"),
                Arc::clone(&credentials),
            )),
            Arc::new(CrossrefSource::new(
                client.clone(),
                limiter("crossref"),
                Arc::clone(&credentials),
                reference_limit,
            )),
            Arc::new(UnpaywallSource::new(
                client.clone(),
                limiter("unpaywall"),
                Arc::clone(&credentials),
            )),
            Arc::new(AdsSource::new(
                client.clone(),
                limiter("adsabs"),
                Arc::clone(&credentials),
            )),
            Arc::new(ArxivSource::new(client, limiter("arxiv"))),
        ];

        // Order by the configured priority list; unknown ids are ignored.
        let mut sources: Vec<Arc<dyn EnrichmentSource>> = Vec::new();
        for id in config.enabled_source_order() {
            if let Some(pos) = by_name.iter().position(|s| s.name() == id) {
                sources.push(by_name.remove(pos));
            } else {
                warn!(source = %id, "configured source id has no integration");
            }
        }

        Ok(Self::new(
            sources,
            Duration::from_secs(config.enrichment.per_source_timeout_secs),
            config.enrichment.max_parallel_sources,
        ))
    }

    /// Configured source ids in priority order
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Capability introspection for one source id
    #[must_use]
    pub fn capabilities_of(&self, source_id: &str) -> Option<Vec<EnrichmentCapability>> {
        self.sources
            .iter()
            .find(|s| s.name() == source_id)
            .map(|s| s.capabilities())
    }

    /// Enrich one paper now.
    ///
    /// Returns `Ok` with partial data as long as at least one source
    /// contributed; `Error::AllSourcesFailed` only when every attempted
    /// source failed. Dropping the returned future cancels all in-flight
    /// source calls; no partial data escapes a cancelled pass.
    pub async fn enrich_now(
        &self,
        identifiers: &IdentifierSet,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentReport> {
        let mut eligible: Vec<&Arc<dyn EnrichmentSource>> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();
        let mut resolvable = 0_usize;

        for source in &self.sources {
            if source.resolve_query(identifiers).is_none() {
                debug!(source = source.name(), "skipping source: no usable identifier");
                skipped.push(source.name().to_string());
                continue;
            }
            resolvable += 1;
            // On a refresh pass, a source none of whose capabilities cover a
            // still-missing field has nothing to add.
            if let Some(existing) = existing {
                if source.capabilities().iter().all(|c| existing.covers(*c)) {
                    debug!(source = source.name(), "skipping source: nothing left to fill");
                    skipped.push(source.name().to_string());
                    continue;
                }
            }
            eligible.push(source);
        }

        if eligible.is_empty() {
            if resolvable == 0 {
                return Err(Error::NoUsableIdentifier);
            }
            // Every resolvable source was already fully covered: the pass is
            // a no-op, and the caller keeps what it had.
            debug!("enrichment pass is a no-op: existing data covers all capabilities");
            return Ok(EnrichmentReport {
                data: existing.cloned().unwrap_or_default(),
                identifiers: identifiers.clone(),
                skipped,
                ..EnrichmentReport::default()
            });
        }

        info!(
            eligible = eligible.len(),
            skipped = skipped.len(),
            "starting enrichment pass"
        );

        // Fan out concurrently; the semaphore caps in-flight calls and each
        // call gets its own deadline so a slow source cannot stall the rest.
        // These futures are not spawned: dropping `enrich_now` drops them,
        // which is the cancellation contract.
        let semaphore = Arc::new(Semaphore::new(self.max_parallel_sources));
        let calls = eligible.iter().map(|source| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("orchestrator semaphore is never closed");
                let outcome = timeout(self.per_source_timeout, source.enrich(identifiers, existing))
                    .await
                    .unwrap_or(Err(SourceError::Timeout));
                (source.name().to_string(), outcome)
            }
        });

        // join_all preserves input order, so folding the results applies
        // merges in priority order regardless of completion order.
        let outcomes = join_all(calls).await;

        let mut report = EnrichmentReport {
            identifiers: identifiers.clone(),
            skipped,
            ..EnrichmentReport::default()
        };
        let mut merged: Option<EnrichmentData> = None;

        for (name, outcome) in outcomes {
            match outcome {
                Ok(outcome) => {
                    merged = Some(match merged {
                        // Higher-priority data went in first and wins.
                        Some(acc) => EnrichmentData::merge(acc, outcome.data),
                        None => outcome.data,
                    });
                    report.identifiers.merge_missing(&outcome.resolved);
                    report.succeeded.push(name);
                }
                Err(error) => {
                    warn!(source = %name, %error, "enrichment source failed");
                    report.failures.push(SourceFailure { source: name, error });
                }
            }
        }

        match merged {
            Some(data) => {
                info!(
                    succeeded = report.succeeded.len(),
                    failed = report.failures.len(),
                    "enrichment pass complete"
                );
                report.data = data;
                Ok(report)
            }
            None => Err(Error::AllSourcesFailed {
                failures: report.failures,
            }),
        }
    }

    /// Queue a paper for later enrichment. FIFO within a priority level.
    pub fn queue_for_enrichment(&self, identifiers: IdentifierSet, priority: QueuePriority) {
        let seq = self.queue_seq.fetch_add(1, atomic::Ordering::Relaxed);
        self.queue
            .lock()
            .expect("enrichment queue lock poisoned")
            .push(QueuedTarget {
                priority,
                seq,
                identifiers,
            });
    }

    /// Number of queued targets
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queue
            .lock()
            .expect("enrichment queue lock poisoned")
            .len()
    }

    /// Enrich the highest-priority queued paper now.
    pub async fn process_next_queued(&self) -> Result<EnrichmentReport> {
        let target = self
            .queue
            .lock()
            .expect("enrichment queue lock poisoned")
            .pop()
            .ok_or(Error::QueueEmpty)?;
        self.enrich_now(&target.identifiers, None).await
    }
}
