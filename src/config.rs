//! Injected configuration for the aggregation core.
//!
//! The library never reads or writes storage on its own: hosts either build
//! a [`Config`] in code, or call [`Config::load`] to layer an optional TOML
//! file and `BIBFUSE_`-prefixed environment variables over the defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP client settings shared by every source
    pub http: HttpConfig,
    /// Enrichment source ordering and enablement
    pub sources: SourcesConfig,
    /// Deduplication engine settings
    pub dedup: DedupConfig,
    /// Per-source request pacing budgets
    pub rate_limits: RateLimitingConfig,
    /// Enrichment orchestrator settings
    pub enrichment: EnrichmentConfig,
}

/// HTTP client configuration shared by all catalog integrations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Maximum redirects to follow
    pub max_redirects: u32,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 10,
            user_agent: format!("bibfuse/{} (bibliographic aggregator)", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Which sources run, and in which priority order.
///
/// The order here controls enrichment merge precedence; it is distinct from
/// the deduplication priorities in [`DedupConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Source ids in descending enrichment priority
    pub order: Vec<String>,
    /// Source ids that are configured but disabled
    pub disabled: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            order: vec![
                "semantic_scholar".to_string(),
                "openalex".to_string(),
                "crossref".to_string(),
                "unpaywall".to_string(),
                "adsabs".to_string(),
                "arxiv".to_string(),
            ],
            disabled: Vec::new(),
        }
    }
}

/// Deduplication engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Source id -> deduplication priority (higher wins primary selection)
    pub source_priorities: HashMap<String, u8>,
    /// Jaro-Winkler threshold for the fuzzy title fallback. Normalized-equal
    /// titles always match regardless of this value.
    pub title_similarity: f64,
    /// Maximum publication-year difference for the fuzzy fallback
    pub year_tolerance: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        let mut source_priorities = HashMap::new();
        // Curated bibliographic indexes outrank aggregators for display.
        source_priorities.insert("crossref".to_string(), 90);
        source_priorities.insert("pubmed".to_string(), 85);
        source_priorities.insert("adsabs".to_string(), 80);
        source_priorities.insert("arxiv".to_string(), 70);
        source_priorities.insert("semantic_scholar".to_string(), 60);
        source_priorities.insert("openalex".to_string(), 50);

        Self {
            source_priorities,
            title_similarity: 0.95,
            year_tolerance: 1,
        }
    }
}

impl DedupConfig {
    /// Deduplication priority for a source id (unknown sources rank lowest)
    #[must_use]
    pub fn priority_of(&self, source_id: &str) -> u8 {
        self.source_priorities.get(source_id).copied().unwrap_or(0)
    }
}

/// One source's request budget: at most `max_requests` per `interval_secs`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateBudgetConfig {
    pub max_requests: u32,
    pub interval_secs: u64,
}

impl RateBudgetConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Per-source request pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Budget applied to sources without a specific entry
    pub default: RateBudgetConfig,
    /// Source id -> budget overrides
    pub sources: HashMap<String, RateBudgetConfig>,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        let mut sources = HashMap::new();
        // Published polite-tier limits; keyed tiers are configured by hosts.
        sources.insert(
            "semantic_scholar".to_string(),
            RateBudgetConfig { max_requests: 100, interval_secs: 300 },
        );
        sources.insert(
            "openalex".to_string(),
            RateBudgetConfig { max_requests: 10, interval_secs: 1 },
        );
        sources.insert(
            "crossref".to_string(),
            RateBudgetConfig { max_requests: 50, interval_secs: 1 },
        );
        sources.insert(
            "unpaywall".to_string(),
            RateBudgetConfig { max_requests: 10, interval_secs: 1 },
        );
        sources.insert(
            "adsabs".to_string(),
            RateBudgetConfig { max_requests: 15, interval_secs: 5 },
        );
        sources.insert(
            "arxiv".to_string(),
            RateBudgetConfig { max_requests: 1, interval_secs: 3 },
        );

        Self {
            default: RateBudgetConfig { max_requests: 1, interval_secs: 1 },
            sources,
        }
    }
}

impl RateLimitingConfig {
    /// Budget for a source id, falling back to the default budget
    #[must_use]
    pub fn budget_for(&self, source_id: &str) -> RateBudgetConfig {
        self.sources.get(source_id).copied().unwrap_or(self.default)
    }
}

/// Enrichment orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Timeout applied to each source call, in seconds. Per-source, never
    /// pass-wide: a slow source must not stall faster ones.
    pub per_source_timeout_secs: u64,
    /// Maximum number of source calls in flight at once
    pub max_parallel_sources: usize,
    /// Cap on embedded reference/citation lists kept from a response
    pub reference_list_limit: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            per_source_timeout_secs: 30,
            max_parallel_sources: 3,
            reference_list_limit: 100,
        }
    }
}

impl Config {
    /// Load configuration by layering an optional TOML file and
    /// `BIBFUSE_`-prefixed environment variables over the defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(
            &Self::default(),
        )?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("BIBFUSE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(Error::InvalidInput {
                field: "http.timeout_secs".to_string(),
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        if self.sources.order.is_empty() {
            return Err(Error::InvalidInput {
                field: "sources.order".to_string(),
                reason: "at least one source must be configured".to_string(),
            });
        }

        if self.enrichment.max_parallel_sources == 0 {
            return Err(Error::InvalidInput {
                field: "enrichment.max_parallel_sources".to_string(),
                reason: "parallelism must be greater than zero".to_string(),
            });
        }

        if self.enrichment.per_source_timeout_secs == 0 {
            return Err(Error::InvalidInput {
                field: "enrichment.per_source_timeout_secs".to_string(),
                reason: "per-source timeout must be greater than zero".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.dedup.title_similarity) {
            return Err(Error::InvalidInput {
                field: "dedup.title_similarity".to_string(),
                reason: "similarity threshold must be within [0, 1]".to_string(),
            });
        }

        for (id, budget) in std::iter::once(("default", &self.rate_limits.default)).chain(
            self.rate_limits
                .sources
                .iter()
                .map(|(id, b)| (id.as_str(), b)),
        ) {
            if budget.max_requests == 0 || budget.interval_secs == 0 {
                return Err(Error::InvalidInput {
                    field: format!("rate_limits.{id}"),
                    reason: "rate budget must allow at least one request per interval".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Source ids in descending enrichment priority, disabled sources removed
    #[must_use]
    pub fn enabled_source_order(&self) -> Vec<String> {
        self.sources
            .order
            .iter()
            .filter(|id| !self.sources.disabled.contains(id))
            .cloned()
            .collect()
    }

    /// The full configured ordering, including disabled sources
    #[must_use]
    pub fn source_order(&self) -> &[String] {
        &self.sources.order
    }

    /// Replace the source priority ordering (consumed as a plain ordered list)
    pub fn set_source_order(&mut self, order: Vec<String>) {
        self.sources.order = order;
    }

    /// Enable or disable one source by id
    pub fn set_source_enabled(&mut self, source_id: &str, enabled: bool) {
        if enabled {
            self.sources.disabled.retain(|id| id != source_id);
        } else if !self.sources.disabled.iter().any(|id| id == source_id) {
            self.sources.disabled.push(source_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.enrichment.reference_list_limit, 100);
        assert!(!config.sources.order.is_empty());
    }

    #[test]
    fn validation_rejects_zero_budget() {
        let mut config = Config::default();
        config.rate_limits.default = RateBudgetConfig { max_requests: 0, interval_secs: 5 };
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn validation_rejects_empty_source_order() {
        let mut config = Config::default();
        config.sources.order.clear();
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn disabled_sources_drop_out_of_enabled_order() {
        let mut config = Config::default();
        config.set_source_enabled("crossref", false);
        assert!(!config.enabled_source_order().contains(&"crossref".to_string()));
        // Full ordering still lists it for the settings UI.
        assert!(config.source_order().contains(&"crossref".to_string()));

        config.set_source_enabled("crossref", true);
        assert!(config.enabled_source_order().contains(&"crossref".to_string()));
    }

    #[test]
    fn budget_lookup_falls_back_to_default() {
        let config = Config::default();
        let budget = config.rate_limits.budget_for("no-such-source");
        assert_eq!(budget, config.rate_limits.default);
        let ads = config.rate_limits.budget_for("adsabs");
        assert_eq!(ads.max_requests, 15);
        assert_eq!(ads.interval_secs, 5);
    }
}
