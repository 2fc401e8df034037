//! End-to-end enrichment through the orchestrator with HTTP-level sources.

use bibfuse::client::sources::{CrossrefSource, EnrichmentSource, OpenAlexSource};
use bibfuse::{
    Config, EnrichmentOrchestrator, Error, IdentifierKind, IdentifierSet, NoCredentials,
    OpenAccessStatus, RateBudget, RateLimiter,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn limiter() -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(RateBudget::new(1000, Duration::from_secs(1))))
}

fn doi_ids(doi: &str) -> IdentifierSet {
    let mut ids = IdentifierSet::new();
    ids.insert(IdentifierKind::Doi, doi);
    ids
}

/// Crossref first (priority), OpenAlex second, both against mock servers.
async fn two_source_orchestrator(
    crossref_server: &MockServer,
    openalex_server: &MockServer,
) -> EnrichmentOrchestrator {
    let client = reqwest::Client::new();
    let crossref: Arc<dyn EnrichmentSource> = Arc::new(
        CrossrefSource::new(client.clone(), limiter(), Arc::new(NoCredentials), 100)
            .with_base_url(crossref_server.uri()),
    );
    let openalex: Arc<dyn EnrichmentSource> = Arc::new(
        OpenAlexSource::new(client, limiter(), Arc::new(NoCredentials))
            .with_base_url(openalex_server.uri()),
    );
    EnrichmentOrchestrator::new(vec![crossref, openalex], Duration::from_secs(5), 3)
}

#[tokio::test]
async fn partial_failure_still_returns_merged_data() {
    init_tracing();
    let crossref_server = MockServer::start().await;
    let openalex_server = MockServer::start().await;

    // Crossref is down; OpenAlex answers.
    Mock::given(method("GET"))
        .and(path_regex(r"^/works/.*$".to_string()))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
        .mount(&crossref_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/works/.*$".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cited_by_count": 15,
            "open_access": {"oa_status": "green"}
        })))
        .mount(&openalex_server)
        .await;

    let orch = two_source_orchestrator(&crossref_server, &openalex_server).await;
    let report = orch.enrich_now(&doi_ids("10.1/partial"), None).await.unwrap();

    assert_eq!(report.succeeded, vec!["openalex".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "crossref");
    assert_eq!(report.data.citation_count, Some(15));
    assert_eq!(report.data.oa_status, Some(OpenAccessStatus::Green));
}

#[tokio::test]
async fn priority_source_wins_conflicting_fields() {
    let crossref_server = MockServer::start().await;
    let openalex_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/works/.*$".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "is-referenced-by-count": 100,
                "container-title": ["Authoritative Journal"]
            }
        })))
        .mount(&crossref_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/works/.*$".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cited_by_count": 90,
            "open_access": {"oa_status": "bronze"},
            "primary_location": {"source": {"display_name": "Aggregated Venue"}}
        })))
        .mount(&openalex_server)
        .await;

    let orch = two_source_orchestrator(&crossref_server, &openalex_server).await;
    let report = orch.enrich_now(&doi_ids("10.1/conflict"), None).await.unwrap();

    assert_eq!(report.succeeded.len(), 2);
    // Crossref has priority: its count and venue win.
    assert_eq!(report.data.citation_count, Some(100));
    assert_eq!(report.data.venue.as_deref(), Some("Authoritative Journal"));
    // OpenAlex still backfills what Crossref lacks.
    assert_eq!(report.data.oa_status, Some(OpenAccessStatus::Bronze));
    assert_eq!(report.data.source.as_deref(), Some("crossref"));
}

#[tokio::test]
async fn all_sources_failing_surfaces_aggregate_error() {
    let crossref_server = MockServer::start().await;
    let openalex_server = MockServer::start().await;

    for server in [&crossref_server, &openalex_server] {
        Mock::given(method("GET"))
            .and(path_regex(r"^/works/.*$".to_string()))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(server)
            .await;
    }

    let orch = two_source_orchestrator(&crossref_server, &openalex_server).await;
    let err = orch.enrich_now(&doi_ids("10.1/down"), None).await.unwrap_err();

    // 5xx failures are transient, so the aggregate is worth retrying.
    assert!(err.is_retryable());
    match err {
        Error::AllSourcesFailed { failures } => assert_eq!(failures.len(), 2),
        other => panic!("expected AllSourcesFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn resolved_identifiers_feed_back_into_the_report() {
    let crossref_server = MockServer::start().await;
    let openalex_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/works/.*$".to_string()))
        .respond_with(ResponseTemplate::new(404).set_body_string("not registered"))
        .mount(&crossref_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/works/.*$".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": {
                "openalex": "https://openalex.org/W555",
                "pmid": "https://pubmed.ncbi.nlm.nih.gov/777"
            },
            "cited_by_count": 2
        })))
        .mount(&openalex_server)
        .await;

    let orch = two_source_orchestrator(&crossref_server, &openalex_server).await;
    let report = orch.enrich_now(&doi_ids("10.1/resolve"), None).await.unwrap();

    // Input DOI survives; newly discovered ids join it.
    assert_eq!(report.identifiers.get(IdentifierKind::Doi), Some("10.1/resolve"));
    assert_eq!(report.identifiers.get(IdentifierKind::OpenAlex), Some("W555"));
    assert_eq!(report.identifiers.get(IdentifierKind::Pubmed), Some("777"));
}

#[tokio::test]
async fn orchestrator_from_config_exposes_capabilities() {
    let config = Config::default();
    let orch = EnrichmentOrchestrator::from_config(&config, Arc::new(NoCredentials)).unwrap();

    let names = orch.source_names();
    assert_eq!(names.len(), 6);
    assert_eq!(names[0], "semantic_scholar");

    let caps = orch.capabilities_of("unpaywall").unwrap();
    assert!(caps.contains(&bibfuse::EnrichmentCapability::OpenAccessStatus));
    assert!(orch.capabilities_of("no-such-source").is_none());
}

#[tokio::test]
async fn disabled_source_is_not_constructed() {
    let mut config = Config::default();
    config.set_source_enabled("adsabs", false);

    let orch = EnrichmentOrchestrator::from_config(&config, Arc::new(NoCredentials)).unwrap();
    assert!(!orch.source_names().contains(&"adsabs".to_string()));
}
