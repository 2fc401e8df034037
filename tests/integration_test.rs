use bibfuse::{Config, Error, IdentifierKind, IdentifierSet};
use std::collections::HashMap;
use std::io::Write;

#[tokio::test]
async fn test_config_default() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.http.timeout_secs, 30);
    assert_eq!(config.enrichment.max_parallel_sources, 3);
    assert_eq!(config.enrichment.reference_list_limit, 100);
    assert!(!config.sources.order.is_empty());
    assert!(config.sources.disabled.is_empty());
}

#[tokio::test]
async fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // Zero timeout
    config.http.timeout_secs = 0;
    assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
    config.http.timeout_secs = 30;

    // Empty source order
    let order = std::mem::take(&mut config.sources.order);
    assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
    config.sources.order = order;

    // Zero parallelism
    config.enrichment.max_parallel_sources = 0;
    assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
    config.enrichment.max_parallel_sources = 3;

    // Out-of-range similarity threshold
    config.dedup.title_similarity = 1.5;
    assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
}

#[test]
fn test_config_load_layers_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[http]
timeout_secs = 12

[sources]
order = ["crossref", "openalex"]
disabled = ["openalex"]

[enrichment]
per_source_timeout_secs = 7
"#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.http.timeout_secs, 12);
    assert_eq!(config.enrichment.per_source_timeout_secs, 7);
    // Defaults survive where the file is silent.
    assert_eq!(config.enrichment.reference_list_limit, 100);
    assert_eq!(config.enabled_source_order(), vec!["crossref".to_string()]);
}

#[test]
fn test_source_order_settings_surface() {
    let mut config = Config::default();
    config.set_source_order(vec!["openalex".to_string(), "crossref".to_string()]);
    assert_eq!(config.source_order(), ["openalex", "crossref"]);

    config.set_source_enabled("openalex", false);
    config.set_source_enabled("openalex", false); // idempotent
    assert_eq!(config.enabled_source_order(), vec!["crossref".to_string()]);
}

#[test]
fn test_error_chain() {
    let err = Error::InvalidInput {
        field: "doi".to_string(),
        reason: "must contain a '/'".to_string(),
    };
    assert_eq!(format!("{err}"), "Invalid input: doi - must contain a '/'");
}

#[test]
fn test_identifier_extraction_from_bibliographic_fields() {
    let mut fields = HashMap::new();
    fields.insert("Eprint".to_string(), "arXiv:1706.03762v5".to_string());
    fields.insert("doi".to_string(), "10.48550/arXiv.1706.03762".to_string());
    fields.insert("pmid".to_string(), "0000001".to_string());

    let ids = IdentifierSet::extract_from_fields(&fields);
    assert_eq!(ids.get(IdentifierKind::Arxiv), Some("arXiv:1706.03762v5"));
    assert_eq!(ids.normalized(IdentifierKind::Arxiv).as_deref(), Some("1706.03762"));
    assert_eq!(ids.get(IdentifierKind::Pubmed), Some("0000001"));
    assert_eq!(ids.len(), 3);
}
