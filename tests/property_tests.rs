use bibfuse::dedupe::normalize::{normalize_title, titles_match};
use bibfuse::{EnrichmentData, IdentifierKind, OpenAccessStatus};
use proptest::prelude::*;

/// Property-based tests for the normalization and merge algorithms
mod identifier_normalization_props {
    use super::*;

    proptest! {
        #[test]
        fn doi_normalization_is_idempotent(doi in r"10\.\d{4,9}/[a-zA-Z0-9._\-]{1,40}") {
            let once = IdentifierKind::Doi.normalize(&doi);
            let twice = IdentifierKind::Doi.normalize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn doi_comparison_ignores_case(doi in r"10\.\d{4,9}/[a-zA-Z0-9._\-]{1,40}") {
            let upper = IdentifierKind::Doi.normalize(&doi.to_uppercase());
            let lower = IdentifierKind::Doi.normalize(&doi.to_lowercase());
            prop_assert_eq!(upper, lower);
        }

        #[test]
        fn arxiv_normalization_is_version_insensitive(
            id in r"[0-9]{4}\.[0-9]{4,5}",
            version in 1u32..=20
        ) {
            let bare = IdentifierKind::Arxiv.normalize(&id);
            let versioned = IdentifierKind::Arxiv.normalize(&format!("{id}v{version}"));
            let prefixed = IdentifierKind::Arxiv.normalize(&format!("arXiv:{id}v{version}"));
            prop_assert_eq!(&bare, &versioned);
            prop_assert_eq!(&bare, &prefixed);
        }

        #[test]
        fn arxiv_normalization_is_idempotent(raw in r"(arXiv:)?[0-9]{4}\.[0-9]{4,5}(v[0-9]{1,2})?") {
            let once = IdentifierKind::Arxiv.normalize(&raw);
            let twice = IdentifierKind::Arxiv.normalize(&once);
            prop_assert_eq!(once, twice);
        }
    }
}

mod title_normalization_props {
    use super::*;

    proptest! {
        #[test]
        fn title_normalization_is_idempotent(title in r"[a-zA-Z0-9 .,:;!?'\-]{0,80}") {
            let once = normalize_title(&title);
            let twice = normalize_title(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_equal_titles_always_match(title in r"[a-zA-Z][a-zA-Z0-9 ]{1,60}") {
            let shouted = title.to_uppercase();
            let decorated = format!("  {title}!!  ");
            let a = normalize_title(&shouted);
            let b = normalize_title(&decorated);
            // Same text modulo case/punctuation/whitespace must match at any
            // threshold.
            prop_assert!(titles_match(&a, &b, 1.0));
        }
    }
}

mod merge_props {
    use super::*;

    fn arb_data() -> impl Strategy<Value = EnrichmentData> {
        (
            proptest::option::of(0u64..1_000_000),
            proptest::option::of(0u64..10_000),
            proptest::option::of(r"[a-zA-Z0-9 .,]{1,120}"),
            proptest::option::of(r"[a-zA-Z ]{1,40}"),
            proptest::option::of(prop_oneof![
                Just(OpenAccessStatus::Gold),
                Just(OpenAccessStatus::Green),
                Just(OpenAccessStatus::Bronze),
                Just(OpenAccessStatus::Hybrid),
                Just(OpenAccessStatus::Closed),
                Just(OpenAccessStatus::Unknown),
            ]),
            proptest::option::of(r"[a-z_]{3,20}"),
        )
            .prop_map(
                |(citation_count, reference_count, abstract_text, venue, oa_status, source)| {
                    EnrichmentData {
                        citation_count,
                        reference_count,
                        abstract_text,
                        venue,
                        oa_status,
                        source,
                        ..EnrichmentData::default()
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn merge_is_loss_free(a in arb_data(), b in arb_data()) {
            let merged = EnrichmentData::merge(a.clone(), b.clone());
            // No field present in either operand may come out absent.
            prop_assert_eq!(merged.citation_count.is_some(),
                a.citation_count.is_some() || b.citation_count.is_some());
            prop_assert_eq!(merged.abstract_text.is_some(),
                a.abstract_text.is_some() || b.abstract_text.is_some());
            prop_assert_eq!(merged.venue.is_some(),
                a.venue.is_some() || b.venue.is_some());
            prop_assert_eq!(merged.oa_status.is_some(),
                a.oa_status.is_some() || b.oa_status.is_some());
        }

        #[test]
        fn merge_is_right_biased_fill(a in arb_data(), b in arb_data()) {
            let merged = EnrichmentData::merge(a.clone(), b.clone());
            // Every field present in `a` survives verbatim, whatever `b` says.
            if a.citation_count.is_some() {
                prop_assert_eq!(merged.citation_count, a.citation_count);
            }
            if a.abstract_text.is_some() {
                prop_assert_eq!(merged.abstract_text, a.abstract_text);
            }
            if a.venue.is_some() {
                prop_assert_eq!(merged.venue, a.venue);
            }
            if a.oa_status.is_some() {
                prop_assert_eq!(merged.oa_status, a.oa_status);
            }
            if a.source.is_some() {
                prop_assert_eq!(merged.source, a.source);
            }
        }

        #[test]
        fn merge_with_default_is_identity(a in arb_data()) {
            prop_assert_eq!(
                EnrichmentData::merge(a.clone(), EnrichmentData::default()),
                a.clone()
            );
            prop_assert_eq!(EnrichmentData::merge(EnrichmentData::default(), a.clone()), a);
        }

        #[test]
        fn merge_is_associative(a in arb_data(), b in arb_data(), c in arb_data()) {
            let left = EnrichmentData::merge(EnrichmentData::merge(a.clone(), b.clone()), c.clone());
            let right = EnrichmentData::merge(a, EnrichmentData::merge(b, c));
            prop_assert_eq!(left, right);
        }
    }
}
