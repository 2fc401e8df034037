//! Cross-source duplicate detection for search results.
//!
//! Different catalogs return the same underlying work without a shared key
//! space. The engine groups a batch of per-source results into
//! [`DeduplicatedResult`]s in two passes: transitive identifier-exact
//! grouping first, then a conservative fuzzy fallback for the
//! preprint/published pairs that share no identifier at all. Pure function
//! of its input: no I/O, deterministic for identical input.

pub mod normalize;

use crate::config::DedupConfig;
use crate::identifier::IdentifierKind;
use crate::model::{DeduplicatedResult, SearchResult};
use normalize::{first_author_surname, normalize_title, titles_match};
use std::collections::HashMap;
use tracing::debug;

/// Duplicate-detection engine. Construct once per configuration; `deduplicate`
/// may be called any number of times.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    config: DedupConfig,
}

/// Union-find over result indices.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            let root = self.find(self.parent[i]);
            self.parent[i] = root;
        }
        self.parent[i]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Attach the later root under the earlier one so group
            // representatives stay stable in input order.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

impl Deduplicator {
    #[must_use]
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Group a batch of per-source results into deduplicated groups.
    ///
    /// Output group order follows the first appearance of each group's
    /// earliest member in the input, so identical input yields identical
    /// output. A single-member group still becomes a [`DeduplicatedResult`]
    /// with empty alternates.
    #[must_use]
    pub fn deduplicate(&self, results: Vec<SearchResult>) -> Vec<DeduplicatedResult> {
        let input_count = results.len();

        // Exact repeats of one (id, source_id) record collapse up front so a
        // group never holds the same record twice.
        let mut seen_keys = std::collections::HashSet::new();
        let results: Vec<SearchResult> = results
            .into_iter()
            .filter(|r| seen_keys.insert((r.id.clone(), r.source_id.clone())))
            .collect();

        if results.is_empty() {
            return Vec::new();
        }

        let mut sets = DisjointSet::new(results.len());

        // Pass 1: identifier-exact grouping, transitive via union-find.
        let mut by_identifier: HashMap<(IdentifierKind, String), usize> = HashMap::new();
        for (idx, result) in results.iter().enumerate() {
            for kind in IdentifierKind::ALL {
                if let Some(value) = result.identifiers.normalized(kind) {
                    match by_identifier.entry((kind, value)) {
                        std::collections::hash_map::Entry::Occupied(entry) => {
                            sets.union(*entry.get(), idx);
                        }
                        std::collections::hash_map::Entry::Vacant(entry) => {
                            entry.insert(idx);
                        }
                    }
                }
            }
        }

        // Pass 2: fuzzy fallback for results still in separate groups.
        let titles: Vec<String> = results.iter().map(|r| normalize_title(&r.title)).collect();
        let surnames: Vec<Option<String>> = results
            .iter()
            .map(|r| first_author_surname(&r.authors))
            .collect();

        for i in 0..results.len() {
            for j in (i + 1)..results.len() {
                if sets.find(i) == sets.find(j) {
                    continue;
                }
                if self.fuzzy_match(&results[i], &results[j], &titles[i], &titles[j], &surnames[i], &surnames[j]) {
                    sets.union(i, j);
                }
            }
        }

        // Collect groups in order of first appearance.
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut root_to_group: HashMap<usize, usize> = HashMap::new();
        for idx in 0..results.len() {
            let root = sets.find(idx);
            match root_to_group.entry(root) {
                std::collections::hash_map::Entry::Occupied(entry) => {
                    groups[*entry.get()].push(idx);
                }
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(groups.len());
                    groups.push(vec![idx]);
                }
            }
        }

        let mut results: Vec<Option<SearchResult>> = results.into_iter().map(Some).collect();
        let deduplicated: Vec<DeduplicatedResult> = groups
            .into_iter()
            .map(|member_indices| {
                // Primary = highest dedup priority; ties break by the order
                // results were supplied (earliest wins).
                let primary_idx = member_indices
                    .iter()
                    .copied()
                    .max_by(|&a, &b| {
                        let pa = self.config.priority_of(&results[a].as_ref().unwrap().source_id);
                        let pb = self.config.priority_of(&results[b].as_ref().unwrap().source_id);
                        pa.cmp(&pb).then(b.cmp(&a))
                    })
                    .unwrap();

                let primary = results[primary_idx].take().unwrap();
                let alternates: Vec<SearchResult> = member_indices
                    .into_iter()
                    .filter(|&idx| idx != primary_idx)
                    .map(|idx| results[idx].take().unwrap())
                    .collect();

                DeduplicatedResult::new(primary, alternates)
            })
            .collect();

        debug!(
            input = input_count,
            groups = deduplicated.len(),
            "deduplicated search results"
        );

        deduplicated
    }

    /// Conservative same-paper check for results without identifier overlap:
    /// matching normalized titles, publication years within tolerance
    /// (absent year wildcards), and first-author surname correspondence.
    #[allow(clippy::too_many_arguments)]
    fn fuzzy_match(
        &self,
        a: &SearchResult,
        b: &SearchResult,
        title_a: &str,
        title_b: &str,
        surname_a: &Option<String>,
        surname_b: &Option<String>,
    ) -> bool {
        if !titles_match(title_a, title_b, self.config.title_similarity) {
            return false;
        }

        if let (Some(ya), Some(yb)) = (a.year, b.year) {
            if ya.abs_diff(yb) > self.config.year_tolerance {
                return false;
            }
        }

        match (surname_a, surname_b) {
            (Some(sa), Some(sb)) => sa == sb,
            _ => false,
        }
    }
}
