//! Stateless filter and sort over a catalog's entries.
//!
//! Every constraint in a [`FilterSpec`] is independent and they compose by
//! logical AND. Sorting is stable, so entries with equal keys keep their
//! relative cache order and repeated queries return identical results.

use std::cmp::Reverse;

use agora_core::{CatalogEntry, FilterSpec, SortBy};

/// Filter then sort `entries` according to `spec`.
pub fn apply(entries: &[CatalogEntry], spec: &FilterSpec) -> Vec<CatalogEntry> {
    let matcher = Matcher::new(spec);
    let mut out: Vec<CatalogEntry> = entries
        .iter()
        .filter(|e| matcher.matches(e))
        .cloned()
        .collect();
    sort_entries(&mut out, spec.sort_by);
    out
}

/// Returns true if `entry` satisfies every constraint in `spec`.
pub fn matches(entry: &CatalogEntry, spec: &FilterSpec) -> bool {
    Matcher::new(spec).matches(entry)
}

/// Stable in-place sort by the given key.
pub fn sort_entries(entries: &mut [CatalogEntry], sort_by: SortBy) {
    match sort_by {
        SortBy::Popularity => entries.sort_by_key(|e| Reverse(e.popularity)),
        SortBy::Recency => entries.sort_by_key(|e| Reverse(e.last_updated)),
        SortBy::Name => entries.sort_by_cached_key(|e| e.name.to_lowercase()),
    }
}

/// Spec constraints with the search term lower-cased once up front.
struct Matcher<'a> {
    category: Option<&'a str>,
    min_popularity: u64,
    tags: &'a [String],
    needle: Option<String>,
}

impl<'a> Matcher<'a> {
    fn new(spec: &'a FilterSpec) -> Self {
        Self {
            category: spec.effective_category(),
            min_popularity: spec.effective_min_popularity(),
            tags: &spec.tags,
            needle: spec.effective_search().map(str::to_lowercase),
        }
    }

    // Cheapest checks first.
    fn matches(&self, entry: &CatalogEntry) -> bool {
        if entry.popularity < self.min_popularity {
            return false;
        }
        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }
        if !self.tags.iter().all(|t| entry.has_tag(t)) {
            return false;
        }
        match &self.needle {
            Some(needle) => search_hit(entry, needle),
            None => true,
        }
    }
}

fn search_hit(entry: &CatalogEntry, needle: &str) -> bool {
    entry.name.to_lowercase().contains(needle)
        || entry.description.to_lowercase().contains(needle)
        || entry.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{epoch, SourceName};
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn entry(id: &str, category: &str, tags: &[&str], popularity: u64) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: id.to_string(),
            description: format!("{id} description"),
            source_name: SourceName::Primary,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: category.to_string(),
            popularity,
            last_updated: epoch(),
            url: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    fn ids(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn sample() -> Vec<CatalogEntry> {
        vec![
            entry("bert", "nlp", &["transformers", "english"], 900),
            entry("resnet", "vision", &["cnn"], 700),
            entry("gpt2", "nlp", &["transformers"], 1200),
            entry("whisper", "audio", &["asr", "transformers"], 300),
        ]
    }

    #[test]
    fn test_empty_spec_returns_all_sorted_by_popularity() {
        let out = apply(&sample(), &FilterSpec::new());
        assert_eq!(ids(&out), vec!["gpt2", "bert", "resnet", "whisper"]);
    }

    #[test]
    fn test_category_filter_is_exact_and_case_sensitive() {
        let spec = FilterSpec::new().with_category("nlp");
        assert_eq!(ids(&apply(&sample(), &spec)), vec!["gpt2", "bert"]);

        let spec = FilterSpec::new().with_category("NLP");
        assert!(apply(&sample(), &spec).is_empty());
    }

    #[test]
    fn test_empty_category_is_no_constraint() {
        let spec = FilterSpec::new().with_category("");
        assert_eq!(apply(&sample(), &spec).len(), 4);
    }

    #[test]
    fn test_tags_use_and_semantics() {
        let spec = FilterSpec::new()
            .with_tag("transformers")
            .with_tag("english");
        assert_eq!(ids(&apply(&sample(), &spec)), vec!["bert"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_name_description_and_tags() {
        let by_name = FilterSpec::new().with_search("RESNET");
        assert_eq!(ids(&apply(&sample(), &by_name)), vec!["resnet"]);

        let by_tag = FilterSpec::new().with_search("Asr");
        assert_eq!(ids(&apply(&sample(), &by_tag)), vec!["whisper"]);

        let by_description = FilterSpec::new().with_search("gpt2 desc");
        assert_eq!(ids(&apply(&sample(), &by_description)), vec!["gpt2"]);
    }

    #[test]
    fn test_blank_search_matches_everything() {
        let spec = FilterSpec::new().with_search("   ");
        assert_eq!(apply(&sample(), &spec).len(), 4);
    }

    #[test]
    fn test_min_popularity_is_inclusive() {
        let spec = FilterSpec::new().with_min_popularity(900);
        assert_eq!(ids(&apply(&sample(), &spec)), vec!["gpt2", "bert"]);
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let mut entries = vec![
            entry("b", "x", &[], 0),
            entry("a", "x", &[], 0),
            entry("C", "x", &[], 0),
        ];
        sort_entries(&mut entries, SortBy::Name);
        assert_eq!(ids(&entries), vec!["a", "b", "C"]);
    }

    #[test]
    fn test_sort_by_recency_descending() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut entries = sample();
        for (i, e) in entries.iter_mut().enumerate() {
            e.last_updated = base + Duration::days(i as i64);
        }
        sort_entries(&mut entries, SortBy::Recency);
        assert_eq!(ids(&entries), vec!["whisper", "gpt2", "resnet", "bert"]);
    }

    #[test]
    fn test_popularity_ties_keep_input_order() {
        let entries = vec![
            entry("first", "x", &[], 5),
            entry("second", "x", &[], 5),
            entry("top", "x", &[], 9),
            entry("third", "x", &[], 5),
        ];
        let out = apply(&entries, &FilterSpec::new());
        assert_eq!(ids(&out), vec!["top", "first", "second", "third"]);
    }

    fn arb_entry() -> impl Strategy<Value = CatalogEntry> {
        (
            "[a-z]{1,6}",
            prop::sample::select(vec!["nlp", "vision", "audio"]),
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..3),
            0u64..20,
        )
            .prop_map(|(name, category, tags, popularity)| {
                let mut e = entry(&name, category, &tags, popularity);
                e.description = format!("about {name}");
                e
            })
    }

    fn arb_spec() -> impl Strategy<Value = FilterSpec> {
        (
            prop::option::of("[a-z]{0,2}"),
            prop::option::of(prop::sample::select(vec!["nlp", "vision", "audio"])),
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..2),
            prop::option::of(0u64..20),
            prop::sample::select(vec![SortBy::Popularity, SortBy::Recency, SortBy::Name]),
        )
            .prop_map(|(search, category, tags, min, sort)| {
                let mut spec = FilterSpec::new().with_sort(sort);
                if let Some(s) = search {
                    spec = spec.with_search(s);
                }
                if let Some(c) = category {
                    spec = spec.with_category(c);
                }
                for t in tags {
                    spec = spec.with_tag(t);
                }
                if let Some(m) = min {
                    spec = spec.with_min_popularity(m);
                }
                spec
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: every returned entry satisfies the spec and comes from the input.
        #[test]
        fn prop_results_are_matching_subset(
            entries in prop::collection::vec(arb_entry(), 0..30),
            spec in arb_spec(),
        ) {
            let out = apply(&entries, &spec);
            prop_assert!(out.len() <= entries.len());
            for e in &out {
                prop_assert!(matches(e, &spec));
                prop_assert!(entries.contains(e));
            }
            let expected = entries.iter().filter(|e| matches(e, &spec)).count();
            prop_assert_eq!(out.len(), expected);
        }

        /// Property: narrowing a spec never returns more entries.
        #[test]
        fn prop_narrowing_never_grows(
            entries in prop::collection::vec(arb_entry(), 0..30),
            loose in arb_spec(),
            extra_tag in prop::sample::select(vec!["a", "b", "c"]),
            extra_min in 0u64..20,
        ) {
            let narrow = loose
                .clone()
                .with_tag(extra_tag)
                .with_min_popularity(extra_min.max(loose.effective_min_popularity()));
            let loose_out = apply(&entries, &loose);
            let narrow_out = apply(&apply(&entries, &loose), &narrow);
            prop_assert!(narrow_out.len() <= loose_out.len());
        }

        /// Property: sorting is deterministic for identical input.
        #[test]
        fn prop_sort_is_repeatable(
            entries in prop::collection::vec(arb_entry(), 0..30),
            spec in arb_spec(),
        ) {
            prop_assert_eq!(apply(&entries, &spec), apply(&entries, &spec));
        }
    }
}
