//! Cross-source deduplication.

use std::collections::HashMap;

use agora_core::CatalogEntry;

/// Collapse entries sharing an `id` into one.
///
/// Entries are expected in fetcher invocation order. When an `id` repeats,
/// the later record replaces the earlier one wholesale (no field merge) but
/// keeps the position where the `id` was first seen, so output order is
/// deterministic for a fixed fetcher order. Runs in a single pass.
pub fn deduplicate(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    let mut merged: Vec<CatalogEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match index.get(&entry.id) {
            Some(&slot) => merged[slot] = entry,
            None => {
                index.insert(entry.id.clone(), merged.len());
                merged.push(entry);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{epoch, SourceName};
    use proptest::prelude::*;
    use std::collections::{BTreeMap, HashSet};

    fn entry(id: &str, popularity: u64, source_name: SourceName) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            source_name,
            tags: Vec::new(),
            category: "general".to_string(),
            popularity,
            last_updated: epoch(),
            url: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_later_entry_wins_whole_record() {
        let out = deduplicate(vec![
            entry("x", 10, SourceName::Primary),
            entry("y", 1, SourceName::Primary),
            entry("x", 50, SourceName::Secondary),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "x");
        assert_eq!(out[0].popularity, 50);
        assert_eq!(out[0].source_name, SourceName::Secondary);
        assert_eq!(out[1].id, "y");
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(Vec::new()).is_empty());
    }

    #[test]
    fn test_no_collisions_preserves_order() {
        let out = deduplicate(vec![
            entry("c", 1, SourceName::Primary),
            entry("a", 1, SourceName::Primary),
            entry("b", 1, SourceName::Public),
        ]);
        let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: ids are unique and each equals the last occurrence in the input.
        #[test]
        fn prop_dedup_keeps_last_occurrence(
            raw in prop::collection::vec((0u8..12, any::<u64>()), 0..60)
        ) {
            let input: Vec<CatalogEntry> = raw
                .iter()
                .map(|(id, pop)| entry(&format!("id-{id}"), *pop, SourceName::Primary))
                .collect();
            let out = deduplicate(input.clone());

            let unique: HashSet<&str> = out.iter().map(|e| e.id.as_str()).collect();
            prop_assert_eq!(unique.len(), out.len());

            for e in &out {
                let last = input.iter().rev().find(|i| i.id == e.id);
                prop_assert_eq!(Some(e), last);
            }

            let input_ids: HashSet<&str> = input.iter().map(|e| e.id.as_str()).collect();
            prop_assert_eq!(unique, input_ids);
        }
    }
}
