//! Fuzz test for provider record normalizers
//!
//! Feeds arbitrary JSON to every provider normalizer. A normalizer must
//! return Ok or Err for any input; entries it does produce must carry a
//! non-empty id and category.
//!
//! Run with: cargo +nightly fuzz run normalize_fuzz -- -max_total_time=60

#![no_main]

use agora_sources::{catalog_of, normalizers};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    for (label, normalize) in normalizers() {
        assert!(catalog_of(label).is_some(), "{label} feeds no catalog");
        if let Ok(entry) = normalize(value.clone()) {
            assert!(!entry.id.trim().is_empty(), "{label} produced a blank id");
            assert!(!entry.category.is_empty(), "{label} produced a blank category");
        }
    }
});
