//! Fuzz test for fallback set parsing
//!
//! Arbitrary text loaded as a fallback document must either validate or
//! fail with a MalformedFallback error, never panic.
//!
//! Run with: cargo +nightly fuzz run fallback_fuzz -- -max_total_time=60

#![no_main]

use agora_catalog::FallbackSet;
use agora_core::{CatalogError, CatalogKind, SourceName};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for kind in CatalogKind::ALL {
        match FallbackSet::from_json(kind, input.to_string()).load() {
            Ok(entries) => {
                assert!(entries.iter().all(|e| e.source_name == SourceName::Fallback));
            }
            Err(err) => {
                assert!(matches!(err, CatalogError::MalformedFallback { .. }));
            }
        }
    }
});
