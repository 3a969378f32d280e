//! Fuzz the reverse parser: arbitrary bytes must never panic, and every
//! recovered node and edge must carry a non-empty identifier.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let outcome = fp_dialect::parse(text);
        for node in &outcome.nodes {
            assert!(!node.id.is_empty());
        }
        for edge in &outcome.edges {
            assert!(!edge.source.is_empty());
            assert!(!edge.target.is_empty());
        }
    }
});
