//! Fuzz the full pipeline: generate diagram text from arbitrary content,
//! parse it back, and re-format. Nodes must survive the cycle exactly, and
//! no recovered edge may vanish. Strict textual idempotence does not hold:
//! a label containing `-->` re-parses as an extra edge.

#![no_main]

use fp_intent::ContentType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let diagram = fp_intent::generate(text, ContentType::Story);
        let first = fp_dialect::parse(&diagram);
        let formatted = fp_dialect::format(&first.nodes, &first.edges);
        let second = fp_dialect::parse(&formatted);

        assert_eq!(second.nodes, first.nodes);
        for edge in &first.edges {
            assert!(
                second
                    .edges
                    .iter()
                    .any(|e| e.source == edge.source && e.target == edge.target),
                "edge {} -> {} lost after re-format",
                edge.source,
                edge.target
            );
        }
    }
});
