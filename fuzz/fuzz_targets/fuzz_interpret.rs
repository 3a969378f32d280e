//! Fuzz the rule-based interpreter: any input string must classify into a
//! command that serializes to a tagged JSON object.

#![no_main]

use fp_intent::ContentType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        for content_type in [ContentType::General, ContentType::Code, ContentType::Story] {
            let interpretation = fp_intent::interpret(text, content_type);
            let value = serde_json::to_value(&interpretation.command)
                .expect("commands always serialize");
            assert!(value["action"].is_string());
        }
    }
});
