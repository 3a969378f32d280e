#![forbid(unsafe_code)]

//! Heuristic intent extraction: turns free-text instructions into structured
//! [`fp_core::Command`]s, and turns arbitrary documents or source code into
//! diagram text.
//!
//! Everything here is rule-based pattern matching with silent fallbacks, not
//! a grammar. An instruction that matches no rule lands in the generic
//! default and never fails.

mod generate;
mod interpret;

use serde::{Deserialize, Serialize};

pub use generate::generate;
pub use interpret::{
    Extracted, Interpretation, extract_node_label, infer_kind, interpret, slug, unique_node_id,
};

/// Flavor of content handed to the generator, as declared by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    General,
    Code,
    Story,
}

impl ContentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Code => "code",
            Self::Story => "story",
        }
    }
}
