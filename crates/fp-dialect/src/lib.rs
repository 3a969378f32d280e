#![forbid(unsafe_code)]

//! The FlowPilot diagram text dialect: a small line-oriented flowchart
//! notation (header + node lines + edge lines + cosmetic class lines).
//!
//! [`format`] serializes a graph into the dialect; [`parse`] is the
//! best-effort inverse, a per-line regex scanner. For graphs with unique
//! node ids and delimiter-free labels the pair round-trips `(id, kind)` and
//! `(source, target)`; edge labels are a known one-way street.

mod format;
mod parse;

pub use format::{HEADER, format, format_edge_line, format_node_line, sanitize_label};
pub use parse::{ParseOutcome, parse};
