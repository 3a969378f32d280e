use std::sync::LazyLock;

use fp_core::{FlowEdge, FlowNode, NodeKind};
use regex::Regex;
use serde::Serialize;

/// Result of reverse-parsing diagram text back into a graph.
///
/// Parsing never fails: lines that match nothing are skipped with a warning,
/// and a zero-node outcome means "nothing usable", which callers must treat
/// as leave-the-store-alone rather than clear-the-graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ParseOutcome {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    pub warnings: Vec<String>,
}

// Leading identifier, one run of opening delimiters, label text, closing
// delimiter run. Unanchored: the first such group on the line wins.
static NODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*([\[({]+)\s*"?([^"\]})]*)"?\s*([\]})]+)"#).expect("node pattern")
});

// Two bare identifiers flanking the arrow. Any inline |label| annotation is
// skipped, not recovered; edge labels do not round-trip.
static EDGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*-->\s*(?:\|[^|]*\|\s*)?(\w+)").expect("edge pattern"));

/// Scans diagram text line by line and reconstructs the node and edge lists.
///
/// The node test and the connection test run independently, node first, so a
/// pathological line carrying both signatures registers as both.
#[must_use]
pub fn parse(input: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_skipped_line(trimmed) {
            continue;
        }

        let mut matched = false;

        if has_node_signature(trimmed) {
            if let Some(node) = parse_node_line(trimmed) {
                outcome.nodes.push(node);
                matched = true;
            }
        }

        if trimmed.contains("-->") {
            if let Some(captures) = EDGE_RE.captures(trimmed) {
                outcome.edges.push(FlowEdge::between(
                    captures[1].to_string(),
                    captures[2].to_string(),
                    None,
                ));
                matched = true;
            }
        }

        if !matched {
            outcome.warnings.push(format!(
                "Line {line_number}: no node or connection pattern matched; skipped"
            ));
        }
    }

    if outcome.nodes.is_empty() {
        outcome
            .warnings
            .push("No parseable nodes were found".to_string());
    }

    outcome
}

fn is_skipped_line(trimmed: &str) -> bool {
    trimmed.starts_with("flowchart")
        || trimmed.starts_with("graph")
        || trimmed.starts_with("%%")
        || trimmed.starts_with("classDef")
        || trimmed.starts_with("class ")
        || trimmed.starts_with("style ")
        || trimmed.starts_with("linkStyle")
}

fn has_node_signature(line: &str) -> bool {
    line.contains('[') || line.contains('{') || line.contains('(')
}

fn parse_node_line(line: &str) -> Option<FlowNode> {
    let captures = NODE_RE.captures(line)?;
    let id = captures[1].to_string();
    let label = captures[3].trim().to_string();

    // Shape comes from the raw line, not the captured delimiters: the
    // stadium pair takes precedence over the parens it contains.
    let kind = if line.contains("([") {
        if label.to_lowercase().contains("start") {
            NodeKind::Start
        } else {
            NodeKind::End
        }
    } else if line.contains('{') {
        NodeKind::Decision
    } else {
        NodeKind::Process
    };

    Some(FlowNode::new(id, label, kind))
}
