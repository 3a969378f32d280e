use std::sync::LazyLock;

use fp_core::{FlowEdge, FlowNode, NodeKind};
use fp_dialect::{HEADER, format_edge_line, format_node_line};
use regex::Regex;

use crate::ContentType;

static FUNC_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:def|function)\s+(\w+)").expect("function name pattern"));

const LABEL_PREVIEW_CHARS: usize = 30;
const MAX_SENTENCES: usize = 5;

/// Turns an arbitrary block of text or source code into diagram text, one
/// node per detected unit, in the dialect consumed by [`fp_dialect::parse`].
#[must_use]
pub fn generate(content: &str, content_type: ContentType) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    match content_type {
        ContentType::Code => generate_from_code(content, &mut out),
        ContentType::General | ContentType::Story => generate_from_narrative(content, &mut out),
    }

    out
}

/// Code branch: one process node per function definition, one decision node
/// per conditional line, numbered by a shared counter. No edges between them;
/// the scan recovers structure, not control flow.
fn generate_from_code(content: &str, out: &mut String) {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let mut counter = 1;

    for line in lines.iter().filter(|l| is_function_line(l)) {
        let name = match FUNC_NAME.captures(line) {
            Some(captures) => captures[1].to_string(),
            None => format!("func{counter}"),
        };
        let node = FlowNode::new(format!("node{counter}"), name, NodeKind::Process);
        push_statement(out, &format_node_line(&node));
        counter += 1;
    }

    for line in lines.iter().filter(|l| is_conditional_line(l)) {
        let preview: String = line.trim().chars().take(LABEL_PREVIEW_CHARS).collect();
        let node = FlowNode::new(
            format!("decision{counter}"),
            format!("{preview}..."),
            NodeKind::Decision,
        );
        push_statement(out, &format_node_line(&node));
        counter += 1;
    }
}

/// Narrative branch: the first five sentences become process nodes chained
/// in encounter order.
fn generate_from_narrative(content: &str, out: &mut String) {
    let sentences = content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_SENTENCES);

    for (index, sentence) in sentences.enumerate() {
        let preview: String = sentence.chars().take(LABEL_PREVIEW_CHARS).collect();
        let node = FlowNode::new(format!("node{}", index + 1), preview, NodeKind::Process);
        push_statement(out, &format_node_line(&node));

        if index > 0 {
            let edge = FlowEdge::between(format!("node{index}"), format!("node{}", index + 1), None);
            push_statement(out, &format_edge_line(&edge));
        }
    }
}

fn is_function_line(line: &str) -> bool {
    line.contains("def ") || line.contains("function")
}

fn is_conditional_line(line: &str) -> bool {
    line.contains("if ") || line.contains("else")
}

fn push_statement(out: &mut String, statement: &str) {
    out.push_str("    ");
    out.push_str(statement);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_dialect::parse;

    #[test]
    fn code_yields_function_and_decision_nodes_with_no_edges() {
        let diagram = generate("if x > 0: ...\ndef foo(): ...", ContentType::Code);
        let outcome = parse(&diagram);

        assert_eq!(outcome.nodes.len(), 2);
        assert!(outcome.edges.is_empty());

        let func = &outcome.nodes[0];
        assert_eq!(func.label, "foo");
        assert_eq!(func.kind, NodeKind::Process);

        let decision = &outcome.nodes[1];
        assert_eq!(decision.kind, NodeKind::Decision);
        assert!(decision.label.starts_with("if x > 0"));
        assert!(decision.label.ends_with("..."));
    }

    #[test]
    fn unnamed_function_gets_counter_placeholder() {
        let diagram = generate("function = compose(a, b)", ContentType::Code);
        let outcome = parse(&diagram);
        assert_eq!(outcome.nodes.len(), 1);
        assert_eq!(outcome.nodes[0].label, "func1");
    }

    #[test]
    fn narrative_chains_sentences_in_order() {
        let diagram = generate(
            "Receive the order. Charge the card. Ship the package.",
            ContentType::Story,
        );
        let outcome = parse(&diagram);

        assert_eq!(outcome.nodes.len(), 3);
        assert_eq!(outcome.nodes[0].label, "Receive the order");
        assert_eq!(outcome.edges.len(), 2);
        assert_eq!(outcome.edges[0].source, "node1");
        assert_eq!(outcome.edges[0].target, "node2");
        assert_eq!(outcome.edges[1].source, "node2");
        assert_eq!(outcome.edges[1].target, "node3");
    }

    #[test]
    fn narrative_caps_at_five_sentences() {
        let diagram = generate(
            "One. Two. Three. Four. Five. Six. Seven.",
            ContentType::Story,
        );
        let outcome = parse(&diagram);
        assert_eq!(outcome.nodes.len(), 5);
        assert_eq!(outcome.edges.len(), 4);
    }

    #[test]
    fn long_sentences_are_truncated_to_a_preview() {
        let diagram = generate(&format!("{}.", "word ".repeat(20)), ContentType::General);
        let outcome = parse(&diagram);
        assert_eq!(outcome.nodes.len(), 1);
        assert!(outcome.nodes[0].label.chars().count() <= 30);
    }

    #[test]
    fn empty_content_yields_a_bare_header() {
        assert_eq!(generate("", ContentType::Story), "flowchart TD\n");
        assert_eq!(generate("", ContentType::Code), "flowchart TD\n");
    }
}
