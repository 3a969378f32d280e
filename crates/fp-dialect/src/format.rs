use fp_core::{FlowEdge, FlowNode, NodeKind};

/// Header line for every emitted diagram. The formatter always declares a
/// top-down flow; the parser accepts any direction token and ignores it.
pub const HEADER: &str = "flowchart TD";

const CLASS_DEFS: [(&str, &str); 3] = [
    ("terminal", "fill:#d1fae5,stroke:#059669"),
    ("process", "fill:#dbeafe,stroke:#2563eb"),
    ("decision", "fill:#fef3c7,stroke:#d97706"),
];

/// Strips the dialect's delimiter characters from label text so the emitted
/// line stays machine-readable. Stripping, not escaping, is the canonical
/// policy: the line scanner in [`crate::parse`] keys shape inference off
/// these characters and cannot distinguish escaped ones.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '{' | '}' | '(' | ')'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Emits a single node statement: id wrapped in the delimiter pair chosen by
/// kind. Start and end nodes share the rounded stadium pair.
#[must_use]
pub fn format_node_line(node: &FlowNode) -> String {
    let label = sanitize_label(&node.label);
    match node.kind {
        NodeKind::Start | NodeKind::End => format!("{}([{label}])", node.id),
        NodeKind::Decision => format!("{}{{{label}}}", node.id),
        NodeKind::Process => format!("{}[{label}]", node.id),
    }
}

/// Emits a single connection statement, carrying a `|label|` annotation when
/// the edge has one.
#[must_use]
pub fn format_edge_line(edge: &FlowEdge) -> String {
    match edge.label.as_deref() {
        Some(label) if !label.trim().is_empty() => {
            let cleaned: String = label.chars().filter(|c| *c != '|').collect();
            format!("{} -->|{}| {}", edge.source, cleaned.trim(), edge.target)
        }
        _ => format!("{} --> {}", edge.source, edge.target),
    }
}

/// Serializes a graph into the diagram text dialect: header, one line per
/// node, one line per edge, then a cosmetic class block grouping node ids by
/// kind. The class block is ignored on the way back in.
#[must_use]
pub fn format(nodes: &[FlowNode], edges: &[FlowEdge]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for node in nodes {
        out.push_str("    ");
        out.push_str(&format_node_line(node));
        out.push('\n');
    }

    for edge in edges {
        out.push_str("    ");
        out.push_str(&format_edge_line(edge));
        out.push('\n');
    }

    if !nodes.is_empty() {
        out.push_str(&format_class_block(nodes));
    }

    out
}

fn format_class_block(nodes: &[FlowNode]) -> String {
    let mut out = String::new();

    for (class_name, style) in CLASS_DEFS {
        let members: Vec<&str> = nodes
            .iter()
            .filter(|node| class_for(node.kind) == class_name)
            .map(|node| node.id.as_str())
            .collect();
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("    classDef {class_name} {style}\n"));
        out.push_str(&format!("    class {} {class_name}\n", members.join(",")));
    }

    out
}

const fn class_for(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Start | NodeKind::End => "terminal",
        NodeKind::Process => "process",
        NodeKind::Decision => "decision",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_lines_use_kind_delimiters() {
        let start = FlowNode::new("s", "Begin", NodeKind::Start);
        let end = FlowNode::new("e", "Done", NodeKind::End);
        let process = FlowNode::new("p", "Work", NodeKind::Process);
        let decision = FlowNode::new("d", "Valid?", NodeKind::Decision);

        assert_eq!(format_node_line(&start), "s([Begin])");
        assert_eq!(format_node_line(&end), "e([Done])");
        assert_eq!(format_node_line(&process), "p[Work]");
        assert_eq!(format_node_line(&decision), "d{Valid?}");
    }

    #[test]
    fn delimiter_characters_are_stripped_from_labels() {
        let node = FlowNode::new("n", "call foo(x) [fast] {maybe}", NodeKind::Process);
        assert_eq!(format_node_line(&node), "n[call foox fast maybe]");
    }

    #[test]
    fn edge_line_carries_optional_label() {
        let plain = FlowEdge::between("a", "b", None);
        let labeled = FlowEdge::between("c", "d", Some("yes".to_string()));
        assert_eq!(format_edge_line(&plain), "a --> b");
        assert_eq!(format_edge_line(&labeled), "c -->|yes| d");
    }

    #[test]
    fn format_emits_header_nodes_edges_and_class_block() {
        let nodes = vec![
            FlowNode::new("a", "Start", NodeKind::Start),
            FlowNode::new("b", "Work", NodeKind::Process),
        ];
        let edges = vec![FlowEdge::between("a", "b", None)];

        let text = format(&nodes, &edges);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "flowchart TD");
        assert_eq!(lines[1], "    a([Start])");
        assert_eq!(lines[2], "    b[Work]");
        assert_eq!(lines[3], "    a --> b");
        assert!(text.contains("classDef terminal"));
        assert!(text.contains("class a terminal"));
        assert!(text.contains("class b process"));
        assert!(!text.contains("classDef decision"));
    }

    #[test]
    fn empty_graph_formats_to_bare_header() {
        assert_eq!(format(&[], &[]), "flowchart TD\n");
    }
}
