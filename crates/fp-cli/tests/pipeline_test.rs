//! Integration tests for the FlowPilot pipeline.
//!
//! These tests verify the end-to-end flow from instruction interpretation
//! through the graph store to formatted diagram text and back.

use fp_core::{Command, GraphStore, NodeKind};
use fp_dialect::{format, parse};
use fp_intent::{ContentType, generate, interpret};

/// Interpreting an add-node instruction, applying it, and formatting the
/// store produces a diagram the parser can recover.
#[test]
fn add_node_instruction_flows_through_store_and_dialect() {
    let interpretation = interpret("add a node called 'Review'", ContentType::General);

    let mut store = GraphStore::new();
    assert!(store.apply(&interpretation.command));
    assert_eq!(store.nodes().len(), 1);
    assert_eq!(store.nodes()[0].label, "Review");

    let diagram = format(store.nodes(), store.edges());
    assert!(diagram.starts_with("flowchart TD"));

    let outcome = parse(&diagram);
    assert_eq!(outcome.nodes.len(), 1);
    assert_eq!(outcome.nodes[0].label, "Review");
    assert_eq!(outcome.nodes[0].id, store.nodes()[0].id);
}

/// A connect instruction adds an edge whose endpoints survive a
/// format/parse cycle.
#[test]
fn connect_instruction_round_trips_through_diagram_text() {
    let interpretation = interpret("connect 'draft' to 'publish'", ContentType::General);

    let mut store = GraphStore::new();
    assert!(store.apply(&interpretation.command));
    assert_eq!(store.edges().len(), 1);
    let source = store.edges()[0].source.clone();
    let target = store.edges()[0].target.clone();
    assert!(source.starts_with("draft_"));
    assert!(target.starts_with("publish_"));

    let outcome = parse(&format(store.nodes(), store.edges()));
    assert_eq!(outcome.edges.len(), 1);
    assert_eq!(outcome.edges[0].source, source);
    assert_eq!(outcome.edges[0].target, target);
}

/// Generated narrative diagrams parse back into a connected chain.
#[test]
fn narrative_generation_yields_a_parseable_chain() {
    let content = "The user signs up. The account is verified. A welcome email goes out.";
    let diagram = generate(content, ContentType::Story);

    let outcome = parse(&diagram);
    assert_eq!(outcome.nodes.len(), 3);
    assert_eq!(outcome.edges.len(), 2);
    assert!(
        outcome.warnings.is_empty(),
        "Parse warnings: {:?}",
        outcome.warnings
    );

    // The chain is ordered: node1 -> node2 -> node3.
    assert_eq!(outcome.edges[0].source, "node1");
    assert_eq!(outcome.edges[0].target, "node2");
    assert_eq!(outcome.edges[1].source, "node2");
    assert_eq!(outcome.edges[1].target, "node3");
}

/// Code generation finds function and conditional lines and produces
/// diagram text with inferred shapes.
#[test]
fn code_generation_marks_decisions() {
    let content = "def load():\n    pass\n\nif ready:\n    go()\n";
    let diagram = generate(content, ContentType::Code);

    let outcome = parse(&diagram);
    assert_eq!(outcome.nodes.len(), 2);
    assert!(
        outcome
            .nodes
            .iter()
            .any(|n| n.kind == NodeKind::Decision),
        "Expected a decision node, got {:?}",
        outcome.nodes
    );
}

/// Removing a node also drops the edges that referenced it.
#[test]
fn remove_node_drops_referencing_edges() {
    let mut store = GraphStore::new();
    store.apply(&Command::AddNode {
        id: "a".to_string(),
        text: "A".to_string(),
        kind: NodeKind::Start,
        connect_from: None,
        connect_to: None,
        mermaid_syntax: String::new(),
    });
    store.apply(&Command::AddNode {
        id: "b".to_string(),
        text: "B".to_string(),
        kind: NodeKind::Process,
        connect_from: Some("a".to_string()),
        connect_to: None,
        mermaid_syntax: String::new(),
    });
    assert_eq!(store.edges().len(), 1);

    assert!(store.apply(&Command::RemoveNode {
        id: "b".to_string()
    }));
    assert_eq!(store.nodes().len(), 1);
    assert!(store.edges().is_empty());
}

/// An instruction matching no rule falls back to a process node whose
/// label is drawn from the instruction text itself.
#[test]
fn unmatched_instruction_becomes_a_default_node() {
    let interpretation = interpret("something entirely unexpected", ContentType::General);

    match &interpretation.command {
        Command::AddNode { text, kind, .. } => {
            assert_eq!(text, "something entirely unexpected");
            assert_eq!(*kind, NodeKind::Process);
        }
        other => panic!("Expected AddNode, got {other:?}"),
    }
    assert!(interpretation.fallbacks.contains(&"label"));
}

/// The command wire format matches the shape external tooling expects.
#[test]
fn command_wire_format_uses_camel_case_action_tags() {
    let interpretation = interpret("connect 'a' to 'b'", ContentType::General);
    let value = serde_json::to_value(&interpretation.command).unwrap();

    assert_eq!(value["action"], "addConnection");
    let source = value["sourceId"].as_str().unwrap();
    let target = value["targetId"].as_str().unwrap();
    assert!(source.starts_with("a_"));
    assert!(target.starts_with("b_"));
    assert_eq!(
        value["mermaidSyntax"].as_str().unwrap(),
        format!("{source} --> {target}")
    );
}
