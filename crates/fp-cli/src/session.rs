//! Interactive session: read instructions line by line, mutate the graph,
//! and print the diagram after each change.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use fp_core::{Command, GraphStore};
use fp_dialect::{format, parse};
use fp_intent::{ContentType, interpret};
use tracing::{debug, warn};

pub fn run(content_type: ContentType) -> Result<()> {
    let stdin = io::stdin();
    let mut store = GraphStore::new();

    print_prompt()?;

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let instruction = line.trim();
        if instruction.is_empty() {
            print_prompt()?;
            continue;
        }
        if instruction == "quit" || instruction == "exit" {
            break;
        }

        let interpretation = interpret(instruction, content_type);
        debug!("Matched rule '{}'", interpretation.rule);
        for field in &interpretation.fallbacks {
            warn!("No pattern matched for '{field}'; used fallback value");
        }

        if apply_to_store(&mut store, &interpretation.command) {
            println!("{}", format(store.nodes(), store.edges()));
        } else {
            println!("(no change)");
        }

        print_prompt()?;
    }

    Ok(())
}

/// Apply a command to the store, routing whole-diagram replacement through
/// the reverse parser. Returns true when the graph changed.
pub fn apply_to_store(store: &mut GraphStore, command: &Command) -> bool {
    if let Command::GenerateDiagram { mermaid_syntax } = command {
        let outcome = parse(mermaid_syntax);
        for warning in &outcome.warnings {
            warn!("Parse warning: {warning}");
        }
        if outcome.nodes.is_empty() {
            warn!("Generated diagram produced no nodes; keeping current graph");
            return false;
        }
        store.replace(outcome.nodes, outcome.edges);
        return true;
    }

    store.apply(command)
}

fn print_prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush().context("Failed to flush stdout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::NodeKind;

    #[test]
    fn generate_diagram_replaces_store_contents() {
        let mut store = GraphStore::new();
        store.apply(&Command::AddNode {
            id: "old".to_string(),
            text: "Old".to_string(),
            kind: NodeKind::Process,
            connect_from: None,
            connect_to: None,
            mermaid_syntax: String::new(),
        });

        let changed = apply_to_store(
            &mut store,
            &Command::GenerateDiagram {
                mermaid_syntax: "flowchart TD\n    a([Start])\n    b[Work]\n    a --> b\n"
                    .to_string(),
            },
        );

        assert!(changed);
        assert_eq!(store.nodes().len(), 2);
        assert_eq!(store.edges().len(), 1);
        assert!(store.nodes().iter().all(|n| n.id != "old"));
    }

    #[test]
    fn unparseable_diagram_leaves_store_untouched() {
        let mut store = GraphStore::new();
        store.apply(&Command::AddNode {
            id: "keep".to_string(),
            text: "Keep".to_string(),
            kind: NodeKind::Process,
            connect_from: None,
            connect_to: None,
            mermaid_syntax: String::new(),
        });

        let changed = apply_to_store(
            &mut store,
            &Command::GenerateDiagram {
                mermaid_syntax: "not a diagram at all".to_string(),
            },
        );

        assert!(!changed);
        assert_eq!(store.nodes().len(), 1);
    }

    #[test]
    fn ordinary_commands_pass_through_to_the_store() {
        let mut store = GraphStore::new();
        let changed = apply_to_store(
            &mut store,
            &Command::AddNode {
                id: "a".to_string(),
                text: "A".to_string(),
                kind: NodeKind::Start,
                connect_from: None,
                connect_to: None,
                mermaid_syntax: String::new(),
            },
        );
        assert!(changed);
        assert_eq!(store.nodes().len(), 1);
    }
}
