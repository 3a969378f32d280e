use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use fp_core::{Command, FlowNode, NodeKind};
use fp_dialect::format_node_line;
use regex::Regex;
use serde::Serialize;

use crate::ContentType;
use crate::generate;

/// Result of one extraction attempt. `fallback` is true when no pattern
/// matched and a default stood in, so callers can assert on precision
/// instead of inferring it from the output shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extracted {
    pub value: String,
    pub fallback: bool,
}

impl Extracted {
    fn found(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fallback: false,
        }
    }

    fn fell_back(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fallback: true,
        }
    }
}

/// A classified instruction: the command to apply, which rule produced it,
/// and which extractions had to fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub command: Command,
    pub rule: &'static str,
    pub fallbacks: Vec<&'static str>,
}

struct Rule {
    name: &'static str,
    applies: fn(&str, ContentType) -> bool,
    build: fn(&str, ContentType) -> (Command, Vec<&'static str>),
}

// Ordered rule table, first match wins. The final rule always applies, which
// makes the fall-through-to-default behavior explicit and testable.
static RULES: &[Rule] = &[
    Rule {
        name: "add-node",
        applies: |text, _| {
            let lower = text.to_lowercase();
            lower.contains("add") && lower.contains("node")
        },
        build: build_add_node,
    },
    Rule {
        name: "remove-node",
        applies: |text, _| {
            let lower = text.to_lowercase();
            lower.contains("remove") && lower.contains("node")
        },
        build: build_remove_node,
    },
    Rule {
        name: "connect",
        applies: |text, _| {
            let lower = text.to_lowercase();
            lower.contains("connect") || lower.contains("link")
        },
        build: build_connection,
    },
    Rule {
        name: "generate",
        applies: |_, content_type| {
            matches!(content_type, ContentType::Code | ContentType::Story)
        },
        build: |text, content_type| {
            (
                Command::GenerateDiagram {
                    mermaid_syntax: generate(text, content_type),
                },
                Vec::new(),
            )
        },
    },
    Rule {
        name: "default",
        applies: |_, _| true,
        build: build_default,
    },
];

/// Classifies a free-text instruction into a [`Command`]. Never rejects:
/// anything that matches no specific rule becomes a generic process node.
#[must_use]
pub fn interpret(text: &str, content_type: ContentType) -> Interpretation {
    for rule in RULES {
        if (rule.applies)(text, content_type) {
            let (command, fallbacks) = (rule.build)(text, content_type);
            return Interpretation {
                command,
                rule: rule.name,
                fallbacks,
            };
        }
    }
    unreachable!("rule table ends with an always-applicable default");
}

static LABEL_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"(?i)add.*node.*["']([^"']+)["']"#).expect("label pattern 1"),
        Regex::new(r#"(?i)add.*["']([^"']+)["'].*node"#).expect("label pattern 2"),
        Regex::new(r#"(?i)node.*["']([^"']+)["']"#).expect("label pattern 3"),
    ]
});

static KEYWORD_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)add|node|create").expect("keyword strip pattern"));

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("quoted pattern"));

static QUOTED_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["'].*["']([^"']+)["']"#).expect("pair pattern"));

/// Pulls a node label out of an add-node instruction: three quoted-substring
/// patterns in order, then keyword stripping as the fallback.
#[must_use]
pub fn extract_node_label(text: &str) -> Extracted {
    for pattern in LABEL_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            return Extracted::found(captures[1].to_string());
        }
    }
    Extracted::fell_back(KEYWORD_STRIP.replace_all(text, "").trim().to_string())
}

/// Lowercases, maps every non-alphanumeric character to `_`, and keeps at
/// most 20 characters.
#[must_use]
pub fn slug(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(20)
        .collect()
}

/// Derives a node identifier from label text: slug plus a base-36 millisecond
/// timestamp suffix for uniqueness.
#[must_use]
pub fn unique_node_id(text: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}_{}", slug(text), to_base36(millis))
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}

/// Keyword scan for the node's semantic role.
#[must_use]
pub fn infer_kind(text: &str) -> NodeKind {
    let lower = text.to_lowercase();
    if lower.contains("start") || lower.contains("begin") {
        NodeKind::Start
    } else if lower.contains("end") || lower.contains("finish") {
        NodeKind::End
    } else if lower.contains("decision") || lower.contains("choice") || lower.contains("if") {
        NodeKind::Decision
    } else {
        NodeKind::Process
    }
}

fn build_add_node(text: &str, _content_type: ContentType) -> (Command, Vec<&'static str>) {
    let label = extract_node_label(text);
    let id = unique_node_id(&label.value);
    let kind = infer_kind(text);
    let node = FlowNode::new(id.clone(), label.value.clone(), kind);

    let mut fallbacks = Vec::new();
    if label.fallback {
        fallbacks.push("label");
    }

    (
        Command::AddNode {
            mermaid_syntax: format_node_line(&node),
            id,
            text: label.value,
            kind,
            connect_from: None,
            connect_to: None,
        },
        fallbacks,
    )
}

fn build_remove_node(text: &str, _content_type: ContentType) -> (Command, Vec<&'static str>) {
    let id = match QUOTED.captures(text) {
        Some(captures) => Extracted::found(unique_node_id(&captures[1])),
        None => Extracted::fell_back("unknown_node"),
    };

    let mut fallbacks = Vec::new();
    if id.fallback {
        fallbacks.push("node-id");
    }

    (Command::RemoveNode { id: id.value }, fallbacks)
}

fn build_connection(text: &str, _content_type: ContentType) -> (Command, Vec<&'static str>) {
    let (source, target) = match QUOTED_PAIR.captures(text) {
        Some(captures) => (
            Extracted::found(unique_node_id(&captures[1])),
            Extracted::found(unique_node_id(&captures[2])),
        ),
        None => (
            Extracted::fell_back("node1"),
            Extracted::fell_back("node2"),
        ),
    };

    let mut fallbacks = Vec::new();
    if source.fallback {
        fallbacks.push("source-id");
    }
    if target.fallback {
        fallbacks.push("target-id");
    }

    (
        Command::AddConnection {
            mermaid_syntax: format!("{} --> {}", source.value, target.value),
            source_id: source.value,
            target_id: target.value,
            label: None,
        },
        fallbacks,
    )
}

fn build_default(text: &str, _content_type: ContentType) -> (Command, Vec<&'static str>) {
    let label: String = text.chars().take(50).collect();
    let id = unique_node_id(&label);
    let node = FlowNode::new(id.clone(), label.clone(), NodeKind::Process);

    (
        Command::AddNode {
            mermaid_syntax: format_node_line(&node),
            id,
            text: label,
            kind: NodeKind::Process,
            connect_from: None,
            connect_to: None,
        },
        vec!["label"],
    )
}
