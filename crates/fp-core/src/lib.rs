#![forbid(unsafe_code)]

//! Core data model for FlowPilot: flowchart nodes and edges, structured
//! mutation commands, and the session-lifetime graph store.

use serde::{Deserialize, Serialize};

/// Semantic role of a flowchart node. Controls both the rendered shape and
/// the delimiter pair used in the diagram text dialect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    End,
    #[default]
    Process,
    Decision,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Process => "process",
            Self::Decision => "decision",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub kind: NodeKind,
}

impl FlowNode {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }
}

/// A directed connection between two node ids. The edge id is derived from
/// its endpoints, so connecting the same pair twice yields duplicate ids.
/// Endpoints are not checked against the node list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FlowEdge {
    #[must_use]
    pub fn between(
        source: impl Into<String>,
        target: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{source}-{target}"),
            source,
            target,
            label,
        }
    }
}

/// One atomic mutation derived from free text, in the wire shape used by the
/// classification protocol (`{"action": "addNode", ...}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    AddNode {
        id: String,
        text: String,
        #[serde(default)]
        kind: NodeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connect_from: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connect_to: Option<String>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        mermaid_syntax: String,
    },
    #[serde(rename_all = "camelCase")]
    RemoveNode { id: String },
    #[serde(rename_all = "camelCase")]
    AddConnection {
        source_id: String,
        target_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        mermaid_syntax: String,
    },
    #[serde(rename_all = "camelCase")]
    RemoveConnection { source_id: String, target_id: String },
    #[serde(rename_all = "camelCase")]
    GenerateDiagram { mermaid_syntax: String },
}

impl Command {
    /// Dialect text carried by the command, if any.
    #[must_use]
    pub fn mermaid_syntax(&self) -> Option<&str> {
        match self {
            Self::AddNode { mermaid_syntax, .. }
            | Self::AddConnection { mermaid_syntax, .. }
            | Self::GenerateDiagram { mermaid_syntax } => {
                (!mermaid_syntax.is_empty()).then_some(mermaid_syntax.as_str())
            }
            Self::RemoveNode { .. } | Self::RemoveConnection { .. } => None,
        }
    }
}

/// Point-in-time copy of the graph, handed to rendering collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

/// In-memory holder of the current node and edge lists. Lives for one
/// interactive session; nothing is persisted.
///
/// Nodes and edges are ordered sequences. Duplicate node ids coexist rather
/// than overwrite, and edges may reference ids that no node carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStore {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_graph(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Self {
        Self { nodes, edges }
    }

    #[must_use]
    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Replaces both lists wholesale. Callers feeding parser output through
    /// this are expected to skip the call when the parse recovered nothing.
    pub fn replace(&mut self, nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) {
        self.nodes = nodes;
        self.edges = edges;
    }

    /// Applies one structural command and reports whether the store changed.
    ///
    /// `GenerateDiagram` is not applied here: its payload must go through
    /// the dialect parser first, so the session layer handles it and this
    /// returns `false`.
    pub fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::AddNode {
                id,
                text,
                kind,
                connect_from,
                connect_to,
                ..
            } => {
                self.nodes.push(FlowNode::new(id.clone(), text.clone(), *kind));
                if let Some(from) = connect_from {
                    self.edges.push(FlowEdge::between(from.clone(), id.clone(), None));
                }
                if let Some(to) = connect_to {
                    self.edges.push(FlowEdge::between(id.clone(), to.clone(), None));
                }
                true
            }
            Command::RemoveNode { id } => {
                let nodes_before = self.nodes.len();
                let edges_before = self.edges.len();
                self.nodes.retain(|node| node.id != *id);
                self.edges
                    .retain(|edge| edge.source != *id && edge.target != *id);
                self.nodes.len() != nodes_before || self.edges.len() != edges_before
            }
            Command::AddConnection {
                source_id,
                target_id,
                label,
                ..
            } => {
                self.edges.push(FlowEdge::between(
                    source_id.clone(),
                    target_id.clone(),
                    label.clone(),
                ));
                true
            }
            Command::RemoveConnection {
                source_id,
                target_id,
            } => {
                let before = self.edges.len();
                self.edges
                    .retain(|edge| !(edge.source == *source_id && edge.target == *target_id));
                self.edges.len() != before
            }
            Command::GenerateDiagram { .. } => false,
        }
    }
}
