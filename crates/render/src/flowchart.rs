//! Mermaid flowchart: one box per distinct identity, one edge per
//! parent-child relation. Edges back into visited boxes keep recursive
//! chains finite.

use crate::util::{display_path, fnv1a_64};
use callmap_graph::{CallGraph, CallGraphNode, DiagnosticSink, NodeId};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

pub struct ControlFlowRenderer<'a> {
    graph: &'a CallGraph,
    sink: Arc<dyn DiagnosticSink>,
    workspace_root: Option<PathBuf>,
}

struct FlowState {
    nodes: Vec<String>,
    edges: Vec<String>,
    edge_seen: HashSet<String>,
    visited: HashSet<String>,
}

impl<'a> ControlFlowRenderer<'a> {
    #[must_use]
    pub fn new(graph: &'a CallGraph, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            graph,
            sink,
            workspace_root: None,
        }
    }

    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut state = FlowState {
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_seen: HashSet::new(),
            visited: HashSet::new(),
        };
        self.visit(self.graph.root(), None, &mut state);
        self.sink.note(&format!(
            "flowchart: {} boxes, {} edges",
            state.nodes.len(),
            state.edges.len()
        ));

        let mut out = String::from("flowchart TD\n");
        out.push_str(&state.nodes.join("\n"));
        if !state.nodes.is_empty() && !state.edges.is_empty() {
            out.push('\n');
        }
        out.push_str(&state.edges.join("\n"));
        out
    }

    fn visit(&self, id: NodeId, parent: Option<&str>, state: &mut FlowState) {
        let node = self.graph.node(id);
        let flow_id = self.flow_id(node);

        if !state.visited.insert(flow_id.clone()) {
            // Already boxed: just close the edge into the existing box.
            if let Some(parent) = parent {
                push_edge(parent, &flow_id, state);
            }
            return;
        }

        let label = format!(
            "{}<br><small>{}</small>",
            escape(&node.reference.name),
            display_path(&node.reference.resource, self.workspace_root.as_deref())
        );
        state.nodes.push(format!("  {flow_id}[\"{label}\"]"));
        if let Some(parent) = parent {
            push_edge(parent, &flow_id, state);
        }

        for &child in &node.children {
            self.visit(child, Some(&flow_id), state);
        }
    }

    /// Deterministic short id from the node's name and resource; the same
    /// symbol gets the same box across runs.
    fn flow_id(&self, node: &CallGraphNode) -> String {
        let combined = format!(
            "{}_{}",
            node.reference.name,
            node.reference.resource.display()
        );
        format!("node_{:x}", fnv1a_64(&combined) as u32)
    }
}

fn push_edge(from: &str, to: &str, state: &mut FlowState) {
    let edge = format!("  {from} --> {to}");
    if state.edge_seen.insert(edge.clone()) {
        state.edges.push(edge);
    }
}

fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}
