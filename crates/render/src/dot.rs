//! Graphviz DOT output: box nodes grouped into one cluster per resource,
//! grouped edge statements, left-to-right rank direction.

use crate::util::display_path;
use callmap_graph::{CallGraph, DiagnosticSink, NodeId};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct DotRenderer<'a> {
    graph: &'a CallGraph,
    sink: Arc<dyn DiagnosticSink>,
    workspace_root: Option<PathBuf>,
}

struct DotState {
    body: Vec<String>,
    clusters: Vec<PathBuf>,
    members: HashMap<PathBuf, Vec<String>>,
    visited: HashSet<NodeId>,
    edges: HashSet<(NodeId, NodeId)>,
}

impl<'a> DotRenderer<'a> {
    #[must_use]
    pub fn new(graph: &'a CallGraph, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            graph,
            sink,
            workspace_root: None,
        }
    }

    /// Shorten cluster labels by substituting `${workspace}` for this
    /// prefix.
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut state = DotState {
            body: Vec::new(),
            clusters: Vec::new(),
            members: HashMap::new(),
            visited: HashSet::new(),
            edges: HashSet::new(),
        };
        self.visit(self.graph.root(), &mut state);
        self.sink.note(&format!(
            "dot: {} statements, {} clusters",
            state.body.len(),
            state.clusters.len()
        ));

        let mut out = String::from("digraph {\n");
        out.push_str("node [shape=box]\n");
        out.push_str("nodesep=.05\n");
        out.push_str("rankdir=\"LR\"\n");
        for line in &state.body {
            out.push_str(line);
            out.push('\n');
        }
        for resource in &state.clusters {
            out.push_str(&format!("subgraph \"cluster_{}\" {{\n", resource.display()));
            out.push_str(&format!("label=\"{}\"\n", self.cluster_label(resource)));
            out.push_str(&state.members[resource].join(" "));
            out.push_str("\n}\n");
        }
        out.push_str("}\n");
        out
    }

    /// Preorder walk: one grouped edge statement per first visit of a node
    /// with children, a bare declaration for childless nodes. Repeated
    /// reaches become additional edges, never duplicate statements.
    fn visit(&self, id: NodeId, state: &mut DotState) {
        if !state.visited.insert(id) {
            return;
        }
        self.register(id, state);

        let node = self.graph.node(id);
        let mut attached = Vec::new();
        for &child in &node.children {
            if state.edges.insert((id, child)) {
                attached.push(child);
            }
        }

        if attached.is_empty() {
            state.body.push(self.declaration(id));
        } else {
            let children = attached
                .iter()
                .map(|&child| self.declaration(child))
                .collect::<Vec<_>>()
                .join(" ");
            state
                .body
                .push(format!("{{{}}} -> {{{children}}}", self.declaration(id)));
            for &child in &attached {
                self.visit(child, state);
            }
        }
    }

    fn register(&self, id: NodeId, state: &mut DotState) {
        let resource = self.graph.node(id).reference.resource.clone();
        if !state.members.contains_key(&resource) {
            state.clusters.push(resource.clone());
        }
        let name = self.node_name(id);
        state.members.entry(resource).or_default().push(name);
    }

    /// Stable node name: `"<resource>#<name>@<line>:<column>"`.
    fn node_name(&self, id: NodeId) -> String {
        let reference = &self.graph.node(id).reference;
        format!(
            "\"{}#{}@{}:{}\"",
            reference.resource.display(),
            reference.name,
            reference.range.start.line,
            reference.range.start.column
        )
    }

    fn declaration(&self, id: NodeId) -> String {
        let reference = &self.graph.node(id).reference;
        format!("{} [label=\"{}\"]", self.node_name(id), escape(&reference.name))
    }

    fn cluster_label(&self, resource: &Path) -> String {
        match &self.workspace_root {
            Some(root) if resource.starts_with(root) => {
                format!(
                    "${{workspace}}/{}",
                    display_path(resource, Some(root.as_path()))
                )
            }
            _ => resource.display().to_string(),
        }
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
