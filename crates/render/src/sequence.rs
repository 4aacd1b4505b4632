//! Mermaid sequence diagram: one participant per resource, messages in
//! source-reading order, optional navigation lines per participant.

use crate::util::{base_name, display_path, fnv1a_64};
use callmap_graph::{CallGraph, CallGraphNode, DiagnosticSink, NodeId, Position};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

pub struct SequenceRenderer<'a> {
    graph: &'a CallGraph,
    sink: Arc<dyn DiagnosticSink>,
    workspace_root: Option<PathBuf>,
    with_links: bool,
}

struct Participant {
    id: String,
    label: String,
    path: String,
    position: Position,
}

struct SequenceState {
    participants: Vec<Participant>,
    by_path: HashMap<String, usize>,
    messages: Vec<String>,
    seen: HashSet<(usize, usize, String)>,
    visited: HashSet<NodeId>,
}

impl<'a> SequenceRenderer<'a> {
    #[must_use]
    pub fn new(graph: &'a CallGraph, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            graph,
            sink,
            workspace_root: None,
            with_links: false,
        }
    }

    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Emit one `click` navigation line per participant.
    #[must_use]
    pub fn with_links(mut self) -> Self {
        self.with_links = true;
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut state = SequenceState {
            participants: Vec::new(),
            by_path: HashMap::new(),
            messages: Vec::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
        };
        self.visit(self.graph.root(), &mut state);
        self.sink.note(&format!(
            "sequence: {} participants, {} messages",
            state.participants.len(),
            state.messages.len()
        ));

        let mut out = String::from("sequenceDiagram\n");
        for participant in &state.participants {
            out.push_str(&format!(
                "    participant {} as {}\n",
                participant.id, participant.label
            ));
        }
        for message in &state.messages {
            out.push_str(message);
            out.push('\n');
        }
        if self.with_links {
            for participant in &state.participants {
                out.push_str(&format!(
                    "    click {} href \"{}:{}:{}\"\n",
                    participant.id,
                    participant.path,
                    participant.position.line,
                    participant.position.column
                ));
            }
        }
        out
    }

    fn visit(&self, id: NodeId, state: &mut SequenceState) {
        if !state.visited.insert(id) {
            return;
        }
        let node = self.graph.node(id);
        let from = self.participant(node, state);

        // Messages leave a node in reading order: by the callee's recorded
        // call-site position where one exists, discovery order otherwise.
        let mut ordered = node.children.clone();
        ordered.sort_by(|&a, &b| {
            match (
                self.graph.node(a).first_call_site,
                self.graph.node(b).first_call_site,
            ) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            }
        });

        for child in ordered {
            let child_node = self.graph.node(child);
            let to = self.participant(child_node, state);
            let label = escape(&child_node.reference.name);
            if state.seen.insert((from, to, label.clone())) {
                state.messages.push(format!(
                    "    {}->>{}: {label}",
                    state.participants[from].id, state.participants[to].id
                ));
            }
            self.visit(child, state);
        }
    }

    /// Participant index for a node's resource, registering it on first
    /// sight with a stable id and a hash-suffixed display label.
    fn participant(&self, node: &CallGraphNode, state: &mut SequenceState) -> usize {
        let path = display_path(&node.reference.resource, self.workspace_root.as_deref());
        if let Some(&index) = state.by_path.get(&path) {
            return index;
        }
        let index = state.participants.len();
        let suffix = fnv1a_64(&path) & 0xffff;
        state.participants.push(Participant {
            id: format!("participant_{index}"),
            label: format!("{}#{suffix:04x}", base_name(&node.reference.resource)),
            path: path.clone(),
            position: node.reference.range.start,
        });
        state.by_path.insert(path, index);
        index
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
