use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Zero-based source position (line, column).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Half-open source range, start inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Kind of a callable or declared unit, as reported by the relation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Method,
    Constructor,
    Class,
    Interface,
    Property,
    Other,
}

/// Identifies one callable unit: display name, owning resource and its
/// declaration range. Supplied by the relation source, never synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolReference {
    pub name: String,
    pub kind: SymbolKind,
    pub resource: PathBuf,
    pub range: Span,
}

impl SymbolReference {
    pub fn new(name: impl Into<String>, kind: SymbolKind, resource: impl Into<PathBuf>, range: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            resource: resource.into(),
            range,
        }
    }
}

/// Which side of the call relation to explore from the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// One relation returned by the relation source: the symbol on the other
/// end of the edge plus the call-site ranges where the edge occurs.
#[derive(Debug, Clone)]
pub struct CallRelation {
    pub call_sites: Vec<Span>,
    pub other: SymbolReference,
}

impl CallRelation {
    /// Start of the first recorded call site, if any.
    #[must_use]
    pub fn first_site(&self) -> Option<Position> {
        self.call_sites.first().map(|span| span.start)
    }
}

/// Handle into a [`CallGraph`] arena. Two parents sharing a child hold the
/// same `NodeId`; id equality is the "same instance" guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One vertex of the built graph.
#[derive(Debug)]
pub struct CallGraphNode {
    pub reference: SymbolReference,
    /// Child order is part of the contract: source-reading order for
    /// outgoing builds, relation-source order for incoming builds.
    pub children: Vec<NodeId>,
    /// Census in-degree; `Some` only when the census pass ran.
    pub in_degree: Option<u32>,
    /// Earliest call-site position recorded for this node during the census.
    pub first_call_site: Option<Position>,
}

/// The built call graph: an arena of nodes reachable from `root`.
///
/// The graph is a DAG as observed from the root. A node reached on several
/// paths is stored once and referenced by id from each parent, so cyclic
/// underlying relations collapse into back references instead of recursion.
#[derive(Debug)]
pub struct CallGraph {
    nodes: Vec<CallGraphNode>,
    root: NodeId,
    direction: Direction,
}

impl CallGraph {
    #[must_use]
    pub fn new(seed: SymbolReference, direction: Direction) -> Self {
        let root = CallGraphNode {
            reference: seed,
            children: Vec::new(),
            in_degree: None,
            first_call_site: None,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            direction,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &CallGraphNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CallGraphNode {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Materialize a new node and attach it under `parent`.
    pub fn add_child(&mut self, parent: NodeId, reference: SymbolReference) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CallGraphNode {
            reference,
            children: Vec::new(),
            in_degree: None,
            first_call_site: None,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Attach an already materialized node under a second parent. The
    /// child's subtree is shared, not copied.
    pub fn attach_existing(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    /// Ids in materialization order (root first).
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str) -> SymbolReference {
        SymbolReference::new(name, SymbolKind::Function, "src/lib.rs", Span::default())
    }

    #[test]
    fn shared_child_is_one_node() {
        let mut graph = CallGraph::new(reference("root"), Direction::Outgoing);
        let a = graph.add_child(graph.root(), reference("a"));
        let b = graph.add_child(graph.root(), reference("b"));
        let shared = graph.add_child(a, reference("shared"));
        graph.attach_existing(b, shared);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.node(a).children, vec![shared]);
        assert_eq!(graph.node(b).children, vec![shared]);
    }

    #[test]
    fn child_order_is_insertion_order() {
        let mut graph = CallGraph::new(reference("root"), Direction::Incoming);
        let first = graph.add_child(graph.root(), reference("first"));
        let second = graph.add_child(graph.root(), reference("second"));
        assert_eq!(graph.node(graph.root()).children, vec![first, second]);
    }
}
