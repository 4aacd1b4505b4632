//! Tests for the two-pass graph builder.

use async_trait::async_trait;
use callmap_graph::{
    BuildConfig, CallGraph, CallRelation, DiagnosticSink, Direction, GraphBuilder, GraphError,
    IgnorePredicate, MemorySink, NodeId, Position, RelationSource, Result, Span, SymbolKind,
    SymbolReference,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory relation source keyed by symbol name.
#[derive(Default)]
struct StaticSource {
    outgoing: HashMap<String, Vec<CallRelation>>,
    incoming: HashMap<String, Vec<CallRelation>>,
    fail_on: Option<String>,
}

impl StaticSource {
    fn calls(mut self, from: &str, relations: Vec<CallRelation>) -> Self {
        self.outgoing.insert(from.to_string(), relations);
        self
    }

    fn callers(mut self, of: &str, relations: Vec<CallRelation>) -> Self {
        self.incoming.insert(of.to_string(), relations);
        self
    }

    fn failing_at(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }
}

#[async_trait]
impl RelationSource for StaticSource {
    async fn relations(
        &self,
        reference: &SymbolReference,
        direction: Direction,
    ) -> Result<Vec<CallRelation>> {
        if self.fail_on.as_deref() == Some(reference.name.as_str()) {
            return Err(GraphError::Source {
                symbol: reference.name.clone(),
                message: "synthetic failure".to_string(),
            });
        }
        let map = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        Ok(map.get(&reference.name).cloned().unwrap_or_default())
    }
}

fn symbol(name: &str, file: &str, line: u32) -> SymbolReference {
    SymbolReference::new(
        name,
        SymbolKind::Function,
        file,
        Span::new(Position::new(line, 0), Position::new(line + 10, 0)),
    )
}

fn call_at(line: u32, column: u32, to: SymbolReference) -> CallRelation {
    CallRelation {
        call_sites: vec![Span::new(
            Position::new(line, column),
            Position::new(line, column + to.name.len() as u32),
        )],
        other: to,
    }
}

fn no_ignore() -> IgnorePredicate {
    Arc::new(|_| false)
}

fn builder(source: StaticSource, config: BuildConfig) -> GraphBuilder {
    GraphBuilder::new(Arc::new(source), config, Arc::new(MemorySink::new()))
}

fn names(graph: &CallGraph) -> Vec<String> {
    graph
        .ids()
        .map(|id| graph.node(id).reference.name.clone())
        .collect()
}

fn child_names(graph: &CallGraph, id: NodeId) -> Vec<String> {
    graph
        .node(id)
        .children
        .iter()
        .map(|&child| graph.node(child).reference.name.clone())
        .collect()
}

fn config(max_depth: u32, in_degree_threshold: u32) -> BuildConfig {
    BuildConfig {
        max_depth,
        in_degree_threshold,
    }
}

#[tokio::test]
async fn outgoing_children_sorted_by_call_site() {
    let source = StaticSource::default().calls(
        "entry",
        vec![
            call_at(9, 4, symbol("late", "src/a.ts", 50)),
            call_at(3, 2, symbol("early", "src/a.ts", 20)),
            call_at(3, 10, symbol("mid", "src/a.ts", 30)),
        ],
    );
    let graph = builder(source, config(0, 5))
        .build(symbol("entry", "src/a.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    assert_eq!(child_names(&graph, graph.root()), ["early", "mid", "late"]);
}

#[tokio::test]
async fn incoming_preserves_relation_source_order() {
    let source = StaticSource::default().callers(
        "entry",
        vec![
            call_at(9, 4, symbol("zeta", "src/a.ts", 50)),
            call_at(3, 2, symbol("alpha", "src/a.ts", 20)),
        ],
    );
    let graph = builder(source, config(0, 5))
        .build(symbol("entry", "src/a.ts", 1), Direction::Incoming, no_ignore())
        .await
        .unwrap();

    assert_eq!(child_names(&graph, graph.root()), ["zeta", "alpha"]);
}

#[tokio::test]
async fn max_depth_bounds_every_path() {
    let source = StaticSource::default()
        .calls("a", vec![call_at(1, 0, symbol("b", "src/a.ts", 10))])
        .calls("b", vec![call_at(1, 0, symbol("c", "src/a.ts", 20))])
        .calls("c", vec![call_at(1, 0, symbol("d", "src/a.ts", 30))]);
    let graph = builder(source, config(2, 5))
        .build(symbol("a", "src/a.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    // Two edges at most: a -> b -> c. `c` is materialized but not expanded.
    assert_eq!(names(&graph), ["a", "b", "c"]);
    let c = graph.node(graph.root()).children[0];
    let c = graph.node(c).children[0];
    assert!(graph.node(c).children.is_empty());
}

#[tokio::test]
async fn cyclic_relations_terminate_with_back_edge() {
    let source = StaticSource::default()
        .calls("a", vec![call_at(1, 0, symbol("b", "src/a.ts", 10))])
        .calls("b", vec![call_at(1, 0, symbol("a", "src/a.ts", 1))]);
    let graph = builder(source, config(0, 0))
        .build(symbol("a", "src/a.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    assert_eq!(graph.node_count(), 2);
    let b = graph.node(graph.root()).children[0];
    // The cycle collapses into a reference back to the materialized root.
    assert_eq!(graph.node(b).children, vec![graph.root()]);
}

#[tokio::test]
async fn node_reached_via_two_parents_is_shared() {
    let source = StaticSource::default()
        .calls(
            "root",
            vec![
                call_at(1, 0, symbol("a", "src/a.ts", 10)),
                call_at(2, 0, symbol("b", "src/b.ts", 10)),
            ],
        )
        .calls("a", vec![call_at(3, 0, symbol("shared", "src/util.ts", 5))])
        .calls("b", vec![call_at(4, 0, symbol("shared", "src/util.ts", 5))]);
    let graph = builder(source, config(0, 5))
        .build(symbol("root", "src/main.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    let root_children = graph.node(graph.root()).children.clone();
    let shared_under_a = graph.node(root_children[0]).children[0];
    let shared_under_b = graph.node(root_children[1]).children[0];
    assert_eq!(shared_under_a, shared_under_b);
    assert_eq!(graph.node_count(), 4);
}

#[tokio::test]
async fn duplicate_relations_attach_the_same_node_twice() {
    let source = StaticSource::default().calls(
        "entry",
        vec![
            call_at(1, 0, symbol("helper", "src/a.ts", 10)),
            call_at(7, 0, symbol("helper", "src/a.ts", 10)),
        ],
    );
    let graph = builder(source, config(0, 5))
        .build(symbol("entry", "src/a.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    let children = &graph.node(graph.root()).children;
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], children[1]);
    assert_eq!(graph.node_count(), 2);
}

#[tokio::test]
async fn high_in_degree_node_is_pruned_with_its_subtree() {
    // entry calls b and c; both call d; d calls leaf. With threshold 1 the
    // census sees d twice, so d and everything below it disappear.
    let d = || symbol("d", "src/z.ts", 5);
    let source = StaticSource::default()
        .calls(
            "entry",
            vec![
                call_at(1, 0, symbol("b", "src/y.ts", 10)),
                call_at(2, 0, symbol("c", "src/y.ts", 30)),
            ],
        )
        .calls("b", vec![call_at(11, 0, d())])
        .calls("c", vec![call_at(31, 0, d())])
        .calls("d", vec![call_at(6, 0, symbol("leaf", "src/z.ts", 40))]);

    let sink = Arc::new(MemorySink::new());
    let graph = GraphBuilder::new(
        Arc::new(source),
        config(0, 1),
        Arc::clone(&sink) as Arc<dyn DiagnosticSink>,
    )
    .build(symbol("entry", "src/x.ts", 1), Direction::Outgoing, no_ignore())
    .await
    .unwrap();

    let all = names(&graph);
    assert!(!all.contains(&"d".to_string()));
    assert!(!all.contains(&"leaf".to_string()));
    assert!(sink.contains("high in-degree"));
}

#[tokio::test]
async fn unique_callee_survives_the_same_threshold() {
    let source = StaticSource::default()
        .calls(
            "entry",
            vec![
                call_at(1, 0, symbol("b", "src/y.ts", 10)),
                call_at(2, 0, symbol("c", "src/y.ts", 30)),
            ],
        )
        .calls("b", vec![call_at(11, 0, symbol("d", "src/z.ts", 5))]);
    let graph = builder(source, config(0, 1))
        .build(symbol("entry", "src/x.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    assert!(names(&graph).contains(&"d".to_string()));
    let b = graph.node(graph.root()).children[0];
    let d = graph.node(b).children[0];
    assert_eq!(graph.node(d).in_degree, Some(1));
}

#[tokio::test]
async fn incoming_builds_never_prune_on_in_degree() {
    let source = StaticSource::default()
        .callers(
            "entry",
            vec![
                call_at(1, 0, symbol("caller_a", "src/a.ts", 10)),
                call_at(2, 0, symbol("caller_b", "src/b.ts", 10)),
            ],
        )
        .callers("caller_a", vec![call_at(3, 0, symbol("main", "src/m.ts", 1))])
        .callers("caller_b", vec![call_at(4, 0, symbol("main", "src/m.ts", 1))]);
    let graph = builder(source, config(0, 1))
        .build(symbol("entry", "src/e.ts", 1), Direction::Incoming, no_ignore())
        .await
        .unwrap();

    // `main` reaches the graph through two callers and stays; no census ran.
    assert!(names(&graph).contains(&"main".to_string()));
    assert!(graph.ids().all(|id| graph.node(id).in_degree.is_none()));
}

#[tokio::test]
async fn threshold_zero_skips_the_census_entirely() {
    let source = StaticSource::default().calls(
        "entry",
        vec![call_at(1, 0, symbol("helper", "src/a.ts", 10))],
    );
    let graph = builder(source, config(0, 0))
        .build(symbol("entry", "src/a.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    assert!(graph.ids().all(|id| graph.node(id).in_degree.is_none()));
    assert!(graph
        .ids()
        .all(|id| graph.node(id).first_call_site.is_none()));
}

#[tokio::test]
async fn ignore_predicate_drops_the_unexpanded_subtree() {
    let source = StaticSource::default()
        .calls(
            "entry",
            vec![
                call_at(1, 0, symbol("keep", "src/a.ts", 10)),
                call_at(2, 0, symbol("vendored", "deps/x.ts", 10)),
            ],
        )
        .calls("vendored", vec![call_at(3, 0, symbol("inner", "deps/x.ts", 30))]);
    let ignore: IgnorePredicate = Arc::new(|r| r.resource.starts_with("deps"));
    let graph = builder(source, config(0, 5))
        .build(symbol("entry", "src/a.ts", 1), Direction::Outgoing, ignore)
        .await
        .unwrap();

    assert_eq!(names(&graph), ["entry", "keep"]);
}

#[tokio::test]
async fn relation_source_failure_aborts_the_build() {
    let source = StaticSource::default()
        .calls("entry", vec![call_at(1, 0, symbol("broken", "src/a.ts", 10))])
        .failing_at("broken");
    let result = builder(source, config(0, 0))
        .build(symbol("entry", "src/a.ts", 1), Direction::Outgoing, no_ignore())
        .await;

    match result {
        Err(GraphError::Source { symbol, .. }) => assert_eq!(symbol, "broken"),
        other => panic!("expected source error, got {other:?}"),
    }
}

#[tokio::test]
async fn first_call_site_keeps_the_earliest_recording() {
    // The census walks entry's relations in order: helper is first recorded
    // at line 5, the later reach through wrapper must not overwrite it.
    let source = StaticSource::default()
        .calls(
            "entry",
            vec![
                call_at(5, 2, symbol("helper", "src/h.ts", 1)),
                call_at(8, 0, symbol("wrapper", "src/w.ts", 1)),
            ],
        )
        .calls("wrapper", vec![call_at(2, 0, symbol("helper", "src/h.ts", 1))]);
    let graph = builder(source, config(0, 5))
        .build(symbol("entry", "src/e.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    let helper = graph
        .ids()
        .find(|&id| graph.node(id).reference.name == "helper")
        .unwrap();
    assert_eq!(
        graph.node(helper).first_call_site,
        Some(Position::new(5, 2))
    );
}

#[tokio::test]
async fn root_records_zero_in_degree_when_census_runs() {
    let source = StaticSource::default();
    let graph = builder(source, config(0, 5))
        .build(symbol("entry", "src/a.ts", 1), Direction::Outgoing, no_ignore())
        .await
        .unwrap();

    assert_eq!(graph.node(graph.root()).in_degree, Some(0));
}
