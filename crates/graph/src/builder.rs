use crate::config::BuildConfig;
use crate::error::{GraphError, Result};
use crate::identity::{census_key, NodeIdentity};
use crate::sink::DiagnosticSink;
use crate::source::RelationSource;
use crate::types::{CallGraph, Direction, NodeId, Position, SymbolReference};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

/// Synchronous drop predicate: `true` removes the symbol and its entire
/// unexpanded subtree from the build.
pub type IgnorePredicate = Arc<dyn Fn(&SymbolReference) -> bool + Send + Sync>;

type BoxedExpansion = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Builds a bounded, deduplicated call graph from a seed symbol.
///
/// For outgoing builds with a positive in-degree threshold the build runs
/// two passes: a census that counts references per identity, then the
/// materialization that prunes, sorts and attaches nodes. Everything else
/// is a single materialization pass.
pub struct GraphBuilder {
    source: Arc<dyn RelationSource>,
    config: BuildConfig,
    sink: Arc<dyn DiagnosticSink>,
}

/// Census results: reference counts and first call sites, keyed by the
/// census string key.
#[derive(Debug, Default)]
struct Census {
    in_degrees: HashMap<String, u32>,
    first_sites: HashMap<String, Position>,
}

struct CensusState {
    census: Census,
    visited: HashSet<NodeIdentity>,
}

struct CensusCtx {
    source: Arc<dyn RelationSource>,
    sink: Arc<dyn DiagnosticSink>,
    ignore: IgnorePredicate,
    max_depth: u32,
    state: Mutex<CensusState>,
}

struct ExpandState {
    graph: CallGraph,
    materialized: HashMap<NodeIdentity, NodeId>,
}

struct ExpandCtx {
    source: Arc<dyn RelationSource>,
    sink: Arc<dyn DiagnosticSink>,
    ignore: IgnorePredicate,
    direction: Direction,
    config: BuildConfig,
    census: Census,
    census_ran: bool,
    state: Mutex<ExpandState>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(
        source: Arc<dyn RelationSource>,
        config: BuildConfig,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            source,
            config,
            sink,
        }
    }

    /// Build the graph reachable from `seed` in `direction`.
    ///
    /// Fails with the first relation-source error; no partial graph is
    /// returned. Dropping the returned future abandons the build: expansion
    /// tasks are cancelled at their next suspension point and any results
    /// already in flight are discarded.
    pub async fn build(
        &self,
        seed: SymbolReference,
        direction: Direction,
        ignore: IgnorePredicate,
    ) -> Result<CallGraph> {
        // The census pass exists only for bounded outgoing builds; the
        // branch lives here, not inside the recursion.
        let census_ran = direction == Direction::Outgoing && self.config.in_degree_threshold > 0;

        let census = if census_ran {
            self.run_census(&seed, Arc::clone(&ignore)).await?
        } else {
            Census::default()
        };

        let mut graph = CallGraph::new(seed.clone(), direction);
        let root = graph.root();
        if census_ran {
            graph.node_mut(root).in_degree = Some(0);
        }

        let mut materialized = HashMap::new();
        materialized.insert(NodeIdentity::of(&seed), root);

        let ctx = Arc::new(ExpandCtx {
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            ignore,
            direction,
            config: self.config,
            census,
            census_ran,
            state: Mutex::new(ExpandState {
                graph,
                materialized,
            }),
        });

        expand(Arc::clone(&ctx), root, seed, 0).await?;

        let ctx = Arc::into_inner(ctx)
            .ok_or_else(|| GraphError::Task("expansion tasks outlived the build".into()))?;
        let state = ctx
            .state
            .into_inner()
            .map_err(|_| GraphError::Task("build state poisoned".into()))?;
        Ok(state.graph)
    }

    async fn run_census(&self, seed: &SymbolReference, ignore: IgnorePredicate) -> Result<Census> {
        let mut visited = HashSet::new();
        visited.insert(NodeIdentity::of(seed));

        let ctx = Arc::new(CensusCtx {
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            ignore,
            max_depth: self.config.max_depth,
            state: Mutex::new(CensusState {
                census: Census::default(),
                visited,
            }),
        });

        census(Arc::clone(&ctx), seed.clone(), 0).await?;

        let ctx = Arc::into_inner(ctx)
            .ok_or_else(|| GraphError::Task("census tasks outlived the pass".into()))?;
        let state = ctx
            .state
            .into_inner()
            .map_err(|_| GraphError::Task("census state poisoned".into()))?;
        Ok(state.census)
    }
}

/// Pass 1: depth-bounded in-degree census over the outgoing relation.
///
/// The visited guard only suppresses re-expansion; a node reached from two
/// parents is still counted once per discovered edge, which is exactly the
/// in-degree the pruning pass wants.
fn census(ctx: Arc<CensusCtx>, reference: SymbolReference, depth: u32) -> BoxedExpansion {
    Box::pin(async move {
        if ctx.max_depth > 0 && depth >= ctx.max_depth {
            return Ok(());
        }

        let relations = ctx.source.relations(&reference, Direction::Outgoing).await?;

        let mut tasks = JoinSet::new();
        for relation in relations {
            let next = relation.other.clone();
            if (ctx.ignore)(&next) {
                continue;
            }

            let key = census_key(&next);
            let expand_next = {
                let mut state = ctx.state.lock().expect("census state poisoned");
                let count = {
                    let entry = state.census.in_degrees.entry(key.clone()).or_insert(0);
                    *entry += 1;
                    *entry
                };
                ctx.sink
                    .note(&format!("census: in-degree of {} now {count}", next.name));
                if let Some(site) = relation.first_site() {
                    state.census.first_sites.entry(key).or_insert(site);
                }
                state.visited.insert(NodeIdentity::of(&next))
            };

            if expand_next {
                tasks.spawn(census(Arc::clone(&ctx), next, depth + 1));
            }
        }

        join_expansions(&mut tasks).await
    })
}

/// Pass 2: depth-bounded materialization. A node's children are attached in
/// their final order before any of them is expanded; the expansions of
/// siblings then run concurrently and share the materialized map.
fn expand(
    ctx: Arc<ExpandCtx>,
    parent: NodeId,
    reference: SymbolReference,
    depth: u32,
) -> BoxedExpansion {
    Box::pin(async move {
        if ctx.config.max_depth > 0 && depth >= ctx.config.max_depth {
            return Ok(());
        }

        ctx.sink.note(&format!("resolve: {}", reference.name));
        let mut relations = ctx.source.relations(&reference, ctx.direction).await?;

        if ctx.direction == Direction::Outgoing {
            // Source-reading order. Stable sort; relations with no recorded
            // call site keep their relative position.
            relations.sort_by(|a, b| match (a.first_site(), b.first_site()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            });
        }

        let mut tasks = JoinSet::new();
        for relation in relations {
            let next = relation.other;
            if (ctx.ignore)(&next) {
                ctx.sink.note(&format!("ignored: {}", next.name));
                continue;
            }

            let key = census_key(&next);
            let in_degree = ctx.census.in_degrees.get(&key).copied().unwrap_or(0);
            if ctx.direction == Direction::Outgoing
                && ctx.config.in_degree_threshold > 0
                && in_degree > ctx.config.in_degree_threshold
            {
                ctx.sink.note(&format!(
                    "pruned, high in-degree ({in_degree} > {}): {}",
                    ctx.config.in_degree_threshold, next.name
                ));
                continue;
            }

            let identity = NodeIdentity::of(&next);
            let created = {
                // Read-check-then-insert is atomic across sibling
                // expansions; the first writer's node is the shared one.
                let mut state = ctx.state.lock().expect("build state poisoned");
                if let Some(&existing) = state.materialized.get(&identity) {
                    ctx.sink
                        .note(&format!("skip, already materialized: {}", next.name));
                    state.graph.attach_existing(parent, existing);
                    None
                } else {
                    let child = state.graph.add_child(parent, next.clone());
                    let node = state.graph.node_mut(child);
                    if ctx.census_ran {
                        node.in_degree = Some(in_degree);
                    }
                    node.first_call_site = ctx.census.first_sites.get(&key).copied();
                    state.materialized.insert(identity, child);
                    Some(child)
                }
            };

            if let Some(child) = created {
                tasks.spawn(expand(Arc::clone(&ctx), child, next, depth + 1));
            }
        }

        join_expansions(&mut tasks).await
    })
}

async fn join_expansions(tasks: &mut JoinSet<Result<()>>) -> Result<()> {
    while let Some(joined) = tasks.join_next().await {
        joined.map_err(|e| GraphError::Task(e.to_string()))??;
    }
    Ok(())
}
