//! # Callmap Graph
//!
//! Turns a single seed symbol into a bounded, deduplicated call graph.
//!
//! ## Architecture
//!
//! ```text
//! SymbolReference (seed)
//!     │
//!     ├──> GraphBuilder (two-pass traversal)
//!     │      ├─ Census: per-identity in-degree + first call sites
//!     │      ├─ Materialization: prune, sort, deduplicate, bound depth
//!     │      └─ RelationSource: async caller/callee resolution
//!     │
//!     └──> CallGraph (arena)
//!            ├─ Nodes: symbol references with in-degree / call-site data
//!            └─ Shared subtrees: one node per identity, ids as back edges
//! ```
//!
//! The graph is consumed synchronously by the renderers in `callmap-render`
//! and discarded; nothing here persists.

mod builder;
mod config;
mod error;
mod identity;
mod sink;
mod source;
mod types;

pub use builder::{GraphBuilder, IgnorePredicate};
pub use config::BuildConfig;
pub use error::{GraphError, Result};
pub use identity::{census_key, NodeIdentity};
pub use sink::{DiagnosticSink, LogSink, MemorySink};
pub use source::RelationSource;
pub use types::{
    CallGraph, CallGraphNode, CallRelation, Direction, NodeId, Position, Span, SymbolKind,
    SymbolReference,
};
