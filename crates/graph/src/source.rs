use crate::error::Result;
use crate::types::{CallRelation, Direction, SymbolReference};
use async_trait::async_trait;

/// External collaborator resolving a symbol's callers or callees.
///
/// A failure for any node is fatal for the build in progress; the builder
/// surfaces it as [`crate::GraphError::Source`] and returns no partial
/// graph.
#[async_trait]
pub trait RelationSource: Send + Sync {
    async fn relations(
        &self,
        reference: &SymbolReference,
        direction: Direction,
    ) -> Result<Vec<CallRelation>>;
}
