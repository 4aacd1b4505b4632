use crate::types::{Position, SymbolReference};
use std::path::PathBuf;

/// The tuple that decides whether two symbol references denote the same
/// node: name, kind, resource and range start. Only the range start takes
/// part: re-declarations starting at the same position are definitionally
/// the same callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    name: String,
    kind: crate::types::SymbolKind,
    resource: PathBuf,
    start: Position,
}

impl NodeIdentity {
    #[must_use]
    pub fn of(reference: &SymbolReference) -> Self {
        Self {
            name: reference.name.clone(),
            kind: reference.kind,
            resource: reference.resource.clone(),
            start: reference.range.start,
        }
    }
}

/// String key for the census maps (in-degree counts, first call sites):
/// `name|resource|line:column`. No normalization beyond what the relation
/// source already guarantees.
#[must_use]
pub fn census_key(reference: &SymbolReference) -> String {
    format!(
        "{}|{}|{}:{}",
        reference.name,
        reference.resource.display(),
        reference.range.start.line,
        reference.range.start.column
    )
}
