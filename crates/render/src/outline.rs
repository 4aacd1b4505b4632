use crate::error::Result;
use async_trait::async_trait;
use callmap_graph::{Span, SymbolKind};
use std::path::Path;

/// One entry of a file's structural symbol outline.
#[derive(Debug, Clone)]
pub struct OutlineSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub range: Span,
    pub selection_range: Span,
    pub children: Vec<OutlineSymbol>,
}

/// Optional collaborator supplying a structural symbol outline per file.
/// Consumed only by the class-diagram enrichment pass.
#[async_trait]
pub trait OutlineProvider: Send + Sync {
    async fn outline(&self, resource: &Path) -> Result<Vec<OutlineSymbol>>;
}

/// Depth-first search for a symbol with the given name and kind.
pub(crate) fn find_symbol<'a>(
    symbols: &'a [OutlineSymbol],
    name: &str,
    kind: SymbolKind,
) -> Option<&'a OutlineSymbol> {
    for symbol in symbols {
        if symbol.name == name && symbol.kind == kind {
            return Some(symbol);
        }
        if let Some(found) = find_symbol(&symbol.children, name, kind) {
            return Some(found);
        }
    }
    None
}
