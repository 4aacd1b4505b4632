//! Mermaid class diagram: call-graph classes merged with structural scan
//! results and optionally enriched through the symbol outline.

use crate::infer::infer_owner;
use crate::outline::{find_symbol, OutlineProvider};
use crate::scan::ScannedClass;
use callmap_graph::{CallGraph, DiagnosticSink, NodeId, Span, SymbolKind};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
}

/// Render-time record for one inferred or scanned class. Built fresh per
/// render call and discarded with the diagram text.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub kind: ClassKind,
    pub methods: Vec<String>,
    pub properties: Vec<String>,
    pub namespace: Option<String>,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub resource: Option<PathBuf>,
    pub declaration: Option<Span>,
}

impl ClassInfo {
    fn for_resource(resource: PathBuf) -> Self {
        Self {
            kind: ClassKind::Class,
            methods: Vec::new(),
            properties: Vec::new(),
            namespace: None,
            super_class: None,
            interfaces: Vec::new(),
            resource: Some(resource),
            declaration: None,
        }
    }
}

struct Collection {
    // First-seen order; the index map only accelerates lookups.
    classes: Vec<(String, ClassInfo)>,
    index: HashMap<String, usize>,
    relationships: Vec<String>,
    relationship_seen: HashSet<String>,
    called: HashMap<String, BTreeSet<String>>,
    visited: HashSet<NodeId>,
}

impl Collection {
    fn new() -> Self {
        Self {
            classes: Vec::new(),
            index: HashMap::new(),
            relationships: Vec::new(),
            relationship_seen: HashSet::new(),
            called: HashMap::new(),
            visited: HashSet::new(),
        }
    }

    fn ensure_class(&mut self, name: &str, resource: PathBuf) -> &mut ClassInfo {
        let index = match self.index.get(name) {
            Some(&index) => index,
            None => {
                self.classes
                    .push((name.to_string(), ClassInfo::for_resource(resource)));
                let index = self.classes.len() - 1;
                self.index.insert(name.to_string(), index);
                index
            }
        };
        &mut self.classes[index].1
    }

    fn push_relationship(&mut self, line: String) {
        if self.relationship_seen.insert(line.clone()) {
            self.relationships.push(line);
        }
    }
}

pub struct ClassDiagramRenderer {
    sink: Arc<dyn DiagnosticSink>,
    outline: Option<Arc<dyn OutlineProvider>>,
}

impl ClassDiagramRenderer {
    #[must_use]
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            sink,
            outline: None,
        }
    }

    /// Enable the enrichment pass for scanner-derived classes.
    #[must_use]
    pub fn with_outline(mut self, provider: Arc<dyn OutlineProvider>) -> Self {
        self.outline = Some(provider);
        self
    }

    /// Render the diagram from the built graph plus structural scan
    /// results. Outline failures are logged and skipped, so this always
    /// produces a diagram.
    pub async fn render(
        &self,
        graph: &CallGraph,
        scanned: &BTreeMap<String, ScannedClass>,
    ) -> String {
        let mut collection = Collection::new();
        self.collect(graph, graph.root(), &mut collection);

        // Keep only methods some *other* class actually invokes in this
        // graph; a class nothing calls into lists no methods at all.
        for (name, info) in &mut collection.classes {
            match collection.called.get(name) {
                Some(called) => info.methods.retain(|method| called.contains(method)),
                None => info.methods.clear(),
            }
        }

        self.merge_scanned(scanned, &mut collection).await;

        let mut blocks = Vec::new();
        for (name, info) in &collection.classes {
            let mut block = format!("    class {name} {{\n");
            for method in &info.methods {
                block.push_str(&format!("        +{method}()\n"));
            }
            for property in &info.properties {
                block.push_str(&format!("        +{property}\n"));
            }
            block.push_str("    }");
            blocks.push(block);
            if info.kind == ClassKind::Interface {
                blocks.push(format!("    {name} : <<interface>>"));
            }
        }

        let relationships: Vec<String> = collection
            .relationships
            .iter()
            .map(|line| format!("    {line}"))
            .collect();

        format!(
            "classDiagram\n{}\n{}\n",
            blocks.join("\n"),
            relationships.join("\n")
        )
    }

    /// Bucket every graph node under its inferred class and record `uses`
    /// edges plus called methods between distinct classes.
    fn collect(&self, graph: &CallGraph, id: NodeId, collection: &mut Collection) {
        if !collection.visited.insert(id) {
            return;
        }
        let node = graph.node(id);
        let owner = infer_owner(&node.reference.name, &node.reference.resource);
        let info = collection.ensure_class(&owner.class_name, node.reference.resource.clone());
        if let Some(method) = &owner.method_name {
            if !info.methods.contains(method) {
                info.methods.push(method.clone());
            }
        }

        for &child in &node.children {
            let child_node = graph.node(child);
            let child_owner =
                infer_owner(&child_node.reference.name, &child_node.reference.resource);
            if child_owner.class_name != owner.class_name {
                collection.push_relationship(format!(
                    "{} ..> {} : uses",
                    owner.class_name, child_owner.class_name
                ));
                if let Some(method) = &child_owner.method_name {
                    collection
                        .called
                        .entry(child_owner.class_name.clone())
                        .or_default()
                        .insert(method.clone());
                }
            }
            self.collect(graph, child, collection);
        }
    }

    /// Add scanner-derived classes not already covered by the call graph,
    /// then the inheritance/implementation edges for every scanned class.
    async fn merge_scanned(
        &self,
        scanned: &BTreeMap<String, ScannedClass>,
        collection: &mut Collection,
    ) {
        for (qualified, class) in scanned {
            if !collection.index.contains_key(qualified) {
                let mut info = ClassInfo {
                    kind: class.kind,
                    methods: Vec::new(),
                    properties: Vec::new(),
                    namespace: class.namespace.clone(),
                    super_class: class.super_class.clone(),
                    interfaces: class.interfaces.clone(),
                    resource: Some(class.resource.clone()),
                    declaration: None,
                };
                self.enrich(qualified, class, &mut info).await;
                collection
                    .index
                    .insert(qualified.clone(), collection.classes.len());
                collection.classes.push((qualified.clone(), info));
            }

            if let Some(parent) = &class.super_class {
                collection.push_relationship(format!("{parent} <|-- {qualified}"));
            }
            for interface in &class.interfaces {
                collection.push_relationship(format!("{interface} <|.. {qualified}"));
            }
        }
    }

    /// Recover full membership and the declaration range from the symbol
    /// outline, where a provider is available.
    async fn enrich(&self, qualified: &str, class: &ScannedClass, info: &mut ClassInfo) {
        let provider = match &self.outline {
            Some(provider) => provider,
            None => return,
        };
        let symbols = match provider.outline(&class.resource).await {
            Ok(symbols) => symbols,
            Err(error) => {
                self.sink.note(&format!(
                    "outline: skipping {}: {error}",
                    class.resource.display()
                ));
                return;
            }
        };

        let simple = qualified.rsplit('.').next().unwrap_or(qualified);
        let symbol = find_symbol(&symbols, simple, SymbolKind::Class)
            .or_else(|| find_symbol(&symbols, simple, SymbolKind::Interface));
        if let Some(symbol) = symbol {
            info.declaration = Some(symbol.range);
            for child in &symbol.children {
                match child.kind {
                    SymbolKind::Method | SymbolKind::Function => {
                        info.methods.push(child.name.clone());
                    }
                    SymbolKind::Property => info.properties.push(child.name.clone()),
                    _ => {}
                }
            }
        }
    }
}
