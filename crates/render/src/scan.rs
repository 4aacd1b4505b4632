//! Lexical scan of workspace files for class/interface declarations.
//!
//! This is the structural half of the class diagram: no parsing beyond two
//! regular expressions and brace counting, which is enough to pick up
//! declarations the call graph never reaches.

use crate::class::ClassKind;
use crate::error::Result;
use callmap_graph::DiagnosticSink;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// File selection for the structural scan, owned by the host configuration
/// store. Patterns are matched against paths relative to the scan root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScanConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.ts".to_string()],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/*.spec.ts".to_string(),
                "**/*.test.ts".to_string(),
            ],
        }
    }
}

/// One declaration found by the scan, keyed externally by qualified name.
#[derive(Debug, Clone)]
pub struct ScannedClass {
    pub kind: ClassKind,
    pub namespace: Option<String>,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub resource: PathBuf,
}

struct NamespaceSpan {
    name: String,
    start: usize,
    end: usize,
}

pub struct StructuralScanner {
    include: GlobSet,
    exclude: GlobSet,
    declaration: Regex,
    namespace: Regex,
    sink: Arc<dyn DiagnosticSink>,
}

impl StructuralScanner {
    pub fn new(config: &ScanConfig, sink: Arc<dyn DiagnosticSink>) -> Result<Self> {
        Ok(Self {
            include: build_set(&config.include)?,
            exclude: build_set(&config.exclude)?,
            declaration: Regex::new(
                r"(class|interface)\s+([\w.]+)(?:\s+extends\s+([\w.]+))?(?:\s+implements\s+([\w.,\s]+))?",
            )?,
            namespace: Regex::new(r"namespace\s+([\w.]+)\s*\{")?,
            sink,
        })
    }

    /// Walk `root` and collect declarations from every included file.
    /// Unreadable files are reported to the sink and skipped; the scan
    /// never fails as a whole.
    pub fn scan(&self, root: &Path) -> BTreeMap<String, ScannedClass> {
        let mut classes = BTreeMap::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    self.sink.note(&format!("scan: skipping entry: {error}"));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or_else(|_| entry.path());
            if !self.include.is_match(relative) || self.exclude.is_match(relative) {
                continue;
            }
            match std::fs::read_to_string(entry.path()) {
                Ok(text) => self.scan_text(&text, entry.path(), &mut classes),
                Err(error) => {
                    self.sink.note(&format!(
                        "scan: skipping {}: {error}",
                        entry.path().display()
                    ));
                }
            }
        }
        classes
    }

    /// Collect declarations from one file's text.
    pub fn scan_text(
        &self,
        text: &str,
        resource: &Path,
        classes: &mut BTreeMap<String, ScannedClass>,
    ) {
        let namespaces = self.namespace_spans(text);
        for capture in self.declaration.captures_iter(text) {
            let offset = capture.get(0).map_or(0, |m| m.start());
            let kind = if &capture[1] == "interface" {
                ClassKind::Interface
            } else {
                ClassKind::Class
            };
            let name = capture[2].to_string();
            let super_class = capture.get(3).map(|m| m.as_str().to_string());
            let interfaces: Vec<String> = capture
                .get(4)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            let namespace = namespaces
                .iter()
                .find(|ns| offset > ns.start && offset < ns.end)
                .map(|ns| ns.name.clone());
            let qualified = match &namespace {
                Some(ns) => format!("{ns}.{name}"),
                None => name,
            };

            classes.insert(
                qualified,
                ScannedClass {
                    kind,
                    namespace,
                    super_class,
                    interfaces,
                    resource: resource.to_path_buf(),
                },
            );
        }
    }

    /// Locate `namespace X {` openings and their closing braces so that
    /// declarations inside get qualified names. Nested namespaces resolve
    /// to the first (outermost) span that contains them.
    fn namespace_spans(&self, text: &str) -> Vec<NamespaceSpan> {
        let mut spans = Vec::new();
        for capture in self.namespace.captures_iter(text) {
            let opening = match capture.get(0) {
                Some(m) => m,
                None => continue,
            };
            let mut depth = 1usize;
            let mut end = opening.end();
            for (i, byte) in text.bytes().enumerate().skip(opening.end()) {
                match byte {
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = i;
                            break;
                        }
                    }
                    _ => {}
                }
            }
            spans.push(NamespaceSpan {
                name: capture[1].to_string(),
                start: opening.start(),
                end,
            });
        }
        spans
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
