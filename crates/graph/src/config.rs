use serde::{Deserialize, Serialize};

/// Build bounds, owned by the host configuration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Maximum number of edges on any root-to-leaf path. `0` = unbounded.
    pub max_depth: u32,
    /// Prune outgoing-build nodes whose census in-degree exceeds this.
    /// `0` disables pruning and skips the census pass entirely.
    pub in_degree_threshold: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            in_degree_threshold: 5,
        }
    }
}
