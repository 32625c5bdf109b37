//! Per-build mutable state: visited set, level counter, navigation maps

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use bramble_core::{DeclId, Use};
use serde::{Deserialize, Serialize};

/// One underlying source use behind an edge, for click-to-inspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeUse {
    pub use_record: Use,
    /// File the call site lives in.
    pub file: PathBuf,
}

/// Label-keyed lookup maps surviving a completed build, answering
/// click-to-navigate and click-to-inspect queries.
#[derive(Debug, Clone, Default)]
pub struct NavigationMaps {
    labels: HashMap<String, DeclId>,
    edge_uses: HashMap<String, Vec<EdgeUse>>,
}

impl NavigationMaps {
    pub fn declaration_for_label(&self, label: &str) -> Option<DeclId> {
        self.labels.get(label).copied()
    }

    pub fn uses_for_edge(&self, source_label: &str, target_label: &str) -> Vec<EdgeUse> {
        self.edge_uses
            .get(&edge_key(source_label, target_label))
            .cloned()
            .unwrap_or_default()
    }

    pub fn uses_for_edge_key(&self, key: &str) -> Vec<EdgeUse> {
        self.edge_uses.get(key).cloned().unwrap_or_default()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.edge_uses.clear();
    }
}

/// Key for the edge-uses map.
pub fn edge_key(source_label: &str, target_label: &str) -> String {
    format!("{source_label}->{target_label}")
}

/// Mutable state exclusively owned by one in-flight build.
#[derive(Debug)]
pub struct BuildTracker {
    visited: HashSet<DeclId>,
    level: u32,
    maps: NavigationMaps,
}

impl Default for BuildTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildTracker {
    pub fn new() -> Self {
        BuildTracker {
            visited: HashSet::new(),
            level: 1,
            maps: NavigationMaps::default(),
        }
    }

    /// Mark a definition as expanded.
    pub fn visit(&mut self, definition: DeclId) {
        self.visited.insert(definition);
    }

    pub fn is_visited(&self, definition: DeclId) -> bool {
        self.visited.contains(&definition)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Current expansion level. The counter is shared across the whole
    /// build, not per branch: sibling call chains draw from one budget.
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn bump_level(&mut self) {
        self.level += 1;
    }

    pub fn record_label(&mut self, label: String, declaration: DeclId) {
        self.maps.labels.insert(label, declaration);
    }

    pub fn record_edge_use(&mut self, source_label: &str, target_label: &str, edge_use: EdgeUse) {
        self.maps
            .edge_uses
            .entry(edge_key(source_label, target_label))
            .or_default()
            .push(edge_use);
    }

    pub fn navigation(&self) -> &NavigationMaps {
        &self.maps
    }

    /// Consume the tracker, keeping only what outlives the build.
    pub fn into_navigation(self) -> NavigationMaps {
        self.maps
    }
}
