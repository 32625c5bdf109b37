//! Runtime configuration for graph construction

use serde::{Deserialize, Serialize};

/// Granularity a declaration is lifted to before becoming a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlFlowMode {
    /// Every function/method is its own node.
    Function,
    /// Calls are attributed to the enclosing class.
    Class,
    /// Calls are attributed to the enclosing namespace.
    Namespace,
}

/// Which hierarchical grouping labels are prepended to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClusteringModes {
    pub project: bool,
    pub namespace: bool,
    pub class: bool,
}

impl ClusteringModes {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        ClusteringModes {
            project: true,
            namespace: true,
            class: true,
        }
    }

    pub fn any(&self) -> bool {
        self.project || self.namespace || self.class
    }
}

/// The full configuration surface, settable at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSettings {
    pub mode: ControlFlowMode,
    pub clustering: ClusteringModes,
    /// Expansion budget for one build; 0 means unlimited.
    pub max_level: u32,
    pub draw_incoming_arcs: bool,
    pub use_folder_name: bool,
    pub use_short_names: bool,
    /// When locked, cursor moves do not rebuild the graph.
    pub locked: bool,
}

impl Default for GraphSettings {
    fn default() -> Self {
        GraphSettings {
            mode: ControlFlowMode::Class,
            clustering: ClusteringModes::none(),
            max_level: 0,
            draw_incoming_arcs: true,
            use_folder_name: true,
            use_short_names: true,
            locked: false,
        }
    }
}
