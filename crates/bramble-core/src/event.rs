//! Events emitted over the course of one graph build
//!
//! The stream is strictly ordered per build: `Cleared`, one `Root`, zero or
//! more `Edge`s, `Done`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphEvent {
    /// Previously emitted graph elements are invalid.
    Cleared,
    /// The build's root node.
    Root {
        containers: Vec<String>,
        label: String,
    },
    /// A discovered call edge. Missing endpoint nodes are implied.
    Edge {
        source_containers: Vec<String>,
        source_label: String,
        target_containers: Vec<String>,
        target_label: String,
    },
    /// The build finished; no further events until the next build.
    Done,
}
