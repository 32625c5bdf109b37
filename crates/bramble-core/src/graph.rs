//! Graph accumulator folding the event stream into petgraph storage
//!
//! Consumers that want a concrete graph rather than a stream (layout,
//! export, assertions in tests) feed each [`GraphEvent`] through
//! [`FlowGraph::apply`].

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::GraphEvent;

/// A rendered-graph node: its display label plus cluster path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub label: String,
    pub containers: Vec<String>,
    /// Whether this node was the build's root.
    pub is_root: bool,
}

/// A call edge between two labeled nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub source_label: String,
    pub target_label: String,
}

/// The accumulated call graph for one completed (or in-flight) build.
#[derive(Debug, Default)]
pub struct FlowGraph {
    inner: StableDiGraph<FlowNode, FlowEdge>,
    labels: HashMap<String, NodeIndex>,
    done: bool,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the graph.
    pub fn apply(&mut self, event: &GraphEvent) {
        match event {
            GraphEvent::Cleared => self.clear(),
            GraphEvent::Root { containers, label } => {
                let idx = self.intern(label, containers);
                if let Some(node) = self.inner.node_weight_mut(idx) {
                    node.is_root = true;
                }
            }
            GraphEvent::Edge {
                source_containers,
                source_label,
                target_containers,
                target_label,
            } => {
                let source = self.intern(source_label, source_containers);
                let target = self.intern(target_label, target_containers);
                let duplicate = self
                    .inner
                    .edges_directed(source, Direction::Outgoing)
                    .any(|e| e.target() == target);
                if !duplicate {
                    self.inner.add_edge(
                        source,
                        target,
                        FlowEdge {
                            source_label: source_label.clone(),
                            target_label: target_label.clone(),
                        },
                    );
                }
            }
            GraphEvent::Done => {
                self.done = true;
                debug!(
                    "graph complete: {} nodes, {} edges",
                    self.node_count(),
                    self.edge_count()
                );
            }
        }
    }

    fn intern(&mut self, label: &str, containers: &[String]) -> NodeIndex {
        if let Some(idx) = self.labels.get(label) {
            return *idx;
        }
        let idx = self.inner.add_node(FlowNode {
            label: label.to_string(),
            containers: containers.to_vec(),
            is_root: false,
        });
        self.labels.insert(label.to_string(), idx);
        idx
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.labels.clear();
        self.done = false;
    }

    /// Whether a `Done` event has been applied since the last clear.
    pub fn is_complete(&self) -> bool {
        self.done
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn node(&self, label: &str) -> Option<&FlowNode> {
        self.labels
            .get(label)
            .and_then(|idx| self.inner.node_weight(*idx))
    }

    pub fn root(&self) -> Option<&FlowNode> {
        self.inner.node_weights().find(|n| n.is_root)
    }

    /// Labels of the nodes a node calls into.
    pub fn callees_of(&self, label: &str) -> Vec<String> {
        let Some(idx) = self.labels.get(label) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(*idx, Direction::Outgoing)
            .filter_map(|e| self.inner.node_weight(e.target()))
            .map(|n| n.label.clone())
            .collect()
    }

    /// Labels of the nodes calling into a node.
    pub fn callers_of(&self, label: &str) -> Vec<String> {
        let Some(idx) = self.labels.get(label) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(*idx, Direction::Incoming)
            .filter_map(|e| self.inner.node_weight(e.source()))
            .map(|n| n.label.clone())
            .collect()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.inner.node_weights()
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &FlowEdge> {
        self.inner.edge_weights()
    }
}
