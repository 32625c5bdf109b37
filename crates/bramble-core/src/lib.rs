//! Bramble Core — semantic-index data model, project lookup, and the
//! event-stream graph accumulator shared by the engine and its hosts

pub mod builder;
pub mod error;
pub mod event;
pub mod graph;
pub mod index;
pub mod model;
pub mod project;
pub mod settings;


#[cfg(test)]
pub mod test_utils;

pub use builder::{span, IndexBuilder};
pub use error::IndexError;
pub use event::GraphEvent;
pub use graph::{FlowEdge, FlowGraph, FlowNode};
pub use index::SemanticIndex;
pub use model::{
    Context, ContextId, ContextKind, DeclId, DeclKind, Declaration, Position, Range, Use,
};
pub use project::{Project, ProjectMap};
pub use settings::{ClusteringModes, ControlFlowMode, GraphSettings};
