//! Bramble Engine — incremental call-graph construction around the
//! declaration under the cursor
//!
//! The engine consumes a read-only [`bramble_core::SemanticIndex`], resolves
//! the cursor to a root definition, and expands a depth-bounded, cycle-safe
//! call graph from it, emitting [`bramble_core::GraphEvent`]s as it goes.

pub mod collector;
pub mod labels;
pub mod orchestrator;
pub mod resolver;
pub mod tracker;
pub mod traversal;

pub use collector::{collect_incoming, IncomingCall};
pub use labels::{LabelPolicy, GLOBAL_NAMESPACE, SEPARATOR};
pub use orchestrator::{FlowService, Selection};
pub use resolver::{resolve_root, RootResolution};
pub use tracker::{edge_key, BuildTracker, EdgeUse, NavigationMaps};
pub use traversal::Traversal;
