//! Incoming-call collection: all call sites targeting one declaration
//!
//! A one-shot scan over the whole index, not a graph traversal. Each hit is
//! attributed to the uppermost executable context containing it, and feeds
//! the same edge processing as forward expansion, tagged as a reverse edge.

use bramble_core::{Context, ContextKind, DeclId, Declaration, SemanticIndex, Use};
use tracing::debug;

/// One call site found for the collection target.
#[derive(Debug, Clone)]
pub struct IncomingCall {
    /// Owner of the enclosing executable context.
    pub source: DeclId,
    pub use_record: Use,
}

/// Collect every use of `target` across the index, in index order.
pub fn collect_incoming(index: &SemanticIndex, target: &Declaration) -> Vec<IncomingCall> {
    let mut calls = Vec::new();
    for context in index.contexts() {
        for record in &context.uses {
            if record.declaration != target.id {
                continue;
            }
            let Some(source) = enclosing_owner(index, context) else {
                continue;
            };
            calls.push(IncomingCall {
                source,
                use_record: record.clone(),
            });
        }
    }
    debug!(
        "collected {} incoming call(s) for {}",
        calls.len(),
        target.qualified_name
    );
    calls
}

/// Owner declaration of the uppermost executable context containing `ctx`.
fn enclosing_owner(index: &SemanticIndex, ctx: &Context) -> Option<DeclId> {
    if ctx.kind != ContextKind::Other {
        return None;
    }
    let mut current = ctx;
    while let Some(parent) = current.parent.and_then(|id| index.context(id)) {
        if parent.kind != ContextKind::Other {
            break;
        }
        current = parent;
    }
    current.owner
}
