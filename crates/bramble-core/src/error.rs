//! Error types for index population

use crate::model::{ContextId, DeclId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("unknown context {0:?}")]
    UnknownContext(ContextId),

    #[error("unknown parent context {0:?}")]
    UnknownParent(ContextId),

    #[error("context {0:?} already indexed")]
    DuplicateContext(ContextId),

    #[error("declaration {0:?} already indexed")]
    DuplicateDeclaration(DeclId),
}
