//! Test fixtures for bramble-core

use crate::builder::{span, IndexBuilder};
use crate::index::SemanticIndex;
use crate::model::{ContextId, DeclId, DeclKind};

/// Handles into the `simple_calls` fixture.
pub struct SimpleCalls {
    pub index: SemanticIndex,
    pub foo: DeclId,
    pub foo_body: ContextId,
    pub bar: DeclId,
    pub bar_body: ContextId,
    pub baz: DeclId,
}

/// One file, three free functions: `foo` calls `bar`, `bar` calls `baz`.
pub fn simple_calls() -> SimpleCalls {
    let mut builder = IndexBuilder::new();
    let top = builder.file("/work/main.cpp").unwrap();
    let (foo, foo_body) = builder
        .function(top, DeclKind::Function, "foo", "foo", span(1, 0, 1, 3), span(1, 10, 5, 0))
        .unwrap();
    let (bar, bar_body) = builder
        .function(top, DeclKind::Function, "bar", "bar", span(7, 0, 7, 3), span(7, 10, 11, 0))
        .unwrap();
    let (baz, _) = builder
        .function(top, DeclKind::Function, "baz", "baz", span(13, 0, 13, 3), span(13, 10, 15, 0))
        .unwrap();
    builder.call(foo_body, bar, span(2, 4, 2, 7)).unwrap();
    builder.call(bar_body, baz, span(8, 4, 8, 7)).unwrap();

    SimpleCalls {
        index: builder.build(),
        foo,
        foo_body,
        bar,
        bar_body,
        baz,
    }
}
