//! Root resolution: from a cursor position to the declaration seeding a build

use std::path::Path;

use bramble_core::{ContextId, ContextKind, DeclId, Position, SemanticIndex};
use tracing::debug;

/// Outcome of resolving a cursor position against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootResolution {
    /// No executable context under the cursor; the graph becomes empty.
    NoRoot,
    /// Same uppermost executable context as the previous build; skip.
    Unchanged,
    /// A fresh root to build from.
    Root {
        definition: DeclId,
        context: ContextId,
    },
}

/// Find the uppermost executable context around the cursor and its owning
/// declaration. `previous` is the context of the last completed build, for
/// the idempotence short-circuit.
pub fn resolve_root(
    index: &SemanticIndex,
    file: &Path,
    pos: Position,
    previous: Option<ContextId>,
) -> RootResolution {
    if index.top_context(file).is_none() {
        debug!("{} is not indexed", file.display());
        return RootResolution::NoRoot;
    }

    let mut context = index.context_at(file, pos);

    // Cursor in a signature context with exactly one importing body: move
    // into the body.
    if let Some(ctx) = context.and_then(|id| index.context(id)) {
        if ctx.kind == ContextKind::Signature && ctx.importers.len() == 1 {
            context = Some(ctx.importers[0]);
        }
    }

    // Cursor exactly on a declared name outside executable code: jump into
    // that declaration's own context (clicking a method name lands in its
    // body, not at the call site).
    if let Some(decl) = index.declaration_at(file, pos) {
        let in_executable = context
            .and_then(|id| index.context(id))
            .map(|ctx| ctx.kind == ContextKind::Other)
            .unwrap_or(false);
        if !in_executable {
            if let Some(internal) = decl.internal_context {
                context = Some(internal);
            }
        }
    }

    let Some(ctx) = context.and_then(|id| index.context(id)) else {
        return RootResolution::NoRoot;
    };
    if ctx.kind != ContextKind::Other {
        return RootResolution::NoRoot;
    }

    // Walk up to the uppermost executable context.
    let mut uppermost = ctx;
    while let Some(parent) = uppermost.parent.and_then(|id| index.context(id)) {
        if parent.kind != ContextKind::Other {
            break;
        }
        uppermost = parent;
    }

    if previous == Some(uppermost.id) {
        return RootResolution::Unchanged;
    }

    match uppermost.owner {
        Some(definition) => RootResolution::Root {
            definition,
            context: uppermost.id,
        },
        None => RootResolution::NoRoot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bramble_core::{span, DeclKind, IndexBuilder};

    struct Fixture {
        index: SemanticIndex,
        foo: DeclId,
        foo_body: ContextId,
        method: DeclId,
        method_body: ContextId,
    }

    fn fixture() -> Fixture {
        let mut builder = IndexBuilder::new();
        let top = builder.file("/work/main.cpp").unwrap();
        let (foo, foo_body) = builder
            .function(top, DeclKind::Function, "foo", "foo", span(1, 0, 1, 3), span(1, 10, 8, 0))
            .unwrap();
        builder.block(foo_body, span(3, 0, 5, 0)).unwrap();
        builder.signature(top, span(1, 4, 1, 9), foo_body).unwrap();

        let (_, class_body) = builder
            .class(top, "C", "C", span(10, 6, 10, 7), span(10, 8, 20, 0))
            .unwrap();
        let (method, method_body) = builder
            .function(class_body, DeclKind::Method, "m", "C::m", span(11, 4, 11, 5), span(12, 0, 15, 0))
            .unwrap();

        Fixture {
            index: builder.build(),
            foo,
            foo_body,
            method,
            method_body,
        }
    }

    const FILE: &str = "/work/main.cpp";

    #[test]
    fn unindexed_file_has_no_root() {
        let fixture = fixture();
        let result = resolve_root(&fixture.index, Path::new("/other.cpp"), Position::new(2, 0), None);
        assert_eq!(result, RootResolution::NoRoot);
    }

    #[test]
    fn cursor_in_body_resolves_to_owner() {
        let fixture = fixture();
        let result = resolve_root(&fixture.index, Path::new(FILE), Position::new(2, 0), None);
        assert_eq!(
            result,
            RootResolution::Root {
                definition: fixture.foo,
                context: fixture.foo_body,
            }
        );
    }

    #[test]
    fn nested_block_walks_up_to_uppermost_executable() {
        let fixture = fixture();
        let result = resolve_root(&fixture.index, Path::new(FILE), Position::new(4, 0), None);
        assert_eq!(
            result,
            RootResolution::Root {
                definition: fixture.foo,
                context: fixture.foo_body,
            }
        );
    }

    #[test]
    fn signature_context_substitutes_importer() {
        let fixture = fixture();
        let result = resolve_root(&fixture.index, Path::new(FILE), Position::new(1, 5), None);
        // Position (1,5) also sits on foo's file-spanning body range? No:
        // the signature context starts later in the line than the name.
        assert_eq!(
            result,
            RootResolution::Root {
                definition: fixture.foo,
                context: fixture.foo_body,
            }
        );
    }

    #[test]
    fn declaration_name_jumps_into_its_context() {
        let fixture = fixture();
        // Cursor on the method name, lexically inside the class context.
        let result = resolve_root(&fixture.index, Path::new(FILE), Position::new(11, 4), None);
        assert_eq!(
            result,
            RootResolution::Root {
                definition: fixture.method,
                context: fixture.method_body,
            }
        );
    }

    #[test]
    fn non_executable_context_yields_no_root() {
        let fixture = fixture();
        // Inside the class body but not on any declared name.
        let result = resolve_root(&fixture.index, Path::new(FILE), Position::new(18, 0), None);
        assert_eq!(result, RootResolution::NoRoot);
    }

    #[test]
    fn unchanged_root_short_circuits() {
        let fixture = fixture();
        let result = resolve_root(
            &fixture.index,
            Path::new(FILE),
            Position::new(2, 0),
            Some(fixture.foo_body),
        );
        assert_eq!(result, RootResolution::Unchanged);
    }
}
