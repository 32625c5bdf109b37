//! Convenience builder for populating a [`SemanticIndex`]
//!
//! Host indexers drive this instead of assembling [`Context`] and
//! [`Declaration`] records by hand; it takes care of id derivation and of
//! wiring parents, owners, and importers both ways.

use std::path::PathBuf;

use crate::error::IndexError;
use crate::index::SemanticIndex;
use crate::model::{
    Context, ContextId, ContextKind, DeclId, DeclKind, Declaration, Position, Range, Use,
};

pub struct IndexBuilder {
    index: SemanticIndex,
}

impl IndexBuilder {
    pub fn new() -> Self {
        IndexBuilder {
            index: SemanticIndex::new(),
        }
    }

    pub fn build(self) -> SemanticIndex {
        self.index
    }

    /// Open a file's top-level context, spanning the whole file.
    pub fn file(&mut self, file: impl Into<PathBuf>) -> Result<ContextId, IndexError> {
        let file = file.into();
        let range = Range::new(Position::new(0, 0), Position::new(u32::MAX, 0));
        self.index.insert_context(Context {
            id: ContextId::new(&file, ContextKind::Global, range.start),
            kind: ContextKind::Global,
            file,
            range,
            parent: None,
            owner: None,
            children: Vec::new(),
            uses: Vec::new(),
            importers: Vec::new(),
        })
    }

    fn child_context(
        &mut self,
        parent: ContextId,
        kind: ContextKind,
        range: Range,
    ) -> Result<ContextId, IndexError> {
        let file = self
            .index
            .context(parent)
            .ok_or(IndexError::UnknownParent(parent))?
            .file
            .clone();
        self.index.insert_context(Context {
            id: ContextId::new(&file, kind, range.start),
            kind,
            file,
            range,
            parent: Some(parent),
            owner: None,
            children: Vec::new(),
            uses: Vec::new(),
            importers: Vec::new(),
        })
    }

    fn owned_scope(
        &mut self,
        parent: ContextId,
        decl_kind: DeclKind,
        ctx_kind: ContextKind,
        name: &str,
        qualified_name: &str,
        name_range: Range,
        body_range: Range,
    ) -> Result<(DeclId, ContextId), IndexError> {
        let body = self.child_context(parent, ctx_kind, body_range)?;
        let file = self.index.context(body).map(|c| c.file.clone()).unwrap_or_default();
        let decl = self.index.insert_declaration(Declaration {
            id: DeclId::new(&file, decl_kind, qualified_name, true),
            kind: decl_kind,
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            file,
            range: name_range,
            is_definition: true,
            definition: None,
            declaration: None,
            context: Some(parent),
            internal_context: Some(body),
        })?;
        Ok((decl, body))
    }

    /// A namespace declaration with its scope.
    pub fn namespace(
        &mut self,
        parent: ContextId,
        name: &str,
        qualified_name: &str,
        name_range: Range,
        body_range: Range,
    ) -> Result<(DeclId, ContextId), IndexError> {
        self.owned_scope(
            parent,
            DeclKind::Namespace,
            ContextKind::Namespace,
            name,
            qualified_name,
            name_range,
            body_range,
        )
    }

    /// A class declaration with its scope.
    pub fn class(
        &mut self,
        parent: ContextId,
        name: &str,
        qualified_name: &str,
        name_range: Range,
        body_range: Range,
    ) -> Result<(DeclId, ContextId), IndexError> {
        self.owned_scope(
            parent,
            DeclKind::Class,
            ContextKind::Class,
            name,
            qualified_name,
            name_range,
            body_range,
        )
    }

    /// A function or method definition with its executable body context.
    pub fn function(
        &mut self,
        parent: ContextId,
        kind: DeclKind,
        name: &str,
        qualified_name: &str,
        name_range: Range,
        body_range: Range,
    ) -> Result<(DeclId, ContextId), IndexError> {
        self.owned_scope(
            parent,
            kind,
            ContextKind::Other,
            name,
            qualified_name,
            name_range,
            body_range,
        )
    }

    /// A forward declaration without a body.
    pub fn forward_declaration(
        &mut self,
        parent: ContextId,
        kind: DeclKind,
        name: &str,
        qualified_name: &str,
        name_range: Range,
    ) -> Result<DeclId, IndexError> {
        let file = self
            .index
            .context(parent)
            .ok_or(IndexError::UnknownParent(parent))?
            .file
            .clone();
        self.index.insert_declaration(Declaration {
            id: DeclId::new(&file, kind, qualified_name, false),
            kind,
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            file,
            range: name_range,
            is_definition: false,
            definition: None,
            declaration: None,
            context: Some(parent),
            internal_context: None,
        })
    }

    /// A nested executable block inside a body (loop, branch, lambda body).
    pub fn block(&mut self, parent: ContextId, range: Range) -> Result<ContextId, IndexError> {
        self.child_context(parent, ContextKind::Other, range)
    }

    /// The parameter scope of a function, imported by its body context.
    pub fn signature(
        &mut self,
        parent: ContextId,
        range: Range,
        importer: ContextId,
    ) -> Result<ContextId, IndexError> {
        let ctx = self.child_context(parent, ContextKind::Signature, range)?;
        self.index.add_importer(ctx, importer)?;
        Ok(ctx)
    }

    /// Record a resolved call-site use inside a context.
    pub fn call(
        &mut self,
        context: ContextId,
        target: DeclId,
        range: Range,
    ) -> Result<(), IndexError> {
        self.index.add_use(
            context,
            Use {
                declaration: target,
                range,
            },
        )
    }

    /// Link a forward declaration and its definition both ways.
    pub fn link_definition(&mut self, declaration: DeclId, definition: DeclId) {
        self.index.link_definition(declaration, definition);
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for a [`Range`] literal.
pub fn span(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Range {
    Range::new(
        Position::new(start_line, start_col),
        Position::new(end_line, end_col),
    )
}
