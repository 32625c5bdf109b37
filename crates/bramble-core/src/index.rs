//! In-memory semantic index: declarations, contexts, and their uses
//!
//! The graph engine treats this as a read-only collaborator behind a shared
//! read lock. Population happens through the fallible insert API, normally
//! driven by [`crate::builder::IndexBuilder`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::IndexError;
use crate::model::{Context, ContextId, ContextKind, DeclId, Declaration, Position, Use};

/// Queryable symbol table over one or more indexed files.
#[derive(Debug, Default)]
pub struct SemanticIndex {
    declarations: HashMap<DeclId, Declaration>,
    contexts: HashMap<ContextId, Context>,
    /// File -> top-level context.
    top_contexts: HashMap<PathBuf, ContextId>,
    /// File -> declarations in that file, for cursor hit-testing.
    file_declarations: HashMap<PathBuf, Vec<DeclId>>,
    /// Contexts in insertion order, for deterministic whole-index scans.
    context_order: Vec<ContextId>,
}

impl SemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Population ──────────────────────────────────────────

    /// Insert a context. A context without a parent becomes the top-level
    /// context of its file; one with a parent is appended to that parent's
    /// children.
    pub fn insert_context(&mut self, context: Context) -> Result<ContextId, IndexError> {
        let id = context.id;
        if self.contexts.contains_key(&id) {
            return Err(IndexError::DuplicateContext(id));
        }
        match context.parent {
            Some(parent) => {
                let parent = self
                    .contexts
                    .get_mut(&parent)
                    .ok_or(IndexError::UnknownParent(parent))?;
                parent.children.push(id);
            }
            None => {
                self.top_contexts.insert(context.file.clone(), id);
            }
        }
        self.context_order.push(id);
        self.contexts.insert(id, context);
        Ok(id)
    }

    /// Insert a declaration. When the declaration opens an internal context
    /// that is already indexed, the context's owner is wired up here.
    pub fn insert_declaration(&mut self, declaration: Declaration) -> Result<DeclId, IndexError> {
        let id = declaration.id;
        if self.declarations.contains_key(&id) {
            return Err(IndexError::DuplicateDeclaration(id));
        }
        if let Some(internal) = declaration.internal_context {
            if let Some(context) = self.contexts.get_mut(&internal) {
                context.owner = Some(id);
            }
        }
        self.file_declarations
            .entry(declaration.file.clone())
            .or_default()
            .push(id);
        self.declarations.insert(id, declaration);
        Ok(id)
    }

    /// Append a resolved use to a context.
    pub fn add_use(&mut self, context: ContextId, record: Use) -> Result<(), IndexError> {
        let context = self
            .contexts
            .get_mut(&context)
            .ok_or(IndexError::UnknownContext(context))?;
        context.uses.push(record);
        Ok(())
    }

    /// Register an importer on a context (a function body importing its
    /// signature context).
    pub fn add_importer(
        &mut self,
        context: ContextId,
        importer: ContextId,
    ) -> Result<(), IndexError> {
        let context = self
            .contexts
            .get_mut(&context)
            .ok_or(IndexError::UnknownContext(context))?;
        context.importers.push(importer);
        Ok(())
    }

    /// Link a forward declaration and its definition both ways.
    pub fn link_definition(&mut self, declaration: DeclId, definition: DeclId) {
        if let Some(decl) = self.declarations.get_mut(&declaration) {
            decl.definition = Some(definition);
        }
        if let Some(def) = self.declarations.get_mut(&definition) {
            def.declaration = Some(declaration);
        }
    }

    /// Drop everything indexed for a file (incremental re-indexing).
    pub fn remove_file(&mut self, file: &Path) {
        if let Some(ids) = self.file_declarations.remove(file) {
            for id in ids {
                self.declarations.remove(&id);
            }
        }
        self.top_contexts.remove(file);
        self.context_order.retain(|id| {
            let keep = self
                .contexts
                .get(id)
                .map(|c| c.file != file)
                .unwrap_or(false);
            if !keep {
                self.contexts.remove(id);
            }
            keep
        });
        debug!("removed index entries for {}", file.display());
    }

    // ── Queries ─────────────────────────────────────────────

    /// Re-resolve a declaration handle. `None` means the handle is stale.
    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(&id)
    }

    pub fn context(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(&id)
    }

    /// Top-level context for a file; `None` when the file is not indexed.
    pub fn top_context(&self, file: &Path) -> Option<ContextId> {
        self.top_contexts.get(file).copied()
    }

    /// Innermost context containing a position.
    pub fn context_at(&self, file: &Path, pos: Position) -> Option<ContextId> {
        let top = self.context(self.top_context(file)?)?;
        if !top.range.contains(pos) {
            return None;
        }
        let mut current = top;
        'descend: loop {
            for child in &current.children {
                if let Some(child) = self.context(*child) {
                    if child.range.contains(pos) {
                        current = child;
                        continue 'descend;
                    }
                }
            }
            return Some(current.id);
        }
    }

    /// The declaration whose declared name sits exactly under the cursor.
    pub fn declaration_at(&self, file: &Path, pos: Position) -> Option<&Declaration> {
        self.file_declarations
            .get(file)?
            .iter()
            .filter_map(|id| self.declarations.get(id))
            .find(|decl| decl.range.contains(pos))
    }

    /// The definition behind a declaration. A definition with no separate
    /// forward declaration stands for itself.
    pub fn definition_of(&self, id: DeclId) -> Option<&Declaration> {
        let decl = self.declaration(id)?;
        if decl.is_definition {
            return Some(decl);
        }
        decl.definition.and_then(|def| self.declaration(def))
    }

    /// The forward declaration behind a definition, or the definition itself
    /// when none exists.
    pub fn declaration_for_definition(&self, id: DeclId) -> Option<&Declaration> {
        let decl = self.declaration(id)?;
        if !decl.is_definition {
            return Some(decl);
        }
        match decl.declaration {
            Some(fwd) => self.declaration(fwd).or(Some(decl)),
            None => Some(decl),
        }
    }

    /// All contexts in insertion order. Used by the incoming-call collector
    /// for its one-shot whole-index scan.
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.context_order.iter().filter_map(|id| self.contexts.get(id))
    }

    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }
}
