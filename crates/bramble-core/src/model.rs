//! Core data structures for the semantic index

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A position in a source file (0-based line and column).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

/// A source range, inclusive of both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// Unique, stable identifier for a declaration.
///
/// Derived from the declaration's location-independent identity so that it
/// survives re-indexing; a stale id simply fails to re-resolve against the
/// live index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DeclId(pub u64);

impl DeclId {
    pub fn new(file: &Path, kind: DeclKind, qualified_name: &str, is_definition: bool) -> Self {
        let mut hasher = DefaultHasher::new();
        file.hash(&mut hasher);
        kind.hash(&mut hasher);
        qualified_name.hash(&mut hasher);
        is_definition.hash(&mut hasher);
        DeclId(hasher.finish())
    }
}

/// Unique, stable identifier for a lexical context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ContextId(pub u64);

impl ContextId {
    pub fn new(file: &Path, kind: ContextKind, start: Position) -> Self {
        let mut hasher = DefaultHasher::new();
        file.hash(&mut hasher);
        kind.hash(&mut hasher);
        start.hash(&mut hasher);
        ContextId(hasher.finish())
    }
}

/// Discriminates what kind of named entity a declaration represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    Function,
    Method,
    Class,
    Namespace,
}

impl DeclKind {
    /// Whether a use of this declaration can be a call site.
    pub fn is_callable(self) -> bool {
        matches!(self, DeclKind::Function | DeclKind::Method)
    }
}

/// A named entity in the indexed codebase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Declaration {
    pub id: DeclId,
    pub kind: DeclKind,
    pub name: String,
    pub qualified_name: String,
    pub file: PathBuf,
    /// Where the declared name appears (navigation target).
    pub range: Range,
    /// True when this declaration carries the body.
    pub is_definition: bool,
    /// Forward declaration -> its definition.
    pub definition: Option<DeclId>,
    /// Definition -> its forward declaration.
    pub declaration: Option<DeclId>,
    /// The lexical context this declaration appears in.
    pub context: Option<ContextId>,
    /// The context this declaration opens (class body, function body, ...).
    pub internal_context: Option<ContextId>,
}

/// Discriminates what kind of lexical scope a context represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    /// File top-level scope.
    Global,
    Namespace,
    Class,
    /// Parameter/argument scope of a function signature.
    Signature,
    /// Executable scope: function bodies and nested blocks.
    Other,
}

/// A lexical scope node in the semantic index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Context {
    pub id: ContextId,
    pub kind: ContextKind,
    pub file: PathBuf,
    pub range: Range,
    pub parent: Option<ContextId>,
    /// The declaration this context belongs to, if any.
    pub owner: Option<DeclId>,
    /// Child contexts, ordered by source position.
    pub children: Vec<ContextId>,
    /// Resolved symbol references, ordered by source position.
    pub uses: Vec<Use>,
    /// Contexts importing this one (a function body imports its signature).
    pub importers: Vec<ContextId>,
}

/// A resolved reference to a declaration at a source range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Use {
    pub declaration: DeclId,
    pub range: Range,
}
