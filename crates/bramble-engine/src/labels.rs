//! Label policy: display names and cluster paths for graph nodes
//!
//! Pure functions over the index read guard plus a settings snapshot. The
//! granularity mode is always passed explicitly, so computing a namespace
//! container for a class-mode build cannot leak state between calls.

use std::path::PathBuf;

use bramble_core::{
    ContextKind, ControlFlowMode, Declaration, GraphSettings, ProjectMap, SemanticIndex,
};

/// Label used when folder naming is off or no include directory matches.
pub const GLOBAL_NAMESPACE: &str = "Global Namespace";

/// Separator token between name segments and folder components.
pub const SEPARATOR: &str = "::";

pub struct LabelPolicy<'a> {
    index: &'a SemanticIndex,
    projects: &'a ProjectMap,
    settings: &'a GraphSettings,
    /// Include directories of the build's current project.
    include_dirs: &'a [PathBuf],
}

impl<'a> LabelPolicy<'a> {
    pub fn new(
        index: &'a SemanticIndex,
        projects: &'a ProjectMap,
        settings: &'a GraphSettings,
        include_dirs: &'a [PathBuf],
    ) -> Self {
        LabelPolicy {
            index,
            projects,
            settings,
            include_dirs,
        }
    }

    /// Lift a declaration to the enclosing declaration matching the
    /// granularity mode. Function mode is the identity; Class mode walks up
    /// while the owning context is a class; Namespace mode also walks
    /// through classes into namespaces. Returns the input when the owner
    /// chain is missing or stale.
    pub fn lift(&self, decl: &Declaration, mode: ControlFlowMode) -> Declaration {
        if mode == ControlFlowMode::Function {
            return decl.clone();
        }

        let mut current = match self.index.declaration_for_definition(decl.id) {
            Some(converted) if decl.is_definition => converted.clone(),
            _ => decl.clone(),
        };

        let owner_chain_ok = current
            .context
            .and_then(|id| self.index.context(id))
            .map(|ctx| ctx.owner.is_some())
            .unwrap_or(false);
        if !owner_chain_ok {
            return decl.clone();
        }

        loop {
            let Some(ctx) = current.context.and_then(|id| self.index.context(id)) else {
                break;
            };
            let lifts = match mode {
                ControlFlowMode::Function => false,
                ControlFlowMode::Class => ctx.kind == ContextKind::Class,
                ControlFlowMode::Namespace => {
                    matches!(ctx.kind, ContextKind::Class | ContextKind::Namespace)
                }
            };
            if !lifts {
                break;
            }
            let Some(owner) = ctx.owner.and_then(|id| self.index.declaration(id)) else {
                break;
            };
            current = owner.clone();
        }
        current
    }

    /// Whether the declaration opens a real namespace scope.
    pub fn is_namespace_scope(&self, decl: &Declaration) -> bool {
        decl.internal_context
            .and_then(|id| self.index.context(id))
            .map(|ctx| ctx.kind == ContextKind::Namespace)
            .unwrap_or(false)
    }

    /// Folder-derived namespace path for a declaration, or the global
    /// sentinel. Picks the longest include directory containing the
    /// declaration's file, strips it and the file name, and joins the rest
    /// with the separator token.
    pub fn folder_path(&self, decl: &Declaration) -> String {
        if self.settings.use_folder_name && !self.include_dirs.is_empty() {
            let best = self
                .include_dirs
                .iter()
                .filter(|dir| decl.file.starts_with(dir))
                .max_by_key(|dir| dir.as_os_str().len());
            if let Some(dir) = best {
                let folders: Vec<String> = decl
                    .file
                    .strip_prefix(dir)
                    .ok()
                    .and_then(|rel| rel.parent())
                    .map(|parent| {
                        parent
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy().into_owned())
                            .collect()
                    })
                    .unwrap_or_default();
                if !folders.is_empty() {
                    return folders.join(SEPARATOR);
                }
            }
        }
        GLOBAL_NAMESPACE.to_string()
    }

    /// Qualified name, prefixed with the folder path when folder naming is
    /// active and the namespace-lifted declaration is not inside a real
    /// namespace.
    pub fn qualified_name(&self, decl: &Declaration) -> String {
        let mut qualified = decl.qualified_name.clone();
        if self.settings.use_folder_name {
            let lifted = self.lift(decl, ControlFlowMode::Namespace);
            let prefix = self.folder_path(&lifted);
            if !self.is_namespace_scope(&lifted) && prefix != GLOBAL_NAMESPACE {
                qualified = format!("{prefix}{SEPARATOR}{qualified}");
            }
        }
        qualified
    }

    /// Strip any container (plus trailing separator) appearing inside a
    /// qualified name, yielding a label relative to its cluster path.
    pub fn short_name(&self, containers: &[String], qualified: &str) -> String {
        let mut short = qualified.to_string();
        if self.settings.use_short_names {
            for container in containers {
                let segment = format!("{container}{SEPARATOR}");
                if let Some(at) = short.find(&segment) {
                    short.replace_range(at..at + segment.len(), "");
                }
            }
        }
        short
    }

    /// Cluster containers for a declaration, in fixed order: project,
    /// namespace path, class.
    pub fn containers(&self, decl: &Declaration) -> Vec<String> {
        let mut containers = Vec::new();
        let clustering = self.settings.clustering;

        if clustering.project {
            if let Some(project) = self.projects.project_for_path(&decl.file) {
                containers.push(project.name);
            }
        }

        if clustering.namespace {
            let lifted = self.lift(decl, ControlFlowMode::Namespace);
            let path = if !self.is_namespace_scope(&lifted) {
                self.folder_path(&lifted)
            } else {
                self.short_name(&containers, &self.qualified_name(&lifted))
            };
            for segment in path.split(SEPARATOR) {
                containers.push(segment.to_string());
            }
        }

        if clustering.class {
            let lifted = self.lift(decl, ControlFlowMode::Class);
            let is_class = lifted
                .internal_context
                .and_then(|id| self.index.context(id))
                .map(|ctx| ctx.kind == ContextKind::Class)
                .unwrap_or(false);
            if is_class {
                containers.push(self.short_name(&containers, &self.qualified_name(&lifted)));
            }
        }

        containers
    }

    /// Display label for an already lifted declaration. In Namespace mode a
    /// declaration outside any real namespace is labeled by its folder path.
    pub fn node_label(&self, lifted: &Declaration, containers: &[String]) -> String {
        if self.settings.mode == ControlFlowMode::Namespace && !self.is_namespace_scope(lifted) {
            self.folder_path(lifted)
        } else {
            self.short_name(containers, &self.qualified_name(lifted))
        }
    }
}
