//! Project metadata lookup
//!
//! A thin registry answering "which project owns this file" and exposing a
//! project's include directories. Thread-safe for concurrent host access.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Build metadata for one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub name: String,
    pub root: PathBuf,
    pub include_dirs: Vec<PathBuf>,
}

/// Registry of known projects, keyed by project root.
#[derive(Debug, Default)]
pub struct ProjectMap {
    projects: DashMap<PathBuf, Project>,
}

impl ProjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, project: Project) {
        self.projects.insert(project.root.clone(), project);
    }

    pub fn remove(&self, root: &Path) {
        self.projects.remove(root);
    }

    /// The project owning a path, by longest matching root prefix.
    pub fn project_for_path(&self, path: &Path) -> Option<Project> {
        self.projects
            .iter()
            .filter(|entry| path.starts_with(entry.key()))
            .max_by_key(|entry| entry.key().as_os_str().len())
            .map(|entry| entry.value().clone())
    }
}
