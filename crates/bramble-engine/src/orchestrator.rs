//! Build orchestration: cursor events in, graph events out
//!
//! At most one build is in flight; a cursor event arriving while one runs
//! is dropped, not queued. Superseded builds are discarded through a
//! generation counter rather than forcible abort.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use bramble_core::{
    ClusteringModes, ContextId, ControlFlowMode, DeclId, GraphEvent, GraphSettings, Position,
    ProjectMap, SemanticIndex,
};
use tokio::sync::{broadcast, Mutex, Notify, RwLock};
use tracing::{debug, info};

use crate::resolver::{resolve_root, RootResolution};
use crate::tracker::{EdgeUse, NavigationMaps};
use crate::traversal::Traversal;

/// Result of a click on a graph element.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A node: jump to the declaration.
    Declaration {
        declaration: DeclId,
        file: PathBuf,
        position: Position,
    },
    /// An edge: inspect the underlying uses.
    EdgeUses(Vec<EdgeUse>),
}

#[derive(Default)]
struct ServiceState {
    previous_root: Option<ContextId>,
    last_cursor: Option<(PathBuf, Position)>,
    navigation: NavigationMaps,
}

/// The build orchestrator. Owns the lifecycle of graph builds and fans the
/// event stream out to subscribers.
///
/// Lock order is index before state, everywhere; the state mutex is never
/// held across an index lock acquisition.
pub struct FlowService {
    index: Arc<RwLock<SemanticIndex>>,
    projects: Arc<ProjectMap>,
    settings: Arc<RwLock<GraphSettings>>,
    events: broadcast::Sender<GraphEvent>,
    busy: Arc<AtomicBool>,
    idle: Arc<Notify>,
    generation: Arc<AtomicU64>,
    state: Arc<Mutex<ServiceState>>,
}

impl FlowService {
    pub fn new(index: Arc<RwLock<SemanticIndex>>, projects: Arc<ProjectMap>) -> Self {
        let (events, _) = broadcast::channel(256);
        FlowService {
            index,
            projects,
            settings: Arc::new(RwLock::new(GraphSettings::default())),
            events,
            busy: Arc::new(AtomicBool::new(false)),
            idle: Arc::new(Notify::new()),
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(ServiceState::default())),
        }
    }

    /// Subscribe to the per-build event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.events.subscribe()
    }

    pub async fn settings(&self) -> GraphSettings {
        self.settings.read().await.clone()
    }

    /// React to the cursor landing at a new position. Dropped while locked
    /// or while a build is running.
    pub async fn cursor_moved(&self, file: &Path, pos: Position) -> Result<()> {
        if self.settings.read().await.locked {
            return Ok(());
        }
        {
            let mut state = self.state.lock().await;
            state.last_cursor = Some((file.to_path_buf(), pos));
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!("build in flight; dropping cursor event");
            return Ok(());
        }

        let resolution = {
            let index = self.index.read().await;
            let state = self.state.lock().await;
            resolve_root(&index, file, pos, state.previous_root)
        };

        match resolution {
            RootResolution::NoRoot => {
                let mut state = self.state.lock().await;
                if state.previous_root.take().is_some() {
                    state.navigation.clear();
                    let _ = self.events.send(GraphEvent::Cleared);
                    info!("no function under cursor; graph cleared");
                }
                self.busy.store(false, Ordering::Release);
                self.idle.notify_waiters();
            }
            RootResolution::Unchanged => {
                self.busy.store(false, Ordering::Release);
                self.idle.notify_waiters();
            }
            RootResolution::Root {
                definition,
                context,
            } => {
                {
                    let mut state = self.state.lock().await;
                    state.previous_root = Some(context);
                    state.navigation.clear();
                }
                let _ = self.events.send(GraphEvent::Cleared);

                // Project metadata is only safe to fetch on this path.
                let include_dirs = self
                    .projects
                    .project_for_path(file)
                    .map(|p| p.include_dirs)
                    .unwrap_or_default();
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                let settings = self.settings.read().await.clone();

                let index = Arc::clone(&self.index);
                let projects = Arc::clone(&self.projects);
                let events = self.events.clone();
                let busy = Arc::clone(&self.busy);
                let idle = Arc::clone(&self.idle);
                let generations = Arc::clone(&self.generation);
                let state = Arc::clone(&self.state);

                tokio::spawn(async move {
                    let tracker = {
                        let index = index.read().await;
                        let sink = |event: GraphEvent| {
                            // Late events from a superseded build are
                            // discarded, never merged into a newer build.
                            if generations.load(Ordering::Acquire) == generation {
                                let _ = events.send(event);
                            }
                        };
                        let traversal =
                            Traversal::new(&index, &projects, &settings, &include_dirs, sink);
                        traversal.run(definition, context)
                    };
                    if generations.load(Ordering::Acquire) == generation {
                        let mut state = state.lock().await;
                        state.navigation = tracker.into_navigation();
                        debug!("build {generation} published");
                    } else {
                        debug!("build {generation} superseded; results dropped");
                    }
                    busy.store(false, Ordering::Release);
                    idle.notify_waiters();
                });
            }
        }
        Ok(())
    }

    /// Rebuild the current root from the last cursor position.
    pub async fn refresh(&self) -> Result<()> {
        if self.settings.read().await.locked {
            return Ok(());
        }
        let cursor = {
            let mut state = self.state.lock().await;
            state.previous_root = None;
            state.last_cursor.clone()
        };
        match cursor {
            Some((file, pos)) => self.cursor_moved(&file, pos).await,
            None => Ok(()),
        }
    }

    /// Wait for the in-flight build, if any, to finish.
    pub async fn wait_idle(&self) {
        loop {
            // Arm the notification before the check so a build finishing in
            // between cannot be missed.
            let notified = self.idle.notified();
            if !self.busy.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }

    // ── Configuration surface ───────────────────────────────

    pub async fn set_mode(&self, mode: ControlFlowMode) -> Result<()> {
        self.settings.write().await.mode = mode;
        self.refresh().await
    }

    pub async fn set_clustering(&self, clustering: ClusteringModes) -> Result<()> {
        self.settings.write().await.clustering = clustering;
        self.refresh().await
    }

    pub async fn set_max_level(&self, max_level: u32) -> Result<()> {
        self.settings.write().await.max_level = max_level;
        self.refresh().await
    }

    pub async fn set_draw_incoming_arcs(&self, draw: bool) -> Result<()> {
        self.settings.write().await.draw_incoming_arcs = draw;
        self.refresh().await
    }

    pub async fn set_use_folder_name(&self, use_folder_name: bool) -> Result<()> {
        self.settings.write().await.use_folder_name = use_folder_name;
        self.refresh().await
    }

    pub async fn set_use_short_names(&self, use_short_names: bool) -> Result<()> {
        self.settings.write().await.use_short_names = use_short_names;
        self.refresh().await
    }

    /// Locking pauses auto-refresh; it never triggers a rebuild.
    pub async fn set_locked(&self, locked: bool) {
        self.settings.write().await.locked = locked;
    }

    pub async fn is_locked(&self) -> bool {
        self.settings.read().await.locked
    }

    // ── Navigation queries ──────────────────────────────────

    /// The declaration behind a node label, from the last completed build.
    pub async fn declaration_for_label(&self, label: &str) -> Option<DeclId> {
        self.state.lock().await.navigation.declaration_for_label(label)
    }

    /// The source uses behind an edge, from the last completed build.
    pub async fn uses_for_edge(&self, source_label: &str, target_label: &str) -> Vec<EdgeUse> {
        self.state
            .lock()
            .await
            .navigation
            .uses_for_edge(source_label, target_label)
    }

    /// Dispatch a click on a graph element: node labels resolve to their
    /// declaration's location, edge labels to their use list.
    pub async fn selection(&self, label: &str) -> Option<Selection> {
        // Copy out of the navigation maps before touching the index lock;
        // holding the state mutex across an index acquisition would invert
        // the service's lock order.
        let (declaration, uses) = {
            let state = self.state.lock().await;
            let declaration = state.navigation.declaration_for_label(label);
            let uses = if label.contains("->") {
                state.navigation.uses_for_edge_key(label)
            } else {
                Vec::new()
            };
            (declaration, uses)
        };

        if let Some(declaration) = declaration {
            let index = self.index.read().await;
            if let Some(decl) = index.declaration(declaration) {
                return Some(Selection::Declaration {
                    declaration,
                    file: decl.file.clone(),
                    position: decl.range.start,
                });
            }
        }
        if !uses.is_empty() {
            return Some(Selection::EdgeUses(uses));
        }
        None
    }
}
