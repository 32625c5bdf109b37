//! Recursive graph construction over one build
//!
//! Walks a definition's body contexts in source order, discovers call
//! edges, and recurses into callee bodies subject to the visited set and
//! the build-wide level budget. Emits [`GraphEvent`]s into a caller
//! supplied sink; the orchestrator decides what happens to them.

use std::path::PathBuf;

use bramble_core::{
    ContextId, ContextKind, ControlFlowMode, DeclId, Declaration, GraphEvent, GraphSettings,
    ProjectMap, SemanticIndex, Use,
};
use tracing::{debug, warn};

use crate::collector::collect_incoming;
use crate::labels::LabelPolicy;
use crate::tracker::{BuildTracker, EdgeUse};

pub struct Traversal<'a, F: FnMut(GraphEvent)> {
    index: &'a SemanticIndex,
    policy: LabelPolicy<'a>,
    settings: &'a GraphSettings,
    tracker: BuildTracker,
    sink: F,
}

impl<'a, F: FnMut(GraphEvent)> Traversal<'a, F> {
    pub fn new(
        index: &'a SemanticIndex,
        projects: &'a ProjectMap,
        settings: &'a GraphSettings,
        include_dirs: &'a [PathBuf],
        sink: F,
    ) -> Self {
        Traversal {
            index,
            policy: LabelPolicy::new(index, projects, settings, include_dirs),
            settings,
            tracker: BuildTracker::new(),
            sink,
        }
    }

    /// Build the graph rooted at `definition`, whose uppermost executable
    /// context is `context`. Returns the tracker for navigation queries.
    pub fn run(mut self, definition: DeclId, context: ContextId) -> BuildTracker {
        let Some(def) = self.index.declaration(definition).cloned() else {
            // Root went stale between resolution and expansion.
            warn!("root declaration no longer resolves; emitting empty graph");
            (self.sink)(GraphEvent::Done);
            return self.tracker;
        };

        let lifted = self.policy.lift(&def, self.settings.mode);
        let containers = self.policy.containers(&def);
        let short_name = self
            .policy
            .short_name(&containers, &self.policy.qualified_name(&lifted));
        let label = self.policy.node_label(&lifted, &containers);
        debug!("root node {label:?}");
        (self.sink)(GraphEvent::Root {
            containers,
            label,
        });

        if self.settings.max_level != 1 {
            self.tracker.bump_level();
            self.tracker.visit(def.id);
            self.tracker.record_label(short_name, lifted.id);
            self.scan_uses(&def, context);
        }

        if self.settings.draw_incoming_arcs {
            // Collection targets the declaration, not the definition.
            let target = match self.index.declaration_for_definition(lifted.id) {
                Some(decl) if lifted.is_definition => decl.clone(),
                _ => lifted,
            };
            for call in collect_incoming(self.index, &target) {
                let Some(source) = self.index.declaration(call.source).cloned() else {
                    continue;
                };
                self.on_call(&source, &target, &call.use_record, true);
            }
        }

        (self.sink)(GraphEvent::Done);
        self.tracker
    }

    /// Walk a context's uses interleaved with its child contexts in source
    /// order, so calls are discovered in the order a reader meets them.
    /// Only Other-kind children are entered; nested class/function contexts
    /// are separate roots and never flattened into this scan.
    fn scan_uses(&mut self, definition: &Declaration, context: ContextId) {
        let index = self.index;
        let Some(ctx) = index.context(context) else {
            // Context claimed by the index but unresolvable: skip the branch.
            warn!("context failed to resolve during scan; skipping branch");
            return;
        };

        let mut children = ctx.children.iter().peekable();
        for record in &ctx.uses {
            // Children starting before this use are scanned first.
            while let Some(&&child_id) = children.peek() {
                match index.context(child_id) {
                    Some(child) if record.range.start < child.range.start => break,
                    Some(child) => {
                        if child.kind == ContextKind::Other {
                            self.scan_uses(definition, child_id);
                        }
                        children.next();
                    }
                    None => {
                        children.next();
                    }
                }
            }

            let Some(target) = index.declaration(record.declaration) else {
                // Stale use record; the branch continues without it.
                continue;
            };
            if !target.kind.is_callable() {
                continue;
            }
            let target = target.clone();
            self.on_call(definition, &target, record, false);
        }

        // Children after the last use.
        for &child_id in children {
            if let Some(child) = index.context(child_id) {
                if child.kind == ContextKind::Other {
                    self.scan_uses(definition, child_id);
                }
            }
        }
    }

    /// Process one discovered call. `incoming` marks calls found by the
    /// reverse collection pass; they share this path and differ only in the
    /// synthetic "Uses of" container on the source.
    fn on_call(&mut self, source: &Declaration, target: &Declaration, record: &Use, incoming: bool) {
        let mode = self.settings.mode;
        let node_source = self.policy.lift(source, mode);
        let node_target = self.policy.lift(target, mode);

        let called_definition = self.index.definition_of(target.id).cloned();

        let mut source_containers = self.policy.containers(source);
        let target_containers = self.policy.containers(target);

        let source_label = self.policy.node_label(&node_source, &source_containers);
        let target_label = self.policy.node_label(&node_target, &target_containers);

        let source_short = self
            .policy
            .short_name(&source_containers, &self.policy.qualified_name(&node_source));
        let target_short = self
            .policy
            .short_name(&target_containers, &self.policy.qualified_name(&node_target));

        if incoming {
            self.tracker.record_label(source_short, node_source.id);
            source_containers.insert(0, format!("Uses of {target_label}"));
        }

        let callee_visited = called_definition
            .as_ref()
            .map(|def| self.tracker.is_visited(def.id))
            .unwrap_or(false);

        // A flow exists when the endpoints are distinct at the current
        // granularity, always at function granularity, and for back edges
        // closing a recursion.
        if target_label != source_label || mode == ControlFlowMode::Function || callee_visited {
            (self.sink)(GraphEvent::Edge {
                source_containers: source_containers.clone(),
                source_label: source_label.clone(),
                target_containers,
                target_label: target_label.clone(),
            });
        }

        let edge_use = EdgeUse {
            use_record: record.clone(),
            file: source.file.clone(),
        };
        self.tracker
            .record_edge_use(&source_label, &target_label, edge_use);

        let Some(called) = called_definition else {
            // No definition to expand into; keep the declaration reachable
            // for navigation.
            self.tracker.record_label(target_short, node_target.id);
            return;
        };
        self.tracker
            .record_label(target_short, self.policy.lift(&called, mode).id);

        let Some(called_context) = called.internal_context else {
            return;
        };
        let within_budget =
            self.tracker.level() < self.settings.max_level || self.settings.max_level == 0;
        if within_budget && !self.tracker.is_visited(called.id) {
            self.tracker.bump_level();
            self.tracker.visit(called.id);
            self.scan_uses(&called, called_context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bramble_core::{span, DeclKind, IndexBuilder};

    fn run_traversal(
        index: &SemanticIndex,
        settings: &GraphSettings,
        definition: DeclId,
        context: ContextId,
    ) -> (Vec<GraphEvent>, BuildTracker) {
        let projects = ProjectMap::new();
        let mut events = Vec::new();
        let traversal = Traversal::new(index, &projects, settings, &[], |e| events.push(e));
        let tracker = traversal.run(definition, context);
        (events, tracker)
    }

    fn settings() -> GraphSettings {
        GraphSettings {
            mode: ControlFlowMode::Function,
            draw_incoming_arcs: false,
            use_folder_name: false,
            ..GraphSettings::default()
        }
    }

    fn edge_labels(events: &[GraphEvent]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|e| match e {
                GraphEvent::Edge {
                    source_label,
                    target_label,
                    ..
                } => Some((source_label.clone(), target_label.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn chain_of_calls_expands_in_order() {
        let mut builder = IndexBuilder::new();
        let top = builder.file("/w/m.cpp").unwrap();
        let (foo, foo_body) = builder
            .function(top, DeclKind::Function, "foo", "foo", span(1, 0, 1, 3), span(1, 5, 4, 0))
            .unwrap();
        let (bar, bar_body) = builder
            .function(top, DeclKind::Function, "bar", "bar", span(6, 0, 6, 3), span(6, 5, 9, 0))
            .unwrap();
        let (baz, _) = builder
            .function(top, DeclKind::Function, "baz", "baz", span(11, 0, 11, 3), span(11, 5, 13, 0))
            .unwrap();
        builder.call(foo_body, bar, span(2, 0, 2, 3)).unwrap();
        builder.call(bar_body, baz, span(7, 0, 7, 3)).unwrap();
        let index = builder.build();

        let (events, tracker) = run_traversal(&index, &settings(), foo, foo_body);

        assert_eq!(
            events[0],
            GraphEvent::Root {
                containers: vec![],
                label: "foo".into()
            }
        );
        assert_eq!(
            edge_labels(&events),
            vec![
                ("foo".to_string(), "bar".to_string()),
                ("bar".to_string(), "baz".to_string()),
            ]
        );
        assert_eq!(events.last(), Some(&GraphEvent::Done));
        assert!(tracker.is_visited(foo));
        assert!(tracker.is_visited(bar));
        assert!(tracker.is_visited(baz));
        assert_eq!(tracker.navigation().declaration_for_label("bar"), Some(bar));
        assert_eq!(tracker.navigation().uses_for_edge("foo", "bar").len(), 1);
    }

    #[test]
    fn self_recursion_emits_one_edge_and_terminates() {
        let mut builder = IndexBuilder::new();
        let top = builder.file("/w/m.cpp").unwrap();
        let (rec, rec_body) = builder
            .function(top, DeclKind::Function, "rec", "rec", span(1, 0, 1, 3), span(1, 5, 4, 0))
            .unwrap();
        builder.call(rec_body, rec, span(2, 0, 2, 3)).unwrap();
        let index = builder.build();

        let (events, tracker) = run_traversal(&index, &settings(), rec, rec_body);

        let roots = events
            .iter()
            .filter(|e| matches!(e, GraphEvent::Root { .. }))
            .count();
        assert_eq!(roots, 1);
        assert_eq!(edge_labels(&events), vec![("rec".to_string(), "rec".to_string())]);
        assert_eq!(tracker.visited_count(), 1);
    }

    #[test]
    fn max_level_one_skips_expansion() {
        let mut builder = IndexBuilder::new();
        let top = builder.file("/w/m.cpp").unwrap();
        let (foo, foo_body) = builder
            .function(top, DeclKind::Function, "foo", "foo", span(1, 0, 1, 3), span(1, 5, 4, 0))
            .unwrap();
        let (bar, _) = builder
            .function(top, DeclKind::Function, "bar", "bar", span(6, 0, 6, 3), span(6, 5, 9, 0))
            .unwrap();
        builder.call(foo_body, bar, span(2, 0, 2, 3)).unwrap();
        let index = builder.build();

        let mut s = settings();
        s.max_level = 1;
        let (events, tracker) = run_traversal(&index, &s, foo, foo_body);

        assert_eq!(events.len(), 2); // Root + Done
        assert_eq!(tracker.visited_count(), 0);
    }

    #[test]
    fn level_budget_is_shared_across_branches() {
        // foo calls a and b; both have bodies calling further. With
        // max_level = 3 the first branch consumes the budget, so the second
        // branch is not expanded.
        let mut builder = IndexBuilder::new();
        let top = builder.file("/w/m.cpp").unwrap();
        let (foo, foo_body) = builder
            .function(top, DeclKind::Function, "foo", "foo", span(1, 0, 1, 3), span(1, 5, 6, 0))
            .unwrap();
        let (a, a_body) = builder
            .function(top, DeclKind::Function, "a", "a", span(8, 0, 8, 1), span(8, 5, 11, 0))
            .unwrap();
        let (b, b_body) = builder
            .function(top, DeclKind::Function, "b", "b", span(13, 0, 13, 1), span(13, 5, 16, 0))
            .unwrap();
        let (a2, _) = builder
            .function(top, DeclKind::Function, "a2", "a2", span(18, 0, 18, 2), span(18, 5, 20, 0))
            .unwrap();
        let (b2, _) = builder
            .function(top, DeclKind::Function, "b2", "b2", span(22, 0, 22, 2), span(22, 5, 24, 0))
            .unwrap();
        builder.call(foo_body, a, span(2, 0, 2, 1)).unwrap();
        builder.call(foo_body, b, span(3, 0, 3, 1)).unwrap();
        builder.call(a_body, a2, span(9, 0, 9, 2)).unwrap();
        builder.call(b_body, b2, span(14, 0, 14, 2)).unwrap();
        let index = builder.build();

        let mut s = settings();
        s.max_level = 3;
        let (events, tracker) = run_traversal(&index, &s, foo, foo_body);

        assert_eq!(
            edge_labels(&events),
            vec![
                ("foo".to_string(), "a".to_string()),
                ("a".to_string(), "a2".to_string()),
                ("foo".to_string(), "b".to_string()),
            ]
        );
        assert!(tracker.is_visited(a));
        assert!(!tracker.is_visited(b));
        assert!(!tracker.is_visited(b2));
        assert!(!tracker.is_visited(a2));
    }

    #[test]
    fn uses_interleave_with_nested_blocks() {
        // foo's body: call a; block { call b }; call c — expect a, b, c.
        let mut builder = IndexBuilder::new();
        let top = builder.file("/w/m.cpp").unwrap();
        let (foo, foo_body) = builder
            .function(top, DeclKind::Function, "foo", "foo", span(1, 0, 1, 3), span(1, 5, 10, 0))
            .unwrap();
        let (a, _) = builder
            .function(top, DeclKind::Function, "a", "a", span(12, 0, 12, 1), span(12, 5, 13, 0))
            .unwrap();
        let (b, _) = builder
            .function(top, DeclKind::Function, "b", "b", span(15, 0, 15, 1), span(15, 5, 16, 0))
            .unwrap();
        let (c, _) = builder
            .function(top, DeclKind::Function, "c", "c", span(18, 0, 18, 1), span(18, 5, 19, 0))
            .unwrap();
        let block = builder.block(foo_body, span(3, 0, 6, 0)).unwrap();
        builder.call(foo_body, a, span(2, 0, 2, 1)).unwrap();
        builder.call(block, b, span(4, 0, 4, 1)).unwrap();
        builder.call(foo_body, c, span(7, 0, 7, 1)).unwrap();
        let index = builder.build();

        let mut s = settings();
        s.max_level = 2; // expand only the root
        let (events, _) = run_traversal(&index, &s, foo, foo_body);

        assert_eq!(
            edge_labels(&events),
            vec![
                ("foo".to_string(), "a".to_string()),
                ("foo".to_string(), "b".to_string()),
                ("foo".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn non_executable_children_are_not_flattened() {
        // A local class inside foo's body; its method body must not be
        // scanned as part of foo.
        let mut builder = IndexBuilder::new();
        let top = builder.file("/w/m.cpp").unwrap();
        let (foo, foo_body) = builder
            .function(top, DeclKind::Function, "foo", "foo", span(1, 0, 1, 3), span(1, 5, 10, 0))
            .unwrap();
        let (helper, _) = builder
            .function(top, DeclKind::Function, "h", "h", span(12, 0, 12, 1), span(12, 5, 13, 0))
            .unwrap();
        let (_, local_class) = builder
            .class(foo_body, "L", "foo::L", span(2, 0, 2, 1), span(2, 2, 6, 0))
            .unwrap();
        let (_, method_body) = builder
            .function(local_class, DeclKind::Method, "m", "foo::L::m", span(3, 0, 3, 1), span(3, 5, 5, 0))
            .unwrap();
        builder.call(method_body, helper, span(4, 0, 4, 1)).unwrap();
        let index = builder.build();

        let (events, _) = run_traversal(&index, &settings(), foo, foo_body);
        assert!(edge_labels(&events).is_empty());
    }

    #[test]
    fn incoming_arcs_mark_reverse_edges() {
        let mut builder = IndexBuilder::new();
        let top = builder.file("/w/m.cpp").unwrap();
        let (root, root_body) = builder
            .function(top, DeclKind::Function, "root", "root", span(1, 0, 1, 4), span(1, 5, 3, 0))
            .unwrap();
        let (caller, caller_body) = builder
            .function(top, DeclKind::Function, "caller", "caller", span(5, 0, 5, 6), span(5, 8, 8, 0))
            .unwrap();
        builder.call(caller_body, root, span(6, 0, 6, 4)).unwrap();
        let index = builder.build();

        let mut s = settings();
        s.draw_incoming_arcs = true;
        let (events, tracker) = run_traversal(&index, &s, root, root_body);

        let reverse: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GraphEvent::Edge {
                    source_containers,
                    source_label,
                    target_label,
                    ..
                } => Some((source_containers.clone(), source_label.clone(), target_label.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(reverse.len(), 1);
        let (containers, source, target) = &reverse[0];
        assert_eq!(containers[0], "Uses of root");
        assert_eq!(source, "caller");
        assert_eq!(target, "root");
        assert_eq!(
            tracker.navigation().declaration_for_label("caller"),
            Some(caller)
        );
    }
}
