//! TransitionCoordinator - animates between successive layouts.
//!
//! The coordinator owns the last rendered sprite per node and at most one
//! track (running animation) per node. Reconciling a new layout classifies
//! every node as entering, moving, stable or exiting and installs tracks
//! only for the ones that change; stable nodes are left untouched.
//!
//! Time is supplied by the host through [`TransitionCoordinator::advance`];
//! with a zero duration every track completes on the next `advance(0.0)`,
//! which keeps tests synchronous.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::easing::cubic_in_out;
use super::sprite::{NodeSprite, SpriteState};
use crate::layout::LayoutResult;

/// Configuration for animated transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransitionConfig {
    /// Length of one node's animation in milliseconds.
    pub duration_ms: f32,
    /// Extra delay per level of depth, for a cascading effect.
    pub stagger_ms: f32,
    /// Movement below this distance counts as unchanged.
    pub epsilon: f32,
    /// Scale a node enters from and exits to.
    pub entering_scale: f32,
    /// Opacity a node enters from and exits to.
    pub entering_opacity: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 450.0,
            stagger_ms: 40.0,
            epsilon: 0.5,
            entering_scale: 0.3,
            entering_opacity: 0.0,
        }
    }
}

impl TransitionConfig {
    /// No animation: every transition lands on the next `advance(0.0)`.
    pub fn immediate() -> Self {
        Self {
            duration_ms: 0.0,
            stagger_ms: 0.0,
            ..Default::default()
        }
    }
}

/// How a reconcile classified the nodes, each list in draw order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    /// No previous sprite: grows out of the nearest rendered ancestor.
    pub entering: Vec<String>,
    /// Previous sprite differs from the new placement.
    pub moving: Vec<String>,
    /// Previous sprite already matches; no track installed.
    pub stable: Vec<String>,
    /// Rendered but no longer placed: shrinks into its nearest placed ancestor.
    pub exiting: Vec<String>,
}

/// Outcome of one `advance` step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Nodes whose exit finished and that left the render set.
    pub exited: Vec<String>,
    /// Whether any track is still running.
    pub animating: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum TrackKind {
    Enter,
    Move,
    /// Shrink into the live position of `follow`. `anchor` is the collapsing
    /// node when a collapse started the exit.
    Exit {
        anchor: Option<String>,
        follow: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct Track {
    from: SpriteState,
    to: SpriteState,
    delay_ms: f32,
    elapsed_ms: f32,
    kind: TrackKind,
}

impl Track {
    fn new(from: SpriteState, to: SpriteState, delay_ms: f32, kind: TrackKind) -> Self {
        Self {
            from,
            to,
            delay_ms,
            elapsed_ms: 0.0,
            kind,
        }
    }

    fn progress(&self, duration_ms: f32) -> f32 {
        if self.elapsed_ms < self.delay_ms {
            return 0.0;
        }
        if duration_ms <= 0.0 {
            return 1.0;
        }
        ((self.elapsed_ms - self.delay_ms) / duration_ms).min(1.0)
    }

    fn is_exit(&self) -> bool {
        matches!(self.kind, TrackKind::Exit { .. })
    }
}

/// Diffs layouts against the rendered state and drives the animation.
pub struct TransitionCoordinator {
    config: TransitionConfig,
    sprites: HashMap<String, NodeSprite>,
    /// Draw order of the sprites.
    order: Vec<String>,
    tracks: HashMap<String, Track>,
}

impl TransitionCoordinator {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            sprites: HashMap::new(),
            order: Vec::new(),
            tracks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Drop all rendered state, e.g. when switching documents.
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.order.clear();
        self.tracks.clear();
    }

    pub fn sprite(&self, id: &str) -> Option<&NodeSprite> {
        self.sprites.get(id)
    }

    /// Sprites in draw order.
    pub fn sprites(&self) -> impl Iterator<Item = (&str, &NodeSprite)> {
        self.order
            .iter()
            .filter_map(|id| self.sprites.get(id).map(|s| (id.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn is_animating(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn is_exiting(&self, id: &str) -> bool {
        self.tracks.get(id).is_some_and(Track::is_exit)
    }

    /// Reconcile the rendered sprites with a freshly computed layout.
    ///
    /// A node that already has a track gets a new one starting from its
    /// current interpolated state, unless that track is already heading to
    /// the same place.
    pub fn reconcile(&mut self, layout: &LayoutResult) -> TransitionPlan {
        let mut plan = TransitionPlan::default();
        let epsilon = self.config.epsilon;

        // Origins are resolved against the sprites as they were before this
        // reconcile, so nested entering nodes all grow out of the same parent.
        let origins: HashMap<&str, (f32, f32)> = layout
            .iter()
            .filter(|(id, _)| !self.sprites.contains_key(*id))
            .map(|(id, _)| (id, self.entry_origin(id, layout)))
            .collect();

        let base_level = layout
            .iter()
            .filter(|(id, placement)| {
                self.sprites
                    .get(*id)
                    .is_none_or(|s| !s.state.approx_eq(&SpriteState::settled(placement), epsilon))
            })
            .map(|(_, placement)| placement.level)
            .min()
            .unwrap_or(0);

        for (id, placement) in layout.iter() {
            let target = SpriteState::settled(placement);
            let delay = self.stagger(placement.level - base_level);

            match self.sprites.get_mut(id) {
                None => {
                    let (x, y) = origins.get(id).copied().unwrap_or((target.x, target.y));
                    let from = target.at(
                        x,
                        y,
                        self.config.entering_opacity,
                        self.config.entering_scale,
                    );
                    self.sprites.insert(
                        id.to_string(),
                        NodeSprite {
                            state: from,
                            level: placement.level,
                            parent: placement.parent.clone(),
                        },
                    );
                    self.tracks
                        .insert(id.to_string(), Track::new(from, target, delay, TrackKind::Enter));
                    plan.entering.push(id.to_string());
                }
                Some(sprite) => {
                    sprite.level = placement.level;
                    sprite.parent = placement.parent.clone();
                    let current = sprite.state;

                    match self.tracks.get(id) {
                        None if current.approx_eq(&target, epsilon) => {
                            plan.stable.push(id.to_string());
                        }
                        Some(track) if !track.is_exit() && track.to.approx_eq(&target, epsilon) => {
                            plan.moving.push(id.to_string());
                        }
                        _ => {
                            self.tracks.insert(
                                id.to_string(),
                                Track::new(current, target, delay, TrackKind::Move),
                            );
                            plan.moving.push(id.to_string());
                        }
                    }
                }
            }
        }

        // Rendered but no longer placed
        let leaving: Vec<String> = self
            .order
            .iter()
            .filter(|id| !layout.contains(id))
            .cloned()
            .collect();
        for id in &leaving {
            if !self.is_exiting(id) {
                let follow = self.exit_anchor(id, layout);
                self.start_exit(id, follow, None, 0.0);
            }
            plan.exiting.push(id.clone());
        }

        self.order = layout.ids().iter().cloned().chain(leaving).collect();

        log::debug!(
            "reconcile: {} entering, {} moving, {} stable, {} exiting",
            plan.entering.len(),
            plan.moving.len(),
            plan.stable.len(),
            plan.exiting.len()
        );
        plan
    }

    /// Animate `ids` into the live position of `anchor` while fading out.
    ///
    /// Used when a node collapses: the descendants leave before the collapse
    /// flag is committed and the layout recomputed. The anchor may still be
    /// moving; the exits chase it every step. Returns the number of exits
    /// started.
    pub fn begin_exit(&mut self, anchor: &str, ids: &[String]) -> usize {
        if !self.sprites.contains_key(anchor) {
            return 0;
        }
        let deepest = ids
            .iter()
            .filter_map(|id| self.sprites.get(id))
            .map(|s| s.level)
            .max()
            .unwrap_or(0);

        let mut started = 0;
        for id in ids {
            let Some(level) = self.sprites.get(id).map(|s| s.level) else {
                continue;
            };
            // Leaves retract first
            let delay = self.stagger(deepest - level);
            self.start_exit(id, Some(anchor.to_string()), Some(anchor), delay);
            started += 1;
        }
        started
    }

    /// Whether any exit started for `anchor` is still running.
    pub fn exit_pending(&self, anchor: &str) -> bool {
        self.tracks.values().any(|track| {
            matches!(&track.kind, TrackKind::Exit { anchor: Some(a), .. } if a == anchor)
        })
    }

    /// Jump every exit started for `anchor` to its end and drop the sprites.
    pub fn finish_exits(&mut self, anchor: &str) -> Vec<String> {
        let finished: Vec<String> = self
            .order
            .iter()
            .filter(|id| {
                self.tracks.get(*id).is_some_and(|track| {
                    matches!(&track.kind, TrackKind::Exit { anchor: Some(a), .. } if a == anchor)
                })
            })
            .cloned()
            .collect();
        for id in &finished {
            self.remove_sprite(id);
        }
        finished
    }

    /// Step every track by `dt_ms` milliseconds.
    pub fn advance(&mut self, dt_ms: f32) -> AdvanceReport {
        let duration = self.config.duration_ms;
        let mut finished = Vec::new();

        // Exits chase the live position of what they follow, so everything
        // else steps first.
        for exits in [false, true] {
            for id in &self.order {
                let Some(track) = self.tracks.get_mut(id) else {
                    continue;
                };
                if track.is_exit() != exits {
                    continue;
                }
                if let TrackKind::Exit {
                    follow: Some(follow),
                    ..
                } = &track.kind
                {
                    if let Some(target) = self.sprites.get(follow) {
                        track.to.x = target.state.x;
                        track.to.y = target.state.y;
                    }
                }
                track.elapsed_ms += dt_ms.max(0.0);
                let t = track.progress(duration);
                let state = track.from.interpolate(&track.to, cubic_in_out(t));
                if let Some(sprite) = self.sprites.get_mut(id) {
                    sprite.state = state;
                }
                if t >= 1.0 {
                    finished.push((id.clone(), track.is_exit()));
                }
            }
        }

        let mut report = AdvanceReport::default();
        for (id, exited) in finished {
            if exited {
                self.remove_sprite(&id);
                report.exited.push(id);
            } else {
                self.tracks.remove(&id);
            }
        }
        report.animating = self.is_animating();
        report
    }

    fn remove_sprite(&mut self, id: &str) {
        self.tracks.remove(id);
        self.sprites.remove(id);
        self.order.retain(|other| other != id);
    }

    fn start_exit(
        &mut self,
        id: &str,
        follow: Option<String>,
        anchor: Option<&str>,
        delay_ms: f32,
    ) {
        let Some(sprite) = self.sprites.get(id) else {
            return;
        };
        let current = sprite.state;
        let (x, y) = follow
            .as_deref()
            .and_then(|f| self.sprites.get(f))
            .map_or((current.x, current.y), |s| (s.state.x, s.state.y));
        let to = current.at(
            x,
            y,
            self.config.entering_opacity,
            self.config.entering_scale,
        );
        self.tracks.insert(
            id.to_string(),
            Track::new(
                current,
                to,
                delay_ms,
                TrackKind::Exit {
                    anchor: anchor.map(str::to_string),
                    follow,
                },
            ),
        );
    }

    fn stagger(&self, level_offset: i32) -> f32 {
        self.config.stagger_ms * level_offset.max(0) as f32
    }

    /// Live position of the nearest ancestor that was already rendered, or
    /// the placement of the topmost newly placed ancestor.
    fn entry_origin(&self, id: &str, layout: &LayoutResult) -> (f32, f32) {
        let Some(placement) = layout.get(id) else {
            return (0.0, 0.0);
        };
        let mut origin = (placement.x, placement.y);
        let mut current = placement.parent.as_deref();
        while let Some(parent) = current {
            if let Some(sprite) = self.sprites.get(parent) {
                return (sprite.state.x, sprite.state.y);
            }
            match layout.get(parent) {
                Some(parent_placement) => {
                    origin = (parent_placement.x, parent_placement.y);
                    current = parent_placement.parent.as_deref();
                }
                None => break,
            }
        }
        origin
    }

    /// Nearest ancestor that is still placed.
    fn exit_anchor(&self, id: &str, layout: &LayoutResult) -> Option<String> {
        let mut current = self.sprites.get(id)?.parent.clone();
        while let Some(parent) = current {
            if layout.contains(&parent) {
                return Some(parent);
            }
            current = self.sprites.get(&parent).and_then(|s| s.parent.clone());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphPayload, GraphStore, RawEdge, RawNode, visible_nodes};
    use crate::layout::{LayoutConfig, MindMapLayout};

    fn store() -> GraphStore {
        // root → a → (a1, a2), root → b → b1
        GraphStore::from_payload(GraphPayload::new(
            vec![
                RawNode::new("root", "Doc"),
                RawNode::new("a", "Topic A"),
                RawNode::new("a1", "Detail one"),
                RawNode::new("a2", "Detail two"),
                RawNode::new("b", "Topic B"),
                RawNode::new("b1", "Detail three"),
            ],
            vec![
                RawEdge::new("root", "a"),
                RawEdge::new("a", "a1"),
                RawEdge::new("a", "a2"),
                RawEdge::new("root", "b"),
                RawEdge::new("b", "b1"),
            ],
        ))
    }

    fn layout_of(store: &GraphStore) -> LayoutResult {
        MindMapLayout::new(LayoutConfig::default()).compute(store, &visible_nodes(store))
    }

    fn settled(coordinator: &TransitionCoordinator, layout: &LayoutResult) -> bool {
        layout.iter().all(|(id, placement)| {
            coordinator
                .sprite(id)
                .is_some_and(|s| s.state.approx_eq(&SpriteState::settled(placement), 0.01))
        }) && coordinator.len() == layout.len()
    }

    #[test]
    fn test_first_reconcile_everything_enters() {
        let store = store();
        let layout = layout_of(&store);
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::immediate());

        let plan = coordinator.reconcile(&layout);
        assert_eq!(plan.entering, vec!["root", "a", "b"]);
        assert!(plan.moving.is_empty() && plan.exiting.is_empty());

        let report = coordinator.advance(0.0);
        assert!(!report.animating);
        assert!(settled(&coordinator, &layout));
    }

    #[test]
    fn test_same_layout_is_stable() {
        let store = store();
        let layout = layout_of(&store);
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::immediate());
        coordinator.reconcile(&layout);
        coordinator.advance(0.0);

        let plan = coordinator.reconcile(&layout);
        assert!(plan.entering.is_empty() && plan.moving.is_empty() && plan.exiting.is_empty());
        assert_eq!(plan.stable.len(), 3);
        assert!(!coordinator.is_animating());
    }

    #[test]
    fn test_expand_classifies_new_moved_stable() {
        let mut store = store();
        store.set_collapsed("b", false).unwrap();
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::immediate());
        coordinator.reconcile(&layout_of(&store));
        coordinator.advance(0.0);

        store.set_collapsed("a", false).unwrap();
        let layout = layout_of(&store);
        let plan = coordinator.reconcile(&layout);
        assert_eq!(plan.entering, vec!["a1", "a2"]);
        // a's children now share a row with b1, so b's subtree is pushed away
        assert!(plan.moving.contains(&"b".to_string()));
        assert!(plan.moving.contains(&"b1".to_string()));
        assert!(!plan.stable.contains(&"b".to_string()));
        assert!(plan.exiting.is_empty());

        coordinator.advance(0.0);
        assert!(settled(&coordinator, &layout));
    }

    #[test]
    fn test_entering_nodes_start_at_parent() {
        let mut store = store();
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::default());
        coordinator.reconcile(&layout_of(&store));
        coordinator.advance(10_000.0);
        let parent = coordinator.sprite("a").unwrap().state;

        store.set_collapsed("a", false).unwrap();
        coordinator.reconcile(&layout_of(&store));
        let child = coordinator.sprite("a1").unwrap().state;
        assert_eq!((child.x, child.y), (parent.x, parent.y));
        assert_eq!(child.opacity, 0.0);
        assert_eq!(child.scale, 0.3);
    }

    #[test]
    fn test_interpolates_over_time() {
        let store = store();
        let layout = layout_of(&store);
        let config = TransitionConfig {
            stagger_ms: 0.0,
            ..Default::default()
        };
        let mut coordinator = TransitionCoordinator::new(config);
        coordinator.reconcile(&layout);

        let report = coordinator.advance(225.0);
        assert!(report.animating);
        let half = coordinator.sprite("a").unwrap().state;
        assert!((half.opacity - 0.5).abs() < 1e-3);

        let report = coordinator.advance(225.0);
        assert!(!report.animating);
        assert!(settled(&coordinator, &layout));
    }

    #[test]
    fn test_stagger_delays_deeper_levels() {
        let store = store();
        let layout = layout_of(&store);
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::default());
        coordinator.reconcile(&layout);

        coordinator.advance(30.0);
        assert!(coordinator.sprite("root").unwrap().state.opacity > 0.0);
        assert_eq!(coordinator.sprite("a").unwrap().state.opacity, 0.0);
    }

    #[test]
    fn test_begin_exit_then_commit() {
        let mut store = store();
        store.set_collapsed("a", false).unwrap();
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::default());
        coordinator.reconcile(&layout_of(&store));
        coordinator.advance(10_000.0);
        let anchor = coordinator.sprite("a").unwrap().state;

        let ids = vec!["a1".to_string(), "a2".to_string()];
        assert_eq!(coordinator.begin_exit("a", &ids), 2);
        assert!(coordinator.exit_pending("a"));
        assert!(coordinator.is_exiting("a1"));

        let report = coordinator.advance(10_000.0);
        assert_eq!(report.exited, ids);
        assert!(!coordinator.exit_pending("a"));
        assert!(coordinator.sprite("a1").is_none());
        // the anchor itself did not move
        assert_eq!(coordinator.sprite("a").unwrap().state, anchor);
    }

    #[test]
    fn test_exit_moves_toward_anchor() {
        let mut store = store();
        store.set_collapsed("a", false).unwrap();
        let config = TransitionConfig {
            stagger_ms: 0.0,
            ..Default::default()
        };
        let mut coordinator = TransitionCoordinator::new(config);
        coordinator.reconcile(&layout_of(&store));
        coordinator.advance(10_000.0);
        let anchor = coordinator.sprite("a").unwrap().state;
        let start = coordinator.sprite("a1").unwrap().state;

        coordinator.begin_exit("a", &["a1".to_string()]);
        coordinator.advance(225.0);
        let mid = coordinator.sprite("a1").unwrap().state;
        let dist = |s: SpriteState| ((s.x - anchor.x).powi(2) + (s.y - anchor.y).powi(2)).sqrt();
        assert!(dist(mid) < dist(start));
        assert!(mid.opacity < 1.0);
    }

    #[test]
    fn test_exit_follows_anchor_that_is_still_moving() {
        let mut store = store();
        store.set_collapsed("a", false).unwrap();
        let config = TransitionConfig {
            stagger_ms: 0.0,
            ..Default::default()
        };
        let mut coordinator = TransitionCoordinator::new(config);
        coordinator.reconcile(&layout_of(&store));
        coordinator.advance(10_000.0);

        // expanding b pushes a away from it
        store.set_collapsed("b", false).unwrap();
        let plan = coordinator.reconcile(&layout_of(&store));
        assert!(plan.moving.contains(&"a".to_string()));
        coordinator.advance(100.0);
        let at_click = coordinator.sprite("a").unwrap().state;

        coordinator.begin_exit("a", &["a1".to_string(), "a2".to_string()]);
        coordinator.advance(440.0);
        let anchor = coordinator.sprite("a").unwrap().state;
        let child = coordinator.sprite("a1").unwrap().state;

        let moved = ((anchor.x - at_click.x).powi(2) + (anchor.y - at_click.y).powi(2)).sqrt();
        assert!(moved > 1.0);
        let gap = ((child.x - anchor.x).powi(2) + (child.y - anchor.y).powi(2)).sqrt();
        assert!(gap < 1.0, "exiting child is {gap} away from its anchor");
    }

    #[test]
    fn test_reexpand_mid_exit_reverses_from_current_position() {
        let mut store = store();
        store.set_collapsed("a", false).unwrap();
        let expanded = layout_of(&store);
        let config = TransitionConfig {
            stagger_ms: 0.0,
            ..Default::default()
        };
        let mut coordinator = TransitionCoordinator::new(config);
        coordinator.reconcile(&expanded);
        coordinator.advance(10_000.0);

        coordinator.begin_exit("a", &["a1".to_string(), "a2".to_string()]);
        coordinator.advance(200.0);
        let mid = coordinator.sprite("a1").unwrap().state;

        // The collapse never committed, so the layout still has a1 placed
        let plan = coordinator.reconcile(&expanded);
        assert!(plan.moving.contains(&"a1".to_string()));
        assert!(!coordinator.is_exiting("a1"));
        assert!(!coordinator.exit_pending("a"));
        // restarting does not jump
        coordinator.advance(0.0);
        assert_eq!(coordinator.sprite("a1").unwrap().state, mid);

        coordinator.advance(10_000.0);
        assert!(settled(&coordinator, &expanded));
    }

    #[test]
    fn test_finish_exits_drops_sprites() {
        let mut store = store();
        store.set_collapsed("a", false).unwrap();
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::default());
        coordinator.reconcile(&layout_of(&store));
        coordinator.advance(10_000.0);

        coordinator.begin_exit("a", &["a1".to_string(), "a2".to_string()]);
        let finished = coordinator.finish_exits("a");
        assert_eq!(finished, vec!["a1", "a2"]);
        assert!(!coordinator.exit_pending("a"));
        assert_eq!(coordinator.len(), 3);
    }

    #[test]
    fn test_removed_nodes_exit_on_reconcile() {
        let mut store = store();
        store.set_collapsed("a", false).unwrap();
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::immediate());
        coordinator.reconcile(&layout_of(&store));
        coordinator.advance(0.0);

        store.set_collapsed("a", true).unwrap();
        let collapsed = layout_of(&store);
        let plan = coordinator.reconcile(&collapsed);
        assert_eq!(plan.exiting, vec!["a1", "a2"]);

        let report = coordinator.advance(0.0);
        assert_eq!(report.exited, vec!["a1", "a2"]);
        assert!(settled(&coordinator, &collapsed));
    }
}
