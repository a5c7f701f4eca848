//! MindMapSession - one visualizer instance.
//!
//! Owns the graph of the active document and drives the whole pipeline:
//! collapse flags → visible set → layout → transition → frame. It also
//! runs the fetch lifecycle without an async runtime: the host performs
//! the network request and hands the result back with the ticket it was
//! issued, so a result for a superseded fetch or document is dropped.
//!
//! Collapsing is two-phase. The node is marked pending, its visible
//! descendants animate into it, and only when that exit has finished is
//! the collapse flag committed and the layout recomputed.

use serde::Serialize;

use crate::cache::{GraphCache, KeyValueStore};
use crate::config::MindMapConfig;
use crate::error::{MindMapError, Result};
use crate::graph::{GraphPayload, GraphStore, NodeRecord, ToggleEffect, VisibleSet, visible_nodes};
use crate::interaction::{InteractionController, PointerAction, Viewport};
use crate::layout::{LayoutResult, MindMapLayout};
use crate::query::{QueryRequest, QuerySender};
use crate::spatial::{HitIndex, HitRegion};
use crate::transition::{Frame, TransitionCoordinator};

/// Screen margin kept around the graph when fitting it into view.
const FIT_PADDING: f32 = 40.0;

/// Handle for one outstanding graph fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTicket {
    pub id: u32,
    pub document_id: String,
}

/// Result of opening a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum OpenOutcome {
    /// The graph is ready (cache hit, or the document was already open).
    Cached,
    /// The host must fetch the graph and call `complete_fetch`.
    Fetch(FetchTicket),
    /// A fetch for this document is already running.
    AlreadyLoading,
}

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchResolution {
    /// The fetched graph was loaded and cached.
    Applied,
    /// The fetch failed; the single-root fallback graph was loaded.
    FellBack,
    /// The ticket no longer matches the active fetch; nothing changed.
    Discarded,
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleOutcome {
    /// Children are now visible.
    Expanded,
    /// Descendants are animating out; the flag commits when they finish.
    Collapsing,
    /// The collapse flag is set.
    Collapsed,
    /// Unknown node or a node without children.
    Ignored,
}

impl From<ToggleEffect> for ToggleOutcome {
    fn from(effect: ToggleEffect) -> Self {
        match effect {
            ToggleEffect::Collapsed => ToggleOutcome::Collapsed,
            ToggleEffect::Expanded => ToggleOutcome::Expanded,
            ToggleEffect::Ignored => ToggleOutcome::Ignored,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveDocument {
    id: String,
    display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FetchState {
    Idle,
    InFlight { ticket: u32 },
}

/// The visualizer for the currently displayed document.
pub struct MindMapSession<S: KeyValueStore> {
    config: MindMapConfig,
    cache: GraphCache<S>,
    queries: QuerySender,

    document: Option<ActiveDocument>,
    fetch: FetchState,
    next_ticket: u32,

    store: GraphStore,
    layout_engine: MindMapLayout,
    layout: LayoutResult,
    coordinator: TransitionCoordinator,

    hits: HitIndex,
    controller: InteractionController,
    viewport: Viewport,
    screen: Option<(f32, f32)>,
    needs_fit: bool,
}

impl<S: KeyValueStore> MindMapSession<S> {
    pub fn new(config: MindMapConfig, store: S, queries: QuerySender) -> Self {
        Self {
            layout_engine: MindMapLayout::new(config.layout.clone()),
            coordinator: TransitionCoordinator::new(config.transition.clone()),
            controller: InteractionController::new(config.interaction.clone()),
            config,
            cache: GraphCache::new(store),
            queries,
            document: None,
            fetch: FetchState::Idle,
            next_ticket: 1,
            store: GraphStore::from_payload(GraphPayload::default()),
            layout: LayoutResult::default(),
            hits: HitIndex::new(),
            viewport: Viewport::default(),
            screen: None,
            needs_fit: false,
        }
    }

    // =========================================================================
    // Document lifecycle
    // =========================================================================

    /// Make `document_id` the active document.
    ///
    /// Switching documents drops the previous graph and invalidates any
    /// fetch still running for it.
    pub fn open_document(&mut self, document_id: &str, display_name: &str) -> OpenOutcome {
        if self.document_id() == Some(document_id) {
            if self.is_loading() {
                log::debug!("fetch for {document_id} already in flight");
                return OpenOutcome::AlreadyLoading;
            }
            return OpenOutcome::Cached;
        }

        if let FetchState::InFlight { ticket } = self.fetch {
            log::debug!("fetch #{ticket} superseded by switch to {document_id}");
        }
        self.fetch = FetchState::Idle;
        self.document = Some(ActiveDocument {
            id: document_id.to_string(),
            display_name: display_name.to_string(),
        });
        self.store = GraphStore::from_payload(GraphPayload::default());
        self.layout = LayoutResult::default();
        self.coordinator.clear();
        self.hits.clear();
        self.controller.pointer_cancel();
        self.needs_fit = true;

        match self.cache.get(document_id) {
            Some(payload) if !payload.is_empty() => {
                log::info!("opened {document_id} from cache");
                self.load(GraphStore::from_payload(payload));
                OpenOutcome::Cached
            }
            Some(_) => {
                // An empty graph is never a valid entry
                log::warn!("dropping empty cache entry for {document_id}");
                if let Err(err) = self.cache.invalidate(document_id) {
                    log::warn!("could not drop cache entry for {document_id}: {err}");
                }
                OpenOutcome::Fetch(self.issue_ticket(document_id))
            }
            None => OpenOutcome::Fetch(self.issue_ticket(document_id)),
        }
    }

    /// Re-fetch the active document, bypassing the cache.
    ///
    /// Returns `None` when no document is open or when a fetch is already
    /// running; in the latter case the running fetch serves the refresh.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        let document_id = self.document_id()?.to_string();
        if let FetchState::InFlight { ticket } = self.fetch {
            log::debug!("refresh of {document_id} coalesced into fetch #{ticket}");
            return None;
        }
        Some(self.issue_ticket(&document_id))
    }

    /// Hand back the outcome of the fetch identified by `ticket`.
    pub fn complete_fetch(
        &mut self,
        ticket: u32,
        result: std::result::Result<GraphPayload, String>,
    ) -> FetchResolution {
        if self.fetch != (FetchState::InFlight { ticket }) {
            log::debug!("discarding result of stale fetch #{ticket}");
            return FetchResolution::Discarded;
        }
        self.fetch = FetchState::Idle;
        let Some(document) = self.document.clone() else {
            return FetchResolution::Discarded;
        };

        let payload = result.and_then(|payload| {
            if payload.is_empty() {
                Err("backend returned an empty graph".to_string())
            } else {
                Ok(payload)
            }
        });

        match payload {
            Ok(payload) => {
                let store = GraphStore::from_payload(payload);
                if let Err(err) = self.cache.put(&document.id, &store.to_payload()) {
                    log::warn!("could not cache graph for {}: {err}", document.id);
                }
                log::info!(
                    "loaded {}: {} nodes, {} edges",
                    document.id,
                    store.node_count(),
                    store.edge_count()
                );
                self.load(store);
                FetchResolution::Applied
            }
            Err(message) => {
                let err = MindMapError::Fetch {
                    document_id: document.id.clone(),
                    message,
                };
                log::warn!("{err}; showing fallback graph");
                self.load(GraphStore::fallback(&document.display_name));
                FetchResolution::FellBack
            }
        }
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.id.as_str())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.fetch, FetchState::InFlight { .. })
    }

    fn issue_ticket(&mut self, document_id: &str) -> FetchTicket {
        let id = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.fetch = FetchState::InFlight { ticket: id };
        log::info!("fetch #{id} issued for {document_id}");
        FetchTicket {
            id,
            document_id: document_id.to_string(),
        }
    }

    fn load(&mut self, store: GraphStore) {
        self.store = store;
        self.relayout();
        if self.needs_fit {
            self.fit_view();
        }
    }

    // =========================================================================
    // Collapse / expand
    // =========================================================================

    /// Toggle a node's collapse state. Unknown ids and leaves are ignored.
    pub fn toggle(&mut self, id: &str) -> ToggleOutcome {
        match self.try_toggle(id) {
            Ok(outcome) => {
                log::debug!("toggle {id}: {outcome:?}");
                outcome
            }
            Err(err) => {
                log::debug!("toggle ignored: {err}");
                ToggleOutcome::Ignored
            }
        }
    }

    fn try_toggle(&mut self, id: &str) -> Result<ToggleOutcome> {
        let node = self
            .store
            .node(id)
            .ok_or_else(|| MindMapError::UnknownNode(id.to_string()))?;
        if !node.has_children {
            return Ok(ToggleOutcome::Ignored);
        }

        // Toggling again mid-exit cancels the collapse; the exiting
        // descendants turn around from wherever they are.
        if self.store.is_collapse_pending(id) {
            self.commit_pending_collapses(Some(id), true)?;
            self.store.set_collapse_pending(id, false)?;
            self.relayout();
            return Ok(ToggleOutcome::Expanded);
        }

        self.commit_pending_collapses(None, true)?;

        let visible = visible_nodes(&self.store);
        let leaving: Vec<String> = if self.store.is_collapsed(id) || !visible.contains(id) {
            Vec::new()
        } else {
            self.store
                .descendants(id)
                .into_iter()
                .filter(|n| {
                    visible.contains(&n.id) && self.coordinator.sprite(&n.id).is_some()
                })
                .map(|n| n.id.clone())
                .collect()
        };

        if leaving.is_empty() {
            // Expanding, or nothing on screen to animate away
            let effect = self.store.toggle(id)?;
            self.relayout();
            return Ok(effect.into());
        }

        self.store.set_collapse_pending(id, true)?;
        self.coordinator.begin_exit(id, &leaving);
        self.advance(0.0);

        Ok(if self.store.is_collapse_pending(id) {
            ToggleOutcome::Collapsing
        } else {
            ToggleOutcome::Collapsed
        })
    }

    /// Commit pending collapses whose exit finished, or all of them when
    /// `force` is set (their exits jump to the end). `except` is skipped.
    fn commit_pending_collapses(&mut self, except: Option<&str>, force: bool) -> Result<()> {
        let mut committed = false;
        for id in self.store.pending_collapses() {
            if except == Some(id.as_str()) {
                continue;
            }
            if force {
                self.coordinator.finish_exits(&id);
            } else if self.coordinator.exit_pending(&id) {
                continue;
            }
            self.store.set_collapse_pending(&id, false)?;
            self.store.set_collapsed(&id, true)?;
            committed = true;
        }
        if committed {
            self.relayout();
        }
        Ok(())
    }

    /// Recompute the layout and reconcile it with what is on screen. The
    /// viewport is left alone.
    fn relayout(&mut self) {
        let visible = visible_nodes(&self.store);
        self.layout = self.layout_engine.compute(&self.store, &visible);
        self.coordinator.reconcile(&self.layout);
        self.rebuild_hits();
    }

    // =========================================================================
    // Animation and rendering
    // =========================================================================

    /// Step animations by `dt_ms`. Returns whether another tick is needed.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        let report = self.coordinator.advance(dt_ms);
        if !report.exited.is_empty() {
            log::debug!("{} node(s) finished exiting", report.exited.len());
        }
        if let Err(err) = self.commit_pending_collapses(None, false) {
            log::warn!("could not commit collapse: {err}");
        }
        self.rebuild_hits();
        self.coordinator.is_animating()
    }

    /// Render model for the current tick.
    pub fn frame(&self) -> Frame {
        Frame::build(
            &self.store,
            &self.coordinator,
            self.layout_engine.config().orientation,
            self.viewport,
        )
    }

    fn rebuild_hits(&mut self) {
        let orientation = self.layout_engine.config().orientation;
        let radius = self.controller.config().toggle_radius;
        let mut regions = Vec::with_capacity(self.coordinator.len() * 2);

        for (order, (id, sprite)) in self.coordinator.sprites().enumerate() {
            if self.coordinator.is_exiting(id) {
                continue;
            }
            let Some(node) = self.store.node(id) else {
                continue;
            };
            let state = sprite.state;
            let (width, height) = state.scaled_size();
            regions.push(HitRegion::body(id, order, state.x, state.y, width, height));
            if node.has_children {
                regions.push(HitRegion::toggle(
                    id,
                    order,
                    state.x,
                    state.y,
                    width,
                    height,
                    radius,
                    orientation,
                ));
            }
        }
        self.hits.rebuild(regions);
    }

    // =========================================================================
    // Viewport and pointer input
    // =========================================================================

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Tell the session how large the drawing surface is. A document that
    /// has not been framed yet is fitted into it.
    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen = Some((width, height));
        if self.needs_fit && !self.layout.is_empty() {
            self.fit_view();
        }
    }

    /// Fit the current layout into the screen.
    pub fn fit_view(&mut self) {
        let (Some((width, height)), Some(bounds)) = (self.screen, self.layout.bounds()) else {
            return;
        };
        self.viewport = Viewport::fit(bounds, width, height, FIT_PADDING, &self.config.viewport);
        self.needs_fit = false;
    }

    pub fn pointer_down(&mut self, pointer_id: u32, sx: f32, sy: f32) {
        self.controller
            .pointer_down(pointer_id, sx, sy, &self.viewport, &self.hits);
    }

    pub fn pointer_move(&mut self, pointer_id: u32, sx: f32, sy: f32) {
        self.controller.pointer_move(
            pointer_id,
            sx,
            sy,
            &mut self.viewport,
            &self.config.viewport,
        );
    }

    /// Release a pointer and carry out what its gesture asked for.
    pub fn pointer_up(&mut self, pointer_id: u32) -> PointerAction {
        let action = self.controller.pointer_up(pointer_id);
        match &action {
            PointerAction::Toggle(id) => {
                self.toggle(id);
            }
            PointerAction::Query(id) => {
                self.emit_query(id);
            }
            PointerAction::None => {}
        }
        action
    }

    pub fn pointer_cancel(&mut self) {
        self.controller.pointer_cancel();
    }

    pub fn wheel(&mut self, sx: f32, sy: f32, delta_y: f32) {
        self.controller
            .wheel(sx, sy, delta_y, &mut self.viewport, &self.config.viewport);
    }

    /// Ask the insight collaborator about a node. Graph state is untouched.
    pub fn emit_query(&self, id: &str) -> Option<QueryRequest> {
        let document_id = self.document_id()?;
        let node = self.store.node(id)?;
        let request = QueryRequest::new(node.label.clone(), document_id);
        self.queries.publish(request.clone());
        Some(request)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn layout(&self) -> &LayoutResult {
        &self.layout
    }

    pub fn coordinator(&self) -> &TransitionCoordinator {
        &self.coordinator
    }

    pub fn cache(&self) -> &GraphCache<S> {
        &self.cache
    }

    pub fn config(&self) -> &MindMapConfig {
        &self.config
    }

    pub fn visible(&self) -> VisibleSet {
        visible_nodes(&self.store)
    }

    /// Node records with their current collapse flags.
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.store.snapshot()
    }
}
