//! Render frames.
//!
//! A frame is everything the host needs to draw one tick: interpolated node
//! boxes in draw order, edge curves between rendered endpoints and the
//! current view transform. It is a plain serializable snapshot; nothing in
//! the crate reads it back.

use serde::Serialize;

use super::coordinator::TransitionCoordinator;
use crate::graph::GraphStore;
use crate::interaction::Viewport;
use crate::layout::Orientation;

/// One node as drawn this tick (centre coordinates, world space).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameNode {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub scale: f32,
    pub level: i32,
    pub has_children: bool,
    pub collapsed: bool,
    pub exiting: bool,
}

/// Cubic Bézier from the trailing side of the source box to the leading
/// side of the target box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCurve {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub start: [f32; 2],
    pub control1: [f32; 2],
    pub control2: [f32; 2],
    pub end: [f32; 2],
    pub opacity: f32,
}

/// Snapshot of the scene for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<EdgeCurve>,
    pub transform: Viewport,
    pub animating: bool,
}

impl Frame {
    pub fn build(
        store: &GraphStore,
        coordinator: &TransitionCoordinator,
        orientation: Orientation,
        transform: Viewport,
    ) -> Self {
        let nodes = coordinator
            .sprites()
            .filter_map(|(id, sprite)| {
                let node = store.node(id)?;
                let (width, height) = sprite.state.scaled_size();
                Some(FrameNode {
                    id: id.to_string(),
                    label: node.label.clone(),
                    x: sprite.state.x,
                    y: sprite.state.y,
                    width,
                    height,
                    opacity: sprite.state.opacity,
                    scale: sprite.state.scale,
                    level: sprite.level,
                    has_children: node.has_children,
                    collapsed: store.is_collapsed(id),
                    exiting: coordinator.is_exiting(id),
                })
            })
            .collect();

        let edges = store
            .edges()
            .iter()
            .filter_map(|edge| {
                let source = coordinator.sprite(&edge.source_id)?.state;
                let target = coordinator.sprite(&edge.target_id)?.state;
                let (sw, sh) = source.scaled_size();
                let (tw, th) = target.scaled_size();

                let (start, end) = match orientation {
                    Orientation::LeftToRight => (
                        [source.x + sw / 2.0, source.y],
                        [target.x - tw / 2.0, target.y],
                    ),
                    Orientation::TopToBottom => (
                        [source.x, source.y + sh / 2.0],
                        [target.x, target.y - th / 2.0],
                    ),
                };
                let (control1, control2) = match orientation {
                    Orientation::LeftToRight => {
                        let mid = (start[0] + end[0]) / 2.0;
                        ([mid, start[1]], [mid, end[1]])
                    }
                    Orientation::TopToBottom => {
                        let mid = (start[1] + end[1]) / 2.0;
                        ([start[0], mid], [end[0], mid])
                    }
                };

                Some(EdgeCurve {
                    source: edge.source_id.clone(),
                    target: edge.target_id.clone(),
                    relation: edge.relation.clone(),
                    start,
                    control1,
                    control2,
                    end,
                    opacity: source.opacity.min(target.opacity),
                })
            })
            .collect();

        Self {
            nodes,
            edges,
            transform,
            animating: coordinator.is_animating(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphPayload, RawEdge, RawNode, visible_nodes};
    use crate::layout::{LayoutConfig, MindMapLayout};
    use crate::transition::TransitionConfig;

    fn scene(orientation: Orientation) -> (GraphStore, TransitionCoordinator) {
        let store = GraphStore::from_payload(GraphPayload::new(
            vec![
                RawNode::new("root", "Doc"),
                RawNode::new("a", "Topic A"),
                RawNode::new("a1", "Hidden"),
            ],
            vec![
                RawEdge::new("root", "a").with_relation("covers"),
                RawEdge::new("a", "a1"),
            ],
        ));
        let config = LayoutConfig {
            orientation,
            ..Default::default()
        };
        let layout = MindMapLayout::new(config).compute(&store, &visible_nodes(&store));
        let mut coordinator = TransitionCoordinator::new(TransitionConfig::immediate());
        coordinator.reconcile(&layout);
        coordinator.advance(0.0);
        (store, coordinator)
    }

    #[test]
    fn test_frame_contains_rendered_nodes_only() {
        let (store, coordinator) = scene(Orientation::LeftToRight);
        let frame = Frame::build(
            &store,
            &coordinator,
            Orientation::LeftToRight,
            Viewport::default(),
        );

        let ids: Vec<_> = frame.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "a"]);
        let a = &frame.nodes[1];
        assert!(a.has_children && a.collapsed && !a.exiting);
        assert!(!frame.animating);

        // a → a1 has a hidden endpoint
        assert_eq!(frame.edges.len(), 1);
        assert_eq!(frame.edges[0].relation, "covers");
    }

    #[test]
    fn test_edge_attaches_to_box_sides() {
        let (store, coordinator) = scene(Orientation::LeftToRight);
        let frame = Frame::build(
            &store,
            &coordinator,
            Orientation::LeftToRight,
            Viewport::default(),
        );
        let root = &frame.nodes[0];
        let a = &frame.nodes[1];
        let edge = &frame.edges[0];
        assert_eq!(edge.start, [root.x + root.width / 2.0, root.y]);
        assert_eq!(edge.end, [a.x - a.width / 2.0, a.y]);
        assert_eq!(edge.control1[1], edge.start[1]);
        assert_eq!(edge.control2[1], edge.end[1]);
        assert_eq!(edge.opacity, 1.0);
    }

    #[test]
    fn test_edge_top_to_bottom() {
        let (store, coordinator) = scene(Orientation::TopToBottom);
        let frame = Frame::build(
            &store,
            &coordinator,
            Orientation::TopToBottom,
            Viewport::default(),
        );
        let root = &frame.nodes[0];
        let edge = &frame.edges[0];
        assert_eq!(edge.start, [root.x, root.y + root.height / 2.0]);
        assert_eq!(edge.control1[0], edge.start[0]);
    }
}
