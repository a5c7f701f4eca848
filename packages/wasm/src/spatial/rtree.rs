//! R-tree hit index over rendered node boxes, using the rstar crate.
//!
//! Every rendered node contributes a body rectangle; nodes with children
//! also contribute a round toggle control on the trailing side of the box.
//! A point query prefers a toggle over any body, and among overlapping
//! bodies the one drawn last (topmost) wins.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::layout::Orientation;

/// Which part of a node a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    /// The label box: activating it issues a query.
    Body,
    /// The collapse/expand control.
    Toggle,
}

/// A pickable region in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub id: String,
    pub kind: HitKind,
    /// Position in draw order; higher is on top.
    pub draw_order: usize,
    shape: Shape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Rect { min: [f32; 2], max: [f32; 2] },
    Circle { center: [f32; 2], radius: f32 },
}

impl HitRegion {
    /// Body rectangle from a centre and size.
    pub fn body(
        id: impl Into<String>,
        draw_order: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id: id.into(),
            kind: HitKind::Body,
            draw_order,
            shape: Shape::Rect {
                min: [x - width / 2.0, y - height / 2.0],
                max: [x + width / 2.0, y + height / 2.0],
            },
        }
    }

    /// Toggle control centred on the trailing side of a box.
    #[allow(clippy::too_many_arguments)]
    pub fn toggle(
        id: impl Into<String>,
        draw_order: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        orientation: Orientation,
    ) -> Self {
        let center = match orientation {
            Orientation::LeftToRight => [x + width / 2.0, y],
            Orientation::TopToBottom => [x, y + height / 2.0],
        };
        Self {
            id: id.into(),
            kind: HitKind::Toggle,
            draw_order,
            shape: Shape::Circle { center, radius },
        }
    }
}

impl RTreeObject for HitRegion {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        match self.shape {
            Shape::Rect { min, max } => AABB::from_corners(min, max),
            Shape::Circle { center, radius } => AABB::from_corners(
                [center[0] - radius, center[1] - radius],
                [center[0] + radius, center[1] + radius],
            ),
        }
    }
}

impl PointDistance for HitRegion {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        match self.shape {
            Shape::Rect { min, max } => {
                let dx = (min[0] - point[0]).max(0.0).max(point[0] - max[0]);
                let dy = (min[1] - point[1]).max(0.0).max(point[1] - max[1]);
                dx * dx + dy * dy
            }
            Shape::Circle { center, radius } => {
                let dx = center[0] - point[0];
                let dy = center[1] - point[1];
                let outside = ((dx * dx + dy * dy).sqrt() - radius).max(0.0);
                outside * outside
            }
        }
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        match self.shape {
            Shape::Rect { min, max } => {
                point[0] >= min[0] && point[0] <= max[0] && point[1] >= min[1] && point[1] <= max[1]
            }
            Shape::Circle { center, radius } => {
                let dx = center[0] - point[0];
                let dy = center[1] - point[1];
                dx * dx + dy * dy <= radius * radius
            }
        }
    }
}

/// Result of a point query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: String,
    pub kind: HitKind,
}

/// Spatial index over the rendered nodes.
///
/// Rebuilt wholesale every frame from the sprites; bulk loading keeps that
/// cheap compared to incremental inserts.
pub struct HitIndex {
    tree: RTree<HitRegion>,
}

impl HitIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Replace the indexed regions.
    pub fn rebuild(&mut self, regions: Vec<HitRegion>) {
        self.tree = RTree::bulk_load(regions);
    }

    /// Topmost region under a world-space point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<Hit> {
        self.tree
            .locate_all_at_point(&[x, y])
            .max_by_key(|region| (region.kind == HitKind::Toggle, region.draw_order))
            .map(|region| Hit {
                id: region.id.clone(),
                kind: region.kind,
            })
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for HitIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(regions: Vec<HitRegion>) -> HitIndex {
        let mut index = HitIndex::new();
        index.rebuild(regions);
        index
    }

    #[test]
    fn test_body_hit_and_miss() {
        let index = index(vec![HitRegion::body("a", 0, 0.0, 0.0, 100.0, 40.0)]);
        assert_eq!(
            index.hit_test(45.0, -15.0),
            Some(Hit {
                id: "a".into(),
                kind: HitKind::Body
            })
        );
        assert_eq!(index.hit_test(55.0, 0.0), None);
        assert_eq!(index.hit_test(0.0, 25.0), None);
    }

    #[test]
    fn test_toggle_preferred_over_body() {
        let index = index(vec![
            HitRegion::body("a", 0, 0.0, 0.0, 100.0, 40.0),
            HitRegion::toggle("a", 0, 0.0, 0.0, 100.0, 40.0, 9.0, Orientation::LeftToRight),
        ]);
        // Inside both the body and the toggle circle at (50, 0)
        let hit = index.hit_test(46.0, 2.0).unwrap();
        assert_eq!(hit.kind, HitKind::Toggle);
        // Outside the box but inside the circle
        let hit = index.hit_test(57.0, 0.0).unwrap();
        assert_eq!(hit.kind, HitKind::Toggle);
        // Body only
        assert_eq!(index.hit_test(0.0, 0.0).unwrap().kind, HitKind::Body);
    }

    #[test]
    fn test_toggle_is_round() {
        let index = index(vec![HitRegion::toggle(
            "a",
            0,
            0.0,
            0.0,
            100.0,
            40.0,
            9.0,
            Orientation::LeftToRight,
        )]);
        // Inside the bounding square, outside the circle
        assert_eq!(index.hit_test(58.0, 8.0), None);
    }

    #[test]
    fn test_toggle_top_to_bottom_position() {
        let index = index(vec![HitRegion::toggle(
            "a",
            0,
            0.0,
            0.0,
            100.0,
            40.0,
            9.0,
            Orientation::TopToBottom,
        )]);
        assert!(index.hit_test(0.0, 20.0).is_some());
        assert!(index.hit_test(50.0, 0.0).is_none());
    }

    #[test]
    fn test_topmost_body_wins() {
        let index = index(vec![
            HitRegion::body("under", 0, 0.0, 0.0, 100.0, 40.0),
            HitRegion::body("over", 1, 20.0, 0.0, 100.0, 40.0),
        ]);
        assert_eq!(index.hit_test(10.0, 0.0).unwrap().id, "over");
        assert_eq!(index.hit_test(-45.0, 0.0).unwrap().id, "under");
    }

    #[test]
    fn test_clear() {
        let mut index = index(vec![HitRegion::body("a", 0, 0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(index.len(), 1);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.hit_test(0.0, 0.0), None);
    }
}
