//! Reingold-Tilford style tidy tree layout with per-node extents.
//!
//! Assigns each node a coordinate along the primary (sibling) axis of the
//! tree. Unlike the unit-width classic, every node carries its own extent
//! along that axis, so boxes of different sizes never overlap.
//!
//! # Algorithm Overview
//!
//! 1. **First walk (bottom-up):** Lay out each subtree in its own frame and
//!    return its contour: the `(low, high)` edge of the subtree on every
//!    row below its root. Children are placed left to right, each shifted
//!    just far enough that its contour clears the merged contour of its
//!    left siblings. The parent is then centred over its first and last
//!    child.
//! 2. **Second walk (top-down):** Accumulate the relative child offsets
//!    into absolute positions.
//!
//! Separation on the first row below a parent (siblings) uses
//! `sibling_gap`; deeper rows, where neighbours belong to different
//! parents, use `subtree_gap`. Each subtree costs O(size * height).

/// Configuration for the tidy tree layout.
#[derive(Debug, Clone)]
pub struct TidyTreeConfig {
    /// Minimum gap between the boxes of two siblings.
    pub sibling_gap: f32,
    /// Minimum gap between boxes of neighbouring subtrees on deeper rows.
    pub subtree_gap: f32,
    /// Minimum gap between two root trees of a forest.
    pub forest_gap: f32,
}

impl Default for TidyTreeConfig {
    fn default() -> Self {
        Self {
            sibling_gap: 12.0,
            subtree_gap: 24.0,
            forest_gap: 48.0,
        }
    }
}

/// Input node for the layout.
#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    /// Size of the node's box along the primary axis.
    pub extent: f32,
    /// Children indices (into the node slice), in display order.
    pub children: Vec<usize>,
}

impl TreeNode {
    pub fn new(extent: f32) -> Self {
        Self {
            extent,
            children: Vec::new(),
        }
    }
}

/// Per-row `(low, high)` bounds of a subtree, relative to its root centre.
type Contour = Vec<(f32, f32)>;

/// The tidy tree layout engine.
pub struct TidyTreeLayout {
    config: TidyTreeConfig,
}

impl TidyTreeLayout {
    /// Create a new tidy tree layout with the given configuration.
    pub fn new(config: TidyTreeConfig) -> Self {
        Self { config }
    }

    /// Create a tidy tree layout with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TidyTreeConfig::default())
    }

    /// Compute primary-axis centre coordinates for every node reachable from
    /// `roots`. Root trees are packed side by side and the whole forest is
    /// centred on 0. Nodes not reachable from a root stay at 0.
    pub fn compute(&self, nodes: &[TreeNode], roots: &[usize]) -> Vec<f32> {
        let mut positions = vec![0.0f32; nodes.len()];
        if roots.is_empty() {
            return positions;
        }

        let mut offsets = vec![0.0f32; nodes.len()];
        let mut merged: Contour = Vec::new();
        let mut root_offsets = Vec::with_capacity(roots.len());

        for (i, &root) in roots.iter().enumerate() {
            let contour = self.first_walk(root, nodes, &mut offsets);
            let offset = if i == 0 {
                0.0
            } else {
                Self::separate(&merged, &contour, self.config.forest_gap, self.config.forest_gap)
            };
            Self::merge(&mut merged, &contour, offset);
            root_offsets.push(offset);
        }

        let first = root_offsets[0];
        let last = root_offsets[root_offsets.len() - 1];
        let midpoint = (first + last) / 2.0;
        for (&root, &offset) in roots.iter().zip(&root_offsets) {
            Self::second_walk(root, offset - midpoint, nodes, &offsets, &mut positions);
        }

        positions
    }

    /// First walk: bottom-up placement of children relative to their parent.
    /// Writes each child's offset from its parent into `offsets` and returns
    /// the contour of the subtree rooted at `v`.
    fn first_walk(&self, v: usize, nodes: &[TreeNode], offsets: &mut [f32]) -> Contour {
        let half = nodes[v].extent / 2.0;
        let children = &nodes[v].children;
        if children.is_empty() {
            return vec![(-half, half)];
        }

        // Children contours merged in the frame of the first child
        let mut merged: Contour = Vec::new();
        let mut child_offsets = Vec::with_capacity(children.len());

        for (i, &child) in children.iter().enumerate() {
            let contour = self.first_walk(child, nodes, offsets);
            let offset = if i == 0 {
                0.0
            } else {
                Self::separate(
                    &merged,
                    &contour,
                    self.config.sibling_gap,
                    self.config.subtree_gap,
                )
            };
            Self::merge(&mut merged, &contour, offset);
            child_offsets.push(offset);
        }

        // Center parent over first and last children
        let midpoint = (child_offsets[0] + child_offsets[child_offsets.len() - 1]) / 2.0;
        for (&child, &offset) in children.iter().zip(&child_offsets) {
            offsets[child] = offset - midpoint;
        }

        let mut contour = Vec::with_capacity(merged.len() + 1);
        contour.push((-half, half));
        contour.extend(merged.iter().map(|&(low, high)| (low - midpoint, high - midpoint)));
        contour
    }

    /// Smallest offset for `right` so that it clears `left` on every shared
    /// row: `first_gap` on row 0, `deeper_gap` below.
    fn separate(left: &Contour, right: &Contour, first_gap: f32, deeper_gap: f32) -> f32 {
        let shared = left.len().min(right.len());
        let mut shift = f32::NEG_INFINITY;
        for row in 0..shared {
            let gap = if row == 0 { first_gap } else { deeper_gap };
            let needed = left[row].1 + gap - right[row].0;
            if needed > shift {
                shift = needed;
            }
        }
        shift
    }

    /// Merge `contour`, shifted by `offset`, into `merged`.
    fn merge(merged: &mut Contour, contour: &Contour, offset: f32) {
        for (row, &(low, high)) in contour.iter().enumerate() {
            let (low, high) = (low + offset, high + offset);
            if let Some(existing) = merged.get_mut(row) {
                existing.0 = existing.0.min(low);
                existing.1 = existing.1.max(high);
            } else {
                merged.push((low, high));
            }
        }
    }

    /// Second walk: accumulate relative offsets into absolute positions.
    fn second_walk(
        v: usize,
        position: f32,
        nodes: &[TreeNode],
        offsets: &[f32],
        positions: &mut [f32],
    ) {
        positions[v] = position;
        for &child in &nodes[v].children {
            Self::second_walk(child, position + offsets[child], nodes, offsets, positions);
        }
    }
}
