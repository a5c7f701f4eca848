//! Mind map layout: positions for the currently visible subtree.
//!
//! Builds the visible hierarchy from the graph store, sizes every node from
//! its label, runs the tidy tree along the primary (sibling) axis and then
//! spaces tree levels along the depth axis so that boxes on neighbouring
//! levels never overlap, whatever the label lengths.
//!
//! The output depends only on the visible set, labels and collapse flags;
//! the previous layout is never consulted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::footprint::Footprint;
use super::tidy_tree::{TidyTreeConfig, TidyTreeLayout, TreeNode};
use crate::graph::{GraphStore, VisibleSet};

/// Direction in which tree levels grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Root on the left, levels grow rightwards; siblings stack vertically.
    #[default]
    LeftToRight,
    /// Root on top, levels grow downwards; siblings spread horizontally.
    TopToBottom,
}

/// Configuration for the mind map layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub orientation: Orientation,
    /// Font size per level; deeper levels reuse the last entry.
    pub font_sizes: Vec<f32>,
    /// Average glyph width as a fraction of the font size.
    pub glyph_width_ratio: f32,
    pub line_height: f32,
    pub min_width: f32,
    /// Total horizontal padding inside a box.
    pub horizontal_padding: f32,
    /// Total vertical padding inside a box.
    pub vertical_padding: f32,
    pub sibling_gap: f32,
    pub subtree_gap: f32,
    pub forest_gap: f32,
    /// Baseline distance between the centres of consecutive levels.
    pub level_separation: f32,
    /// Minimum empty space between boxes on consecutive levels.
    pub level_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::LeftToRight,
            font_sizes: vec![18.0, 15.0, 13.0],
            glyph_width_ratio: 0.6,
            line_height: 1.4,
            min_width: 80.0,
            horizontal_padding: 32.0,
            vertical_padding: 16.0,
            sibling_gap: 12.0,
            subtree_gap: 24.0,
            forest_gap: 48.0,
            level_separation: 180.0,
            level_gap: 48.0,
        }
    }
}

impl LayoutConfig {
    /// Font size used for nodes at `level`.
    pub fn font_size(&self, level: i32) -> f32 {
        let index = level.max(0) as usize;
        self.font_sizes
            .get(index)
            .or_else(|| self.font_sizes.last())
            .copied()
            .unwrap_or(14.0)
    }
}

/// Computed box for one visible node (centre coordinates).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub level: i32,
    pub parent: Option<String>,
}

/// Placements for exactly the visible set, in graph order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    placements: HashMap<String, Placement>,
    order: Vec<String>,
}

impl LayoutResult {
    pub fn get(&self, id: &str) -> Option<&Placement> {
        self.placements.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.placements.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Placement)> {
        self.order
            .iter()
            .filter_map(|id| self.placements.get(id).map(|p| (id.as_str(), p)))
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bounding box of all boxes as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        if self.placements.is_empty() {
            return None;
        }

        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for p in self.placements.values() {
            min_x = min_x.min(p.x - p.width / 2.0);
            max_x = max_x.max(p.x + p.width / 2.0);
            min_y = min_y.min(p.y - p.height / 2.0);
            max_y = max_y.max(p.y + p.height / 2.0);
        }

        Some((min_x, min_y, max_x, max_y))
    }
}

/// The mind map layout engine.
pub struct MindMapLayout {
    config: LayoutConfig,
    tree: TidyTreeLayout,
}

impl MindMapLayout {
    pub fn new(config: LayoutConfig) -> Self {
        let tree = TidyTreeLayout::new(TidyTreeConfig {
            sibling_gap: config.sibling_gap,
            subtree_gap: config.subtree_gap,
            forest_gap: config.forest_gap,
        });
        Self { config, tree }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out the visible subtree.
    pub fn compute(&self, store: &GraphStore, visible: &VisibleSet) -> LayoutResult {
        let nodes: Vec<_> = visible.iter().filter_map(|id| store.node(id)).collect();
        let ids: Vec<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
        if ids.is_empty() {
            return LayoutResult::default();
        }
        let index_of: HashMap<&str, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut footprints = Vec::with_capacity(ids.len());
        let mut levels = Vec::with_capacity(ids.len());
        let mut parents = Vec::with_capacity(ids.len());
        let mut tree_nodes = Vec::with_capacity(ids.len());
        let mut roots = Vec::new();

        for (i, node) in nodes.iter().enumerate() {
            let id = node.id.as_str();
            let footprint = Footprint::measure(&node.label, node.level, &self.config);
            let mut tree_node = TreeNode::new(self.primary_extent(footprint));

            // A collapsed node contributes no children even though it has some.
            if !store.is_collapsed(id) {
                tree_node.children = store
                    .tree_children(id)
                    .into_iter()
                    .filter_map(|child| index_of.get(child.id.as_str()).copied())
                    .collect();
            }

            let parent_visible = node
                .parent_id
                .as_deref()
                .is_some_and(|parent| index_of.contains_key(parent));
            if !parent_visible {
                roots.push(i);
            }

            footprints.push(footprint);
            levels.push(node.level.max(0));
            parents.push(node.parent_id.clone());
            tree_nodes.push(tree_node);
        }

        let primary = self.tree.compute(&tree_nodes, &roots);
        let depth_positions = self.level_positions(&footprints, &levels);

        let mut result = LayoutResult {
            placements: HashMap::with_capacity(ids.len()),
            order: Vec::with_capacity(ids.len()),
        };
        for (i, &id) in ids.iter().enumerate() {
            let depth = depth_positions[levels[i] as usize];
            let (x, y) = match self.config.orientation {
                Orientation::LeftToRight => (depth, primary[i]),
                Orientation::TopToBottom => (primary[i], depth),
            };
            result.order.push(id.to_string());
            result.placements.insert(
                id.to_string(),
                Placement {
                    x,
                    y,
                    width: footprints[i].width,
                    height: footprints[i].height,
                    level: levels[i],
                    parent: parents[i].clone(),
                },
            );
        }
        result
    }

    /// Box size along the sibling axis.
    fn primary_extent(&self, footprint: Footprint) -> f32 {
        match self.config.orientation {
            Orientation::LeftToRight => footprint.height,
            Orientation::TopToBottom => footprint.width,
        }
    }

    /// Box size along the level axis.
    fn depth_extent(&self, footprint: Footprint) -> f32 {
        match self.config.orientation {
            Orientation::LeftToRight => footprint.width,
            Orientation::TopToBottom => footprint.height,
        }
    }

    /// Centre of each level along the depth axis.
    ///
    /// Starts from the uniform `level_separation` and pushes a level outward
    /// whenever the widest box on it and on the previous level would come
    /// closer than `level_gap`.
    fn level_positions(&self, footprints: &[Footprint], levels: &[i32]) -> Vec<f32> {
        let level_count = levels.iter().copied().max().unwrap_or(0) as usize + 1;
        let mut max_extent = vec![0.0f32; level_count];
        for (footprint, &level) in footprints.iter().zip(levels) {
            let extent = self.depth_extent(*footprint);
            let slot = &mut max_extent[level as usize];
            *slot = slot.max(extent);
        }

        let mut positions = vec![0.0f32; level_count];
        for level in 1..level_count {
            let clearance =
                max_extent[level - 1] / 2.0 + self.config.level_gap + max_extent[level] / 2.0;
            positions[level] = positions[level - 1] + self.config.level_separation.max(clearance);
        }
        positions
    }
}
