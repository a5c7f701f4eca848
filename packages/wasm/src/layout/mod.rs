//! Layout algorithms for the mind map.
//!
//! This module computes target positions for the visible subtree. Layouts
//! are pure functions of the visible set and labels; animating from one
//! layout to the next is the job of [`crate::transition`].

pub mod footprint;
pub mod mindmap;
pub mod tidy_tree;

pub use footprint::Footprint;
pub use mindmap::{LayoutConfig, LayoutResult, MindMapLayout, Orientation, Placement};
pub use tidy_tree::TidyTreeLayout;
