//! Spatial indexing for pointer hit testing.
//!
//! This module provides an R-tree based index over the rendered node boxes
//! and their toggle controls.

mod rtree;

pub use rtree::{Hit, HitIndex, HitKind, HitRegion};
