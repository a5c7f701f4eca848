//! Rendered node state.
//!
//! A sprite is what the renderer last drew for a node: its interpolated box,
//! opacity and scale. Sprites are the "previous layout" the coordinator
//! diffs against; they are never read back from rendered output.

use serde::Serialize;

use super::easing::lerp;
use crate::layout::Placement;

/// Animatable part of a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpriteState {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub scale: f32,
}

impl SpriteState {
    /// Fully visible at the placement's position.
    pub fn settled(placement: &Placement) -> Self {
        Self {
            x: placement.x,
            y: placement.y,
            width: placement.width,
            height: placement.height,
            opacity: 1.0,
            scale: 1.0,
        }
    }

    /// Same box moved to `(x, y)` with the given opacity and scale.
    pub fn at(&self, x: f32, y: f32, opacity: f32, scale: f32) -> Self {
        Self {
            x,
            y,
            opacity,
            scale,
            ..*self
        }
    }

    pub fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self {
            x: lerp(self.x, to.x, t),
            y: lerp(self.y, to.y, t),
            width: lerp(self.width, to.width, t),
            height: lerp(self.height, to.height, t),
            opacity: lerp(self.opacity, to.opacity, t),
            scale: lerp(self.scale, to.scale, t),
        }
    }

    /// Position and size within `epsilon`, opacity and scale settled alike.
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.width - other.width).abs() <= epsilon
            && (self.height - other.height).abs() <= epsilon
            && (self.opacity - other.opacity).abs() <= 1e-3
            && (self.scale - other.scale).abs() <= 1e-3
    }

    /// Rendered width and height after scaling.
    pub fn scaled_size(&self) -> (f32, f32) {
        (self.width * self.scale, self.height * self.scale)
    }
}

/// Last rendered state of a node plus the tree facts needed to animate it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSprite {
    pub state: SpriteState,
    pub level: i32,
    pub parent: Option<String>,
}
