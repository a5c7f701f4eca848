//! Animated transitions between layouts.
//!
//! The coordinator keeps the last rendered state of every node and diffs
//! each new layout against it; frames are what the host draws per tick.

mod coordinator;
pub mod easing;
mod frame;
mod sprite;

pub use coordinator::{AdvanceReport, TransitionConfig, TransitionCoordinator, TransitionPlan};
pub use frame::{EdgeCurve, Frame, FrameNode};
pub use sprite::{NodeSprite, SpriteState};
