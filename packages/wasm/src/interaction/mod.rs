//! Pointer input: pan/zoom transform and gesture routing.

mod controller;
mod viewport;

pub use controller::{InteractionConfig, InteractionController, PointerAction};
pub use viewport::{Viewport, ViewportConfig};
