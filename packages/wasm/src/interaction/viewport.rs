//! Pan/zoom transform.
//!
//! Screen = world * k + (x, y). The viewport is owned by the interaction
//! side only; re-layout never writes to it.

use serde::{Deserialize, Serialize};

/// Zoom bounds and wheel response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Zoom change per unit of wheel delta.
    pub wheel_sensitivity: f32,
    /// Smallest zoom factor a single wheel event may apply.
    pub min_zoom_step: f32,
    /// Largest zoom factor a single wheel event may apply.
    pub max_zoom_step: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            max_scale: 3.0,
            wheel_sensitivity: 0.0018,
            min_zoom_step: 0.85,
            max_zoom_step: 1.15,
        }
    }
}

/// View transform: translation `(x, y)` in screen pixels and scale `k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub k: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: 1.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.x) / self.k, (sy - self.y) / self.k)
    }

    pub fn world_to_screen(&self, wx: f32, wy: f32) -> (f32, f32) {
        (wx * self.k + self.x, wy * self.k + self.y)
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Zoom around a screen point so the world point under it stays put.
    ///
    /// Positive `delta_y` (wheel scrolled down) zooms out.
    pub fn zoom_at(&mut self, sx: f32, sy: f32, delta_y: f32, config: &ViewportConfig) {
        let factor = (1.0 - delta_y * config.wheel_sensitivity)
            .clamp(config.min_zoom_step, config.max_zoom_step);
        let k = (self.k * factor).clamp(config.min_scale, config.max_scale);
        let ratio = k / self.k;
        self.x = sx - (sx - self.x) * ratio;
        self.y = sy - (sy - self.y) * ratio;
        self.k = k;
    }

    /// One two-finger step: the world point under the old midpoint `from`
    /// ends up under the new midpoint `to`, with the scale multiplied by
    /// `ratio` (the change in finger spread) within the scale bounds.
    pub fn pinch(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        ratio: f32,
        config: &ViewportConfig,
    ) {
        let (wx, wy) = self.screen_to_world(from.0, from.1);
        let k = (self.k * ratio).clamp(config.min_scale, config.max_scale);
        self.x = to.0 - wx * k;
        self.y = to.1 - wy * k;
        self.k = k;
    }

    /// Centre world bounds `(min_x, min_y, max_x, max_y)` in a screen of the
    /// given size, shrinking to fit but never enlarging past 1:1.
    pub fn fit(
        bounds: (f32, f32, f32, f32),
        width: f32,
        height: f32,
        padding: f32,
        config: &ViewportConfig,
    ) -> Self {
        let (min_x, min_y, max_x, max_y) = bounds;
        let content_w = (max_x - min_x).max(1.0) + padding * 2.0;
        let content_h = (max_y - min_y).max(1.0) + padding * 2.0;
        let k = (width / content_w)
            .min(height / content_h)
            .min(1.0)
            .clamp(config.min_scale, config.max_scale);
        let cx = (min_x + max_x) / 2.0;
        let cy = (min_y + max_y) / 2.0;
        Self {
            x: width / 2.0 - cx * k,
            y: height / 2.0 - cy * k,
            k,
        }
    }
}
