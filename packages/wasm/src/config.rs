//! Top-level configuration.
//!
//! Every section has serde defaults, so a host may pass any subset, e.g.
//! `{ layout: { orientation: "top-to-bottom" } }`.

use serde::{Deserialize, Serialize};

use crate::interaction::{InteractionConfig, ViewportConfig};
use crate::layout::LayoutConfig;
use crate::transition::TransitionConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MindMapConfig {
    pub layout: LayoutConfig,
    pub transition: TransitionConfig,
    pub viewport: ViewportConfig,
    pub interaction: InteractionConfig,
}

impl MindMapConfig {
    /// Defaults with animation disabled.
    pub fn immediate() -> Self {
        Self {
            transition: TransitionConfig::immediate(),
            ..Default::default()
        }
    }
}
