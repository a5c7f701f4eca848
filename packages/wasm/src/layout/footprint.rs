//! On-screen box size of a node, derived from its label.

use serde::Serialize;

use super::mindmap::LayoutConfig;

/// Width and height of a node's rendered box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

impl Footprint {
    /// Box size for `label` at tree `level`.
    ///
    /// Width grows with the label's character count at the level's font size
    /// plus fixed padding, and never drops below `min_width`. Height depends
    /// only on the font size.
    pub fn measure(label: &str, level: i32, config: &LayoutConfig) -> Self {
        let font_size = config.font_size(level);
        let chars = label.chars().count() as f32;
        let text_width = chars * font_size * config.glyph_width_ratio;
        Self {
            width: (text_width + config.horizontal_padding).max(config.min_width),
            height: font_size * config.line_height + config.vertical_padding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_label_uses_min_width() {
        let config = LayoutConfig::default();
        let fp = Footprint::measure("A", 1, &config);
        assert_eq!(fp.width, config.min_width);
    }

    #[test]
    fn test_long_label_scales() {
        let config = LayoutConfig::default();
        let label = "A considerably longer topic label than usual";
        let fp = Footprint::measure(label, 1, &config);
        let expected = label.chars().count() as f32 * config.font_size(1) * config.glyph_width_ratio
            + config.horizontal_padding;
        assert!((fp.width - expected).abs() < 1e-3);
        assert!(fp.width > config.min_width);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let config = LayoutConfig::default();
        let ascii = Footprint::measure("resume resume resume", 2, &config);
        let accented = Footprint::measure("résumé résumé résumé", 2, &config);
        assert_eq!(ascii, accented);
    }

    #[test]
    fn test_height_follows_level_font() {
        let config = LayoutConfig::default();
        let root = Footprint::measure("Doc", 0, &config);
        let deep = Footprint::measure("Doc", 5, &config);
        assert!(root.height > deep.height);
        assert_eq!(
            deep.height,
            Footprint::measure("Doc", 9, &config).height,
            "levels past the table reuse the last font size"
        );
    }
}
