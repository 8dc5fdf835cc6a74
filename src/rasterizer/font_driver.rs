//! Font loading, measuring and 1-bit glyph drawing primitives.
//!
//! This module defines the `FontDriver` trait, the seam between the fit engine
//! and whatever actually understands font files (system fonts via fontdb and
//! fontdue, or the synthetic headless font used in tests).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Weight/slant selection for a font family.
    ///
    /// `BOLD_ITALIC` is `BOLD | ITALIC`. Plain style is the empty set, see
    /// [`FontStyle::NORMAL`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FontStyle: u8 {
        const BOLD        = 1 << 0;
        const ITALIC      = 1 << 1;
        const BOLD_ITALIC = Self::BOLD.bits() | Self::ITALIC.bits();
    }
}

impl FontStyle {
    /// Neither bold nor italic. This is a name for the empty set, not a flag
    /// of its own, so every style contains it.
    pub const NORMAL: Self = Self::empty();

    /// Parses a style keyword such as `bold`, `Italic`, `bold-italic` or `plain`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "normal" | "plain" | "regular" => Some(FontStyle::NORMAL),
            "bold" => Some(FontStyle::BOLD),
            "italic" => Some(FontStyle::ITALIC),
            "bold-italic" | "bolditalic" | "italic-bold" => Some(FontStyle::BOLD_ITALIC),
            _ => None,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.contains(FontStyle::BOLD)
    }

    pub fn is_italic(&self) -> bool {
        self.contains(FontStyle::ITALIC)
    }
}

/// The rectangle a string occupies at a given size, in pixels.
///
/// Coordinates are relative to the pen origin on the baseline, so `y` is
/// normally negative (the ascent) and `x` is the left bearing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl GlyphBounds {
    pub const EMPTY: GlyphBounds = GlyphBounds {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Font driver trait.
///
/// Implementors handle:
/// - Font lookup by family, style and pixel size
/// - Measuring a single line of text
/// - Drawing a single line of text as 1-bit coverage
///
/// Drivers are shared between concurrent renders, hence `Send + Sync`.
pub trait FontDriver: Send + Sync {
    /// Driver-specific handle for a face at one size.
    type Font: Clone;

    /// Load a font by family name, style and size.
    ///
    /// # Returns
    /// `None` when no face can be found for the family (after the driver's own
    /// fallbacks). That is not an error: the caller renders a blank canvas.
    fn load_font(&self, family: &str, style: FontStyle, size_px: u32) -> Option<Self::Font>;

    /// Measure `text` as a single line.
    ///
    /// The height is the full line height (ascent + descent + line gap), not
    /// the ink height, so captions of different glyphs at one size measure the
    /// same height.
    fn measure(&self, font: &Self::Font, text: &str) -> GlyphBounds;

    /// Draw `text` with its pen origin on the baseline at (`origin_x`, `origin_y`).
    ///
    /// `plot` is called once for every pixel whose coverage is at least one
    /// half. Coordinates may fall outside any particular canvas; clipping is
    /// the caller's job.
    fn draw(
        &self,
        font: &Self::Font,
        text: &str,
        origin_x: i32,
        origin_y: i32,
        plot: &mut dyn FnMut(i32, i32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_is_the_empty_set() {
        assert!(FontStyle::NORMAL.is_empty());
        assert_eq!(FontStyle::NORMAL, FontStyle::default());
        assert!(!FontStyle::NORMAL.is_bold());
        assert!(!FontStyle::NORMAL.is_italic());
        assert_eq!(FontStyle::BOLD.iter_names().count(), 1);
        assert_eq!(FontStyle::BOLD_ITALIC, FontStyle::BOLD | FontStyle::ITALIC);
    }

    #[test]
    fn keywords_map_to_styles() {
        assert_eq!(FontStyle::from_keyword("Plain"), Some(FontStyle::NORMAL));
        assert_eq!(FontStyle::from_keyword(" bold "), Some(FontStyle::BOLD));
        assert_eq!(
            FontStyle::from_keyword("Bold_Italic"),
            Some(FontStyle::BOLD_ITALIC)
        );
        assert_eq!(FontStyle::from_keyword("heavy"), None);
    }

    #[test]
    fn styles_serialize_as_flag_names() {
        let bold = serde_json::to_string(&FontStyle::BOLD).unwrap();
        assert_eq!(bold, "\"BOLD\"");
        let parsed: FontStyle = serde_json::from_str("\"BOLD | ITALIC\"").unwrap();
        assert_eq!(parsed, FontStyle::BOLD_ITALIC);
        let normal: FontStyle = serde_json::from_str("\"\"").unwrap();
        assert_eq!(normal, FontStyle::NORMAL);
    }
}
