//! Headless synthetic font driver.
//!
//! Metrics scale linearly with size and every visible character is drawn as
//! a solid block, which makes fit and centering results exact and independent
//! of the fonts installed on the host.

use super::font_driver::{FontDriver, FontStyle, GlyphBounds};

/// Horizontal advance per character, as a fraction of the pixel size.
pub const ADVANCE_RATIO: f32 = 0.6;
/// Ascent above the baseline, as a fraction of the pixel size.
pub const ASCENT_RATIO: f32 = 0.8;
/// Descent below the baseline, as a fraction of the pixel size.
pub const DESCENT_RATIO: f32 = 0.2;
/// Height of a drawn block above the baseline, as a fraction of the pixel size.
const INK_RATIO: f32 = 0.7;
/// Side bearing left blank on each side of a block, as a fraction of the advance.
const BEARING_RATIO: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessFont {
    pub size_px: u32,
    pub style: FontStyle,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessFontDriver;

impl HeadlessFontDriver {
    pub fn new() -> Self {
        Self
    }
}

impl FontDriver for HeadlessFontDriver {
    type Font = HeadlessFont;

    fn load_font(&self, family: &str, style: FontStyle, size_px: u32) -> Option<Self::Font> {
        // A blank family stands in for "no such font".
        if family.trim().is_empty() || size_px == 0 {
            return None;
        }
        Some(HeadlessFont { size_px, style })
    }

    fn measure(&self, font: &Self::Font, text: &str) -> GlyphBounds {
        let size = font.size_px as f32;
        let count = text.chars().count() as f32;
        GlyphBounds {
            x: 0.0,
            y: -ASCENT_RATIO * size,
            width: count * ADVANCE_RATIO * size,
            height: (ASCENT_RATIO + DESCENT_RATIO) * size,
        }
    }

    fn draw(
        &self,
        font: &Self::Font,
        text: &str,
        origin_x: i32,
        origin_y: i32,
        plot: &mut dyn FnMut(i32, i32),
    ) {
        let size = font.size_px as f32;
        let advance = ADVANCE_RATIO * size;
        let top = origin_y - (INK_RATIO * size).round() as i32;

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let pen = i as f32 * advance;
            let left = origin_x + (pen + BEARING_RATIO * advance).round() as i32;
            let right = origin_x + (pen + advance - BEARING_RATIO * advance).round() as i32;
            for y in top..origin_y {
                for x in left..right {
                    plot(x, y);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_family_has_no_font() {
        let driver = HeadlessFontDriver::new();
        assert!(driver.load_font("", FontStyle::BOLD, 12).is_none());
        assert!(driver.load_font("   ", FontStyle::NORMAL, 12).is_none());
        assert!(driver.load_font("Mono", FontStyle::NORMAL, 12).is_some());
    }

    #[test]
    fn metrics_scale_with_size() {
        let driver = HeadlessFontDriver::new();
        let font = driver.load_font("Mono", FontStyle::NORMAL, 10).unwrap();
        let bounds = driver.measure(&font, "abcd");
        assert_eq!(bounds.x, 0.0);
        assert!((bounds.y + 8.0).abs() < 1e-4);
        assert!((bounds.width - 24.0).abs() < 1e-4);
        assert!((bounds.height - 10.0).abs() < 1e-4);
    }

    #[test]
    fn draw_skips_whitespace_and_stays_above_baseline() {
        let driver = HeadlessFontDriver::new();
        let font = driver.load_font("Mono", FontStyle::NORMAL, 10).unwrap();
        let mut pixels = Vec::new();
        driver.draw(&font, "a b", 0, 20, &mut |x, y| pixels.push((x, y)));

        assert!(!pixels.is_empty());
        assert!(pixels.iter().all(|&(_, y)| (13..20).contains(&y)));
        // Second cell (the space) spans x in [6, 12).
        assert!(pixels.iter().all(|&(x, _)| !(6..12).contains(&x)));
        assert!(pixels.iter().any(|&(x, _)| x >= 12));
    }
}
