//! Auto-fit text sizing.
//!
//! Finds the largest integer pixel size at which a single line of text fits
//! strictly inside a canvas. The scan is linear and decreasing: glyph metrics
//! are not guaranteed to be monotonic at extreme sizes for every face, and the
//! search space is bounded by the start size anyway.

use super::font_driver::{FontDriver, FontStyle, GlyphBounds};
use log::*;

/// Outcome of a fit scan.
#[derive(Debug, Clone)]
pub struct FitResult<F> {
    /// Accepted pixel size, never below 1.
    pub font_size: u32,
    /// Measured box at `font_size`, relative to the pen origin.
    pub glyph_bounds: GlyphBounds,
    /// Face at `font_size`, or `None` when no font could be found.
    pub selected_font: Option<F>,
}

impl<F> FitResult<F> {
    fn degenerate(selected_font: Option<F>) -> Self {
        Self {
            font_size: 1,
            glyph_bounds: GlyphBounds::EMPTY,
            selected_font,
        }
    }
}

/// Picks the largest size below `start_size` whose measured box fits strictly
/// inside `width` x `height`.
///
/// Sizes are tried from `start_size - 1` downward. Size 1 is accepted even if
/// the text still overflows. Empty text, text with zero measured width, and a
/// family the driver cannot find all yield size 1 with empty bounds.
pub fn fit<D: FontDriver>(
    driver: &D,
    text: &str,
    width: u32,
    height: u32,
    family: &str,
    style: FontStyle,
    start_size: u32,
) -> FitResult<D::Font> {
    if text.is_empty() {
        debug!("fit: Empty text, nothing to size");
        return FitResult::degenerate(None);
    }

    let (target_w, target_h) = (width as f32, height as f32);
    let mut size = start_size.max(2);
    let mut iterations = 0u32;

    loop {
        size -= 1;
        iterations += 1;

        let Some(font) = driver.load_font(family, style, size) else {
            warn!("fit: No font for '{}' {:?}; rendering without text", family, style);
            return FitResult::degenerate(None);
        };

        let bounds = driver.measure(&font, text);
        trace!(
            "fit: size {} measures {:.1}x{:.1} against {}x{}",
            size,
            bounds.width,
            bounds.height,
            width,
            height
        );

        if bounds.width <= 0.0 {
            debug!("fit: {:?} has no advance width", text);
            return FitResult::degenerate(Some(font));
        }

        let overflows = bounds.width >= target_w || bounds.height >= target_h;
        if !overflows || size <= 1 {
            if overflows {
                debug!(
                    "fit: {:?} still overflows {}x{} at size 1",
                    text, width, height
                );
            }
            debug!("fit: Accepted size {} after {} iterations", size, iterations);
            return FitResult {
                font_size: size,
                glyph_bounds: bounds,
                selected_font: Some(font),
            };
        }
    }
}
