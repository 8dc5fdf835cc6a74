// src/renderer/mod.rs

//! This module defines the `Renderer`.
//!
//! The `Renderer` turns one validated `RenderRequest` into one finished
//! `MappedRaster`:
//!
//! 1. Fit the caption to the canvas with the glyph fit engine.
//! 2. Build the `[background, foreground]` palette.
//! 3. Allocate a mapped raster and fill it with the background index.
//! 4. Draw the caption, centered, with the foreground index.
//!
//! Ownership of the raster passes to the caller, who encodes and releases it.
//! A failure after allocation drops the raster, which releases its mapping.


use crate::color::{Palette, Rgb, BACKGROUND_INDEX, FOREGROUND_INDEX};
use crate::config::{resolve, Properties, RenderConfig, Resolved};
use crate::encoder::ImageFormat;
use crate::error::Result;
use crate::raster::MappedRaster;
use crate::rasterizer::{fit, FontDriver, FontStyle, GlyphBounds};
use log::{debug, info, trace};

/// A fully validated render request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub text: String,
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub foreground: Rgb,
    pub font_family: String,
    pub font_style: FontStyle,
}

/// Pen origin (on the baseline) that centers a box of `bounds` in a
/// `width` x `height` canvas.
///
/// The box extent is rounded up, the halving floors, and the bearing offsets
/// are truncated toward zero.
pub fn draw_origin(width: u32, height: u32, bounds: &GlyphBounds) -> (i32, i32) {
    let x = (width as i32 - bounds.width.ceil() as i32).div_euclid(2) - bounds.x as i32;
    let y = (height as i32 - bounds.height.ceil() as i32).div_euclid(2) - bounds.y as i32;
    (x, y)
}

pub struct Renderer<D: FontDriver> {
    driver: D,
    config: RenderConfig,
}

impl<D: FontDriver> Renderer<D> {
    pub fn new(driver: D, config: RenderConfig) -> Self {
        Self { driver, config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Render `request` into a new mapped raster.
    pub fn render(&self, request: &RenderRequest) -> Result<MappedRaster> {
        let (width, height) = (request.width, request.height);
        info!(
            "Renderer: Rendering {:?} on {}x{} canvas",
            request.text, width, height
        );

        let fitted = fit(
            &self.driver,
            &request.text,
            width,
            height,
            &request.font_family,
            request.font_style,
            self.config.start_size,
        );

        let palette = Palette::new(request.background, request.foreground);
        let mut raster = match &self.config.scratch_dir {
            Some(dir) => MappedRaster::allocate_in(dir, width, height, palette)?,
            None => MappedRaster::allocate(width, height, palette)?,
        };
        raster.fill(BACKGROUND_INDEX)?;

        let font = match &fitted.selected_font {
            Some(font) if !fitted.glyph_bounds.is_empty() => font,
            _ => {
                debug!("Renderer: Nothing to draw; leaving background only");
                return Ok(raster);
            }
        };

        let (origin_x, origin_y) = draw_origin(width, height, &fitted.glyph_bounds);
        trace!(
            "Renderer: Size {} bounds {:?} origin ({}, {})",
            fitted.font_size,
            fitted.glyph_bounds,
            origin_x,
            origin_y
        );

        let mut outcome = Ok(());
        let mut clipped = 0usize;
        self.driver.draw(font, &request.text, origin_x, origin_y, &mut |x, y| {
            if !raster.contains(x, y) {
                clipped += 1;
            } else if outcome.is_ok() {
                outcome = raster.set_pixel_index(x, y, FOREGROUND_INDEX);
            }
        });
        outcome?;

        if clipped > 0 {
            debug!(
                "Renderer: Clipped {} glyph pixels outside {}x{} at size {}",
                clipped, width, height, fitted.font_size
            );
        }
        info!(
            "Renderer: Done at font size {} ({}x{})",
            fitted.font_size, width, height
        );
        Ok(raster)
    }

    /// Resolve raw properties against this renderer's configuration, then render.
    pub fn render_properties(&self, props: &Properties) -> Result<(MappedRaster, ImageFormat)> {
        let Resolved { request, format } = resolve(props, &self.config);
        let raster = self.render(&request)?;
        Ok((raster, format))
    }
}
