// src/lib.rs

//! Centered single-line text on a 1-bit indexed raster backed by a
//! memory-mapped temporary file.
//!
//! ```text
//! Properties ──resolve──▶ RenderRequest ──Renderer──▶ MappedRaster ──encoder──▶ PNG/JPEG/GIF
//!                                         │   │
//!                                   fit (FontDriver)  color (palette)
//! ```

pub mod color;
pub mod config;
pub mod encoder;
pub mod error;
pub mod raster;
pub mod rasterizer;
pub mod renderer;

pub use color::{Palette, Rgb};
pub use config::{resolve, Properties, RenderConfig, Resolved, SizeToken};
pub use encoder::ImageFormat;
pub use error::{RenderError, Result};
pub use raster::MappedRaster;
pub use rasterizer::{fit, FitResult, FontDriver, FontStyle, GlyphBounds, HeadlessFontDriver, SystemFontDriver};
pub use renderer::{RenderRequest, Renderer};
