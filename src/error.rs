// src/error.rs

//! Error kinds surfaced by the rendering core.

use std::path::PathBuf;
use thiserror::Error;

use crate::encoder::ImageFormat;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid color token {token:?}")]
    InvalidColorFormat { token: String },

    #[error("Failed to allocate {width}x{height} mapped raster (backing file {path:?}): {source}")]
    Allocation {
        width: u32,
        height: u32,
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("Pixel ({x}, {y}) is outside the {width}x{height} raster")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    #[error("Raster has already been released")]
    Released,

    #[error("Failed to encode raster as {format:?}: {source}")]
    Encode {
        format: ImageFormat,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
