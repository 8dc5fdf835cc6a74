// src/config.rs

//! Render defaults and resolution of raw, caller-supplied properties.
//!
//! `RenderConfig` carries every default the renderer needs (canvas size,
//! allowed dimension range, colors, font, start size, output format). It is an
//! ordinary value passed in at call time and can be deserialized from JSON.
//!
//! `Properties` is what a caller asks for, unvalidated. [`resolve`] turns it
//! into a `RenderRequest` the core can trust, replacing every missing or
//! invalid field with the configured default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::color::{self, Rgb};
use crate::encoder::ImageFormat;
use crate::rasterizer::FontStyle;
use crate::renderer::RenderRequest;
use anyhow::Context;
use log::{debug, warn};

/// Longest run of digits accepted for one dimension in a size token.
const MAX_DIMENSION_DIGITS: usize = 5;

// --- Render Configuration ---

/// Defaults and limits for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas width used when none, or an out-of-range one, is requested.
    pub width: u32,
    /// Canvas height used when none, or an out-of-range one, is requested.
    pub height: u32,
    /// Smallest accepted width or height.
    pub min_dimension: u32,
    /// Largest accepted width or height.
    pub max_dimension: u32,
    pub background: Rgb,
    pub foreground: Rgb,
    pub font_family: String,
    pub font_style: FontStyle,
    /// The fit scan starts one below this size.
    pub start_size: u32,
    pub format: ImageFormat,
    /// Directory for raster backing files. `None` means the system temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 300,
            height: 250,
            min_dimension: 1,
            max_dimension: 3500,
            background: Rgb::WHITE,
            foreground: Rgb::BLACK,
            font_family: "Courier New".to_string(),
            font_style: FontStyle::BOLD,
            start_size: 700,
            format: ImageFormat::Png,
            scratch_dir: None,
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read render config {:?}", path))?;
        Self::from_json(&contents).with_context(|| format!("Invalid render config {:?}", path))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn accepts_dimension(&self, value: i64) -> bool {
        value >= i64::from(self.min_dimension) && value <= i64::from(self.max_dimension)
    }
}

// --- Raw Properties ---

/// Unvalidated render properties, as a caller or command line supplies them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Properties {
    pub text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    /// `RGB` or `RRGGBB` hex, optionally followed by `.png`, `.jpg`, `.jpeg` or `.gif`.
    pub background: Option<String>,
    pub foreground: Option<String>,
    /// Output format name or extension.
    pub format: Option<String>,
    pub font_family: Option<String>,
    pub font_style: Option<FontStyle>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn size(mut self, width: i64, height: i64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn background(mut self, token: impl Into<String>) -> Self {
        self.background = Some(token.into());
        self
    }

    pub fn foreground(mut self, token: impl Into<String>) -> Self {
        self.foreground = Some(token.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn font(mut self, family: impl Into<String>, style: FontStyle) -> Self {
        self.font_family = Some(family.into());
        self.font_style = Some(style);
        self
    }

    /// Apply a `WIDTH[xHEIGHT][.ext]` token; the extension, if any, sets the format.
    pub fn size_token(mut self, token: &str) -> Self {
        match SizeToken::parse(token) {
            Some(size) => {
                self.width = Some(i64::from(size.width));
                self.height = Some(i64::from(size.height));
                if let Some(format) = size.format {
                    self.format = Some(format.extension().to_string());
                }
            }
            None => warn!("Properties: Ignoring malformed size token {:?}", token),
        }
        self
    }
}

// --- Token Grammars ---

/// A parsed `WIDTH[xHEIGHT][.ext]` token, e.g. `300x250.png` or `64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeToken {
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
}

impl SizeToken {
    /// Parses a size token. Each dimension is 1 to 5 digits; a missing height
    /// (`300` or `300x`) makes the canvas square.
    pub fn parse(token: &str) -> Option<Self> {
        let (dims, format) = split_extension(token)?;
        let (w, h) = match dims.split_once('x') {
            Some((w, h)) => (w, h),
            None => (dims, ""),
        };
        let width = parse_dimension(w)?;
        let height = if h.is_empty() {
            width
        } else {
            parse_dimension(h)?
        };
        Some(SizeToken {
            width,
            height,
            format,
        })
    }
}

fn parse_dimension(digits: &str) -> Option<u32> {
    if digits.is_empty()
        || digits.len() > MAX_DIMENSION_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// Splits an optional trailing `.png|.jpg|.jpeg|.gif`. Returns `None` when the
/// token has some other extension.
fn split_extension(token: &str) -> Option<(&str, Option<ImageFormat>)> {
    match token.rsplit_once('.') {
        Some((head, ext)) => Some((head, Some(ImageFormat::from_extension(ext)?))),
        None => Some((token, None)),
    }
}

/// Validates a color token (`RGB` or `RRGGBB`, optional image extension) and
/// returns its hex digits.
pub fn color_token_digits(token: &str) -> Option<&str> {
    let (digits, _) = split_extension(token)?;
    let valid = matches!(digits.len(), 3 | 6) && digits.bytes().all(|b| b.is_ascii_hexdigit());
    valid.then_some(digits)
}

// --- Resolution ---

/// A fully validated request plus the output format it should be encoded as.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub request: RenderRequest,
    pub format: ImageFormat,
}

fn resolve_dimension(name: &str, value: Option<i64>, default: u32, config: &RenderConfig) -> u32 {
    match value {
        Some(v) if config.accepts_dimension(v) => v as u32,
        Some(v) => {
            warn!(
                "resolve: {} {} outside [{}, {}]; using {}",
                name, v, config.min_dimension, config.max_dimension, default
            );
            default
        }
        None => default,
    }
}

fn resolve_color(name: &str, token: Option<&str>, default: Rgb) -> Rgb {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        return default;
    };
    match color_token_digits(token).map(color::parse) {
        Some(Ok(rgb)) => rgb,
        _ => {
            warn!("resolve: Invalid {} color {:?}; using {}", name, token, default);
            default
        }
    }
}

/// Resolve raw properties against `config`.
///
/// Every invalid or missing field falls back to its default; a blank caption
/// becomes `"{width}x{height}"` of the resolved canvas.
pub fn resolve(props: &Properties, config: &RenderConfig) -> Resolved {
    let width = resolve_dimension("width", props.width, config.width, config);
    let height = resolve_dimension("height", props.height, config.height, config);

    let text = match props.text.as_deref() {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => format!("{}x{}", width, height),
    };

    let background = resolve_color("background", props.background.as_deref(), config.background);
    let foreground = resolve_color("foreground", props.foreground.as_deref(), config.foreground);

    let format = match props.format.as_deref() {
        Some(f) => ImageFormat::from_extension(f).unwrap_or_else(|| {
            warn!("resolve: Unknown format {:?}; using {:?}", f, config.format);
            config.format
        }),
        None => config.format,
    };

    let font_family = match props.font_family.as_deref() {
        Some(f) if !f.trim().is_empty() => f.to_string(),
        _ => config.font_family.clone(),
    };
    let font_style = props.font_style.unwrap_or(config.font_style);

    let request = RenderRequest {
        text,
        width,
        height,
        background,
        foreground,
        font_family,
        font_style,
    };
    debug!("resolve: {:?} as {:?}", request, format);

    Resolved { request, format }
}
