//! System font driver: fontdb for discovery, fontdue for metrics and coverage.

use super::font_driver::{FontDriver, FontStyle, GlyphBounds};
use fontdb::{Database, FaceInfo, Family, Query, Stretch, Style, Weight, ID};
use fontdue::{Font, FontSettings};
use log::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Coverage at or above this value sets a pixel.
const COVERAGE_THRESHOLD: u8 = 128;

/// A fallback face must have a glyph for this character.
const FALLBACK_PROBE_CHAR: char = 'A';

/// A parsed face at one pixel size.
#[derive(Clone)]
pub struct SystemFont {
    face: Arc<Font>,
    size_px: f32,
}

impl SystemFont {
    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn name(&self) -> Option<&str> {
        self.face.name()
    }

    /// (ascent, descent, line gap) at this size. Descent is negative.
    fn line_metrics(&self) -> (f32, f32, f32) {
        match self.face.horizontal_line_metrics(self.size_px) {
            Some(m) => (m.ascent, m.descent, m.line_gap),
            None => (self.size_px * 0.8, -self.size_px * 0.2, 0.0),
        }
    }
}

impl std::fmt::Debug for SystemFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemFont")
            .field("name", &self.name())
            .field("size_px", &self.size_px)
            .finish()
    }
}

type FaceKey = (String, FontStyle);

/// Font driver backed by the fonts installed on the host.
///
/// Faces are parsed once per (family, style) and shared between sizes, since
/// the fit scan asks for hundreds of sizes of the same face.
pub struct SystemFontDriver {
    db: Database,
    faces: Mutex<HashMap<FaceKey, Option<Arc<Font>>>>,
}

impl SystemFontDriver {
    /// Create a driver over every font the system exposes.
    pub fn new() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        info!("SystemFontDriver: {} font faces available", db.len());
        Self::with_database(db)
    }

    /// Create a driver over a caller-populated database.
    pub fn with_database(db: Database) -> Self {
        Self {
            db,
            faces: Mutex::new(HashMap::new()),
        }
    }

    fn face(&self, family: &str, style: FontStyle) -> Option<Arc<Font>> {
        let key = (family.to_string(), style);
        let mut faces = match self.faces.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(cached) = faces.get(&key) {
            trace!("SystemFontDriver: Cache hit for '{}' {:?}", family, style);
            return cached.clone();
        }
        let loaded = self.load_face(family, style);
        faces.insert(key, loaded.clone());
        loaded
    }

    fn load_face(&self, family: &str, style: FontStyle) -> Option<Arc<Font>> {
        // Requested family first, then generic fallbacks.
        let families = [Family::Name(family), Family::Monospace, Family::SansSerif];
        let query = Query {
            families: &families,
            weight: if style.is_bold() {
                Weight::BOLD
            } else {
                Weight::NORMAL
            },
            stretch: Stretch::Normal,
            style: if style.is_italic() {
                Style::Italic
            } else {
                Style::Normal
            },
        };

        if let Some(face) = self
            .db
            .query(&query)
            .and_then(|id| self.parse_face(id, family, style))
        {
            return Some(face);
        }

        // The generic families only resolve when their default names are
        // installed, so fall back to the closest installed face that can
        // draw Latin text.
        debug!(
            "SystemFontDriver: No face for '{}' {:?}; trying installed faces",
            family, style
        );
        let mut candidates: Vec<&FaceInfo> = self.db.faces().collect();
        candidates.sort_by_key(|info| {
            fallback_rank(info.style, info.weight, info.monospaced, query.style, query.weight)
        });
        let found = candidates
            .into_iter()
            .filter_map(|info| self.parse_face(info.id, family, style))
            .find(|face| face.lookup_glyph_index(FALLBACK_PROBE_CHAR) != 0);

        if found.is_none() {
            warn!(
                "SystemFontDriver: No face found for '{}' {:?}; {} faces installed",
                family,
                style,
                self.db.len()
            );
        }
        found
    }

    fn parse_face(&self, id: ID, family: &str, style: FontStyle) -> Option<Arc<Font>> {
        let parsed = self.db.with_face_data(id, |data, index| {
            let settings = FontSettings {
                collection_index: index,
                ..FontSettings::default()
            };
            Font::from_bytes(data, settings)
        })?;

        match parsed {
            Ok(font) => {
                debug!(
                    "SystemFontDriver: Loaded face {:?} for '{}' {:?}",
                    font.name(),
                    family,
                    style
                );
                Some(Arc::new(font))
            }
            Err(e) => {
                warn!(
                    "SystemFontDriver: Failed to parse face for '{}' {:?}: {}",
                    family, style, e
                );
                None
            }
        }
    }
}

/// Sort key for fallback faces: matching slant first, then nearest weight,
/// then monospaced faces.
fn fallback_rank(
    face_style: Style,
    face_weight: Weight,
    monospaced: bool,
    style: Style,
    weight: Weight,
) -> (bool, u16, bool) {
    (
        face_style != style,
        face_weight.0.abs_diff(weight.0),
        !monospaced,
    )
}

impl Default for SystemFontDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FontDriver for SystemFontDriver {
    type Font = SystemFont;

    fn load_font(&self, family: &str, style: FontStyle, size_px: u32) -> Option<Self::Font> {
        if size_px == 0 {
            return None;
        }
        let face = self.face(family, style)?;
        Some(SystemFont {
            face,
            size_px: size_px as f32,
        })
    }

    fn measure(&self, font: &Self::Font, text: &str) -> GlyphBounds {
        let (ascent, descent, line_gap) = font.line_metrics();
        let mut width = 0.0f32;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(left) = prev {
                width += font
                    .face
                    .horizontal_kern(left, ch, font.size_px)
                    .unwrap_or(0.0);
            }
            width += font.face.metrics(ch, font.size_px).advance_width;
            prev = Some(ch);
        }
        GlyphBounds {
            x: 0.0,
            y: -ascent,
            width,
            height: ascent - descent + line_gap,
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
        let mut pen = origin_x as f32;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(left) = prev {
                pen += font
                    .face
                    .horizontal_kern(left, ch, font.size_px)
                    .unwrap_or(0.0);
            }
            let (metrics, coverage) = font.face.rasterize(ch, font.size_px);
            // Bitmap rows run top to bottom; ymin is the offset of the
            // bitmap's bottom edge above the baseline.
            let left = pen.round() as i32 + metrics.xmin;
            let top = origin_y - (metrics.ymin + metrics.height as i32);
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    if coverage[row * metrics.width + col] >= COVERAGE_THRESHOLD {
                        plot(left + col as i32, top + row as i32);
                    }
                }
            }
            pen += metrics.advance_width;
            prev = Some(ch);
        }
    }
}
