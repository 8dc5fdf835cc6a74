//! Font drivers and the glyph fit engine.
//!
//! ```text
//! text + canvas size + family/style  →  [fit]  →  FitResult { size, bounds, font }
//!                                         │
//!                                   FontDriver (system | headless)
//! ```

pub mod fit;
pub mod font_driver;
pub mod headless_font_driver;
pub mod system_font_driver;

pub use fit::{fit, FitResult};
pub use font_driver::{FontDriver, FontStyle, GlyphBounds};
pub use headless_font_driver::HeadlessFontDriver;
pub use system_font_driver::SystemFontDriver;
