// src/color.rs

//! Hex color tokens and the two-entry palette used by the indexed raster.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RenderError, Result};

/// Number of hex digits in a fully expanded color token.
const EXPANDED_TOKEN_LEN: usize = 6;

/// An opaque 8-bit-per-channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Parses a hex color token into an `Rgb`.
///
/// A leading `#` is ignored. Three digits are expanded by doubling each one
/// (`"abc"` is `"aabbcc"`), six digits are used as they are, and any other
/// length is right-padded with its own last character up to six digits
/// (`"a"` is `"aaaaaa"`, `"12345"` is `"123455"`). Only the first six digits
/// of a longer token are read.
pub fn parse(token: &str) -> Result<Rgb> {
    let invalid = || RenderError::InvalidColorFormat {
        token: token.to_string(),
    };

    let digits: Vec<char> = token.strip_prefix('#').unwrap_or(token).chars().collect();
    let last = *digits.last().ok_or_else(invalid)?;

    let expanded: Vec<char> = match digits.len() {
        3 => digits.iter().flat_map(|&d| [d, d]).collect(),
        n if n >= EXPANDED_TOKEN_LEN => digits[..EXPANDED_TOKEN_LEN].to_vec(),
        n => digits
            .iter()
            .copied()
            .chain(std::iter::repeat(last).take(EXPANDED_TOKEN_LEN - n))
            .collect(),
    };

    let channel = |pair: &[char]| -> Option<u8> {
        let hi = pair[0].to_digit(16)?;
        let lo = pair[1].to_digit(16)?;
        Some((hi * 16 + lo) as u8)
    };

    let mut channels = expanded.chunks(2).map(channel);
    match (channels.next(), channels.next(), channels.next()) {
        (Some(Some(r)), Some(Some(g)), Some(Some(b))) => Ok(Rgb::new(r, g, b)),
        _ => Err(invalid()),
    }
}

/// Formats a color as a lowercase `#rrggbb` token.
pub fn format(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

impl FromStr for Rgb {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(*self))
    }
}

impl TryFrom<String> for Rgb {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self> {
        parse(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        format(color)
    }
}

/// Palette index of the background color.
pub const BACKGROUND_INDEX: u8 = 0;
/// Palette index of the foreground (text) color.
pub const FOREGROUND_INDEX: u8 = 1;

/// The two-entry color table of a 1-bit indexed raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Palette {
    pub background: Rgb,
    pub foreground: Rgb,
}

impl Palette {
    pub const fn new(background: Rgb, foreground: Rgb) -> Self {
        Self {
            background,
            foreground,
        }
    }

    /// Looks up a palette index. Any index other than 0 is the foreground.
    pub fn color(&self, index: u8) -> Rgb {
        if index == BACKGROUND_INDEX {
            self.background
        } else {
            self.foreground
        }
    }

    pub fn entries(&self) -> [Rgb; 2] {
        [self.background, self.foreground]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_digit_token_is_read_verbatim() {
        assert_eq!(parse("876543").unwrap(), Rgb::new(0x87, 0x65, 0x43));
        assert_eq!(parse("#A0b1C2").unwrap(), Rgb::new(0xa0, 0xb1, 0xc2));
    }

    #[test]
    fn three_digit_token_doubles_each_digit() {
        assert_eq!(parse("abc").unwrap(), parse("aabbcc").unwrap());
        assert_eq!(parse("876").unwrap(), Rgb::new(0x88, 0x77, 0x66));
        assert_eq!(parse("754").unwrap(), Rgb::new(0x77, 0x55, 0x44));
    }

    #[test]
    fn other_lengths_pad_with_last_digit() {
        assert_eq!(parse("a").unwrap(), parse("aaaaaa").unwrap());
        assert_eq!(parse("12").unwrap(), Rgb::new(0x12, 0x22, 0x22));
        assert_eq!(parse("1234").unwrap(), Rgb::new(0x12, 0x34, 0x44));
        assert_eq!(parse("12345").unwrap(), Rgb::new(0x12, 0x34, 0x55));
        assert_eq!(parse("1234567").unwrap(), Rgb::new(0x12, 0x34, 0x56));
    }

    #[test]
    fn malformed_tokens_fail_closed() {
        for token in ["", "#", "xyz", "12345g", "-1", "+f+f+f", "ééé"] {
            match parse(token) {
                Err(RenderError::InvalidColorFormat { token: t }) => assert_eq!(t, token),
                other => panic!("expected InvalidColorFormat for {:?}, got {:?}", token, other),
            }
        }
    }

    #[test]
    fn format_round_trips_every_channel_value() {
        for v in 0..=255u8 {
            let c = Rgb::new(v, 255 - v, v.wrapping_mul(7));
            let token = format(c);
            assert_eq!(token.len(), 7);
            assert!(token.starts_with('#'));
            assert_eq!(token, token.to_lowercase());
            assert_eq!(parse(&token).unwrap(), c);
        }
    }

    #[test]
    fn serde_uses_hex_tokens() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 255)).unwrap();
        assert_eq!(json, "\"#0102ff\"");
        let back: Rgb = serde_json::from_str("\"fc0\"").unwrap();
        assert_eq!(back, Rgb::new(0xff, 0xcc, 0x00));
        assert!(serde_json::from_str::<Rgb>("\"zz\"").is_err());
    }

    #[test]
    fn palette_maps_indices() {
        let palette = Palette::new(Rgb::WHITE, Rgb::BLACK);
        assert_eq!(palette.color(BACKGROUND_INDEX), Rgb::WHITE);
        assert_eq!(palette.color(FOREGROUND_INDEX), Rgb::BLACK);
        assert_eq!(palette.entries(), [Rgb::WHITE, Rgb::BLACK]);
    }
}
