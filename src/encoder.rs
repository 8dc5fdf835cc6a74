// src/encoder.rs

//! Encoding a finished raster into PNG, JPEG or GIF.
//!
//! PNG is written as a 1-bit indexed image straight from the mapped rows and
//! GIF as a two-color indexed frame. JPEG has no indexed mode, so pixels are
//! expanded through the palette to 8-bit RGB for the `image` codec. Encoding
//! only reads the raster; releasing it stays with the caller.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use crate::error::{RenderError, Result};
use crate::raster::MappedRaster;
use image::{DynamicImage, RgbImage};
use log::{debug, info};

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Parses `png`, `jpg`, `jpeg` or `gif`, case-insensitively, with or
    /// without a leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
        }
    }

}

fn codec_error<E>(format: ImageFormat) -> impl Fn(E) -> RenderError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    move |e| RenderError::Encode {
        format,
        source: e.into(),
    }
}

/// Palette index of pixel `x` in a packed row.
fn index_at(row: &[u8], x: u32) -> u8 {
    (row[x as usize / 8] >> (7 - x % 8)) & 1
}

/// `[background, foreground]` as consecutive RGB triples.
fn palette_bytes(raster: &MappedRaster) -> Vec<u8> {
    raster.palette().entries().map(|c| c.to_bytes()).concat()
}

/// Expand a raster to an RGB image through its palette.
pub fn to_rgb_image(raster: &MappedRaster) -> Result<RgbImage> {
    let palette = raster.palette();
    let [background, foreground] = palette.entries().map(|c| image::Rgb(c.to_bytes()));
    let mut img = RgbImage::new(raster.width(), raster.height());

    for y in 0..raster.height() {
        let row = raster.row(y)?;
        for x in 0..raster.width() {
            let pixel = if index_at(row, x) == 1 { foreground } else { background };
            img.put_pixel(x, y, pixel);
        }
    }
    Ok(img)
}

fn write_png<W: Write>(raster: &MappedRaster, out: W) -> Result<()> {
    let failed = codec_error::<png::EncodingError>(ImageFormat::Png);
    let mut encoder = png::Encoder::new(out, raster.width(), raster.height());
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::One);
    encoder.set_palette(palette_bytes(raster));

    // The mapped store already has PNG's row layout: MSB first, byte-aligned rows.
    let mut writer = encoder.write_header().map_err(&failed)?;
    writer.write_image_data(raster.pixels()?).map_err(&failed)?;
    writer.finish().map_err(&failed)
}

fn write_gif<W: Write>(raster: &MappedRaster, out: W) -> Result<()> {
    let failed = codec_error::<gif::EncodingError>(ImageFormat::Gif);
    let (width, height) = match (u16::try_from(raster.width()), u16::try_from(raster.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(codec_error::<String>(ImageFormat::Gif)(format!(
                "{}x{} exceeds the GIF size limit",
                raster.width(),
                raster.height()
            )))
        }
    };

    let mut indices = Vec::with_capacity(width as usize * height as usize);
    for y in 0..raster.height() {
        let row = raster.row(y)?;
        indices.extend((0..raster.width()).map(|x| index_at(row, x)));
    }

    let mut encoder = gif::Encoder::new(out, width, height, &palette_bytes(raster)).map_err(&failed)?;
    let frame = gif::Frame {
        width,
        height,
        buffer: Cow::Owned(indices),
        ..gif::Frame::default()
    };
    // Dropping the encoder writes the trailer.
    encoder.write_frame(&frame).map_err(&failed)
}

fn write_jpeg<W: Write + Seek>(raster: &MappedRaster, out: &mut W) -> Result<()> {
    DynamicImage::ImageRgb8(to_rgb_image(raster)?)
        .write_to(out, image::ImageFormat::Jpeg)
        .map_err(codec_error::<image::ImageError>(ImageFormat::Jpeg))
}

/// Encode `raster` as `format` into a seekable writer.
pub fn write_to<W: Write + Seek>(raster: &MappedRaster, format: ImageFormat, out: &mut W) -> Result<()> {
    match format {
        ImageFormat::Png => write_png(raster, out)?,
        ImageFormat::Gif => write_gif(raster, out)?,
        ImageFormat::Jpeg => write_jpeg(raster, out)?,
    }
    debug!(
        "encoder: Encoded {}x{} raster as {:?}",
        raster.width(),
        raster.height(),
        format
    );
    Ok(())
}

/// Encode `raster` as `format` into memory.
pub fn encode(raster: &MappedRaster, format: ImageFormat) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_to(raster, format, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Encode `raster` as `format` into a new file at `path`.
pub fn write_file(path: &Path, raster: &MappedRaster, format: ImageFormat) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_to(raster, format, &mut out)?;
    out.flush()?;
    info!("encoder: Wrote {:?} ({:?})", path, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Palette, Rgb};
    use image::GenericImageView;

    fn checkerboard() -> MappedRaster {
        let palette = Palette::new(Rgb::new(0x88, 0x77, 0x66), Rgb::new(0x77, 0x55, 0x44));
        let mut raster = MappedRaster::allocate(10, 4, palette).unwrap();
        for y in 0..4 {
            for x in 0..10 {
                raster.set_pixel_index(x, y, ((x + y) % 2) as u8).unwrap();
            }
        }
        raster
    }

    #[test]
    fn extensions_round_trip() {
        for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif] {
            assert_eq!(ImageFormat::from_extension(format.extension()), Some(format));
        }
        assert_eq!(ImageFormat::from_extension(".JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("bmp"), None);
    }

    #[test]
    fn rgb_expansion_follows_palette() {
        let raster = checkerboard();
        let img = to_rgb_image(&raster).unwrap();
        assert_eq!(img.dimensions(), (10, 4));
        assert_eq!(img.get_pixel(0, 0).0, [0x88, 0x77, 0x66]);
        assert_eq!(img.get_pixel(1, 0).0, [0x77, 0x55, 0x44]);
        assert_eq!(img.get_pixel(9, 3).0, [0x88, 0x77, 0x66]);
    }

    #[test]
    fn png_decodes_to_the_same_pixels() {
        let raster = checkerboard();
        let bytes = encode(&raster, ImageFormat::Png).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, to_rgb_image(&raster).unwrap());
    }

    #[test]
    fn png_is_one_bit_indexed_with_the_palette() {
        let raster = checkerboard();
        let bytes = encode(&raster, ImageFormat::Png).unwrap();
        // IHDR data starts at byte 16: width, height, bit depth, color type.
        assert_eq!(&bytes[16..24], &[0, 0, 0, 10, 0, 0, 0, 4]);
        assert_eq!(bytes[24], 1);
        assert_eq!(bytes[25], 3);

        let plte = bytes.windows(4).position(|w| w == b"PLTE").unwrap();
        assert_eq!(&bytes[plte - 4..plte], &[0, 0, 0, 6]);
        assert_eq!(
            &bytes[plte + 4..plte + 10],
            &[0x88, 0x77, 0x66, 0x77, 0x55, 0x44]
        );
    }

    #[test]
    fn gif_decodes_to_the_same_pixels() {
        let raster = checkerboard();
        let bytes = encode(&raster, ImageFormat::Gif).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, to_rgb_image(&raster).unwrap());
    }

    #[test]
    fn oversized_gif_is_an_encode_error() {
        let palette = Palette::new(Rgb::WHITE, Rgb::BLACK);
        let raster = MappedRaster::allocate(70_000, 1, palette).unwrap();
        assert!(matches!(
            encode(&raster, ImageFormat::Gif),
            Err(RenderError::Encode {
                format: ImageFormat::Gif,
                ..
            })
        ));
        // PNG has no such limit.
        assert!(encode(&raster, ImageFormat::Png).is_ok());
    }

    #[test]
    fn jpeg_and_gif_have_their_signatures() {
        let raster = checkerboard();
        let jpeg = encode(&raster, ImageFormat::Jpeg).unwrap();
        assert!(jpeg.starts_with(&[0xff, 0xd8]));
        let gif = encode(&raster, ImageFormat::Gif).unwrap();
        assert!(gif.starts_with(b"GIF8"));
    }

    #[test]
    fn released_raster_cannot_be_encoded() {
        let mut raster = checkerboard();
        raster.release();
        assert!(matches!(
            encode(&raster, ImageFormat::Png),
            Err(RenderError::Released)
        ));
    }

    #[test]
    fn write_file_creates_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_file(&path, &checkerboard(), ImageFormat::Png).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 4));
    }
}
