//! 1-bit indexed raster whose pixels live in a memory-mapped temporary file.
//!
//! Each raster gets its own randomly named backing file. The file is sized,
//! mapped, and unlinked straight away so the mapping is the only reference to
//! it and the OS reclaims the space on unmap or exit. When the unlink fails the
//! path is kept and deleted on [`MappedRaster::release`], or at exit as a last
//! resort.
//!
//! Layout is the packed layout of a 1-bit indexed image: each row starts on a
//! byte boundary (`stride = ceil(width / 8)`) and the leftmost pixel of a byte
//! is its most significant bit.

pub mod cleanup;
mod mmap;


use crate::color::Palette;
use crate::error::{RenderError, Result};
use log::*;
use mmap::MmapRegion;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Bits per pixel of every raster.
pub const BITS_PER_PIXEL: u32 = 1;

const BACKING_FILE_PREFIX: &str = "mapped-raster-";
const BACKING_FILE_SUFFIX: &str = ".tmp";

/// Packed bytes per row for a raster `width` pixels wide.
pub fn row_stride(width: u32) -> usize {
    (width as usize).div_ceil(8)
}

pub struct MappedRaster {
    width: u32,
    height: u32,
    stride: usize,
    palette: Palette,
    /// `None` once released.
    region: Option<MmapRegion>,
    backing_path: PathBuf,
    /// Set when the backing file could not be unlinked after mapping.
    pending_delete: bool,
}

impl MappedRaster {
    /// Allocate a raster in the system temporary directory.
    pub fn allocate(width: u32, height: u32, palette: Palette) -> Result<Self> {
        Self::allocate_in(&std::env::temp_dir(), width, height, palette)
    }

    /// Allocate a raster whose backing file is created in `dir`.
    pub fn allocate_in(dir: &Path, width: u32, height: u32, palette: Palette) -> Result<Self> {
        Self::allocate_with_unlink(dir, width, height, palette, TempPath::close)
    }

    /// Allocate in `dir`, using `unlink` to remove the backing file once it is
    /// mapped. A failed `unlink` that leaves the file in place defers its
    /// deletion.
    pub(crate) fn allocate_with_unlink(
        dir: &Path,
        width: u32,
        height: u32,
        palette: Palette,
        unlink: impl FnOnce(TempPath) -> io::Result<()>,
    ) -> Result<Self> {
        let allocation_error = |path: Option<&Path>, source: io::Error| RenderError::Allocation {
            width,
            height,
            path: path.map(Path::to_path_buf),
            source,
        };

        if width == 0 || height == 0 {
            return Err(allocation_error(
                None,
                io::Error::new(io::ErrorKind::InvalidInput, "raster must be at least 1x1"),
            ));
        }

        let stride = row_stride(width);
        let len = stride * height as usize;

        let temp = tempfile::Builder::new()
            .prefix(BACKING_FILE_PREFIX)
            .suffix(BACKING_FILE_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| allocation_error(Some(dir), e))?;
        let (file, temp_path) = temp.into_parts();
        let backing_path = temp_path.to_path_buf();

        // Until the unlink below, `temp_path` deletes the file on any early
        // return.
        file.set_len(len as u64)
            .map_err(|e| allocation_error(Some(backing_path.as_path()), e))?;
        let region = MmapRegion::map_shared(&file, len)
            .map_err(|e| allocation_error(Some(backing_path.as_path()), e))?;
        drop(file);

        let pending_delete = match unlink(temp_path) {
            Ok(()) => false,
            Err(e) => {
                warn!(
                    "MappedRaster: Could not unlink {:?} after mapping: {}; deferring deletion",
                    backing_path, e
                );
                cleanup::defer(&backing_path);
                true
            }
        };

        debug!(
            "MappedRaster: Mapped {}x{} raster ({} bytes, stride {}) over {:?}",
            width, height, len, stride, backing_path
        );

        Ok(Self {
            width,
            height,
            stride,
            palette,
            region: Some(region),
            backing_path,
            pending_delete,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Path the backing file had when it was created. After a successful
    /// unlink the path no longer exists on disk.
    pub fn backing_path(&self) -> &Path {
        &self.backing_path
    }

    /// Whether the backing file is still linked and waiting for deletion.
    pub fn is_delete_pending(&self) -> bool {
        self.pending_delete
    }

    pub fn is_released(&self) -> bool {
        self.region.is_none()
    }

    /// Size of the mapped pixel store in bytes, or 0 once released.
    pub fn byte_len(&self) -> usize {
        self.region.as_ref().map_or(0, MmapRegion::len)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn locate(&self, x: i32, y: i32) -> Result<(usize, u8)> {
        if !self.contains(x, y) {
            return Err(RenderError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let (x, y) = (x as usize, y as usize);
        Ok((y * self.stride + x / 8, 0x80 >> (x % 8)))
    }

    pub fn get_pixel_index(&self, x: i32, y: i32) -> Result<u8> {
        let (offset, mask) = self.locate(x, y)?;
        let region = self.region.as_ref().ok_or(RenderError::Released)?;
        Ok(u8::from(region.as_slice()[offset] & mask != 0))
    }

    /// Set a pixel to palette index `value & 1`.
    pub fn set_pixel_index(&mut self, x: i32, y: i32, value: u8) -> Result<()> {
        let (offset, mask) = self.locate(x, y)?;
        let region = self.region.as_mut().ok_or(RenderError::Released)?;
        let byte = &mut region.as_mut_slice()[offset];
        if value & 1 == 1 {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        Ok(())
    }

    /// Set every pixel, including row padding bits, to palette index `value & 1`.
    pub fn fill(&mut self, value: u8) -> Result<()> {
        let region = self.region.as_mut().ok_or(RenderError::Released)?;
        let byte = if value & 1 == 1 { 0xff } else { 0x00 };
        region.as_mut_slice().fill(byte);
        Ok(())
    }

    /// Packed bytes of row `y`.
    pub fn row(&self, y: u32) -> Result<&[u8]> {
        if y >= self.height {
            return Err(RenderError::OutOfBounds {
                x: 0,
                y: y.min(i32::MAX as u32) as i32,
                width: self.width,
                height: self.height,
            });
        }
        let region = self.region.as_ref().ok_or(RenderError::Released)?;
        let start = y as usize * self.stride;
        Ok(&region.as_slice()[start..start + self.stride])
    }

    /// The whole packed pixel store, `stride` bytes per row.
    pub fn pixels(&self) -> Result<&[u8]> {
        let region = self.region.as_ref().ok_or(RenderError::Released)?;
        Ok(region.as_slice())
    }

    /// Unmap the pixel store and delete the backing file if it is still
    /// linked. Calling it again does nothing.
    pub fn release(&mut self) {
        let Some(region) = self.region.take() else {
            trace!("MappedRaster: {:?} already released", self.backing_path);
            return;
        };
        drop(region);

        if self.pending_delete && cleanup::remove(&self.backing_path) {
            self.pending_delete = false;
        }
        debug!("MappedRaster: Released {:?}", self.backing_path);
    }
}

impl Drop for MappedRaster {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for MappedRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRaster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("palette", &self.palette)
            .field("backing_path", &self.backing_path)
            .field("released", &self.is_released())
            .finish()
    }
}
