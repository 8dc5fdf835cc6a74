//! Read/write shared mapping over a file.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::ptr;

/// A `MAP_SHARED` read/write mapping. Unmapped on drop.
pub(crate) struct MmapRegion {
    ptr: *mut u8,
    len: usize,
}

impl MmapRegion {
    /// Map the first `len` bytes of `file`, which must already be at least
    /// that long.
    pub(crate) fn map_shared(file: &File, len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot mmap an empty region",
            ));
        }

        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            ptr: ptr as *mut u8,
            len,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for MmapRegion {
    fn drop(&mut self) {
        let rc = unsafe { libc::munmap(self.ptr as *mut libc::c_void, self.len) };
        if rc != 0 {
            log::warn!(
                "MmapRegion: munmap of {} bytes failed: {}",
                self.len,
                io::Error::last_os_error()
            );
        }
    }
}

// SAFETY: the region is owned exclusively by one `MmapRegion`; mutable access
// goes through `&mut self`, so moving it to another thread is sound.
unsafe impl Send for MmapRegion {}
// SAFETY: shared references only hand out `&[u8]`.
unsafe impl Sync for MmapRegion {}
