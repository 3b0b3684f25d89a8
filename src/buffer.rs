//! Buffer: owned pixel memory in one of the formats enumerated by
//! spec.md §6, reference-counted, with per-row stride access.
//!
//! Row access is grounded on `rendering_buffer.rs`'s `RowAccessor`
//! (base + y*stride addressing); this module trades `RowAccessor`'s raw
//! pointers for a safe `Arc<Mutex<Vec<u8>>>` since a `Buffer` here is
//! always Rust-owned (no FFI pixel memory to alias) and shared across
//! the row-striping worker threads of §5, which is the idiomatic shape
//! for the ownership/refcounting spec.md §3 calls for.

use std::sync::{Arc, Mutex};

use crate::error::RendererError;

/// Pixel formats the engine understands at its boundary (spec.md §6).
/// The rasterizer always works in `Argb8888Pre`; converters translate
/// to/from the others at buffer boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Argb8888,
    Argb8888Pre,
    Xrgb8888,
    Rgb888,
    Bgr888,
    Rgb565,
    A8,
    Gray8,
    Cmyk,
    CmykAdobe,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Argb8888 | PixelFormat::Argb8888Pre | PixelFormat::Xrgb8888 => 4,
            PixelFormat::Rgb888 | PixelFormat::Bgr888 => 3,
            PixelFormat::Cmyk | PixelFormat::CmykAdobe => 4,
            PixelFormat::Rgb565 => 2,
            PixelFormat::A8 | PixelFormat::Gray8 => 1,
        }
    }
}

/// Where a buffer's pixel memory came from, controlling who frees it on
/// last unref (spec.md §3 "Buffer").
pub enum Provenance {
    /// Owned by a pool; the pool frees it. This crate's default pool is
    /// the system allocator (`Vec<u8>`'s own allocator), per
    /// `SPEC_FULL.md` §2.1.
    Pool,
    /// Externally supplied; a user callback runs on last unref.
    External(Box<dyn FnOnce(&mut [u8]) + Send>),
    /// A copy of externally-owned memory; the pool frees it like `Pool`.
    Copied,
}

impl std::fmt::Debug for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Pool => write!(f, "Provenance::Pool"),
            Provenance::External(_) => write!(f, "Provenance::External(..)"),
            Provenance::Copied => write!(f, "Provenance::Copied"),
        }
    }
}

struct BufferInner {
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
    provenance: Provenance,
}

impl Drop for BufferInner {
    fn drop(&mut self) {
        if let Provenance::External(_) = &self.provenance {
            if let Provenance::External(cb) = std::mem::replace(&mut self.provenance, Provenance::Copied) {
                cb(&mut self.data);
            }
        }
    }
}

/// A reference-counted handle to owned pixel memory (spec.md §3
/// "Buffer"). Cloning a `Buffer` shares the same underlying memory; the
/// memory is released when the last clone is dropped. Backed by
/// `Arc<Mutex<_>>` rather than `Rc<RefCell<_>>` since §5's row-striping
/// concurrency model shares a destination buffer across worker threads.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<Mutex<BufferInner>>,
}

impl Buffer {
    /// Allocate a new zero-filled buffer of `format` sized `width x
    /// height`, pool-provenance.
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Result<Self, RendererError> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidGeometry("buffer size < 1".to_string()));
        }
        let stride = width as usize * format.bytes_per_pixel();
        let data = vec![0u8; stride * height as usize];
        Ok(Self { inner: Arc::new(Mutex::new(BufferInner { format, width, height, stride, data, provenance: Provenance::Pool })) })
    }

    /// Wrap externally-supplied pixel data, optionally copying it.
    pub fn new_data_from(
        format: PixelFormat,
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
        copy: bool,
        free_cb: Option<Box<dyn FnOnce(&mut [u8]) + Send>>,
    ) -> Result<Self, RendererError> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidGeometry("buffer size < 1".to_string()));
        }
        let provenance = if copy {
            Provenance::Copied
        } else if let Some(cb) = free_cb {
            Provenance::External(cb)
        } else {
            Provenance::Copied
        };
        Ok(Self { inner: Arc::new(Mutex::new(BufferInner { format, width, height, stride, data, provenance })) })
    }

    pub fn format(&self) -> PixelFormat {
        self.inner.lock().unwrap().format
    }

    pub fn size(&self) -> (u32, u32) {
        let b = self.inner.lock().unwrap();
        (b.width, b.height)
    }

    pub fn stride(&self) -> usize {
        self.inner.lock().unwrap().stride
    }

    /// Number of `Buffer` handles sharing this memory — the reference
    /// count spec.md §3 calls for.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Run `f` with a read-only view of one row's bytes.
    pub fn with_row<R>(&self, y: u32, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let b = self.inner.lock().unwrap();
        if y >= b.height {
            return None;
        }
        let start = y as usize * b.stride;
        Some(f(&b.data[start..start + b.stride]))
    }

    /// Run `f` with a mutable view of one row's bytes.
    pub fn with_row_mut<R>(&self, y: u32, f: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        let mut b = self.inner.lock().unwrap();
        if y >= b.height {
            return None;
        }
        let start = y as usize * b.stride;
        let stride = b.stride;
        Some(f(&mut b.data[start..start + stride]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zero_filled() {
        let b = Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap();
        b.with_row(0, |row| assert!(row.iter().all(|&v| v == 0)));
    }

    #[test]
    fn zero_size_is_invalid_geometry() {
        assert!(matches!(Buffer::new(PixelFormat::Argb8888Pre, 0, 4), Err(RendererError::InvalidGeometry(_))));
    }

    #[test]
    fn cloning_shares_memory_and_increments_refcount() {
        let a = Buffer::new(PixelFormat::Argb8888Pre, 2, 2).unwrap();
        assert_eq!(a.ref_count(), 1);
        let b = a.clone();
        assert_eq!(a.ref_count(), 2);
        b.with_row_mut(0, |row| row[0] = 0xAB);
        a.with_row(0, |row| assert_eq!(row[0], 0xAB));
    }

    #[test]
    fn row_out_of_bounds_returns_none() {
        let b = Buffer::new(PixelFormat::Argb8888Pre, 2, 2).unwrap();
        assert!(b.with_row(5, |_| ()).is_none());
    }

    #[test]
    fn stride_matches_width_times_bpp() {
        let b = Buffer::new(PixelFormat::Rgb888, 3, 1).unwrap();
        assert_eq!(b.stride(), 9);
    }
}
