//! Surface (C8 support type): a [`Buffer`] bound to a rendering backend,
//! guarded by a single-writer/multiple-reader lock, with the
//! setup→draw→cleanup ordering invariant enforced per renderer
//! (spec.md §3 "Surface", §5 "Shared resources").
//!
//! Grounded on the teacher's `rendering_buffer.rs` row-stride ownership
//! model (a `Surface` here borrows its pixel rows through the same
//! `Buffer::with_row`/`with_row_mut` contract) plus spec.md §5's
//! description of the lock discipline, which this crate implements with
//! `std::sync::RwLock` rather than a hand-rolled lock since the teacher
//! itself reaches for `std::sync` primitives in its concurrent paths.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::buffer::Buffer;
use crate::error::RendererError;

/// A write-lock guard. Dropping it releases the surface for the next
/// writer or readers.
pub struct WriteGuard<'a> {
    surface: &'a Surface,
}

impl<'a> Drop for WriteGuard<'a> {
    fn drop(&mut self) {
        let mut guard = self.surface.writer_active.write().unwrap();
        *guard = false;
    }
}

/// A read-lock guard.
pub struct ReadGuard<'a> {
    surface: &'a Surface,
}

impl<'a> Drop for ReadGuard<'a> {
    fn drop(&mut self) {
        let mut count = self.surface.reader_count.write().unwrap();
        *count -= 1;
    }
}

/// A buffer bound to a backend (spec.md §3 "Surface"). Tracks, per
/// renderer identity, whether that renderer currently has an
/// outstanding `setup` without a matching `cleanup` — spec.md §4.8's
/// "2nd setup without cleanup is a fatal contract violation" and
/// testable property 4 (setup/cleanup pairing).
pub struct Surface {
    buffer: Buffer,
    writer_active: RwLock<bool>,
    reader_count: RwLock<u32>,
    setup_in_progress: RwLock<HashSet<u64>>,
}

impl Surface {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            writer_active: RwLock::new(false),
            reader_count: RwLock::new(0),
            setup_in_progress: RwLock::new(HashSet::new()),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Acquire the single write lock (spec.md §5: "draw acquires
    /// write"). Returns `None` if a writer or any reader currently holds
    /// the surface.
    pub fn try_lock_write(&self) -> Option<WriteGuard<'_>> {
        let mut writer = self.writer_active.write().unwrap();
        let readers = *self.reader_count.read().unwrap();
        if *writer || readers > 0 {
            return None;
        }
        *writer = true;
        Some(WriteGuard { surface: self })
    }

    /// Acquire a read lock (spec.md §5: "image-renderer sampling
    /// acquires read"). Multiple readers may hold this concurrently;
    /// fails while a writer holds the surface.
    pub fn try_lock_read(&self) -> Option<ReadGuard<'_>> {
        let writer = *self.writer_active.read().unwrap();
        if writer {
            return None;
        }
        let mut count = self.reader_count.write().unwrap();
        *count += 1;
        Some(ReadGuard { surface: self })
    }

    /// Record that `renderer_id` has begun setup on this surface.
    /// Returns `ChildSetupFailed`-free `Err` if that renderer already has
    /// an outstanding setup (the reentrancy guard spec.md §4.8 requires).
    pub fn begin_setup(&self, renderer_id: u64) -> Result<(), RendererError> {
        let mut set = self.setup_in_progress.write().unwrap();
        if !set.insert(renderer_id) {
            return Err(RendererError::Unsupported("renderer already has an outstanding setup on this surface".to_string()));
        }
        Ok(())
    }

    /// Record that `renderer_id` has completed cleanup on this surface.
    pub fn end_setup(&self, renderer_id: u64) {
        let mut set = self.setup_in_progress.write().unwrap();
        set.remove(&renderer_id);
    }

    pub fn has_outstanding_setup(&self, renderer_id: u64) -> bool {
        self.setup_in_progress.read().unwrap().contains(&renderer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelFormat;

    fn surface() -> Surface {
        Surface::new(Buffer::new(PixelFormat::Argb8888Pre, 4, 4).unwrap())
    }

    #[test]
    fn write_lock_excludes_second_writer() {
        let s = surface();
        let _w1 = s.try_lock_write().unwrap();
        assert!(s.try_lock_write().is_none());
    }

    #[test]
    fn write_lock_releases_on_drop() {
        let s = surface();
        {
            let _w1 = s.try_lock_write().unwrap();
        }
        assert!(s.try_lock_write().is_some());
    }

    #[test]
    fn multiple_readers_allowed_concurrently() {
        let s = surface();
        let _r1 = s.try_lock_read().unwrap();
        let _r2 = s.try_lock_read().unwrap();
        assert!(s.try_lock_write().is_none());
    }

    #[test]
    fn writer_excludes_readers() {
        let s = surface();
        let _w = s.try_lock_write().unwrap();
        assert!(s.try_lock_read().is_none());
    }

    #[test]
    fn second_setup_without_cleanup_fails() {
        let s = surface();
        s.begin_setup(1).unwrap();
        assert!(s.begin_setup(1).is_err());
        s.end_setup(1);
        assert!(s.begin_setup(1).is_ok());
    }
}
