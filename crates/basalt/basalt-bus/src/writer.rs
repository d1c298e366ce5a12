//! Writer side of the region: owns the read-write mapping and publishes
//! frames with the double-buffer flip protocol.

use crate::error::{BusError, Result};
use crate::frame;
use crate::layout::{self, RegionHeader, SLOT_HEADER_SIZE};
use basalt_mmap::MmapFileMut;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::atomic::Ordering;
use tracing::debug;

/// The publishing side of a shared region.
///
/// Exactly one writer may exist per region at any time; the transport does
/// not enforce this, it is the embedder's contract. Publication never
/// blocks and never observes reader progress: the writer fills whichever
/// slot readers are guaranteed not to be looking at, then commits it with
/// two release stores.
#[derive(Debug)]
pub struct BusWriter {
    /// Owns the mapping lifetime; accessed through the cached base pointer.
    _mm: MmapFileMut,
    /// Raw pointer to the start of the mapped region.
    base: *mut u8,
    /// Payload capacity per slot.
    cap: usize,
    /// Region path, retained for teardown.
    path: PathBuf,
    unlink_on_close: bool,
}

// SAFETY: the writer is the sole mutator of the region and all commit
// fields are atomics; moving the writer between threads is fine. It is
// deliberately not Sync: concurrent `publish` calls are not supported.
unsafe impl Send for BusWriter {}

impl BusWriter {
    /// Create a fresh region at `path`, destroying any prior contents.
    ///
    /// The file is truncated to exactly `region_size(cap)` bytes; the
    /// zero fill is the valid initial header state (`seq = 0`).
    pub fn create<P: AsRef<Path>>(path: P, cap: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mm = MmapFileMut::create_rw(&path, layout::region_size(cap) as u64)?;
        debug!(path = %path.display(), cap, "created region");
        Ok(Self::from_map(mm, cap, path))
    }

    /// Attach to an existing region at `path`, or create it if missing.
    ///
    /// A region left behind by a crashed writer is picked up as-is: `seq`
    /// continues from its last committed value and the previous frame
    /// stays readable to everyone throughout the handover.
    pub fn open_or_create<P: AsRef<Path>>(path: P, cap: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Self::create(path, cap);
        }

        let mm = MmapFileMut::open_rw(&path)?;
        let expected = layout::region_size(cap);
        if mm.len() != expected {
            return Err(BusError::SizeMismatch {
                expected,
                actual: mm.len(),
            });
        }
        debug!(path = %path.display(), cap, "reattached to existing region");
        Ok(Self::from_map(mm, cap, path))
    }

    fn from_map(mut mm: MmapFileMut, cap: usize, path: PathBuf) -> Self {
        let base = mm.as_mut_ptr();
        Self {
            _mm: mm,
            base,
            cap,
            path,
            unlink_on_close: false,
        }
    }

    #[inline(always)]
    fn header(&self) -> &RegionHeader {
        // SAFETY: the region is at least HEADER_SIZE bytes and zero (or a
        // previous writer's committed state) is a valid RegionHeader.
        unsafe { &*(self.base as *const RegionHeader) }
    }

    /// Publish `payload` as the next frame.
    ///
    /// The slot that will become active, `(seq + 1) % 2`, is the one no
    /// reader can currently be validating, so its bytes are filled with
    /// plain stores. Commit order matters: `active_index` first, `seq`
    /// last, both release, so a reader that acquires the new `seq` sees
    /// the matching index and a fully written slot.
    pub fn publish(&mut self, payload: &[u8]) -> Result<u64> {
        if payload.len() > self.cap {
            return Err(BusError::PayloadTooLarge {
                len: payload.len(),
                cap: self.cap,
            });
        }

        // Only this writer ever stores seq; relaxed reads back our own
        // last store.
        let seq = self.header().seq.load(Ordering::Relaxed);
        let next = seq + 1;
        let target = (next & 1) as usize;

        let crc = frame::checksum(payload);
        let hdr = frame::encode_header(payload.len() as u32, crc);

        // SAFETY: target is 0 or 1 and payload.len() <= cap, so both
        // copies stay inside slot `target`, which lies within the mapped
        // region by construction. Readers do not touch the inactive slot;
        // the release store of `seq` below publishes these plain writes.
        unsafe {
            let slot = self.base.add(layout::slot_offset(target, self.cap));
            ptr::copy_nonoverlapping(hdr.as_ptr(), slot, SLOT_HEADER_SIZE);
            ptr::copy_nonoverlapping(
                payload.as_ptr(),
                slot.add(SLOT_HEADER_SIZE),
                payload.len(),
            );
        }

        let h = self.header();
        h.active_index.store(target as u8, Ordering::Release);
        h.seq.store(next, Ordering::Release);
        Ok(next)
    }

    /// Payload capacity per slot.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Seq of the most recently published frame (0 before the first).
    #[inline]
    pub fn seq(&self) -> u64 {
        self.header().seq.load(Ordering::Relaxed)
    }

    /// Remove the region file when this writer closes. Default is to keep
    /// it, so readers keep serving the last frame across writer restarts.
    pub fn unlink_on_close(&mut self, unlink: bool) {
        self.unlink_on_close = unlink;
    }

    /// Detach from the region, unlinking the file when configured.
    ///
    /// Attached readers keep their mapping; after an unlink their next
    /// idle poll reports `Detached`. Simply dropping the writer never
    /// unlinks, since a crash must leave the region readable.
    pub fn close(self) -> Result<()> {
        if self.unlink_on_close {
            std::fs::remove_file(&self.path)?;
            debug!(path = %self.path.display(), "region unlinked on close");
        }
        Ok(())
    }
}
