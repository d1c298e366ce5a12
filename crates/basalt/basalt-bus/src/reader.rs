//! Reader side of the region: read-only view with two-phase seq-checked
//! polling.

use crate::error::{BusError, Result};
use crate::frame;
use crate::layout::{self, RegionHeader, SLOT_HEADER_SIZE};
use basalt_mmap::MmapFile;
use std::io;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::atomic::Ordering;
use tracing::debug;

/// Bound on in-flight-publish retries within one `poll` call.
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Outcome of a single [`BusReader::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// No frame newer than the last one returned.
    NothingNew,
    /// A CRC-valid frame this reader has not returned before.
    Frame { payload: Vec<u8>, seq: u64 },
    /// The committed slot failed validation. `last_seq` did not advance;
    /// the next valid publish is picked up normally.
    Corrupt { seq: u64 },
    /// The region file is gone; call [`BusReader::reattach`].
    Detached,
}

/// A read-only attachment to a shared region.
///
/// Any number of readers may attach to one region; each keeps its own
/// cursor (`last_seq`) and never writes a byte of shared memory. A reader
/// that polls slower than the writer publishes silently skips frames;
/// only the latest state matters.
#[derive(Debug)]
pub struct BusReader {
    /// `None` while detached.
    mm: Option<MmapFile>,
    base: *const u8,
    cap: usize,
    path: PathBuf,
    /// Seq of the last frame returned to the caller.
    last_seq: u64,
    /// `last_seq` before the most recent frame, for `unread_last`.
    prev_seq: u64,
    max_retries: u32,
}

// SAFETY: the reader only performs acquire loads and byte copies out of
// the mapped region; it owns no shared mutable state.
unsafe impl Send for BusReader {}

impl BusReader {
    /// Attach read-only to the region at `path`.
    ///
    /// `cap` must match the writer's capacity; agreement is validated by
    /// the total region size.
    pub fn attach<P: AsRef<Path>>(path: P, cap: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mm = Self::map(&path, cap)?;
        let base = mm.as_ptr();
        debug!(path = %path.display(), cap, "attached to region");
        Ok(Self {
            mm: Some(mm),
            base,
            cap,
            path,
            last_seq: 0,
            prev_seq: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    fn map(path: &Path, cap: usize) -> Result<MmapFile> {
        let mm = match MmapFile::open_ro(path) {
            Ok(mm) => mm,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BusError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let expected = layout::region_size(cap);
        if mm.len() != expected {
            return Err(BusError::SizeMismatch {
                expected,
                actual: mm.len(),
            });
        }
        Ok(mm)
    }

    /// Override the in-flight-publish retry bound (default 4).
    pub fn set_max_retries(&mut self, retries: u32) {
        self.max_retries = retries;
    }

    /// Seq of the last frame returned by `poll` (0 before the first).
    #[inline]
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Payload capacity per slot.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline(always)]
    fn header(&self) -> &RegionHeader {
        // SAFETY: base points to a size-validated region while attached;
        // poll and reattach guard every call with the attachment check.
        unsafe { &*(self.base as *const RegionHeader) }
    }

    /// Return the latest unseen frame, if any.
    ///
    /// Two-phase protocol: `seq` is acquired before and after copying the
    /// active slot. A mismatch means a publish landed mid-copy; the copy
    /// is discarded and the read retried, at most `max_retries` times so
    /// the call stays bounded even against a writer in a tight loop.
    pub fn poll(&mut self) -> PollResult {
        if self.mm.is_none() {
            return PollResult::Detached;
        }

        for _ in 0..=self.max_retries {
            let seq_a = self.header().seq.load(Ordering::Acquire);

            if seq_a < self.last_seq {
                // The region was recreated in place under us: a new seq
                // lifetime has begun, start over from its beginning.
                self.last_seq = 0;
                self.prev_seq = 0;
            }

            if seq_a == 0 || seq_a == self.last_seq {
                // Idle path: probe the inode so an unlinked region is
                // eventually reported instead of idling forever. The
                // probe only runs when there is nothing to deliver, so
                // it never delays a frame.
                if !self.mm.as_ref().is_some_and(MmapFile::is_linked) {
                    self.detach();
                    return PollResult::Detached;
                }
                return PollResult::NothingNew;
            }

            let idx = (self.header().active_index.load(Ordering::Acquire) & 1) as usize;

            // active_index is always seq % 2. Seeing them disagree means a
            // publish is mid-commit (index stored, seq not yet); retrying
            // keeps the frame-to-seq pairing exact.
            if idx as u64 != (seq_a & 1) {
                continue;
            }

            // SAFETY: idx selects one of the two slots of the validated
            // region; the SLOT_HEADER_SIZE prefix is always in bounds.
            let (size, crc) = unsafe {
                let slot = self.base.add(layout::slot_offset(idx, self.cap));
                let mut hdr = [0u8; SLOT_HEADER_SIZE];
                ptr::copy_nonoverlapping(slot, hdr.as_mut_ptr(), SLOT_HEADER_SIZE);
                frame::decode_header(&hdr)
            };

            if size as usize > self.cap {
                return PollResult::Corrupt { seq: seq_a };
            }

            let mut payload = vec![0u8; size as usize];
            // SAFETY: size <= cap keeps the copy inside the slot. The
            // bytes may be torn by a concurrent publish; the seq re-check
            // below rejects such a copy before it escapes.
            unsafe {
                let data = self
                    .base
                    .add(layout::slot_offset(idx, self.cap) + SLOT_HEADER_SIZE);
                ptr::copy_nonoverlapping(data, payload.as_mut_ptr(), size as usize);
            }

            let seq_b = self.header().seq.load(Ordering::Acquire);
            if seq_b != seq_a {
                // Publish landed mid-copy; discard and retry.
                continue;
            }

            if frame::checksum(&payload) != crc {
                return PollResult::Corrupt { seq: seq_a };
            }

            self.prev_seq = self.last_seq;
            self.last_seq = seq_a;
            return PollResult::Frame {
                payload,
                seq: seq_a,
            };
        }

        // Retry bound exhausted under a hot writer; the next poll starts
        // fresh and will land on whatever is newest by then.
        PollResult::NothingNew
    }

    /// Forget the most recent frame: the next `poll` returns it again.
    ///
    /// For layers above the transport that accept a frame and then fail to
    /// interpret it: restoring the cursor keeps the frame observable
    /// until something newer replaces it.
    pub fn unread_last(&mut self) {
        self.last_seq = self.prev_seq;
    }

    /// Re-open the region after [`PollResult::Detached`]. Idempotent:
    /// calling while attached is a no-op.
    ///
    /// A successful reattach starts a fresh seq lifetime (`last_seq` = 0),
    /// so the new region's current frame is delivered once even if its seq
    /// collides with one already seen from the old region.
    pub fn reattach(&mut self) -> Result<()> {
        if self.mm.is_some() {
            return Ok(());
        }
        let mm = Self::map(&self.path, self.cap)?;
        self.base = mm.as_ptr();
        self.mm = Some(mm);
        self.last_seq = 0;
        self.prev_seq = 0;
        debug!(path = %self.path.display(), "reattached to region");
        Ok(())
    }

    fn detach(&mut self) {
        self.mm = None;
        self.base = ptr::null();
        debug!(path = %self.path.display(), "region unlinked; detached");
    }
}
