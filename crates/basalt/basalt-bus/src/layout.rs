//! Byte layout of the shared region.
//!
//! The layout is the interoperability contract: any process that honors
//! these offsets can attach to the same region, whatever language it is
//! written in. All multi-byte integers are little-endian and naturally
//! aligned.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  seq (8B atomic) │ active_index (1B) │ pad to 16B, zero      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  slot 0:  size (4B LE) │ crc (4B LE) │ payload[cap]          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  slot 1:  size (4B LE) │ crc (4B LE) │ payload[cap]          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Total region size is `16 + 2 * (8 + cap)`. There is no capacity field
//! in the header; both sides must configure the same `cap`, and agreement
//! is validated by matching the total file size on attach.

use std::mem::size_of;
use std::sync::atomic::{AtomicU8, AtomicU64};

/// Global header size; slot 0 begins at this offset.
pub const HEADER_SIZE: usize = 16;

/// `size || crc` prefix ahead of each slot's payload.
pub const SLOT_HEADER_SIZE: usize = 8;

/// Default payload capacity per slot (512 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 512 * 1024;

/// Region header at offset 0. An all-zero header is the valid initial
/// state (`seq = 0` means "no frame published yet"), so a freshly created
/// region needs no explicit initialization beyond zero fill.
#[repr(C)]
pub struct RegionHeader {
    /// Monotonic publication counter; increments by 1 per publish and
    /// never wraps within a region lifetime. The release store of this
    /// field is the single linearization point of a publish.
    pub seq: AtomicU64,

    /// `seq % 2`: which slot holds the committed frame. The other slot is
    /// the writer's scratchpad and may hold arbitrary bytes.
    pub active_index: AtomicU8,

    /// Reserved, zero.
    _pad: [u8; 7],
}

const _: () = assert!(size_of::<RegionHeader>() == HEADER_SIZE);

/// Total region size in bytes for a payload capacity.
#[inline]
pub fn region_size(cap: usize) -> usize {
    HEADER_SIZE + 2 * (SLOT_HEADER_SIZE + cap)
}

/// Byte offset of slot `index` (0 or 1) within the region.
#[inline]
pub fn slot_offset(index: usize, cap: usize) -> usize {
    HEADER_SIZE + index * (SLOT_HEADER_SIZE + cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_size_matches_contract() {
        assert_eq!(region_size(4096), 16 + 2 * (8 + 4096));
        assert_eq!(
            region_size(DEFAULT_BUFFER_CAPACITY),
            16 + 2 * (8 + 524_288)
        );
    }

    #[test]
    fn slots_are_adjacent() {
        let cap = 4096;
        assert_eq!(slot_offset(0, cap), HEADER_SIZE);
        assert_eq!(
            slot_offset(1, cap),
            slot_offset(0, cap) + SLOT_HEADER_SIZE + cap
        );
        assert_eq!(slot_offset(1, cap) + SLOT_HEADER_SIZE + cap, region_size(cap));
    }
}
