//! Slot frame codec: `size_le || crc_le || payload`.
//!
//! The prefix is written by the publisher before the commit stores and
//! decoded by readers before copying the payload out. Validation is split
//! across the two sides of the copy: the `size` bound is checked against
//! the configured capacity before copying, the CRC is checked over the
//! reader-owned copy afterwards.

use crate::layout::SLOT_HEADER_SIZE;

/// IEEE CRC32: reflected polynomial 0xEDB88320, initial value 0xFFFFFFFF,
/// final XOR 0xFFFFFFFF. `crc32fast` computes exactly this standard, so
/// any conforming CRC32 on the reader side reproduces the value.
#[inline]
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Encode the slot prefix for a payload of `len` bytes.
#[inline]
pub fn encode_header(len: u32, crc: u32) -> [u8; SLOT_HEADER_SIZE] {
    let mut out = [0u8; SLOT_HEADER_SIZE];
    out[..4].copy_from_slice(&len.to_le_bytes());
    out[4..].copy_from_slice(&crc.to_le_bytes());
    out
}

/// Decode a slot prefix into `(len, crc)`.
#[inline]
pub fn decode_header(buf: &[u8; SLOT_HEADER_SIZE]) -> (u32, u32) {
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let crc = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    (len, crc)
}
