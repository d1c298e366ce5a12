//! `basalt-bus`: single-writer / multi-reader latest-state broadcast over
//! a shared memory-mapped region.
//!
//! One writer publishes state snapshots; any number of readers on the same
//! host observe the most recent one. The region holds two payload slots
//! and a tiny header; each publish fills the inactive slot and atomically
//! flips it active, so readers are never blocked, never block the writer,
//! and either see a complete CRC-valid frame or nothing new.
//!
//! ```text
//! ┌───────────┐       shared region (mmap file)      ┌───────────┐
//! │ BusWriter │ ──────────────────────────────────── │ BusReader │
//! │(Process A)│   header │ slot 0 │ slot 1           │(Process B)│
//! └───────────┘                                      └───────────┘
//!                                                    ┌───────────┐
//!                                                    │ BusReader │
//!                                                    │(Process C)│
//!                                                    └───────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use basalt_bus::{BusWriter, BusReader, PollResult};
//!
//! // Writer (typically in one process)
//! let mut writer = BusWriter::create("/tmp/state_bus", 4096)?;
//! writer.publish(b"HELLO")?;
//!
//! // Reader (same or different process)
//! let mut reader = BusReader::attach("/tmp/state_bus", 4096)?;
//! if let PollResult::Frame { payload, seq } = reader.poll() {
//!     println!("frame {seq}: {} bytes", payload.len());
//! }
//! ```
//!
//! # Guarantees
//!
//! - Publication is lock-free and wait-free for the writer; its duration
//!   does not depend on reader count or reader progress.
//! - A frame returned by `poll` is byte-identical to what was published
//!   under that seq (two-phase seq check plus CRC32).
//! - Slow readers skip intermediate frames and always converge on the
//!   newest one; a crashed writer leaves the last frame readable.
//!
//! # Internal Modules
//!
//! - `layout`: the shared region byte contract (public: it is the
//!   cross-process interface)
//! - `frame`: CRC32 and the per-slot `size || crc` prefix
//! - `writer` / `reader`: the two endpoints
//! - `error`: transport error taxonomy

mod error;
mod frame;
pub mod layout;
mod reader;
mod writer;

pub use error::{BusError, Result};
pub use layout::DEFAULT_BUFFER_CAPACITY;
pub use reader::{BusReader, DEFAULT_MAX_RETRIES, PollResult};
pub use writer::BusWriter;
