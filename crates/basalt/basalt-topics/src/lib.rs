//! `basalt-topics`: topic-keyed batching on top of the region transport.
//!
//! One publication carries a whole snapshot: a JSON object whose keys are
//! topic names and whose values are the topic payloads. The writer side
//! accumulates topics and flushes them as a single frame; the reader side
//! decodes the object and hands each topic's value to the handler
//! registered for it.
//!
//! ```text
//! producer                                   consumer
//!   TopicWriter::add("speed", 287.4)           TopicReader::on("speed", …)
//!   TopicWriter::add("gear", 7)                TopicReader::on("gear", …)
//!   TopicWriter::write()  ─── one frame ───▶   TopicReader::read()
//! ```
//!
//! Latest-state semantics carry through unchanged: a slow consumer skips
//! intermediate snapshots, and every snapshot is self-contained, with no
//! per-topic delta encoding to fall behind on.

mod error;
mod reader;
mod writer;

pub use error::TopicError;
pub use reader::{HandlerError, ReadResult, TopicReader};
pub use writer::TopicWriter;
