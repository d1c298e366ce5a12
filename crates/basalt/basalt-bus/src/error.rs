use std::io;

/// Errors surfaced by the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// No region file exists at the requested path.
    #[error("region not found at '{path}'")]
    NotFound { path: String },

    /// The region file exists but its size does not match the configured
    /// buffer capacity: writer and reader disagree on `buffer_capacity`.
    #[error("region size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Underlying file or mapping failure.
    #[error("region I/O failed")]
    Os(#[from] io::Error),

    /// Payload exceeds the per-slot capacity. The region was not touched.
    #[error("payload of {len} bytes exceeds slot capacity {cap}")]
    PayloadTooLarge { len: usize, cap: usize },
}

pub type Result<T> = std::result::Result<T, BusError>;
