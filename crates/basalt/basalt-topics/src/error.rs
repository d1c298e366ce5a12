/// Errors surfaced by the topic layer.
#[derive(Debug, thiserror::Error)]
pub enum TopicError {
    /// Topic names must be non-empty.
    #[error("topic name must not be empty")]
    InvalidTopic,

    /// A staged value could not be serialized. The pending mapping is
    /// kept, so the caller can fix the value and retry.
    #[error("failed to encode topic batch")]
    Encode(#[from] serde_json::Error),

    /// Transport failure, forwarded verbatim.
    #[error(transparent)]
    Bus(#[from] basalt_bus::BusError),
}
