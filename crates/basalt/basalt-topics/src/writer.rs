use crate::error::TopicError;
use basalt_bus::BusWriter;
use serde::Serialize;
use serde_json::{Map, Value};

/// Accumulates a topic → value mapping and publishes it as one frame.
///
/// `add` only stages; nothing reaches the region until `write`. Staging
/// the same topic twice keeps the newest value: within one snapshot a
/// topic has exactly one payload.
pub struct TopicWriter {
    bus: BusWriter,
    pending: Map<String, Value>,
}

impl TopicWriter {
    pub fn new(bus: BusWriter) -> Self {
        Self {
            bus,
            pending: Map::new(),
        }
    }

    /// Stage `value` under `topic`, replacing any pending value for it.
    pub fn add<T: Serialize>(&mut self, topic: &str, value: T) -> Result<(), TopicError> {
        if topic.is_empty() {
            return Err(TopicError::InvalidTopic);
        }
        let value = serde_json::to_value(value)?;
        self.pending.insert(topic.to_string(), value);
        Ok(())
    }

    /// Drop everything staged without publishing.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of topics currently staged.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Serialize the staged mapping and publish it as the next frame.
    ///
    /// An empty mapping is a valid publication ("no topics this tick").
    /// On any failure the staged mapping is retained so the caller can
    /// shrink or fix it and retry; it is cleared only once the transport
    /// has accepted the frame.
    pub fn write(&mut self) -> Result<u64, TopicError> {
        let bytes = serde_json::to_vec(&self.pending)?;
        let seq = self.bus.publish(&bytes)?;
        self.pending.clear();
        Ok(seq)
    }

    /// The underlying transport writer, e.g. for teardown configuration.
    pub fn bus_mut(&mut self) -> &mut BusWriter {
        &mut self.bus
    }

    /// Consume the topic layer and give the transport writer back.
    pub fn into_inner(self) -> BusWriter {
        self.bus
    }
}
