use basalt_bus::{BusReader, PollResult};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

/// Boxed error a topic handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type Handler = Box<dyn FnMut(&Value) -> Result<(), HandlerError> + Send>;

/// Outcome of a single [`TopicReader::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    /// A snapshot was decoded; `topics` handlers were invoked.
    Dispatched { topics: usize, seq: u64 },
    /// No snapshot newer than the last one dispatched.
    NothingNew,
    /// Transport-level corruption, forwarded from the bus.
    Corrupt { seq: u64 },
    /// The frame was transport-valid but not a JSON object. It stays
    /// unconsumed, so it is reported again until something newer is
    /// published.
    DecodeError { seq: u64 },
    /// The region is gone; call [`TopicReader::reattach`].
    Detached,
}

/// Dispatches decoded snapshots to per-topic handlers.
///
/// Exactly one handler per topic; re-registration replaces. Topics in a
/// snapshot with no registered handler are ignored, and registered topics
/// absent from a snapshot simply do not fire: a snapshot names only what
/// the producer staged that tick.
pub struct TopicReader {
    bus: BusReader,
    handlers: HashMap<String, Handler>,
}

impl TopicReader {
    pub fn new(bus: BusReader) -> Self {
        Self {
            bus,
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `topic`, replacing any existing one.
    pub fn on<F>(&mut self, topic: impl Into<String>, handler: F)
    where
        F: FnMut(&Value) -> Result<(), HandlerError> + Send + 'static,
    {
        self.handlers.insert(topic.into(), Box::new(handler));
    }

    /// Remove the handler for `topic`, if any.
    pub fn off(&mut self, topic: &str) {
        self.handlers.remove(topic);
    }

    /// Poll the transport and dispatch one snapshot's topics.
    ///
    /// Handlers run synchronously on the calling thread, in no particular
    /// order across topics. A failing handler is logged and the remaining
    /// topics still fire; the next snapshot supersedes this one wholesale
    /// anyway.
    pub fn read(&mut self) -> ReadResult {
        match self.bus.poll() {
            PollResult::NothingNew => ReadResult::NothingNew,
            PollResult::Detached => ReadResult::Detached,
            PollResult::Corrupt { seq } => ReadResult::Corrupt { seq },
            PollResult::Frame { payload, seq } => self.dispatch(&payload, seq),
        }
    }

    fn dispatch(&mut self, payload: &[u8], seq: u64) -> ReadResult {
        // A zero-length frame counts as the empty snapshot.
        let topics: Map<String, Value> = if payload.is_empty() {
            Map::new()
        } else {
            match serde_json::from_slice(payload) {
                Ok(map) => map,
                Err(err) => {
                    // Leave the frame unconsumed (see ReadResult docs).
                    self.bus.unread_last();
                    warn!(seq, error = %err, "frame is not a topic snapshot");
                    return ReadResult::DecodeError { seq };
                }
            }
        };

        let mut invoked = 0;
        for (topic, value) in &topics {
            let Some(handler) = self.handlers.get_mut(topic) else {
                continue;
            };
            invoked += 1;
            if let Err(err) = handler(value) {
                warn!(topic = %topic, error = %err, "topic handler failed");
            }
        }
        ReadResult::Dispatched {
            topics: invoked,
            seq,
        }
    }

    /// Re-open the region after [`ReadResult::Detached`].
    pub fn reattach(&mut self) -> basalt_bus::Result<()> {
        self.bus.reattach()
    }

    /// The underlying transport reader.
    pub fn bus_mut(&mut self) -> &mut BusReader {
        &mut self.bus
    }
}
