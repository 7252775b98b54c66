/// Engine diagnostics
///
/// The audio thread never logs. Conditions are pushed into a wait-free ring
/// buffer and drained by the host on a non-real-time thread.
use tweaker_core::TweakerError;

/// Default capacity of the diagnostics queue
///
/// Events are only produced on state transitions, so a handful of slots
/// covers many seconds of worst-case configuration churn.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// A condition observed by the engine while processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A new filter configuration was adopted
    ConfigAdopted {
        revision: u32,
        sampling_rate: u32,
        stage_count: usize,
    },
    /// The filter file has a format version other than 1
    UnsupportedVersion { found: u32 },
    /// The adopted sampling rate differs from the stream rate; filtering is bypassed
    RateMismatch { adopted: u32, stream: u32 },
    /// Rates agree again; filtering resumed
    RateRestored { rate: u32 },
    /// The writer kept republishing while a snapshot was copied
    SyncConflict { attempts: u32 },
}

impl EngineEvent {
    /// The error this event corresponds to, if it reports a failure condition
    pub fn as_error(&self) -> Option<TweakerError> {
        match *self {
            Self::UnsupportedVersion { found } => Some(TweakerError::UnsupportedVersion(found)),
            Self::RateMismatch { adopted, stream } => {
                Some(TweakerError::RateMismatch { adopted, stream })
            }
            _ => None,
        }
    }
}

/// Producer side, owned by the engine on the audio thread
#[derive(Default)]
pub(crate) struct EventSender {
    producer: Option<rtrb::Producer<EngineEvent>>,
    dropped: u64,
}

impl EventSender {
    /// Create a connected sender/receiver pair
    pub(crate) fn channel(capacity: usize) -> (Self, EngineEvents) {
        let (producer, consumer) = rtrb::RingBuffer::new(capacity.max(1));
        (
            Self {
                producer: Some(producer),
                dropped: 0,
            },
            EngineEvents { consumer },
        )
    }

    /// Queue an event (non-blocking; dropped when full or unsubscribed)
    #[inline]
    pub(crate) fn emit(&mut self, event: EngineEvent) {
        if let Some(producer) = self.producer.as_mut() {
            if producer.push(event).is_err() {
                self.dropped += 1;
            }
        }
    }

    /// Number of events lost to a full queue
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Consumer side, owned by the host
pub struct EngineEvents {
    consumer: rtrb::Consumer<EngineEvent>,
}

impl EngineEvents {
    /// Take the oldest pending event
    pub fn pop(&mut self) -> Option<EngineEvent> {
        self.consumer.pop().ok()
    }

    /// Number of events waiting
    pub fn pending(&self) -> usize {
        self.consumer.slots()
    }

    /// Iterate over all currently pending events
    pub fn drain(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    /// Log every pending event through `tracing`, returning how many were logged
    pub fn log_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(event) = self.pop() {
            log_event(&event);
            count += 1;
        }
        count
    }
}

fn log_event(event: &EngineEvent) {
    match *event {
        EngineEvent::ConfigAdopted {
            revision,
            sampling_rate,
            stage_count,
        } => tracing::info!(
            revision,
            sampling_rate,
            stage_count,
            "Adopted filter configuration"
        ),
        EngineEvent::UnsupportedVersion { .. } | EngineEvent::RateMismatch { .. } => {
            if let Some(err) = event.as_error() {
                tracing::error!("{}; filtering bypassed", err);
            }
        }
        EngineEvent::RateRestored { rate } => {
            tracing::info!(rate, "Sample rates agree again, filtering resumed");
        }
        EngineEvent::SyncConflict { attempts } => tracing::warn!(
            attempts,
            "Filter file changed during every read attempt; keeping previous configuration"
        ),
    }
}
