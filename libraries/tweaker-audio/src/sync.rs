/// Lock-free adoption of filter configuration from the shared filter file
///
/// Single writer, single reader, no locks. The writer updates the payload and
/// publishes it by bumping the revision last. The reader copies the payload
/// into a stack snapshot between two revision reads and only hands it to the
/// channels when both reads agree, so a torn copy is never adopted.
use std::sync::atomic::{fence, Ordering};

use crate::filter::ChannelFilterChain;
use tweaker_core::{ConfigSource, SUPPORTED_FORMAT_VERSION};

/// Upper bound on copy attempts per call
///
/// Keeps the audio thread's worst case bounded when the writer republishes
/// faster than a snapshot can be copied. The next buffer tries again.
pub const MAX_SYNC_ATTEMPTS: u32 = 8;

/// Result of one synchronization call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The revision matches the adopted one; nothing was touched
    Unchanged,
    /// A consistent snapshot was published into every channel
    Adopted { revision: u32, attempts: u32 },
    /// The filter file has an unknown format version; nothing was adopted
    UnsupportedVersion(u32),
    /// Every attempt observed a concurrent write; the previous configuration stays
    Conflict { attempts: u32 },
}

/// Tracks the adopted revision and republishes changed configuration
pub struct ConfigSynchronizer<S> {
    source: S,
    adopted_revision: Option<u32>,
    adopted_sampling_rate: u32,
    max_attempts: u32,
}

impl<S: ConfigSource> ConfigSynchronizer<S> {
    /// Create a synchronizer that has not adopted anything yet
    pub fn new(source: S) -> Self {
        Self {
            source,
            adopted_revision: None,
            adopted_sampling_rate: 0,
            max_attempts: MAX_SYNC_ATTEMPTS,
        }
    }

    /// Override the retry bound (clamped to at least one attempt)
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Bring `channels` up to date with the filter file
    ///
    /// Real-time safe: no allocation, no locks, at most `max_attempts`
    /// payload copies. Filter state inside the channels is never modified.
    pub fn sync(&mut self, channels: &mut [ChannelFilterChain]) -> SyncOutcome {
        for attempt in 1..=self.max_attempts {
            let version = self.source.format_version();
            if version != SUPPORTED_FORMAT_VERSION {
                return SyncOutcome::UnsupportedVersion(version);
            }

            let observed = self.source.revision();
            if self.adopted_revision == Some(observed) {
                return SyncOutcome::Unchanged;
            }

            let snapshot = self.source.read_snapshot();
            // Payload loads must complete before the revision is re-read
            fence(Ordering::Acquire);
            if self.source.revision() != observed {
                continue;
            }

            for channel in channels.iter_mut() {
                channel.apply_params(&snapshot);
            }
            self.adopted_revision = Some(observed);
            self.adopted_sampling_rate = snapshot.sampling_rate();

            return SyncOutcome::Adopted {
                revision: observed,
                attempts: attempt,
            };
        }

        SyncOutcome::Conflict {
            attempts: self.max_attempts,
        }
    }

    /// Last adopted revision (`None` until the first adoption)
    pub fn adopted_revision(&self) -> Option<u32> {
        self.adopted_revision
    }

    /// Sampling rate of the adopted configuration (0 until the first adoption)
    pub fn adopted_sampling_rate(&self) -> u32 {
        self.adopted_sampling_rate
    }

    /// Configured retry bound
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The filter file this synchronizer reads
    pub fn source(&self) -> &S {
        &self.source
    }
}
