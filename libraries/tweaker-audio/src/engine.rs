/// Multi-channel correction engine
///
/// Owns one [`ChannelFilterChain`] per channel and the synchronizer that keeps
/// them in step with the filter file. Every processing call runs in two
/// explicit phases: an identity copy, then an optional in-place refinement
/// that only happens while the adopted sampling rate matches the stream.
use crate::events::{EngineEvent, EngineEvents, EventSender};
use crate::filter::ChannelFilterChain;
use crate::sync::{ConfigSynchronizer, SyncOutcome};
use tweaker_core::{AudioEffect, ConfigSource, Result, TweakerError};

/// Filtering behaviour of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// No configuration has been adopted yet; audio passes through
    AwaitingConfig,
    /// Configuration adopted and the sampling rates agree; filtering runs
    Active,
    /// Adopted sampling rate differs from the stream; audio passes through
    Bypass,
}

/// Which one-shot conditions have already been reported
#[derive(Debug, Default, Clone, Copy)]
struct Reported {
    unsupported_version: bool,
    conflict: bool,
}

/// Per-channel cascade filter with hot-reloadable coefficients
pub struct CorrectionEngine<S: ConfigSource> {
    channels: Vec<ChannelFilterChain>,
    sync: ConfigSynchronizer<S>,
    mode: EngineMode,
    enabled: bool,
    events: EventSender,
    reported: Reported,
    rejected_buffers: u64,
}

impl<S: ConfigSource> CorrectionEngine<S> {
    /// Create an engine for `num_channels` interleaved channels
    ///
    /// The channel count is fixed for the engine's lifetime. Nothing is read
    /// from `source` until the first processing call.
    pub fn new(num_channels: usize, source: S) -> Result<Self> {
        Self::with_synchronizer(num_channels, ConfigSynchronizer::new(source))
    }

    /// Create an engine around a pre-configured synchronizer
    pub fn with_synchronizer(num_channels: usize, sync: ConfigSynchronizer<S>) -> Result<Self> {
        if num_channels < 1 {
            return Err(TweakerError::invalid_configuration("channels < 1"));
        }

        tracing::debug!(num_channels, "Creating correction engine");

        Ok(Self {
            channels: vec![ChannelFilterChain::new(); num_channels],
            sync,
            mode: EngineMode::AwaitingConfig,
            enabled: true,
            events: EventSender::default(),
            reported: Reported::default(),
            rejected_buffers: 0,
        })
    }

    /// Start delivering diagnostics into a new queue of `capacity` events
    ///
    /// Call during setup, not from the audio thread (allocates the queue).
    /// A previous subscription is disconnected.
    pub fn subscribe(&mut self, capacity: usize) -> EngineEvents {
        let (sender, events) = EventSender::channel(capacity);
        self.events = sender;
        events
    }

    /// Filter `input` into `output` for a stream running at `stream_rate` Hz
    ///
    /// Both buffers are interleaved and must hold the same whole number of
    /// frames. Returns the number of frames processed.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], stream_rate: u32) -> Result<usize> {
        if output.len() != input.len() {
            return Err(TweakerError::BufferMismatch {
                len: output.len(),
                channels: self.channels.len(),
            });
        }
        let frames = self.frames_in(input.len())?;

        let refine = self.synchronize(stream_rate);
        output.copy_from_slice(input);
        if refine {
            self.refine(output);
        }

        Ok(frames)
    }

    /// Filter an interleaved buffer in place
    pub fn process_in_place(&mut self, buffer: &mut [f32], stream_rate: u32) -> Result<usize> {
        let frames = self.frames_in(buffer.len())?;

        if self.synchronize(stream_rate) {
            self.refine(buffer);
        }

        Ok(frames)
    }

    /// Current filtering mode
    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Number of interleaved channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Filter chain of one channel
    pub fn channel(&self, index: usize) -> Option<&ChannelFilterChain> {
        self.channels.get(index)
    }

    /// All channel chains, in interleave order
    pub fn channels(&self) -> &[ChannelFilterChain] {
        &self.channels
    }

    /// Last adopted filter file revision
    pub fn adopted_revision(&self) -> Option<u32> {
        self.sync.adopted_revision()
    }

    /// Sampling rate the adopted coefficients were designed for
    pub fn adopted_sampling_rate(&self) -> u32 {
        self.sync.adopted_sampling_rate()
    }

    /// The filter file backing this engine
    pub fn source(&self) -> &S {
        self.sync.source()
    }

    /// Diagnostics lost because the queue was full
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    /// Buffers the `AudioEffect` path left untouched because they did not
    /// fit the channel layout
    pub fn rejected_buffers(&self) -> u64 {
        self.rejected_buffers
    }

    fn frames_in(&self, len: usize) -> Result<usize> {
        let channels = self.channels.len();
        if len % channels != 0 {
            return Err(TweakerError::BufferMismatch { len, channels });
        }
        Ok(len / channels)
    }

    /// Run the synchronizer and decide whether this buffer gets filtered
    fn synchronize(&mut self, stream_rate: u32) -> bool {
        let outcome = self.sync.sync(&mut self.channels);

        match outcome {
            SyncOutcome::Unchanged => {}
            SyncOutcome::Adopted { revision, .. } => {
                self.events.emit(EngineEvent::ConfigAdopted {
                    revision,
                    sampling_rate: self.sync.adopted_sampling_rate(),
                    stage_count: self.channels[0].stage_count(),
                });
            }
            SyncOutcome::UnsupportedVersion(found) => {
                if !self.reported.unsupported_version {
                    self.reported.unsupported_version = true;
                    self.events.emit(EngineEvent::UnsupportedVersion { found });
                }
            }
            SyncOutcome::Conflict { attempts } => {
                if !self.reported.conflict {
                    self.reported.conflict = true;
                    self.events.emit(EngineEvent::SyncConflict { attempts });
                }
            }
        }
        // A condition that went away is reported again when it comes back
        if !matches!(outcome, SyncOutcome::UnsupportedVersion(_)) {
            self.reported.unsupported_version = false;
        }
        if !matches!(outcome, SyncOutcome::Conflict { .. }) {
            self.reported.conflict = false;
        }

        self.update_mode(stream_rate);

        self.enabled
            && self.mode == EngineMode::Active
            && !matches!(outcome, SyncOutcome::UnsupportedVersion(_))
    }

    fn update_mode(&mut self, stream_rate: u32) {
        let adopted = self.sync.adopted_sampling_rate();
        let next = match self.sync.adopted_revision() {
            None => EngineMode::AwaitingConfig,
            Some(_) if adopted == stream_rate => EngineMode::Active,
            Some(_) => EngineMode::Bypass,
        };

        if next == self.mode {
            return;
        }

        match next {
            EngineMode::Bypass => self.events.emit(EngineEvent::RateMismatch {
                adopted,
                stream: stream_rate,
            }),
            EngineMode::Active if self.mode == EngineMode::Bypass => {
                self.events.emit(EngineEvent::RateRestored { rate: stream_rate });
            }
            _ => {}
        }
        self.mode = next;
    }

    /// Run every channel's cascade over the buffer, frame by frame
    fn refine(&mut self, buffer: &mut [f32]) {
        let num_channels = self.channels.len();
        for frame in buffer.chunks_exact_mut(num_channels) {
            for (sample, chain) in frame.iter_mut().zip(self.channels.iter_mut()) {
                *sample = chain.process_sample(*sample);
            }
        }
    }
}

impl<S: ConfigSource> AudioEffect for CorrectionEngine<S> {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        // A buffer that doesn't fit the channel layout is left untouched
        if self.process_in_place(buffer, sample_rate).is_err() {
            self.rejected_buffers += 1;
        }
    }

    fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Speaker Tweaker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tweaker_core::{ConfigSnapshot, FilterParameter};

    /// In-memory filter file with interior mutability for single-threaded tests
    struct TestSource {
        version: Cell<u32>,
        revision: Cell<u32>,
        snapshot: Cell<ConfigSnapshot>,
    }

    impl TestSource {
        fn new(revision: u32, snapshot: ConfigSnapshot) -> Self {
            Self {
                version: Cell::new(1),
                revision: Cell::new(revision),
                snapshot: Cell::new(snapshot),
            }
        }

        fn publish(&self, snapshot: ConfigSnapshot) {
            self.snapshot.set(snapshot);
            self.revision.set(self.revision.get() + 1);
        }
    }

    impl ConfigSource for TestSource {
        fn format_version(&self) -> u32 {
            self.version.get()
        }

        fn revision(&self) -> u32 {
            self.revision.get()
        }

        fn read_snapshot(&self) -> ConfigSnapshot {
            self.snapshot.get()
        }
    }

    const RATE: u32 = 48_000;

    fn band() -> FilterParameter {
        FilterParameter::new(-1.9, 0.92, 0.8)
    }

    #[test]
    fn zero_channels_rejected() {
        let result = CorrectionEngine::new(0, TestSource::new(0, ConfigSnapshot::default()));
        assert!(matches!(
            result,
            Err(TweakerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn starts_awaiting_config() {
        let engine =
            CorrectionEngine::new(2, TestSource::new(0, ConfigSnapshot::default())).unwrap();
        assert_eq!(engine.mode(), EngineMode::AwaitingConfig);
        assert_eq!(engine.adopted_revision(), None);
        assert_eq!(engine.num_channels(), 2);
    }

    #[test]
    fn first_process_adopts_and_activates() {
        let source = TestSource::new(1, ConfigSnapshot::from_stages(RATE, &[band()]));
        let mut engine = CorrectionEngine::new(2, source).unwrap();

        let input = [1.0, 1.0, 0.0, 0.0];
        let mut output = [0.0; 4];
        assert_eq!(engine.process(&input, &mut output, RATE).unwrap(), 2);

        assert_eq!(engine.mode(), EngineMode::Active);
        assert_eq!(engine.adopted_revision(), Some(1));
        assert_ne!(output, input);
    }

    #[test]
    fn rate_mismatch_bypasses_then_recovers() {
        let source = TestSource::new(1, ConfigSnapshot::from_stages(44_100, &[band()]));
        let mut engine = CorrectionEngine::new(1, source).unwrap();
        let mut events = engine.subscribe(8);

        let input = [0.5, -0.25, 1.0];
        let mut output = [0.0; 3];
        engine.process(&input, &mut output, RATE).unwrap();
        assert_eq!(engine.mode(), EngineMode::Bypass);
        assert_eq!(output, input);

        engine
            .source()
            .publish(ConfigSnapshot::from_stages(RATE, &[band()]));
        engine.process(&input, &mut output, RATE).unwrap();
        assert_eq!(engine.mode(), EngineMode::Active);
        assert_ne!(output, input);

        let kinds: Vec<_> = events.drain().collect();
        assert!(matches!(kinds[0], EngineEvent::ConfigAdopted { revision: 1, .. }));
        assert_eq!(
            kinds[1],
            EngineEvent::RateMismatch {
                adopted: 44_100,
                stream: RATE
            }
        );
        assert!(matches!(kinds[2], EngineEvent::ConfigAdopted { revision: 2, .. }));
        assert_eq!(kinds[3], EngineEvent::RateRestored { rate: RATE });
    }

    #[test]
    fn unsupported_version_reported_once_and_skips_filtering() {
        let source = TestSource::new(1, ConfigSnapshot::from_stages(RATE, &[band()]));
        let mut engine = CorrectionEngine::new(1, source).unwrap();
        let mut events = engine.subscribe(8);

        let input = [1.0, 0.0, 0.0];
        let mut output = [0.0; 3];
        engine.process(&input, &mut output, RATE).unwrap();
        assert_eq!(engine.mode(), EngineMode::Active);
        events.drain().for_each(drop);

        engine.source().version.set(7);
        for _ in 0..3 {
            engine.process(&input, &mut output, RATE).unwrap();
            assert_eq!(output, input);
        }
        // Mode is untouched; only the calls themselves were bypassed
        assert_eq!(engine.mode(), EngineMode::Active);
        assert_eq!(engine.adopted_revision(), Some(1));

        let reported: Vec<_> = events.drain().collect();
        assert_eq!(reported, vec![EngineEvent::UnsupportedVersion { found: 7 }]);
    }

    #[test]
    fn unsupported_version_reported_again_after_recovery() {
        let source = TestSource::new(1, ConfigSnapshot::from_stages(RATE, &[band()]));
        let mut engine = CorrectionEngine::new(1, source).unwrap();
        let mut events = engine.subscribe(8);
        let mut buffer = [0.0; 2];

        for version in [2, 2, 1, 3] {
            engine.source().version.set(version);
            engine.process_in_place(&mut buffer, RATE).unwrap();
        }

        let reported: Vec<_> = events.drain().collect();
        assert_eq!(
            reported,
            vec![
                EngineEvent::UnsupportedVersion { found: 2 },
                EngineEvent::ConfigAdopted {
                    revision: 1,
                    sampling_rate: RATE,
                    stage_count: 1
                },
                EngineEvent::UnsupportedVersion { found: 3 },
            ]
        );
    }

    #[test]
    fn mismatched_buffers_rejected_before_touching_state() {
        let source = TestSource::new(1, ConfigSnapshot::from_stages(RATE, &[band()]));
        let mut engine = CorrectionEngine::new(2, source).unwrap();

        let mut odd = [0.0; 3];
        assert!(matches!(
            engine.process_in_place(&mut odd, RATE),
            Err(TweakerError::BufferMismatch { len: 3, channels: 2 })
        ));

        let mut short = [0.0; 2];
        assert!(engine.process(&[0.0; 4], &mut short, RATE).is_err());
        assert_eq!(engine.adopted_revision(), None);
    }

    #[test]
    fn effect_path_counts_rejected_buffers() {
        let source = TestSource::new(1, ConfigSnapshot::from_stages(RATE, &[band()]));
        let mut engine = CorrectionEngine::new(2, source).unwrap();

        let mut odd = [0.25, 0.5, 0.75];
        AudioEffect::process(&mut engine, &mut odd, RATE);
        AudioEffect::process(&mut engine, &mut odd, RATE);

        assert_eq!(odd, [0.25, 0.5, 0.75]);
        assert_eq!(engine.rejected_buffers(), 2);
        assert_eq!(engine.adopted_revision(), None);

        let mut frames = [0.0; 4];
        AudioEffect::process(&mut engine, &mut frames, RATE);
        assert_eq!(engine.rejected_buffers(), 2);
        assert_eq!(engine.adopted_revision(), Some(1));
    }

    #[test]
    fn disabled_engine_is_pure_copy_but_keeps_syncing() {
        let source = TestSource::new(5, ConfigSnapshot::from_stages(RATE, &[band()]));
        let mut engine = CorrectionEngine::new(1, source).unwrap();
        engine.set_enabled(false);

        let mut buffer = [1.0, 0.5, -0.5];
        AudioEffect::process(&mut engine, &mut buffer, RATE);

        assert_eq!(buffer, [1.0, 0.5, -0.5]);
        assert_eq!(engine.adopted_revision(), Some(5));
        assert!(!engine.is_enabled());
    }

    #[test]
    fn reset_clears_filter_memory() {
        let source = TestSource::new(1, ConfigSnapshot::from_stages(RATE, &[band()]));
        let mut engine = CorrectionEngine::new(1, source).unwrap();
        let mut buffer = [1.0, 0.0];
        engine.process_in_place(&mut buffer, RATE).unwrap();

        engine.reset();

        let stage = engine.channel(0).unwrap().stages()[0];
        assert_eq!(stage.state(), [0.0, 0.0]);
        assert_eq!(engine.name(), "Speaker Tweaker");
    }
}
