/// Core traits for Speaker Tweaker
use crate::types::ConfigSnapshot;

/// Read-only view of the shared filter file
///
/// Implementers expose the externally owned configuration to the
/// synchronizer. A single writer updates the payload and then bumps the
/// revision; the reader detects torn copies by comparing the revision before
/// and after [`read_snapshot`](Self::read_snapshot).
///
/// # Real-Time Constraints
/// Every method is called on the audio thread:
/// - No allocations
/// - No locks
/// - No system calls
pub trait ConfigSource: Send {
    /// Format version field (only version 1 is adopted)
    fn format_version(&self) -> u32;

    /// Revision counter, read with acquire ordering
    fn revision(&self) -> u32;

    /// Copy the payload (sampling rate, stage count, coefficients)
    ///
    /// The copy may be torn if the writer is active; callers validate it
    /// against [`revision`](Self::revision).
    fn read_snapshot(&self) -> ConfigSnapshot;
}

impl<T: ConfigSource + ?Sized> ConfigSource for Box<T> {
    fn format_version(&self) -> u32 {
        (**self).format_version()
    }

    fn revision(&self) -> u32 {
        (**self).revision()
    }

    fn read_snapshot(&self) -> ConfigSnapshot {
        (**self).read_snapshot()
    }
}

/// Audio effect trait
///
/// Implemented by processors that can be driven in place by a host.
pub trait AudioEffect: Send {
    /// Process interleaved audio samples in-place
    ///
    /// # Parameters
    /// - `buffer`: Audio samples to process (modified in-place)
    /// - `sample_rate`: Operating rate of the stream in Hz
    ///
    /// # Safety
    /// This method is called in the audio thread and must be real-time safe:
    /// - No allocations
    /// - No locks
    /// - No blocking I/O
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32);

    /// Reset the effect state
    fn reset(&mut self);

    /// Enable/disable the effect
    fn set_enabled(&mut self, enabled: bool);

    /// Check if effect is enabled
    fn is_enabled(&self) -> bool;

    /// Get effect name (for debugging)
    fn name(&self) -> &str;
}
