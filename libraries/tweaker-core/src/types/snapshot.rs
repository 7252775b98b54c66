/// Point-in-time copy of the filter configuration
use super::filter::{FilterParameter, MAX_STAGES};

/// A consistent view of the filter file payload
///
/// Snapshots are plain values: the synchronizer copies one out of the shared
/// file, validates it against the revision counter, and only then hands it to
/// the channels. `stage_count` never exceeds [`MAX_STAGES`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigSnapshot {
    sampling_rate: u32,
    stage_count: usize,
    params: [FilterParameter; MAX_STAGES],
}

impl ConfigSnapshot {
    /// Create a snapshot, clamping `stage_count` to [`MAX_STAGES`]
    pub fn new(sampling_rate: u32, stage_count: u32, params: [FilterParameter; MAX_STAGES]) -> Self {
        Self {
            sampling_rate,
            stage_count: (stage_count as usize).min(MAX_STAGES),
            params,
        }
    }

    /// Build a snapshot from a list of active stages (extra entries are ignored)
    pub fn from_stages(sampling_rate: u32, stages: &[FilterParameter]) -> Self {
        let mut params = [FilterParameter::identity(); MAX_STAGES];
        let count = stages.len().min(MAX_STAGES);
        params[..count].copy_from_slice(&stages[..count]);
        Self {
            sampling_rate,
            stage_count: count,
            params,
        }
    }

    /// Sampling rate in Hz the coefficients were designed for
    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    /// Number of active stages (0..=16)
    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    /// All stage slots, including inactive ones
    pub fn params(&self) -> &[FilterParameter; MAX_STAGES] {
        &self.params
    }

    /// The active stages, in cascade order
    pub fn active_params(&self) -> &[FilterParameter] {
        &self.params[..self.stage_count]
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self::from_stages(0, &[])
    }
}
