/// Per-channel cascade of correction stages
///
/// All stage slots are pre-allocated; only the first `stage_count` run.
use super::stage::FilterStage;
use tweaker_core::{ConfigSnapshot, FilterParameter, MAX_STAGES};

/// Ordered cascade of up to [`MAX_STAGES`] stages for one audio channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelFilterChain {
    stage_count: usize,
    stages: [FilterStage; MAX_STAGES],
}

impl ChannelFilterChain {
    /// Create an empty chain (no active stages, zeroed state)
    pub fn new() -> Self {
        Self {
            stage_count: 0,
            stages: [FilterStage::default(); MAX_STAGES],
        }
    }

    /// Adopt the coefficients of a snapshot
    ///
    /// State registers are left untouched, including those of stages that
    /// become inactive and later come back.
    pub fn apply_params(&mut self, snapshot: &ConfigSnapshot) {
        self.stage_count = snapshot.stage_count();
        for (stage, param) in self.stages.iter_mut().zip(snapshot.active_params()) {
            stage.set_param(*param);
        }
    }

    /// Run one sample through every active stage in order
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        self.stages[..self.stage_count]
            .iter_mut()
            .fold(input, |sample, stage| stage.apply(sample))
    }

    /// Number of active stages
    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    /// Active stages, in cascade order
    pub fn stages(&self) -> &[FilterStage] {
        &self.stages[..self.stage_count]
    }

    /// Coefficients of the active stages
    pub fn params(&self) -> impl Iterator<Item = FilterParameter> + '_ {
        self.stages().iter().map(FilterStage::param)
    }

    /// Zero the state of every slot
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

impl Default for ChannelFilterChain {
    fn default() -> Self {
        Self::new()
    }
}
