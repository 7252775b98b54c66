/// Filter design files
///
/// A design file describes one configuration to publish:
///
/// ```toml
/// sampling_rate = 48000
///
/// [[stages]]            # designed band
/// frequency = 80.0
/// q = 1.2
/// gain_db = -4.5
///
/// [[stages]]            # raw coefficients
/// a1 = -1.97
/// a2 = 0.975
/// gain = 0.12
/// ```
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tweaker_audio::design;
use tweaker_core::{ConfigSnapshot, FilterParameter, MAX_STAGES};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DesignFile {
    /// Rate the stages are designed for
    pub sampling_rate: u32,

    #[serde(default)]
    pub stages: Vec<StageSpec>,
}

/// One stage, either designed or given as coefficients
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StageSpec {
    Peaking(PeakingBand),
    Raw(RawStage),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PeakingBand {
    pub frequency: f32,

    #[serde(default = "default_q")]
    pub q: f32,

    pub gain_db: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawStage {
    pub a1: f32,
    pub a2: f32,
    pub gain: f32,
}

fn default_q() -> f32 {
    std::f32::consts::FRAC_1_SQRT_2
}

impl StageSpec {
    /// Coefficients of this stage at `sampling_rate`
    pub fn to_param(&self, sampling_rate: u32) -> FilterParameter {
        match *self {
            StageSpec::Peaking(band) => {
                design::peaking(sampling_rate, band.frequency, band.q, band.gain_db)
            }
            StageSpec::Raw(raw) => FilterParameter::new(raw.a1, raw.a2, raw.gain),
        }
    }
}

impl DesignFile {
    /// Read and validate a design file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let design: DesignFile = toml::from_str(&content)?;
        design.validate()?;
        Ok(design)
    }

    /// Validate the design
    pub fn validate(&self) -> Result<()> {
        if self.sampling_rate == 0 {
            return Err(CliError::Design("sampling_rate must be positive".to_string()));
        }
        if self.stages.len() > MAX_STAGES {
            return Err(CliError::Design(format!(
                "{} stages given, at most {} are supported",
                self.stages.len(),
                MAX_STAGES
            )));
        }
        for (index, stage) in self.stages.iter().enumerate() {
            if let StageSpec::Peaking(band) = stage {
                let highest = self.sampling_rate as f32 * design::MAX_FREQUENCY_RATIO;
                if !(band.frequency > 0.0 && band.frequency < highest) {
                    return Err(CliError::Design(format!(
                        "stage {}: frequency {} Hz outside 0..{} Hz",
                        index, band.frequency, highest
                    )));
                }
            }
            if !stage.to_param(self.sampling_rate).is_finite() {
                return Err(CliError::Design(format!(
                    "stage {}: coefficients are not finite",
                    index
                )));
            }
        }
        Ok(())
    }

    /// Coefficients of every stage, in cascade order
    pub fn params(&self) -> Vec<FilterParameter> {
        self.stages
            .iter()
            .map(|stage| stage.to_param(self.sampling_rate))
            .collect()
    }

    /// The configuration to publish
    pub fn to_snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::from_stages(self.sampling_rate, &self.params())
    }
}
