/// Filter file administration: create, publish, inspect
use crate::design_file::DesignFile;
use crate::error::Result;
use std::fmt;
use std::path::Path;
use tweaker_audio::design;
use tweaker_core::{FilterParameter, TweakerError};
use tweaker_filterfile::{FilterFileImage, FilterFileWriter};

/// Frequencies listed in the response table of `inspect`
const RESPONSE_POINTS: [f32; 10] = [
    31.5, 63.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Create or reset a filter file, returning its revision
pub fn init(path: &Path, sampling_rate: u32) -> Result<u32> {
    if sampling_rate == 0 {
        return Err(TweakerError::invalid_configuration("sampling rate must be positive").into());
    }
    let writer = FilterFileWriter::create(path, sampling_rate)?;
    Ok(writer.revision())
}

/// Publish a design file into an existing filter file, returning the new revision
pub fn publish(path: &Path, design_path: &Path) -> Result<u32> {
    let design = DesignFile::load(design_path)?;
    let writer = FilterFileWriter::open(path)?;

    let revision = writer.publish(&design.to_snapshot());
    writer.flush()?;

    tracing::info!(
        path = %path.display(),
        design = %design_path.display(),
        revision,
        stages = design.stages.len(),
        "Published design"
    );
    Ok(revision)
}

/// Read a filter file for display
pub fn inspect(path: &Path) -> Result<Inspection> {
    let bytes = std::fs::read(path)
        .map_err(|e| TweakerError::config_unavailable(path, e))?;
    let image = FilterFileImage::from_bytes(&bytes)?;
    Ok(Inspection { image })
}

/// Decoded contents of a filter file
#[derive(Debug, Clone)]
pub struct Inspection {
    pub image: FilterFileImage,
}

impl Inspection {
    /// Whether the engine would adopt this file
    pub fn is_supported(&self) -> bool {
        self.image.is_supported()
    }

    /// Active stages (clamped to the engine's capacity)
    pub fn stages(&self) -> Vec<FilterParameter> {
        self.image.snapshot().active_params().to_vec()
    }
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let image = &self.image;
        write!(f, "format version: {}", image.format_version)?;
        if !self.is_supported() {
            write!(f, " (unsupported, engines will not adopt this file)")?;
        }
        writeln!(f)?;
        writeln!(f, "revision:       {}", image.revision)?;
        writeln!(f, "sampling rate:  {} Hz", image.sampling_rate)?;
        writeln!(f, "stages:         {}", image.stage_count)?;

        let stages = self.stages();
        for (index, stage) in stages.iter().enumerate() {
            writeln!(
                f,
                "  [{:2}] a1 = {:>12.8}  a2 = {:>12.8}  gain = {:>12.8}",
                index, stage.a1, stage.a2, stage.gain
            )?;
        }

        if !stages.is_empty() && image.sampling_rate > 0 {
            writeln!(f, "response:")?;
            let nyquist = image.sampling_rate as f32 / 2.0;
            for frequency in RESPONSE_POINTS.iter().filter(|point| **point < nyquist) {
                let db = design::magnitude_db_at(&stages, image.sampling_rate, *frequency);
                writeln!(f, "  {:>7.1} Hz  {:>+7.2} dB", frequency, db)?;
            }
        }
        Ok(())
    }
}
