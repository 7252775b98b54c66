//! Filter file layout
//!
//! File structure (native byte order, 4-byte aligned fields):
//! ```text
//! +--------+------------------+----------------------------------------+
//! | offset | field            | meaning                                |
//! +--------+------------------+----------------------------------------+
//! |   0    | format_version   | must be 1                              |
//! |   4    | revision         | bumped last by the writer              |
//! |   8    | sampling_rate    | Hz the coefficients were designed for  |
//! |  12    | stage_count      | active stages, 0..=16                  |
//! |  16    | params[16]       | (a1, a2, gain) as f32, 12 bytes each   |
//! +--------+------------------+----------------------------------------+
//! ```

use bytemuck::{Pod, Zeroable};
use tweaker_core::{ConfigSnapshot, FilterParameter, Result, TweakerError, MAX_STAGES};

/// Total size of the filter file in bytes
pub const FILTER_FILE_SIZE: usize = 16 + MAX_STAGES * 12;

/// Number of 32-bit words in the filter file
pub const FILTER_FILE_WORDS: usize = FILTER_FILE_SIZE / 4;

pub(crate) const VERSION_WORD: usize = 0;
pub(crate) const REVISION_WORD: usize = 1;
pub(crate) const RATE_WORD: usize = 2;
pub(crate) const STAGE_COUNT_WORD: usize = 3;
pub(crate) const PARAMS_WORD: usize = 4;
pub(crate) const WORDS_PER_STAGE: usize = 3;

/// On-disk coefficients of one stage
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct StageImage {
    pub a1: f32,
    pub a2: f32,
    pub gain: f32,
}

impl From<FilterParameter> for StageImage {
    fn from(param: FilterParameter) -> Self {
        Self {
            a1: param.a1,
            a2: param.a2,
            gain: param.gain,
        }
    }
}

impl From<StageImage> for FilterParameter {
    fn from(stage: StageImage) -> Self {
        FilterParameter::new(stage.a1, stage.a2, stage.gain)
    }
}

/// Plain (non-atomic) image of the whole filter file
///
/// Used to create files and to inspect them offline. Live readers and
/// writers go through [`RawFilterFile`](crate::RawFilterFile) instead.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct FilterFileImage {
    pub format_version: u32,
    pub revision: u32,
    pub sampling_rate: u32,
    pub stage_count: u32,
    pub params: [StageImage; MAX_STAGES],
}

impl FilterFileImage {
    /// Version-1 image at revision 0 holding `stages` (truncated to 16)
    pub fn new(sampling_rate: u32, stages: &[FilterParameter]) -> Self {
        let mut image = Self {
            format_version: tweaker_core::SUPPORTED_FORMAT_VERSION,
            sampling_rate,
            ..Self::default()
        };
        image.set_stages(stages);
        image
    }

    /// Replace the stage list (truncated to 16, unused slots zeroed)
    pub fn set_stages(&mut self, stages: &[FilterParameter]) {
        let count = stages.len().min(MAX_STAGES);
        self.params = [StageImage::default(); MAX_STAGES];
        for (slot, stage) in self.params.iter_mut().zip(&stages[..count]) {
            *slot = (*stage).into();
        }
        self.stage_count = count as u32;
    }

    /// Parse the first [`FILTER_FILE_SIZE`] bytes of a file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FILTER_FILE_SIZE {
            return Err(TweakerError::invalid_blob(format!(
                "{} bytes, expected at least {}",
                bytes.len(),
                FILTER_FILE_SIZE
            )));
        }
        Ok(bytemuck::pod_read_unaligned(&bytes[..FILTER_FILE_SIZE]))
    }

    /// Raw bytes in native byte order
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// The file as 32-bit words
    pub fn to_words(&self) -> [u32; FILTER_FILE_WORDS] {
        bytemuck::cast(*self)
    }

    /// Rebuild an image from 32-bit words
    pub fn from_words(words: [u32; FILTER_FILE_WORDS]) -> Self {
        bytemuck::cast(words)
    }

    /// Whether a reader would adopt this image
    pub fn is_supported(&self) -> bool {
        self.format_version == tweaker_core::SUPPORTED_FORMAT_VERSION
    }

    /// Payload as a snapshot (stage count clamped)
    pub fn snapshot(&self) -> ConfigSnapshot {
        let params = self.params.map(FilterParameter::from);
        ConfigSnapshot::new(self.sampling_rate, self.stage_count, params)
    }
}
