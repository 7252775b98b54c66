//! Live, atomically accessed view of the filter file
//!
//! The file is shared between one writer and one real-time reader, usually in
//! different processes. Every field is accessed as an `AtomicU32` so neither
//! side ever performs a plain racy access. Ordering contract:
//!
//! - writer: payload stores (relaxed), then revision store (release)
//! - reader: revision load (acquire), payload loads, fence, revision re-load

use std::sync::atomic::{AtomicU32, Ordering};

use crate::layout::{
    FilterFileImage, FILTER_FILE_WORDS, PARAMS_WORD, RATE_WORD, REVISION_WORD,
    STAGE_COUNT_WORD, VERSION_WORD, WORDS_PER_STAGE,
};
use tweaker_core::{ConfigSnapshot, FilterParameter, MAX_STAGES};

/// The filter file as 52 atomic words
#[repr(C)]
pub struct RawFilterFile {
    words: [AtomicU32; FILTER_FILE_WORDS],
}

impl RawFilterFile {
    /// Create an in-memory file holding `image`
    pub fn new(image: &FilterFileImage) -> Self {
        let words = image.to_words();
        Self {
            words: std::array::from_fn(|i| AtomicU32::new(words[i])),
        }
    }

    /// View mapped memory as a filter file
    ///
    /// # Safety
    /// `ptr` must be 4-byte aligned and point to at least
    /// [`FILTER_FILE_SIZE`](crate::FILTER_FILE_SIZE) bytes that stay mapped
    /// for `'a` and are only ever accessed atomically (by any process).
    #[allow(unsafe_code)]
    pub(crate) unsafe fn from_ptr<'a>(ptr: *const u8) -> &'a Self {
        debug_assert_eq!(ptr.align_offset(std::mem::align_of::<Self>()), 0);
        // SAFETY: AtomicU32 has the same layout as u32 and every bit pattern
        // is valid; size, alignment and lifetime are guaranteed by the caller.
        unsafe { &*ptr.cast::<Self>() }
    }

    /// Format version field
    #[inline]
    pub fn format_version(&self) -> u32 {
        self.words[VERSION_WORD].load(Ordering::Acquire)
    }

    /// Revision counter
    #[inline]
    pub fn revision(&self) -> u32 {
        self.words[REVISION_WORD].load(Ordering::Acquire)
    }

    /// Copy the payload (may be torn while a writer is active)
    #[inline]
    pub fn read_snapshot(&self) -> ConfigSnapshot {
        let sampling_rate = self.words[RATE_WORD].load(Ordering::Relaxed);
        let stage_count = self.words[STAGE_COUNT_WORD].load(Ordering::Relaxed);

        let mut params = [FilterParameter::identity(); MAX_STAGES];
        let active = (stage_count as usize).min(MAX_STAGES);
        for (index, param) in params.iter_mut().enumerate().take(active) {
            *param = self.load_stage(index);
        }

        ConfigSnapshot::new(sampling_rate, stage_count, params)
    }

    /// Publish a new configuration: payload first, revision last
    ///
    /// Returns the new revision. Only one writer may publish at a time.
    pub fn publish(&self, snapshot: &ConfigSnapshot) -> u32 {
        self.words[RATE_WORD].store(snapshot.sampling_rate(), Ordering::Relaxed);
        self.words[STAGE_COUNT_WORD].store(snapshot.stage_count() as u32, Ordering::Relaxed);
        for (index, param) in snapshot.params().iter().enumerate() {
            self.store_stage(index, *param);
        }

        self.words[REVISION_WORD]
            .fetch_add(1, Ordering::Release)
            .wrapping_add(1)
    }

    /// Overwrite the format version field
    pub fn set_format_version(&self, version: u32) {
        self.words[VERSION_WORD].store(version, Ordering::Release);
    }

    /// Overwrite every field from an image, revision last
    pub fn store_image(&self, image: &FilterFileImage) {
        let words = image.to_words();
        for (index, word) in words.iter().enumerate() {
            if index != REVISION_WORD {
                self.words[index].store(*word, Ordering::Relaxed);
            }
        }
        self.words[REVISION_WORD].store(image.revision, Ordering::Release);
    }

    /// Plain copy of the whole file (not torn-read protected)
    pub fn to_image(&self) -> FilterFileImage {
        FilterFileImage::from_words(std::array::from_fn(|i| {
            self.words[i].load(Ordering::Acquire)
        }))
    }

    #[inline]
    fn load_stage(&self, index: usize) -> FilterParameter {
        let base = PARAMS_WORD + index * WORDS_PER_STAGE;
        FilterParameter::new(
            f32::from_bits(self.words[base].load(Ordering::Relaxed)),
            f32::from_bits(self.words[base + 1].load(Ordering::Relaxed)),
            f32::from_bits(self.words[base + 2].load(Ordering::Relaxed)),
        )
    }

    fn store_stage(&self, index: usize, param: FilterParameter) {
        let base = PARAMS_WORD + index * WORDS_PER_STAGE;
        self.words[base].store(param.a1.to_bits(), Ordering::Relaxed);
        self.words[base + 1].store(param.a2.to_bits(), Ordering::Relaxed);
        self.words[base + 2].store(param.gain.to_bits(), Ordering::Relaxed);
    }
}

impl std::fmt::Debug for RawFilterFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let image = self.to_image();
        f.debug_struct("RawFilterFile")
            .field("format_version", &image.format_version)
            .field("revision", &image.revision)
            .field("sampling_rate", &image.sampling_rate)
            .field("stage_count", &image.stage_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_what_was_published() {
        let raw = RawFilterFile::new(&FilterFileImage::new(44_100, &[]));
        let stages = [
            FilterParameter::new(-1.9, 0.95, 0.3),
            FilterParameter::new(-1.2, 0.5, -0.4),
        ];

        let revision = raw.publish(&ConfigSnapshot::from_stages(48_000, &stages));

        assert_eq!(revision, 1);
        assert_eq!(raw.revision(), 1);
        let snapshot = raw.read_snapshot();
        assert_eq!(snapshot.sampling_rate(), 48_000);
        assert_eq!(snapshot.active_params(), &stages);
    }

    #[test]
    fn revision_wraps_around() {
        let mut image = FilterFileImage::new(48_000, &[]);
        image.revision = u32::MAX;
        let raw = RawFilterFile::new(&image);

        assert_eq!(raw.publish(&ConfigSnapshot::default()), 0);
        assert_eq!(raw.revision(), 0);
    }

    #[test]
    fn inactive_slots_are_not_read() {
        let mut image = FilterFileImage::new(48_000, &[FilterParameter::new(1.0, 1.0, 1.0)]);
        image.params[5].gain = 9.0;
        let raw = RawFilterFile::new(&image);

        let snapshot = raw.read_snapshot();
        assert_eq!(snapshot.stage_count(), 1);
        assert_eq!(snapshot.params()[5], FilterParameter::identity());
    }

    #[test]
    fn garbage_stage_count_is_clamped() {
        let mut image = FilterFileImage::new(48_000, &[]);
        image.stage_count = u32::MAX;
        let raw = RawFilterFile::new(&image);
        assert_eq!(raw.read_snapshot().stage_count(), MAX_STAGES);
    }

    #[test]
    fn store_image_replaces_everything() {
        let raw = RawFilterFile::new(&FilterFileImage::default());
        let mut image = FilterFileImage::new(32_000, &[FilterParameter::new(0.1, 0.2, 0.3)]);
        image.revision = 42;

        raw.store_image(&image);

        assert_eq!(raw.to_image(), image);
        assert_eq!(raw.format_version(), 1);
    }
}
