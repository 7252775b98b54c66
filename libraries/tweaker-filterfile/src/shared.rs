//! In-process filter file
//!
//! Same protocol as a mapped file, without the file. Handy for embedding the
//! engine in a process that also owns the configuration, and for tests that
//! drive a writer thread against a live engine.

use std::sync::Arc;

use crate::layout::FilterFileImage;
use crate::raw::RawFilterFile;
use tweaker_core::{ConfigSnapshot, ConfigSource};

/// Cloneable handle to a filter file living in memory
#[derive(Debug, Clone)]
pub struct SharedFilterFile {
    inner: Arc<RawFilterFile>,
}

impl SharedFilterFile {
    /// Empty version-1 file at revision 0
    pub fn new(sampling_rate: u32) -> Self {
        Self::from_image(&FilterFileImage::new(sampling_rate, &[]))
    }

    /// File initialised from an image
    pub fn from_image(image: &FilterFileImage) -> Self {
        Self {
            inner: Arc::new(RawFilterFile::new(image)),
        }
    }

    /// Publish a configuration (payload first, revision last)
    pub fn publish(&self, snapshot: &ConfigSnapshot) -> u32 {
        self.inner.publish(snapshot)
    }

    /// Overwrite the format version field
    pub fn set_format_version(&self, version: u32) {
        self.inner.set_format_version(version);
    }

    /// Atomic view of the file
    pub fn raw(&self) -> &RawFilterFile {
        &self.inner
    }
}

impl ConfigSource for SharedFilterFile {
    #[inline]
    fn format_version(&self) -> u32 {
        self.inner.format_version()
    }

    #[inline]
    fn revision(&self) -> u32 {
        self.inner.revision()
    }

    #[inline]
    fn read_snapshot(&self) -> ConfigSnapshot {
        self.inner.read_snapshot()
    }
}
