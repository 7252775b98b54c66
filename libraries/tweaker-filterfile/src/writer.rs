//! Writer side of the filter file
//!
//! Publishing follows the ordering readers rely on: payload words first, the
//! revision increment last. Only one writer may publish at a time; nothing in
//! the file format arbitrates between concurrent writers.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::layout::{FilterFileImage, FILTER_FILE_SIZE};
use crate::raw::RawFilterFile;
use tweaker_core::{ConfigSnapshot, Result, TweakerError};

/// A filter file mapped read-write for publishing
pub struct FilterFileWriter {
    path: PathBuf,
    map: MmapMut,
}

impl FilterFileWriter {
    /// Create (or reset) a filter file with no active stages
    ///
    /// A new file starts at revision 0. An existing file is never truncated
    /// since readers may have it mapped; its revision keeps counting so they
    /// pick up the reset.
    pub fn create(path: impl AsRef<Path>, sampling_rate: u32) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        let existing = len >= FILTER_FILE_SIZE as u64;
        if !existing {
            file.set_len(FILTER_FILE_SIZE as u64)?;
        }

        let writer = Self::map(path, &file)?;
        let mut image = FilterFileImage::new(sampling_rate, &[]);
        if existing {
            image.revision = writer.raw().revision().wrapping_add(1);
        }
        writer.raw().store_image(&image);
        writer.flush()?;

        tracing::info!(
            path = %path.display(),
            sampling_rate,
            revision = image.revision,
            "Initialised filter file"
        );
        Ok(writer)
    }

    /// Open an existing filter file for publishing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| TweakerError::config_unavailable(path, e))?;

        let len = file.metadata()?.len();
        if len < FILTER_FILE_SIZE as u64 {
            return Err(TweakerError::config_unavailable(
                path,
                format!("file is {} bytes, expected at least {}", len, FILTER_FILE_SIZE),
            ));
        }

        Self::map(path, &file)
    }

    #[allow(unsafe_code)]
    fn map(path: &Path, file: &File) -> Result<Self> {
        // SAFETY: the file is at least FILTER_FILE_SIZE bytes and the mapping
        // is only ever accessed through RawFilterFile's atomics.
        let map = unsafe { MmapOptions::new().len(FILTER_FILE_SIZE).map_mut(file) }
            .map_err(|e| TweakerError::config_unavailable(path, format!("mmap failed: {}", e)))?;

        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Atomic view of the mapped file
    #[allow(unsafe_code)]
    pub fn raw(&self) -> &RawFilterFile {
        // SAFETY: page-aligned mapping of FILTER_FILE_SIZE bytes, borrowed
        // from `self.map` for the lifetime of the view.
        unsafe { RawFilterFile::from_ptr(self.map.as_ptr()) }
    }

    /// Publish a configuration and return the new revision
    pub fn publish(&self, snapshot: &ConfigSnapshot) -> u32 {
        let revision = self.raw().publish(snapshot);
        tracing::debug!(
            path = %self.path.display(),
            revision,
            sampling_rate = snapshot.sampling_rate(),
            stage_count = snapshot.stage_count(),
            "Published filter configuration"
        );
        revision
    }

    /// Overwrite the format version field
    pub fn set_format_version(&self, version: u32) {
        self.raw().set_format_version(version);
    }

    /// Current revision counter
    pub fn revision(&self) -> u32 {
        self.raw().revision()
    }

    /// Current payload
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.raw().read_snapshot()
    }

    /// Whole file as a plain image
    pub fn image(&self) -> FilterFileImage {
        self.raw().to_image()
    }

    /// Path of the mapped file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the mapping to disk
    pub fn flush(&self) -> Result<()> {
        self.map.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for FilterFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterFileWriter")
            .field("path", &self.path)
            .field("file", self.raw())
            .finish()
    }
}
