//! Read-only memory mapping of a filter file
//!
//! This is what the audio side uses: the file is mapped once at engine setup
//! and every later access is a handful of atomic loads.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};

use crate::layout::FILTER_FILE_SIZE;
use crate::raw::RawFilterFile;
use tweaker_core::{ConfigSnapshot, ConfigSource, Result, TweakerError};

/// A filter file mapped read-only into this process
///
/// The mapping is released when the value is dropped.
pub struct MappedFilterFile {
    path: PathBuf,
    map: Mmap,
}

impl MappedFilterFile {
    /// Map the first 208 bytes of `path`
    ///
    /// Fails with [`TweakerError::ConfigUnavailable`] when the file is
    /// missing, too short, or cannot be mapped.
    #[allow(unsafe_code)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            tracing::error!(path = %path.display(), "Filter file not found: {}", e);
            TweakerError::config_unavailable(path, e)
        })?;

        let len = file
            .metadata()
            .map_err(|e| TweakerError::config_unavailable(path, e))?
            .len();
        if len < FILTER_FILE_SIZE as u64 {
            return Err(TweakerError::config_unavailable(
                path,
                format!("file is {} bytes, expected at least {}", len, FILTER_FILE_SIZE),
            ));
        }

        // SAFETY: the mapping is read-only and only accessed through
        // RawFilterFile's atomics. A writer truncating the file while mapped
        // is outside the filter file contract.
        let map = unsafe { MmapOptions::new().len(FILTER_FILE_SIZE).map(&file) }
            .map_err(|e| TweakerError::config_unavailable(path, format!("mmap failed: {}", e)))?;

        tracing::debug!(path = %path.display(), "Mapped filter file");

        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Path the mapping was created from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic view of the mapped file
    #[allow(unsafe_code)]
    pub fn raw(&self) -> &RawFilterFile {
        // SAFETY: mappings are page aligned, `open` guarantees at least
        // FILTER_FILE_SIZE mapped bytes, and the view borrows `self.map`.
        unsafe { RawFilterFile::from_ptr(self.map.as_ptr()) }
    }
}

impl ConfigSource for MappedFilterFile {
    #[inline]
    fn format_version(&self) -> u32 {
        self.raw().format_version()
    }

    #[inline]
    fn revision(&self) -> u32 {
        self.raw().revision()
    }

    #[inline]
    fn read_snapshot(&self) -> ConfigSnapshot {
        self.raw().read_snapshot()
    }
}

impl std::fmt::Debug for MappedFilterFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFilterFile")
            .field("path", &self.path)
            .field("file", self.raw())
            .finish()
    }
}
