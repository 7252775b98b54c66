//! Speaker Tweaker Filter File
//!
//! The filter file is a fixed 208-byte blob shared between a configuration
//! writer and the real-time engine, usually through a memory mapping:
//!
//! - [`FilterFileImage`]: plain byte-level image for creating and inspecting files
//! - [`RawFilterFile`]: the same layout as atomics, implementing the publish protocol
//! - [`MappedFilterFile`]: read-only mapping, the engine's [`ConfigSource`](tweaker_core::ConfigSource)
//! - [`SharedFilterFile`]: in-process file for embedding and tests
//! - [`FilterFileWriter`]: read-write mapping for publishing
//!
//! # Example
//!
//! ```rust,no_run
//! use tweaker_core::{ConfigSnapshot, ConfigSource, FilterParameter};
//! use tweaker_filterfile::{FilterFileWriter, MappedFilterFile};
//!
//! let writer = FilterFileWriter::create("/tmp/speakertweaker.bin", 48_000)?;
//! let reader = MappedFilterFile::open("/tmp/speakertweaker.bin")?;
//!
//! let band = FilterParameter::new(-1.95, 0.96, 0.4);
//! writer.publish(&ConfigSnapshot::from_stages(48_000, &[band]));
//! assert_eq!(reader.revision(), 1);
//! # Ok::<(), tweaker_core::TweakerError>(())
//! ```

#![deny(unsafe_code)]

mod layout;
mod mapped;
mod raw;
mod shared;
mod writer;

pub use layout::{FilterFileImage, StageImage, FILTER_FILE_SIZE, FILTER_FILE_WORDS};
pub use mapped::MappedFilterFile;
pub use raw::RawFilterFile;
pub use shared::SharedFilterFile;
pub use writer::FilterFileWriter;
