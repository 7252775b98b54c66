//! Speaker Tweaker Core
//!
//! Platform-agnostic types, traits, and error handling shared by the correction
//! engine, the filter file crate, and the command-line host.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `FilterParameter`, `ConfigSnapshot`
//! - **Core Traits**: `ConfigSource` (the reader side of the shared filter file),
//!   `AudioEffect` (in-place processing seam used by hosts)
//! - **Error Handling**: Unified `TweakerError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tweaker_core::{ConfigSnapshot, FilterParameter, MAX_STAGES};
//!
//! let params = [FilterParameter::new(-1.9, 0.95, 0.5); MAX_STAGES];
//!
//! // Stage counts beyond the array capacity are clamped
//! let snapshot = ConfigSnapshot::new(48_000, 40, params);
//! assert_eq!(snapshot.stage_count(), MAX_STAGES);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TweakerError};
pub use traits::{AudioEffect, ConfigSource};
pub use types::{ConfigSnapshot, FilterParameter, MAX_STAGES, SUPPORTED_FORMAT_VERSION};
