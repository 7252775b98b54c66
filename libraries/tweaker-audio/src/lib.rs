//! Speaker Tweaker Audio
//!
//! Real-time speaker correction: a per-channel cascade of fixed-numerator
//! second-order filters whose coefficients are hot-reloaded from a shared
//! filter file without locks, allocation, or blocking on the audio thread.
//!
//! This crate provides:
//! - `FilterStage` / `ChannelFilterChain`: the cascaded filter math
//! - `ConfigSynchronizer`: revision-checked, torn-read-safe configuration adoption
//! - `CorrectionEngine`: multi-channel processing with rate-mismatch bypass
//! - `EngineEvents`: wait-free diagnostics drained off the audio thread
//! - `design`: coefficient helpers for filter file writers
//!
//! # Processing Flow
//!
//! ```text
//! host buffer ──► sync (cheap revision check, rare copy)
//!             ──► identity copy input → output
//!             ──► rates agree? ──► per-channel stage cascade, in place
//! ```
//!
//! # Example
//!
//! ```rust
//! use tweaker_audio::{design, CorrectionEngine, EngineMode};
//! use tweaker_core::{ConfigSnapshot, ConfigSource};
//!
//! struct Fixed(ConfigSnapshot);
//!
//! impl ConfigSource for Fixed {
//!     fn format_version(&self) -> u32 { 1 }
//!     fn revision(&self) -> u32 { 1 }
//!     fn read_snapshot(&self) -> ConfigSnapshot { self.0 }
//! }
//!
//! let band = design::peaking(48_000, 1000.0, 1.0, -3.0);
//! let source = Fixed(ConfigSnapshot::from_stages(48_000, &[band]));
//! let mut engine = CorrectionEngine::new(2, source)?;
//!
//! let input = vec![0.0_f32; 2 * 256];
//! let mut output = vec![0.0_f32; 2 * 256];
//! engine.process(&input, &mut output, 48_000)?;
//! assert_eq!(engine.mode(), EngineMode::Active);
//! # Ok::<(), tweaker_core::TweakerError>(())
//! ```

#![deny(unsafe_code)]

pub mod design;
mod engine;
mod events;
pub mod filter;
mod sync;

pub use engine::{CorrectionEngine, EngineMode};
pub use events::{EngineEvent, EngineEvents, DEFAULT_EVENT_CAPACITY};
pub use filter::{ChannelFilterChain, FilterStage};
pub use sync::{ConfigSynchronizer, SyncOutcome, MAX_SYNC_ATTEMPTS};
