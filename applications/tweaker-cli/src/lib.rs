//! Speaker Tweaker host
//!
//! Library side of the `speaker-tweaker` binary: host configuration, filter
//! design files, filter file administration and the stream host that runs
//! the correction engine.

pub mod admin;
pub mod config;
pub mod design_file;
pub mod error;
pub mod host;

pub use error::{CliError, Result};
