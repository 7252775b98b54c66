mod filter;
mod snapshot;

pub use filter::{FilterParameter, MAX_STAGES, SUPPORTED_FORMAT_VERSION};
pub use snapshot::ConfigSnapshot;
