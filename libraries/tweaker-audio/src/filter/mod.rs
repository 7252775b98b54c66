//! Cascaded second-order correction filters
//!
//! - **FilterStage**: one fixed-numerator IIR section with two state registers
//! - **ChannelFilterChain**: up to 16 stages applied in order to one channel

mod chain;
mod stage;

pub use chain::ChannelFilterChain;
pub use stage::FilterStage;
