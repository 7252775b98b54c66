/// Filter coefficient types
use serde::{Deserialize, Serialize};

/// Maximum number of cascaded stages per channel
pub const MAX_STAGES: usize = 16;

/// The only filter file format version this build adopts
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Coefficients of one second-order correction stage
///
/// The feed-forward coefficients are fixed at `b0 = 1, b1 = 0, b2 = -1` and
/// are not stored. `a1`/`a2` place the resonance, `gain` sets how much of the
/// band-pass output is blended back onto the dry signal (0 = identity).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParameter {
    /// First feedback coefficient
    pub a1: f32,
    /// Second feedback coefficient
    pub a2: f32,
    /// Output mixing gain of the band-pass term
    pub gain: f32,
}

impl FilterParameter {
    /// Create a new coefficient triple
    pub const fn new(a1: f32, a2: f32, gain: f32) -> Self {
        Self { a1, a2, gain }
    }

    /// A stage that passes its input through unchanged
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Whether all coefficients are finite numbers
    pub fn is_finite(&self) -> bool {
        self.a1.is_finite() && self.a2.is_finite() && self.gain.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(FilterParameter::default(), FilterParameter::identity());
    }

    #[test]
    fn non_finite_coefficients_detected() {
        assert!(FilterParameter::new(-1.9, 0.9, 0.2).is_finite());
        assert!(!FilterParameter::new(f32::NAN, 0.9, 0.2).is_finite());
        assert!(!FilterParameter::new(0.0, 0.0, f32::INFINITY).is_finite());
    }

    #[test]
    fn deserializes_from_toml() {
        let param: FilterParameter = toml::from_str("a1 = -1.5\na2 = 0.75\ngain = 0.25").unwrap();
        assert_eq!(param, FilterParameter::new(-1.5, 0.75, 0.25));
    }
}
