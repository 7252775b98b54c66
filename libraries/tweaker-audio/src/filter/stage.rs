/// Second-order correction stage
///
/// The numerator of this section is fixed to `b0 = 1, b1 = 0, b2 = -1`, which
/// saves three of the six multiplications of a general biquad. Only the
/// feedback coefficients and an output mixing gain are configurable, and the
/// dry input is always added back onto the band-pass output:
///
/// ```text
///  ────►┬───────────────────────────────────►(+)────►
///       │                                     ↑
///       ├──►(b0)───►(+)─────►─────┬──►(gain)──┘
///       │            ↑            │
///       │         ┏━━┷━━┓         │
///       │         ┃ z⁻¹ ┃         │
///       │         ┗━━┯━━┛         │
///       │            ↑            │
///       ├──►(b1)───►(+)◄───(a1)◄──┤
///       │            ↑            │
///       │         ┏━━┷━━┓         │
///       │         ┃ z⁻¹ ┃         │
///       │         ┗━━┯━━┛         │
///       │            ↑            │
///       └──►(b2)───►(+)◄───(a2)◄──┘
/// ```
use tweaker_core::FilterParameter;

/// One cascaded stage: coefficients plus two state registers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterStage {
    param: FilterParameter,
    state: [f32; 2],
}

impl FilterStage {
    /// Create a stage with zeroed state
    pub const fn new(param: FilterParameter) -> Self {
        Self {
            param,
            state: [0.0; 2],
        }
    }

    /// Filter one sample, advancing the state registers
    #[inline]
    pub fn apply(&mut self, input: f32) -> f32 {
        let out = input + self.state[0];
        self.state[0] = self.state[1] - out * self.param.a1;
        self.state[1] = -input - out * self.param.a2;
        input + out * self.param.gain
    }

    /// Replace the coefficients, keeping the state registers
    ///
    /// Hot reloads go through here so the filter memory survives; the
    /// transient this can cause settles with the new coefficients.
    #[inline]
    pub fn set_param(&mut self, param: FilterParameter) {
        self.param = param;
    }

    /// Current coefficients
    pub fn param(&self) -> FilterParameter {
        self.param
    }

    /// Current state registers
    pub fn state(&self) -> [f32; 2] {
        self.state
    }

    /// Zero the state registers (coefficients are preserved)
    pub fn reset(&mut self) {
        self.state = [0.0; 2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_gain_passes_input_through() {
        let mut stage = FilterStage::new(FilterParameter::identity());
        for input in [1.0, 2.0, 3.0] {
            assert_eq!(stage.apply(input), input);
        }
    }

    #[test]
    fn matches_recurrence_step_by_step() {
        let param = FilterParameter::new(-1.5, 0.7, 0.25);
        let mut stage = FilterStage::new(param);

        let mut s0 = 0.0_f32;
        let mut s1 = 0.0_f32;
        for input in [0.5_f32, -0.25, 1.0, 0.0, 0.75] {
            let out = input + s0;
            let expected = input + out * param.gain;
            let next0 = s1 - out * param.a1;
            let next1 = -input - out * param.a2;

            assert_eq!(stage.apply(input), expected);
            assert_eq!(stage.state(), [next0, next1]);

            s0 = next0;
            s1 = next1;
        }
    }

    #[test]
    fn impulse_response_of_pure_band_pass() {
        // a1 = a2 = 0, gain = 1: y[n] = 2x[n] - x[n-2]
        let mut stage = FilterStage::new(FilterParameter::new(0.0, 0.0, 1.0));
        let response: Vec<f32> = [1.0, 0.0, 0.0, 0.0]
            .iter()
            .map(|&x| stage.apply(x))
            .collect();
        assert_eq!(response, vec![2.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn set_param_preserves_state() {
        let mut stage = FilterStage::new(FilterParameter::new(-1.0, 0.5, 0.5));
        stage.apply(1.0);
        let before = stage.state();

        stage.set_param(FilterParameter::new(0.3, 0.1, 2.0));

        assert_eq!(stage.state(), before);
        assert_eq!(stage.param(), FilterParameter::new(0.3, 0.1, 2.0));
    }

    #[test]
    fn reset_clears_state_only() {
        let param = FilterParameter::new(-1.0, 0.5, 0.5);
        let mut stage = FilterStage::new(param);
        stage.apply(1.0);
        stage.reset();

        assert_eq!(stage.state(), [0.0, 0.0]);
        assert_eq!(stage.param(), param);
    }
}
