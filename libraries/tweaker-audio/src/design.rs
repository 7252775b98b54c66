/// Coefficient design for the fixed-numerator correction stage
///
/// Writers use these helpers to turn "boost 1 kHz by 6 dB" into the
/// `(a1, a2, gain)` triple the filter file stores. The stage is a constant
/// peak-gain band-pass (numerator `1 - z⁻²`) blended onto the dry signal, so
/// a band with response `G` at its centre needs `gain = (G - 1) · α / (1 + α)`.
use std::f64::consts::PI;

use tweaker_core::FilterParameter;

/// Highest band centre, as a fraction of the sampling rate
pub const MAX_FREQUENCY_RATIO: f32 = 0.45;

/// Peaking band: `gain_db` at `frequency`, bandwidth set by `q`
///
/// Gain is clamped to ±24 dB, Q to 0.1..=10, and the frequency to
/// [`MAX_FREQUENCY_RATIO`] of the sampling rate to stay clear of Nyquist.
pub fn peaking(sample_rate: u32, frequency: f32, q: f32, gain_db: f32) -> FilterParameter {
    if sample_rate == 0 || frequency <= 0.0 {
        return FilterParameter::identity();
    }

    let sample_rate = f64::from(sample_rate);
    let frequency = f64::from(frequency).min(sample_rate * f64::from(MAX_FREQUENCY_RATIO));
    let q = f64::from(q.clamp(0.1, 10.0));
    let gain_db = f64::from(gain_db.clamp(-24.0, 24.0));

    let omega = 2.0 * PI * frequency / sample_rate;
    let alpha = omega.sin() / (2.0 * q);
    let a0 = 1.0 + alpha;
    let peak = 10.0_f64.powf(gain_db / 20.0);

    FilterParameter::new(
        (-2.0 * omega.cos() / a0) as f32,
        ((1.0 - alpha) / a0) as f32,
        ((peak - 1.0) * alpha / a0) as f32,
    )
}

/// Linear magnitude of a cascade at `frequency`
pub fn magnitude_at(stages: &[FilterParameter], sample_rate: u32, frequency: f32) -> f64 {
    if sample_rate == 0 {
        return 1.0;
    }

    let omega = 2.0 * PI * f64::from(frequency) / f64::from(sample_rate);
    let (cos1, sin1) = (omega.cos(), omega.sin());
    let (cos2, sin2) = ((2.0 * omega).cos(), (2.0 * omega).sin());

    stages
        .iter()
        .map(|stage| {
            let a1 = f64::from(stage.a1);
            let a2 = f64::from(stage.a2);
            let gain = f64::from(stage.gain);

            // Band-pass term (1 - z⁻²) / (1 + a1·z⁻¹ + a2·z⁻²) at z = e^{jω}
            let (num_re, num_im) = (1.0 - cos2, sin2);
            let (den_re, den_im) = (1.0 + a1 * cos1 + a2 * cos2, -a1 * sin1 - a2 * sin2);
            let den_norm = den_re * den_re + den_im * den_im;
            if den_norm == 0.0 {
                return f64::INFINITY;
            }
            let bp_re = (num_re * den_re + num_im * den_im) / den_norm;
            let bp_im = (num_im * den_re - num_re * den_im) / den_norm;

            let re = 1.0 + gain * bp_re;
            let im = gain * bp_im;
            (re * re + im * im).sqrt()
        })
        .product()
}

/// Magnitude of a cascade at `frequency`, in dB
pub fn magnitude_db_at(stages: &[FilterParameter], sample_rate: u32, frequency: f32) -> f64 {
    20.0 * magnitude_at(stages, sample_rate, frequency).log10()
}
