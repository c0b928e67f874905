//! Level conversions used by the limiter and gain stages.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`ms_to_coeff`] - One-pole smoothing coefficient for a time constant

use libm::{expf, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use loudnorm_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below `1e-10` are clamped so silence maps to -200 dB
/// instead of negative infinity.
///
/// # Example
/// ```rust
/// use loudnorm_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// One-pole smoothing coefficient for a time constant in milliseconds.
///
/// `coeff = exp(-1 / (time_ms * sample_rate / 1000))`. A zero or negative
/// time yields `0.0`, i.e. the smoother jumps straight to its target.
#[inline]
pub fn ms_to_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    let samples = time_ms * sample_rate / 1000.0;
    if samples <= 0.0 {
        0.0
    } else {
        expf(-1.0 / samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_linear_roundtrip() {
        for db in [-40.0_f32, -12.0, -6.0, 0.0, 6.0] {
            let back = linear_to_db(db_to_linear(db));
            assert!((back - db).abs() < 1e-3, "{db} dB came back as {back}");
        }
    }

    #[test]
    fn silence_is_finite() {
        assert!(linear_to_db(0.0).is_finite());
        assert!(linear_to_db(0.0) < -190.0);
    }

    #[test]
    fn coeff_bounds() {
        assert_eq!(ms_to_coeff(0.0, 48000.0), 0.0);
        let c = ms_to_coeff(100.0, 48000.0);
        assert!(c > 0.99 && c < 1.0, "got {c}");
    }

    #[test]
    fn longer_times_smooth_more() {
        assert!(ms_to_coeff(1.0, 48000.0) < ms_to_coeff(100.0, 48000.0));
    }
}
