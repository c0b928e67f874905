//! Hard-knee peak limiter that sits in front of the make-up gain stage.
//!
//! The limiter follows the feed-forward, log-domain compressor topology:
//!
//! ```text
//! Input → |x| → dB → Gain Computer → Attack/Release Smoothing → × Input → Output
//! ```
//!
//! Knee, ratio, attack and release are fixed for loudness normalization;
//! only the threshold moves. [`AudioPipeline::set_level`](crate::AudioPipeline::set_level)
//! derives it from the content loudness so that the 20:1 slope keeps the
//! boosted signal inside the headroom the gain stage adds.
//!
//! # Parameters
//!
//! | Parameter | Value | Description |
//! |-----------|-------|-------------|
//! | Threshold | -100–0 dB (initial 0) | Level where limiting begins |
//! | Knee | 0 dB | Hard knee |
//! | Ratio | 20:1 | Slope above threshold |
//! | Attack | 1 ms | Gain reduction onset |
//! | Release | 100 ms | Gain reduction recovery |
//!
//! # References
//!
//! - Giannoulis, Massberg & Reiss, "Digital Dynamic Range Compressor Design: A
//!   Tutorial and Analysis", JAES vol. 60 no. 6, 2012.

use crate::effect::Effect;
use crate::math::{db_to_linear, linear_to_db, ms_to_coeff};

/// Fixed knee width in dB.
pub const LIMITER_KNEE_DB: f32 = 0.0;

/// Fixed compression ratio.
pub const LIMITER_RATIO: f32 = 20.0;

/// Fixed attack time in milliseconds.
pub const LIMITER_ATTACK_MS: f32 = 1.0;

/// Fixed release time in milliseconds.
pub const LIMITER_RELEASE_MS: f32 = 100.0;

/// Lowest accepted threshold in dB.
pub const THRESHOLD_MIN_DB: f32 = -100.0;

/// Highest accepted threshold in dB.
pub const THRESHOLD_MAX_DB: f32 = 0.0;

/// Static gain curve of the limiter.
#[derive(Debug, Clone)]
struct GainComputer {
    threshold_db: f32,
    ratio: f32,
    knee_db: f32,
}

impl GainComputer {
    #[inline]
    fn compute_gain_db(&self, input_db: f32) -> f32 {
        let overshoot = input_db - self.threshold_db;
        let slope = 1.0 - 1.0 / self.ratio;

        if 2.0 * overshoot <= -self.knee_db {
            0.0
        } else if 2.0 * overshoot >= self.knee_db {
            -overshoot * slope
        } else {
            let x = overshoot + self.knee_db / 2.0;
            -slope * x * x / (2.0 * self.knee_db)
        }
    }
}

/// Peak limiter with a fixed 20:1 hard knee.
///
/// # Example
///
/// ```rust
/// use loudnorm_core::{Effect, Limiter};
///
/// let mut limiter = Limiter::new(48000.0);
/// limiter.set_threshold_db(-6.3);
///
/// for _ in 0..4800 {
///     limiter.process(0.9);
/// }
/// assert!(limiter.reduction_db() < 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Limiter {
    computer: GainComputer,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    /// Smoothed gain reduction in dB (always non-positive).
    reduction_db: f32,
}

impl Limiter {
    /// Create a limiter with a 0 dB threshold.
    pub fn new(sample_rate: f32) -> Self {
        let mut limiter = Self {
            computer: GainComputer {
                threshold_db: THRESHOLD_MAX_DB,
                ratio: LIMITER_RATIO,
                knee_db: LIMITER_KNEE_DB,
            },
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            reduction_db: 0.0,
        };
        limiter.recalculate_coefficients();
        limiter
    }

    /// Set the threshold in dB, clamped to
    /// [`THRESHOLD_MIN_DB`]..=[`THRESHOLD_MAX_DB`].
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.computer.threshold_db = threshold_db.clamp(THRESHOLD_MIN_DB, THRESHOLD_MAX_DB);
    }

    /// Current threshold in dB.
    pub fn threshold_db(&self) -> f32 {
        self.computer.threshold_db
    }

    /// Compression ratio (always [`LIMITER_RATIO`]).
    pub fn ratio(&self) -> f32 {
        self.computer.ratio
    }

    /// Knee width in dB (always [`LIMITER_KNEE_DB`]).
    pub fn knee_db(&self) -> f32 {
        self.computer.knee_db
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f32 {
        LIMITER_ATTACK_MS
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        LIMITER_RELEASE_MS
    }

    /// Gain reduction currently applied, in dB (0 when idle).
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = ms_to_coeff(LIMITER_ATTACK_MS, self.sample_rate);
        self.release_coeff = ms_to_coeff(LIMITER_RELEASE_MS, self.sample_rate);
    }
}

impl Effect for Limiter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let input_db = linear_to_db(input.abs());
        let target = self.computer.compute_gain_db(input_db);

        let coeff = if target < self.reduction_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.reduction_db = coeff * self.reduction_db + (1.0 - coeff) * target;

        input * db_to_linear(self.reduction_db)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    fn reset(&mut self) {
        self.reduction_db = 0.0;
    }
}
