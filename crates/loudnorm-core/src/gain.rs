//! Make-up gain stage.
//!
//! The gain stage is a plain linear multiplier. It follows the limiter in the
//! engaged topology and receives the damped make-up gain computed by
//! [`AudioPipeline::set_level`](crate::AudioPipeline::set_level).
//!
//! ```rust
//! use loudnorm_core::{Effect, GainStage};
//!
//! let mut stage = GainStage::new();
//! stage.set_gain(2.0);
//! assert_eq!(stage.process(0.25), 0.5);
//! assert!((stage.gain_db() - 6.02).abs() < 0.01);
//! ```

use crate::effect::Effect;
use crate::math::linear_to_db;

/// Linear gain multiplier.
#[derive(Debug, Clone)]
pub struct GainStage {
    gain: f32,
}

impl GainStage {
    /// Create a unity-gain stage.
    pub fn new() -> Self {
        Self { gain: 1.0 }
    }

    /// Set the linear gain. Negative and non-finite values are ignored.
    pub fn set_gain(&mut self, gain: f32) {
        if gain.is_finite() && gain >= 0.0 {
            self.gain = gain;
        }
    }

    /// Current linear gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Current gain in dB.
    pub fn gain_db(&self) -> f32 {
        linear_to_db(self.gain)
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for GainStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_unity() {
        let mut stage = GainStage::new();
        assert_eq!(stage.gain(), 1.0);
        assert_eq!(stage.process(0.3), 0.3);
    }

    #[test]
    fn rejects_invalid_gain() {
        let mut stage = GainStage::new();
        stage.set_gain(1.5);
        stage.set_gain(-1.0);
        stage.set_gain(f32::NAN);
        stage.set_gain(f32::INFINITY);
        assert_eq!(stage.gain(), 1.5);
    }

    #[test]
    fn block_processing_scales() {
        let mut stage = GainStage::new();
        stage.set_gain(0.5);
        let input = [1.0, -1.0, 0.5];
        let mut output = [0.0; 3];
        stage.process_block(&input, &mut output);
        assert_eq!(output, [0.5, -0.5, 0.25]);
    }
}
