//! Processing trait shared by the pipeline's stages.
//!
//! Both the [`Limiter`](crate::Limiter) and the [`GainStage`](crate::GainStage)
//! implement [`Effect`], which lets the graph render any stage through a
//! `&mut dyn Effect` without knowing its concrete type.

/// A mono audio processing stage.
///
/// # Example
///
/// ```rust
/// use loudnorm_core::Effect;
///
/// struct Halve;
///
/// impl Effect for Halve {
///     fn process(&mut self, input: f32) -> f32 {
///         input * 0.5
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
///
/// let mut stage = Halve;
/// assert_eq!(stage.process(1.0), 0.5);
/// ```
pub trait Effect {
    /// Process a single sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process a block of samples.
    ///
    /// Default implementation calls `process()` for each sample.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers must have same length"
        );
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block of samples in-place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Update the sample rate and recalculate time-dependent coefficients.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear internal state without changing parameters.
    fn reset(&mut self);
}
