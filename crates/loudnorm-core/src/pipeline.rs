//! The normalization pipeline bound to one media element.
//!
//! [`AudioPipeline`] owns an [`AudioGraph`] with four nodes (source, limiter,
//! gain, destination) and switches between two mutually exclusive wirings:
//!
//! | [`Wiring`] | Path |
//! |------------|------|
//! | `Bypassed` | source → destination |
//! | `Engaged`  | source → limiter → gain → destination |
//!
//! The limiter → gain edge is made once at construction and never touched
//! again. Switching always removes the source's and the gain's outgoing edges
//! before connecting the new path, so the two wirings never overlap.
//!
//! # Level derivation
//!
//! For content measured at `target_db` (< 0 dB), [`level_for`] computes:
//!
//! - `threshold = ratio / (ratio - 1) * target_db`, which is `20/19 * target_db`
//!   for the fixed 20:1 ratio;
//! - `linear_gain = 10^(-0.4 * target_db / 20)`, the decibel deficit scaled by
//!   the fixed [`GAIN_DAMPING`] factor. Full correction would be
//!   `10^(-target_db / 20)`; the controller reports that value as the display
//!   gain but the gain stage never receives it.
//!
//! # Example
//!
//! ```rust
//! use loudnorm_core::{AudioPipeline, Wiring};
//!
//! let mut pipeline = AudioPipeline::new("video-0", 48000.0).unwrap();
//! assert_eq!(pipeline.wiring(), Wiring::Bypassed);
//!
//! let level = pipeline.set_level(-6.0);
//! assert!((level.threshold_db - (-6.316)).abs() < 1e-3);
//! assert!((level.linear_gain - 1.318).abs() < 1e-3);
//!
//! pipeline.engage().unwrap();
//! assert!(pipeline.is_engaged());
//! ```

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use libm::powf;

use crate::gain::GainStage;
use crate::graph::{AudioGraph, GraphError, NodeId, NodeKind};
use crate::limiter::{LIMITER_RATIO, Limiter};

/// Fraction of the decibel deficit the gain stage makes up.
pub const GAIN_DAMPING: f32 = 0.4;

/// Which path audio currently takes through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wiring {
    /// Source feeds the destination directly.
    Bypassed,
    /// Source feeds the limiter, which feeds the gain stage, which feeds the destination.
    Engaged,
}

impl core::fmt::Display for Wiring {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bypassed => f.write_str("bypassed"),
            Self::Engaged => f.write_str("engaged"),
        }
    }
}

/// Limiter threshold and gain-stage multiplier derived from content loudness.
///
/// [`level_for`] returns the raw formula values; [`AudioPipeline::set_level`]
/// returns what the stages accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSettings {
    /// Limiter threshold in dB.
    pub threshold_db: f32,
    /// Linear multiplier for the gain stage.
    pub linear_gain: f32,
}

/// Derives [`LevelSettings`] for content at `target_db` with the given
/// limiter `ratio`.
///
/// Pure function of its inputs; meaningful for `target_db < 0`.
#[inline]
pub fn level_for_ratio(target_db: f32, ratio: f32) -> LevelSettings {
    LevelSettings {
        threshold_db: ratio / (ratio - 1.0) * target_db,
        linear_gain: powf(10.0, -GAIN_DAMPING * target_db / 20.0),
    }
}

/// Derives [`LevelSettings`] for content at `target_db` with the fixed
/// limiter ratio.
#[inline]
pub fn level_for(target_db: f32) -> LevelSettings {
    level_for_ratio(target_db, LIMITER_RATIO)
}

/// Limiter + gain processing bound to one media element.
#[derive(Debug)]
pub struct AudioPipeline {
    graph: AudioGraph,
    source: NodeId,
    limiter: NodeId,
    gain: NodeId,
    destination: NodeId,
    wiring: Wiring,
}

impl AudioPipeline {
    /// Builds the pipeline for the media element identified by `element`.
    ///
    /// The pipeline starts [`Wiring::Bypassed`] with a 0 dB limiter threshold
    /// and unity gain.
    pub fn new(element: impl Into<String>, sample_rate: f32) -> Result<Self, GraphError> {
        let mut graph = AudioGraph::new(sample_rate);
        let source = graph.add_source(element);
        let limiter = graph.add_limiter(Limiter::new(sample_rate));
        let gain = graph.add_gain(GainStage::new());
        let destination = graph.add_destination();

        graph.connect(limiter, gain)?;
        graph.connect(source, destination)?;

        Ok(Self {
            graph,
            source,
            limiter,
            gain,
            destination,
            wiring: Wiring::Bypassed,
        })
    }

    /// Sets the limiter threshold and make-up gain for content at `target_db`.
    ///
    /// Only parameters change; the wiring is left alone. The returned
    /// settings are the ones the stages hold afterwards: the threshold is
    /// clamped to the limiter's range, and a non-finite gain leaves the
    /// previous gain in place.
    pub fn set_level(&mut self, target_db: f32) -> LevelSettings {
        let ratio = self.limiter().ratio();
        let level = level_for_ratio(target_db, ratio);
        if let Some(limiter) = self.graph.limiter_mut(self.limiter) {
            limiter.set_threshold_db(level.threshold_db);
        }
        if let Some(gain) = self.graph.gain_mut(self.gain) {
            gain.set_gain(level.linear_gain);
        }
        LevelSettings {
            threshold_db: self.limiter().threshold_db(),
            linear_gain: self.gain().gain(),
        }
    }

    /// Routes audio through limiter and gain.
    ///
    /// Idempotent. Returns `true` if the pipeline was bypassed before the call.
    pub fn engage(&mut self) -> Result<bool, GraphError> {
        let changed = self.wiring != Wiring::Engaged;
        self.clear_wiring()?;
        self.graph.connect(self.source, self.limiter)?;
        self.graph.connect(self.gain, self.destination)?;
        self.wiring = Wiring::Engaged;
        Ok(changed)
    }

    /// Routes audio straight from source to destination.
    ///
    /// Idempotent. Returns `true` if the pipeline was engaged before the call.
    pub fn bypass(&mut self) -> Result<bool, GraphError> {
        let changed = self.wiring != Wiring::Bypassed;
        self.clear_wiring()?;
        self.graph.connect(self.source, self.destination)?;
        self.wiring = Wiring::Bypassed;
        Ok(changed)
    }

    fn clear_wiring(&mut self) -> Result<(), GraphError> {
        self.graph.disconnect_outgoing(self.source)?;
        self.graph.disconnect_outgoing(self.gain)?;
        Ok(())
    }

    /// Current wiring.
    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    /// Whether audio currently passes through limiter and gain.
    pub fn is_engaged(&self) -> bool {
        self.wiring == Wiring::Engaged
    }

    /// Live connections as `(from, to)` pairs, sorted.
    pub fn connections(&self) -> Vec<(NodeId, NodeId)> {
        self.graph.connections()
    }

    /// The limiter stage.
    pub fn limiter(&self) -> &Limiter {
        match self.graph.kind(self.limiter) {
            Some(NodeKind::Limiter(limiter)) => limiter,
            _ => unreachable!("limiter node is created in AudioPipeline::new"),
        }
    }

    /// The gain stage.
    pub fn gain(&self) -> &GainStage {
        match self.graph.kind(self.gain) {
            Some(NodeKind::Gain(gain)) => gain,
            _ => unreachable!("gain node is created in AudioPipeline::new"),
        }
    }

    /// Identifier of the media element the source node is bound to.
    pub fn element(&self) -> &str {
        match self.graph.kind(self.source) {
            Some(NodeKind::Source { element }) => element,
            _ => unreachable!("source node is created in AudioPipeline::new"),
        }
    }

    /// Node IDs in `(source, limiter, gain, destination)` order.
    pub fn nodes(&self) -> (NodeId, NodeId, NodeId, NodeId) {
        (self.source, self.limiter, self.gain, self.destination)
    }

    /// The underlying graph.
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// Sample rate the stages run at.
    pub fn sample_rate(&self) -> f32 {
        self.graph.sample_rate()
    }

    /// Renders a block of mono samples through the current wiring.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        self.graph.render(self.source, input, output);
    }

    /// Clears limiter state without touching parameters or wiring.
    pub fn reset(&mut self) {
        self.graph.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::THRESHOLD_MIN_DB;

    fn pipeline() -> AudioPipeline {
        AudioPipeline::new("video", 48000.0).unwrap()
    }

    #[test]
    fn starts_bypassed() {
        let p = pipeline();
        let (source, limiter, gain, dest) = p.nodes();
        assert_eq!(p.wiring(), Wiring::Bypassed);
        assert_eq!(p.connections(), vec![(source, dest), (limiter, gain)]);
        assert_eq!(p.limiter().threshold_db(), 0.0);
        assert_eq!(p.gain().gain(), 1.0);
        assert_eq!(p.element(), "video");
    }

    #[test]
    fn engage_wiring() {
        let mut p = pipeline();
        let (source, limiter, gain, dest) = p.nodes();
        assert_eq!(p.engage(), Ok(true));
        assert_eq!(
            p.connections(),
            vec![(source, limiter), (limiter, gain), (gain, dest)]
        );
    }

    #[test]
    fn engage_is_idempotent() {
        let mut p = pipeline();
        p.engage().unwrap();
        let once = p.connections();
        assert_eq!(p.engage(), Ok(false));
        assert_eq!(p.connections(), once);
    }

    #[test]
    fn bypass_is_idempotent() {
        let mut p = pipeline();
        let initial = p.connections();
        assert_eq!(p.bypass(), Ok(false));
        assert_eq!(p.connections(), initial);
        p.engage().unwrap();
        assert_eq!(p.bypass(), Ok(true));
        assert_eq!(p.connections(), initial);
    }

    #[test]
    fn set_level_does_not_rewire() {
        let mut p = pipeline();
        let before = p.connections();
        p.set_level(-12.0);
        assert_eq!(p.connections(), before);
        assert_eq!(p.wiring(), Wiring::Bypassed);
    }

    #[test]
    fn minus_six_db_scenario() {
        let mut p = pipeline();
        let level = p.set_level(-6.0);
        assert!((level.threshold_db - 20.0 / 19.0 * -6.0).abs() < 1e-5);
        assert!((level.linear_gain - 10f32.powf(0.12)).abs() < 1e-5);
        assert!((p.limiter().threshold_db() - (-6.3158)).abs() < 1e-3);
        assert!((p.gain().gain() - 1.3183).abs() < 1e-3);
    }

    #[test]
    fn set_level_reports_clamped_threshold() {
        let mut p = pipeline();
        let level = p.set_level(-200.0);
        assert_eq!(level.threshold_db, THRESHOLD_MIN_DB);
        assert_eq!(level.threshold_db, p.limiter().threshold_db());
        assert!((level.linear_gain - 10f32.powf(4.0)).abs() < 1.0);
    }

    #[test]
    fn set_level_keeps_gain_on_overflow() {
        let mut p = pipeline();
        let before = p.set_level(-6.0);
        let level = p.set_level(-5000.0);
        assert!(!level_for(-5000.0).linear_gain.is_finite());
        assert_eq!(level.linear_gain, before.linear_gain);
        assert_eq!(level.linear_gain, p.gain().gain());
    }

    #[test]
    fn switching_keeps_edge_store_bounded() {
        let mut p = pipeline();
        for _ in 0..500 {
            p.engage().unwrap();
            p.bypass().unwrap();
        }
        assert_eq!(p.graph().edge_count(), 2);
        assert!(p.graph().edge_slots() <= 3);
    }

    #[test]
    fn bypassed_render_is_transparent() {
        let mut p = pipeline();
        p.set_level(-20.0);
        let input = [0.5, -0.25, 0.125, 0.0];
        let mut output = [0.0; 4];
        p.process_block(&input, &mut output);
        assert_eq!(output, input);
    }

    #[test]
    fn engaged_render_applies_gain() {
        let mut p = pipeline();
        let level = p.set_level(-6.0);
        p.engage().unwrap();
        // Quiet input stays below the limiter threshold.
        let input = [0.01_f32; 64];
        let mut output = [0.0; 64];
        p.process_block(&input, &mut output);
        for s in output {
            assert!((s - 0.01 * level.linear_gain).abs() < 1e-6);
        }
    }
}
