//! Loudnorm Core - audio path for loudness normalization
//!
//! This crate provides the processing side of loudness normalization: a fixed
//! 20:1 hard-knee limiter, a linear make-up gain stage, and a small audio graph
//! that switches a media source between a direct path and the limiter + gain
//! path.
//!
//! # Core Abstractions
//!
//! - [`AudioPipeline`] - Source → limiter → gain → destination, or source →
//!   destination when bypassed
//! - [`AudioGraph`](graph::AudioGraph) - Node/edge store with structural validation
//! - [`Limiter`] - Hard-knee peak limiter (knee 0 dB, ratio 20, attack 1 ms, release 100 ms)
//! - [`GainStage`] - Linear multiplier
//! - [`Effect`] - Processing trait both stages implement
//!
//! ## Utilities
//!
//! - Level conversions: [`db_to_linear`], [`linear_to_db`]
//! - Parameter derivation: [`level_for`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature in
//! your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! loudnorm-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use loudnorm_core::AudioPipeline;
//!
//! let mut pipeline = AudioPipeline::new("video-0", 48000.0).unwrap();
//!
//! // Content measured 6 dB under the reference.
//! pipeline.set_level(-6.0);
//! pipeline.engage().unwrap();
//!
//! let input = vec![0.1_f32; 512];
//! let mut output = vec![0.0_f32; 512];
//! pipeline.process_block(&input, &mut output);
//! assert!(output[0] > input[0]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod effect;
pub mod gain;
pub mod graph;
pub mod limiter;
pub mod math;
pub mod pipeline;

// Re-export main types at crate root
pub use effect::Effect;
pub use gain::GainStage;
pub use graph::{AudioGraph, EdgeId, GraphError, NodeId, NodeKind};
pub use limiter::{
    LIMITER_ATTACK_MS, LIMITER_KNEE_DB, LIMITER_RATIO, LIMITER_RELEASE_MS, Limiter,
};
pub use math::{db_to_linear, linear_to_db, ms_to_coeff};
pub use pipeline::{AudioPipeline, GAIN_DAMPING, LevelSettings, Wiring, level_for, level_for_ratio};
