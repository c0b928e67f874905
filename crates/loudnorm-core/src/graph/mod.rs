//! Audio graph for the normalization pipeline.
//!
//! The graph holds four kinds of node (source, limiter, gain, destination)
//! and the edges between them. [`AudioPipeline`](crate::AudioPipeline) owns one
//! graph per media element and rewires it between two topologies:
//!
//! ```text
//! bypassed:  source ─────────────────────────────→ destination
//! engaged:   source → limiter → gain ─────────────→ destination
//! ```
//!
//! Mutations (`connect`, `disconnect`, `disconnect_outgoing`) validate the
//! structure: sources take no input, the destination feeds nothing, every
//! other node has at most one edge in and one edge out, and no edge may
//! close a cycle.
//!
//! # no_std Support
//!
//! This module is `no_std` compatible with `alloc`.

pub mod edge;
pub mod node;
mod processing;

pub use edge::EdgeId;
pub use node::{NodeId, NodeKind};
pub use processing::{AudioGraph, GraphError};
