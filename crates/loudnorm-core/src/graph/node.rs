//! Graph node types.
//!
//! Each node has a [`NodeId`] and a [`NodeKind`]. The kind fixes the node's
//! role: the media source, the limiter, the gain stage, or the destination.
//! `NodeData` adds the adjacency lists the graph maintains.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::gain::GainStage;
use crate::limiter::Limiter;

use super::edge::EdgeId;

/// Unique identifier for a node in the audio graph.
///
/// Node IDs are assigned sequentially and stay valid for the life of the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// The role of a node in the audio graph.
#[derive(Debug)]
pub enum NodeKind {
    /// Audio taken from one media element. Never has incoming edges.
    Source {
        /// Identifier of the media element this source is bound to.
        element: String,
    },
    /// Peak limiter stage.
    Limiter(Limiter),
    /// Linear gain stage.
    Gain(GainStage),
    /// Final output. Never has outgoing edges.
    Destination,
}

impl NodeKind {
    /// Short lowercase name used in logs and wiring dumps.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Source { .. } => "source",
            Self::Limiter(_) => "limiter",
            Self::Gain(_) => "gain",
            Self::Destination => "destination",
        }
    }
}

/// Internal bookkeeping for a node in the graph.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub incoming: Vec<EdgeId>,
    pub outgoing: Vec<EdgeId>,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }
}
