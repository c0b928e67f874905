//! Graph edge types.
//!
//! An edge carries audio from one node to another. Edges are created and
//! removed by the pipeline whenever it switches between the bypassed and
//! engaged wiring.

use super::node::NodeId;

/// Unique identifier for an edge in the audio graph.
///
/// Edge IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// A directed connection between two nodes.
#[derive(Debug)]
pub(crate) struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}
