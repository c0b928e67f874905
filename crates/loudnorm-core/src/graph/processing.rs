//! Audio graph: mutation API, cycle detection and rendering.
//!
//! [`AudioGraph`] owns a small set of nodes and the edges between them. Unlike
//! a mixing graph, every node here has at most one outgoing edge, so rendering
//! is a walk from the source node along its single path. A path that never
//! reaches the destination renders silence, matching an unconnected node.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec, vec::Vec};

use crate::effect::Effect;
use crate::gain::GainStage;
use crate::limiter::Limiter;

use super::edge::{Edge, EdgeId};
use super::node::{NodeData, NodeId, NodeKind};

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    NodeNotFound(NodeId),
    /// The specified edge was not found in the graph.
    EdgeNotFound(EdgeId),
    /// Adding this edge would create a cycle.
    CycleDetected,
    /// The connection is structurally invalid (e.g. an edge into a source).
    InvalidConnection(String),
    /// A duplicate edge already exists between these nodes.
    DuplicateEdge(NodeId, NodeId),
}

impl core::fmt::Display for GraphError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::EdgeNotFound(id) => write!(f, "edge {id} not found"),
            Self::CycleDetected => write!(f, "adding this edge would create a cycle"),
            Self::InvalidConnection(msg) => write!(f, "invalid connection: {msg}"),
            Self::DuplicateEdge(a, b) => write!(f, "edge from {a} to {b} already exists"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GraphError {}

/// Directed acyclic audio graph with single-output nodes.
///
/// ```rust
/// use loudnorm_core::graph::AudioGraph;
/// use loudnorm_core::GainStage;
///
/// let mut graph = AudioGraph::new(48000.0);
/// let source = graph.add_source("video-0");
/// let gain = graph.add_gain(GainStage::new());
/// let out = graph.add_destination();
/// graph.connect(source, gain).unwrap();
/// graph.connect(gain, out).unwrap();
///
/// let mut output = [0.0; 4];
/// assert!(graph.render(source, &[0.5; 4], &mut output));
/// assert_eq!(output, [0.5; 4]);
/// ```
#[derive(Debug)]
pub struct AudioGraph {
    nodes: Vec<NodeData>,
    edges: Vec<Option<Edge>>,
    sample_rate: f32,
}

impl AudioGraph {
    /// Creates an empty graph running at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            sample_rate,
        }
    }

    /// Sample rate shared by every stage in the graph.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // --- Node mutations ---

    /// Adds a source node bound to the media element identified by `element`.
    pub fn add_source(&mut self, element: impl Into<String>) -> NodeId {
        let id = self.add_node(NodeKind::Source {
            element: element.into(),
        });
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: source node {id}");
        id
    }

    /// Adds a limiter stage. Its sample rate is set to the graph's.
    pub fn add_limiter(&mut self, mut limiter: Limiter) -> NodeId {
        limiter.set_sample_rate(self.sample_rate);
        let id = self.add_node(NodeKind::Limiter(limiter));
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: limiter node {id}");
        id
    }

    /// Adds a gain stage.
    pub fn add_gain(&mut self, gain: GainStage) -> NodeId {
        let id = self.add_node(NodeKind::Gain(gain));
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: gain node {id}");
        id
    }

    /// Adds the destination node.
    pub fn add_destination(&mut self) -> NodeId {
        let id = self.add_node(NodeKind::Destination);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: destination node {id}");
        id
    }

    /// Connects two nodes with a directed edge.
    ///
    /// Returns the new edge's ID, or an error if:
    /// - Either node doesn't exist
    /// - The connection is structurally invalid
    /// - A duplicate edge already exists
    /// - The edge would create a cycle
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        self.validate_connection(from, to)?;

        if self.find_edge(from, to).is_some() {
            return Err(GraphError::DuplicateEdge(from, to));
        }

        // A cycle exists if `to` can already reach `from`.
        if self.can_reach(to, from) {
            return Err(GraphError::CycleDetected);
        }

        // Reuse a freed slot before growing the store.
        let edge = Some(Edge { from, to });
        let edge_id = if let Some(slot) = self.edges.iter().position(Option::is_none) {
            self.edges[slot] = edge;
            EdgeId(slot as u32)
        } else {
            self.edges.push(edge);
            EdgeId(self.edges.len() as u32 - 1)
        };
        self.nodes[from.0 as usize].outgoing.push(edge_id);
        self.nodes[to.0 as usize].incoming.push(edge_id);

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(edge_id)
    }

    /// Removes a single edge.
    pub fn disconnect(&mut self, id: EdgeId) -> Result<(), GraphError> {
        let edge = self
            .edges
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(GraphError::EdgeNotFound(id))?;

        self.nodes[edge.from.0 as usize].outgoing.retain(|e| *e != id);
        self.nodes[edge.to.0 as usize].incoming.retain(|e| *e != id);

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: edge {id}");
        Ok(())
    }

    /// Removes every outgoing edge of `node`. Returns how many were removed.
    pub fn disconnect_outgoing(&mut self, node: NodeId) -> Result<usize, GraphError> {
        let outgoing = self.get_node(node)?.outgoing.clone();
        for edge_id in &outgoing {
            self.disconnect(*edge_id)?;
        }
        Ok(outgoing.len())
    }

    // --- Queries ---

    /// Finds the edge ID connecting `from` to `to`, if one exists.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        let node = self.nodes.get(from.0 as usize)?;
        node.outgoing.iter().copied().find(|edge_id| {
            self.edges[edge_id.0 as usize]
                .as_ref()
                .is_some_and(|edge| edge.to == to)
        })
    }

    /// All live connections as `(from, to)` pairs, sorted.
    pub fn connections(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs: Vec<(NodeId, NodeId)> = self
            .edges
            .iter()
            .flatten()
            .map(|edge| (edge.from, edge.to))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// Number of edge slots held, live or free.
    pub fn edge_slots(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the kind of a node.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0 as usize).map(|n| &n.kind)
    }

    /// Returns the limiter inside a node, if it is a limiter node.
    pub fn limiter(&self, id: NodeId) -> Option<&Limiter> {
        match self.kind(id)? {
            NodeKind::Limiter(limiter) => Some(limiter),
            _ => None,
        }
    }

    /// Mutable access to a limiter node.
    pub fn limiter_mut(&mut self, id: NodeId) -> Option<&mut Limiter> {
        match &mut self.nodes.get_mut(id.0 as usize)?.kind {
            NodeKind::Limiter(limiter) => Some(limiter),
            _ => None,
        }
    }

    /// Returns the gain stage inside a node, if it is a gain node.
    pub fn gain(&self, id: NodeId) -> Option<&GainStage> {
        match self.kind(id)? {
            NodeKind::Gain(gain) => Some(gain),
            _ => None,
        }
    }

    /// Mutable access to a gain node.
    pub fn gain_mut(&mut self, id: NodeId) -> Option<&mut GainStage> {
        match &mut self.nodes.get_mut(id.0 as usize)?.kind {
            NodeKind::Gain(gain) => Some(gain),
            _ => None,
        }
    }

    /// The node `id` feeds, if it has an outgoing edge.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let edge_id = self.nodes.get(id.0 as usize)?.outgoing.first()?;
        self.edges[edge_id.0 as usize].as_ref().map(|edge| edge.to)
    }

    // --- Rendering ---

    /// Renders `input` from `source` along its path into `output`.
    ///
    /// Returns `true` if the path reached a destination node. Otherwise the
    /// output is silent and `false` is returned.
    pub fn render(&mut self, source: NodeId, input: &[f32], output: &mut [f32]) -> bool {
        debug_assert_eq!(input.len(), output.len());
        output.copy_from_slice(input);

        let mut current = source;
        // Every node is visited at most once on an acyclic path.
        for _ in 0..self.nodes.len() {
            let Some(next) = self.next(current) else {
                break;
            };
            match &mut self.nodes[next.0 as usize].kind {
                NodeKind::Limiter(limiter) => limiter.process_block_inplace(output),
                NodeKind::Gain(gain) => gain.process_block_inplace(output),
                NodeKind::Destination => return true,
                NodeKind::Source { .. } => break,
            }
            current = next;
        }

        output.fill(0.0);
        false
    }

    /// Clears the processing state of every stage.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            match &mut node.kind {
                NodeKind::Limiter(limiter) => limiter.reset(),
                NodeKind::Gain(gain) => gain.reset(),
                _ => {}
            }
        }
    }

    // --- Internals ---

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind));
        id
    }

    fn get_node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// DFS reachability check: can `from` reach `to` via existing edges?
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.0 as usize;
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;

            for edge_id in &self.nodes[idx].outgoing {
                if let Some(edge) = &self.edges[edge_id.0 as usize] {
                    stack.push(edge.to);
                }
            }
        }
        false
    }

    /// Validates structural constraints for a connection.
    fn validate_connection(&self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let from_node = self.get_node(from)?;
        let to_node = self.get_node(to)?;

        if matches!(to_node.kind, NodeKind::Source { .. }) {
            return Err(GraphError::InvalidConnection(format!(
                "cannot connect into source node {from}→{to}"
            )));
        }
        if matches!(from_node.kind, NodeKind::Destination) {
            return Err(GraphError::InvalidConnection(format!(
                "cannot connect from destination node {from}→{to}"
            )));
        }
        if !from_node.outgoing.is_empty() {
            return Err(GraphError::InvalidConnection(format!(
                "{} node {from} already has an outgoing edge",
                from_node.kind.name()
            )));
        }
        if !matches!(to_node.kind, NodeKind::Destination) && !to_node.incoming.is_empty() {
            return Err(GraphError::InvalidConnection(format!(
                "{} node {to} already has an incoming edge",
                to_node.kind.name()
            )));
        }
        Ok(())
    }
}
