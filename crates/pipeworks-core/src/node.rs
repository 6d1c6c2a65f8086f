//! Graph vertex: per-channel flow state and the live adjacency list used by
//! traversal.

use crate::id::{ConnectorKey, NodeId};
use serde::{Deserialize, Serialize};

/// Number of source channels tracked through the network.
pub const CHANNELS: usize = 4;

/// Fixed role of a node, assigned at board construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// Feeds one channel; its own flow value is pinned at 1.
    Source(usize),
    /// One of the four win-condition drains.
    Sink(usize),
    /// Plain junction point.
    Junction,
}

/// A junction point in the pipe network.
///
/// The adjacency list always equals the set of connectors whose open sides
/// currently reach this node, directly or through a fused bridge. The board
/// maintains it during rotation and fusion changes; traversal only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable id assigned at construction.
    pub id: NodeId,
    /// Fixed role.
    pub role: NodeRole,
    /// Per-channel accumulated flow. Reset to zero on every recompute,
    /// except for a source's own channel which stays at 1.
    pub flow: [u32; CHANNELS],
    /// Connectors currently wired to this node. Set semantics.
    incident: Vec<ConnectorKey>,
}

impl Node {
    pub(crate) fn new(id: NodeId, role: NodeRole) -> Self {
        Node {
            id,
            role,
            flow: [0; CHANNELS],
            incident: Vec::new(),
        }
    }

    /// Add a connector to the adjacency list. Idempotent.
    pub(crate) fn connect(&mut self, edge: ConnectorKey) {
        if !self.incident.contains(&edge) {
            self.incident.push(edge);
        }
    }

    /// Remove a connector from the adjacency list. Removing an absent edge
    /// is a no-op.
    pub(crate) fn disconnect(&mut self, edge: ConnectorKey) {
        self.incident.retain(|e| *e != edge);
    }

    /// Connectors currently touching this node.
    pub fn incident_edges(&self) -> &[ConnectorKey] {
        &self.incident
    }

    /// Whether this node relays the given channel.
    #[inline]
    pub fn is_saturated(&self, channel: usize) -> bool {
        self.flow[channel] != 0
    }

    /// Count of wet channels, 0-4. Scales the sink fill display.
    pub fn total_flow(&self) -> u32 {
        self.flow.iter().filter(|f| **f != 0).count() as u32
    }

    /// Sum of all four channel accumulators.
    pub fn flow_sum(&self) -> u32 {
        self.flow.iter().sum()
    }

    /// Whether any channel is flowing. The hosting game animates wet
    /// junction sprites from this.
    pub fn is_wet(&self) -> bool {
        self.flow.iter().any(|f| *f != 0)
    }

    /// Whether this node is one of the four sources.
    #[inline]
    pub fn is_source(&self) -> bool {
        matches!(self.role, NodeRole::Source(_))
    }
}
