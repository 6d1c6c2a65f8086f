//! Graph edge with mutable topology: fixed endpoint slots, a rotatable
//! orientation, and an optional bridge pairing to a neighboring connector.

use crate::id::{ConnectorId, ConnectorKey, NodeKey};
use crate::orientation::{Orientation, SIDE_COUNT, Side};
use serde::{Deserialize, Serialize};

/// Fixed pairing between two physically adjacent connectors. When both
/// partners' facing sides are open the pair is fused and behaves as a
/// single traversal edge, independent of node sharing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bridge {
    /// The partner connector.
    pub partner: ConnectorKey,
    /// The side of this connector that faces the partner.
    pub facing: Side,
}

/// A rotatable pipe segment.
///
/// The four endpoint slots never change identity after construction; only
/// the orientation (and the derived open set and fusion state) changes over
/// the connector's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    /// Stable id assigned at construction.
    pub id: ConnectorId,
    /// One potential endpoint per compass side; `None` is the board edge.
    endpoints: [Option<NodeKey>; SIDE_COUNT],
    /// Which sides are currently open.
    orientation: Orientation,
    /// Nodes reachable through this connector in one hop: the endpoints at
    /// open sides, enlarged by fusion. Set semantics.
    open_nodes: Vec<NodeKey>,
    /// Fixed bridge pairing, if any.
    bridge: Option<Bridge>,
    /// Whether this connector and its bridge partner are currently fused.
    /// Always equal on both partners.
    bridged: bool,
}

impl Connector {
    pub(crate) fn new(
        id: ConnectorId,
        endpoints: [Option<NodeKey>; SIDE_COUNT],
        orientation: Orientation,
    ) -> Self {
        Connector {
            id,
            endpoints,
            orientation,
            open_nodes: Vec::new(),
            bridge: None,
            bridged: false,
        }
    }

    /// Current orientation, for rotation logic and sprite selection.
    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The fixed endpoint slot at one side.
    #[inline]
    pub fn endpoint(&self, side: Side) -> Option<NodeKey> {
        self.endpoints[side.index()]
    }

    /// Nodes reachable through this connector in one hop.
    pub fn open_nodes(&self) -> &[NodeKey] {
        &self.open_nodes
    }

    /// The bridge pairing, if this connector has one.
    #[inline]
    pub fn bridge(&self) -> Option<Bridge> {
        self.bridge
    }

    /// Whether this connector is currently fused with its bridge partner.
    #[inline]
    pub fn bridged(&self) -> bool {
        self.bridged
    }

    /// Whether `node` occupies one of the fixed endpoint slots.
    pub(crate) fn is_endpoint(&self, node: NodeKey) -> bool {
        self.endpoints.iter().any(|ep| *ep == Some(node))
    }

    /// Whether the bridge-facing side is currently open ("ready" for
    /// fusion). False for connectors without a bridge.
    pub(crate) fn facing_open(&self) -> bool {
        self.bridge
            .is_some_and(|b| self.orientation.contains(b.facing))
    }

    pub(crate) fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub(crate) fn set_bridge(&mut self, bridge: Bridge) {
        self.bridge = Some(bridge);
    }

    pub(crate) fn set_bridged(&mut self, fused: bool) {
        self.bridged = fused;
    }

    /// Add a node to the open set. Idempotent.
    pub(crate) fn open_add(&mut self, node: NodeKey) {
        if !self.open_nodes.contains(&node) {
            self.open_nodes.push(node);
        }
    }

    /// Remove a node from the open set. Removing an absent node is a no-op.
    pub(crate) fn open_remove(&mut self, node: NodeKey) {
        self.open_nodes.retain(|n| *n != node);
    }
}
