//! Composition root: owns the node and connector arenas, wires the fixed
//! topology once, and runs rotation, flow propagation, and win detection.
//!
//! Node <-> connector back-references are arena keys, never owning
//! pointers, so fusing and un-fusing bridge pairs reduce to index-list
//! edits on both sides.

use crate::connector::{Bridge, Connector};
use crate::fixed::{Fixed64, ratio};
use crate::id::{ConnectorId, ConnectorKey, NodeId, NodeKey};
use crate::node::{CHANNELS, Node, NodeRole};
use crate::orientation::{Orientation, STRAIGHT_NS, Side};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced at the board's public call boundary.
///
/// Every reachable game state is valid; these fire only on identifiers the
/// input-dispatch layer should never produce.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("unknown connector id: {0:?}")]
    UnknownConnector(ConnectorId),
    #[error("unknown node id: {0:?}")]
    UnknownNode(NodeId),
    #[error("unknown sink index: {0}")]
    UnknownSink(usize),
}

// ---------------------------------------------------------------------------
// Fixed topology
// ---------------------------------------------------------------------------

/// Number of nodes on the board. Node ids also index the traversal's
/// visited bitset, which is a single u64, so this must stay <= 64.
pub const NODE_COUNT: usize = 37;
/// Number of rotatable connectors.
pub const CONNECTOR_COUNT: usize = 21;
/// Sources (one per channel) and sinks per board.
pub const SOURCE_COUNT: usize = 4;
/// Number of sinks checked by the win condition.
pub const SINK_COUNT: usize = 4;

const N: u8 = Side::North.bit();
const E: u8 = Side::East.bit();
const S: u8 = Side::South.bit();
const W: u8 = Side::West.bit();

/// Construction data for one connector: endpoint node ids in N/E/S/W order
/// (`None` is the board edge), initial orientation bits, and the bridge
/// partner with the side facing it.
struct ConnectorSpec {
    endpoints: [Option<usize>; 4],
    orientation: u8,
    bridge: Option<(usize, Side)>,
}

const fn conn(
    endpoints: [Option<usize>; 4],
    orientation: u8,
    bridge: Option<(usize, Side)>,
) -> ConnectorSpec {
    ConnectorSpec {
        endpoints,
        orientation,
        bridge,
    }
}

/// The board wiring. Nodes 0-3 are the sources (channel = id), nodes 33-36
/// the sinks (index = id - 33), everything else a plain junction.
#[rustfmt::skip]
const LAYOUT: [ConnectorSpec; CONNECTOR_COUNT] = [
    conn([None,     Some(4),  Some(6),  Some(0)],  E | S,     None),
    conn([None,     Some(5),  Some(7),  Some(4)],  E | S,     None),
    conn([None,     Some(1),  Some(8),  Some(5)],  E | S,     None),
    conn([Some(2),  Some(10), None,     Some(9)],  N | E,     None),
    conn([Some(7),  Some(11), None,     None],     N | E,     Some((8, Side::South))),
    conn([Some(8),  Some(12), Some(25), Some(11)], N | E | S, None),
    conn([Some(3),  None,     Some(14), Some(13)], S | W,     None),
    conn([Some(6),  Some(15), Some(23), None],     E | S,     None),
    conn([None,     Some(18), Some(24), Some(15)], N | E | S, Some((4, Side::North))),
    conn([Some(9),  Some(16), Some(19), Some(12)], E | S | W, None),
    conn([Some(13), Some(17), None,     Some(16)], N | E | S, Some((14, Side::South))),
    conn([Some(10), None,     Some(22), Some(17)], N | S,     Some((12, Side::East))),
    conn([Some(14), None,     Some(28), None],     N | W,     Some((11, Side::West))),
    conn([Some(19), Some(20), Some(26), None],     N | E,     None),
    conn([None,     Some(21), Some(27), Some(20)], E | S | W, Some((10, Side::North))),
    conn([Some(23), Some(24), Some(33), None],     N | E,     None),
    conn([Some(25), Some(29), Some(34), Some(18)], N | E | W, None),
    conn([Some(26), Some(31), Some(35), Some(29)], N | E | W, None),
    conn([Some(21), Some(22), Some(30), Some(27)], N | E | W, None),
    conn([Some(30), Some(32), None,     Some(31)], N | E,     None),
    conn([Some(28), None,     Some(36), Some(32)], N | W,     None),
];

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// The puzzle board: 37 nodes joined by 21 rotatable connectors, four
/// sources feeding four channels toward four sinks.
///
/// Mutated only through [`Board::rotate`], which rewires exactly one
/// connector and then recomputes flow across the whole board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    nodes: SlotMap<NodeKey, Node>,
    connectors: SlotMap<ConnectorKey, Connector>,
    /// Stable id -> arena key, in construction order.
    node_order: Vec<NodeKey>,
    connector_order: Vec<ConnectorKey>,
    sources: [NodeKey; SOURCE_COUNT],
    sinks: [NodeKey; SINK_COUNT],
    /// Per-sink fill share, cached by the last recompute.
    shares: [Fixed64; SINK_COUNT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Build the fixed topology, fuse any bridge pair that starts face to
    /// face, and run the initial flow recompute.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut node_order = Vec::with_capacity(NODE_COUNT);
        for id in 0..NODE_COUNT {
            let role = if id < SOURCE_COUNT {
                NodeRole::Source(id)
            } else if id >= NODE_COUNT - SINK_COUNT {
                NodeRole::Sink(id - (NODE_COUNT - SINK_COUNT))
            } else {
                NodeRole::Junction
            };
            node_order.push(nodes.insert(Node::new(NodeId(id), role)));
        }

        let mut connectors = SlotMap::with_key();
        let mut connector_order = Vec::with_capacity(CONNECTOR_COUNT);
        for (id, spec) in LAYOUT.iter().enumerate() {
            let endpoints = spec.endpoints.map(|ep| ep.map(|i| node_order[i]));
            let orientation = Orientation::from_bits(spec.orientation);
            connector_order.push(connectors.insert(Connector::new(
                ConnectorId(id),
                endpoints,
                orientation,
            )));
        }
        // Bridge partners are arena keys, so they can only be patched in
        // once every connector exists.
        for (id, spec) in LAYOUT.iter().enumerate() {
            if let Some((partner, facing)) = spec.bridge {
                connectors[connector_order[id]].set_bridge(Bridge {
                    partner: connector_order[partner],
                    facing,
                });
            }
        }

        let sources = [node_order[0], node_order[1], node_order[2], node_order[3]];
        let sinks = [
            node_order[NODE_COUNT - 4],
            node_order[NODE_COUNT - 3],
            node_order[NODE_COUNT - 2],
            node_order[NODE_COUNT - 1],
        ];
        let mut board = Board {
            nodes,
            connectors,
            node_order,
            connector_order,
            sources,
            sinks,
            shares: [Fixed64::ZERO; SINK_COUNT],
        };

        // Wire every connector to the endpoints behind its open sides.
        for i in 0..CONNECTOR_COUNT {
            let key = board.connector_order[i];
            for side in Side::ALL {
                if !board.connectors[key].orientation().contains(side) {
                    continue;
                }
                if let Some(node) = board.connectors[key].endpoint(side) {
                    board.nodes[node].connect(key);
                    board.connectors[key].open_add(node);
                }
            }
        }
        // Fuse bridge pairs that already face each other. Fusing marks both
        // partners, so each pair is processed once.
        for i in 0..CONNECTOR_COUNT {
            let key = board.connector_order[i];
            let Some(bridge) = board.connectors[key].bridge() else {
                continue;
            };
            if !board.connectors[key].bridged()
                && board.connectors[key].facing_open()
                && board.connectors[bridge.partner].facing_open()
            {
                board.fuse(key, bridge.partner);
            }
        }

        board.recompute_flow();
        board
    }

    // -----------------------------------------------------------------------
    // Rotation
    // -----------------------------------------------------------------------

    /// Apply one quarter-turn clockwise to the named connector, update its
    /// node and bridge wiring, then recompute flow across the board.
    ///
    /// Rotation itself cannot fail; an unknown id indicates a bug in the
    /// input-dispatch layer and is rejected without mutating anything.
    pub fn rotate(&mut self, id: ConnectorId) -> Result<(), BoardError> {
        let key = *self
            .connector_order
            .get(id.0)
            .ok_or(BoardError::UnknownConnector(id))?;
        self.turn(key);
        self.recompute_flow();
        Ok(())
    }

    fn turn(&mut self, key: ConnectorKey) {
        let old = self.connectors[key].orientation();
        let new = old.rotated_cw();
        let delta = old.delta(new);

        // Which sides switch off and on. A straight-through piece (two
        // opposite open sides) swaps both pairs at once and every delta bit
        // is set, so the sides are read off the orientations directly;
        // every other shape changes exactly one side each way.
        let (off_sides, on_sides): (Vec<Side>, Vec<Side>) = if delta == 0b1111 {
            if new == STRAIGHT_NS {
                (vec![Side::East, Side::West], vec![Side::North, Side::South])
            } else {
                (vec![Side::North, Side::South], vec![Side::East, Side::West])
            }
        } else {
            (
                vec![Side::from_bit(old.bits() & delta)],
                vec![Side::from_bit(new.bits() & delta)],
            )
        };

        for i in 0..off_sides.len() {
            if let Some(node) = self.connectors[key].endpoint(off_sides[i]) {
                self.nodes[node].disconnect(key);
                self.connectors[key].open_remove(node);
            }
            if let Some(node) = self.connectors[key].endpoint(on_sides[i]) {
                self.nodes[node].connect(key);
                self.connectors[key].open_add(node);
            }
        }
        self.connectors[key].set_orientation(new);

        // Bridge re-evaluation: un-fuse when the facing side has rotated
        // away; fuse when both partners now face each other open.
        if let Some(bridge) = self.connectors[key].bridge() {
            if self.connectors[key].bridged() {
                if !self.connectors[key].facing_open() {
                    self.unfuse(key, bridge.partner);
                }
            } else if self.connectors[key].facing_open()
                && self.connectors[bridge.partner].facing_open()
            {
                self.fuse(key, bridge.partner);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Fusion
    // -----------------------------------------------------------------------

    /// Merge the reachable-node sets of two facing connectors so traversal
    /// crosses between them as if they were one edge.
    fn fuse(&mut self, a: ConnectorKey, b: ConnectorKey) {
        let a_open = self.connectors[a].open_nodes().to_vec();
        let b_open = self.connectors[b].open_nodes().to_vec();
        for &node in &a_open {
            self.nodes[node].connect(b);
            self.connectors[b].open_add(node);
        }
        for &node in &b_open {
            self.nodes[node].connect(a);
            self.connectors[a].open_add(node);
        }
        self.connectors[a].set_bridged(true);
        self.connectors[b].set_bridged(true);
    }

    /// Undo a fusion from `a`'s side: strip `b` from `a`'s fixed endpoint
    /// slots, then prune everything left in `a`'s open set that is not one
    /// of its own endpoints. Afterwards each partner's open set reduces to
    /// the nodes behind its own open sides.
    fn unfuse(&mut self, a: ConnectorKey, b: ConnectorKey) {
        for side in Side::ALL {
            if let Some(node) = self.connectors[a].endpoint(side) {
                self.nodes[node].disconnect(b);
                self.connectors[b].open_remove(node);
            }
        }
        let residual: Vec<NodeKey> = self.connectors[a]
            .open_nodes()
            .iter()
            .copied()
            .filter(|n| !self.connectors[a].is_endpoint(*n))
            .collect();
        for node in residual {
            self.connectors[a].open_remove(node);
            self.nodes[node].disconnect(a);
        }
        self.connectors[a].set_bridged(false);
        self.connectors[b].set_bridged(false);
    }

    // -----------------------------------------------------------------------
    // Flow propagation
    // -----------------------------------------------------------------------

    /// Clear all non-source flow, re-run a depth-first relay from each of
    /// the four sources, and refresh the cached sink shares.
    ///
    /// Deterministic: identical wiring always produces identical flow
    /// values. The visited marker lives on the stack of this call and is
    /// reset once per source pass, so a node feeds every channel it can
    /// without ever looping on the graph's cycles.
    pub fn recompute_flow(&mut self) {
        for &key in &self.node_order {
            let node = &mut self.nodes[key];
            node.flow = match node.role {
                NodeRole::Source(channel) => {
                    let mut flow = [0; CHANNELS];
                    flow[channel] = 1;
                    flow
                }
                _ => [0; CHANNELS],
            };
        }
        for i in 0..SOURCE_COUNT {
            let mut visited = 0u64;
            self.spread(self.sources[i], &mut visited);
        }
        self.update_shares();
    }

    /// Depth-first relay step. Every yet-unvisited neighbor reachable
    /// through an incident edge receives this node's flow on each channel
    /// the node relays, except that nothing ever accumulates into a source.
    fn spread(&mut self, key: NodeKey, visited: &mut u64) {
        *visited |= 1u64 << self.nodes[key].id.0;
        let edges = self.nodes[key].incident_edges().to_vec();
        for edge in edges {
            let neighbors = self.connectors[edge].open_nodes().to_vec();
            for next in neighbors {
                if *visited & (1u64 << self.nodes[next].id.0) != 0 {
                    continue;
                }
                if !self.nodes[next].is_source() {
                    for channel in 0..CHANNELS {
                        if self.nodes[key].is_saturated(channel) {
                            let relayed = self.nodes[key].flow[channel];
                            self.nodes[next].flow[channel] += relayed;
                        }
                    }
                }
                self.spread(next, visited);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Win detection
    // -----------------------------------------------------------------------

    /// Refresh the cached per-sink fill shares. A sink's share is its
    /// fraction of all sink flow, scaled by the fraction of the four
    /// channels feeding it, so it reaches one exactly when that sink alone
    /// drains every routed source. All shares are zero while no sink is fed.
    fn update_shares(&mut self) {
        let total: u32 = self.sinks.iter().map(|&k| self.nodes[k].flow_sum()).sum();
        for (i, &key) in self.sinks.iter().enumerate() {
            let node = &self.nodes[key];
            self.shares[i] =
                ratio(node.flow_sum(), total) * ratio(node.total_flow(), SINK_COUNT as u32);
        }
    }

    /// The winning sink index, if the current wiring routes all four
    /// sources into exactly one sink with nothing leaking into the others.
    pub fn winner(&self) -> Option<usize> {
        self.shares.iter().position(|s| *s == Fixed64::ONE)
    }

    /// Fill level of one sink in `[0, 1]`, for progress-bar rendering.
    pub fn sink_fill_share(&self, sink: usize) -> Result<Fixed64, BoardError> {
        self.shares
            .get(sink)
            .copied()
            .ok_or(BoardError::UnknownSink(sink))
    }

    // -----------------------------------------------------------------------
    // Read accessors for the hosting game
    // -----------------------------------------------------------------------

    /// The connector with the given stable id.
    pub fn connector(&self, id: ConnectorId) -> Result<&Connector, BoardError> {
        self.connector_order
            .get(id.0)
            .map(|&k| &self.connectors[k])
            .ok_or(BoardError::UnknownConnector(id))
    }

    /// The node with the given stable id.
    pub fn node(&self, id: NodeId) -> Result<&Node, BoardError> {
        self.node_order
            .get(id.0)
            .map(|&k| &self.nodes[k])
            .ok_or(BoardError::UnknownNode(id))
    }

    /// Current orientation of a connector, for sprite selection.
    pub fn orientation(&self, id: ConnectorId) -> Result<Orientation, BoardError> {
        self.connector(id).map(|c| c.orientation())
    }

    /// Whether a connector is currently fused with its bridge partner.
    pub fn bridged(&self, id: ConnectorId) -> Result<bool, BoardError> {
        self.connector(id).map(|c| c.bridged())
    }

    /// Per-channel flow of a node, for rendering.
    pub fn flow(&self, id: NodeId) -> Result<[u32; CHANNELS], BoardError> {
        self.node(id).map(|n| n.flow)
    }

    /// Whether any channel flows through a node, for the wet-sprite
    /// animation.
    pub fn is_wet(&self, id: NodeId) -> Result<bool, BoardError> {
        self.node(id).map(|n| n.is_wet())
    }

    /// Stable ids of the nodes currently reachable through a connector in
    /// one hop.
    pub fn open_node_ids(&self, id: ConnectorId) -> Result<Vec<NodeId>, BoardError> {
        let connector = self.connector(id)?;
        Ok(connector
            .open_nodes()
            .iter()
            .map(|&k| self.nodes[k].id)
            .collect())
    }

    /// Stable ids of the connectors currently wired to a node.
    pub fn incident_ids(&self, id: NodeId) -> Result<Vec<ConnectorId>, BoardError> {
        let node = self.node(id)?;
        Ok(node
            .incident_edges()
            .iter()
            .map(|&k| self.connectors[k].id)
            .collect())
    }

    /// Iterate nodes in stable-id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().map(|&k| &self.nodes[k])
    }

    /// Iterate connectors in stable-id order.
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connector_order.iter().map(|&k| &self.connectors[k])
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_has_fixed_counts_and_roles() {
        let board = Board::new();
        assert_eq!(board.nodes().count(), NODE_COUNT);
        assert_eq!(board.connectors().count(), CONNECTOR_COUNT);

        for node in board.nodes() {
            let expected = match node.id.0 {
                0..=3 => NodeRole::Source(node.id.0),
                33..=36 => NodeRole::Sink(node.id.0 - 33),
                _ => NodeRole::Junction,
            };
            assert_eq!(node.role, expected);
        }
    }

    #[test]
    fn initial_orientations_match_the_layout() {
        let board = Board::new();
        for (id, spec) in LAYOUT.iter().enumerate() {
            assert_eq!(
                board.orientation(ConnectorId(id)).unwrap().bits(),
                spec.orientation,
                "connector {id}"
            );
        }
    }

    #[test]
    fn no_bridge_pair_starts_fused() {
        let board = Board::new();
        for connector in board.connectors() {
            assert!(!connector.bridged(), "connector {:?}", connector.id);
        }
    }

    #[test]
    fn initial_open_sets_match_open_sides() {
        let board = Board::new();
        for (id, spec) in LAYOUT.iter().enumerate() {
            let mut expected: Vec<usize> = Side::ALL
                .into_iter()
                .filter(|s| spec.orientation & s.bit() != 0)
                .filter_map(|s| spec.endpoints[s.index()])
                .collect();
            expected.sort_unstable();
            let mut open: Vec<usize> = board
                .open_node_ids(ConnectorId(id))
                .unwrap()
                .iter()
                .map(|n| n.0)
                .collect();
            open.sort_unstable();
            assert_eq!(open, expected, "connector {id}");
        }
    }

    #[test]
    fn node_adjacency_mirrors_connector_open_sets() {
        let board = Board::new();
        for node in board.nodes() {
            for connector in board.connectors() {
                let touches = connector
                    .open_nodes()
                    .iter()
                    .any(|&k| board.nodes[k].id == node.id);
                let key = board.connector_order[connector.id.0];
                let listed = node.incident_edges().contains(&key);
                assert_eq!(touches, listed, "node {:?} / {:?}", node.id, connector.id);
            }
        }
    }

    #[test]
    fn initial_board_has_no_winner_and_zero_shares() {
        let board = Board::new();
        assert_eq!(board.winner(), None);
        for sink in 0..SINK_COUNT {
            assert_eq!(board.sink_fill_share(sink).unwrap(), Fixed64::ZERO);
        }
    }

    #[test]
    fn sources_hold_exactly_their_own_channel() {
        let board = Board::new();
        for channel in 0..SOURCE_COUNT {
            let flow = board.flow(NodeId(channel)).unwrap();
            for c in 0..CHANNELS {
                assert_eq!(flow[c], u32::from(c == channel));
            }
        }
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let mut board = Board::new();
        assert!(matches!(
            board.rotate(ConnectorId(CONNECTOR_COUNT)),
            Err(BoardError::UnknownConnector(_))
        ));
        assert!(matches!(
            board.orientation(ConnectorId(99)),
            Err(BoardError::UnknownConnector(_))
        ));
        assert!(matches!(
            board.flow(NodeId(NODE_COUNT)),
            Err(BoardError::UnknownNode(_))
        ));
        assert!(matches!(
            board.sink_fill_share(SINK_COUNT),
            Err(BoardError::UnknownSink(_))
        ));
    }

    #[test]
    fn failed_rotate_mutates_nothing() {
        let mut board = Board::new();
        let before: Vec<u8> = board.connectors().map(|c| c.orientation().bits()).collect();
        let flows: Vec<[u32; CHANNELS]> = board.nodes().map(|n| n.flow).collect();
        board.rotate(ConnectorId(usize::MAX)).unwrap_err();
        let after: Vec<u8> = board.connectors().map(|c| c.orientation().bits()).collect();
        let flows_after: Vec<[u32; CHANNELS]> = board.nodes().map(|n| n.flow).collect();
        assert_eq!(before, after);
        assert_eq!(flows, flows_after);
    }

    #[test]
    fn rotate_changes_exactly_one_orientation() {
        let mut board = Board::new();
        let before: Vec<u8> = board.connectors().map(|c| c.orientation().bits()).collect();
        board.rotate(ConnectorId(5)).unwrap();
        let after: Vec<u8> = board.connectors().map(|c| c.orientation().bits()).collect();
        for id in 0..CONNECTOR_COUNT {
            if id == 5 {
                assert_eq!(after[id], ((before[id] << 1) | (before[id] >> 3)) & 0b1111);
                assert_ne!(after[id], before[id]);
            } else {
                assert_eq!(after[id], before[id], "connector {id}");
            }
        }
    }
}
