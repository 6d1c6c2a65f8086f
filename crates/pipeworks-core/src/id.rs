use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Arena key for a node (junction point) on the board.
    pub struct NodeKey;

    /// Arena key for a connector (rotatable pipe segment).
    pub struct ConnectorKey;
}

/// Stable small-integer id of a node, assigned once at board construction
/// and never reused. Doubles as the node's visited-bit index during
/// traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Stable small-integer id of a connector. The hosting game's input
/// dispatch resolves clicked hotspots to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectorId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_ids_compare_by_value() {
        assert_eq!(ConnectorId(3), ConnectorId(3));
        assert_ne!(ConnectorId(3), ConnectorId(4));
        assert_eq!(NodeId(0), NodeId(0));
    }

    #[test]
    fn arena_keys_are_distinct_per_insert() {
        let mut arena = slotmap::SlotMap::<NodeKey, ()>::with_key();
        let a = arena.insert(());
        let b = arena.insert(());
        assert_ne!(a, b);
    }
}
