//! Compass sides and the 4-bit orientation mask of a connector.
//!
//! The orientation *is* the connector's rotation state: one bit per compass
//! side, set when that side is currently open. Rotating moves every set bit
//! to the next side clockwise, so any connector cycles through exactly four
//! positions before repeating.

use serde::{Deserialize, Serialize};

/// Number of compass sides on a connector.
pub const SIDE_COUNT: usize = 4;

/// One of the four compass sides of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    /// All four sides in bit order (north is bit 0).
    pub const ALL: [Side; SIDE_COUNT] = [Side::North, Side::East, Side::South, Side::West];

    /// Bit index of this side in an orientation mask.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::East => 1,
            Side::South => 2,
            Side::West => 3,
        }
    }

    /// Single-bit mask for this side.
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self.index()
    }

    /// The side whose mask equals `bit`. `bit` must have exactly one of the
    /// four low bits set; callers derive it from an orientation delta.
    pub(crate) fn from_bit(bit: u8) -> Side {
        match bit {
            0b0001 => Side::North,
            0b0010 => Side::East,
            0b0100 => Side::South,
            0b1000 => Side::West,
            _ => unreachable!("not a single side bit: {bit:#06b}"),
        }
    }
}

/// A 4-bit mask over compass sides: which sides of a connector are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Orientation(u8);

/// A straight-through piece open north and south. The one rotation case
/// where all four delta bits flip at once.
pub(crate) const STRAIGHT_NS: Orientation =
    Orientation::from_bits(Side::North.bit() | Side::South.bit());

impl Orientation {
    /// Build an orientation from raw side bits. Between one and four bits
    /// must be set; the open-side count is fixed for a connector's lifetime.
    pub const fn from_bits(bits: u8) -> Self {
        assert!(bits != 0 && bits <= 0b1111, "orientation needs 1-4 side bits");
        Orientation(bits)
    }

    /// Raw side bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the given side is open.
    #[inline]
    pub const fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    /// Number of open sides, 1-4.
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// One quarter-turn clockwise: every open side moves N -> E -> S -> W -> N.
    #[inline]
    pub const fn rotated_cw(self) -> Self {
        Orientation(((self.0 << 1) | (self.0 >> 3)) & 0b1111)
    }

    /// Bitwise difference against another orientation.
    #[inline]
    pub const fn delta(self, other: Orientation) -> u8 {
        self.0 ^ other.0
    }

    /// The open sides, in bit order.
    pub fn open_sides(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}
