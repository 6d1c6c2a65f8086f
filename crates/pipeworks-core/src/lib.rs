//! Pipeworks Core -- the connectivity and flow engine for a rotatable-pipe
//! network puzzle.
//!
//! A fixed board of 37 junction points is joined by 21 rotatable pipe
//! segments. Each player action rotates one connector a quarter-turn
//! clockwise, which rewires the graph: the connector gains and loses
//! endpoints, and bridge pairs that come to face each other fuse into a
//! single traversal edge. After every rotation the board recomputes, from
//! scratch, which nodes each of the four sources reaches and whether one
//! sink now drains all four.
//!
//! # Key Types
//!
//! - [`board::Board`] -- composition root; owns the node and connector
//!   arenas and exposes [`board::Board::rotate`],
//!   [`board::Board::winner`], and [`board::Board::sink_fill_share`].
//! - [`connector::Connector`] -- graph edge with a rotatable 4-bit
//!   [`orientation::Orientation`] and an optional bridge pairing.
//! - [`node::Node`] -- graph vertex with per-channel flow accumulators and
//!   the live adjacency list used by traversal.
//! - [`fixed::Fixed64`] -- Q32.32 fixed point for exact fill-share math.
//!
//! The engine is single threaded and synchronous. The hosting puzzle screen
//! serializes player input; every operation is total over the fixed board
//! and completes before returning.

pub mod board;
pub mod connector;
pub mod fixed;
pub mod id;
pub mod node;
pub mod orientation;
