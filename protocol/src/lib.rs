//! Wire-level types shared between the session controller and the online Go
//! server it connects to, plus the coordinate conversion helpers needed to
//! speak GTP vertices. This crate has no I/O of its own: it only describes
//! shapes and pure conversions, so it stays usable from both the engine
//! adapter and the bot binary without pulling in tokio.

pub mod board;
pub mod rejection;
pub mod wire;

pub use board::{Color, Move, Vertex};
pub use rejection::{RejectionCode, RejectionDetails};
