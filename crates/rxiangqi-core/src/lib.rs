//! Xiangqi rule engine and game model
//!
//! The crate is layered bottom-up: plain value types ([`types`]), the
//! fixed 32-piece roster ([`piece`]), the mutable position with movement
//! rules and both notations ([`board`]), the branching move tree
//! ([`moves`]) and the composition root tying one game together
//! ([`instance`]).

pub mod board;
pub mod error;
pub mod instance;
pub mod moves;
pub mod piece;
pub mod types;

pub use board::{Board, ChangeSide, FenError, ZhError, EMPTY_CHAR, START_FEN};
pub use error::CoreError;
pub use instance::{coord_text, parse_coord, Instance, Metadata, TreeStats};
pub use moves::{MoveId, MoveNode, MoveTree};
pub use piece::{Piece, PieceId, ROSTER};
pub use types::{Color, PieceKind, Seat};
