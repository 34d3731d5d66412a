//! Library error types

use crate::board::{FenError, ZhError};
use crate::types::Seat;

/// Errors raised by the core rule engine and codecs
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A move whose destination is not in the legal set for its source
    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: Seat, to: Seat },

    /// Position buffer of the wrong length
    #[error("position buffer holds {0} entries, expected 90")]
    BadPositionBuffer(usize),

    /// Glyph with no unplaced roster piece left
    #[error("no roster piece available for glyph '{0}'")]
    UnknownGlyph(char),

    /// Coordinate move text that does not scan
    #[error("malformed coordinate move text: {0}")]
    BadCoord(String),

    /// A tree node with neither seats nor any notation to resolve them from
    #[error("move node {0} carries neither seats nor notation")]
    UnresolvedMove(usize),

    #[error(transparent)]
    Fen(#[from] FenError),

    #[error(transparent)]
    Zh(#[from] ZhError),
}
