//! FEN projection of the 90-entry position buffer
//!
//! Ranks are listed top (black edge) to bottom, '/'-separated, with
//! run-length-encoded empty runs. Only the placement field is modeled;
//! clocks and side-to-move belong to the metadata collaborator.

use crate::types::{PieceKind, Seat};

use super::EMPTY_CHAR;

/// Standard opening position
pub const START_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR";

/// FEN parsing failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 10 ranks, got {0}")]
    RankCount(usize),
    #[error("rank {0} does not cover 9 columns")]
    RankWidth(usize),
    #[error("unknown piece character: {0}")]
    UnknownChar(char),
}

/// Expand FEN text into a 90-char position buffer in seat-index order
pub fn fen_to_chars(fen: &str) -> Result<String, FenError> {
    let placement = fen.split_whitespace().next().unwrap_or("");
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != Seat::ROW_NUM as usize {
        return Err(FenError::RankCount(ranks.len()));
    }
    let mut chars = vec![EMPTY_CHAR; Seat::NUM];
    for (i, rank) in ranks.iter().enumerate() {
        // FEN rank 0 is the top row (row index 9).
        let row = Seat::ROW_NUM as usize - 1 - i;
        let mut col = 0usize;
        for c in rank.chars() {
            if let Some(n) = c.to_digit(10) {
                col += n as usize;
            } else if PieceKind::from_fen_char(c).is_some() {
                if col >= Seat::COL_NUM as usize {
                    return Err(FenError::RankWidth(i));
                }
                chars[row * 9 + col] = c;
                col += 1;
            } else {
                return Err(FenError::UnknownChar(c));
            }
        }
        if col != Seat::COL_NUM as usize {
            return Err(FenError::RankWidth(i));
        }
    }
    Ok(chars.into_iter().collect())
}

/// Compress a 90-char position buffer into FEN text
pub fn chars_to_fen(chars: &str) -> String {
    let cells: Vec<char> = chars.chars().collect();
    let mut ranks = Vec::with_capacity(10);
    for row in (0..Seat::ROW_NUM as usize).rev() {
        let mut rank = String::new();
        let mut empty = 0u32;
        for col in 0..Seat::COL_NUM as usize {
            let c = cells.get(row * 9 + col).copied().unwrap_or(EMPTY_CHAR);
            if c == EMPTY_CHAR {
                empty += 1;
            } else {
                if empty > 0 {
                    rank.push_str(&empty.to_string());
                    empty = 0;
                }
                rank.push(c);
            }
        }
        if empty > 0 {
            rank.push_str(&empty.to_string());
        }
        ranks.push(rank);
    }
    ranks.join("/")
}
