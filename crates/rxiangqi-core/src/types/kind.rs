//! Piece kinds and their capability flags

use super::Color;

/// The seven piece kinds. The set is closed: movement rules dispatch over
/// this enum through a fixed table, so no new kind can appear by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum PieceKind {
    King = 0,
    Advisor = 1,
    Bishop = 2,
    Knight = 3,
    Rook = 4,
    Cannon = 5,
    Pawn = 6,
}

impl PieceKind {
    /// Number of kinds
    pub const NUM: usize = 7;

    /// All kinds in roster order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::King,
        PieceKind::Advisor,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Rook,
        PieceKind::Cannon,
        PieceKind::Pawn,
    ];

    /// Index for table dispatch
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Strong pieces can attack across the board and come in multiples:
    /// knight, rook, cannon, pawn. Only they ever need an ordinal prefix
    /// in ideographic notation.
    #[inline]
    pub const fn is_strong(self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Rook | PieceKind::Cannon | PieceKind::Pawn
        )
    }

    /// Line movers travel along ranks and files (king, rook, cannon, pawn);
    /// the rest move diagonally.
    #[inline]
    pub const fn is_line_mover(self) -> bool {
        matches!(
            self,
            PieceKind::King | PieceKind::Rook | PieceKind::Cannon | PieceKind::Pawn
        )
    }

    /// FEN letter, uppercase for red and lowercase for black
    #[inline]
    pub const fn fen_char(self, color: Color) -> char {
        let c = match self {
            PieceKind::King => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Rook => 'R',
            PieceKind::Cannon => 'C',
            PieceKind::Pawn => 'P',
        };
        match color {
            Color::Red => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    /// Parse a FEN letter; the case selects the color
    pub fn from_fen_char(c: char) -> Option<(Color, PieceKind)> {
        let color = if c.is_ascii_uppercase() { Color::Red } else { Color::Black };
        let kind = match c.to_ascii_uppercase() {
            'K' => PieceKind::King,
            'A' => PieceKind::Advisor,
            'B' => PieceKind::Bishop,
            'N' => PieceKind::Knight,
            'R' => PieceKind::Rook,
            'C' => PieceKind::Cannon,
            'P' => PieceKind::Pawn,
            _ => return None,
        };
        Some((color, kind))
    }

    /// Ideographic piece name as printed in traditional move text
    #[inline]
    pub const fn name_char(self, color: Color) -> char {
        match (color, self) {
            (Color::Red, PieceKind::King) => '帅',
            (Color::Red, PieceKind::Advisor) => '仕',
            (Color::Red, PieceKind::Bishop) => '相',
            (Color::Red, PieceKind::Pawn) => '兵',
            (Color::Black, PieceKind::King) => '将',
            (Color::Black, PieceKind::Advisor) => '士',
            (Color::Black, PieceKind::Bishop) => '象',
            (Color::Black, PieceKind::Pawn) => '卒',
            // Knight, rook and cannon share one name on both sides.
            (_, PieceKind::Knight) => '马',
            (_, PieceKind::Rook) => '车',
            (_, PieceKind::Cannon) => '炮',
        }
    }

    /// Inverse of [`name_char`](Self::name_char). Shared names (knight,
    /// rook, cannon) match either color argument.
    pub fn from_name_char(c: char, color: Color) -> Option<PieceKind> {
        PieceKind::ALL.iter().copied().find(|&k| k.name_char(color) == c)
    }
}
