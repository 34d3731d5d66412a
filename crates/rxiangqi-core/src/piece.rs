//! The fixed 32-piece roster

use crate::types::{Color, PieceKind};

/// Immutable piece identity. Pieces are never created or destroyed during
/// play; being on or off the board is a property of the seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Piece {
        Piece { color, kind }
    }

    /// FEN display glyph
    #[inline]
    pub const fn glyph(self) -> char {
        self.kind.fen_char(self.color)
    }

    /// Ideographic name
    #[inline]
    pub const fn name_char(self) -> char {
        self.kind.name_char(self.color)
    }
}

/// Handle into [`ROSTER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PieceId(u8);

impl PieceId {
    /// Number of roster pieces
    pub const NUM: usize = 32;

    #[inline]
    pub const fn from_u8(n: u8) -> Option<PieceId> {
        if n < 32 { Some(PieceId(n)) } else { None }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The piece this handle names
    #[inline]
    pub const fn piece(self) -> Piece {
        ROSTER[self.0 as usize]
    }

    /// Same-kind piece of the opposite color (ids 0-15 are red, 16-31
    /// black, in identical kind order)
    #[inline]
    pub const fn mate(self) -> PieceId {
        PieceId(self.0 ^ 16)
    }

    /// All roster handles in order
    pub fn all() -> impl Iterator<Item = PieceId> {
        (0..32).map(PieceId)
    }
}

const fn side(color: Color) -> [Piece; 16] {
    // Matches the legacy binary's piece table order:
    // R N B A K A B N R C C P P P P P
    [
        Piece::new(color, PieceKind::Rook),
        Piece::new(color, PieceKind::Knight),
        Piece::new(color, PieceKind::Bishop),
        Piece::new(color, PieceKind::Advisor),
        Piece::new(color, PieceKind::King),
        Piece::new(color, PieceKind::Advisor),
        Piece::new(color, PieceKind::Bishop),
        Piece::new(color, PieceKind::Knight),
        Piece::new(color, PieceKind::Rook),
        Piece::new(color, PieceKind::Cannon),
        Piece::new(color, PieceKind::Cannon),
        Piece::new(color, PieceKind::Pawn),
        Piece::new(color, PieceKind::Pawn),
        Piece::new(color, PieceKind::Pawn),
        Piece::new(color, PieceKind::Pawn),
        Piece::new(color, PieceKind::Pawn),
    ]
}

/// The full roster: red pieces at indexes 0-15, black at 16-31.
pub const ROSTER: [Piece; 32] = {
    let red = side(Color::Red);
    let black = side(Color::Black);
    let mut all = [red[0]; 32];
    let mut i = 0;
    while i < 16 {
        all[i] = red[i];
        all[i + 16] = black[i];
        i += 1;
    }
    all
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_census() {
        let count = |color: Color, kind: PieceKind| {
            ROSTER.iter().filter(|p| p.color == color && p.kind == kind).count()
        };
        for color in [Color::Red, Color::Black] {
            assert_eq!(count(color, PieceKind::King), 1);
            assert_eq!(count(color, PieceKind::Advisor), 2);
            assert_eq!(count(color, PieceKind::Bishop), 2);
            assert_eq!(count(color, PieceKind::Knight), 2);
            assert_eq!(count(color, PieceKind::Rook), 2);
            assert_eq!(count(color, PieceKind::Cannon), 2);
            assert_eq!(count(color, PieceKind::Pawn), 5);
        }
    }

    #[test]
    fn test_piece_id_mate() {
        for id in PieceId::all() {
            let mate = id.mate();
            assert_eq!(mate.piece().kind, id.piece().kind);
            assert_eq!(mate.piece().color, id.piece().color.opponent());
            assert_eq!(mate.mate(), id);
        }
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(Piece::new(Color::Red, PieceKind::King).glyph(), 'K');
        assert_eq!(Piece::new(Color::Black, PieceKind::Pawn).glyph(), 'p');
        assert_eq!(Piece::new(Color::Black, PieceKind::King).name_char(), '将');
    }
}
