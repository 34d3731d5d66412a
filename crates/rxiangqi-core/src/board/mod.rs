//! Board: piece placement, movement legality, notation codecs

mod fen;
mod rules;
mod zh;

pub use fen::{chars_to_fen, fen_to_chars, FenError, START_FEN};
pub use zh::ZhError;

use crate::error::CoreError;
use crate::piece::{Piece, PieceId};
use crate::types::{Color, PieceKind, Seat};

/// Marker for an unoccupied seat in a position buffer
pub const EMPTY_CHAR: char = '_';

/// The kind of side transform applied by [`Board::change_side`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSide {
    /// Swap every piece for its opposite-color counterpart in place
    Exchange,
    /// Rotate the whole position 180 degrees
    Rotate,
    /// Mirror columns, rows unchanged
    Symmetry,
}

/// Board state: 90 seats, each optionally referencing one roster piece.
///
/// A piece is live iff exactly one seat references it; captured pieces keep
/// their identity off-board so that undo can restore them exactly.
#[derive(Debug, Clone)]
pub struct Board {
    seats: [Option<PieceId>; 90],
    piece_seats: [Option<Seat>; 32],
    bottom_color: Color,
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    /// Empty board
    pub fn new() -> Board {
        Board {
            seats: [None; 90],
            piece_seats: [None; 32],
            bottom_color: Color::Red,
        }
    }

    /// Which color's king occupies the lower half
    #[inline]
    pub fn bottom_color(&self) -> Color {
        self.bottom_color
    }

    /// Occupant of a seat, if any
    #[inline]
    pub fn occupant(&self, seat: Seat) -> Option<PieceId> {
        self.seats[seat.index()]
    }

    /// Piece on a seat, if any
    #[inline]
    pub fn piece_at(&self, seat: Seat) -> Option<Piece> {
        self.occupant(seat).map(|id| id.piece())
    }

    /// Seat of a live piece (`None` while captured)
    #[inline]
    pub fn seat_of(&self, id: PieceId) -> Option<Seat> {
        self.piece_seats[id.index()]
    }

    /// Seat of the given color's king
    pub fn king_seat(&self, color: Color) -> Option<Seat> {
        PieceId::all()
            .filter(|id| {
                let p = id.piece();
                p.color == color && p.kind == PieceKind::King
            })
            .find_map(|id| self.seat_of(id))
    }

    /// Live seats holding pieces of one color
    pub fn color_seats(&self, color: Color) -> Vec<Seat> {
        Seat::all()
            .filter(|&s| self.piece_at(s).is_some_and(|p| p.color == color))
            .collect()
    }

    /// Live seats holding pieces of one color and kind, sorted by row
    pub fn kind_seats(&self, color: Color, kind: PieceKind) -> Vec<Seat> {
        let mut seats: Vec<Seat> = Seat::all()
            .filter(|&s| {
                self.piece_at(s)
                    .is_some_and(|p| p.color == color && p.kind == kind)
            })
            .collect();
        seats.sort_by_key(|s| (s.row(), s.col()));
        seats
    }

    /// Rebuild the position from a 90-entry buffer, one glyph (or
    /// [`EMPTY_CHAR`]) per seat in index order.
    ///
    /// Each glyph claims the first not-yet-placed roster piece with that
    /// glyph; roster order is the documented tie-break for twins.
    pub fn reset(&mut self, piece_chars: &str) -> Result<(), CoreError> {
        let chars: Vec<char> = piece_chars.chars().collect();
        if chars.len() != Seat::NUM {
            return Err(CoreError::BadPositionBuffer(chars.len()));
        }
        let mut seats = [None; 90];
        let mut used = [false; 32];
        for (i, &c) in chars.iter().enumerate() {
            if c == EMPTY_CHAR {
                continue;
            }
            let id = PieceId::all()
                .find(|id| !used[id.index()] && id.piece().glyph() == c)
                .ok_or(CoreError::UnknownGlyph(c))?;
            used[id.index()] = true;
            seats[i] = Some(id);
        }
        self.seats = seats;
        self.rebuild_piece_seats();
        self.recompute_bottom_color();
        Ok(())
    }

    /// Exact inverse projection of [`reset`](Self::reset)
    pub fn piece_chars(&self) -> String {
        self.seats
            .iter()
            .map(|o| o.map_or(EMPTY_CHAR, |id| id.piece().glyph()))
            .collect()
    }

    /// Rebuild from rank-major FEN text
    pub fn reset_fen(&mut self, fen: &str) -> Result<(), CoreError> {
        let chars = fen_to_chars(fen)?;
        self.reset(&chars)
    }

    /// Rank-major FEN projection of the position
    pub fn to_fen(&self) -> String {
        chars_to_fen(&self.piece_chars())
    }

    /// Move the occupant of `from` to `to`, returning any captured piece.
    /// No legality check; callers stage arbitrary positions during decode.
    pub fn move_piece(&mut self, from: Seat, to: Seat) -> Option<PieceId> {
        let mover = self.seats[from.index()].take();
        let captured = self.seats[to.index()].take();
        if let Some(id) = captured {
            self.piece_seats[id.index()] = None;
        }
        if let Some(id) = mover {
            self.piece_seats[id.index()] = Some(to);
        }
        self.seats[to.index()] = mover;
        captured
    }

    /// Exact inverse of [`move_piece`](Self::move_piece): the mover returns
    /// to `from` and the identical captured piece, if any, to `to`.
    pub fn undo_move(&mut self, from: Seat, to: Seat, captured: Option<PieceId>) {
        let mover = self.seats[to.index()].take();
        if let Some(id) = mover {
            self.piece_seats[id.index()] = Some(from);
        }
        self.seats[from.index()] = mover;
        self.seats[to.index()] = captured;
        if let Some(id) = captured {
            self.piece_seats[id.index()] = Some(to);
        }
    }

    /// Raw destination candidates for the occupant of `seat`, before
    /// same-color and check-exposure filtering. Empty when unoccupied.
    pub fn raw_moves(&self, seat: Seat) -> Vec<Seat> {
        rules::raw_moves(self, seat)
    }

    /// Fully legal destinations: raw candidates minus same-color seats and
    /// minus every move that would leave the mover's own king in check.
    pub fn legal_moves(&mut self, seat: Seat) -> Vec<Seat> {
        let Some(piece) = self.piece_at(seat) else {
            return Vec::new();
        };
        let color = piece.color;
        let candidates: Vec<Seat> = self
            .raw_moves(seat)
            .into_iter()
            .filter(|&to| !self.piece_at(to).is_some_and(|p| p.color == color))
            .collect();
        candidates
            .into_iter()
            .filter(|&to| {
                let captured = self.move_piece(seat, to);
                let killed = self.is_killed(color);
                self.undo_move(seat, to, captured);
                !killed
            })
            .collect()
    }

    /// Is the given color's king in check (or facing the enemy king)?
    pub fn is_killed(&self, color: Color) -> bool {
        rules::is_killed(self, color)
    }

    /// Is the given color out of legal moves? Covers both checkmate and
    /// the stalemate-is-a-loss rule; callers must not distinguish them.
    pub fn is_died(&mut self, color: Color) -> bool {
        for seat in self.color_seats(color) {
            if !self.legal_moves(seat).is_empty() {
                return false;
            }
        }
        true
    }

    /// Apply a side transform to the placement only. Move trees recorded
    /// against this board must be remapped by the caller for `Rotate` and
    /// `Symmetry` (see `Instance::change_side`).
    pub fn change_side(&mut self, kind: ChangeSide) {
        let mut seats = [None; 90];
        match kind {
            ChangeSide::Exchange => {
                for (i, o) in self.seats.iter().enumerate() {
                    seats[i] = o.map(PieceId::mate);
                }
            }
            ChangeSide::Rotate => {
                for (i, &o) in self.seats.iter().enumerate() {
                    seats[89 - i] = o;
                }
            }
            ChangeSide::Symmetry => {
                for (i, &o) in self.seats.iter().enumerate() {
                    let s = Seat::from_u8(i as u8).map(Seat::mirror);
                    if let Some(s) = s {
                        seats[s.index()] = o;
                    }
                }
            }
        }
        self.seats = seats;
        self.rebuild_piece_seats();
        self.recompute_bottom_color();
    }

    fn rebuild_piece_seats(&mut self) {
        self.piece_seats = [None; 32];
        for seat in Seat::all() {
            if let Some(id) = self.seats[seat.index()] {
                self.piece_seats[id.index()] = Some(seat);
            }
        }
    }

    fn recompute_bottom_color(&mut self) {
        if let Some(seat) = self.king_seat(Color::Red) {
            self.bottom_color = if seat.row() < 5 { Color::Red } else { Color::Black };
        }
    }
}
