//! Board cell (Seat)

use std::fmt;

/// One of the 90 board cells.
///
/// Layout: `index = row * 9 + col`, row 0 at the bottom (red edge),
/// column 0 on the left of a standard diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Seat(u8);

impl Seat {
    /// Number of seats
    pub const NUM: usize = 90;
    /// Number of rows
    pub const ROW_NUM: u8 = 10;
    /// Number of columns
    pub const COL_NUM: u8 = 9;

    /// Build from row (0-9) and column (0-8)
    #[inline]
    pub const fn new(row: u8, col: u8) -> Seat {
        Seat(row * 9 + col)
    }

    /// Row, 0 at the bottom
    #[inline]
    pub const fn row(self) -> u8 {
        self.0 / 9
    }

    /// Column, 0 on the left
    #[inline]
    pub const fn col(self) -> u8 {
        self.0 % 9
    }

    /// Index for array access
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Build from a linear index with range check
    #[inline]
    pub const fn from_u8(n: u8) -> Option<Seat> {
        if n < 90 { Some(Seat(n)) } else { None }
    }

    /// 180-degree rotation
    #[inline]
    pub const fn rotate(self) -> Seat {
        Seat(89 - self.0)
    }

    /// Left-right mirror (column flip, row unchanged)
    #[inline]
    pub const fn mirror(self) -> Seat {
        Seat(self.0 / 9 * 9 + (8 - self.0 % 9))
    }

    /// Signed neighbor; `None` when it walks off the board
    #[inline]
    pub fn offset(self, drow: i8, dcol: i8) -> Option<Seat> {
        let row = self.row() as i8 + drow;
        let col = self.col() as i8 + dcol;
        if (0..10).contains(&row) && (0..9).contains(&col) {
            Some(Seat::new(row as u8, col as u8))
        } else {
            None
        }
    }

    /// Coordinate notation: file letter 'a'-'i' plus rank digit '0'-'9'
    pub fn to_coord(self) -> String {
        let file = (b'a' + self.col()) as char;
        let rank = (b'0' + self.row()) as char;
        format!("{file}{rank}")
    }

    /// Parse coordinate notation ("a0".."i9")
    pub fn from_coord(s: &str) -> Option<Seat> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let col = (file as u8).wrapping_sub(b'a');
        let row = (rank as u8).wrapping_sub(b'0');
        if col < 9 && row < 10 { Some(Seat::new(row, col)) } else { None }
    }

    /// All seats in index order
    pub fn all() -> impl Iterator<Item = Seat> {
        (0..90).map(Seat)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_coord())
    }
}
