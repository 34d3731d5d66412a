//! Ideographic (traditional) move notation
//!
//! Four characters: piece name (or ordinal prefix + name), direction
//! glyph, destination digit. Files are numbered 1-9 from each mover's own
//! right; red uses 一..九, black uses the fullwidth digits.

use crate::types::{Color, PieceKind, Seat};

use super::Board;

/// Ideographic decode failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ZhError {
    /// Text does not scan as a four-character move
    #[error("malformed ideographic move text: {0}")]
    Malformed(String),
    /// No piece (or no unique piece) satisfies the description
    #[error("empty or ambiguous candidate set for: {0}")]
    Candidate(String),
    /// Ordinal prefix points outside the candidate list
    #[error("ordinal index {index} out of range for {count} candidates")]
    OutOfRange { index: usize, count: usize },
}

const NUM_CHARS: [[char; 9]; 2] = [
    ['一', '二', '三', '四', '五', '六', '七', '八', '九'],
    ['１', '２', '３', '４', '５', '６', '７', '８', '９'],
];

fn num_char(color: Color, index: usize) -> char {
    NUM_CHARS[color.index()][index]
}

fn num_index(color: Color, c: char) -> Option<usize> {
    NUM_CHARS[color.index()].iter().position(|&n| n == c)
}

fn color_of_digit(c: char) -> Option<Color> {
    for color in [Color::Red, Color::Black] {
        if NUM_CHARS[color.index()].contains(&c) {
            return Some(color);
        }
    }
    None
}

/// File digit for a column, counted from the mover's own right
fn file_char(color: Color, is_bottom: bool, col: u8) -> char {
    let index = if is_bottom { 8 - col } else { col };
    num_char(color, index as usize)
}

fn col_of_file(color: Color, is_bottom: bool, c: char) -> Option<u8> {
    let index = num_index(color, c)? as u8;
    Some(if is_bottom { 8 - index } else { index })
}

/// Ordinal prefix for `index` among `count` like pieces, front first
fn ordinal_char(color: Color, count: usize, index: usize) -> Result<char, ZhError> {
    match count {
        2 => Ok(['前', '后'][index]),
        3 => Ok(['前', '中', '后'][index]),
        4 | 5 => Ok(num_char(color, index)),
        _ => Err(ZhError::OutOfRange { index, count }),
    }
}

fn ordinal_index(color: Color, c: char, count: usize) -> Result<usize, ZhError> {
    let found = match count {
        2 => ['前', '后'].iter().position(|&p| p == c),
        3 => ['前', '中', '后'].iter().position(|&p| p == c),
        4 | 5 => num_index(color, c).filter(|&i| i < count),
        _ => None,
    };
    found.ok_or(ZhError::OutOfRange { index: count, count })
}

impl Board {
    /// Live pawns of one color collected across all files: groups of two
    /// or more per file, concatenated in file order, rows ascending.
    fn pawn_ordinal_seats(&self, color: Color) -> Vec<Seat> {
        let pawns = self.kind_seats(color, PieceKind::Pawn);
        let mut out = Vec::new();
        for col in 0..Seat::COL_NUM {
            let group: Vec<Seat> = pawns.iter().copied().filter(|s| s.col() == col).collect();
            if group.len() > 1 {
                out.extend(group);
            }
        }
        out
    }

    /// Encode a seat pair as ideographic move text for the current position
    pub fn zh_text(&self, from: Seat, to: Seat) -> Result<String, ZhError> {
        let piece = self
            .piece_at(from)
            .ok_or_else(|| ZhError::Candidate(from.to_coord()))?;
        let (color, kind) = (piece.color, piece.kind);
        let is_bottom = color == self.bottom_color();
        let same: Vec<Seat> = self
            .kind_seats(color, kind)
            .into_iter()
            .filter(|s| s.col() == from.col())
            .collect();
        let mut text = String::with_capacity(12);
        if same.len() > 1 && kind.is_strong() {
            let mut ordered = if kind == PieceKind::Pawn {
                self.pawn_ordinal_seats(color)
            } else {
                same
            };
            // Front (closest to the enemy) first.
            if is_bottom {
                ordered.reverse();
            }
            let count = ordered.len();
            let index = ordered
                .iter()
                .position(|&s| s == from)
                .ok_or(ZhError::OutOfRange { index: count, count })?;
            text.push(ordinal_char(color, count, index)?);
            text.push(piece.name_char());
        } else {
            // King, advisor and bishop never take an ordinal: direction
            // alone disambiguates two like pieces on a file.
            text.push(piece.name_char());
            text.push(file_char(color, is_bottom, from.col()));
        }
        if to.row() == from.row() {
            text.push('平');
            text.push(file_char(color, is_bottom, to.col()));
        } else {
            let advance = (to.row() > from.row()) == is_bottom;
            text.push(if advance { '进' } else { '退' });
            if kind.is_line_mover() {
                let dist = to.row().abs_diff(from.row()) as usize;
                text.push(num_char(color, dist - 1));
            } else {
                text.push(file_char(color, is_bottom, to.col()));
            }
        }
        Ok(text)
    }

    /// Decode ideographic move text against the current position
    pub fn from_zh(&self, text: &str) -> Result<(Seat, Seat), ZhError> {
        let malformed = || ZhError::Malformed(text.to_string());
        let cs: Vec<char> = text.chars().collect();
        if cs.len() != 4 {
            return Err(malformed());
        }
        let color = color_of_digit(cs[3]).ok_or_else(malformed)?;
        let is_bottom = color == self.bottom_color();
        let level = cs[2] == '平';
        let advance = match cs[2] {
            '进' => true,
            '退' | '平' => false,
            _ => return Err(malformed()),
        };

        let (kind, from) = if let Some(kind) = PieceKind::from_name_char(cs[0], color) {
            let col = col_of_file(color, is_bottom, cs[1]).ok_or_else(malformed)?;
            let candidates: Vec<Seat> = self
                .kind_seats(color, kind)
                .into_iter()
                .filter(|s| s.col() == col)
                .collect();
            let from = match candidates.len() {
                0 => return Err(ZhError::Candidate(text.to_string())),
                1 => candidates[0],
                _ if level => return Err(ZhError::Candidate(text.to_string())),
                // Two like diagonal movers on one file: advancing means the
                // rear one moves, retreating the front one.
                _ => {
                    if advance == is_bottom {
                        candidates[0]
                    } else {
                        candidates[candidates.len() - 1]
                    }
                }
            };
            (kind, from)
        } else {
            let kind = PieceKind::from_name_char(cs[1], color).ok_or_else(malformed)?;
            let mut ordered = if kind == PieceKind::Pawn {
                self.pawn_ordinal_seats(color)
            } else {
                // At most one file can hold two like strong pieces.
                let all = self.kind_seats(color, kind);
                (0..Seat::COL_NUM)
                    .map(|col| {
                        all.iter().copied().filter(|s| s.col() == col).collect::<Vec<_>>()
                    })
                    .find(|group| group.len() > 1)
                    .unwrap_or_default()
            };
            if ordered.is_empty() {
                return Err(ZhError::Candidate(text.to_string()));
            }
            if is_bottom {
                ordered.reverse();
            }
            let index = ordinal_index(color, cs[0], ordered.len())?;
            let from = *ordered
                .get(index)
                .ok_or(ZhError::OutOfRange { index, count: ordered.len() })?;
            (kind, from)
        };

        let to = if level {
            let col = col_of_file(color, is_bottom, cs[3]).ok_or_else(malformed)?;
            Seat::new(from.row(), col)
        } else {
            let sign: i8 = if advance == is_bottom { 1 } else { -1 };
            if kind.is_line_mover() {
                let dist = num_index(color, cs[3]).ok_or_else(malformed)? as i8 + 1;
                from.offset(sign * dist, 0).ok_or(ZhError::OutOfRange {
                    index: dist as usize,
                    count: Seat::ROW_NUM as usize,
                })?
            } else {
                let col = col_of_file(color, is_bottom, cs[3]).ok_or_else(malformed)?;
                let dcol = col as i8 - from.col() as i8;
                let drow = match (kind, dcol.abs()) {
                    (PieceKind::Advisor, 1) => 1,
                    (PieceKind::Bishop, 2) => 2,
                    (PieceKind::Knight, 1) => 2,
                    (PieceKind::Knight, 2) => 1,
                    _ => return Err(malformed()),
                };
                from.offset(sign * drow, dcol).ok_or(ZhError::OutOfRange {
                    index: drow as usize,
                    count: Seat::ROW_NUM as usize,
                })?
            }
        };
        Ok((from, to))
    }
}
