//! Per-kind movement geometry and check detection
//!
//! Raw candidate generation is a closed table over the seven kinds; the
//! legality filters (same-color exclusion, check exposure) live on
//! `Board::legal_moves`.

use crate::types::{Color, PieceKind, Seat};

use super::Board;

type RawFn = fn(&Board, Seat, Color) -> Vec<Seat>;

const RAW_FNS: [RawFn; PieceKind::NUM] = [
    king_raw,
    advisor_raw,
    bishop_raw,
    knight_raw,
    rook_raw,
    cannon_raw,
    pawn_raw,
];

const ORTHO: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAG: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

pub(super) fn raw_moves(board: &Board, seat: Seat) -> Vec<Seat> {
    match board.piece_at(seat) {
        Some(p) => RAW_FNS[p.kind.index()](board, seat, p.color),
        None => Vec::new(),
    }
}

/// Palace membership on the half of the board the piece currently stands in
fn in_palace(seat: Seat, from: Seat) -> bool {
    if !(3..=5).contains(&seat.col()) {
        return false;
    }
    if from.row() <= 4 { seat.row() <= 2 } else { seat.row() >= 7 }
}

fn king_raw(_board: &Board, seat: Seat, _color: Color) -> Vec<Seat> {
    ORTHO
        .iter()
        .filter_map(|&(dr, dc)| seat.offset(dr, dc))
        .filter(|&to| in_palace(to, seat))
        .collect()
}

fn advisor_raw(_board: &Board, seat: Seat, _color: Color) -> Vec<Seat> {
    DIAG.iter()
        .filter_map(|&(dr, dc)| seat.offset(dr, dc))
        .filter(|&to| in_palace(to, seat))
        .collect()
}

fn bishop_raw(board: &Board, seat: Seat, _color: Color) -> Vec<Seat> {
    DIAG.iter()
        .filter_map(|&(dr, dc)| {
            let eye = seat.offset(dr, dc)?;
            let to = seat.offset(dr * 2, dc * 2)?;
            // Bishops never cross the river and the eye must be open.
            let same_half = (seat.row() <= 4) == (to.row() <= 4);
            (same_half && board.occupant(eye).is_none()).then_some(to)
        })
        .collect()
}

fn knight_raw(board: &Board, seat: Seat, _color: Color) -> Vec<Seat> {
    const JUMPS: [(i8, i8); 8] = [
        (2, 1),
        (2, -1),
        (-2, 1),
        (-2, -1),
        (1, 2),
        (1, -2),
        (-1, 2),
        (-1, -2),
    ];
    JUMPS
        .iter()
        .filter_map(|&(dr, dc)| {
            let to = seat.offset(dr, dc)?;
            // The leg sits one step along the long side of the L.
            let leg = if dr.abs() == 2 {
                seat.offset(dr / 2, 0)?
            } else {
                seat.offset(0, dc / 2)?
            };
            board.occupant(leg).is_none().then_some(to)
        })
        .collect()
}

fn rook_raw(board: &Board, seat: Seat, _color: Color) -> Vec<Seat> {
    let mut moves = Vec::new();
    for &(dr, dc) in &ORTHO {
        let mut cur = seat;
        while let Some(to) = cur.offset(dr, dc) {
            moves.push(to);
            if board.occupant(to).is_some() {
                break;
            }
            cur = to;
        }
    }
    moves
}

fn cannon_raw(board: &Board, seat: Seat, _color: Color) -> Vec<Seat> {
    let mut moves = Vec::new();
    for &(dr, dc) in &ORTHO {
        let mut cur = seat;
        let mut mounted = false;
        while let Some(to) = cur.offset(dr, dc) {
            match (mounted, board.occupant(to).is_some()) {
                (false, false) => moves.push(to),
                (false, true) => mounted = true,
                (true, false) => {}
                // Only the second occupied seat on the ray is capturable.
                (true, true) => {
                    moves.push(to);
                    break;
                }
            }
            cur = to;
        }
    }
    moves
}

fn pawn_raw(board: &Board, seat: Seat, color: Color) -> Vec<Seat> {
    let up = color == board.bottom_color();
    let forward = if up { 1 } else { -1 };
    let crossed = if up { seat.row() >= 5 } else { seat.row() <= 4 };
    let mut moves = Vec::new();
    if let Some(to) = seat.offset(forward, 0) {
        moves.push(to);
    }
    if crossed {
        for dc in [-1, 1] {
            if let Some(to) = seat.offset(0, dc) {
                moves.push(to);
            }
        }
    }
    moves
}

pub(super) fn is_killed(board: &Board, color: Color) -> bool {
    let Some(king) = board.king_seat(color) else {
        return false;
    };
    // Facing generals: same column with nothing strictly between.
    if let Some(enemy_king) = board.king_seat(color.opponent()) {
        if enemy_king.col() == king.col() {
            let (lo, hi) = if king.row() < enemy_king.row() {
                (king.row(), enemy_king.row())
            } else {
                (enemy_king.row(), king.row())
            };
            let open = (lo + 1..hi).all(|row| board.occupant(Seat::new(row, king.col())).is_none());
            if open {
                return true;
            }
        }
    }
    // A strong enemy piece with the king's seat among its raw destinations.
    board
        .color_seats(color.opponent())
        .into_iter()
        .filter(|&s| board.piece_at(s).is_some_and(|p| p.kind.is_strong()))
        .any(|s| raw_moves(board, s).contains(&king))
}
