//! Game instance: metadata + board + move tree + navigation cursor
//!
//! Invariant: the board always reflects exactly the moves on the path from
//! the tree root to the cursor.

use crate::board::{Board, ChangeSide, START_FEN};
use crate::error::CoreError;
use crate::moves::{MoveId, MoveNode, MoveTree};
use crate::types::Seat;

/// Ordered game metadata (event, date, result, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(Vec<(String, String)>);

impl Metadata {
    pub fn new() -> Metadata {
        Metadata(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Replace the first entry with this key, or append a new one
    pub fn set(&mut self, key: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.0.push((key.to_string(), value.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Aggregates filled by [`Instance::reconcile`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes excluding the root
    pub move_count: usize,
    /// Remarks including one on the root
    pub remark_count: usize,
    /// Longest remark, in characters
    pub remark_max_len: usize,
    /// Deepest ply
    pub max_depth: u16,
    /// Highest variation column index
    pub max_col: u16,
}

enum Step {
    Visit(MoveId),
    Undo(MoveId),
}

/// Composition root binding one game together.
#[derive(Debug, Clone)]
pub struct Instance {
    pub metadata: Metadata,
    pub board: Board,
    pub tree: MoveTree,
    current: MoveId,
    start_chars: String,
    pub stats: TreeStats,
}

impl Default for Instance {
    fn default() -> Self {
        Instance::new()
    }
}

impl Instance {
    /// Fresh game at the standard opening position
    pub fn new() -> Instance {
        let mut board = Board::new();
        board.reset_fen(START_FEN).expect("bundled start FEN parses");
        let start_chars = board.piece_chars();
        Instance {
            metadata: Metadata::new(),
            board,
            tree: MoveTree::new(),
            current: MoveId::ROOT,
            start_chars,
            stats: TreeStats::default(),
        }
    }

    /// Restage the starting position. Only meaningful before moves are
    /// applied; decoders call this while the cursor is at the root.
    pub fn set_position(&mut self, piece_chars: &str) -> Result<(), CoreError> {
        self.board.reset(piece_chars)?;
        self.start_chars = self.board.piece_chars();
        Ok(())
    }

    /// The 90-entry buffer of the starting position
    pub fn start_chars(&self) -> &str {
        &self.start_chars
    }

    /// Cursor position
    pub fn current(&self) -> MoveId {
        self.current
    }

    /// Apply the continuation of the current move, if any
    pub fn forward(&mut self) -> Result<bool, CoreError> {
        match self.tree.node(self.current).next {
            Some(next) => {
                self.apply(next)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Exactly revert the current move and step back to its parent
    pub fn backward(&mut self) -> Result<bool, CoreError> {
        if self.current.is_root() {
            return Ok(false);
        }
        let node = self.tree.node(self.current);
        let (Some(from), Some(to)) = (node.from, node.to) else {
            return Err(CoreError::UnresolvedMove(self.current.index()));
        };
        self.board.undo_move(from, to, node.captured);
        self.current = node.parent.unwrap_or(MoveId::ROOT);
        Ok(true)
    }

    /// Switch to the next variation at the same ply
    pub fn go_other(&mut self) -> Result<bool, CoreError> {
        let Some(other) = self.tree.node(self.current).other else {
            return Ok(false);
        };
        self.backward()?;
        self.apply(other)?;
        Ok(true)
    }

    /// Rewind to the root
    pub fn back_first(&mut self) -> Result<(), CoreError> {
        while self.backward()? {}
        Ok(())
    }

    /// Follow continuations to the end of the current line
    pub fn go_last(&mut self) -> Result<(), CoreError> {
        while self.forward()? {}
        Ok(())
    }

    /// Step forward (positive) or backward (negative) `n` plies
    pub fn go_inc(&mut self, n: i32) -> Result<(), CoreError> {
        for _ in 0..n.unsigned_abs() {
            let moved = if n > 0 { self.forward()? } else { self.backward()? };
            if !moved {
                break;
            }
        }
        Ok(())
    }

    /// Record and play a continuation of the current position. The move
    /// must be legal; notation is filled from the pre-move position.
    pub fn append_next(
        &mut self,
        from: Seat,
        to: Seat,
        remark: Option<String>,
    ) -> Result<MoveId, CoreError> {
        let node = self.build_node(from, to, remark)?;
        let id = self.tree.add_next(self.current, node);
        self.apply(id)?;
        self.stats.move_count += 1;
        Ok(id)
    }

    /// Record a variation replacing the current move, and switch to it
    pub fn append_other(
        &mut self,
        from: Seat,
        to: Seat,
        remark: Option<String>,
    ) -> Result<MoveId, CoreError> {
        if self.current.is_root() {
            return Err(CoreError::IllegalMove { from, to });
        }
        let sibling = self.current;
        self.backward()?;
        let node = match self.build_node(from, to, remark) {
            Ok(mut node) => {
                self.stats.max_col += 1;
                node.col = self.stats.max_col;
                node
            }
            Err(e) => {
                // Restore the cursor before reporting.
                self.apply(sibling)?;
                return Err(e);
            }
        };
        let id = self.tree.add_other(sibling, node);
        self.apply(id)?;
        self.stats.move_count += 1;
        Ok(id)
    }

    /// Replay the whole tree against the board, filling in whichever of
    /// {seats, coordinate text, ideographic text} each node is missing,
    /// plus captured pieces, ply/column indexes and the aggregate stats.
    /// Leaves the cursor at the root.
    pub fn reconcile(&mut self) -> Result<(), CoreError> {
        self.back_first()?;
        let mut stats = TreeStats::default();
        if let Some(remark) = &self.tree.node(MoveId::ROOT).remark {
            stats.remark_count = 1;
            stats.remark_max_len = remark.chars().count();
        }
        let mut stack = Vec::new();
        if let Some(first) = self.tree.node(MoveId::ROOT).next {
            stack.push(Step::Visit(first));
        }
        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(id) => {
                    let parent = self.tree.node(id).parent.unwrap_or(MoveId::ROOT);
                    let ply = self.tree.node(parent).ply + 1;
                    let col = if self.tree.is_variation(id) {
                        stats.max_col += 1;
                        stats.max_col
                    } else {
                        self.tree.node(parent).col
                    };
                    let (from, to) = self.resolve_seats(id)?;
                    let zh = self.board.zh_text(from, to)?;
                    let coord = coord_text(from, to);
                    let captured = self.board.move_piece(from, to);
                    {
                        let node = self.tree.node_mut(id);
                        node.from = Some(from);
                        node.to = Some(to);
                        node.zh = Some(zh);
                        node.coord = Some(coord);
                        node.captured = captured;
                        node.ply = ply;
                        node.col = col;
                        stats.move_count += 1;
                        if let Some(remark) = &node.remark {
                            stats.remark_count += 1;
                            stats.remark_max_len = stats.remark_max_len.max(remark.chars().count());
                        }
                    }
                    stats.max_depth = stats.max_depth.max(ply);
                    let node = self.tree.node(id);
                    // Siblings replay from the parent position, after this
                    // node's whole continuation has been visited and undone.
                    if let Some(o) = node.other {
                        stack.push(Step::Visit(o));
                    }
                    stack.push(Step::Undo(id));
                    if let Some(n) = node.next {
                        stack.push(Step::Visit(n));
                    }
                }
                Step::Undo(id) => {
                    let node = self.tree.node(id);
                    if let (Some(from), Some(to)) = (node.from, node.to) {
                        self.board.undo_move(from, to, node.captured);
                    }
                }
            }
        }
        log::debug!(
            "reconciled {} moves, {} remarks, depth {}, {} variation columns",
            stats.move_count,
            stats.remark_count,
            stats.max_depth,
            stats.max_col
        );
        self.stats = stats;
        self.current = MoveId::ROOT;
        Ok(())
    }

    /// Apply a side transform to board and tree together, keeping the
    /// stored move seats and both notations consistent with the new
    /// orientation. Rewinds to the root.
    pub fn change_side(&mut self, kind: ChangeSide) -> Result<(), CoreError> {
        self.back_first()?;
        self.board.change_side(kind);
        for id in self.tree.walk() {
            if id.is_root() {
                continue;
            }
            let node = self.tree.node_mut(id);
            node.from = node.from.map(|s| remap_seat(s, kind));
            node.to = node.to.map(|s| remap_seat(s, kind));
            // Stale against the new orientation; reconcile regenerates.
            node.coord = None;
            node.zh = None;
            node.captured = None;
        }
        self.start_chars = self.board.piece_chars();
        self.reconcile()
    }

    fn resolve_seats(&self, id: MoveId) -> Result<(Seat, Seat), CoreError> {
        let node = self.tree.node(id);
        if let (Some(from), Some(to)) = (node.from, node.to) {
            return Ok((from, to));
        }
        if let Some(zh) = &node.zh {
            return Ok(self.board.from_zh(zh)?);
        }
        if let Some(coord) = &node.coord {
            return parse_coord(coord);
        }
        Err(CoreError::UnresolvedMove(id.index()))
    }

    fn build_node(
        &mut self,
        from: Seat,
        to: Seat,
        remark: Option<String>,
    ) -> Result<MoveNode, CoreError> {
        if !self.board.legal_moves(from).contains(&to) {
            return Err(CoreError::IllegalMove { from, to });
        }
        let mut node = MoveNode::with_seats(from, to);
        node.zh = Some(self.board.zh_text(from, to)?);
        node.coord = Some(coord_text(from, to));
        node.remark = remark;
        node.ply = self.tree.node(self.current).ply + 1;
        node.col = self.tree.node(self.current).col;
        Ok(node)
    }

    fn apply(&mut self, id: MoveId) -> Result<(), CoreError> {
        let node = self.tree.node(id);
        let (Some(from), Some(to)) = (node.from, node.to) else {
            return Err(CoreError::UnresolvedMove(id.index()));
        };
        let captured = self.board.move_piece(from, to);
        self.tree.node_mut(id).captured = captured;
        self.current = id;
        Ok(())
    }
}

fn remap_seat(seat: Seat, kind: ChangeSide) -> Seat {
    match kind {
        ChangeSide::Exchange => seat,
        ChangeSide::Rotate => seat.rotate(),
        ChangeSide::Symmetry => seat.mirror(),
    }
}

/// Coordinate text for a seat pair ("h2e2")
pub fn coord_text(from: Seat, to: Seat) -> String {
    format!("{}{}", from.to_coord(), to.to_coord())
}

/// Parse four-character coordinate move text
pub fn parse_coord(text: &str) -> Result<(Seat, Seat), CoreError> {
    let bad = || CoreError::BadCoord(text.to_string());
    if text.len() != 4 || !text.is_ascii() {
        return Err(bad());
    }
    let from = Seat::from_coord(&text[0..2]).ok_or_else(bad)?;
    let to = Seat::from_coord(&text[2..4]).ok_or_else(bad)?;
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveNode;

    fn seat(coord: &str) -> Seat {
        Seat::from_coord(coord).unwrap()
    }

    #[test]
    fn test_append_and_navigate() {
        let mut game = Instance::new();
        let start = game.board.piece_chars();
        game.append_next(seat("h2"), seat("e2"), None).unwrap();
        game.append_next(seat("h9"), seat("g7"), None).unwrap();
        game.append_next(seat("h0"), seat("g2"), None).unwrap();
        assert_eq!(game.stats.move_count, 3);

        game.back_first().unwrap();
        assert_eq!(game.board.piece_chars(), start);
        assert_eq!(game.current(), MoveId::ROOT);

        game.go_last().unwrap();
        let node = game.tree.node(game.current());
        assert_eq!(node.zh.as_deref(), Some("马二进三"));

        game.go_inc(-2).unwrap();
        let node = game.tree.node(game.current());
        assert_eq!(node.coord.as_deref(), Some("h2e2"));
    }

    #[test]
    fn test_illegal_move_rejected() {
        let mut game = Instance::new();
        // The cannon may jump the h7 screen only onto the piece behind it;
        // the empty h8 seat in between is unreachable.
        let err = game.append_next(seat("h2"), seat("h8"), None).unwrap_err();
        assert_eq!(
            err,
            CoreError::IllegalMove { from: seat("h2"), to: seat("h8") }
        );
        assert_eq!(game.stats.move_count, 0);
        assert_eq!(game.current(), MoveId::ROOT);
    }

    #[test]
    fn test_capture_undo_is_exact() {
        let mut game = Instance::new();
        // Cannon takes the e-file pawn: a real capture.
        game.append_next(seat("h2"), seat("e2"), None).unwrap();
        game.append_next(seat("e6"), seat("e5"), None).unwrap();
        game.append_next(seat("e2"), seat("e5"), None).unwrap();
        let captured = game.tree.node(game.current()).captured;
        assert!(captured.is_some());
        let before = game.board.piece_chars();
        game.backward().unwrap();
        game.forward().unwrap();
        assert_eq!(game.board.piece_chars(), before);
        assert_eq!(game.tree.node(game.current()).captured, captured);
    }

    #[test]
    fn test_go_other_switches_variation() {
        let mut game = Instance::new();
        let main = game.append_next(seat("h2"), seat("e2"), None).unwrap();
        game.backward().unwrap();
        game.forward().unwrap();
        assert_eq!(game.current(), main);
        // Variation at the same ply.
        let alt = game.append_other(seat("b2"), seat("e2"), None).unwrap();
        assert_eq!(game.current(), alt);
        let node = game.tree.node(alt);
        assert_eq!(node.parent, Some(MoveId::ROOT));
        assert_eq!(node.zh.as_deref(), Some("炮八平五"));

        game.back_first().unwrap();
        game.forward().unwrap();
        assert_eq!(game.current(), main);
        game.go_other().unwrap();
        assert_eq!(game.current(), alt);
        let e2 = game.board.piece_at(seat("e2")).unwrap();
        assert_eq!(e2.glyph(), 'C');
        assert!(game.board.piece_at(seat("b2")).is_none());
        assert!(game.board.piece_at(seat("h2")).is_some());
    }

    #[test]
    fn test_reconcile_resolves_zh_only_tree() {
        let mut game = Instance::new();
        let a = game.tree.add_next(MoveId::ROOT, MoveNode::with_zh("炮二平五".into()));
        let b = game.tree.add_next(a, MoveNode::with_zh("马８进７".into()));
        game.tree.add_other(b, MoveNode::with_zh("炮８平５".into()));
        game.reconcile().unwrap();
        assert_eq!(game.tree.node(a).coord.as_deref(), Some("h2e2"));
        assert_eq!(game.tree.node(b).from, Some(seat("h9")));
        assert_eq!(game.stats.move_count, 3);
        assert_eq!(game.stats.max_depth, 2);
        assert_eq!(game.stats.max_col, 1);
        // Reconcile rewound everything.
        assert_eq!(game.current(), MoveId::ROOT);
        assert_eq!(game.board.piece_chars(), game.start_chars().to_string());
    }

    #[test]
    fn test_reconcile_resolves_coord_only_tree() {
        let mut game = Instance::new();
        let a = game.tree.add_next(MoveId::ROOT, MoveNode::with_coord("h2e2".into()));
        game.reconcile().unwrap();
        assert_eq!(game.tree.node(a).zh.as_deref(), Some("炮二平五"));
        assert_eq!(game.tree.node(a).from, Some(seat("h2")));
    }

    #[test]
    fn test_change_side_twice_restores_tree() {
        for kind in [ChangeSide::Exchange, ChangeSide::Rotate, ChangeSide::Symmetry] {
            let mut game = Instance::new();
            game.append_next(seat("h2"), seat("e2"), None).unwrap();
            game.append_next(seat("h9"), seat("g7"), None).unwrap();
            let chars = game.start_chars().to_string();
            game.change_side(kind).unwrap();
            game.change_side(kind).unwrap();
            assert_eq!(game.start_chars(), chars, "{kind:?}");
            game.go_last().unwrap();
            let node = game.tree.node(game.current());
            assert_eq!(node.zh.as_deref(), Some("马８进７"), "{kind:?}");
        }
    }

    #[test]
    fn test_change_side_rotate_keeps_replayable() {
        let mut game = Instance::new();
        game.append_next(seat("h2"), seat("e2"), None).unwrap();
        game.change_side(ChangeSide::Rotate).unwrap();
        game.go_last().unwrap();
        // The red cannon now sits on the rotated destination seat.
        let to = game.tree.node(game.current()).to.unwrap();
        assert_eq!(to, seat("e2").rotate());
        assert_eq!(game.board.piece_at(to).unwrap().glyph(), 'C');
    }

    #[test]
    fn test_metadata_order_preserved() {
        let mut meta = Metadata::new();
        meta.set("Event", "test open");
        meta.set("Date", "2024.01.01");
        meta.set("Event", "renamed");
        let entries: Vec<_> = meta.iter().collect();
        assert_eq!(entries, vec![("Event", "renamed"), ("Date", "2024.01.01")]);
    }
}
