//! Branching move tree
//!
//! Nodes live in an arena addressed by integer handles; `next`/`other` are
//! the owning links down the tree and `parent` is a non-owning back
//! reference, so no ownership cycles arise. Index 0 is the root sentinel
//! standing for the starting position.

use crate::piece::PieceId;
use crate::types::Seat;

/// Handle into a [`MoveTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MoveId(u32);

impl MoveId {
    /// The root sentinel
    pub const ROOT: MoveId = MoveId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

/// One recorded move plus its tree links.
///
/// Seat and notation fields are written once (by a decoder or by
/// reconciliation) and treated as immutable afterwards; only the
/// structural links change, through the explicit cut operations.
#[derive(Debug, Clone, Default)]
pub struct MoveNode {
    pub from: Option<Seat>,
    pub to: Option<Seat>,
    /// Coordinate notation ("h2e2")
    pub coord: Option<String>,
    /// Ideographic notation ("炮二平五")
    pub zh: Option<String>,
    /// Free-text annotation
    pub remark: Option<String>,
    /// Captured piece identity, recorded on replay so undo is exact
    pub captured: Option<PieceId>,
    /// Ply depth from the root (row in tabular rendering)
    pub ply: u16,
    /// Variation branch column for tabular rendering
    pub col: u16,
    pub next: Option<MoveId>,
    pub other: Option<MoveId>,
    pub parent: Option<MoveId>,
}

impl MoveNode {
    /// Node with resolved seats
    pub fn with_seats(from: Seat, to: Seat) -> MoveNode {
        MoveNode { from: Some(from), to: Some(to), ..MoveNode::default() }
    }

    /// Node carrying only coordinate text (seats filled by reconciliation)
    pub fn with_coord(coord: String) -> MoveNode {
        MoveNode { coord: Some(coord), ..MoveNode::default() }
    }

    /// Node carrying only ideographic text
    pub fn with_zh(zh: String) -> MoveNode {
        MoveNode { zh: Some(zh), ..MoveNode::default() }
    }
}

/// Arena of [`MoveNode`]s rooted at a sentinel.
#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<MoveNode>,
}

impl Default for MoveTree {
    fn default() -> Self {
        MoveTree::new()
    }
}

impl MoveTree {
    /// Tree holding only the root sentinel
    pub fn new() -> MoveTree {
        MoveTree { nodes: vec![MoveNode::default()] }
    }

    #[inline]
    pub fn node(&self, id: MoveId) -> &MoveNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: MoveId) -> &mut MoveNode {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes excluding detached ones but including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Attach `node` as the continuation of `at`, replacing any previous
    /// `next` link.
    pub fn add_next(&mut self, at: MoveId, mut node: MoveNode) -> MoveId {
        node.parent = Some(at);
        let id = self.push(node);
        self.node_mut(at).next = Some(id);
        id
    }

    /// Attach `node` as a variation of `at`, at the end of its sibling
    /// chain. The new node shares `at`'s parent (same ply).
    pub fn add_other(&mut self, at: MoveId, mut node: MoveNode) -> MoveId {
        node.parent = self.node(at).parent;
        let id = self.push(node);
        let mut last = at;
        while let Some(o) = self.node(last).other {
            last = o;
        }
        self.node_mut(last).other = Some(id);
        id
    }

    /// Detach the continuation subtree of `at`
    pub fn cut_next(&mut self, at: MoveId) -> Option<MoveId> {
        self.node_mut(at).next.take()
    }

    /// Detach the variation chain hanging off `at`
    pub fn cut_other(&mut self, at: MoveId) -> Option<MoveId> {
        self.node_mut(at).other.take()
    }

    /// Sibling chain starting at `id` (exclusive)
    pub fn other_chain(&self, id: MoveId) -> Vec<MoveId> {
        let mut out = Vec::new();
        let mut cur = self.node(id).other;
        while let Some(o) = cur {
            out.push(o);
            cur = self.node(o).other;
        }
        out
    }

    /// Was `id` attached through an `other` link?
    pub fn is_variation(&self, id: MoveId) -> bool {
        match self.node(id).parent {
            Some(p) => self.node(p).next != Some(id),
            None => false,
        }
    }

    /// Depth-first preorder over the reachable tree, next subtree before
    /// other subtree, using an explicit stack.
    pub fn walk(&self) -> Vec<MoveId> {
        let mut out = Vec::new();
        let mut stack = vec![MoveId::ROOT];
        while let Some(id) = stack.pop() {
            out.push(id);
            let node = self.node(id);
            // Other is pushed first so next pops (and lists) first.
            if let Some(o) = node.other {
                stack.push(o);
            }
            if let Some(n) = node.next {
                stack.push(n);
            }
        }
        out
    }

    fn push(&mut self, node: MoveNode) -> MoveId {
        let id = MoveId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}
