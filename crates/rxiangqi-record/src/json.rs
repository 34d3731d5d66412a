//! Nested JSON tree format
//!
//! The document mirrors the move tree shape directly: every node holds
//! its seat indexes, an optional remark and optional `n`/`o` children.
//! The top level carries the metadata entries and the starting position
//! as a FEN string.

use rxiangqi_core::board::{chars_to_fen, fen_to_chars};
use rxiangqi_core::{CoreError, Instance, MoveId, MoveNode, Seat};
use serde::{Deserialize, Serialize};

use crate::{Link, RecordError};

#[derive(Serialize, Deserialize)]
struct JsonGame {
    meta: Vec<(String, String)>,
    position: String,
    tree: JsonNode,
}

#[derive(Serialize, Deserialize, Default)]
struct JsonNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    f: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    t: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    r: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<Box<JsonNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    o: Option<Box<JsonNode>>,
}

pub fn decode(text: &str) -> Result<Instance, RecordError> {
    let parsed: JsonGame = serde_json::from_str(text)?;

    let mut game = Instance::new();
    let chars = fen_to_chars(&parsed.position).map_err(CoreError::from)?;
    game.set_position(&chars)?;
    for (key, value) in &parsed.meta {
        game.metadata.set(key, value);
    }

    let root = parsed.tree;
    game.tree.node_mut(MoveId::ROOT).remark = root.r;
    let mut stack: Vec<(MoveId, Link, Box<JsonNode>)> = Vec::new();
    if let Some(n) = root.n {
        stack.push((MoveId::ROOT, Link::Next, n));
    }
    while let Some((at, link, jn)) = stack.pop() {
        let jn = *jn;
        let (Some(f), Some(t)) = (jn.f, jn.t) else {
            return Err(RecordError::Text("move node without seats".to_string()));
        };
        let from = Seat::from_u8(f).ok_or(RecordError::BadSeat(f))?;
        let to = Seat::from_u8(t).ok_or(RecordError::BadSeat(t))?;
        let mut node = MoveNode::with_seats(from, to);
        node.remark = jn.r;
        let id = match link {
            Link::Next => game.tree.add_next(at, node),
            Link::Other => game.tree.add_other(at, node),
        };
        if let Some(o) = jn.o {
            stack.push((id, Link::Other, o));
        }
        if let Some(n) = jn.n {
            stack.push((id, Link::Next, n));
        }
    }

    game.reconcile()?;
    Ok(game)
}

pub fn encode(game: &Instance) -> Result<String, RecordError> {
    // Children are folded bottom-up: the reversed preorder walk sees every
    // child before its parent.
    let mut built: std::collections::HashMap<usize, JsonNode> = std::collections::HashMap::new();
    for id in game.tree.walk().into_iter().rev() {
        let node = game.tree.node(id);
        let jn = JsonNode {
            f: node.from.map(|s| s.index() as u8),
            t: node.to.map(|s| s.index() as u8),
            r: node.remark.clone(),
            n: node
                .next
                .map(|n| Box::new(built.remove(&n.index()).unwrap_or_default())),
            o: node
                .other
                .map(|o| Box::new(built.remove(&o.index()).unwrap_or_default())),
        };
        built.insert(id.index(), jn);
    }
    let doc = JsonGame {
        meta: game.metadata.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        position: chars_to_fen(game.start_chars()),
        tree: built.remove(&MoveId::ROOT.index()).unwrap_or_default(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
