//! Headers plus movetext
//!
//! The layout follows chess PGN: a block of `[Key "Value"]` headers, a
//! blank line, then the moves. Variations sit in parentheses right after
//! the move they replace, remarks in braces after the move they annotate.
//! Moves are written either as coordinate pairs ("h2e2") or as four
//! ideographic characters ("炮二平五"); the decoder is told which.

use std::sync::OnceLock;

use regex::Regex;
use rxiangqi_core::board::{chars_to_fen, fen_to_chars};
use rxiangqi_core::{CoreError, Instance, MoveId, MoveNode, START_FEN};

use crate::RecordError;

/// Which move spelling the movetext uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    Coord,
    Zh,
}

const WRAP_COLUMN: usize = 80;

pub(crate) fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\[(\w+)\s+"([^"]*)"\]\s*$"#).expect("header pattern"))
}

/// Emit the metadata block, with a FEN header when the game does not
/// start from the standard position.
pub(crate) fn write_headers(out: &mut String, game: &Instance) {
    for (key, value) in game.metadata.iter() {
        out.push_str(&format!("[{key} \"{value}\"]\n"));
    }
    let fen = chars_to_fen(game.start_chars());
    if fen != START_FEN {
        out.push_str(&format!("[FEN \"{fen}\"]\n"));
    }
}

/// Route one parsed header into the instance
pub(crate) fn apply_header(
    game: &mut Instance,
    key: &str,
    value: &str,
) -> Result<(), RecordError> {
    if key == "FEN" {
        let chars = fen_to_chars(value).map_err(CoreError::from)?;
        game.set_position(&chars)?;
    } else {
        game.metadata.set(key, value);
    }
    Ok(())
}

enum Tok {
    Move(String),
    Remark(String),
    Open,
    Close,
}

fn tokenize(body: &str) -> Result<Vec<Tok>, RecordError> {
    let mut toks = Vec::new();
    let mut it = body.chars().peekable();
    while let Some(c) = it.next() {
        match c {
            '{' => {
                let mut remark = String::new();
                loop {
                    match it.next() {
                        Some('}') => break,
                        Some(c) => remark.push(c),
                        None => return Err(RecordError::Text("unterminated remark".to_string())),
                    }
                }
                toks.push(Tok::Remark(remark));
            }
            '(' => toks.push(Tok::Open),
            ')' => toks.push(Tok::Close),
            c if c.is_whitespace() => {}
            c => {
                let mut word = String::from(c);
                while let Some(&c) = it.peek() {
                    if c.is_whitespace() || matches!(c, '{' | '}' | '(' | ')') {
                        break;
                    }
                    word.push(c);
                    it.next();
                }
                if !is_filler(&word) {
                    toks.push(Tok::Move(word));
                }
            }
        }
    }
    Ok(toks)
}

/// Move numbers and result markers carry no information of their own
fn is_filler(word: &str) -> bool {
    let numberish = word.ends_with('.')
        && word.chars().all(|c| c.is_ascii_digit() || c == '.')
        && word.chars().any(|c| c.is_ascii_digit());
    numberish || matches!(word, "*" | "1-0" | "0-1" | "1/2-1/2")
}

pub fn decode(text: &str, notation: Notation) -> Result<Instance, RecordError> {
    let mut game = Instance::new();

    // Headers run until the first line that is neither blank nor a header.
    let mut body = String::new();
    let mut in_headers = true;
    for line in text.lines() {
        if in_headers {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(caps) = header_re().captures(line) {
                apply_header(&mut game, &caps[1], &caps[2])?;
                continue;
            }
            in_headers = false;
        }
        body.push_str(line);
        body.push('\n');
    }

    let mut cur = MoveId::ROOT;
    let mut stack: Vec<MoveId> = Vec::new();
    let mut next_is_other = false;
    for tok in tokenize(&body)? {
        match tok {
            Tok::Open => {
                if cur.is_root() {
                    return Err(RecordError::Text("variation before any move".to_string()));
                }
                stack.push(cur);
                next_is_other = true;
            }
            Tok::Close => {
                cur = stack
                    .pop()
                    .ok_or_else(|| RecordError::Text("unbalanced ')'".to_string()))?;
                next_is_other = false;
            }
            Tok::Remark(remark) => {
                let slot = &mut game.tree.node_mut(cur).remark;
                match slot {
                    Some(prev) => {
                        prev.push('\n');
                        prev.push_str(&remark);
                    }
                    None => *slot = Some(remark),
                }
            }
            Tok::Move(word) => {
                let node = match notation {
                    Notation::Coord => MoveNode::with_coord(word),
                    Notation::Zh => MoveNode::with_zh(word),
                };
                let id = if next_is_other {
                    game.tree.add_other(cur, node)
                } else {
                    game.tree.add_next(cur, node)
                };
                next_is_other = false;
                cur = id;
            }
        }
    }
    if !stack.is_empty() {
        return Err(RecordError::Text("unbalanced '('".to_string()));
    }

    game.reconcile()?;
    Ok(game)
}

enum Step {
    Node(MoveId),
    Open,
    Close,
}

pub fn encode(game: &Instance, notation: Notation) -> Result<String, RecordError> {
    let mut out = String::new();
    write_headers(&mut out, game);
    out.push('\n');

    let mut items: Vec<String> = Vec::new();
    if let Some(remark) = &game.tree.node(MoveId::ROOT).remark {
        items.push(format!("{{{remark}}}"));
    }
    let mut stack = Vec::new();
    if let Some(first) = game.tree.node(MoveId::ROOT).next {
        stack.push(Step::Node(first));
    }
    while let Some(step) = stack.pop() {
        match step {
            Step::Open => items.push("(".to_string()),
            Step::Close => items.push(")".to_string()),
            Step::Node(id) => {
                let node = game.tree.node(id);
                if node.ply % 2 == 1 {
                    items.push(format!("{}.", (node.ply + 1) / 2));
                }
                let text = match notation {
                    Notation::Coord => node.coord.clone(),
                    Notation::Zh => node.zh.clone(),
                };
                items.push(text.ok_or(CoreError::UnresolvedMove(id.index()))?);
                if let Some(remark) = &node.remark {
                    items.push(format!("{{{remark}}}"));
                }
                // Continuation goes to the bottom of the stack segment so
                // the parenthesized variations print before it.
                if let Some(n) = node.next {
                    stack.push(Step::Node(n));
                }
                if !game.tree.is_variation(id) {
                    for sib in game.tree.other_chain(id).into_iter().rev() {
                        stack.push(Step::Close);
                        stack.push(Step::Node(sib));
                        stack.push(Step::Open);
                    }
                }
            }
        }
    }

    let mut column = 0;
    for item in items {
        if column > 0 && column + 1 + item.chars().count() > WRAP_COLUMN {
            out.push('\n');
            column = 0;
        } else if column > 0 {
            out.push(' ');
            column += 1;
        }
        column += item.chars().count();
        out.push_str(&item);
    }
    out.push('\n');
    Ok(out)
}
