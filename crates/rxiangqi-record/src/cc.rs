//! Tabular grid format
//!
//! The tree is laid out on a character grid: one row per ply (row 0 holds
//! a start marker), one column per variation branch. A move stays in its
//! parent's column when it continues a line and opens a fresh column when
//! it starts a variation, so a cell's predecessor is either the cell
//! directly above it or the nearest occupied cell to its left in the same
//! row. Cells are five characters wide: four for the ideographic move
//! text, one separator space. Remarks follow the grid as one line each,
//! `[row,col]` plus the remark as a JSON string.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use rxiangqi_core::{CoreError, Instance, MoveId, MoveNode};

use crate::text::{apply_header, header_re, write_headers};
use crate::RecordError;

const EMPTY_CELL: &str = "　　　　";
const ROOT_CELL: &str = "　开始　";

fn remark_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\[(\d+),(\d+)\](".*")$"#).expect("remark pattern"))
}

pub fn encode(game: &Instance) -> Result<String, RecordError> {
    let mut out = String::new();
    write_headers(&mut out, game);
    out.push('\n');

    // Dimensions come from the nodes themselves; counters cached on the
    // game may lag behind appends made since the last replay.
    let walked = game.tree.walk();
    let mut rows = 1;
    let mut cols = 1;
    for &id in &walked {
        let node = game.tree.node(id);
        rows = rows.max(node.ply as usize + 1);
        cols = cols.max(node.col as usize + 1);
    }
    let mut grid: Vec<Vec<Option<String>>> = vec![vec![None; cols]; rows];
    grid[0][0] = Some(ROOT_CELL.to_string());
    let mut remarks: Vec<(usize, usize, String)> = Vec::new();
    if let Some(remark) = &game.tree.node(MoveId::ROOT).remark {
        remarks.push((0, 0, remark.clone()));
    }
    for id in walked {
        if id.is_root() {
            continue;
        }
        let node = game.tree.node(id);
        let row = node.ply as usize;
        let col = node.col as usize;
        let zh = node.zh.clone().ok_or(CoreError::UnresolvedMove(id.index()))?;
        grid[row][col] = Some(zh);
        if let Some(remark) = &node.remark {
            remarks.push((row, col, remark.clone()));
        }
    }

    for row in grid {
        for cell in row {
            out.push_str(cell.as_deref().unwrap_or(EMPTY_CELL));
            out.push(' ');
        }
        out.push('\n');
    }

    if !remarks.is_empty() {
        out.push('\n');
        for (row, col, remark) in remarks {
            let quoted = serde_json::to_string(&remark)?;
            out.push_str(&format!("[{row},{col}]{quoted}\n"));
        }
    }
    Ok(out)
}

pub fn decode(text: &str) -> Result<Instance, RecordError> {
    let mut game = Instance::new();

    enum Phase {
        Headers,
        Grid,
        Remarks,
    }
    let mut phase = Phase::Headers;
    let mut grid: Vec<Vec<Option<String>>> = Vec::new();
    let mut ids: HashMap<(usize, usize), MoveId> = HashMap::new();
    ids.insert((0, 0), MoveId::ROOT);

    let mut remark_lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        match phase {
            Phase::Headers => {
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(caps) = header_re().captures(line) {
                    apply_header(&mut game, &caps[1], &caps[2])?;
                    continue;
                }
                phase = Phase::Grid;
                grid.push(parse_grid_line(line));
            }
            Phase::Grid => {
                if line.trim().is_empty() {
                    phase = Phase::Remarks;
                    continue;
                }
                grid.push(parse_grid_line(line));
            }
            Phase::Remarks => {
                if !line.trim().is_empty() {
                    remark_lines.push(line);
                }
            }
        }
    }
    if grid.is_empty() {
        return Err(RecordError::Text("no grid rows".to_string()));
    }

    // Row 0 is the start marker; moves begin at ply 1. Within a row,
    // left-to-right creation keeps sibling chains in column order.
    for (row, cells) in grid.iter().enumerate().skip(1) {
        for (col, cell) in cells.iter().enumerate() {
            let Some(zh) = cell else {
                continue;
            };
            let node = MoveNode::with_zh(zh.clone());
            let id = if let Some(&above) = ids.get(&(row - 1, col)) {
                game.tree.add_next(above, node)
            } else {
                let left = (0..col)
                    .rev()
                    .find_map(|c| ids.get(&(row, c)))
                    .copied()
                    .ok_or_else(|| {
                        RecordError::Text(format!("dangling cell at [{row},{col}]"))
                    })?;
                game.tree.add_other(left, node)
            };
            ids.insert((row, col), id);
        }
    }

    for line in remark_lines {
        let caps = remark_re()
            .captures(line)
            .ok_or_else(|| RecordError::Text(format!("bad remark line: {line}")))?;
        let row: usize = caps[1].parse().map_err(|_| RecordError::Text(line.to_string()))?;
        let col: usize = caps[2].parse().map_err(|_| RecordError::Text(line.to_string()))?;
        let remark: String = serde_json::from_str(&caps[3])?;
        let id = ids
            .get(&(row, col))
            .copied()
            .ok_or_else(|| RecordError::Text(format!("remark for empty cell [{row},{col}]")))?;
        game.tree.node_mut(id).remark = Some(remark);
    }

    game.reconcile()?;
    Ok(game)
}

/// Split a grid line into five-character cells; a cell whose four content
/// characters are all padding counts as empty.
fn parse_grid_line(line: &str) -> Vec<Option<String>> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(5)
        .map(|chunk| {
            let content: String = chunk.iter().take(4).collect();
            (!content.trim_matches(['　', ' ']).is_empty()).then_some(content)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxiangqi_core::Seat;

    fn seat(coord: &str) -> Seat {
        Seat::from_coord(coord).unwrap()
    }

    fn sample() -> Instance {
        let mut game = Instance::new();
        game.metadata.set("Event", "grid check");
        game.append_next(seat("h2"), seat("e2"), None).unwrap();
        game.append_next(seat("h9"), seat("g7"), Some("正着".to_string())).unwrap();
        game.append_other(seat("b9"), seat("c7"), None).unwrap();
        game.append_next(seat("h0"), seat("g2"), None).unwrap();
        game.reconcile().unwrap();
        game
    }

    #[test]
    fn test_grid_shape() {
        let game = sample();
        let text = encode(&game).unwrap();
        let grid: Vec<&str> = text
            .lines()
            .skip_while(|l| l.starts_with('[') || l.trim().is_empty())
            .take_while(|l| !l.trim().is_empty())
            .collect();
        // Root row plus three plies, two columns.
        assert_eq!(grid.len(), 4);
        assert!(grid[0].starts_with(ROOT_CELL));
        assert!(grid[1].contains("炮二平五"));
        assert!(grid[2].contains("马８进７"));
        assert!(grid[2].contains("马２进３"));
        assert!(grid[3].contains("马二进三"));
    }

    #[test]
    fn test_round_trip() {
        let game = sample();
        let text = encode(&game).unwrap();
        let mut back = decode(&text).unwrap();
        assert_eq!(back.metadata.get("Event"), Some("grid check"));
        assert_eq!(back.stats, game.stats);
        let first = back.tree.node(MoveId::ROOT).next.unwrap();
        let reply = back.tree.node(first).next.unwrap();
        assert_eq!(back.tree.node(reply).remark.as_deref(), Some("正着"));
        let var = back.tree.node(reply).other.unwrap();
        assert_eq!(back.tree.node(var).zh.as_deref(), Some("马２进３"));
        // The continuation of the variation sits below it in its column.
        let cont = back.tree.node(var).next.unwrap();
        assert_eq!(back.tree.node(cont).zh.as_deref(), Some("马二进三"));
        let again = encode(&mut back).unwrap();
        assert_eq!(text, again);
    }

    #[test]
    fn test_remark_with_newline_survives() {
        let mut game = Instance::new();
        game.append_next(seat("h2"), seat("e2"), Some("两行\n注解".to_string())).unwrap();
        game.reconcile().unwrap();
        let text = encode(&game).unwrap();
        let back = decode(&text).unwrap();
        let first = back.tree.node(MoveId::ROOT).next.unwrap();
        assert_eq!(back.tree.node(first).remark.as_deref(), Some("两行\n注解"));
    }

    #[test]
    fn test_encode_straight_from_appends() {
        // No replay between the appends and the encode.
        let mut game = Instance::new();
        game.append_next(seat("h2"), seat("e2"), None).unwrap();
        game.append_next(seat("h9"), seat("g7"), None).unwrap();
        let text = encode(&game).unwrap();
        let back = decode(&text).unwrap();
        assert_eq!(back.stats.move_count, 2);
        assert_eq!(back.stats.max_depth, 2);
    }

    #[test]
    fn test_dangling_cell_rejected() {
        // A move in column 1 with nothing above and nothing to its left.
        let text = format!(
            "{ROOT_CELL} {EMPTY_CELL} \n{EMPTY_CELL} 炮二平五 \n"
        );
        assert!(matches!(decode(&text), Err(RecordError::Text(_))));
    }
}
