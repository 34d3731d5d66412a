//! Plain binary format
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic "RXQR" | version u8 | position 90 bytes |
//! metadata count u16, then per entry key/value as u16 length + bytes |
//! one record per tree node in depth-first order, continuation before
//! variation: from u8, to u8 (0xFF on the root), tag u8,
//! then u32 length + bytes when the remark bit is set
//! ```
//!
//! The tag carries three bits: 0x80 a continuation follows, 0x40 a
//! variation of this node appears later in the stream, 0x20 a remark is
//! inlined right after the tag.

use rxiangqi_core::{Instance, MoveId, MoveNode, Seat};

use crate::bytes::Reader;
use crate::{Link, RecordError};

const MAGIC: &[u8; 4] = b"RXQR";
const VERSION: u8 = 1;

const TAG_NEXT: u8 = 0x80;
const TAG_OTHER: u8 = 0x40;
const TAG_REMARK: u8 = 0x20;
const NO_SEAT: u8 = 0xFF;

pub fn decode(data: &[u8]) -> Result<Instance, RecordError> {
    let mut r = Reader::new(data);
    if r.take(4)? != MAGIC {
        return Err(RecordError::BadMagic("RXQR"));
    }
    let version = r.u8()?;
    if version != VERSION {
        return Err(RecordError::BadVersion("RXQR", version));
    }

    let mut game = Instance::new();
    let position = string_of(r.take(90)?)?;
    game.set_position(&position)?;
    for _ in 0..r.u16_le()? {
        let key = read_str16(&mut r)?;
        let value = read_str16(&mut r)?;
        game.metadata.set(&key, &value);
    }

    // Root record: seats are padding, the remark is the game annotation.
    let (_, _, tag) = read_head(&mut r)?;
    if tag & TAG_REMARK != 0 {
        game.tree.node_mut(MoveId::ROOT).remark = Some(read_remark(&mut r)?);
    }

    let mut pending: Vec<MoveId> = Vec::new();
    let mut cursor = (tag & TAG_NEXT != 0).then_some((MoveId::ROOT, Link::Next));
    while let Some((at, link)) =
        cursor.take().or_else(|| pending.pop().map(|p| (p, Link::Other)))
    {
        let (f, t, tag) = read_head(&mut r)?;
        let from = Seat::from_u8(f).ok_or(RecordError::BadSeat(f))?;
        let to = Seat::from_u8(t).ok_or(RecordError::BadSeat(t))?;
        let mut node = MoveNode::with_seats(from, to);
        if tag & TAG_REMARK != 0 {
            node.remark = Some(read_remark(&mut r)?);
        }
        let id = match link {
            Link::Next => game.tree.add_next(at, node),
            Link::Other => game.tree.add_other(at, node),
        };
        if tag & TAG_OTHER != 0 {
            pending.push(id);
        }
        if tag & TAG_NEXT != 0 {
            cursor = Some((id, Link::Next));
        }
    }
    if !r.is_empty() {
        log::warn!("{} trailing bytes after the last record", data.len() - r.pos());
    }

    game.reconcile()?;
    Ok(game)
}

pub fn encode(game: &Instance) -> Result<Vec<u8>, RecordError> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(game.start_chars().as_bytes());

    push_u16(&mut out, game.metadata.len() as u16);
    for (key, value) in game.metadata.iter() {
        push_str16(&mut out, key)?;
        push_str16(&mut out, value)?;
    }

    for id in game.tree.walk() {
        let node = game.tree.node(id);
        let (f, t) = match (node.from, node.to) {
            (Some(f), Some(t)) => (f.index() as u8, t.index() as u8),
            _ => (NO_SEAT, NO_SEAT),
        };
        out.push(f);
        out.push(t);
        let mut tag = 0u8;
        if node.next.is_some() {
            tag |= TAG_NEXT;
        }
        if node.other.is_some() {
            tag |= TAG_OTHER;
        }
        if node.remark.is_some() {
            tag |= TAG_REMARK;
        }
        out.push(tag);
        if let Some(remark) = &node.remark {
            push_u32(&mut out, remark.len() as u32);
            out.extend_from_slice(remark.as_bytes());
        }
    }
    Ok(out)
}

fn read_head(r: &mut Reader<'_>) -> Result<(u8, u8, u8), RecordError> {
    let b = r.take(3)?;
    Ok((b[0], b[1], b[2]))
}

fn read_remark(r: &mut Reader<'_>) -> Result<String, RecordError> {
    let len = r.u32_le()? as usize;
    string_of(r.take(len)?)
}

fn read_str16(r: &mut Reader<'_>) -> Result<String, RecordError> {
    let len = r.u16_le()? as usize;
    string_of(r.take(len)?)
}

fn string_of(bytes: &[u8]) -> Result<String, RecordError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| RecordError::Text(e.to_string()))
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_str16(out: &mut Vec<u8>, s: &str) -> Result<(), RecordError> {
    let len = u16::try_from(s.len()).map_err(|_| {
        RecordError::Text(format!("metadata entry of {} bytes exceeds u16 length", s.len()))
    })?;
    push_u16(out, len);
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(coord: &str) -> Seat {
        Seat::from_coord(coord).unwrap()
    }

    fn sample() -> Instance {
        let mut game = Instance::new();
        game.metadata.set("Event", "binary check");
        game.tree.node_mut(MoveId::ROOT).remark = Some("起手".to_string());
        game.append_next(seat("h2"), seat("e2"), None).unwrap();
        game.append_next(seat("h9"), seat("g7"), Some("屏风马".to_string())).unwrap();
        game.append_other(seat("b9"), seat("c7"), None).unwrap();
        game.append_next(seat("h0"), seat("g2"), None).unwrap();
        game.reconcile().unwrap();
        game
    }

    #[test]
    fn test_round_trip_preserves_tree() {
        let mut game = sample();
        let bytes = crate::encode(&mut game, crate::RecordFormat::Bin).unwrap();
        let back = decode(&bytes).unwrap();

        assert_eq!(back.metadata.get("Event"), Some("binary check"));
        assert_eq!(back.start_chars(), game.start_chars());
        assert_eq!(back.tree.node(MoveId::ROOT).remark.as_deref(), Some("起手"));
        assert_eq!(back.stats, game.stats);
        let zh: Vec<_> = back
            .tree
            .walk()
            .into_iter()
            .filter_map(|id| back.tree.node(id).zh.clone())
            .collect();
        // Walk order: mainline reply first, then the variation and the
        // continuation appended after switching to it.
        assert_eq!(zh, vec!["炮二平五", "马８进７", "马２进３", "马二进三"]);
    }

    #[test]
    fn test_encode_is_a_fixpoint() {
        let mut game = sample();
        let bytes = crate::encode(&mut game, crate::RecordFormat::Bin).unwrap();
        let mut back = decode(&bytes).unwrap();
        let again = crate::encode(&mut back, crate::RecordFormat::Bin).unwrap();
        assert_eq!(bytes, again);
    }

    #[test]
    fn test_oversized_metadata_rejected() {
        let mut game = Instance::new();
        game.metadata.set("Event", &"x".repeat(u16::MAX as usize + 1));
        assert!(matches!(encode(&game), Err(RecordError::Text(_))));
    }

    #[test]
    fn test_bad_magic_and_version() {
        assert!(matches!(decode(b"NOPE"), Err(RecordError::BadMagic(_))));
        let mut game = sample();
        let mut bytes = crate::encode(&mut game, crate::RecordFormat::Bin).unwrap();
        bytes[4] = 9;
        assert!(matches!(decode(&bytes), Err(RecordError::BadVersion(_, 9))));
    }

    #[test]
    fn test_truncated_stream() {
        let mut game = sample();
        let bytes = crate::encode(&mut game, crate::RecordFormat::Bin).unwrap();
        let cut = &bytes[..bytes.len() - 2];
        assert!(matches!(decode(cut), Err(RecordError::UnexpectedEof(_))));
    }
}
