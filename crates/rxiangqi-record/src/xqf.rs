//! Legacy encrypted binary format, decode only
//!
//! The container is a fixed 1024-byte header followed by a move section.
//! Containers at version 11 and above obfuscate the move section with a
//! repeating 32-byte keystream and the piece table with a rotation; both
//! are derived from four key bytes in the header. Move records are four
//! bytes (from, to, tag, padding) with optional length-prefixed remarks;
//! the tag links records into a tree the same way the plain binary format
//! does.

use rxiangqi_core::{Instance, MoveId, MoveNode, Seat, ROSTER};

use crate::bytes::Reader;
use crate::{Link, RecordError};

const HEADER_LEN: usize = 1024;
const COPYRIGHT: &[u8; 32] = b"[(C) Copyright Mr. Dong Shiwei.]";

const TAG_NEXT: u8 = 0x80;
const TAG_OTHER: u8 = 0x40;
const TAG_REMARK: u8 = 0x20;

/// Header fields: key, offset, length (length-prefixed text, GB-encoded
/// in the wild; transcoded lossily).
const TEXT_FIELDS: [(&str, usize, usize); 6] = [
    ("Title", 80, 64),
    ("Event", 208, 64),
    ("Date", 272, 16),
    ("Site", 288, 16),
    ("Red", 304, 16),
    ("Black", 320, 16),
];

/// The scrambling primitive behind every derived key byte
fn mix(b: u8, c: u8) -> u8 {
    b.wrapping_mul(b)
        .wrapping_mul(3)
        .wrapping_add(9)
        .wrapping_mul(3)
        .wrapping_add(8)
        .wrapping_mul(2)
        .wrapping_add(1)
        .wrapping_mul(3)
        .wrapping_add(8)
        .wrapping_mul(c)
}

struct Keys {
    version: u8,
    /// Piece table rotation and offset
    xy: u8,
    /// Source seat offset
    from: u8,
    /// Destination seat offset
    to: u8,
    /// Bias added to every stored remark length
    remark_bias: i64,
    /// Keystream subtracted from the move section
    stream: [u8; 32],
}

impl Keys {
    fn from_header(h: &[u8]) -> Keys {
        let version = h[2];
        if version <= 10 {
            return Keys {
                version,
                xy: 0,
                from: 0,
                to: 0,
                remark_bias: 0,
                stream: [0; 32],
            };
        }
        let mask = h[3];
        let xy = mix(h[13], h[13]);
        let from = mix(h[14], xy);
        let to = mix(h[15], from);
        let remark_bias = (h[12] as i64 * 256 + h[13] as i64) % 32000 + 767;
        let key_bytes = [
            (h[12] & mask) | h[8],
            (h[13] & mask) | h[9],
            (h[14] & mask) | h[10],
            (h[15] & mask) | h[11],
        ];
        let mut stream = [0u8; 32];
        for (i, b) in stream.iter_mut().enumerate() {
            *b = COPYRIGHT[i] ^ key_bytes[i % 4];
        }
        Keys { version, xy, from, to, remark_bias, stream }
    }
}

pub fn decode(data: &[u8]) -> Result<Instance, RecordError> {
    if data.len() < HEADER_LEN {
        return Err(RecordError::UnexpectedEof(data.len()));
    }
    let h = &data[..HEADER_LEN];
    if &h[0..2] != b"XQ" {
        return Err(RecordError::BadMagic("XQF"));
    }
    let keys = Keys::from_header(h);
    if keys.version > 12 {
        log::warn!("container version {} is newer than known, decoding as 12", keys.version);
    }
    let checksum = h[12]
        .wrapping_add(h[13])
        .wrapping_add(h[14])
        .wrapping_add(h[15]);
    if checksum != 0 {
        log::warn!("key checksum {checksum:#04x} is nonzero, reading anyway");
    }

    let mut game = Instance::new();
    game.set_position(&position_chars(h, &keys))?;
    for (key, offset, max_len) in TEXT_FIELDS {
        let len = (h[offset] as usize).min(max_len - 1);
        let text = String::from_utf8_lossy(&h[offset + 1..offset + 1 + len]);
        let text = text.trim_end_matches(['\0', ' ']);
        if !text.is_empty() {
            game.metadata.set(key, text);
        }
    }
    let result = match h[51] {
        1 => "1-0",
        2 => "0-1",
        3 => "1/2-1/2",
        _ => "*",
    };
    game.metadata.set("Result", result);

    // Decrypt the whole move section up front; the keystream position is
    // the absolute byte offset from the start of the section.
    let tail: Vec<u8> = data[HEADER_LEN..]
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if keys.version > 10 {
                b.wrapping_sub(keys.stream[i % 32])
            } else {
                b
            }
        })
        .collect();
    let mut r = Reader::new(&tail);

    // Root record: seats are padding, the remark annotates the whole game.
    let (_, _, tag, remark) = read_record(&mut r, &keys)?;
    game.tree.node_mut(MoveId::ROOT).remark = remark;

    let mut pending: Vec<MoveId> = Vec::new();
    let mut cursor = (tag & TAG_NEXT != 0).then_some((MoveId::ROOT, Link::Next));
    while let Some((at, link)) =
        cursor.take().or_else(|| pending.pop().map(|p| (p, Link::Other)))
    {
        let (f, t, tag, remark) = read_record(&mut r, &keys)?;
        let from = seat_of(f).ok_or(RecordError::BadSeat(f))?;
        let to = seat_of(t).ok_or(RecordError::BadSeat(t))?;
        let mut node = MoveNode::with_seats(from, to);
        node.remark = remark;
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

    game.reconcile()?;
    Ok(game)
}

/// Rebuild the 90-entry position buffer from the 32-byte piece table.
/// Table order matches the roster; a value is column times ten plus row,
/// anything from 90 up means the piece is off the board.
fn position_chars(h: &[u8], keys: &Keys) -> String {
    let mut table = [0u8; 32];
    if keys.version >= 12 {
        for (i, &b) in h[16..48].iter().enumerate() {
            table[(i + keys.xy as usize + 1) % 32] = b;
        }
    } else {
        table.copy_from_slice(&h[16..48]);
    }
    let mut chars = ['_'; 90];
    for (i, &b) in table.iter().enumerate() {
        let v = b.wrapping_sub(keys.xy);
        if let Some(seat) = seat_of(v) {
            chars[seat.index()] = ROSTER[i].glyph();
        }
    }
    chars.iter().collect()
}

fn seat_of(v: u8) -> Option<Seat> {
    if v < 90 { Some(Seat::new(v % 10, v / 10)) } else { None }
}

fn read_record(
    r: &mut Reader<'_>,
    keys: &Keys,
) -> Result<(u8, u8, u8, Option<String>), RecordError> {
    let b = r.take(4)?;
    let from = b[0].wrapping_sub(24).wrapping_sub(keys.from);
    let to = b[1].wrapping_sub(32).wrapping_sub(keys.to);
    let (tag, has_remark) = if keys.version <= 10 {
        // Old containers use nibble flags and always store a length.
        let mut tag = 0u8;
        if b[2] & 0xF0 != 0 {
            tag |= TAG_NEXT;
        }
        if b[2] & 0x0F != 0 {
            tag |= TAG_OTHER;
        }
        (tag, true)
    } else {
        let tag = b[2] & 0xE0;
        (tag, tag & TAG_REMARK != 0)
    };
    let remark = if has_remark {
        let size = r.u32_le()? as i64 - keys.remark_bias;
        if size > 0 {
            let bytes = r.take(size as usize)?;
            let text = String::from_utf8_lossy(bytes);
            let text = text.trim_end_matches(['\0', ' ']);
            (!text.is_empty()).then(|| text.to_string())
        } else {
            None
        }
    } else {
        None
    };
    Ok((from, to, tag, remark))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxiangqi_core::PieceId;

    /// Piece table for the standard start, in roster order
    fn start_table() -> [u8; 32] {
        let game = Instance::new();
        let mut table = [0xFFu8; 32];
        for id in PieceId::all() {
            if let Some(seat) = game.board.seat_of(id) {
                table[id.index()] = seat.col() * 10 + seat.row();
            }
        }
        table
    }

    fn plain_header(version: u8) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        h[0] = b'X';
        h[1] = b'Q';
        h[2] = version;
        h[16..48].copy_from_slice(&start_table());
        h
    }

    /// from, to, raw tag, then an old-style length even when zero
    fn v10_record(out: &mut Vec<u8>, from: u8, to: u8, tag: u8, remark: &str) {
        out.extend_from_slice(&[from.wrapping_add(24), to.wrapping_add(32), tag, 0]);
        out.extend_from_slice(&(remark.len() as u32).to_le_bytes());
        out.extend_from_slice(remark.as_bytes());
    }

    #[test]
    fn test_v10_mainline_with_remarks() {
        let mut data = plain_header(10);
        data[51] = 1;
        data[305..314].copy_from_slice(b"RedPlayer");
        data[304] = 9;
        // Root, then cannon h2e2 and knight h9g7.
        v10_record(&mut data, 0, 0, 0x10, "开局注");
        v10_record(&mut data, 72, 42, 0xF0, "");
        v10_record(&mut data, 79, 67, 0x00, "应对");

        let game = decode(&data).unwrap();
        assert_eq!(game.metadata.get("Result"), Some("1-0"));
        assert_eq!(game.metadata.get("Red"), Some("RedPlayer"));
        assert_eq!(game.tree.node(MoveId::ROOT).remark.as_deref(), Some("开局注"));
        assert_eq!(game.stats.move_count, 2);
        let first = game.tree.node(MoveId::ROOT).next.unwrap();
        assert_eq!(game.tree.node(first).zh.as_deref(), Some("炮二平五"));
        let reply = game.tree.node(first).next.unwrap();
        assert_eq!(game.tree.node(reply).zh.as_deref(), Some("马８进７"));
        assert_eq!(game.tree.node(reply).remark.as_deref(), Some("应对"));
    }

    #[test]
    fn test_v10_variation_links() {
        let mut data = plain_header(10);
        // Root -> h2e2 -> { h9g7 (mainline), b9c7 (variation) }.
        v10_record(&mut data, 0, 0, 0x10, "");
        v10_record(&mut data, 72, 42, 0xF0, "");
        v10_record(&mut data, 79, 67, 0x01, "");
        v10_record(&mut data, 19, 27, 0x00, "");

        let game = decode(&data).unwrap();
        assert_eq!(game.stats.move_count, 3);
        assert_eq!(game.stats.max_col, 1);
        let first = game.tree.node(MoveId::ROOT).next.unwrap();
        let reply = game.tree.node(first).next.unwrap();
        let var = game.tree.node(reply).other.unwrap();
        assert_eq!(game.tree.node(var).zh.as_deref(), Some("马２进３"));
        assert_eq!(game.tree.node(var).parent, Some(first));
    }

    #[test]
    fn test_v12_encrypted_round_trip_against_v10() {
        let mut h = plain_header(12);
        h[3] = 0xE9; // mask
        h[8..12].copy_from_slice(&[0x13, 0x57, 0x9B, 0xDF]); // or-keys
        h[12] = 0x4C;
        h[13] = 0x5A;
        h[14] = 0x27;
        h[15] = 0x33; // key bytes, checksum 0
        let keys = Keys::from_header(&h);

        // Scramble the piece table the way the reader unscrambles it.
        let plain_table = start_table();
        let mut scrambled = [0u8; 32];
        for i in 0..32 {
            scrambled[i] = plain_table[(i + keys.xy as usize + 1) % 32].wrapping_add(keys.xy);
        }
        h[16..48].copy_from_slice(&scrambled);

        // Plaintext move section, new-style tags.
        let mut plain = Vec::new();
        let mut record = |f: u8, t: u8, tag: u8, remark: &str| {
            plain.extend_from_slice(&[
                f.wrapping_add(24).wrapping_add(keys.from),
                t.wrapping_add(32).wrapping_add(keys.to),
                tag,
                0,
            ]);
            if tag & TAG_REMARK != 0 {
                let size = remark.len() as i64 + keys.remark_bias;
                plain.extend_from_slice(&(size as u32).to_le_bytes());
                plain.extend_from_slice(remark.as_bytes());
            }
        };
        record(0, 0, TAG_NEXT | TAG_REMARK, "加密注");
        record(72, 42, TAG_NEXT, "");
        record(79, 67, 0, "");

        let mut data = h;
        data.extend(
            plain
                .iter()
                .enumerate()
                .map(|(i, &b)| b.wrapping_add(keys.stream[i % 32])),
        );

        let game = decode(&data).unwrap();
        assert_eq!(game.start_chars(), Instance::new().start_chars());
        assert_eq!(game.tree.node(MoveId::ROOT).remark.as_deref(), Some("加密注"));
        assert_eq!(game.stats.move_count, 2);
        let first = game.tree.node(MoveId::ROOT).next.unwrap();
        assert_eq!(game.tree.node(first).zh.as_deref(), Some("炮二平五"));
        let reply = game.tree.node(first).next.unwrap();
        assert_eq!(game.tree.node(reply).zh.as_deref(), Some("马８进７"));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let mut data = plain_header(10);
        v10_record(&mut data, 0, 0, 0x10, "注");
        v10_record(&mut data, 72, 42, 0x01, "");
        v10_record(&mut data, 19, 27, 0x00, "");
        let a = decode(&data).unwrap();
        let b = decode(&data).unwrap();
        let dump = |g: &Instance| {
            g.tree
                .walk()
                .into_iter()
                .map(|id| {
                    let n = g.tree.node(id);
                    (n.from, n.to, n.zh.clone(), n.remark.clone(), n.ply, n.col)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(dump(&a), dump(&b));
        assert_eq!(a.start_chars(), b.start_chars());
    }

    #[test]
    fn test_rejects_bad_magic_and_short_input() {
        assert!(matches!(decode(&[0u8; 16]), Err(RecordError::UnexpectedEof(16))));
        let mut data = vec![0u8; HEADER_LEN + 8];
        data[0] = b'Z';
        assert!(matches!(decode(&data), Err(RecordError::BadMagic("XQF"))));
    }

    #[test]
    fn test_encode_is_unsupported() {
        let mut game = Instance::new();
        assert!(matches!(
            crate::encode(&mut game, crate::RecordFormat::Xqf),
            Err(RecordError::UnsupportedEncode(crate::RecordFormat::Xqf))
        ));
    }
}
