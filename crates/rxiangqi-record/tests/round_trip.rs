//! Cross-format equivalence: one game pushed through every encodable
//! format must come back with the same tree, notations and metadata.

use rxiangqi_core::{Instance, MoveId, Seat};
use rxiangqi_record::{decode, encode, RecordFormat};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn seat(coord: &str) -> Seat {
    Seat::from_coord(coord).unwrap()
}

/// Central cannon against screened knights, with one variation and a
/// couple of remarks.
fn sample_game() -> Instance {
    let mut game = Instance::new();
    game.metadata.set("Event", "format equivalence");
    game.metadata.set("Red", "red player");
    game.metadata.set("Black", "black player");
    game.tree.node_mut(MoveId::ROOT).remark = Some("中炮对屏风马".to_string());
    game.append_next(seat("h2"), seat("e2"), None).unwrap();
    game.append_next(seat("h9"), seat("g7"), Some("稳健".to_string())).unwrap();
    game.append_next(seat("h0"), seat("g2"), None).unwrap();
    game.append_next(seat("b9"), seat("c7"), None).unwrap();
    game.append_next(seat("i0"), seat("h0"), None).unwrap();
    // Alternative to the last red move.
    game.append_other(seat("b2"), seat("c2"), Some("五八炮".to_string())).unwrap();
    game.append_next(seat("i9"), seat("h9"), None).unwrap();
    game.reconcile().unwrap();
    game
}

/// Structure fingerprint: notation, remark and layout per walked node
fn dump(game: &Instance) -> Vec<(Option<String>, Option<String>, u16, u16)> {
    game.tree
        .walk()
        .into_iter()
        .map(|id| {
            let node = game.tree.node(id);
            (node.zh.clone(), node.remark.clone(), node.ply, node.col)
        })
        .collect()
}

const ENCODABLE: [RecordFormat; 5] = [
    RecordFormat::Bin,
    RecordFormat::Json,
    RecordFormat::TextCoord,
    RecordFormat::TextZh,
    RecordFormat::TextCc,
];

#[test]
fn every_format_round_trips_the_sample() {
    init_logger();
    let mut game = sample_game();
    let expected = dump(&game);
    for format in ENCODABLE {
        let bytes = encode(&mut game, format).unwrap();
        let back = decode(&bytes, format).unwrap();
        assert_eq!(dump(&back), expected, "{format:?}");
        assert_eq!(back.stats, game.stats, "{format:?}");
        assert_eq!(back.metadata.get("Event"), Some("format equivalence"), "{format:?}");
        assert_eq!(back.start_chars(), game.start_chars(), "{format:?}");
    }
}

#[test]
fn chained_conversions_preserve_the_tree() {
    init_logger();
    let mut game = sample_game();
    let expected = dump(&game);
    // bin -> json -> zh text -> grid -> coord text
    let mut cur = game;
    for format in ENCODABLE {
        let bytes = encode(&mut cur, format).unwrap();
        cur = decode(&bytes, format).unwrap();
    }
    assert_eq!(dump(&cur), expected);
}

#[test]
fn encoding_twice_is_stable() {
    init_logger();
    for format in ENCODABLE {
        let mut game = sample_game();
        let first = encode(&mut game, format).unwrap();
        let mut back = decode(&first, format).unwrap();
        let second = encode(&mut back, format).unwrap();
        assert_eq!(first, second, "{format:?}");
    }
}

#[test]
fn custom_position_survives_text_and_json() {
    init_logger();
    let text = "[FEN \"4k4/9/9/9/9/9/9/9/4R4/3K5\"]\n\n1. e1e8 e9f9 2. e8e9\n";
    let mut game = decode(text.as_bytes(), RecordFormat::TextCoord).unwrap();
    assert_eq!(game.stats.move_count, 3);
    let expected = dump(&game);
    for format in [RecordFormat::Json, RecordFormat::Bin, RecordFormat::TextZh] {
        let bytes = encode(&mut game, format).unwrap();
        let back = decode(&bytes, format).unwrap();
        assert_eq!(dump(&back), expected, "{format:?}");
        assert_eq!(back.start_chars(), game.start_chars(), "{format:?}");
    }
}

#[test]
fn extension_lookup() {
    assert_eq!(RecordFormat::from_extension("xqf"), Some(RecordFormat::Xqf));
    assert_eq!(RecordFormat::from_extension("cc"), Some(RecordFormat::TextCc));
    assert_eq!(RecordFormat::from_extension("zip"), None);
}
