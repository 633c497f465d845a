//! Board tests - grid storage, gravity, refill and shuffle

use match3::core::{Board, ItemProvider, SeededPalette, SimpleRng};
use match3::types::{BoardConfig, ConfigError, Coord, Item, DEFAULT_HEIGHT, DEFAULT_WIDTH};

fn layout(rows: &[&str]) -> Board {
    Board::from_layout(&BoardConfig::default(), rows).unwrap()
}

#[test]
fn test_board_new_empty() {
    let board = Board::new(&BoardConfig::default()).unwrap();
    assert_eq!(board.width(), DEFAULT_WIDTH);
    assert_eq!(board.height(), DEFAULT_HEIGHT);

    // All cells should be empty
    for c in board.coords() {
        assert_eq!(board.get(c), None, "Cell {} should be empty", c);
    }
    assert_eq!(board.empty_cells().len(), 64);
}

#[test]
fn test_invalid_configs_are_rejected() {
    let cases = [
        (BoardConfig::with_size(0, 4), "empty_grid"),
        (
            BoardConfig {
                matches_min: 1,
                ..BoardConfig::default()
            },
            "matches_min_too_small",
        ),
        (
            BoardConfig {
                matches_min: 5,
                ..BoardConfig::with_size(4, 4)
            },
            "matches_min_unformable",
        ),
        (
            BoardConfig {
                item_variety: 2,
                ..BoardConfig::default()
            },
            "invalid_item_variety",
        ),
        (
            BoardConfig {
                item_variety: 27,
                ..BoardConfig::default()
            },
            "invalid_item_variety",
        ),
        (
            BoardConfig {
                background: vec![Coord::new(8, 0)],
                ..BoardConfig::default()
            },
            "background_out_of_bounds",
        ),
    ];

    for (config, code) in cases {
        let err = Board::new(&config).unwrap_err();
        assert_eq!(err.code(), code, "{err}");
    }
}

#[test]
fn test_unknown_glyph_is_rejected() {
    let err = Board::from_layout(&BoardConfig::default(), &["AB?"]).unwrap_err();
    assert_eq!(
        err,
        ConfigError::LayoutGlyph {
            glyph: '?',
            at: Coord::new(2, 0)
        }
    );
}

#[test]
fn test_adjacency() {
    let board = layout(&["AAA", "AAA"]);
    assert!(board.is_adjacent(Coord::new(0, 0), Coord::new(1, 0)));
    assert!(board.is_adjacent(Coord::new(1, 1), Coord::new(1, 0)));
    assert!(!board.is_adjacent(Coord::new(0, 0), Coord::new(1, 1)));
    assert!(!board.is_adjacent(Coord::new(0, 0), Coord::new(2, 0)));
    assert!(!board.is_adjacent(Coord::new(0, 0), Coord::new(0, 0)));
}

#[test]
fn test_swap_exchanges_items() {
    let mut board = layout(&["ABC"]);
    board.swap(Coord::new(0, 0), Coord::new(1, 0));
    assert_eq!(board.rows(), vec!["BAC"]);
}

#[test]
fn test_shift_down_never_crosses_background() {
    let mut board = layout(&["AB", "#.", "..", "C#"]);
    board.shift_down();
    assert_eq!(board.rows(), vec!["A.", "#.", ".B", "C#"]);
}

#[test]
fn test_shift_down_moves_bonus_items() {
    let mut board = layout(&["|", ".", "A"]);
    let moves = board.shift_down();
    assert_eq!(board.rows(), vec![".", "|", "A"]);
    assert_eq!(moves, vec![(Coord::new(0, 0), Coord::new(0, 1))]);
}

#[test]
fn test_fill_empty_uses_provider_column_by_column() {
    let mut board = layout(&["A.C", ".BC"]);
    let mut palette = SeededPalette::new(7, 5);
    let spawned = board.fill_empty(&mut palette);

    let cells: Vec<Coord> = spawned.iter().map(|(c, _)| *c).collect();
    assert_eq!(cells, vec![Coord::new(0, 1), Coord::new(1, 0)]);
    assert!(!board.has_empty());
    for (c, item) in spawned {
        assert_eq!(board.get(c), Some(item));
        assert!(matches!(item, Item::Normal(color) if color.0 < 5));
    }
}

#[test]
fn test_fill_is_deterministic_per_seed() {
    let fill = |seed| {
        let mut board = Board::new(&BoardConfig::default()).unwrap();
        board.fill_empty(&mut SeededPalette::new(seed, 5));
        board
    };
    assert_eq!(fill(42), fill(42));
    assert_ne!(fill(42), fill(43));
}

#[test]
fn test_shuffle_keeps_background_and_multiset() {
    let mut board = layout(&["AB#", "C-D", "#EA"]);
    let before = board.clone();
    board.shuffle(&mut SimpleRng::new(3));

    assert!(board.is_background(Coord::new(2, 0)));
    assert!(board.is_background(Coord::new(0, 2)));

    let mut a: Vec<String> = before.rows().join("").chars().map(String::from).collect();
    let mut b: Vec<String> = board.rows().join("").chars().map(String::from).collect();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn test_palette_bonus_sprites_follow_colors() {
    use match3::types::{BonusDirection, SpriteId};

    let palette = SeededPalette::new(1, 5);
    assert_eq!(palette.bonus_sprite(BonusDirection::Horizontal), SpriteId(5));
    assert_eq!(palette.bonus_sprite(BonusDirection::Vertical), SpriteId(6));
}

#[test]
fn test_display_matches_rows() {
    let board = layout(&["ABC", "#|A"]);
    assert_eq!(board.to_string(), "ABC\n#|A\n");
}
