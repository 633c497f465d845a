//! Engine tests - swap validation, cascades, shuffles and lifecycle

use match3::core::matcher::find_first_match;
use match3::core::{Board, Engine, ItemProvider, Phase, SeededPalette};
use match3::types::{
    BoardConfig, BoardEvent, BonusDirection, Color, Coord, Item, PhaseTimings, SpriteId,
};

fn instant() -> BoardConfig {
    BoardConfig {
        timings: PhaseTimings::instant(),
        ..BoardConfig::default()
    }
}

fn engine_with(config: &BoardConfig, rows: &[&str]) -> Engine {
    let board = Board::from_layout(config, rows).unwrap();
    Engine::from_board(
        board,
        config,
        SeededPalette::new(config.seed, config.item_variety),
    )
}

/// Refills from a fixed color script, repeating
struct Script {
    colors: Vec<u8>,
    next: usize,
}

impl Script {
    fn new(colors: &[u8]) -> Self {
        Self {
            colors: colors.to_vec(),
            next: 0,
        }
    }
}

impl ItemProvider for Script {
    fn random_color(&mut self, _variety: u8) -> Color {
        let c = self.colors[self.next % self.colors.len()];
        self.next += 1;
        Color(c)
    }

    fn bonus_sprite(&self, _direction: BonusDirection) -> SpriteId {
        SpriteId(0)
    }
}

#[test]
fn test_aba_swap_reverts_to_exact_layout() {
    let config = instant();
    let mut engine = engine_with(&config, &["ABA"]);
    let before = engine.board().clone();

    assert!(engine.request_swap(Coord::new(0, 0), Coord::new(1, 0)));
    assert_eq!(engine.board().rows(), vec!["BAA"]);
    engine.settle().unwrap();

    assert_eq!(engine.board(), &before);
    assert_eq!(
        engine.drain_events(),
        vec![
            BoardEvent::SwapStarted {
                a: Coord::new(0, 0),
                b: Coord::new(1, 0)
            },
            BoardEvent::SwapReverted {
                a: Coord::new(0, 0),
                b: Coord::new(1, 0)
            },
        ]
    );
}

#[test]
fn test_background_refuses_swaps() {
    let config = instant();
    let mut engine = engine_with(&config, &["A#C", "BCA"]);
    assert!(!engine.request_swap(Coord::new(0, 0), Coord::new(1, 0)));
    assert!(engine.drain_events().is_empty());
    assert_eq!(engine.phase(), Phase::Idle);
}

#[test]
#[should_panic(expected = "outside")]
fn test_out_of_bounds_swap_panics() {
    let config = instant();
    let mut engine = engine_with(&config, &["ABC"]);
    engine.request_swap(Coord::new(2, 0), Coord::new(3, 0));
}

#[test]
fn test_five_run_places_bonus_at_destination() {
    let config = instant();
    let mut engine = engine_with(&config, &["AABAA", "CDAEC", "BBEBD"]);
    assert!(engine.request_swap(Coord::new(2, 1), Coord::new(2, 0)));
    engine.settle().unwrap();

    let events = engine.drain_events();
    let bonuses: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            BoardEvent::BonusCreated { cell, direction, .. } => Some((*cell, *direction)),
            _ => None,
        })
        .collect();
    assert_eq!(bonuses, vec![(Coord::new(2, 0), BonusDirection::Horizontal)]);
    assert!(find_first_match(engine.board()).is_none());
    assert_eq!(engine.moves(), 1);
}

fn bonuses_created(events: &[BoardEvent]) -> Vec<(Coord, BonusDirection)> {
    events
        .iter()
        .filter_map(|e| match e {
            BoardEvent::BonusCreated { cell, direction, .. } => Some((*cell, *direction)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_four_run_creates_one_horizontal_bonus() {
    let config = instant();
    let mut engine = engine_with(&config, &["AABA", "CDAE", "BCEB"]);
    assert!(engine.request_swap(Coord::new(2, 1), Coord::new(2, 0)));
    engine.phase_complete().unwrap();

    let events = engine.drain_events();
    assert!(events.contains(&BoardEvent::MoveAccepted));
    assert_eq!(
        bonuses_created(&events),
        vec![(Coord::new(2, 0), BonusDirection::Horizontal)]
    );
    assert_eq!(engine.board().rows()[0], "..-.");
}

#[test]
fn test_four_run_column_creates_vertical_bonus() {
    let config = instant();
    let mut engine = engine_with(&config, &["ABC", "ACD", "BAE", "ADC"]);
    assert!(engine.request_swap(Coord::new(1, 2), Coord::new(0, 2)));
    engine.phase_complete().unwrap();

    let events = engine.drain_events();
    assert_eq!(
        bonuses_created(&events),
        vec![(Coord::new(0, 2), BonusDirection::Vertical)]
    );
    let column: String = engine
        .board()
        .rows()
        .iter()
        .filter_map(|r| r.chars().next())
        .collect();
    assert_eq!(column, "..|.");
    assert_eq!(engine.moves(), 1);
}

#[test]
fn test_bonus_chain_clears_row_and_column() {
    // Swapping the horizontal bonus down sets off row 1, which holds a
    // vertical bonus that then clears column 3.
    let config = instant();
    let mut engine = engine_with(&config, &["A-CA", "BCA|", "CABD"]);
    assert!(engine.request_swap(Coord::new(1, 0), Coord::new(1, 1)));
    engine.phase_complete().unwrap();

    let exploded: Vec<Coord> = engine
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            BoardEvent::Exploded { cell, .. } => Some(cell),
            _ => None,
        })
        .collect();
    assert_eq!(exploded.len(), 6);
    for c in [Coord::new(3, 0), Coord::new(3, 2), Coord::new(0, 1)] {
        assert!(exploded.contains(&c), "{c} should explode");
    }
    assert_eq!(engine.phase(), Phase::Exploding);
}

#[test]
fn test_falling_items_cascade() {
    // The vertical A run explodes, the B above falls into row 3 and lines up
    // with the two Bs already there.
    let config = instant();
    let board = Board::from_layout(&config, &["BCD", "ADC", "ACD", "BAB"]).unwrap();
    let mut engine = Engine::from_board(board, &config, Script::new(&[0, 2, 0, 1, 0, 1]));
    assert!(engine.request_swap(Coord::new(0, 3), Coord::new(1, 3)));
    engine.settle().unwrap();

    assert_eq!(engine.board().rows(), vec!["BAB", "ACD", "CDC", "ACD"]);
    assert_eq!(engine.moves(), 1);
    assert_eq!(engine.cascades(), 2);

    let events = engine.drain_events();
    let exploded = events
        .iter()
        .filter(|e| matches!(e, BoardEvent::Exploded { .. }))
        .count();
    assert_eq!(exploded, 6);
    assert!(events.contains(&BoardEvent::Shifted {
        from: Coord::new(0, 0),
        to: Coord::new(0, 3)
    }));
}

#[test]
fn test_deadlocked_board_is_shuffled() {
    let config = BoardConfig {
        item_variety: 3,
        seed: 11,
        ..instant()
    };
    let mut engine = engine_with(&config, &["ABC", "BCA", "CAB"]);
    assert!(engine.potential_matches().is_empty());

    engine.resolve().unwrap();
    assert_eq!(engine.phase(), Phase::Shuffling);
    engine.settle().unwrap();

    let events = engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, BoardEvent::Shuffled { attempt: 1 })));
    assert!(matches!(events.last(), Some(BoardEvent::Settled { .. })));
    assert!(!engine.potential_matches().is_empty());
}

#[test]
fn test_pause_still_honours_phase_complete() {
    let config = instant();
    let mut engine = engine_with(&config, &["ABA"]);
    assert!(engine.request_swap(Coord::new(0, 0), Coord::new(1, 0)));
    engine.set_paused(true);

    assert_eq!(engine.tick(1_000), Ok(false));
    engine.phase_complete().unwrap();
    assert!(matches!(engine.phase(), Phase::Reverting { .. }));
}

#[test]
fn test_game_over_aborts_on_tick() {
    let config = instant();
    let mut engine = engine_with(&config, &["AABAA", "CDAEC", "BBEBD"]);
    assert!(engine.request_swap(Coord::new(2, 1), Coord::new(2, 0)));
    engine.set_game_over();

    assert_eq!(engine.tick(16), Ok(false));
    assert_eq!(engine.phase(), Phase::Idle);
    assert!(engine.is_busy());
    // The optimistic swap stays on the board.
    assert_eq!(engine.board().rows()[0], "AAAAA");
    assert!(!engine.request_swap(Coord::new(0, 1), Coord::new(1, 1)));
}

#[test]
fn test_timed_cascade_via_ticks() {
    let config = BoardConfig::default();
    let mut engine = engine_with(&config, &["AABAA", "CDAEC", "BBEBD"]);
    assert!(engine.request_swap(Coord::new(2, 1), Coord::new(2, 0)));

    let mut completed = 0;
    for _ in 0..200 {
        if engine.tick(16).unwrap() {
            completed += 1;
        }
        if engine.phase() == Phase::Idle {
            break;
        }
    }
    // swap, explode, shift, refill
    assert!(completed >= 4);
    assert_eq!(engine.phase(), Phase::Idle);
    assert!(engine
        .board()
        .cells()
        .contains(&Some(Item::Bonus(BonusDirection::Horizontal))));
}

#[test]
fn test_snapshot_reflects_engine() {
    let config = instant();
    let mut engine = engine_with(&config, &["ABA", "CDA", "EEB"]);
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.rows, vec!["ABA", "CDA", "EEB"]);
    assert_eq!(snapshot.phase, "idle");
    assert!(snapshot.playable());

    engine.set_paused(true);
    let snapshot = engine.snapshot();
    assert!(snapshot.paused);
    assert!(!snapshot.playable());
}
