//! Adapter protocol tests - parsing, mapping and observations without a socket

use match3::adapter::{
    apply_command, build_observation, create_swap, map_command, parse_message, ClientCommand,
    ParsedMessage,
};
use match3::core::{Board, Engine, SeededPalette};
use match3::types::{BoardConfig, Coord, PhaseTimings};

fn engine(rows: &[&str]) -> Engine {
    let config = BoardConfig {
        timings: PhaseTimings::instant(),
        ..BoardConfig::default()
    };
    let board = Board::from_layout(&config, rows).unwrap();
    Engine::from_board(board, &config, SeededPalette::new(1, config.item_variety))
}

#[test]
fn swap_command_roundtrips_into_engine() {
    let line = create_swap(2, Coord::new(2, 1), Coord::new(2, 0)).to_string();
    let ParsedMessage::Command(cmd) = parse_message(&line).unwrap() else {
        panic!("expected command");
    };
    let mapped = map_command(&cmd).unwrap();
    assert_eq!(
        mapped,
        ClientCommand::Swap {
            a: Coord::new(2, 1),
            b: Coord::new(2, 0)
        }
    );

    let mut e = engine(&["AABAA", "CDAEC", "BBEBD"]);
    apply_command(&mut e, mapped).unwrap();
    e.settle().unwrap();
    assert_eq!(e.moves(), 1);
}

#[test]
fn observation_carries_board_and_events() {
    let mut e = engine(&["AABAA", "CDAEC", "BBEBD"]);
    e.request_swap(Coord::new(2, 1), Coord::new(2, 0));
    e.settle().unwrap();
    let events = e.drain_events();

    let obs = build_observation(&e.snapshot(), &events, 7);
    let v = serde_json::to_value(&obs).unwrap();

    assert_eq!(v["type"], "observation");
    assert_eq!(v["seq"], 7);
    assert_eq!(v["phase"], "idle");
    assert_eq!(v["playable"], true);
    assert_eq!(v["moves"], 1);
    assert_eq!(v["board"]["width"], 5);
    assert_eq!(v["board"]["rows"].as_array().unwrap().len(), 3);

    let kinds: Vec<&str> = v["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ev| ev["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.first(), Some(&"swapStarted"));
    assert!(kinds.contains(&"moveAccepted"));
    assert!(kinds.contains(&"bonusCreated"));
    assert_eq!(kinds.last(), Some(&"settled"));
}

#[test]
fn paused_engine_is_not_playable() {
    let mut e = engine(&["ABA"]);
    apply_command(&mut e, ClientCommand::Pause).unwrap();
    let obs = build_observation(&e.snapshot(), &[], 1);
    assert!(!obs.playable);
    assert!(obs.paused);
    assert!(obs.events.is_empty());
}

#[test]
fn rejected_swap_reports_code() {
    let mut e = engine(&["ABA"]);
    apply_command(&mut e, ClientCommand::GameOver).unwrap();
    let err = apply_command(
        &mut e,
        ClientCommand::Swap {
            a: Coord::new(0, 0),
            b: Coord::new(1, 0),
        },
    )
    .unwrap_err();
    assert_eq!(err.code(), "swap_rejected");
}
