//! Core resolution module - pure, deterministic, and testable
//!
//! This crate contains the match-3 board rules and the cascade state machine.
//! It has **zero dependencies** on rendering, networking, or I/O, making it:
//!
//! - **Deterministic**: Same seed and same inputs produce the same cascades
//! - **Testable**: Scripted item providers make every refill predictable
//! - **Portable**: Runs headless, behind the adapter, or under a renderer
//!
//! # Module Structure
//!
//! - [`board`]: grid storage, gravity (`shift_down`), refill and shuffle
//! - [`matcher`]: run detection along both axes
//! - [`bonus`]: bonus creation rules and line blasts
//! - [`potential`]: which swaps would match right now (deadlock and hints)
//! - [`hint`]: idle timer for the move hint
//! - [`resolver`]: the [`Engine`] phase machine tying everything together
//! - [`palette`]: the [`ItemProvider`] seam for colors and bonus sprites
//! - [`rng`]: seeded LCG used for colors and shuffles
//! - [`snapshot`]: point-in-time view for observers
//!
//! # Rules
//!
//! - **Swap**: two adjacent movable items exchange places; without a match the
//!   swap is undone
//! - **Match**: a straight run of at least `matches_min` equal colors
//! - **Bonus**: a match longer than `matches_min` leaves a line-clearing bonus
//!   behind; swapping a bonus sets it off
//! - **Cascade**: explode, shift down, refill, repeat until no match remains
//! - **Shuffle**: a settled board without any match-producing swap is permuted
//!
//! # Example
//!
//! ```
//! use match3_core::{Engine, Phase};
//! use match3_core::types::{BoardConfig, PhaseTimings};
//!
//! let config = BoardConfig {
//!     timings: PhaseTimings::instant(),
//!     ..BoardConfig::default()
//! };
//! let mut engine = Engine::new(&config).unwrap();
//! engine.start().unwrap();
//! engine.settle().unwrap();
//!
//! let swap = engine.suggest_swap().unwrap();
//! assert!(engine.request_swap(swap.a, swap.b));
//! engine.settle().unwrap();
//! assert_eq!(engine.phase(), Phase::Idle);
//! assert!(!engine.is_busy());
//! ```
//!
//! # Timing
//!
//! Each phase waits for its duration from [`types::PhaseTimings`]. Either call
//! [`Engine::tick`] every frame with elapsed time, or call
//! [`Engine::phase_complete`] when the matching animation finishes.

pub mod board;
pub mod bonus;
pub mod hint;
pub mod matcher;
pub mod palette;
pub mod potential;
pub mod resolver;
pub mod rng;
pub mod snapshot;

pub use match3_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use hint::HintTimer;
pub use matcher::{find_first_match, matches_at, Match};
pub use palette::{ItemProvider, SeededPalette};
pub use potential::{find_potential_matches, find_potential_swaps, PotentialMatch};
pub use resolver::{Engine, EngineError, Phase};
pub use rng::SimpleRng;
pub use snapshot::BoardSnapshot;
