//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no logic dependencies, making them usable in
//! any context (core resolution, adapter protocol, headless runner).
//!
//! # Board Coordinates
//!
//! - `col` ranges `0..width` (left to right)
//! - `row` ranges `0..height` (top to bottom); "down" means increasing row
//!
//! # Phase Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Fixed timestep interval (~60 FPS) |
//! | `SWAP_MS` | 200 | Swap (and swap-back) animation |
//! | `EXPLODE_MS` | 0 | Explosion before items start falling |
//! | `SHIFT_MS` | 200 | Items falling into vacated cells |
//! | `REFILL_MS` | 200 | New items dropping in from the top |
//! | `SHUFFLE_MS` | 300 | Board reshuffle on stalemate |
//! | `HINT_IDLE_MS` | 5000 | Idle time before a hint is shown |
//!
//! # Layout Notation
//!
//! Boards are written as rows of glyphs, top row first:
//!
//! | Glyph | Cell |
//! |-------|------|
//! | `A`..`Z` | `Normal` item of color 0..25 |
//! | `#` | `Background` obstacle |
//! | `-` | Horizontal bonus |
//! | `\|` | Vertical bonus |
//! | `.` | Empty (only observable mid-cascade) |
//!
//! # Examples
//!
//! ```
//! use match3_types::{parse_cell, cell_glyph, BonusDirection, Color, Coord, Item};
//!
//! assert_eq!(parse_cell('C'), Some(Some(Item::Normal(Color(2)))));
//! assert_eq!(parse_cell('|'), Some(Some(Item::Bonus(BonusDirection::Vertical))));
//! assert_eq!(parse_cell('.'), Some(None));
//! assert_eq!(cell_glyph(Some(Item::Background)), '#');
//!
//! let a = Coord::new(2, 3);
//! assert_eq!(a.to_string(), "(2,3)");
//! ```

use std::fmt;

use thiserror::Error;

/// Default board width in cells
pub const DEFAULT_WIDTH: u8 = 8;

/// Default board height in cells
pub const DEFAULT_HEIGHT: u8 = 8;

/// Default minimum run length that counts as a match
pub const DEFAULT_MATCHES_MIN: u8 = 3;

/// Default number of normal colors
pub const DEFAULT_ITEM_VARIETY: u8 = 5;

/// Upper bound on colors (one letter per color in the layout notation)
pub const MAX_ITEM_VARIETY: u8 = 26;

/// Swap animation duration
pub const SWAP_MS: u32 = 200;

/// Explosion phase duration (resolution resumes on the same frame)
pub const EXPLODE_MS: u32 = 0;

/// Shift-down phase duration
pub const SHIFT_MS: u32 = 200;

/// Refill phase duration
pub const REFILL_MS: u32 = 200;

/// Shuffle phase duration
pub const SHUFFLE_MS: u32 = 300;

/// Idle time before the current potential matches are hinted
pub const HINT_IDLE_MS: u32 = 5000;

/// Fixed timestep of the runner loop
pub const TICK_MS: u32 = 16;

/// Consecutive shuffles allowed before the board is declared unsatisfiable
pub const MAX_SHUFFLE_ATTEMPTS: u32 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_timings() {
        assert_eq!(SHIFT_MS, 200);
        assert_eq!(REFILL_MS, 200);
        assert_eq!(SHUFFLE_MS, 300);
        assert_eq!(EXPLODE_MS, 0);
    }

    #[test]
    fn glyphs_cover_every_kind() {
        for ch in ['A', 'Z', '#', '-', '|', '.'] {
            let cell = parse_cell(ch).expect("known glyph");
            assert_eq!(cell_glyph(cell), ch);
        }
        assert_eq!(parse_cell('a'), None);
        assert_eq!(parse_cell('?'), None);
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(BoardConfig::default().validate(), Ok(()));
    }

    #[test]
    fn config_rejects_small_matches_min() {
        let config = BoardConfig {
            matches_min: 1,
            ..BoardConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MatchesMinTooSmall(1)));
    }

    #[test]
    fn config_rejects_unformable_matches_min() {
        let config = BoardConfig {
            matches_min: 5,
            item_variety: 5,
            ..BoardConfig::with_size(4, 4)
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MatchesMinUnformable {
                matches_min: 5,
                width: 4,
                height: 4
            })
        );

        // A single long row is enough.
        let config = BoardConfig {
            matches_min: 5,
            item_variety: 5,
            ..BoardConfig::with_size(5, 1)
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn config_rejects_empty_grid() {
        let config = BoardConfig {
            width: 0,
            ..BoardConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyGrid {
                width: 0,
                height: DEFAULT_HEIGHT
            })
        );
    }

    #[test]
    fn config_rejects_variety_below_matches_min() {
        let config = BoardConfig {
            matches_min: 4,
            item_variety: 3,
            ..BoardConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::VarietyTooSmall {
                item_variety: 3,
                matches_min: 4
            })
        );
    }

    #[test]
    fn config_rejects_background_outside_grid() {
        let config = BoardConfig {
            background: vec![Coord::new(DEFAULT_WIDTH, 0)],
            ..BoardConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BackgroundOutOfBounds(_))
        ));
    }
}

/// Board position, `col` left to right and `row` top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub col: u8,
    pub row: u8,
}

impl Coord {
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Offset by (dc, dr); `None` when the result would be negative or overflow u8
    pub fn offset(self, dc: i16, dr: i16) -> Option<Self> {
        let col = u8::try_from(self.col as i16 + dc).ok()?;
        let row = u8::try_from(self.row as i16 + dr).ok()?;
        Some(Self { col, row })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

/// Index into the normal-item palette (`0..item_variety`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(pub u8);

impl Color {
    /// Layout letter for this color (`A` for 0)
    pub fn glyph(self) -> char {
        (b'A' + self.0.min(MAX_ITEM_VARIETY - 1)) as char
    }
}

/// Axis cleared by a bonus item when it explodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BonusDirection {
    /// Clears the whole row
    Horizontal,
    /// Clears the whole column
    Vertical,
}

impl BonusDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusDirection::Horizontal => "horizontal",
            BonusDirection::Vertical => "vertical",
        }
    }

    /// Index into the bonus sprite table
    pub fn index(&self) -> u16 {
        match self {
            BonusDirection::Horizontal => 0,
            BonusDirection::Vertical => 1,
        }
    }
}

/// Opaque asset handle handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u16);

/// A piece on the board
///
/// Items are values: moving an item between cells copies the value, there is
/// no identity to preserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    /// Colored piece, matched by color equality
    Normal(Color),
    /// Row or column clearer created by oversized matches
    Bonus(BonusDirection),
    /// Immovable layout obstacle
    Background,
}

impl Item {
    /// Whether the item can be swapped, shifted and shuffled
    pub fn is_movable(&self) -> bool {
        match self {
            Item::Normal(_) | Item::Bonus(_) => true,
            Item::Background => false,
        }
    }

    /// Color for normal items, `None` for everything else
    pub fn color(&self) -> Option<Color> {
        match self {
            Item::Normal(color) => Some(*color),
            Item::Bonus(_) | Item::Background => None,
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            Item::Normal(color) => color.glyph(),
            Item::Bonus(BonusDirection::Horizontal) => '-',
            Item::Bonus(BonusDirection::Vertical) => '|',
            Item::Background => '#',
        }
    }
}

/// A board cell: `None` is empty, `Some(item)` is occupied
pub type Cell = Option<Item>;

/// Glyph for a cell in the layout notation
pub fn cell_glyph(cell: Cell) -> char {
    match cell {
        Some(item) => item.glyph(),
        None => '.',
    }
}

/// Parse a layout glyph; returns `None` for unknown characters
pub fn parse_cell(ch: char) -> Option<Cell> {
    match ch {
        'A'..='Z' => Some(Some(Item::Normal(Color(ch as u8 - b'A')))),
        '#' => Some(Some(Item::Background)),
        '-' => Some(Some(Item::Bonus(BonusDirection::Horizontal))),
        '|' => Some(Some(Item::Bonus(BonusDirection::Vertical))),
        '.' => Some(None),
        _ => None,
    }
}

/// Notification emitted by the engine, drained by presentation and scoring.
///
/// Events are ordered; consumers play them back in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// Optimistic swap applied, animate the exchange
    SwapStarted { a: Coord, b: Coord },
    /// Swap produced no match and was undone
    SwapReverted { a: Coord, b: Coord },
    /// A player move produced a match
    MoveAccepted,
    /// Item removed from a cell
    Exploded { cell: Coord, item: Item },
    /// Bonus placed after an oversized match
    BonusCreated {
        cell: Coord,
        direction: BonusDirection,
        sprite: SpriteId,
    },
    /// Item fell from one cell to another
    Shifted { from: Coord, to: Coord },
    /// New item dropped into an empty cell
    Spawned { cell: Coord, item: Item },
    /// No moves were left and the board was permuted
    Shuffled { attempt: u32 },
    /// Idle timeout reached, highlight these cells
    HintShown { cells: Vec<Coord> },
    /// Stop highlighting these cells
    HintCancelled { cells: Vec<Coord> },
    /// Cascade finished; `potential` moves are available
    Settled { potential: usize },
}

/// Durations of the time-gated resolution phases, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    pub swap_ms: u32,
    pub explode_ms: u32,
    pub shift_ms: u32,
    pub refill_ms: u32,
    pub shuffle_ms: u32,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            swap_ms: SWAP_MS,
            explode_ms: EXPLODE_MS,
            shift_ms: SHIFT_MS,
            refill_ms: REFILL_MS,
            shuffle_ms: SHUFFLE_MS,
        }
    }
}

impl PhaseTimings {
    /// All phases complete on the next tick (headless runs, tests)
    pub fn instant() -> Self {
        Self {
            swap_ms: 0,
            explode_ms: 0,
            shift_ms: 0,
            refill_ms: 0,
            shuffle_ms: 0,
        }
    }
}

/// Board configuration, read once at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub width: u8,
    pub height: u8,
    /// Minimum run length that counts as a match
    pub matches_min: u8,
    /// Number of normal colors
    pub item_variety: u8,
    /// Cells permanently occupied by `Item::Background`
    pub background: Vec<Coord>,
    pub hint_idle_ms: u32,
    pub timings: PhaseTimings,
    pub max_shuffle_attempts: u32,
    pub seed: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            matches_min: DEFAULT_MATCHES_MIN,
            item_variety: DEFAULT_ITEM_VARIETY,
            background: Vec::new(),
            hint_idle_ms: HINT_IDLE_MS,
            timings: PhaseTimings::default(),
            max_shuffle_attempts: MAX_SHUFFLE_ATTEMPTS,
            seed: 1,
        }
    }
}

impl BoardConfig {
    /// Default config with the given dimensions
    pub fn with_size(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Overlay environment variables on the defaults
    pub fn from_env() -> Self {
        use std::env;

        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|s| s.trim().parse().ok())
        }

        let defaults = Self::default();
        Self {
            width: parsed("MATCH3_WIDTH").unwrap_or(defaults.width),
            height: parsed("MATCH3_HEIGHT").unwrap_or(defaults.height),
            matches_min: parsed("MATCH3_MATCHES_MIN").unwrap_or(defaults.matches_min),
            item_variety: parsed("MATCH3_ITEM_VARIETY").unwrap_or(defaults.item_variety),
            seed: parsed("MATCH3_SEED").unwrap_or(defaults.seed),
            hint_idle_ms: parsed("MATCH3_HINT_MS").unwrap_or(defaults.hint_idle_ms),
            max_shuffle_attempts: parsed("MATCH3_MAX_SHUFFLES")
                .unwrap_or(defaults.max_shuffle_attempts),
            ..defaults
        }
    }

    pub fn contains(&self, c: Coord) -> bool {
        c.col < self.width && c.row < self.height
    }

    /// Reject configurations that cannot produce a playable board
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.matches_min < 2 {
            return Err(ConfigError::MatchesMinTooSmall(self.matches_min));
        }
        if self.matches_min > self.width.max(self.height) {
            return Err(ConfigError::MatchesMinUnformable {
                matches_min: self.matches_min,
                width: self.width,
                height: self.height,
            });
        }
        if self.item_variety < self.matches_min {
            return Err(ConfigError::VarietyTooSmall {
                item_variety: self.item_variety,
                matches_min: self.matches_min,
            });
        }
        if self.item_variety > MAX_ITEM_VARIETY {
            return Err(ConfigError::VarietyTooLarge(self.item_variety));
        }
        if let Some(&c) = self.background.iter().find(|&&c| !self.contains(c)) {
            return Err(ConfigError::BackgroundOutOfBounds(c));
        }
        Ok(())
    }
}

/// Fatal construction errors; the board refuses to initialize
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid must have non-zero size, got {width}x{height}")]
    EmptyGrid { width: u8, height: u8 },
    #[error("matches_min must be at least 2, got {0}")]
    MatchesMinTooSmall(u8),
    #[error("no run of {matches_min} fits on a {width}x{height} grid")]
    MatchesMinUnformable { matches_min: u8, width: u8, height: u8 },
    #[error("item_variety {item_variety} is smaller than matches_min {matches_min}")]
    VarietyTooSmall { item_variety: u8, matches_min: u8 },
    #[error("item_variety {0} exceeds the {MAX_ITEM_VARIETY} supported colors")]
    VarietyTooLarge(u8),
    #[error("background cell {0} is outside the grid")]
    BackgroundOutOfBounds(Coord),
    #[error("layout row {row} has {got_width} cells, expected {width}")]
    LayoutSize { row: usize, width: usize, got_width: usize },
    #[error("unknown layout glyph {glyph:?} at {at}")]
    LayoutGlyph { glyph: char, at: Coord },
    #[error("layout color {color} at {at} is outside item_variety {item_variety}")]
    LayoutColor { color: u8, at: Coord, item_variety: u8 },
}

impl ConfigError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::EmptyGrid { .. } => "empty_grid",
            ConfigError::MatchesMinTooSmall(_) => "matches_min_too_small",
            ConfigError::MatchesMinUnformable { .. } => "matches_min_unformable",
            ConfigError::VarietyTooSmall { .. } | ConfigError::VarietyTooLarge(_) => {
                "invalid_item_variety"
            }
            ConfigError::BackgroundOutOfBounds(_) => "background_out_of_bounds",
            ConfigError::LayoutSize { .. }
            | ConfigError::LayoutGlyph { .. }
            | ConfigError::LayoutColor { .. } => "invalid_layout",
        }
    }
}
