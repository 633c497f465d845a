//! Cascade resolver - the swap/explode/shift/refill state machine
//!
//! The engine owns the board and advances through time-gated phases. Every
//! phase is a suspension point: the engine does its work on entry, then waits
//! for [`Engine::phase_complete`] (an external "animation finished" signal) or
//! for [`Engine::tick`] to run the phase timer down.
//!
//! ```text
//! Idle --request_swap--> Swapping --no match--> Reverting --> Idle
//!                           |
//!                           +--match / bonus--> Exploding --> Shifting --> Refilling
//!                                                   ^                          |
//!                                                   +-------- match found -----+
//!                                                                              |
//!                              Idle <-- moves left -- evaluate <--- Shuffling -+
//! ```

use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::board::Board;
use crate::bonus::{bonus_cell, bonus_direction, earns_bonus, expand_blast};
use crate::hint::HintTimer;
use crate::matcher::{find_first_match, swap_matches, Match};
use crate::palette::{ItemProvider, SeededPalette};
use crate::potential::{find_potential_matches, find_potential_swaps, PotentialMatch};
use crate::rng::SimpleRng;
use crate::snapshot::BoardSnapshot;
use crate::types::{BoardConfig, BoardEvent, ConfigError, Coord, Item, PhaseTimings};

/// Resolution phase; anything but `Idle` is a pending suspension point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Optimistic swap applied, waiting to evaluate it
    Swapping { a: Coord, b: Coord },
    /// Swap undone, waiting for the swap-back animation
    Reverting { a: Coord, b: Coord },
    Exploding,
    Shifting,
    Refilling,
    Shuffling,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Swapping { .. } => "swapping",
            Phase::Reverting { .. } => "reverting",
            Phase::Exploding => "exploding",
            Phase::Shifting => "shifting",
            Phase::Refilling => "refilling",
            Phase::Shuffling => "shuffling",
        }
    }

    fn duration_ms(&self, timings: &PhaseTimings) -> u32 {
        match self {
            Phase::Idle => 0,
            Phase::Swapping { .. } | Phase::Reverting { .. } => timings.swap_ms,
            Phase::Exploding => timings.explode_ms,
            Phase::Shifting => timings.shift_ms,
            Phase::Refilling => timings.refill_ms,
            Phase::Shuffling => timings.shuffle_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("board still has no valid move after {attempts} shuffles")]
    UnsatisfiableBoard { attempts: u32 },
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnsatisfiableBoard { .. } => "unsatisfiable_board",
        }
    }
}

/// Match-3 resolution engine
#[derive(Debug, Clone)]
pub struct Engine<P: ItemProvider = SeededPalette> {
    board: Board,
    provider: P,
    /// Drives shuffles; colors come from the provider
    rng: SimpleRng,
    timings: PhaseTimings,
    max_shuffle_attempts: u32,
    seed: u32,
    phase: Phase,
    phase_timer_ms: u32,
    started: bool,
    paused: bool,
    game_over: bool,
    /// Cells of the current potential matches (hint targets)
    potential: Vec<Coord>,
    hint: HintTimer,
    /// Consecutive shuffles without reaching a solvable board
    shuffle_attempts: u32,
    /// Accepted player moves
    moves: u32,
    /// Explosions since the last accepted swap
    cascades: u32,
    events: Vec<BoardEvent>,
}

impl Engine<SeededPalette> {
    /// Create an engine with the seeded default palette
    pub fn new(config: &BoardConfig) -> Result<Self, ConfigError> {
        let palette = SeededPalette::new(config.seed, config.item_variety);
        Self::with_provider(config, palette)
    }
}

impl<P: ItemProvider> Engine<P> {
    /// Create an engine with an empty board; call [`Engine::start`] to fill it
    pub fn with_provider(config: &BoardConfig, provider: P) -> Result<Self, ConfigError> {
        let board = Board::new(config)?;
        let mut engine = Self::from_board(board, config, provider);
        engine.started = false;
        Ok(engine)
    }

    /// Wrap an existing board as-is (no fill, no resolution).
    ///
    /// Timings, hint delay, shuffle cap and seed come from `config`; board
    /// dimensions come from `board`.
    pub fn from_board(board: Board, config: &BoardConfig, provider: P) -> Self {
        let mut engine = Self {
            board,
            provider,
            rng: SimpleRng::new(config.seed.wrapping_add(1)),
            timings: config.timings,
            max_shuffle_attempts: config.max_shuffle_attempts,
            seed: config.seed,
            phase: Phase::Idle,
            phase_timer_ms: 0,
            started: true,
            paused: false,
            game_over: false,
            potential: Vec::new(),
            hint: HintTimer::new(config.hint_idle_ms),
            shuffle_attempts: 0,
            moves: 0,
            cascades: 0,
            events: Vec::new(),
        };
        engine.refresh_potential();
        engine
    }

    /// Fill the board and run the initial resolution
    #[instrument(skip(self), fields(seed = self.seed))]
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.refill();
        self.evaluate()
    }

    /// Evaluate the current board as if a cascade just finished.
    ///
    /// Resolves leftover matches and reshuffles a deadlocked board. No-op
    /// before `start` and while a phase is pending.
    pub fn resolve(&mut self) -> Result<(), EngineError> {
        if !self.started || self.phase != Phase::Idle || self.game_over {
            return Ok(());
        }
        self.evaluate()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn cascades(&self) -> u32 {
        self.cascades
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn hint_shown(&self) -> bool {
        self.hint.is_shown()
    }

    /// Remaining time of the pending phase
    pub fn phase_timer_ms(&self) -> u32 {
        self.phase_timer_ms
    }

    /// Cells of the current potential matches (empty while resolving)
    pub fn potential_matches(&self) -> &[Coord] {
        &self.potential
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Swap requests are refused while busy
    pub fn is_busy(&self) -> bool {
        !self.started || self.paused || self.game_over || self.phase != Phase::Idle
    }

    /// First available match-producing swap, if the engine is idle.
    ///
    /// Prefers plain color swaps; a swap that moves a bonus sets the bonus off
    /// instead of matching, so it is only suggested when nothing else works.
    pub fn suggest_swap(&self) -> Option<PotentialMatch> {
        if self.is_busy() {
            return None;
        }
        let swaps = find_potential_swaps(&self.board);
        let is_bonus = |c: Coord| matches!(self.board.get(c), Some(Item::Bonus(_)));
        swaps
            .iter()
            .find(|p| !is_bonus(p.a) && !is_bonus(p.b))
            .or_else(|| swaps.first())
            .copied()
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Player swap request. Returns false (and changes nothing) when the
    /// engine is busy, the cells are not adjacent, or either cell holds no
    /// movable item.
    ///
    /// Panics if either coordinate is outside the board.
    #[track_caller]
    pub fn request_swap(&mut self, a: Coord, b: Coord) -> bool {
        let (item_a, item_b) = (self.board.get(a), self.board.get(b));

        if self.is_busy() || !self.board.is_adjacent(a, b) {
            return false;
        }
        let movable = |item: Option<Item>| item.is_some_and(|i| i.is_movable());
        if !movable(item_a) || !movable(item_b) {
            return false;
        }

        self.stop_hints();
        self.cascades = 0;
        self.board.swap(a, b);
        self.events.push(BoardEvent::SwapStarted { a, b });
        debug!(%a, %b, "swap accepted");
        self.enter(Phase::Swapping { a, b });
        true
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Stop accepting input; a pending cascade aborts at its next resumption
    pub fn set_game_over(&mut self) {
        if !self.game_over {
            debug!(phase = self.phase.as_str(), "game over");
        }
        self.game_over = true;
        self.stop_hints();
    }

    /// External "phase finished" signal: run the next step of the resolution
    pub fn phase_complete(&mut self) -> Result<(), EngineError> {
        if self.abort_if_over() || !self.started {
            return Ok(());
        }

        self.phase_timer_ms = 0;
        match self.phase {
            Phase::Idle => Ok(()),
            Phase::Swapping { a, b } => {
                self.resolve_swap(a, b);
                Ok(())
            }
            Phase::Reverting { .. } => {
                self.enter(Phase::Idle);
                self.refresh_potential();
                Ok(())
            }
            Phase::Exploding => {
                for (from, to) in self.board.shift_down() {
                    self.events.push(BoardEvent::Shifted { from, to });
                }
                self.enter(Phase::Shifting);
                Ok(())
            }
            Phase::Shifting => {
                self.refill();
                self.enter(Phase::Refilling);
                Ok(())
            }
            Phase::Refilling | Phase::Shuffling => self.evaluate(),
        }
    }

    /// Advance time. Counts the pending phase down and completes it when it
    /// runs out (at most one phase per call); while idle, drives the hint
    /// timer. Frozen while paused.
    ///
    /// Returns whether a phase completed.
    pub fn tick(&mut self, elapsed_ms: u32) -> Result<bool, EngineError> {
        if self.abort_if_over() || self.paused || !self.started {
            return Ok(false);
        }

        if self.phase == Phase::Idle {
            if !self.potential.is_empty() && self.hint.tick(elapsed_ms) {
                trace!(cells = self.potential.len(), "hint shown");
                self.events.push(BoardEvent::HintShown {
                    cells: self.potential.clone(),
                });
            }
            return Ok(false);
        }

        if self.phase_timer_ms > elapsed_ms {
            self.phase_timer_ms -= elapsed_ms;
            return Ok(false);
        }

        self.phase_complete()?;
        Ok(true)
    }

    /// Complete phases back to back until the engine is idle.
    ///
    /// Cascades have no fixed bound; refills are random, so termination is
    /// practical rather than structural.
    pub fn settle(&mut self) -> Result<(), EngineError> {
        while self.started && self.phase != Phase::Idle {
            self.phase_complete()?;
        }
        Ok(())
    }

    pub fn snapshot_into(&self, out: &mut BoardSnapshot) {
        out.write_board(&self.board);
        out.phase = self.phase.as_str();
        out.busy = self.is_busy();
        out.paused = self.paused;
        out.game_over = self.game_over;
        out.moves = self.moves;
        out.cascades = self.cascades;
        out.seed = self.seed;
        out.potential = self.potential.len();
        out.hint_shown = self.hint.is_shown();
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut s = BoardSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    fn enter(&mut self, phase: Phase) {
        trace!(from = self.phase.as_str(), to = phase.as_str(), "phase");
        self.phase = phase;
        self.phase_timer_ms = phase.duration_ms(&self.timings);
    }

    /// Drop a pending phase after game over; committed mutations stay
    fn abort_if_over(&mut self) -> bool {
        if !self.game_over {
            return false;
        }
        if self.phase != Phase::Idle {
            debug!(phase = self.phase.as_str(), "cascade aborted");
            self.phase = Phase::Idle;
            self.phase_timer_ms = 0;
        }
        true
    }

    fn resolve_swap(&mut self, a: Coord, b: Coord) {
        let trigger = [a, b]
            .into_iter()
            .find(|&c| matches!(self.board.get(c), Some(Item::Bonus(_))));
        if let Some(cell) = trigger {
            debug!(%cell, "bonus triggered by swap");
            self.cascades += 1;
            let cells = expand_blast(&self.board, &[cell]);
            self.explode(&cells);
            self.enter(Phase::Exploding);
            return;
        }

        let Some(found) = swap_matches(&self.board, a, b)
            .filter(|m| m.len() >= self.board.matches_min() as usize)
        else {
            self.board.swap(a, b);
            self.events.push(BoardEvent::SwapReverted { a, b });
            self.enter(Phase::Reverting { a, b });
            return;
        };

        self.moves += 1;
        self.events.push(BoardEvent::MoveAccepted);
        self.collapse(found, Some(b));
    }

    /// Explode a color match, converting one cell to a bonus when it is long
    /// enough
    fn collapse(&mut self, found: Match, reference: Option<Coord>) {
        self.cascades += 1;
        let bonus = if earns_bonus(&self.board, &found) {
            bonus_cell(&found, reference).map(|cell| (cell, bonus_direction(&found)))
        } else {
            None
        };
        debug!(
            cells = found.len(),
            cascade = self.cascades,
            bonus = bonus.is_some(),
            "collapsing match"
        );

        let cells = expand_blast(&self.board, &found.cells);
        self.explode(&cells);

        if let Some((cell, direction)) = bonus {
            self.board.set(cell, Some(Item::Bonus(direction)));
            self.events.push(BoardEvent::BonusCreated {
                cell,
                direction,
                sprite: self.provider.bonus_sprite(direction),
            });
        }

        self.enter(Phase::Exploding);
    }

    fn explode(&mut self, cells: &[Coord]) {
        for &cell in cells {
            if let Some(item) = self.board.take(cell) {
                self.events.push(BoardEvent::Exploded { cell, item });
            }
        }
    }

    fn refill(&mut self) {
        for (cell, item) in self.board.fill_empty(&mut self.provider) {
            self.events.push(BoardEvent::Spawned { cell, item });
        }
    }

    /// Rescan after a cascade step: resolve the next match, reshuffle a
    /// deadlocked board, or settle
    fn evaluate(&mut self) -> Result<(), EngineError> {
        if let Some(found) = find_first_match(&self.board) {
            self.collapse(found, None);
            return Ok(());
        }

        let potential = find_potential_matches(&self.board);
        if potential.is_empty() {
            if self.shuffle_attempts >= self.max_shuffle_attempts {
                warn!(attempts = self.shuffle_attempts, "no solvable layout found");
                self.enter(Phase::Idle);
                return Err(EngineError::UnsatisfiableBoard {
                    attempts: self.shuffle_attempts,
                });
            }
            self.shuffle_attempts += 1;
            debug!(attempt = self.shuffle_attempts, "no moves left, shuffling");
            self.board.shuffle(&mut self.rng);
            self.events.push(BoardEvent::Shuffled {
                attempt: self.shuffle_attempts,
            });
            self.enter(Phase::Shuffling);
            return Ok(());
        }

        self.shuffle_attempts = 0;
        self.potential = potential;
        self.hint.reset();
        self.events.push(BoardEvent::Settled {
            potential: self.potential.len(),
        });
        self.enter(Phase::Idle);
        Ok(())
    }

    fn refresh_potential(&mut self) {
        self.potential = find_potential_matches(&self.board);
        self.hint.reset();
    }

    fn stop_hints(&mut self) {
        if self.hint.cancel() {
            self.events.push(BoardEvent::HintCancelled {
                cells: self.potential.clone(),
            });
        }
        self.potential.clear();
    }
}
