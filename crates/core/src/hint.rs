//! Hint timer - highlights a valid move after the player idles
//!
//! The timer only counts while the engine is settled with potential matches
//! available. It fires once and stays quiet until it is reset, either by a
//! fresh potential-match set or by a player action.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintTimer {
    idle_ms: u32,
    elapsed_ms: u32,
    shown: bool,
}

impl HintTimer {
    pub fn new(idle_ms: u32) -> Self {
        Self {
            idle_ms,
            elapsed_ms: 0,
            shown: false,
        }
    }

    /// Restart the idle countdown and re-arm the hint
    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
        self.shown = false;
    }

    /// Hint is currently displayed
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// Advance the countdown; returns true exactly when the hint should be
    /// shown
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        if self.shown {
            return false;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        if self.elapsed_ms > self.idle_ms {
            self.elapsed_ms = 0;
            self.shown = true;
            return true;
        }
        false
    }

    /// Hide the hint; returns whether it was showing
    pub fn cancel(&mut self) -> bool {
        let was_shown = self.shown;
        self.reset();
        was_shown
    }
}
