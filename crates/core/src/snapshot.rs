use crate::board::Board;

/// Point-in-time view of an engine, for observers and the adapter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardSnapshot {
    pub width: u8,
    pub height: u8,
    /// Layout-notation rows, top first
    pub rows: Vec<String>,
    pub phase: &'static str,
    pub busy: bool,
    pub paused: bool,
    pub game_over: bool,
    pub moves: u32,
    pub cascades: u32,
    pub seed: u32,
    pub potential: usize,
    pub hint_shown: bool,
}

impl BoardSnapshot {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn write_board(&mut self, board: &Board) {
        self.width = board.width();
        self.height = board.height();
        self.rows = board.rows();
    }

    /// Whether a swap request would currently be considered
    pub fn playable(&self) -> bool {
        !self.busy
    }
}
