//! Match detection - contiguous same-color runs along both axes
//!
//! Only `Item::Normal` takes part in runs; bonus, background and empty cells
//! end a run. A run counts as a match once it reaches the board's
//! `matches_min`.

use crate::board::Board;
use crate::types::Coord;

/// A resolved set of cells to explode.
///
/// Cells are deduplicated and kept in discovery order. `horizontal` and
/// `vertical` record the longest qualifying run per axis (0 when that axis
/// did not qualify); bonus placement uses them to pick a direction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Match {
    pub cells: Vec<Coord>,
    pub horizontal: usize,
    pub vertical: usize,
}

impl Match {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.cells.contains(&c)
    }

    /// Union with another match, keeping the longest run per axis
    pub fn merge(&mut self, other: Match) {
        for c in other.cells {
            if !self.cells.contains(&c) {
                self.cells.push(c);
            }
        }
        self.horizontal = self.horizontal.max(other.horizontal);
        self.vertical = self.vertical.max(other.vertical);
    }
}

/// Walk from `seed` along (dc, dr) in both directions collecting cells of the
/// seed's color, ordered from the negative end to the positive end.
fn run(board: &Board, seed: Coord, dc: i16, dr: i16) -> Vec<Coord> {
    let Some(color) = board.normal_color(seed) else {
        return Vec::new();
    };

    let same = |c: &Coord| board.contains(*c) && board.normal_color(*c) == Some(color);

    let mut start = seed;
    while let Some(prev) = start.offset(-dc, -dr).filter(same) {
        start = prev;
    }

    let mut cells = vec![start];
    let mut cur = start;
    while let Some(next) = cur.offset(dc, dr).filter(same) {
        cells.push(next);
        cur = next;
    }
    cells
}

/// Contiguous same-color cells in the seed's row, left to right
pub fn horizontal_run(board: &Board, seed: Coord) -> Vec<Coord> {
    run(board, seed, 1, 0)
}

/// Contiguous same-color cells in the seed's column, top to bottom
pub fn vertical_run(board: &Board, seed: Coord) -> Vec<Coord> {
    run(board, seed, 0, 1)
}

/// Qualifying runs through `seed`, merged.
///
/// Each axis qualifies independently; a run shorter than `matches_min`
/// contributes nothing even when the other axis matches.
pub fn matches_at(board: &Board, seed: Coord) -> Option<Match> {
    let min = board.matches_min() as usize;
    let hor = horizontal_run(board, seed);
    let ver = vertical_run(board, seed);

    let mut found = Match::default();
    if hor.len() >= min {
        found.merge(Match {
            horizontal: hor.len(),
            cells: hor,
            vertical: 0,
        });
    }
    if ver.len() >= min {
        found.merge(Match {
            vertical: ver.len(),
            cells: ver,
            horizontal: 0,
        });
    }

    (!found.is_empty()).then_some(found)
}

/// Union of the matches formed at both cells of a swap
pub fn swap_matches(board: &Board, a: Coord, b: Coord) -> Option<Match> {
    match (matches_at(board, a), matches_at(board, b)) {
        (Some(mut ma), Some(mb)) => {
            ma.merge(mb);
            Some(ma)
        }
        (ma, mb) => ma.or(mb),
    }
}

/// First match in row-major order.
///
/// Answers "is more resolution needed"; it does not enumerate every match on
/// the board.
pub fn find_first_match(board: &Board) -> Option<Match> {
    board.coords().find_map(|c| matches_at(board, c))
}
