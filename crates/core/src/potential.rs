//! Potential-match finder - which swaps would produce a match right now
//!
//! Drives deadlock detection (no potential matches means the board must be
//! shuffled) and the hint highlight.

use crate::board::Board;
use crate::matcher::swap_matches;
use crate::types::Coord;

/// Adjacent pair whose swap immediately yields a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PotentialMatch {
    pub a: Coord,
    pub b: Coord,
}

/// Every match-producing adjacent swap, each pair once, in row-major order of
/// its first cell (right neighbour before down neighbour).
///
/// Works on a scratch copy so the board is never observed mid-swap.
pub fn find_potential_swaps(board: &Board) -> Vec<PotentialMatch> {
    let mut scratch = board.clone();
    let mut out = Vec::new();

    for a in board.coords() {
        if !board.is_movable(a) {
            continue;
        }
        for b in [a.offset(1, 0), a.offset(0, 1)].into_iter().flatten() {
            if !board.contains(b) || !board.is_movable(b) || board.get(a) == board.get(b) {
                continue;
            }
            scratch.swap(a, b);
            if swap_matches(&scratch, a, b).is_some() {
                out.push(PotentialMatch { a, b });
            }
            scratch.swap(a, b);
        }
    }

    out
}

/// Cells taking part in at least one potential match, deduplicated, in
/// discovery order. Empty means no valid move exists.
pub fn find_potential_matches(board: &Board) -> Vec<Coord> {
    let mut cells = Vec::new();
    for p in find_potential_swaps(board) {
        for c in [p.a, p.b] {
            if !cells.contains(&c) {
                cells.push(c);
            }
        }
    }
    cells
}

/// Whether at least one swap produces a match
pub fn has_potential_match(board: &Board) -> bool {
    !find_potential_swaps(board).is_empty()
}
