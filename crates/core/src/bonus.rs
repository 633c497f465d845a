//! Bonus engine - creating bonus items and resolving their blasts
//!
//! A bonus is born from a match longer than `matches_min` and is inert until
//! it is swapped or caught in another blast. When it goes off it clears its
//! whole row or column; background cells are skipped, not treated as walls.

use crate::board::Board;
use crate::matcher::Match;
use crate::types::{BonusDirection, Coord, Item};

/// Whether a match of this size earns a bonus
pub fn earns_bonus(board: &Board, m: &Match) -> bool {
    m.len() > board.matches_min() as usize
}

/// Direction of the bonus created by `m`: the axis of the longer run, with
/// ties going horizontal
pub fn bonus_direction(m: &Match) -> BonusDirection {
    if m.horizontal >= m.vertical {
        BonusDirection::Horizontal
    } else {
        BonusDirection::Vertical
    }
}

/// Cell that receives the bonus: the reference cell when it is part of the
/// match, the first matched cell otherwise
pub fn bonus_cell(m: &Match, reference: Option<Coord>) -> Option<Coord> {
    reference
        .filter(|&r| m.contains(r))
        .or_else(|| m.cells.first().copied())
}

/// Occupied, non-background cells on the bonus' line
pub fn blast_line(board: &Board, origin: Coord, direction: BonusDirection) -> Vec<Coord> {
    let line: Vec<Coord> = match direction {
        BonusDirection::Horizontal => (0..board.width())
            .map(|col| Coord::new(col, origin.row))
            .collect(),
        BonusDirection::Vertical => (0..board.height())
            .map(|row| Coord::new(origin.col, row))
            .collect(),
    };
    line.into_iter().filter(|&c| board.is_movable(c)).collect()
}

/// Close `seeds` over bonus chains: every bonus in the set adds its own line.
///
/// Returns the cells in discovery order without duplicates; empty and
/// background seeds are dropped.
pub fn expand_blast(board: &Board, seeds: &[Coord]) -> Vec<Coord> {
    let width = board.width() as usize;
    let mut seen = vec![false; width * board.height() as usize];
    let mut cells = Vec::with_capacity(seeds.len());

    let mut push = |c: Coord, cells: &mut Vec<Coord>| {
        let idx = c.row as usize * width + c.col as usize;
        if !seen[idx] && board.is_movable(c) {
            seen[idx] = true;
            cells.push(c);
        }
    };

    for &c in seeds {
        push(c, &mut cells);
    }

    let mut i = 0;
    while i < cells.len() {
        if let Some(Item::Bonus(direction)) = board.get(cells[i]) {
            for c in blast_line(board, cells[i], direction) {
                push(c, &mut cells);
            }
        }
        i += 1;
    }

    cells
}
