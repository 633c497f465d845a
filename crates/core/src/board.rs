//! Board module - manages the game grid
//!
//! The board is a `width x height` grid where each cell is empty or holds one
//! [`Item`]. Uses a flat row-major vector; neighbours are computed from
//! coordinates, never stored.
//! Coordinates: (col, row) where row 0 is the top and "down" is increasing row.

use std::fmt;

use arrayvec::ArrayVec;

use crate::palette::ItemProvider;
use crate::rng::SimpleRng;
use crate::types::{
    cell_glyph, parse_cell, BoardConfig, Cell, Color, ConfigError, Coord, Item,
};

/// The game board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: u8,
    height: u8,
    matches_min: u8,
    item_variety: u8,
    /// Flat array of cells, row-major order (row * width + col)
    cells: Vec<Cell>,
}

impl Board {
    /// Create a board with its background layout in place and every other
    /// cell empty
    pub fn new(config: &BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut board = Self {
            width: config.width,
            height: config.height,
            matches_min: config.matches_min,
            item_variety: config.item_variety,
            cells: vec![None; config.width as usize * config.height as usize],
        };
        for &c in &config.background {
            board.set(c, Some(Item::Background));
        }
        Ok(board)
    }

    /// Build a board from layout rows (top row first).
    ///
    /// Dimensions come from the rows; `config` supplies `matches_min` and
    /// `item_variety`. Background listed in `config` is added on top of the
    /// `#` glyphs.
    pub fn from_layout(config: &BoardConfig, rows: &[&str]) -> Result<Self, ConfigError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let sized = BoardConfig {
            width: u8::try_from(width).unwrap_or(0),
            height: u8::try_from(height).unwrap_or(0),
            ..config.clone()
        };

        if let Some((row, bad)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.chars().count() != width)
        {
            return Err(ConfigError::LayoutSize {
                row,
                width,
                got_width: bad.chars().count(),
            });
        }

        let mut board = Self::new(&sized)?;
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let at = Coord::new(col as u8, row as u8);
                let cell = parse_cell(ch).ok_or(ConfigError::LayoutGlyph { glyph: ch, at })?;
                if let Some(Item::Normal(Color(color))) = cell {
                    if color >= board.item_variety {
                        return Err(ConfigError::LayoutColor {
                            color,
                            at,
                            item_variety: board.item_variety,
                        });
                    }
                }
                if board.get(at) != Some(Item::Background) {
                    board.set(at, cell);
                }
            }
        }
        Ok(board)
    }

    /// Calculate flat index from coordinates, panicking when out of bounds
    #[inline(always)]
    #[track_caller]
    fn index(&self, c: Coord) -> usize {
        assert!(
            self.contains(c),
            "coordinate {} outside {}x{} board",
            c,
            self.width,
            self.height
        );
        c.row as usize * self.width as usize + c.col as usize
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn matches_min(&self) -> u8 {
        self.matches_min
    }

    pub fn item_variety(&self) -> u8 {
        self.item_variety
    }

    pub fn contains(&self, c: Coord) -> bool {
        c.col < self.width && c.row < self.height
    }

    /// Item at `c` (`None` if empty)
    #[track_caller]
    pub fn get(&self, c: Coord) -> Cell {
        self.cells[self.index(c)]
    }

    #[track_caller]
    pub fn set(&mut self, c: Coord, cell: Cell) {
        let idx = self.index(c);
        self.cells[idx] = cell;
    }

    /// Remove and return the item at `c`
    #[track_caller]
    pub fn take(&mut self, c: Coord) -> Cell {
        let idx = self.index(c);
        self.cells[idx].take()
    }

    /// Color at `c` if it holds a normal item
    #[track_caller]
    pub fn normal_color(&self, c: Coord) -> Option<Color> {
        self.get(c).and_then(|item| item.color())
    }

    /// Whether `c` holds an item that may be swapped or shifted
    #[track_caller]
    pub fn is_movable(&self, c: Coord) -> bool {
        self.get(c).is_some_and(|item| item.is_movable())
    }

    #[track_caller]
    pub fn is_background(&self, c: Coord) -> bool {
        self.get(c) == Some(Item::Background)
    }

    /// In-bounds orthogonal neighbours in up, down, left, right order
    #[track_caller]
    pub fn neighbors(&self, c: Coord) -> ArrayVec<Coord, 4> {
        let _ = self.index(c);
        let mut out = ArrayVec::new();
        for (dc, dr) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
            if let Some(n) = c.offset(dc, dr) {
                if self.contains(n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Whether `a` and `b` share an edge
    pub fn is_adjacent(&self, a: Coord, b: Coord) -> bool {
        a.col.abs_diff(b.col) + a.row.abs_diff(b.row) == 1
    }

    /// Exchange the contents of two cells; adjacency is the caller's concern
    #[track_caller]
    pub fn swap(&mut self, a: Coord, b: Coord) {
        let (ia, ib) = (self.index(a), self.index(b));
        self.cells.swap(ia, ib);
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Coord::new(col, row)))
    }

    /// Non-background cells in row-major order
    pub fn movable_cells(&self) -> Vec<Coord> {
        self.coords().filter(|&c| !self.is_background(c)).collect()
    }

    /// Empty cells, column by column, top first
    pub fn empty_cells(&self) -> Vec<Coord> {
        (0..self.width)
            .flat_map(|col| (0..self.height).map(move |row| Coord::new(col, row)))
            .filter(|&c| self.get(c).is_none())
            .collect()
    }

    pub fn has_empty(&self) -> bool {
        self.cells.iter().any(|cell| cell.is_none())
    }

    /// Compact items toward the bottom of each column.
    ///
    /// Background cells split a column into independent segments; items keep
    /// their relative order and never cross a background cell. Returns the
    /// `(from, to)` move of every item that fell.
    pub fn shift_down(&mut self) -> Vec<(Coord, Coord)> {
        let mut moves = Vec::new();

        for col in 0..self.width {
            // Scan bottom to top with a write cursor that resets at each obstacle.
            let mut write: Option<u8> = None;
            for row in (0..self.height).rev() {
                let here = Coord::new(col, row);
                match self.get(here) {
                    Some(Item::Background) => write = None,
                    None => {
                        if write.is_none() {
                            write = Some(row);
                        }
                    }
                    Some(item) => {
                        if let Some(target) = write {
                            let to = Coord::new(col, target);
                            self.set(to, Some(item));
                            self.set(here, None);
                            moves.push((here, to));
                            // Cells between target and here are empty, the next
                            // free slot is directly above the one just filled.
                            write = Some(target - 1);
                        }
                    }
                }
            }
        }

        moves
    }

    /// Fill every empty cell with a new normal item, column by column from the
    /// top. Returns the spawned items.
    pub fn fill_empty<P: ItemProvider>(&mut self, provider: &mut P) -> Vec<(Coord, Item)> {
        let variety = self.item_variety;
        self.empty_cells()
            .into_iter()
            .map(|c| {
                let item = Item::Normal(provider.random_color(variety));
                self.set(c, Some(item));
                (c, item)
            })
            .collect()
    }

    /// Randomly permute all movable items across the non-background cells
    pub fn shuffle(&mut self, rng: &mut SimpleRng) {
        let slots = self.movable_cells();
        let mut items: Vec<Cell> = slots.iter().map(|&c| self.get(c)).collect();
        rng.shuffle(&mut items);
        for (c, cell) in slots.into_iter().zip(items) {
            self.set(c, cell);
        }
    }

    /// Rows in layout notation, top first
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|&cell| cell_glyph(cell)).collect())
            .collect()
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
