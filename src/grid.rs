//! Playfield grid: fixed-size occupancy matrix with bounds-checked access and line clearing.

use crate::error::GridError;
use std::collections::VecDeque;

/// Single cell: empty or settled terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled,
}

impl Cell {
    #[inline]
    pub fn is_filled(self) -> bool {
        self == Self::Filled
    }
}

/// Grid of cells. y=0 is the top row; dimensions never change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<Vec<Cell>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize { width, height });
        }
        Ok(Self {
            width,
            height,
            rows: Self::empty_rows(width, height),
        })
    }

    fn empty_rows(width: usize, height: usize) -> VecDeque<Vec<Cell>> {
        (0..height).map(|_| vec![Cell::Empty; width]).collect()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at column `x`, row `y`; `None` outside the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Signed lookup for piece arithmetic; negative coordinates are outside the grid.
    #[inline]
    pub fn get_signed(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get(x as usize, y as usize)
    }

    /// Returns false (and writes nothing) when (x, y) is outside the grid.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> bool {
        match self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        self.rows.get(y).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// A row is full when it has no empty cell.
    pub fn is_row_full(&self, y: usize) -> bool {
        self.row(y)
            .is_some_and(|row| row.iter().all(|c| c.is_filled()))
    }

    pub fn row_has_filled(&self, y: usize) -> bool {
        self.row(y)
            .is_some_and(|row| row.iter().any(|c| c.is_filled()))
    }

    pub fn filled_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|c| c.is_filled()).count())
            .sum()
    }

    /// Remove every full row in one pass, keep the rest in order, and pad the top with
    /// as many empty rows as were removed. Returns the removed row indices (pre-compaction).
    pub fn clear_full_rows(&mut self) -> Vec<usize> {
        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.height);
        for (y, row) in std::mem::take(&mut self.rows).into_iter().enumerate() {
            if row.iter().all(|c| c.is_filled()) {
                removed.push(y);
            } else {
                kept.push_back(row);
            }
        }
        for _ in 0..removed.len() {
            kept.push_front(vec![Cell::Empty; self.width]);
        }
        self.rows = kept;
        removed
    }

    /// Empty every cell, keeping dimensions.
    pub fn clear(&mut self) {
        self.rows = Self::empty_rows(self.width, self.height);
    }
}
