//! Rectangular selection over the grid.
//!
//! A selection is an anchor, an active cell, and the normalized rectangle
//! between them. Every update clamps to the current grid bounds.

use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Current row and column counts of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub rows: usize,
    pub cols: usize,
}

impl GridBounds {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Clamps into `[0, rows-1] x [0, cols-1]`. An empty axis clamps to 0.
    pub fn clamp(&self, pos: CellPos) -> CellPos {
        CellPos {
            row: pos.row.min(self.rows.saturating_sub(1)),
            col: pos.col.min(self.cols.saturating_sub(1)),
        }
    }
}

/// Inclusive rectangle with `start <= end` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRange {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl SelectionRange {
    pub fn cell(pos: CellPos) -> Self {
        Self::spanning(pos, pos)
    }

    /// The normalized rectangle with `a` and `b` as opposite corners.
    pub fn spanning(a: CellPos, b: CellPos) -> Self {
        Self {
            start_row: a.row.min(b.row),
            end_row: a.row.max(b.row),
            start_col: a.col.min(b.col),
            end_col: a.col.max(b.col),
        }
    }

    pub fn clamp(self, bounds: GridBounds) -> Self {
        Self::spanning(
            bounds.clamp(CellPos::new(self.start_row, self.start_col)),
            bounds.clamp(CellPos::new(self.end_row, self.end_col)),
        )
    }

    pub fn top_left(&self) -> CellPos {
        CellPos::new(self.start_row, self.start_col)
    }

    pub fn bottom_right(&self) -> CellPos {
        CellPos::new(self.end_row, self.end_col)
    }

    pub fn rows(&self) -> RangeInclusive<usize> {
        self.start_row..=self.end_row
    }

    pub fn cols(&self) -> RangeInclusive<usize> {
        self.start_col..=self.end_col
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows().contains(&row) && self.cols().contains(&col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn step(self, pos: CellPos) -> CellPos {
        match self {
            Direction::Up => CellPos::new(pos.row.saturating_sub(1), pos.col),
            Direction::Down => CellPos::new(pos.row.saturating_add(1), pos.col),
            Direction::Left => CellPos::new(pos.row, pos.col.saturating_sub(1)),
            Direction::Right => CellPos::new(pos.row, pos.col.saturating_add(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    anchor: CellPos,
    active: CellPos,
    range: SelectionRange,
}

impl Selection {
    pub fn anchor(&self) -> CellPos {
        self.anchor
    }

    /// The cell the keyboard cursor is on.
    pub fn active(&self) -> CellPos {
        self.active
    }

    pub fn range(&self) -> SelectionRange {
        self.range
    }

    /// Points at `pos`. Without `extend` the anchor moves there and the range
    /// collapses to that cell; with `extend` the range grows from the anchor.
    pub fn point(&mut self, pos: CellPos, extend: bool, bounds: GridBounds) {
        let pos = bounds.clamp(pos);
        self.active = pos;
        if !extend {
            self.anchor = pos;
        }
        self.range = SelectionRange::spanning(self.anchor, pos);
    }

    /// Moves the active cell one step, clamped to the grid.
    pub fn move_by(&mut self, direction: Direction, extend: bool, bounds: GridBounds) {
        let next = direction.step(self.active);
        self.point(next, extend, bounds);
    }

    /// Tab moves right, Shift-Tab left; the anchor always resets.
    pub fn tab(&mut self, backward: bool, bounds: GridBounds) {
        let direction = if backward { Direction::Left } else { Direction::Right };
        self.move_by(direction, false, bounds);
    }

    /// Replaces the range outright, keeping its top-left as anchor and its
    /// bottom-right as the active cell.
    pub fn set_range(&mut self, range: SelectionRange, bounds: GridBounds) {
        let range = range.clamp(bounds);
        self.anchor = range.top_left();
        self.active = range.bottom_right();
        self.range = range;
    }

    /// Re-clamps after the grid shrank.
    pub fn clamp_to(&mut self, bounds: GridBounds) {
        self.anchor = bounds.clamp(self.anchor);
        self.active = bounds.clamp(self.active);
        self.range = self.range.clamp(bounds);
    }
}
