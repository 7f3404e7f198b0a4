//! Auto-size heuristics for columns and rows.
//!
//! These are one-shot computations invoked by an explicit user action. They
//! read content lengths only and never touch evaluation or selection.

use serde::{Deserialize, Serialize};

use super::models::{CellGrid, CellValue};
use super::services::FormulaEvaluator;

/// Minimum content width, in characters, an auto-sized column is given.
const MIN_CONTENT_CHARS: usize = 4;

/// Pixel constants for the sizing heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub char_px: u32,
    pub cell_padding_px: u32,
    pub min_width_px: u32,
    pub max_width_px: u32,
    pub line_height_px: u32,
    pub row_padding_px: u32,
    pub min_height_px: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            char_px: 8,
            cell_padding_px: 24,
            min_width_px: 80,
            max_width_px: 480,
            line_height_px: 20,
            row_padding_px: 12,
            min_height_px: 32,
        }
    }
}

impl SizingConfig {
    /// Width for a column given its header and the display lengths of its cells.
    pub fn column_width(&self, header_len: usize, cell_lens: impl IntoIterator<Item = usize>) -> u32 {
        let chars = cell_lens
            .into_iter()
            .fold(header_len.max(MIN_CONTENT_CHARS), usize::max);
        let raw = (chars as u64) * u64::from(self.char_px) + u64::from(self.cell_padding_px);
        let max = self.max_width_px.max(self.min_width_px);
        raw.clamp(u64::from(self.min_width_px), u64::from(max)) as u32
    }

    /// Height for a row given the raw texts of its cells.
    pub fn row_height<'t>(&self, texts: impl IntoIterator<Item = &'t str>) -> u32 {
        let lines = texts.into_iter().map(line_count).max().unwrap_or(1);
        let raw = (lines as u64) * u64::from(self.line_height_px) + u64::from(self.row_padding_px);
        raw.max(u64::from(self.min_height_px)).min(u64::from(u32::MAX)) as u32
    }

    /// Auto-sizes column `col` of `grid` from evaluated display values.
    pub fn auto_size_column<G: CellGrid + ?Sized>(&self, grid: &G, col: usize, header: &str) -> u32 {
        let evaluator = FormulaEvaluator::new(grid);
        let lens = (0..grid.row_count()).map(|row| evaluator.evaluate(row, col).to_string().chars().count());
        self.column_width(header.chars().count(), lens)
    }

    /// Auto-sizes row `row` of `grid` from raw cell texts.
    pub fn auto_size_row<G: CellGrid + ?Sized>(&self, grid: &G, row: usize) -> u32 {
        let texts: Vec<String> = (0..grid.col_count())
            .map(|col| grid.raw_value(row, col).map(CellValue::to_string).unwrap_or_default())
            .collect();
        self.row_height(texts.iter().map(String::as_str))
    }
}

fn line_count(text: &str) -> usize {
    text.split('\n').count()
}
