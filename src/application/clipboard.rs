//! Tab/newline text transfer of rectangular blocks.
//!
//! Copy writes raw values (formulas verbatim), one line per row and one tab
//! between columns. Paste parses the same shape back and lays it out from an
//! origin cell, dropping anything that falls outside the grid.

use crate::domain::{CellGrid, CellValue};

use super::selection::{CellPos, GridBounds, SelectionRange};

/// Serializes the raw values of `range` as a tab/newline block.
pub fn copy_block<G: CellGrid + ?Sized>(grid: &G, range: SelectionRange) -> String {
    range
        .rows()
        .map(|row| {
            range
                .cols()
                .map(|col| grid.raw_value(row, col).map(ToString::to_string).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Raw values of the last block this app copied, next to the text it put on
/// the clipboard. Text alone cannot tell a number from numeric text.
#[derive(Debug, Clone, PartialEq)]
pub struct CopiedBlock {
    pub text: String,
    pub values: Vec<Vec<CellValue>>,
}

impl CopiedBlock {
    pub fn capture<G: CellGrid + ?Sized>(grid: &G, range: SelectionRange) -> Self {
        let values = range
            .rows()
            .map(|row| {
                range
                    .cols()
                    .map(|col| grid.raw_value(row, col).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            text: copy_block(grid, range),
            values,
        }
    }

    /// Whether clipboard `text` is still this copy, up to CRLF and one
    /// trailing newline added by the platform.
    pub fn matches(&self, text: &str) -> bool {
        let normalized = text.replace("\r\n", "\n");
        normalized == self.text || normalized.strip_suffix('\n') == Some(self.text.as_str())
    }
}

/// Splits clipboard text into rows of cell strings.
///
/// CRLF is normalized to LF. A single trailing newline terminates the last
/// row rather than adding an empty one. Empty text is an empty block.
pub fn parse_block(text: &str) -> Vec<Vec<String>> {
    if text.is_empty() {
        return Vec::new();
    }
    let normalized = text.replace("\r\n", "\n");
    let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
    body.split('\n')
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

/// Where each pasted value lands and the selection that results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastePlan<T = String> {
    pub writes: Vec<(CellPos, T)>,
    pub range: SelectionRange,
}

/// Lays `block` out from `origin`. Cells past the grid bounds are dropped;
/// the resulting range covers the block's extent, clamped to the grid.
pub fn plan_paste<T: Clone>(block: &[Vec<T>], origin: CellPos, bounds: GridBounds) -> PastePlan<T> {
    let mut writes = Vec::new();
    for (r, cells) in block.iter().enumerate() {
        for (c, value) in cells.iter().enumerate() {
            let (row, col) = (origin.row + r, origin.col + c);
            if bounds.contains(row, col) {
                writes.push((CellPos::new(row, col), value.clone()));
            }
        }
    }

    let height = block.len().max(1);
    let width = block.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let corner = CellPos::new(origin.row + height - 1, origin.col + width - 1);
    PastePlan {
        writes,
        range: SelectionRange::spanning(origin, corner).clamp(bounds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, Worksheet};
    use pretty_assertions::assert_eq;

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_copy_block_shape() {
        let mut sheet = Worksheet::with_grid("t", "me", 2, 3);
        let ids: Vec<_> = sheet.columns.iter().map(|c| c.id).collect();
        sheet.rows[0].set_value(ids[0], CellValue::Number(1.0));
        sheet.rows[0].set_value(ids[1], CellValue::from("=A1*2"));
        sheet.rows[1].set_value(ids[2], CellValue::from("z"));

        let range = SelectionRange { start_row: 0, end_row: 1, start_col: 0, end_col: 2 };
        assert_eq!(copy_block(&sheet, range), "1\t=A1*2\t\n\t\tz");
    }

    #[test]
    fn test_copied_block_keeps_raw_types() {
        let mut sheet = Worksheet::with_grid("t", "me", 1, 2);
        let ids: Vec<_> = sheet.columns.iter().map(|c| c.id).collect();
        sheet.rows[0].set_value(ids[0], CellValue::Number(1.5));
        sheet.rows[0].set_value(ids[1], CellValue::from("1.5"));

        let copied = CopiedBlock::capture(&sheet, SelectionRange { start_row: 0, end_row: 0, start_col: 0, end_col: 1 });
        assert_eq!(copied.text, "1.5\t1.5");
        assert_eq!(copied.values, vec![vec![CellValue::Number(1.5), CellValue::from("1.5")]]);
        assert!(copied.matches("1.5\t1.5"));
        assert!(copied.matches("1.5\t1.5\r\n"));
        assert!(!copied.matches("1.5\t2"));
    }

    #[test]
    fn test_parse_block_normalizes_line_endings() {
        assert_eq!(parse_block("a\tb\r\nc\td\r\n"), strings(&[&["a", "b"], &["c", "d"]]));
        assert_eq!(parse_block("x"), strings(&[&["x"]]));
        assert_eq!(parse_block("a\n\nb"), strings(&[&["a"], &[""], &["b"]]));
        assert!(parse_block("").is_empty());
        assert_eq!(parse_block("\n"), strings(&[&[""]]));
    }

    #[test]
    fn test_plan_paste_inside_bounds() {
        let block = strings(&[&["1", "2"], &["3", "4"]]);
        let plan = plan_paste(&block, CellPos::new(1, 1), GridBounds::new(5, 5));
        assert_eq!(plan.writes.len(), 4);
        assert_eq!(plan.writes[3], (CellPos::new(2, 2), "4".to_string()));
        assert_eq!(plan.range, SelectionRange { start_row: 1, end_row: 2, start_col: 1, end_col: 2 });
    }

    #[test]
    fn test_plan_paste_drops_out_of_bounds_cells() {
        let block = strings(&[&["a", "b", "c"], &["d", "e", "f"], &["g", "h", "i"]]);
        let plan = plan_paste(&block, CellPos::new(2, 2), GridBounds::new(3, 4));
        let written: Vec<_> = plan.writes.iter().map(|(pos, v)| (pos.row, pos.col, v.as_str())).collect();
        assert_eq!(written, vec![(2, 2, "a"), (2, 3, "b")]);
        assert_eq!(plan.range, SelectionRange { start_row: 2, end_row: 2, start_col: 2, end_col: 3 });
    }

    #[test]
    fn test_plan_paste_ragged_rows_use_widest() {
        let block = strings(&[&["a"], &["b", "c", "d"]]);
        let plan = plan_paste(&block, CellPos::new(0, 0), GridBounds::new(10, 10));
        assert_eq!(plan.writes.len(), 4);
        assert_eq!(plan.range.bottom_right(), CellPos::new(1, 2));
    }
}
