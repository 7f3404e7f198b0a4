use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WorksheetId = Uuid;
pub type ColumnId = Uuid;
pub type RowId = Uuid;

/// Raw content of a cell as stored.
///
/// Serializes as JSON `null`, a number, or a string. A text value that starts
/// with `=` is a formula; everything else is a literal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Builds a value from user-entered text.
    ///
    /// Empty text becomes [`CellValue::Empty`]. In a number column, text that
    /// parses to a finite number is stored as a number; everything else is
    /// kept verbatim as text.
    pub fn from_input(text: &str, column_type: ColumnType) -> Self {
        if text.is_empty() {
            return CellValue::Empty;
        }
        if column_type == ColumnType::Number && !text.starts_with('=') {
            if let Some(n) = parse_finite(text) {
                return CellValue::Number(n);
            }
        }
        CellValue::Text(text.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Returns the formula body (without the leading `=`) if this is a formula.
    pub fn formula(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => s.strip_prefix('='),
            _ => None,
        }
    }

    /// Numeric reading of the value, `None` when it is not a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(s) => parse_finite(s),
            CellValue::Empty => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// Parses trimmed text as a finite `f64`. `inf` and `nan` spellings are rejected.
pub(crate) fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorksheetStatus {
    #[default]
    Draft,
    InReview,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Date,
    Select,
}

impl ColumnType {
    /// The next type in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            ColumnType::Text => ColumnType::Number,
            ColumnType::Number => ColumnType::Date,
            ColumnType::Date => ColumnType::Select,
            ColumnType::Select => ColumnType::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Select => "select",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Column {
    pub fn new(title: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            column_type,
            options: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub column_id: ColumnId,
    pub value: CellValue,
}

/// A worksheet row. Cells are matched to columns by id, so a row may hold
/// fewer or more cells than there are columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cells: Vec::new(),
        }
    }

    pub fn value(&self, column_id: ColumnId) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|cell| cell.column_id == column_id)
            .map(|cell| &cell.value)
    }

    pub fn set_value(&mut self, column_id: ColumnId, value: CellValue) {
        match self.cells.iter_mut().find(|cell| cell.column_id == column_id) {
            Some(cell) => cell.value = value,
            None => self.cells.push(Cell { column_id, value }),
        }
    }

    pub fn remove_column(&mut self, column_id: ColumnId) {
        self.cells.retain(|cell| cell.column_id != column_id);
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    pub id: WorksheetId,
    pub title: String,
    pub owner: String,
    pub status: WorksheetStatus,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub updated_at: DateTime<Utc>,
}

impl Worksheet {
    pub fn new(title: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            owner: owner.into(),
            status: WorksheetStatus::Draft,
            columns: Vec::new(),
            rows: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Creates a worksheet with `rows` empty rows and `cols` text columns
    /// titled by their letter address.
    pub fn with_grid(title: impl Into<String>, owner: impl Into<String>, rows: usize, cols: usize) -> Self {
        let mut sheet = Self::new(title, owner);
        sheet.columns = (0..cols)
            .map(|c| Column::new(super::reference::index_to_letters(c), ColumnType::Text))
            .collect();
        sheet.rows = (0..rows).map(|_| Row::new()).collect();
        sheet
    }

    pub fn column_index(&self, column_id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    pub fn row_index(&self, row_id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == row_id)
    }

    /// Resolves a positional address to the ids the store works with.
    pub fn ids_at(&self, row: usize, col: usize) -> Option<(RowId, ColumnId)> {
        Some((self.rows.get(row)?.id, self.columns.get(col)?.id))
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Positional read access to a grid of raw values.
///
/// Positions are always derived from current array order, so reordering or
/// deleting a column shifts every address after it.
pub trait CellGrid {
    fn row_count(&self) -> usize;
    fn col_count(&self) -> usize;
    fn raw_value(&self, row: usize, col: usize) -> Option<&CellValue>;
}

impl CellGrid for Worksheet {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn col_count(&self) -> usize {
        self.columns.len()
    }

    fn raw_value(&self, row: usize, col: usize) -> Option<&CellValue> {
        let column = self.columns.get(col)?;
        self.rows.get(row)?.value(column.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_value_json_shape() {
        let cells = vec![CellValue::Number(1.5), CellValue::from("=A1"), CellValue::Empty];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[1.5,"=A1",null]"#);

        let back: Vec<CellValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn test_cell_value_from_input() {
        assert_eq!(CellValue::from_input("", ColumnType::Text), CellValue::Empty);
        assert_eq!(CellValue::from_input("42", ColumnType::Text), CellValue::from("42"));
        assert_eq!(CellValue::from_input("42", ColumnType::Number), CellValue::Number(42.0));
        assert_eq!(CellValue::from_input("abc", ColumnType::Number), CellValue::from("abc"));
        assert_eq!(CellValue::from_input("=1+1", ColumnType::Number), CellValue::from("=1+1"));
        assert_eq!(CellValue::from_input("inf", ColumnType::Number), CellValue::from("inf"));
    }

    #[test]
    fn test_formula_detection() {
        assert_eq!(CellValue::from("=SUM(A1:A2)").formula(), Some("SUM(A1:A2)"));
        assert_eq!(CellValue::from("SUM").formula(), None);
        assert_eq!(CellValue::Number(3.0).formula(), None);
    }

    #[test]
    fn test_display_formats_numbers_without_trailing_zero() {
        assert_eq!(CellValue::Number(6.0).to_string(), "6");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_row_lookup_is_by_column_id() {
        let a = Column::new("A", ColumnType::Text);
        let b = Column::new("B", ColumnType::Text);
        let mut row = Row::new();
        row.set_value(b.id, CellValue::from("bee"));

        assert_eq!(row.value(a.id), None);
        assert_eq!(row.value(b.id), Some(&CellValue::from("bee")));

        row.set_value(b.id, CellValue::Number(2.0));
        assert_eq!(row.cells.len(), 1);
        assert_eq!(row.value(b.id), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn test_grid_addresses_follow_column_order() {
        let mut sheet = Worksheet::with_grid("t", "me", 1, 2);
        let (row_id, col_b) = sheet.ids_at(0, 1).unwrap();
        sheet.rows[0].set_value(col_b, CellValue::Number(7.0));
        assert_eq!(sheet.raw_value(0, 1), Some(&CellValue::Number(7.0)));

        sheet.columns.remove(0);
        assert_eq!(sheet.raw_value(0, 0), Some(&CellValue::Number(7.0)));
        assert_eq!(sheet.row_index(row_id), Some(0));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&WorksheetStatus::InReview).unwrap();
        assert_eq!(json, r#""in-review""#);
        let json = serde_json::to_string(&ColumnType::Select).unwrap();
        assert_eq!(json, r#""select""#);
    }
}
