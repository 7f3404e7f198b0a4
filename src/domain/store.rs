use super::errors::StoreResult;
use super::models::{CellValue, ColumnId, ColumnType, RowId, Worksheet, WorksheetId, WorksheetStatus};

/// Persistence boundary that owns worksheet records.
///
/// The engine reads the current grid through [`WorksheetStore::worksheet`]
/// and performs every mutation as a single call. Each call is applied
/// immediately and is visible on the next read.
pub trait WorksheetStore {
    fn worksheet(&self, worksheet_id: WorksheetId) -> Option<&Worksheet>;

    /// Raw value at `(row_id, column_id)`; a missing cell reads as empty.
    fn get_cell(&self, worksheet_id: WorksheetId, row_id: RowId, column_id: ColumnId) -> CellValue {
        self.worksheet(worksheet_id)
            .and_then(|sheet| sheet.rows.iter().find(|row| row.id == row_id))
            .and_then(|row| row.value(column_id))
            .cloned()
            .unwrap_or_default()
    }

    fn set_cell(
        &mut self,
        worksheet_id: WorksheetId,
        row_id: RowId,
        column_id: ColumnId,
        value: CellValue,
    ) -> StoreResult<()>;

    fn add_row(&mut self, worksheet_id: WorksheetId) -> StoreResult<RowId>;

    fn add_column(&mut self, worksheet_id: WorksheetId, title: &str, column_type: ColumnType) -> StoreResult<ColumnId>;

    fn update_column_title(&mut self, worksheet_id: WorksheetId, column_id: ColumnId, title: &str) -> StoreResult<()>;

    /// Changes a column's type. Options are trimmed and empty entries dropped.
    fn update_column_type(
        &mut self,
        worksheet_id: WorksheetId,
        column_id: ColumnId,
        column_type: ColumnType,
        options: Option<Vec<String>>,
    ) -> StoreResult<()>;

    fn delete_column(&mut self, worksheet_id: WorksheetId, column_id: ColumnId) -> StoreResult<()>;

    fn delete_row(&mut self, worksheet_id: WorksheetId, row_id: RowId) -> StoreResult<()>;

    fn set_status(&mut self, worksheet_id: WorksheetId, status: WorksheetStatus) -> StoreResult<()>;

    fn set_title(&mut self, worksheet_id: WorksheetId, title: &str) -> StoreResult<()>;
}
