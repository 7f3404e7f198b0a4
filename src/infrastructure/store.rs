use std::collections::HashMap;

use tracing::debug;

use crate::domain::{
    CellValue, Column, ColumnId, ColumnType, Row, RowId, StoreError, StoreResult, Worksheet, WorksheetId,
    WorksheetStatus, WorksheetStore,
};

/// In-memory worksheet store. Every mutation bumps `updated_at`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    worksheets: HashMap<WorksheetId, Worksheet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a worksheet (replacing one with the same id) and returns its id.
    pub fn insert(&mut self, worksheet: Worksheet) -> WorksheetId {
        let id = worksheet.id;
        self.worksheets.insert(id, worksheet);
        id
    }

    fn sheet_mut(&mut self, worksheet_id: WorksheetId) -> StoreResult<&mut Worksheet> {
        self.worksheets
            .get_mut(&worksheet_id)
            .ok_or(StoreError::WorksheetNotFound(worksheet_id))
    }

    fn column_mut(&mut self, worksheet_id: WorksheetId, column_id: ColumnId) -> StoreResult<&mut Column> {
        self.sheet_mut(worksheet_id)?
            .columns
            .iter_mut()
            .find(|column| column.id == column_id)
            .ok_or(StoreError::ColumnNotFound(column_id))
    }
}

impl WorksheetStore for MemoryStore {
    fn worksheet(&self, worksheet_id: WorksheetId) -> Option<&Worksheet> {
        self.worksheets.get(&worksheet_id)
    }

    fn set_cell(
        &mut self,
        worksheet_id: WorksheetId,
        row_id: RowId,
        column_id: ColumnId,
        value: CellValue,
    ) -> StoreResult<()> {
        let sheet = self.sheet_mut(worksheet_id)?;
        if sheet.column_index(column_id).is_none() {
            return Err(StoreError::ColumnNotFound(column_id));
        }
        let row = sheet
            .rows
            .iter_mut()
            .find(|row| row.id == row_id)
            .ok_or(StoreError::RowNotFound(row_id))?;
        row.set_value(column_id, value);
        sheet.touch();
        Ok(())
    }

    fn add_row(&mut self, worksheet_id: WorksheetId) -> StoreResult<RowId> {
        let sheet = self.sheet_mut(worksheet_id)?;
        let row = Row::new();
        let id = row.id;
        sheet.rows.push(row);
        sheet.touch();
        debug!(%worksheet_id, row_id = %id, rows = sheet.rows.len(), "row added");
        Ok(id)
    }

    fn add_column(&mut self, worksheet_id: WorksheetId, title: &str, column_type: ColumnType) -> StoreResult<ColumnId> {
        let sheet = self.sheet_mut(worksheet_id)?;
        let column = Column::new(title, column_type);
        let id = column.id;
        sheet.columns.push(column);
        sheet.touch();
        debug!(%worksheet_id, column_id = %id, columns = sheet.columns.len(), "column added");
        Ok(id)
    }

    fn update_column_title(&mut self, worksheet_id: WorksheetId, column_id: ColumnId, title: &str) -> StoreResult<()> {
        self.column_mut(worksheet_id, column_id)?.title = title.to_string();
        self.sheet_mut(worksheet_id)?.touch();
        Ok(())
    }

    fn update_column_type(
        &mut self,
        worksheet_id: WorksheetId,
        column_id: ColumnId,
        column_type: ColumnType,
        options: Option<Vec<String>>,
    ) -> StoreResult<()> {
        let column = self.column_mut(worksheet_id, column_id)?;
        column.column_type = column_type;
        column.options = match column_type {
            ColumnType::Select => Some(
                options
                    .unwrap_or_default()
                    .iter()
                    .map(|option| option.trim())
                    .filter(|option| !option.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        };
        self.sheet_mut(worksheet_id)?.touch();
        Ok(())
    }

    fn delete_column(&mut self, worksheet_id: WorksheetId, column_id: ColumnId) -> StoreResult<()> {
        let sheet = self.sheet_mut(worksheet_id)?;
        let index = sheet
            .column_index(column_id)
            .ok_or(StoreError::ColumnNotFound(column_id))?;
        sheet.columns.remove(index);
        for row in &mut sheet.rows {
            row.remove_column(column_id);
        }
        sheet.touch();
        debug!(%worksheet_id, %column_id, index, "column deleted");
        Ok(())
    }

    fn delete_row(&mut self, worksheet_id: WorksheetId, row_id: RowId) -> StoreResult<()> {
        let sheet = self.sheet_mut(worksheet_id)?;
        let index = sheet.row_index(row_id).ok_or(StoreError::RowNotFound(row_id))?;
        sheet.rows.remove(index);
        sheet.touch();
        debug!(%worksheet_id, %row_id, index, "row deleted");
        Ok(())
    }

    fn set_status(&mut self, worksheet_id: WorksheetId, status: WorksheetStatus) -> StoreResult<()> {
        let sheet = self.sheet_mut(worksheet_id)?;
        sheet.status = status;
        sheet.touch();
        Ok(())
    }

    fn set_title(&mut self, worksheet_id: WorksheetId, title: &str) -> StoreResult<()> {
        let sheet = self.sheet_mut(worksheet_id)?;
        sheet.title = title.to_string();
        sheet.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn store_with_grid(rows: usize, cols: usize) -> (MemoryStore, WorksheetId) {
        let mut store = MemoryStore::new();
        let id = store.insert(Worksheet::with_grid("Budget", "ops", rows, cols));
        (store, id)
    }

    #[test]
    fn test_set_and_get_cell() {
        let (mut store, id) = store_with_grid(2, 2);
        let (row_id, col_id) = store.worksheet(id).unwrap().ids_at(1, 1).unwrap();

        assert_eq!(store.get_cell(id, row_id, col_id), CellValue::Empty);
        store.set_cell(id, row_id, col_id, CellValue::from("=1+1")).unwrap();
        assert_eq!(store.get_cell(id, row_id, col_id), CellValue::from("=1+1"));
    }

    #[test]
    fn test_set_cell_unknown_ids() {
        let (mut store, id) = store_with_grid(1, 1);
        let (row_id, col_id) = store.worksheet(id).unwrap().ids_at(0, 0).unwrap();
        let missing = Uuid::new_v4();

        assert_eq!(
            store.set_cell(missing, row_id, col_id, CellValue::Empty),
            Err(StoreError::WorksheetNotFound(missing))
        );
        assert_eq!(
            store.set_cell(id, missing, col_id, CellValue::Empty),
            Err(StoreError::RowNotFound(missing))
        );
        assert_eq!(
            store.set_cell(id, row_id, missing, CellValue::Empty),
            Err(StoreError::ColumnNotFound(missing))
        );
    }

    #[test]
    fn test_mutation_bumps_timestamp() {
        let (mut store, id) = store_with_grid(1, 1);
        let before = store.worksheet(id).unwrap().updated_at;
        store.set_title(id, "Renamed").unwrap();
        let sheet = store.worksheet(id).unwrap();
        assert_eq!(sheet.title, "Renamed");
        assert!(sheet.updated_at >= before);
    }

    #[test]
    fn test_add_and_delete_rows_and_columns() {
        let (mut store, id) = store_with_grid(1, 1);
        let row_id = store.add_row(id).unwrap();
        let col_id = store.add_column(id, "Amount", ColumnType::Number).unwrap();
        {
            let sheet = store.worksheet(id).unwrap();
            assert_eq!(sheet.rows.len(), 2);
            assert_eq!(sheet.columns[1].title, "Amount");
        }

        store.set_cell(id, row_id, col_id, CellValue::Number(3.0)).unwrap();
        store.delete_column(id, col_id).unwrap();
        let sheet = store.worksheet(id).unwrap();
        assert_eq!(sheet.columns.len(), 1);
        assert!(sheet.rows[1].cells.is_empty());

        store.delete_row(id, row_id).unwrap();
        assert_eq!(store.worksheet(id).unwrap().rows.len(), 1);
        assert_eq!(store.delete_row(id, row_id), Err(StoreError::RowNotFound(row_id)));
    }

    #[test]
    fn test_update_column_type_filters_blank_options() {
        let (mut store, id) = store_with_grid(1, 1);
        let col_id = store.worksheet(id).unwrap().columns[0].id;
        let options = vec![" low ".to_string(), "  ".to_string(), "high".to_string(), String::new()];

        store.update_column_type(id, col_id, ColumnType::Select, Some(options)).unwrap();
        let column = &store.worksheet(id).unwrap().columns[0];
        assert_eq!(column.column_type, ColumnType::Select);
        assert_eq!(column.options, Some(vec!["low".to_string(), "high".to_string()]));

        store.update_column_type(id, col_id, ColumnType::Date, None).unwrap();
        assert_eq!(store.worksheet(id).unwrap().columns[0].options, None);
    }

    #[test]
    fn test_update_column_title_and_status() {
        let (mut store, id) = store_with_grid(1, 1);
        let col_id = store.worksheet(id).unwrap().columns[0].id;
        store.update_column_title(id, col_id, "Name").unwrap();
        store.set_status(id, WorksheetStatus::InReview).unwrap();
        let sheet = store.worksheet(id).unwrap();
        assert_eq!(sheet.columns[0].title, "Name");
        assert_eq!(sheet.status, WorksheetStatus::InReview);
    }
}
