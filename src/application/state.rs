//! Application state for the worksheet grid.
//!
//! [`App`] owns the store handle, the selection, the optional edit session
//! and the UI bookkeeping (mode, scroll, sizes, status line). Every user
//! action the terminal host can trigger is a method here.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::reference::{format_ref, index_to_letters};
use crate::domain::{
    CellGrid, CellValue, ColumnId, ColumnType, FormulaEvaluator, RowId, SizingConfig, StoreError, StoreResult,
    Worksheet, WorksheetId, WorksheetStore,
};
use crate::infrastructure::{ClipboardError, ClipboardProvider};

use super::clipboard::{parse_block, plan_paste, CopiedBlock, PastePlan};
use super::edit::{EditSession, EditTrigger};
use super::selection::{CellPos, Direction, GridBounds, Selection};

/// Two clicks on the same cell within this window are a double-activation.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

const DEFAULT_SAVE_NAME: &str = "worksheet.json";
const DEFAULT_EXPORT_NAME: &str = "worksheet.csv";

/// Current mode of the application.
///
/// The mode decides how key input is interpreted and which UI elements
/// are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Navigation; shortcuts available
    Normal,
    /// A cell draft is being typed
    Editing,
    /// Help popup is displayed
    Help,
    /// Prompting for a JSON file name
    SaveAs,
    /// Prompting for a CSV file name
    ExportCsv,
    /// Prompting for the active column's new title
    RenameColumn,
}

/// A run of terminal cells occupied by one grid row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u16,
    pub len: u16,
    pub index: usize,
}

impl Span {
    fn contains(&self, at: u16) -> bool {
        at >= self.start && at - self.start < self.len
    }
}

/// Screen geometry of the last rendered grid, used for mouse hit-testing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: Vec<Span>,
    pub rows: Vec<Span>,
}

impl GridLayout {
    /// Grid cell under terminal position `(x, y)`, if any.
    pub fn hit(&self, x: u16, y: u16) -> Option<CellPos> {
        let col = self.columns.iter().find(|span| span.contains(x))?.index;
        let row = self.rows.iter().find(|span| span.contains(y))?.index;
        Some(CellPos::new(row, col))
    }
}

/// Main application state.
///
/// # Examples
///
/// ```
/// use wsgrid::application::{App, CellPos};
/// use wsgrid::domain::{CellValue, Worksheet};
/// use wsgrid::infrastructure::{MemoryClipboard, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// let id = store.insert(Worksheet::with_grid("demo", "me", 3, 3));
/// let mut app = App::new(store, id, Box::new(MemoryClipboard::default())).unwrap();
///
/// app.type_char('7');
/// app.commit_edit();
/// assert_eq!(app.raw_value(0, 0), CellValue::from("7"));
/// assert_eq!(app.selection.active(), CellPos::new(0, 0));
/// ```
pub struct App<S: WorksheetStore> {
    pub store: S,
    pub worksheet_id: WorksheetId,
    pub selection: Selection,
    /// The single in-progress cell edit, if any
    pub edit: Option<EditSession>,
    pub mode: AppMode,
    pub sizing: SizingConfig,
    /// Auto-sized column widths in pixels, keyed by column id
    pub column_widths: HashMap<ColumnId, u32>,
    /// Auto-sized row heights in pixels, keyed by row id
    pub row_heights: HashMap<RowId, u32>,
    pub scroll_row: usize,
    pub scroll_col: usize,
    pub viewport_rows: usize,
    pub viewport_cols: usize,
    pub help_scroll: usize,
    pub status_message: Option<String>,
    /// Last file the worksheet was saved to
    pub filename: Option<PathBuf>,
    /// Text of the active prompt (file name or column title)
    pub prompt_input: String,
    /// Cursor within `prompt_input`, in characters
    pub prompt_cursor: usize,
    pub layout: GridLayout,
    clipboard: Box<dyn ClipboardProvider>,
    last_copy: Option<CopiedBlock>,
    last_click: Option<(CellPos, Instant)>,
}

impl<S: WorksheetStore> App<S> {
    /// Creates the application over an existing worksheet in `store`.
    pub fn new(store: S, worksheet_id: WorksheetId, clipboard: Box<dyn ClipboardProvider>) -> StoreResult<Self> {
        if store.worksheet(worksheet_id).is_none() {
            return Err(StoreError::WorksheetNotFound(worksheet_id));
        }
        Ok(Self {
            store,
            worksheet_id,
            selection: Selection::default(),
            edit: None,
            mode: AppMode::Normal,
            sizing: SizingConfig::default(),
            column_widths: HashMap::new(),
            row_heights: HashMap::new(),
            scroll_row: 0,
            scroll_col: 0,
            viewport_rows: 20,
            viewport_cols: 8,
            help_scroll: 0,
            status_message: None,
            filename: None,
            prompt_input: String::new(),
            prompt_cursor: 0,
            layout: GridLayout::default(),
            clipboard,
            last_copy: None,
            last_click: None,
        })
    }

    pub fn with_sizing(mut self, sizing: SizingConfig) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn worksheet(&self) -> Option<&Worksheet> {
        self.store.worksheet(self.worksheet_id)
    }

    pub fn bounds(&self) -> GridBounds {
        self.worksheet()
            .map(|sheet| GridBounds::new(sheet.row_count(), sheet.col_count()))
            .unwrap_or(GridBounds::new(0, 0))
    }

    /// Stored value at `(row, col)`; formulas come back verbatim.
    pub fn raw_value(&self, row: usize, col: usize) -> CellValue {
        self.worksheet()
            .and_then(|sheet| sheet.raw_value(row, col))
            .cloned()
            .unwrap_or_default()
    }

    /// Evaluated value at `(row, col)`.
    pub fn display_value(&self, row: usize, col: usize) -> CellValue {
        self.worksheet()
            .map(|sheet| FormulaEvaluator::new(sheet).evaluate(row, col))
            .unwrap_or_default()
    }

    pub fn active_address(&self) -> String {
        let active = self.selection.active();
        format_ref(active.row, active.col)
    }

    /// The draft while editing, otherwise the active cell's raw value.
    pub fn formula_bar_text(&self) -> String {
        match &self.edit {
            Some(session) => session.draft().to_string(),
            None => {
                let active = self.selection.active();
                self.raw_value(active.row, active.col).to_string()
            }
        }
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    fn report<T>(&mut self, result: StoreResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%err, "store operation failed");
                self.status_message = Some(format!("Error: {err}"));
                None
            }
        }
    }

    fn commit_pending(&mut self) {
        if self.edit.is_some() {
            self.commit_edit();
        }
    }

    // Selection

    /// Points at a cell; with `extend` the range grows from the anchor.
    /// A pending edit is committed first.
    pub fn point(&mut self, pos: CellPos, extend: bool) {
        self.commit_pending();
        let bounds = self.bounds();
        if bounds.is_empty() {
            return;
        }
        self.selection.point(pos, extend, bounds);
        self.ensure_cursor_visible();
    }

    /// Handles a pointer click at `pos`. Returns true when it completed a
    /// double-activation, which opens an edit session on that cell.
    pub fn click_cell(&mut self, pos: CellPos, extend: bool) -> bool {
        self.click_cell_at(pos, extend, Instant::now())
    }

    pub fn click_cell_at(&mut self, pos: CellPos, extend: bool, now: Instant) -> bool {
        let repeated = match self.last_click {
            Some((last, at)) => last == pos && now.saturating_duration_since(at) <= DOUBLE_CLICK_WINDOW,
            None => false,
        };
        if repeated && !extend {
            self.last_click = None;
            self.double_activate(pos);
            return true;
        }
        self.last_click = Some((pos, now));
        self.point(pos, extend);
        false
    }

    pub fn double_activate(&mut self, pos: CellPos) {
        self.point(pos, false);
        self.start_edit(EditTrigger::DoubleActivate);
    }

    pub fn move_selection(&mut self, direction: Direction, extend: bool) {
        self.commit_pending();
        let bounds = self.bounds();
        if bounds.is_empty() {
            return;
        }
        self.selection.move_by(direction, extend, bounds);
        self.ensure_cursor_visible();
    }

    pub fn tab(&mut self, backward: bool) {
        self.commit_pending();
        let bounds = self.bounds();
        if bounds.is_empty() {
            return;
        }
        self.selection.tab(backward, bounds);
        self.ensure_cursor_visible();
    }

    // Editing

    /// Opens an edit session on the active cell. Does nothing while a
    /// session is already open or the grid is empty.
    pub fn start_edit(&mut self, trigger: EditTrigger) {
        if self.edit.is_some() {
            return;
        }
        let active = self.selection.active();
        let Some((row_id, column_id)) = self.worksheet().and_then(|sheet| sheet.ids_at(active.row, active.col))
        else {
            return;
        };
        let raw = self.raw_value(active.row, active.col).to_string();
        self.edit = Some(EditSession::open(row_id, column_id, trigger, &raw));
        self.mode = AppMode::Editing;
        self.status_message = None;
        debug!(cell = %self.active_address(), ?trigger, "edit started");
    }

    /// Printable character input: extends the draft while editing,
    /// otherwise opens an overwrite session with just that character.
    pub fn type_char(&mut self, ch: char) {
        match self.edit.as_mut() {
            Some(session) => session.insert_char(ch),
            None => self.start_edit(EditTrigger::Overwrite(ch)),
        }
    }

    /// Writes the draft through the store and closes the session.
    pub fn commit_edit(&mut self) {
        let Some(session) = self.edit.take() else {
            return;
        };
        self.mode = AppMode::Normal;

        let column_type = self
            .worksheet()
            .and_then(|sheet| sheet.columns.iter().find(|column| column.id == session.column_id))
            .map(|column| column.column_type);
        let Some(column_type) = column_type else {
            let result = Err(StoreError::ColumnNotFound(session.column_id));
            self.report::<()>(result);
            return;
        };

        let (row_id, column_id) = (session.row_id, session.column_id);
        let value = CellValue::from_input(session.draft(), column_type);
        let result = self.store.set_cell(self.worksheet_id, row_id, column_id, value);
        if self.report(result).is_some() {
            debug!(%row_id, %column_id, "edit committed");
        }
    }

    /// Enter while editing: commit, then move down (up with Shift).
    pub fn commit_and_advance(&mut self, upward: bool) {
        self.commit_edit();
        let direction = if upward { Direction::Up } else { Direction::Down };
        self.move_selection(direction, false);
    }

    pub fn cancel_edit(&mut self) {
        if self.edit.take().is_some() {
            debug!(cell = %self.active_address(), "edit cancelled");
        }
        self.mode = AppMode::Normal;
    }

    // Clipboard

    /// Copies the selected range's raw values and returns the text block.
    pub fn copy_selection(&mut self) -> String {
        let range = self.selection.range();
        self.last_copy = self.worksheet().map(|sheet| CopiedBlock::capture(sheet, range));
        let text = self
            .last_copy
            .as_ref()
            .map(|copied| copied.text.clone())
            .unwrap_or_default();
        if let Err(err) = self.clipboard.set_text(text.clone()) {
            warn!(%err, "clipboard write failed");
            self.status_message = Some(format!("Copy failed: {err}"));
            return text;
        }
        let (rows, cols) = (range.rows().count(), range.cols().count());
        debug!(rows, cols, "range copied");
        self.status_message = Some(format!("Copied {rows}x{cols}"));
        text
    }

    /// Pastes a tab/newline block at the top-left of the current range.
    /// Cells that fall outside the grid are dropped. Text that is still the
    /// last copy pastes the copied raw values; other text is converted per
    /// destination column.
    pub fn paste_text(&mut self, text: &str) {
        let block = parse_block(text);
        if block.is_empty() {
            return;
        }
        self.commit_pending();
        let bounds = self.bounds();
        if bounds.is_empty() {
            return;
        }
        // For a single-cell selection the top-left is the active cell.
        let origin = self.selection.range().top_left();

        let plan = match self.last_copy.as_ref().filter(|copied| copied.matches(text)) {
            Some(copied) => plan_paste(&copied.values, origin, bounds),
            None => {
                let Some(sheet) = self.worksheet() else {
                    return;
                };
                let plan = plan_paste(&block, origin, bounds);
                PastePlan {
                    writes: plan
                        .writes
                        .into_iter()
                        .map(|(pos, cell)| {
                            let column_type = sheet.columns[pos.col].column_type;
                            (pos, CellValue::from_input(&cell, column_type))
                        })
                        .collect(),
                    range: plan.range,
                }
            }
        };

        let Some(sheet) = self.worksheet() else {
            return;
        };
        let writes: Vec<(RowId, ColumnId, CellValue)> = plan
            .writes
            .into_iter()
            .filter_map(|(pos, value)| {
                let (row_id, column_id) = sheet.ids_at(pos.row, pos.col)?;
                Some((row_id, column_id, value))
            })
            .collect();

        let planned = writes.len();
        let mut written = 0;
        for (row_id, column_id, value) in writes {
            let result = self.store.set_cell(self.worksheet_id, row_id, column_id, value);
            if self.report(result).is_none() {
                break;
            }
            written += 1;
        }
        // Writes before a failure stay, so the range still covers the block.
        self.selection.set_range(plan.range, bounds);
        self.ensure_cursor_visible();
        debug!(written, dropped = block.iter().map(Vec::len).sum::<usize>().saturating_sub(written), "block pasted");
        if written == planned {
            self.status_message = Some(format!("Pasted {written} cells"));
        }
    }

    pub fn paste_from_clipboard(&mut self) {
        match self.clipboard.get_text() {
            Ok(text) => self.paste_text(&text),
            Err(ClipboardError::Empty) => {}
            Err(err) => {
                warn!(%err, "clipboard read failed");
                self.status_message = Some(format!("Paste failed: {err}"));
            }
        }
    }

    /// Empties every cell in the selected range.
    pub fn clear_selection_cells(&mut self) {
        let range = self.selection.range();
        let Some(sheet) = self.worksheet() else {
            return;
        };
        let targets: Vec<(RowId, ColumnId)> = range
            .rows()
            .flat_map(|row| range.cols().map(move |col| (row, col)))
            .filter_map(|(row, col)| sheet.ids_at(row, col))
            .collect();
        for (row_id, column_id) in targets {
            let result = self.store.set_cell(self.worksheet_id, row_id, column_id, CellValue::Empty);
            if self.report(result).is_none() {
                return;
            }
        }
    }

    // Sizing

    pub fn column_width_px(&self, col: usize) -> u32 {
        self.worksheet()
            .and_then(|sheet| sheet.columns.get(col))
            .and_then(|column| self.column_widths.get(&column.id).copied())
            .unwrap_or(self.sizing.min_width_px)
    }

    /// Column width converted to terminal cells.
    pub fn column_width_chars(&self, col: usize) -> u16 {
        let chars = self.column_width_px(col) / self.sizing.char_px.max(1);
        chars.clamp(1, u32::from(u16::MAX)) as u16
    }

    pub fn row_height_px(&self, row: usize) -> u32 {
        self.worksheet()
            .and_then(|sheet| sheet.rows.get(row))
            .and_then(|r| self.row_heights.get(&r.id).copied())
            .unwrap_or(self.sizing.min_height_px)
    }

    /// Row height converted to terminal lines.
    pub fn row_height_lines(&self, row: usize) -> u16 {
        let content = self.row_height_px(row).saturating_sub(self.sizing.row_padding_px);
        let lines = content / self.sizing.line_height_px.max(1);
        lines.clamp(1, u32::from(u16::MAX)) as u16
    }

    pub fn auto_size_column(&mut self) {
        let col = self.selection.active().col;
        let Some(sheet) = self.worksheet() else {
            return;
        };
        let Some(column) = sheet.columns.get(col) else {
            return;
        };
        let width = self.sizing.auto_size_column(sheet, col, &column.title);
        let column_id = column.id;
        self.column_widths.insert(column_id, width);
        debug!(col, width, "column auto-sized");
        self.status_message = Some(format!("Column {} width {width}px", index_to_letters(col)));
    }

    pub fn auto_size_row(&mut self) {
        let row = self.selection.active().row;
        let Some(sheet) = self.worksheet() else {
            return;
        };
        let Some(row_id) = sheet.rows.get(row).map(|r| r.id) else {
            return;
        };
        let height = self.sizing.auto_size_row(sheet, row);
        self.row_heights.insert(row_id, height);
        debug!(row, height, "row auto-sized");
        self.status_message = Some(format!("Row {} height {height}px", row + 1));
    }

    // Structure

    pub fn add_row(&mut self) {
        self.commit_pending();
        let result = self.store.add_row(self.worksheet_id);
        if self.report(result).is_some() {
            self.status_message = Some(format!("Added row {}", self.bounds().rows));
        }
    }

    pub fn add_column(&mut self) {
        self.commit_pending();
        let title = index_to_letters(self.bounds().cols);
        let result = self.store.add_column(self.worksheet_id, &title, ColumnType::Text);
        if self.report(result).is_some() {
            self.status_message = Some(format!("Added column {title}"));
        }
    }

    pub fn delete_row(&mut self) {
        self.commit_pending();
        let row = self.selection.active().row;
        let Some(row_id) = self.worksheet().and_then(|sheet| sheet.rows.get(row)).map(|r| r.id) else {
            return;
        };
        let result = self.store.delete_row(self.worksheet_id, row_id);
        if self.report(result).is_some() {
            self.row_heights.remove(&row_id);
            self.after_shrink();
            self.status_message = Some(format!("Deleted row {}", row + 1));
        }
    }

    pub fn delete_column(&mut self) {
        self.commit_pending();
        let col = self.selection.active().col;
        let Some(column_id) = self.worksheet().and_then(|sheet| sheet.columns.get(col)).map(|c| c.id) else {
            return;
        };
        let result = self.store.delete_column(self.worksheet_id, column_id);
        if self.report(result).is_some() {
            self.column_widths.remove(&column_id);
            self.after_shrink();
            self.status_message = Some(format!("Deleted column {}", index_to_letters(col)));
        }
    }

    fn after_shrink(&mut self) {
        self.selection.clamp_to(self.bounds());
        self.scroll_row = self.scroll_row.min(self.selection.active().row);
        self.scroll_col = self.scroll_col.min(self.selection.active().col);
    }

    /// Advances the active column's type: text, number, date, select.
    pub fn cycle_column_type(&mut self) {
        let col = self.selection.active().col;
        let Some(column) = self.worksheet().and_then(|sheet| sheet.columns.get(col)) else {
            return;
        };
        let (column_id, next, options) = (column.id, column.column_type.next(), column.options.clone());
        let result = self.store.update_column_type(self.worksheet_id, column_id, next, options);
        if self.report(result).is_some() {
            self.status_message = Some(format!("Column {} is now {}", index_to_letters(col), next.as_str()));
        }
    }

    // Prompts

    pub fn start_rename_column(&mut self) {
        let col = self.selection.active().col;
        let Some(title) = self
            .worksheet()
            .and_then(|sheet| sheet.columns.get(col))
            .map(|column| column.title.clone())
        else {
            return;
        };
        self.open_prompt(AppMode::RenameColumn, title);
    }

    pub fn confirm_rename_column(&mut self) {
        let title = self.prompt_input.trim().to_string();
        self.close_prompt();
        if title.is_empty() {
            self.status_message = Some("Column title cannot be empty".to_string());
            return;
        }
        let col = self.selection.active().col;
        let Some(column_id) = self.worksheet().and_then(|sheet| sheet.columns.get(col)).map(|c| c.id) else {
            return;
        };
        let result = self.store.update_column_title(self.worksheet_id, column_id, &title);
        if self.report(result).is_some() {
            self.status_message = Some(format!("Renamed column to {title}"));
        }
    }

    pub fn start_save_as(&mut self) {
        let name = self
            .filename
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| DEFAULT_SAVE_NAME.to_string());
        self.open_prompt(AppMode::SaveAs, name);
    }

    pub fn start_csv_export(&mut self) {
        let name = self
            .filename
            .as_ref()
            .map(|path| path.with_extension("csv").display().to_string())
            .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string());
        self.open_prompt(AppMode::ExportCsv, name);
    }

    /// File name from the prompt, or the default when it was left blank.
    pub fn save_filename(&self) -> PathBuf {
        self.prompt_path(DEFAULT_SAVE_NAME)
    }

    pub fn csv_export_filename(&self) -> PathBuf {
        self.prompt_path(DEFAULT_EXPORT_NAME)
    }

    fn prompt_path(&self, default: &str) -> PathBuf {
        match self.prompt_input.trim() {
            "" => PathBuf::from(default),
            name => PathBuf::from(name),
        }
    }

    pub fn set_save_result<E: fmt::Display>(&mut self, result: Result<PathBuf, E>) {
        match result {
            Ok(path) => {
                self.status_message = Some(format!("Saved to {}", path.display()));
                self.filename = Some(path);
            }
            Err(err) => {
                warn!(%err, "save failed");
                self.status_message = Some(format!("Save failed: {err}"));
            }
        }
        self.close_prompt();
    }

    pub fn set_csv_export_result<E: fmt::Display>(&mut self, result: Result<PathBuf, E>) {
        match result {
            Ok(path) => self.status_message = Some(format!("Exported to {}", path.display())),
            Err(err) => {
                warn!(%err, "CSV export failed");
                self.status_message = Some(format!("Export failed: {err}"));
            }
        }
        self.close_prompt();
    }

    fn open_prompt(&mut self, mode: AppMode, initial: String) {
        self.commit_pending();
        self.prompt_cursor = initial.chars().count();
        self.prompt_input = initial;
        self.mode = mode;
        self.status_message = None;
    }

    pub fn close_prompt(&mut self) {
        self.mode = AppMode::Normal;
        self.prompt_input.clear();
        self.prompt_cursor = 0;
    }

    fn prompt_offset(&self) -> usize {
        self.prompt_input
            .char_indices()
            .nth(self.prompt_cursor)
            .map_or(self.prompt_input.len(), |(offset, _)| offset)
    }

    pub fn prompt_insert(&mut self, ch: char) {
        let offset = self.prompt_offset();
        self.prompt_input.insert(offset, ch);
        self.prompt_cursor += 1;
    }

    pub fn prompt_backspace(&mut self) {
        if self.prompt_cursor > 0 {
            self.prompt_cursor -= 1;
            let offset = self.prompt_offset();
            self.prompt_input.remove(offset);
        }
    }

    pub fn prompt_delete(&mut self) {
        if self.prompt_cursor < self.prompt_input.chars().count() {
            let offset = self.prompt_offset();
            self.prompt_input.remove(offset);
        }
    }

    pub fn prompt_left(&mut self) {
        self.prompt_cursor = self.prompt_cursor.saturating_sub(1);
    }

    pub fn prompt_right(&mut self) {
        self.prompt_cursor = (self.prompt_cursor + 1).min(self.prompt_input.chars().count());
    }

    pub fn prompt_home(&mut self) {
        self.prompt_cursor = 0;
    }

    pub fn prompt_end(&mut self) {
        self.prompt_cursor = self.prompt_input.chars().count();
    }

    // Viewport

    /// Updates the viewport size for scrolling calculations.
    pub fn update_viewport_size(&mut self, rows: usize, cols: usize) {
        self.viewport_rows = rows.max(1);
        self.viewport_cols = cols.max(1);
    }

    /// Adjusts the scroll position so the active cell is visible.
    pub fn ensure_cursor_visible(&mut self) {
        let active = self.selection.active();
        if active.row < self.scroll_row {
            self.scroll_row = active.row;
        } else if active.row >= self.scroll_row + self.viewport_rows {
            self.scroll_row = active.row + 1 - self.viewport_rows;
        }

        if active.col < self.scroll_col {
            self.scroll_col = active.col;
        } else if active.col >= self.scroll_col + self.viewport_cols {
            self.scroll_col = active.col + 1 - self.viewport_cols;
        }
    }
}
