//! Draft buffer for the single cell being edited.

use crate::domain::{ColumnId, RowId};

/// How an edit session was opened, which decides the initial draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTrigger {
    /// Double click / double activation: draft starts as the raw value.
    DoubleActivate,
    /// Enter on a selected cell: draft starts as the raw value.
    Enter,
    /// A printable character typed over the cell: draft is that character alone.
    Overwrite(char),
}

/// An in-progress cell edit. The grid is not touched until commit.
///
/// The cursor is a character index into `draft`, not a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub row_id: RowId,
    pub column_id: ColumnId,
    draft: String,
    cursor: usize,
}

impl EditSession {
    pub fn open(row_id: RowId, column_id: ColumnId, trigger: EditTrigger, raw_text: &str) -> Self {
        let draft = match trigger {
            EditTrigger::DoubleActivate | EditTrigger::Enter => raw_text.to_string(),
            EditTrigger::Overwrite(ch) => ch.to_string(),
        };
        let cursor = draft.chars().count();
        Self {
            row_id,
            column_id,
            draft,
            cursor,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn into_draft(self) -> String {
        self.draft
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.draft
            .char_indices()
            .nth(char_index)
            .map_or(self.draft.len(), |(offset, _)| offset)
    }

    fn len(&self) -> usize {
        self.draft.chars().count()
    }

    pub fn insert_char(&mut self, ch: char) {
        let offset = self.byte_offset(self.cursor);
        self.draft.insert(offset, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let offset = self.byte_offset(self.cursor);
            self.draft.remove(offset);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let offset = self.byte_offset(self.cursor);
            self.draft.remove(offset);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.len();
    }
}
