use crate::application::{App, AppMode, Direction, EditTrigger};
use crate::domain::WorksheetStore;
use crate::infrastructure::{CsvExporter, FileRepository};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event<S: WorksheetStore>(app: &mut App<S>, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Editing => Self::handle_editing_mode(app, key, modifiers),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::SaveAs | AppMode::ExportCsv | AppMode::RenameColumn => Self::handle_prompt_mode(app, key),
        }
    }

    pub fn handle_mouse_event<S: WorksheetStore>(app: &mut App<S>, event: MouseEvent) {
        if !matches!(app.mode, AppMode::Normal | AppMode::Editing) {
            return;
        }
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(pos) = app.layout.hit(event.column, event.row) {
                    app.status_message = None;
                    app.click_cell(pos, event.modifiers.contains(KeyModifiers::SHIFT));
                }
            }
            MouseEventKind::ScrollDown => {
                if app.scroll_row + 1 < app.bounds().rows {
                    app.scroll_row += 1;
                }
            }
            MouseEventKind::ScrollUp => {
                app.scroll_row = app.scroll_row.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn handle_normal_mode<S: WorksheetStore>(app: &mut App<S>, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('c') => {
                    app.copy_selection();
                }
                KeyCode::Char('v') => app.paste_from_clipboard(),
                KeyCode::Char('w') => app.auto_size_column(),
                KeyCode::Char('h') => app.auto_size_row(),
                KeyCode::Char('r') => app.add_row(),
                KeyCode::Char('t') => app.add_column(),
                KeyCode::Char('d') => app.delete_row(),
                KeyCode::Char('k') => app.delete_column(),
                KeyCode::Char('n') => app.start_rename_column(),
                KeyCode::Char('y') => app.cycle_column_type(),
                KeyCode::Char('s') => app.start_save_as(),
                KeyCode::Char('e') => app.start_csv_export(),
                _ => {}
            }
            return;
        }

        let is_shift = modifiers.contains(KeyModifiers::SHIFT);
        app.status_message = None;

        match key {
            KeyCode::Up => app.move_selection(Direction::Up, is_shift),
            KeyCode::Down => app.move_selection(Direction::Down, is_shift),
            KeyCode::Left => app.move_selection(Direction::Left, is_shift),
            KeyCode::Right => app.move_selection(Direction::Right, is_shift),
            KeyCode::Tab => app.tab(is_shift),
            KeyCode::BackTab => app.tab(true),
            KeyCode::Enter | KeyCode::F(2) => app.start_edit(EditTrigger::Enter),
            KeyCode::F(1) => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            KeyCode::Delete | KeyCode::Backspace => app.clear_selection_cells(),
            KeyCode::Esc => {
                // collapse the range onto the active cell
                let active = app.selection.active();
                app.point(active, false);
            }
            KeyCode::Char(c) if !modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER) => {
                app.type_char(c);
            }
            _ => {}
        }
    }

    fn handle_editing_mode<S: WorksheetStore>(app: &mut App<S>, key: KeyCode, modifiers: KeyModifiers) {
        let is_shift = modifiers.contains(KeyModifiers::SHIFT);
        match key {
            KeyCode::Enter => app.commit_and_advance(is_shift),
            KeyCode::Esc => app.cancel_edit(),
            KeyCode::Tab => app.tab(is_shift),
            KeyCode::BackTab => app.tab(true),
            KeyCode::Up => app.move_selection(Direction::Up, false),
            KeyCode::Down => app.move_selection(Direction::Down, false),
            _ => {
                let Some(session) = app.edit.as_mut() else {
                    return;
                };
                match key {
                    KeyCode::Left => session.cursor_left(),
                    KeyCode::Right => session.cursor_right(),
                    KeyCode::Home => session.cursor_home(),
                    KeyCode::End => session.cursor_end(),
                    KeyCode::Backspace => session.backspace(),
                    KeyCode::Delete => session.delete(),
                    KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => session.insert_char(c),
                    _ => {}
                }
            }
        }
    }

    fn handle_help_mode<S: WorksheetStore>(app: &mut App<S>, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_prompt_mode<S: WorksheetStore>(app: &mut App<S>, key: KeyCode) {
        match key {
            KeyCode::Enter => Self::confirm_prompt(app),
            KeyCode::Esc => app.close_prompt(),
            KeyCode::Backspace => app.prompt_backspace(),
            KeyCode::Delete => app.prompt_delete(),
            KeyCode::Left => app.prompt_left(),
            KeyCode::Right => app.prompt_right(),
            KeyCode::Home => app.prompt_home(),
            KeyCode::End => app.prompt_end(),
            KeyCode::Char(c) => app.prompt_insert(c),
            _ => {}
        }
    }

    fn confirm_prompt<S: WorksheetStore>(app: &mut App<S>) {
        match app.mode {
            AppMode::SaveAs => {
                let path = app.save_filename();
                if let Some(sheet) = app.worksheet() {
                    let result = FileRepository::save_worksheet(sheet, &path);
                    app.set_save_result(result);
                }
            }
            AppMode::ExportCsv => {
                let path = app.csv_export_filename();
                if let Some(sheet) = app.worksheet() {
                    let result = CsvExporter::export_to_csv(sheet, &path);
                    app.set_csv_export_result(result);
                }
            }
            AppMode::RenameColumn => app.confirm_rename_column(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{CellPos, GridLayout, SelectionRange, Span};
    use crate::domain::{CellValue, Worksheet};
    use crate::infrastructure::{MemoryClipboard, MemoryStore};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn app() -> App<MemoryStore> {
        let mut store = MemoryStore::new();
        let id = store.insert(Worksheet::with_grid("test", "me", 4, 4));
        App::new(store, id, Box::new(MemoryClipboard::default())).unwrap()
    }

    fn press(app: &mut App<MemoryStore>, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    fn ctrl(app: &mut App<MemoryStore>, c: char) {
        InputHandler::handle_key_event(app, KeyCode::Char(c), KeyModifiers::CONTROL);
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_printable_key_starts_overwrite_edit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.mode, AppMode::Editing);
        assert_eq!(app.formula_bar_text(), "x");
    }

    #[test]
    fn test_formula_entry_through_keys() {
        let mut app = app();
        type_text(&mut app, "3");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "=A1*2");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.display_value(1, 0), CellValue::Number(6.0));
        assert_eq!(app.selection.active(), CellPos::new(2, 0));
    }

    #[test]
    fn test_editing_keys_move_cursor_not_selection() {
        let mut app = app();
        type_text(&mut app, "ac");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.selection.active(), CellPos::new(0, 0));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.raw_value(0, 0), CellValue::Empty);
    }

    #[test]
    fn test_shift_arrows_extend_range() {
        let mut app = app();
        InputHandler::handle_key_event(&mut app, KeyCode::Right, KeyModifiers::SHIFT);
        InputHandler::handle_key_event(&mut app, KeyCode::Down, KeyModifiers::SHIFT);
        assert_eq!(
            app.selection.range(),
            SelectionRange { start_row: 0, end_row: 1, start_col: 0, end_col: 1 }
        );
        press(&mut app, KeyCode::Esc);
        assert!(app.selection.range().is_single_cell());
    }

    #[test]
    fn test_copy_paste_keys() {
        let mut app = app();
        type_text(&mut app, "=1+1");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Up);
        ctrl(&mut app, 'c');
        press(&mut app, KeyCode::Right);
        ctrl(&mut app, 'v');
        assert_eq!(app.raw_value(0, 1), CellValue::from("=1+1"));
    }

    #[test]
    fn test_structure_shortcuts() {
        let mut app = app();
        ctrl(&mut app, 'r');
        ctrl(&mut app, 't');
        assert_eq!((app.bounds().rows, app.bounds().cols), (5, 5));
        ctrl(&mut app, 'd');
        ctrl(&mut app, 'k');
        assert_eq!((app.bounds().rows, app.bounds().cols), (4, 4));
        ctrl(&mut app, 'y');
        assert_eq!(app.worksheet().unwrap().columns[0].column_type.as_str(), "number");
    }

    #[test]
    fn test_rename_prompt() {
        let mut app = app();
        ctrl(&mut app, 'n');
        assert_eq!(app.mode, AppMode::RenameColumn);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "Qty");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.worksheet().unwrap().columns[0].title, "Qty");
    }

    #[test]
    fn test_save_and_export_prompts_write_files() {
        let dir = tempdir().unwrap();
        let mut app = app();
        type_text(&mut app, "7");
        press(&mut app, KeyCode::Enter);

        ctrl(&mut app, 's');
        assert_eq!(app.mode, AppMode::SaveAs);
        app.prompt_input = dir.path().join("sheet.json").display().to_string();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(dir.path().join("sheet.json").exists());

        ctrl(&mut app, 'e');
        assert_eq!(app.prompt_input, dir.path().join("sheet.csv").display().to_string());
        press(&mut app, KeyCode::Enter);
        let csv = fs::read_to_string(dir.path().join("sheet.csv")).unwrap();
        assert!(csv.starts_with("A,B,C,D\n7,,,\n"));
    }

    #[test]
    fn test_help_mode_toggle() {
        let mut app = app();
        press(&mut app, KeyCode::F(1));
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.help_scroll, 1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_mouse_click_selects_hit_cell() {
        let mut app = app();
        app.layout = GridLayout {
            columns: vec![Span { start: 7, len: 10, index: 0 }, Span { start: 18, len: 10, index: 1 }],
            rows: vec![Span { start: 5, len: 1, index: 0 }, Span { start: 6, len: 1, index: 1 }],
        };
        let click = |column, row, modifiers| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers,
        };

        InputHandler::handle_mouse_event(&mut app, click(20, 6, KeyModifiers::NONE));
        assert_eq!(app.selection.active(), CellPos::new(1, 1));

        InputHandler::handle_mouse_event(&mut app, click(8, 5, KeyModifiers::SHIFT));
        assert_eq!(
            app.selection.range(),
            SelectionRange { start_row: 0, end_row: 1, start_col: 0, end_col: 1 }
        );

        // outside the grid
        InputHandler::handle_mouse_event(&mut app, click(0, 0, KeyModifiers::NONE));
        assert_eq!(app.selection.anchor(), CellPos::new(1, 1));
        assert!(!app.selection.range().is_single_cell());
    }
}
