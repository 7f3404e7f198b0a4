use crate::application::{App, AppMode, GridLayout, Span};
use crate::domain::WorksheetStore;
use crate::domain::reference::index_to_letters;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
};

const ROW_LABEL_WIDTH: u16 = 5;
const COLUMN_SPACING: u16 = 1;

/// Draws the whole screen and records the grid geometry on `app` so mouse
/// clicks can be mapped back to cells.
pub fn render_ui<S: WorksheetStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_formula_bar(f, app, chunks[1]);
    render_grid(f, app, chunks[2]);
    render_status_bar(f, app, chunks[3]);

    if app.mode == AppMode::Help {
        render_help_popup(f, app.help_scroll);
    }
}

fn render_header<S: WorksheetStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let (title, status) = app
        .worksheet()
        .map(|sheet| (sheet.title.clone(), format!("{:?}", sheet.status)))
        .unwrap_or_default();
    let header = Paragraph::new(format!("wsgrid | {title} [{status}] | Cell: {}", app.active_address()))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_formula_bar<S: WorksheetStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let style = if app.is_editing() {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let bar = Paragraph::new(app.formula_bar_text())
        .block(Block::default().borders(Borders::ALL).title(app.active_address()))
        .style(style);
    f.render_widget(bar, area);

    if let Some(session) = &app.edit {
        f.set_cursor_position((cursor_x(area, session.cursor()), area.y + 1));
    }
}

fn render_grid<S: WorksheetStore>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.worksheet().map(|sheet| sheet.title.clone()).unwrap_or_default());
    let inner = block.inner(area);
    let bounds = app.bounds();

    // Columns that fit, left to right from the scroll position.
    let mut layout = GridLayout::default();
    let mut x = inner.x + ROW_LABEL_WIDTH + COLUMN_SPACING;
    for col in app.scroll_col..bounds.cols {
        let width = app.column_width_chars(col);
        if x + width > inner.right() && !layout.columns.is_empty() {
            break;
        }
        let width = width.min(inner.right().saturating_sub(x));
        layout.columns.push(Span { start: x, len: width, index: col });
        x = x.saturating_add(width + COLUMN_SPACING);
    }

    let mut y = inner.y + 1;
    for row in app.scroll_row..bounds.rows {
        let height = app.row_height_lines(row);
        if y + height > inner.bottom() && !layout.rows.is_empty() {
            break;
        }
        layout.rows.push(Span { start: y, len: height, index: row });
        y = y.saturating_add(height);
    }

    let range = app.selection.range();
    let active = app.selection.active();

    let mut headers = vec![Cell::from("")];
    let column_titles: Vec<String> = app
        .worksheet()
        .map(|sheet| sheet.columns.iter().map(|column| column.title.clone()).collect())
        .unwrap_or_default();
    for span in &layout.columns {
        let style = if span.index == active.col {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let letter = index_to_letters(span.index);
        let label = match column_titles.get(span.index) {
            Some(title) if *title != letter => format!("{letter} {title}"),
            _ => letter,
        };
        headers.push(Cell::from(label).style(style));
    }

    let mut rows = vec![Row::new(headers).height(1)];
    for row_span in &layout.rows {
        let row = row_span.index;
        let label_style = if row == active.row {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let mut cells = vec![Cell::from(format!("{}", row + 1)).style(label_style)];

        for span in &layout.columns {
            let col = span.index;
            let is_active = row == active.row && col == active.col;
            let text = match &app.edit {
                Some(session) if is_active => session.draft().to_string(),
                _ => app.display_value(row, col).to_string(),
            };
            let style = if is_active && app.is_editing() {
                Style::default().bg(Color::Green).fg(Color::Black)
            } else if is_active {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else if range.contains(row, col) {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            cells.push(Cell::from(text).style(style));
        }
        rows.push(Row::new(cells).height(row_span.len));
    }

    let mut widths = vec![Constraint::Length(ROW_LABEL_WIDTH)];
    widths.extend(layout.columns.iter().map(|span| Constraint::Length(span.len)));
    let table = Table::new(rows, widths)
        .block(block)
        .column_spacing(COLUMN_SPACING);
    f.render_widget(table, area);

    app.update_viewport_size(layout.rows.len(), layout.columns.len());
    app.layout = layout;
}

fn render_status_bar<S: WorksheetStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let text = match app.mode {
        AppMode::Normal => match &app.status_message {
            Some(status) => status.clone(),
            None => {
                let filename = app
                    .filename
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "unsaved".to_string());
                format!("File: {filename} | Enter/F2: edit | Ctrl+C/V: copy/paste | Ctrl+S: save | F1: help | Ctrl+Q: quit")
            }
        },
        AppMode::Editing => "Enter: commit | Shift+Enter: commit up | Esc: cancel".to_string(),
        AppMode::Help => "↑↓: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/F1: close help".to_string(),
        AppMode::SaveAs => format!("Save as: {} (Enter to save, Esc to cancel)", app.prompt_input),
        AppMode::ExportCsv => format!("Export CSV as: {} (Enter to export, Esc to cancel)", app.prompt_input),
        AppMode::RenameColumn => format!("Column title: {} (Enter to rename, Esc to cancel)", app.prompt_input),
    };

    let style = match app.mode {
        AppMode::Normal => Style::default(),
        AppMode::Editing => Style::default().fg(Color::Green),
        AppMode::Help => Style::default().fg(Color::Cyan),
        AppMode::SaveAs | AppMode::RenameColumn => Style::default().fg(Color::Yellow),
        AppMode::ExportCsv => Style::default().fg(Color::Magenta),
    };
    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);

    if matches!(app.mode, AppMode::SaveAs | AppMode::ExportCsv | AppMode::RenameColumn) {
        let prefix = match app.mode {
            AppMode::SaveAs => "Save as: ",
            AppMode::ExportCsv => "Export CSV as: ",
            _ => "Column title: ",
        };
        let offset = prefix.chars().count().saturating_add(app.prompt_cursor);
        f.set_cursor_position((cursor_x(area, offset), area.y + 1));
    }
}

/// Column of a text cursor `offset` characters into a bordered box, kept
/// inside the box.
fn cursor_x(area: Rect, offset: usize) -> u16 {
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    area.x
        .saturating_add(1)
        .saturating_add(offset)
        .min(area.right().saturating_sub(2))
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;
    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let help_widget = Paragraph::new(help_lines[start_line..end_line].join("\n"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("wsgrid help (line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));
    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"WSGRID WORKSHEET GRID

=== FORMULAS ===
A cell starting with = is a formula; anything else is a literal.
=A1*2+B3        Arithmetic over + - * / and parentheses
=SUM(A1:A3)     Sum of a range (also AVERAGE, MIN, MAX)
=SUM(A1,B2,5)   Arguments may mix references, ranges and numbers
=A1             Shows the numeric value of A1 (text reads as 0)
#ERR            The formula could not be evaluated
#CYCLE          The formula depends on itself

=== SELECTION ===
Arrow keys      Move the active cell
Shift+Arrows    Extend the range from the anchor
Tab/Shift+Tab   Move right / left
Click           Select a cell; Shift+click extends

=== EDITING ===
Enter / F2      Edit the active cell
Double click    Edit the clicked cell
Any character   Replace the cell content with that character
Enter           Commit and move down (Shift+Enter moves up)
Esc             Discard the draft
Delete          Clear the selected range

=== CLIPBOARD ===
Ctrl+C          Copy the range as tab-separated text (formulas verbatim)
Ctrl+V          Paste at the top-left of the range; overflow is dropped

=== STRUCTURE ===
Ctrl+R / Ctrl+T Add a row / a column
Ctrl+D / Ctrl+K Delete the active row / column
Ctrl+N          Rename the active column
Ctrl+Y          Cycle column type (text, number, date, select)
Ctrl+W / Ctrl+H Auto-size the active column / row

=== FILES ===
Ctrl+S          Save the worksheet as JSON
Ctrl+E          Export display values as CSV
Ctrl+Q          Quit

=== HELP NAVIGATION ===
Up/Down         Scroll one line
PgUp/PgDn       Scroll five lines
Home            Jump to top
Esc/F1          Close this help window"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_x_stays_inside_box() {
        let area = Rect::new(2, 0, 40, 3);
        assert_eq!(cursor_x(area, 0), 3);
        assert_eq!(cursor_x(area, 5), 8);
        assert_eq!(cursor_x(area, 70_000), 40);
        assert_eq!(cursor_x(area, usize::MAX), 40);
    }
}
