//! wsgrid - Worksheet Grid Engine
//!
//! Terminal host for the worksheet grid: loads settings, installs file
//! logging, opens or creates a worksheet and runs the event loop.

use std::env;
use std::io;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use tracing::info;

use wsgrid::application::App;
use wsgrid::domain::{Worksheet, WorksheetStore};
use wsgrid::infrastructure::{FileRepository, MemoryStore, Settings, default_provider, init_logging};
use wsgrid::presentation::{InputHandler, render_ui};

/// Entry point for the wsgrid terminal application.
///
/// An optional first argument names a worksheet JSON file to open.
///
/// # Errors
///
/// Returns an error if the settings or worksheet file cannot be read, or if
/// terminal setup fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let _log_guard = init_logging(&settings);

    let path = env::args().nth(1);
    let worksheet = match &path {
        Some(path) => FileRepository::load_worksheet(path)?,
        None => Worksheet::with_grid("Untitled", "", settings.default_rows, settings.default_columns),
    };
    info!(title = %worksheet.title, rows = worksheet.rows.len(), "worksheet opened");

    let mut store = MemoryStore::new();
    let worksheet_id = store.insert(worksheet);
    let clipboard = default_provider(settings.use_system_clipboard);
    let mut app = App::new(store, worksheet_id, clipboard)?.with_sizing(settings.sizing);
    app.filename = path.map(Into::into);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    info!("exiting");
    Ok(())
}

/// Main event loop. Runs until Ctrl+Q.
fn run_app<B: Backend, S: WorksheetStore>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }
                InputHandler::handle_key_event(app, key.code, key.modifiers);
            }
            Event::Mouse(mouse) => InputHandler::handle_mouse_event(app, mouse),
            _ => {}
        }
    }
}
