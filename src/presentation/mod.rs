//! Presentation layer handling terminal UI and user input.
//!
//! This module renders the worksheet grid with ratatui and maps crossterm
//! key and mouse events onto application actions.

pub mod input;
pub mod ui;

pub use input::*;
pub use ui::*;
