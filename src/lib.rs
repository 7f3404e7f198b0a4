//! wsgrid - Worksheet Grid Engine
//!
//! A spreadsheet-style grid over a worksheet store: A1 references, formula
//! evaluation with cycle detection, rectangular selection, cell editing,
//! tab/newline clipboard transfer and content-based auto-sizing, plus a
//! terminal host built on ratatui.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::*;
pub use domain::*;
