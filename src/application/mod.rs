//! Application layer managing state and user workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! selection, the edit session, clipboard transfer and the [`App`] state
//! that ties them to a worksheet store.

pub mod clipboard;
pub mod edit;
pub mod selection;
pub mod state;

pub use clipboard::*;
pub use edit::*;
pub use selection::*;
pub use state::*;
