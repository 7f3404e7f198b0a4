//! Infrastructure layer providing external service integrations.
//!
//! This module contains the in-memory worksheet store, file persistence,
//! clipboard providers, settings and logging setup.

pub mod clipboard;
pub mod config;
pub mod logging;
pub mod persistence;
pub mod store;

pub use clipboard::*;
pub use config::*;
pub use logging::*;
pub use persistence::*;
pub use store::*;
