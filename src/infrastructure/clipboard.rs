//! Clipboard providers.
//!
//! The application talks to a [`ClipboardProvider`] so that the system
//! clipboard can be swapped for an in-memory one in tests or headless runs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("system clipboard unavailable: {0}")]
    System(#[from] arboard::Error),

    #[error("clipboard is empty")]
    Empty,
}

pub trait ClipboardProvider {
    fn get_text(&mut self) -> Result<String, ClipboardError>;

    fn set_text(&mut self, text: String) -> Result<(), ClipboardError>;
}

/// Platform clipboard backed by arboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
        })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        Ok(self.inner.get_text()?)
    }

    fn set_text(&mut self, text: String) -> Result<(), ClipboardError> {
        Ok(self.inner.set_text(text)?)
    }
}

/// Process-local clipboard.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl ClipboardProvider for MemoryClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        self.text.clone().ok_or(ClipboardError::Empty)
    }

    fn set_text(&mut self, text: String) -> Result<(), ClipboardError> {
        self.text = Some(text);
        Ok(())
    }
}

/// Picks the system clipboard when requested and available, otherwise memory.
pub fn default_provider(use_system: bool) -> Box<dyn ClipboardProvider> {
    if use_system {
        match SystemClipboard::new() {
            Ok(clipboard) => return Box::new(clipboard),
            Err(err) => tracing::warn!("falling back to in-memory clipboard: {err}"),
        }
    }
    Box::new(MemoryClipboard::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::default();
        assert!(matches!(clipboard.get_text(), Err(ClipboardError::Empty)));
        clipboard.set_text("a\tb".to_string()).unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "a\tb");
    }

    #[test]
    fn test_default_provider_without_system() {
        let mut clipboard = default_provider(false);
        clipboard.set_text("x".to_string()).unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "x");
    }
}
