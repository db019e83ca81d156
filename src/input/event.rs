//! What an [`InputSource`](super::InputSource) delivers.

use crate::input::keyboard::KeyEvent;

/// A key press or a change of terminal size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    /// The terminal was resized; panels are laid out again.
    Resize(ResizeEvent),
}

impl Event {
    /// The key, if this is a key press.
    #[must_use]
    pub fn key(&self) -> Option<&KeyEvent> {
        match self {
            Self::Key(key) => Some(key),
            Self::Resize(_) => None,
        }
    }
}

impl From<KeyEvent> for Event {
    fn from(key: KeyEvent) -> Self {
        Self::Key(key)
    }
}

impl From<ResizeEvent> for Event {
    fn from(resize: ResizeEvent) -> Self {
        Self::Resize(resize)
    }
}

/// New terminal size in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeEvent {
    pub width: u16,
    pub height: u16,
}

impl ResizeEvent {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}
