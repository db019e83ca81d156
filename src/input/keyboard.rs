//! Keys as the panels see them.

use bitflags::bitflags;

bitflags! {
    /// Modifiers held with a key.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT = 0b0000_0010;
        const CTRL = 0b0000_0100;
    }
}

/// Keys the parser can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Backspace,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Tab,
    /// Shift+Tab.
    BackTab,
    Delete,
    Insert,
    /// F1 to F12.
    F(u8),
    /// A printable character, space included.
    Char(char),
    Esc,
}

impl KeyCode {
    #[must_use]
    pub fn char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }
}

/// One key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    #[must_use]
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// `code` without modifiers.
    #[must_use]
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    #[must_use]
    pub fn char(c: char) -> Self {
        Self::key(KeyCode::Char(c))
    }

    /// `code` with Ctrl held.
    #[must_use]
    pub fn with_ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CTRL)
    }

    #[must_use]
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(KeyModifiers::CTRL)
    }

    /// Ctrl held with the letter `c`, e.g. `is_ctrl('l')` for a repaint.
    #[must_use]
    pub fn is_ctrl(&self, c: char) -> bool {
        self.ctrl() && self.code == KeyCode::Char(c)
    }

    /// The character typed, unless Ctrl or Alt turned it into a chord.
    ///
    /// Shift is allowed since it only changes the character itself.
    #[must_use]
    pub fn plain_char(&self) -> Option<char> {
        if self.modifiers.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) {
            return None;
        }
        self.code.char()
    }

    /// Exactly `code`, with nothing held.
    #[must_use]
    pub fn is(&self, code: KeyCode) -> bool {
        self.code == code && self.modifiers.is_empty()
    }

    /// Escape, whatever the modifiers.
    #[must_use]
    pub fn is_esc(&self) -> bool {
        self.code == KeyCode::Esc
    }
}

impl From<char> for KeyEvent {
    fn from(c: char) -> Self {
        Self::char(c)
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::key(code)
    }
}
