//! Terminal palette colors.
//!
//! Panels only use the eight basic ANSI colors plus the terminal default,
//! which keeps output legible on every terminal that supports color at all.
//!
//! # Examples
//!
//! ```
//! use setup_tui::Color;
//!
//! assert_eq!(Color::from_name("red"), Some(Color::Red));
//! assert_eq!(Color::Red.fg_code(), 31);
//! assert_eq!(Color::Default.bg_code(), 49);
//! ```

use std::fmt;

/// Basic ANSI palette color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    /// Terminal default foreground/background.
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    /// Every named color, in palette order.
    pub const NAMED: [Self; 8] = [
        Self::Black,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Blue,
        Self::Magenta,
        Self::Cyan,
        Self::White,
    ];

    /// Look up a color by its lowercase name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMED.into_iter().find(|c| c.name() == name)
    }

    /// Lowercase name, `"default"` for the terminal default.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::White => "white",
        }
    }

    const fn index(self) -> Option<u8> {
        match self {
            Self::Default => None,
            Self::Black => Some(0),
            Self::Red => Some(1),
            Self::Green => Some(2),
            Self::Yellow => Some(3),
            Self::Blue => Some(4),
            Self::Magenta => Some(5),
            Self::Cyan => Some(6),
            Self::White => Some(7),
        }
    }

    /// SGR parameter selecting this color as foreground.
    #[must_use]
    pub const fn fg_code(self) -> u8 {
        match self.index() {
            Some(i) => 30 + i,
            None => 39,
        }
    }

    /// SGR parameter selecting this color as background.
    #[must_use]
    pub const fn bg_code(self) -> u8 {
        match self.index() {
            Some(i) => 40 + i,
            None => 49,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
