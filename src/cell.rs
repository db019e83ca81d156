//! Terminal cell type representing a single character position.
//!
//! A screen is a grid of cells. Each cell holds one grapheme (or nothing)
//! plus its style.
//!
//! # Wide Characters
//!
//! Some characters (CJK, emoji) have display width 2. When a wide character
//! is placed in a cell, the following cell becomes a
//! [`CellContent::Continuation`] to indicate it's occupied by the previous
//! character.
//!
//! # Examples
//!
//! ```
//! use setup_tui::{Cell, Color, Style};
//!
//! let cell = Cell::new('A', Style::fg(Color::Green));
//! assert_eq!(cell.display_width(), 1);
//!
//! let cluster = Cell::from_grapheme("👍", Style::NONE);
//! assert_eq!(cluster.display_width(), 2);
//! ```

use crate::color::Color;
use crate::style::{Style, TextAttributes};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Content of a terminal cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CellContent {
    /// Single-codepoint character (display width 1-2).
    Char(char),
    /// Multi-codepoint grapheme cluster with its display width.
    Cluster(Box<str>, u8),
    /// Empty/cleared cell.
    #[default]
    Empty,
    /// Continuation of a wide character from the previous cell.
    Continuation,
}

impl CellContent {
    /// Get the display width of this content.
    #[must_use]
    pub fn display_width(&self) -> usize {
        match self {
            Self::Char(c) => c.width().unwrap_or(0).max(1),
            Self::Cluster(_, width) => usize::from(*width),
            Self::Empty => 1,
            Self::Continuation => 0,
        }
    }

    /// Check if this is a continuation cell.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        matches!(self, Self::Continuation)
    }

    /// Check if this is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Get the character if this is a single char.
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Append the textual form of this content to `out`.
    ///
    /// Empty cells render as a space, continuation cells as nothing.
    pub fn push_to(&self, out: &mut String) {
        match self {
            Self::Char(c) => out.push(*c),
            Self::Cluster(s, _) => out.push_str(s),
            Self::Empty => out.push(' '),
            Self::Continuation => {}
        }
    }
}

/// A single styled terminal cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub content: CellContent,
    pub fg: Color,
    pub bg: Color,
    pub attributes: TextAttributes,
}

impl Cell {
    /// Create a cell holding one character.
    #[must_use]
    pub fn new(ch: char, style: Style) -> Self {
        Self {
            content: CellContent::Char(ch),
            fg: style.fg,
            bg: style.bg,
            attributes: style.attributes,
        }
    }

    /// Create a cell from a grapheme cluster.
    ///
    /// Single-codepoint clusters are stored as [`CellContent::Char`].
    #[must_use]
    pub fn from_grapheme(grapheme: &str, style: Style) -> Self {
        let mut chars = grapheme.chars();
        let content = match (chars.next(), chars.next()) {
            (Some(c), None) => CellContent::Char(c),
            (None, _) => CellContent::Empty,
            _ => {
                let width = grapheme.width().clamp(1, 2);
                CellContent::Cluster(grapheme.into(), width as u8)
            }
        };
        Self {
            content,
            fg: style.fg,
            bg: style.bg,
            attributes: style.attributes,
        }
    }

    /// Create a blank cell with the given style (renders as a space).
    #[must_use]
    pub fn blank(style: Style) -> Self {
        Self {
            content: CellContent::Empty,
            fg: style.fg,
            bg: style.bg,
            attributes: style.attributes,
        }
    }

    /// Continuation marker following a wide character.
    #[must_use]
    pub fn continuation(style: Style) -> Self {
        Self {
            content: CellContent::Continuation,
            ..Self::blank(style)
        }
    }

    /// The cell's style.
    #[must_use]
    pub const fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            attributes: self.attributes,
        }
    }

    /// Display width of the content.
    #[must_use]
    pub fn display_width(&self) -> usize {
        self.content.display_width()
    }

    /// Check if this cell continues a wide character.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.content.is_continuation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_new_keeps_style() {
        let cell = Cell::new('x', Style::fg(Color::Red).with_bold());
        assert_eq!(cell.content.as_char(), Some('x'));
        assert_eq!(cell.fg, Color::Red);
        assert!(cell.attributes.contains(TextAttributes::BOLD));
        assert_eq!(cell.style(), Style::fg(Color::Red).with_bold());
    }

    #[test]
    fn test_wide_char_width() {
        assert_eq!(Cell::new('漢', Style::NONE).display_width(), 2);
        assert_eq!(Cell::new('a', Style::NONE).display_width(), 1);
    }

    #[test]
    fn test_single_codepoint_grapheme_is_char() {
        let cell = Cell::from_grapheme("é", Style::NONE);
        assert_eq!(cell.content, CellContent::Char('é'));
    }

    #[test]
    fn test_push_to() {
        let mut out = String::new();
        Cell::new('a', Style::NONE).content.push_to(&mut out);
        Cell::blank(Style::NONE).content.push_to(&mut out);
        Cell::continuation(Style::NONE).content.push_to(&mut out);
        assert_eq!(out, "a ");
    }
}
