//! Text styling with attributes and colors.
//!
//! - [`TextAttributes`]: bitflags for bold, underline, standout, etc.
//! - [`Style`]: palette colors plus attributes, the unit every drawing
//!   primitive takes
//!
//! # Examples
//!
//! ```
//! use setup_tui::{Color, Style, TextAttributes};
//!
//! let title = Style::bold().with_underline();
//! let error = Style::fg(Color::Red).with_bold();
//! let selected = Style::standout().merge(Style::fg(Color::Cyan));
//! assert!(selected.attributes.contains(TextAttributes::INVERSE));
//! ```

use crate::color::Color;
use bitflags::bitflags;

bitflags! {
    /// Text rendering attributes.
    ///
    /// Attributes combine with bitwise OR. Not all terminals support all
    /// attributes.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct TextAttributes: u32 {
        /// Bold/increased intensity.
        const BOLD          = 0x01;
        /// Dim/decreased intensity.
        const DIM           = 0x02;
        /// Italic (not widely supported).
        const ITALIC        = 0x04;
        /// Underlined text.
        const UNDERLINE     = 0x08;
        /// Blinking text (rarely supported).
        const BLINK         = 0x10;
        /// Swapped foreground/background, the classic curses standout.
        const INVERSE       = 0x20;
        /// Hidden/invisible text.
        const HIDDEN        = 0x40;
        /// Strikethrough text.
        const STRIKETHROUGH = 0x80;
    }
}

/// Complete text style: colors and attributes.
///
/// `Color::Default` means "use the terminal default" so styled text respects
/// the user's theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Text rendering attributes.
    pub attributes: TextAttributes,
}

impl Style {
    /// Plain text in terminal default colors.
    pub const NONE: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        attributes: TextAttributes::empty(),
    };

    /// Style with only a foreground color.
    #[must_use]
    pub const fn fg(color: Color) -> Self {
        Self {
            fg: color,
            bg: Color::Default,
            attributes: TextAttributes::empty(),
        }
    }

    /// Style with only a background color.
    #[must_use]
    pub const fn bg(color: Color) -> Self {
        Self {
            fg: Color::Default,
            bg: color,
            attributes: TextAttributes::empty(),
        }
    }

    /// Style with only the given attributes.
    #[must_use]
    pub const fn attrs(attributes: TextAttributes) -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
            attributes,
        }
    }

    /// Bold text.
    #[must_use]
    pub const fn bold() -> Self {
        Self::attrs(TextAttributes::BOLD)
    }

    /// Underlined text.
    #[must_use]
    pub const fn underline() -> Self {
        Self::attrs(TextAttributes::UNDERLINE)
    }

    /// Highlighted (reverse video) text.
    #[must_use]
    pub const fn standout() -> Self {
        Self::attrs(TextAttributes::INVERSE)
    }

    /// Return a copy with a different foreground.
    #[must_use]
    pub const fn with_fg(self, color: Color) -> Self {
        Self { fg: color, ..self }
    }

    /// Return a copy with a different background.
    #[must_use]
    pub const fn with_bg(self, color: Color) -> Self {
        Self { bg: color, ..self }
    }

    /// Return a copy with additional attributes.
    #[must_use]
    pub const fn with_attributes(self, attrs: TextAttributes) -> Self {
        Self {
            attributes: self.attributes.union(attrs),
            ..self
        }
    }

    #[must_use]
    pub const fn with_bold(self) -> Self {
        self.with_attributes(TextAttributes::BOLD)
    }

    #[must_use]
    pub const fn with_underline(self) -> Self {
        self.with_attributes(TextAttributes::UNDERLINE)
    }

    #[must_use]
    pub const fn with_standout(self) -> Self {
        self.with_attributes(TextAttributes::INVERSE)
    }

    /// Check whether this style changes anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Overlay `other` on top of this style.
    ///
    /// Attributes are ORed; a non-default color in `other` wins.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            fg: if other.fg == Color::Default {
                self.fg
            } else {
                other.fg
            },
            bg: if other.bg == Color::Default {
                self.bg
            } else {
                other.bg
            },
            attributes: self.attributes | other.attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_merge() {
        let base = Style::fg(Color::Red).with_bold();
        let overlay = Style::underline().with_fg(Color::Green);
        let merged = base.merge(overlay);

        assert_eq!(merged.fg, Color::Green);
        assert!(merged.attributes.contains(TextAttributes::BOLD));
        assert!(merged.attributes.contains(TextAttributes::UNDERLINE));
    }

    #[test]
    fn test_merge_keeps_color_when_overlay_is_default() {
        let merged = Style::fg(Color::Yellow).merge(Style::bold());
        assert_eq!(merged.fg, Color::Yellow);
    }

    #[test]
    fn test_const_styles() {
        assert!(Style::NONE.is_empty());
        assert_eq!(Style::standout().attributes, TextAttributes::INVERSE);
        assert!(!Style::bold().is_empty());
    }
}
