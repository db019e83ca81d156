//! Inline formatting tags for panel text.
//!
//! A formatted message is plain text with xhtml-style tags:
//!
//! | Tag | Effect |
//! |---|---|
//! | `<b>…</b>` | bold |
//! | `<u>…</u>` | underline |
//! | `<h>…</h>` | highlight (reverse video) |
//! | `<red>…</red>` etc. | foreground color |
//!
//! Tags nest and their attributes combine; the innermost color wins.
//! Anything that looks like a tag but is not one of these (or is a closing
//! tag nobody opened) is ordinary text.

use crate::color::Color;
use crate::style::Style;

/// A recognized formatting tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkupTag {
    Bold,
    Underline,
    Highlight,
    Color(Color),
}

impl MarkupTag {
    /// Look up a tag by the name between the brackets.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "b" => Some(Self::Bold),
            "u" => Some(Self::Underline),
            "h" => Some(Self::Highlight),
            other => Color::from_name(other).map(Self::Color),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Underline => "u",
            Self::Highlight => "h",
            Self::Color(color) => color.name(),
        }
    }

    /// The closing form of this tag, e.g. `</b>`.
    #[must_use]
    pub fn closing(self) -> String {
        format!("</{}>", self.name())
    }

    fn apply(self, style: Style) -> Style {
        match self {
            Self::Bold => style.with_bold(),
            Self::Underline => style.with_underline(),
            Self::Highlight => style.with_standout(),
            Self::Color(color) => style.with_fg(color),
        }
    }
}

/// A run of text sharing one style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkupSpan<'a> {
    pub text: &'a str,
    pub style: Style,
}

fn current_style(open: &[MarkupTag]) -> Style {
    open.iter().fold(Style::NONE, |style, tag| tag.apply(style))
}

/// Split a formatted message into styled spans.
///
/// Returns the spans in order plus the tags still open at the end of the
/// message. Empty spans are omitted.
#[must_use]
pub fn parse_markup(msg: &str) -> (Vec<MarkupSpan<'_>>, Vec<MarkupTag>) {
    let mut spans = Vec::new();
    let mut open: Vec<MarkupTag> = Vec::new();
    let mut text_start = 0;
    let mut search = 0;

    while let Some(lt) = msg[search..].find('<').map(|i| i + search) {
        let Some(gt) = msg[lt..].find('>').map(|i| i + lt) else {
            break;
        };
        let inner = &msg[lt + 1..gt];

        let action = match inner.strip_prefix('/') {
            Some(name) => MarkupTag::from_name(name)
                .and_then(|tag| open.iter().rposition(|t| *t == tag))
                .map(Err),
            None => MarkupTag::from_name(inner).map(Ok),
        };
        let Some(action) = action else {
            search = lt + 1;
            continue;
        };

        if lt > text_start {
            spans.push(MarkupSpan {
                text: &msg[text_start..lt],
                style: current_style(&open),
            });
        }
        match action {
            Ok(tag) => open.push(tag),
            Err(index) => {
                open.remove(index);
            }
        }
        text_start = gt + 1;
        search = text_start;
    }

    if text_start < msg.len() {
        spans.push(MarkupSpan {
            text: &msg[text_start..],
            style: current_style(&open),
        });
    }
    (spans, open)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextAttributes;

    #[test]
    fn test_bold_then_plain() {
        let (spans, open) = parse_markup("<b>bold</b> plain");
        assert!(open.is_empty());
        assert_eq!(
            spans,
            vec![
                MarkupSpan { text: "bold", style: Style::bold() },
                MarkupSpan { text: " plain", style: Style::NONE },
            ]
        );
    }

    #[test]
    fn test_nested_attributes_combine() {
        let (spans, _) = parse_markup("<b><u>x</u></b>");
        assert_eq!(spans.len(), 1);
        assert!(
            spans[0]
                .style
                .attributes
                .contains(TextAttributes::BOLD | TextAttributes::UNDERLINE)
        );
    }

    #[test]
    fn test_inner_color_wins() {
        let (spans, _) = parse_markup("<blue>a<red>b</red>c</blue>");
        let colors: Vec<_> = spans.iter().map(|s| s.style.fg).collect();
        assert_eq!(colors, vec![Color::Blue, Color::Red, Color::Blue]);
    }

    #[test]
    fn test_unknown_tags_are_text() {
        let (spans, open) = parse_markup("a <x> b </b> c");
        assert!(open.is_empty());
        assert_eq!(spans, vec![MarkupSpan { text: "a <x> b </b> c", style: Style::NONE }]);
    }

    #[test]
    fn test_unclosed_tag_reported() {
        let (spans, open) = parse_markup("<b>bold");
        assert_eq!(spans.len(), 1);
        assert_eq!(open, vec![MarkupTag::Bold]);
        assert_eq!(open[0].closing(), "</b>");
    }

    #[test]
    fn test_stray_angle_bracket() {
        let (spans, _) = parse_markup("1 < 2 <h>yes</h>");
        assert_eq!(spans[0].text, "1 < 2 ");
        assert_eq!(spans[1].style, Style::standout());
    }
}
