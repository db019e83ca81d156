//! Text helpers for fitting messages into panel widths.
//!
//! Widths are terminal columns, not bytes or chars: every helper measures
//! grapheme clusters with `unicode-width`, so wide glyphs are never split.
//!
//! # Examples
//!
//! ```
//! use setup_tui::text::{Ending, crop_str, split_str};
//!
//! assert_eq!(split_str("the quick brown fox", 10), vec!["the quick", "brown fox"]);
//!
//! let (line, rest) = crop_str("the quick brown fox", 12, Ending::Ellipsis);
//! assert_eq!(line, "the quick...");
//! assert_eq!(rest, "brown fox");
//! ```

mod markup;
mod scroll;

pub use markup::{MarkupSpan, MarkupTag, parse_markup};
pub use scroll::{is_scroll_key, is_selection_key, scroll_position};

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width of `s` in terminal columns.
#[must_use]
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Display width of `s` as a cell count for drawing coordinates.
#[must_use]
pub fn display_cols(s: &str) -> u32 {
    u32::try_from(display_width(s)).unwrap_or(u32::MAX)
}

/// How a cropped line signals that it was cut short.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ending {
    /// `...`, for the last line of an entry.
    #[default]
    Ellipsis,
    /// `-`, for a line that continues below.
    Hyphen,
}

impl Ending {
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Ellipsis => "...",
            Self::Hyphen => "-",
        }
    }
}

/// Byte offset of the longest prefix of `s` that fits in `width` columns.
fn fit_prefix(s: &str, width: usize) -> usize {
    let mut used = 0;
    for (idx, grapheme) in s.grapheme_indices(true) {
        let w = grapheme.width();
        if used + w > width {
            return idx;
        }
        used += w;
    }
    s.len()
}

/// Word-wrap `msg` into lines of at most `width` columns.
///
/// Words wider than a line are broken across lines. Whitespace runs collapse
/// to a single space.
#[must_use]
pub fn split_str(msg: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }

    let mut line = String::new();
    let mut line_width = 0;
    for word in msg.split_whitespace() {
        let mut word = word;
        let mut word_width = display_width(word);
        let sep = usize::from(!line.is_empty());

        if line_width + sep + word_width <= width {
            if sep == 1 {
                line.push(' ');
            }
            line.push_str(word);
            line_width += sep + word_width;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }
        while word_width > width {
            // Always take at least one grapheme so a glyph wider than the
            // line cannot stall the loop.
            let first = word.grapheme_indices(true).nth(1).map_or(word.len(), |(i, _)| i);
            let cut = fit_prefix(word, width).max(first);
            lines.push(word[..cut].to_string());
            word = &word[cut..];
            word_width = display_width(word);
        }
        line.push_str(word);
        line_width = word_width;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Crop `msg` to `width` columns, marking the cut with `ending`.
///
/// Returns the displayed line and the remainder that did not fit (empty if
/// nothing was cut). Cuts land on a word boundary where one exists; a
/// hyphen is only added when a word has to be broken.
#[must_use]
pub fn crop_str(msg: &str, width: usize, ending: Ending) -> (String, &str) {
    if display_width(msg) <= width {
        return (msg.to_string(), "");
    }

    let marker = ending.marker();
    let marker_width = display_width(marker);
    if width <= marker_width {
        let cut = fit_prefix(msg, width);
        return (msg[..cut].to_string(), msg[cut..].trim_start());
    }

    let (budget, needs_marker_on_word_cut) = match ending {
        Ending::Ellipsis => (width - marker_width, true),
        Ending::Hyphen => (width, false),
    };
    // Include the first character past the budget: a space there is a
    // clean word boundary.
    let fit = fit_prefix(msg, budget);
    let next_end = msg[fit..].chars().next().map_or(fit, |c| fit + c.len_utf8());
    let boundary = msg[..next_end]
        .rfind(char::is_whitespace)
        .filter(|&b| !msg[..b].trim_end().is_empty());

    match boundary {
        Some(b) => {
            let mut line = msg[..b].trim_end().to_string();
            if needs_marker_on_word_cut {
                line.push_str(marker);
            }
            (line, msg[b..].trim_start())
        }
        None => {
            let cut = fit_prefix(msg, width - marker_width);
            let mut line = msg[..cut].to_string();
            line.push_str(marker);
            (line, msg[cut..].trim_start())
        }
    }
}

/// Pad `msg` with spaces (or crop it) to exactly `width` columns.
#[must_use]
pub fn pad_str(msg: &str, width: usize) -> String {
    let cut = fit_prefix(msg, width);
    let mut out = msg[..cut].to_string();
    let used = display_width(&out);
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}

/// Drop control characters so a message cannot move the cursor or switch
/// terminal modes.
#[must_use]
pub fn printable(msg: &str) -> String {
    msg.chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_str_wraps_on_words() {
        assert_eq!(
            split_str("one two three four", 9),
            vec!["one two", "three", "four"]
        );
        assert!(split_str("", 10).is_empty());
        assert!(split_str("words", 0).is_empty());
    }

    #[test]
    fn test_split_str_breaks_long_words() {
        assert_eq!(split_str("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(split_str("ab 中文字", 4), vec!["ab", "中文", "字"]);
    }

    #[test]
    fn test_crop_str_fits_unchanged() {
        assert_eq!(crop_str("short", 10, Ending::Ellipsis), ("short".to_string(), ""));
    }

    #[test]
    fn test_crop_str_hyphen_breaks_words() {
        let (line, rest) = crop_str("abcdefghij", 5, Ending::Hyphen);
        assert_eq!(line, "abcd-");
        assert_eq!(rest, "efghij");

        let (line, rest) = crop_str("abc defghij", 6, Ending::Hyphen);
        assert_eq!(line, "abc");
        assert_eq!(rest, "defghij");
    }

    #[test]
    fn test_crop_str_ellipsis() {
        let (line, rest) = crop_str("abcdefghij", 6, Ending::Ellipsis);
        assert_eq!(line, "abc...");
        assert_eq!(rest, "defghij");
        assert!(display_width(&line) <= 6);
    }

    #[test]
    fn test_pad_str() {
        assert_eq!(pad_str("ab", 4), "ab  ");
        assert_eq!(pad_str("abcdef", 4), "abcd");
    }

    #[test]
    fn test_printable_strips_controls() {
        assert_eq!(printable("ok\x1b[2J\tdone\n"), "ok[2Jdone");
    }
}
