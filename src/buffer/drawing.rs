//! Primitives the panels draw with: clipped text runs, rules and boxes.

use crate::buffer::{ClipRect, ScreenBuffer};
use crate::cell::{Cell, CellContent};
use crate::style::Style;
use unicode_segmentation::UnicodeSegmentation;

/// Glyphs and style for a panel frame.
#[derive(Clone, Debug)]
pub struct BoxStyle {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
    pub style: Style,
}

impl BoxStyle {
    /// `┌─┐│└┘`
    #[must_use]
    pub fn single(style: Style) -> Self {
        Self {
            top_left: '\u{250c}',
            top_right: '\u{2510}',
            bottom_left: '\u{2514}',
            bottom_right: '\u{2518}',
            horizontal: '\u{2500}',
            vertical: '\u{2502}',
            style,
        }
    }

    /// Plain ASCII box for terminals without line drawing glyphs.
    #[must_use]
    pub fn ascii(style: Style) -> Self {
        Self {
            top_left: '+',
            top_right: '+',
            bottom_left: '+',
            bottom_right: '+',
            horizontal: '-',
            vertical: '|',
            style,
        }
    }
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self::single(Style::NONE)
    }
}

/// Lay out `text` from `(x, y)` one grapheme per cell, two for wide ones.
///
/// Newlines are skipped. A wide character that would straddle the right edge
/// of the clip is not drawn. Returns the column after the last cell written.
pub fn draw_text(buffer: &mut ScreenBuffer, x: u32, y: u32, text: &str, style: Style) -> u32 {
    let mut col = x;
    let right = buffer.scissor().right().min(buffer.width());

    // log and output lines are nearly always ASCII
    if text.is_ascii() {
        for &byte in text.as_bytes() {
            if byte == b'\n' || byte == b'\r' {
                continue;
            }
            if col >= right {
                break;
            }
            buffer.set(col, y, Cell::new(byte as char, style));
            col += 1;
        }
        return col;
    }

    for grapheme in text.graphemes(true) {
        if grapheme == "\n" || grapheme == "\r" || grapheme == "\r\n" {
            continue;
        }

        let cell = Cell::from_grapheme(grapheme, style);
        let width = cell.display_width() as u32;
        if col.saturating_add(width) > right {
            break;
        }

        buffer.set(col, y, cell);
        for i in 1..width {
            buffer.set(col + i, y, Cell::continuation(style));
        }
        col += width;
    }
    col
}

/// Frame the edge cells of `rect`; rects narrower or shorter than two cells are skipped.
pub fn draw_box(buffer: &mut ScreenBuffer, rect: ClipRect, box_style: &BoxStyle) {
    let ClipRect {
        x,
        y,
        width: w,
        height: h,
    } = rect;
    if w < 2 || h < 2 {
        return;
    }

    let style = box_style.style;
    let right = x + w - 1;
    let bottom = y + h - 1;

    buffer.set(x, y, Cell::new(box_style.top_left, style));
    buffer.set(right, y, Cell::new(box_style.top_right, style));
    buffer.set(x, bottom, Cell::new(box_style.bottom_left, style));
    buffer.set(right, bottom, Cell::new(box_style.bottom_right, style));

    for col in (x + 1)..right {
        buffer.set(col, y, Cell::new(box_style.horizontal, style));
        buffer.set(col, bottom, Cell::new(box_style.horizontal, style));
    }

    for row in (y + 1)..bottom {
        buffer.set(x, row, Cell::new(box_style.vertical, style));
        buffer.set(right, row, Cell::new(box_style.vertical, style));
    }
}

pub fn draw_hline(buffer: &mut ScreenBuffer, x: u32, y: u32, len: u32, ch: char, style: Style) {
    for col in x..x.saturating_add(len) {
        buffer.set(col, y, Cell::new(ch, style));
    }
}

pub fn draw_vline(buffer: &mut ScreenBuffer, x: u32, y: u32, len: u32, ch: char, style: Style) {
    for row in y..y.saturating_add(len) {
        buffer.set(x, row, Cell::new(ch, style));
    }
}

/// True when a drawn cell holds printable content rather than a blank.
#[must_use]
pub fn is_ink(cell: &Cell) -> bool {
    !matches!(cell.content, CellContent::Empty | CellContent::Continuation)
}
