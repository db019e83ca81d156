//! Clipped drawing primitives for one panel's subregion.
//!
//! A [`Canvas`] is only handed out by [`Panel::redraw`](super::Panel::redraw)
//! while the Surface Lock is held. Coordinates are `(y, x)` relative to the
//! panel's top-left corner. Anything outside the subregion is dropped
//! silently: a panel whose geometry shrank between layout and drawing is a
//! normal race, not an error.

use crate::buffer::ClipRect;
use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::renderer::Surface;
use crate::style::Style;
use crate::text::{display_cols, parse_markup};

/// Geometry of a scroll bar, see [`Canvas::add_scroll_bar`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollBar {
    /// Index of the top-most visible element.
    pub top: usize,
    /// Index one past the bottom-most visible element.
    pub bottom: usize,
    /// Number of elements in the listing.
    pub size: usize,
    /// First row of the bar.
    pub draw_top: u32,
    /// Last row of the bar; `None` spans to the panel's bottom.
    pub draw_bottom: Option<u32>,
    /// Column of the bar.
    pub draw_left: u32,
    /// Draw the squared-off border right of the bar.
    pub draw_box: bool,
}

impl ScrollBar {
    #[must_use]
    pub fn new(top: usize, bottom: usize, size: usize) -> Self {
        Self {
            top,
            bottom,
            size,
            draw_top: 0,
            draw_bottom: None,
            draw_left: 0,
            draw_box: true,
        }
    }

    #[must_use]
    pub fn draw_top(mut self, row: u32) -> Self {
        self.draw_top = row;
        self
    }

    #[must_use]
    pub fn draw_bottom(mut self, row: u32) -> Self {
        self.draw_bottom = Some(row);
        self
    }

    #[must_use]
    pub fn draw_left(mut self, col: u32) -> Self {
        self.draw_left = col;
        self
    }

    #[must_use]
    pub fn without_box(mut self) -> Self {
        self.draw_box = false;
        self
    }
}

/// Drawing access to one panel's subregion of the shared surface.
pub struct Canvas<'a> {
    surface: &'a mut Surface,
    region: ClipRect,
}

impl<'a> Canvas<'a> {
    /// Clip all drawing on `surface` to `region` until the canvas drops.
    pub fn new(surface: &'a mut Surface, region: ClipRect) -> Self {
        surface.buffer_mut().push_scissor(region);
        Self { surface, region }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.region.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.region.height
    }

    /// The subregion in surface coordinates.
    #[must_use]
    pub fn region(&self) -> ClipRect {
        self.region
    }

    fn inside(&self, y: u32, x: u32) -> bool {
        y < self.region.height && x < self.region.width
    }

    /// Blank the whole subregion.
    pub fn erase(&mut self) {
        self.surface.buffer_mut().fill_rect(self.region, Style::NONE);
    }

    /// Blank `len` cells of one row in `style`.
    pub fn fill(&mut self, y: u32, x: u32, len: u32, style: Style) {
        if !self.inside(y, x) {
            return;
        }
        let len = len.min(self.region.width - x);
        let rect = ClipRect::new(self.region.x + x, self.region.y + y, len, 1);
        self.surface.buffer_mut().fill_rect(rect, style);
    }

    /// Draw a single character.
    pub fn addch(&mut self, y: u32, x: u32, ch: char, style: Style) {
        if self.inside(y, x) {
            self.surface
                .buffer_mut()
                .set(self.region.x + x, self.region.y + y, Cell::new(ch, style));
        }
    }

    /// Draw `msg`, cropped to the space left on the row.
    ///
    /// Returns the column after the text (`x` if nothing was drawn).
    pub fn addstr(&mut self, y: u32, x: u32, msg: &str, style: Style) -> u32 {
        if !self.inside(y, x) {
            return x;
        }
        let end = self
            .surface
            .buffer_mut()
            .draw_text(self.region.x + x, self.region.y + y, msg, style);
        end.saturating_sub(self.region.x)
    }

    /// Draw a horizontal line of `len` cells.
    pub fn hline(&mut self, y: u32, x: u32, len: u32, style: Style) {
        if !self.inside(y, x) {
            return;
        }
        let ch = self.surface.box_style(style).horizontal;
        let len = len.min(self.region.width - x);
        self.surface
            .buffer_mut()
            .draw_hline(self.region.x + x, self.region.y + y, len, ch, style);
    }

    /// Draw a vertical line of `len` cells.
    pub fn vline(&mut self, y: u32, x: u32, len: u32, style: Style) {
        if !self.inside(y, x) {
            return;
        }
        let ch = self.surface.box_style(style).vertical;
        let len = len.min(self.region.height - y);
        self.surface
            .buffer_mut()
            .draw_vline(self.region.x + x, self.region.y + y, len, ch, style);
    }

    /// Draw a box border with its top-left corner at `(y, x)`.
    pub fn draw_box(&mut self, y: u32, x: u32, height: u32, width: u32, style: Style) {
        if !self.inside(y, x) {
            return;
        }
        let rect = ClipRect::new(self.region.x + x, self.region.y + y, width, height);
        let box_style = self.surface.box_style(style);
        self.surface.buffer_mut().draw_box(rect, &box_style);
    }

    /// Draw text with inline formatting tags (see [`crate::text::parse_markup`]).
    ///
    /// Returns the column after the text.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] if the whole message was drawn and tags are still
    /// open. A message cut short by the panel edge is never an error, since
    /// its closing tags may simply be out of view.
    pub fn addfstr(&mut self, y: u32, x: u32, msg: &str) -> Result<u32> {
        if y >= self.region.height {
            return Ok(x);
        }
        let (spans, unclosed) = parse_markup(msg);

        let mut col = x;
        let mut truncated = false;
        for span in &spans {
            if col >= self.region.width {
                truncated = true;
                break;
            }
            let end = self.addstr(y, col, span.text, span.style);
            let wanted = col.saturating_add(display_cols(span.text));
            if end < wanted {
                truncated = true;
                break;
            }
            col = end;
        }

        if !truncated && !unclosed.is_empty() {
            return Err(Error::Format {
                unclosed: unclosed.iter().map(|tag| tag.closing()).collect(),
                message: msg.to_string(),
            });
        }
        Ok(col)
    }

    /// Draw a left-justified scroll bar for a vertical listing.
    ///
    /// The bar is squared off at the bottom:
    ///
    /// ```text
    ///  |
    /// *|
    /// *|
    ///  |
    /// -+
    /// ```
    ///
    /// Nothing is drawn when fewer than two rows are available.
    pub fn add_scroll_bar(&mut self, bar: ScrollBar) {
        let max_y = i64::from(self.region.height);
        let draw_top = i64::from(bar.draw_top);
        if max_y - draw_top < 2 || bar.size == 0 {
            return;
        }

        let draw_bottom = bar
            .draw_bottom
            .map_or(max_y - 1, |b| i64::from(b).min(max_y - 1));
        let bar_height = draw_bottom - draw_top;
        let (top, bottom, size) = (bar.top as i64, bar.bottom as i64, bar.size as i64);

        let mut slider_top = bar_height * top / size;
        let slider_size = bar_height * (bottom - top) / size;

        // The slider only touches an end when the view really is there.
        if top > 0 {
            slider_top = slider_top.max(1);
        }
        if bottom != size {
            slider_top = slider_top.min(bar_height - slider_size - 2);
        }
        if bottom == size {
            slider_top = bar_height - slider_size - 1;
        }

        for i in 0..bar_height {
            let style = if i >= slider_top && i <= slider_top + slider_size {
                Style::standout()
            } else {
                Style::NONE
            };
            let row = u32::try_from(i + draw_top).unwrap_or(u32::MAX);
            self.addstr(row, bar.draw_left, " ", style);
        }

        if bar.draw_box {
            let bottom_row = u32::try_from(draw_bottom).unwrap_or(u32::MAX);
            let corner = self.surface.box_style(Style::NONE).bottom_right;
            self.vline(
                bar.draw_top,
                bar.draw_left + 1,
                u32::try_from(draw_bottom - 1).unwrap_or(0),
                Style::NONE,
            );
            self.addch(bottom_row, bar.draw_left + 1, corner, Style::NONE);
            self.hline(bottom_row, bar.draw_left, 1, Style::NONE);
        }
    }

    /// Place the visible cursor at `(y, x)` within the panel.
    pub fn show_cursor(&mut self, y: u32, x: u32) {
        if self.inside(y, x) {
            self.surface
                .show_cursor_at(self.region.y + y, self.region.x + x);
        }
    }

    /// The underlying surface, for modal input that draws outside `draw`.
    pub fn surface(&mut self) -> &mut Surface {
        self.surface
    }
}

impl Drop for Canvas<'_> {
    fn drop(&mut self) {
        self.surface.buffer_mut().pop_scissor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextAttributes;

    fn with_canvas<R>(region: ClipRect, f: impl FnOnce(&mut Canvas<'_>) -> R) -> (Surface, R) {
        let mut surface = Surface::headless(20, 10);
        let result = {
            let mut canvas = Canvas::new(&mut surface, region);
            f(&mut canvas)
        };
        (surface, result)
    }

    #[test]
    fn test_addstr_clips_to_region() {
        let (surface, end) = with_canvas(ClipRect::new(2, 1, 5, 3), |c| {
            c.addstr(0, 1, "abcdefgh", Style::NONE)
        });
        assert_eq!(end, 5);
        assert_eq!(surface.buffer().row_text(1).trim_end(), "   abcd");
        assert_eq!(surface.buffer().scissor(), ClipRect::default());
    }

    #[test]
    fn test_out_of_bounds_is_noop() {
        let (surface, end) = with_canvas(ClipRect::new(0, 0, 5, 2), |c| {
            c.addch(5, 0, 'x', Style::NONE);
            c.hline(0, 9, 3, Style::NONE);
            c.addstr(2, 0, "never", Style::NONE)
        });
        assert_eq!(end, 0);
        assert!(surface.buffer().row_text(0).trim().is_empty());
    }

    #[test]
    fn test_addfstr_styles_spans() {
        let (surface, result) = with_canvas(ClipRect::new(0, 0, 20, 1), |c| {
            c.addfstr(0, 0, "<b>bold</b> plain")
        });
        assert_eq!(result.unwrap(), 10);
        let buffer = surface.buffer();
        assert!(buffer.get(0, 0).unwrap().attributes.contains(TextAttributes::BOLD));
        assert!(buffer.get(5, 0).unwrap().attributes.is_empty());
        assert_eq!(buffer.row_text(0).trim_end(), "bold plain");
    }

    #[test]
    fn test_addfstr_unclosed_tag_errors() {
        let (_, result) = with_canvas(ClipRect::new(0, 0, 20, 1), |c| c.addfstr(0, 0, "<b>bold"));
        assert!(matches!(result, Err(Error::Format { ref unclosed, .. }) if unclosed == &["</b>"]));
    }

    #[test]
    fn test_addfstr_truncated_unclosed_is_fine() {
        let (_, result) = with_canvas(ClipRect::new(0, 0, 3, 1), |c| c.addfstr(0, 0, "<b>bold"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_scroll_bar_at_top() {
        let (surface, ()) = with_canvas(ClipRect::new(0, 0, 10, 6), |c| {
            c.add_scroll_bar(ScrollBar::new(0, 2, 10));
        });
        let buffer = surface.buffer();
        // bar height 5, slider rows 0..=1
        assert!(buffer.get(0, 0).unwrap().attributes.contains(TextAttributes::INVERSE));
        assert!(buffer.get(0, 1).unwrap().attributes.contains(TextAttributes::INVERSE));
        assert!(!buffer.get(0, 2).unwrap().attributes.contains(TextAttributes::INVERSE));
        assert_eq!(buffer.get(1, 5).unwrap().content.as_char(), Some('\u{2518}'));
        assert_eq!(buffer.get(0, 5).unwrap().content.as_char(), Some('\u{2500}'));
        assert_eq!(buffer.get(1, 0).unwrap().content.as_char(), Some('\u{2502}'));
    }

    #[test]
    fn test_scroll_bar_needs_two_rows() {
        let (surface, ()) = with_canvas(ClipRect::new(0, 0, 10, 1), |c| {
            c.add_scroll_bar(ScrollBar::new(0, 1, 10));
        });
        assert!(surface.buffer().row_text(0).trim().is_empty());
    }
}
