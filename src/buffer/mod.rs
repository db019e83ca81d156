//! Cell-based screen buffer with clipping.
//!
//! [`ScreenBuffer`] is the drawing target behind the shared terminal
//! surface. Buffers are 2D grids of cells that support:
//!
//! - **Basic drawing**: set individual cells, draw text, lines and boxes
//! - **Scissor clipping**: restrict drawing to a panel's rectangle
//!
//! # Examples
//!
//! ```
//! use setup_tui::buffer::{ClipRect, ScreenBuffer};
//! use setup_tui::{Color, Style};
//!
//! let mut buf = ScreenBuffer::new(40, 10);
//! buf.draw_text(2, 1, "Hello!", Style::fg(Color::Green));
//!
//! buf.push_scissor(ClipRect::new(0, 0, 4, 10));
//! buf.draw_text(0, 2, "clipped", Style::NONE);
//! buf.pop_scissor();
//!
//! assert_eq!(buf.row_text(2).trim_end(), "clip");
//! ```

mod drawing;
mod scissor;

pub use drawing::BoxStyle;
pub use scissor::{ClipRect, ScissorStack};

use crate::cell::Cell;
use crate::style::Style;

/// Grid of cells addressed by (x, y), (0, 0) being the top-left corner.
///
/// All drawing operations respect the current scissor stack; anything
/// outside it (or outside the buffer) is silently dropped.
#[derive(Clone, Debug)]
pub struct ScreenBuffer {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    scissor_stack: ScissorStack,
}

impl ScreenBuffer {
    /// Create a blank buffer.
    ///
    /// Zero dimensions are allowed and produce an empty grid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
            scissor_stack: ScissorStack::new(),
        }
    }

    /// Get buffer dimensions as (width, height).
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Full-buffer rectangle.
    #[must_use]
    pub fn bounds(&self) -> ClipRect {
        ClipRect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn cell_index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let row_offset = (y as usize).checked_mul(self.width as usize)?;
        let idx = row_offset.checked_add(x as usize)?;
        (idx < self.cells.len()).then_some(idx)
    }

    /// Get cell at position.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<&Cell> {
        self.cell_index(x, y).map(|idx| &self.cells[idx])
    }

    /// Check whether (x, y) is inside the buffer and the current scissor.
    #[must_use]
    pub fn is_visible(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.scissor_stack.contains(x, y)
    }

    /// Set cell at position, respecting the scissor.
    pub fn set(&mut self, x: u32, y: u32, cell: Cell) {
        if !self.is_visible(x, y) {
            return;
        }
        if let Some(idx) = self.cell_index(x, y) {
            self.cells[idx] = cell;
        }
    }

    /// Blank every cell, ignoring the scissor.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Fill a rectangle with blank cells of the given style.
    pub fn fill_rect(&mut self, rect: ClipRect, style: Style) {
        let Some(area) = rect
            .intersect(&self.bounds())
            .and_then(|r| r.intersect(&self.scissor_stack.current()))
        else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if let Some(idx) = self.cell_index(x, y) {
                    self.cells[idx] = Cell::blank(style);
                }
            }
        }
    }

    /// Draw text at position; returns the column after the last cell written.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, style: Style) -> u32 {
        drawing::draw_text(self, x, y, text, style)
    }

    /// Draw a box border.
    pub fn draw_box(&mut self, rect: ClipRect, box_style: &BoxStyle) {
        drawing::draw_box(self, rect, box_style);
    }

    /// Draw a horizontal run of `ch`.
    pub fn draw_hline(&mut self, x: u32, y: u32, len: u32, ch: char, style: Style) {
        drawing::draw_hline(self, x, y, len, ch, style);
    }

    /// Draw a vertical run of `ch`.
    pub fn draw_vline(&mut self, x: u32, y: u32, len: u32, ch: char, style: Style) {
        drawing::draw_vline(self, x, y, len, ch, style);
    }

    /// Push a clipping rectangle.
    pub fn push_scissor(&mut self, rect: ClipRect) {
        self.scissor_stack.push(rect);
    }

    /// Pop the most recent clipping rectangle.
    pub fn pop_scissor(&mut self) {
        self.scissor_stack.pop();
    }

    /// Current effective clipping rectangle.
    #[must_use]
    pub fn scissor(&self) -> ClipRect {
        self.scissor_stack.current()
    }

    /// Resize buffer, clearing contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let size = (width as usize).saturating_mul(height as usize);
        self.cells = vec![Cell::default(); size];
        self.scissor_stack.clear();
    }

    /// Copy every cell (and the size) from `other`, keeping this buffer's
    /// allocation where possible.
    pub fn copy_from(&mut self, other: &Self) {
        self.width = other.width;
        self.height = other.height;
        self.cells.clone_from(&other.cells);
    }

    /// Get raw cell slice.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Text of one row, blanks rendered as spaces.
    #[must_use]
    pub fn row_text(&self, y: u32) -> String {
        let mut out = String::with_capacity(self.width as usize);
        for x in 0..self.width {
            if let Some(cell) = self.get(x, y) {
                cell.content.push_to(&mut out);
            }
        }
        out
    }
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new(80, 24)
    }
}
