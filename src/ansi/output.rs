//! The byte stream one present produces.
//!
//! [`AnsiWriter`] remembers the pen (colors, attributes, cursor) it last
//! emitted and only writes what changes between neighbouring cells.

use crate::ansi::{self, ColorMode};
use crate::cell::{Cell, CellContent};
use crate::color::Color;
use crate::style::TextAttributes;
use std::io::{self, Write};

/// Collects one frame of output, then hands it to the terminal in a single write.
pub struct AnsiWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,

    color_mode: ColorMode,

    // None until first emitted, or after a reset
    current_fg: Option<Color>,
    current_bg: Option<Color>,
    current_attrs: TextAttributes,

    cursor_row: u32,
    cursor_col: u32,
}

impl<W: Write> AnsiWriter<W> {
    /// Writer with colors enabled.
    pub fn new(writer: W) -> Self {
        Self::with_color_mode(writer, ColorMode::Ansi)
    }

    pub fn with_color_mode(writer: W, color_mode: ColorMode) -> Self {
        Self {
            writer,
            buffer: Vec::with_capacity(8192),
            color_mode,
            current_fg: None,
            current_bg: None,
            current_attrs: TextAttributes::empty(),
            cursor_row: 0,
            cursor_col: 0,
        }
    }

    #[must_use]
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Forget the pen. Called after a full clear, when the terminal state is unknown.
    pub fn reset_state(&mut self) {
        self.current_fg = None;
        self.current_bg = None;
        self.current_attrs = TextAttributes::empty();
        self.cursor_row = 0;
        self.cursor_col = 0;
    }

    /// Append `s` verbatim.
    pub fn write_str(&mut self, s: &str) {
        self.buffer.extend_from_slice(s.as_bytes());
    }

    /// Go to `(row, col)` by whichever of CUP or relative moves is shorter.
    pub fn move_cursor(&mut self, row: u32, col: u32) {
        if row == self.cursor_row && col == self.cursor_col {
            return;
        }

        let dy = row as i32 - self.cursor_row as i32;
        let dx = col as i32 - self.cursor_col as i32;

        let abs_cost = 4 + digits(row + 1) + digits(col + 1);
        let rel_cost = if dy == 0 {
            0
        } else {
            3 + digits(dy.unsigned_abs())
        } + if dx == 0 {
            0
        } else {
            3 + digits(dx.unsigned_abs())
        };

        if rel_cost < abs_cost {
            let _ = ansi::write_cursor_move(&mut self.buffer, dx, dy);
        } else {
            let _ = ansi::write_cursor_position(&mut self.buffer, row, col);
        }

        self.cursor_row = row;
        self.cursor_col = col;
    }

    /// Absolute CUP, ignoring the tracked position.
    ///
    /// Rows start this way after the right margin, where a pending wrap
    /// makes the tracked column unreliable.
    pub fn place_cursor(&mut self, row: u32, col: u32) {
        let _ = ansi::write_cursor_position(&mut self.buffer, row, col);
        self.cursor_row = row;
        self.cursor_col = col;
    }

    pub fn set_fg(&mut self, color: Color) {
        if self.current_fg != Some(color) {
            let _ = ansi::write_fg_color(&mut self.buffer, color, self.color_mode);
            self.current_fg = Some(color);
        }
    }

    pub fn set_bg(&mut self, color: Color) {
        if self.current_bg != Some(color) {
            let _ = ansi::write_bg_color(&mut self.buffer, color, self.color_mode);
            self.current_bg = Some(color);
        }
    }

    /// SGR has no per-attribute off switch here, so dropping any flag goes
    /// through RESET and the colors are written again afterwards.
    pub fn set_attributes(&mut self, attrs: TextAttributes) {
        if self.current_attrs == attrs {
            return;
        }

        if !(self.current_attrs - attrs).is_empty() {
            self.write_str(ansi::RESET);
            self.current_fg = None;
            self.current_bg = None;
            self.current_attrs = TextAttributes::empty();
        }

        let to_add = attrs - self.current_attrs;
        if !to_add.is_empty() {
            let _ = ansi::write_attributes(&mut self.buffer, to_add);
        }
        self.current_attrs = attrs;
    }

    /// Cell at the cursor; advances by the cell's display width.
    pub fn write_cell(&mut self, cell: &Cell) {
        self.set_attributes(cell.attributes);
        self.set_fg(cell.fg);
        self.set_bg(cell.bg);

        match &cell.content {
            CellContent::Char(c) => {
                let mut buf = [0u8; 4];
                let s = c.encode_utf8(&mut buf);
                self.buffer.extend_from_slice(s.as_bytes());
            }
            CellContent::Cluster(s, _) => self.buffer.extend_from_slice(s.as_bytes()),
            CellContent::Empty => self.buffer.push(b' '),
            CellContent::Continuation => {}
        }

        self.cursor_col += cell.display_width() as u32;
    }

    pub fn write_cell_at(&mut self, row: u32, col: u32, cell: &Cell) {
        self.move_cursor(row, col);
        self.write_cell(cell);
    }

    /// Emit RESET and forget colors and attributes.
    pub fn reset(&mut self) {
        self.write_str(ansi::RESET);
        self.current_fg = None;
        self.current_bg = None;
        self.current_attrs = TextAttributes::empty();
    }

    /// Hand the frame to the terminal and empty the buffer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.write_all(&self.buffer)?;
        self.buffer.clear();
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Bytes not yet flushed.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

fn digits(n: u32) -> usize {
    if n == 0 { 1 } else { (n.ilog10() + 1) as usize }
}
