//! Retained, double-buffered terminal surface.
//!
//! [`Surface`] is the single shared drawing target every panel renders
//! into. It keeps two buffers:
//! - **Back buffer**: the current picture; panels overwrite only their own
//!   region and everything else is retained between frames
//! - **Front buffer**: what the terminal is known to show (used for diffs)
//!
//! [`present`](Surface::present) writes only the cells that differ, then
//! records the back buffer as the new front. Unlike an immediate-mode
//! renderer the back buffer is *not* cleared afterwards, so a panel that
//! skipped its content draw still shows its last frame.
//!
//! # Examples
//!
//! ```
//! use setup_tui::renderer::Surface;
//! use setup_tui::Style;
//!
//! let mut surface = Surface::headless(40, 10);
//! surface.buffer_mut().draw_text(0, 0, "hello", Style::bold());
//! surface.present().unwrap();
//! assert_eq!(surface.stats().last_cells, 5);
//!
//! // Nothing changed: nothing written.
//! surface.present().unwrap();
//! assert_eq!(surface.stats().last_cells, 0);
//! ```

mod diff;

pub use diff::{BufferDiff, DirtyRegion};

use crate::ansi::{self, AnsiWriter, ColorMode};
use crate::buffer::{BoxStyle, ScreenBuffer};
use crate::cell::Cell;
use crate::style::Style;
use std::io::{self, Write};

/// Output statistics for the most recent presents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentStats {
    /// Presents that wrote at least one cell.
    pub frames: u64,
    /// Cells written by the most recent present.
    pub last_cells: usize,
    /// Whether the most recent present repainted the whole screen.
    pub last_full: bool,
}

/// The shared terminal surface.
pub struct Surface {
    back: ScreenBuffer,
    front: ScreenBuffer,
    writer: AnsiWriter<Box<dyn Write + Send>>,
    force_full: bool,
    cursor: Option<(u32, u32)>,
    cursor_shown: Option<bool>,
    sync_output: bool,
    ascii_lines: bool,
    stats: PresentStats,
}

impl Surface {
    /// Create a surface writing to `out`.
    #[must_use]
    pub fn new(width: u32, height: u32, out: Box<dyn Write + Send>, color_mode: ColorMode) -> Self {
        Self {
            back: ScreenBuffer::new(width, height),
            front: ScreenBuffer::new(width, height),
            writer: AnsiWriter::with_color_mode(out, color_mode),
            force_full: true,
            cursor: None,
            cursor_shown: None,
            sync_output: false,
            ascii_lines: false,
            stats: PresentStats::default(),
        }
    }

    /// Surface that renders into a sink, for tests and benchmarks.
    #[must_use]
    pub fn headless(width: u32, height: u32) -> Self {
        Self::new(width, height, Box::new(io::sink()), ColorMode::Ansi)
    }

    /// Wrap presents in synchronized-update sequences.
    pub fn set_sync_output(&mut self, enabled: bool) {
        self.sync_output = enabled;
    }

    /// Draw lines and boxes with plain ASCII instead of box drawing glyphs.
    pub fn set_ascii_lines(&mut self, ascii: bool) {
        self.ascii_lines = ascii;
    }

    /// Line glyphs for this terminal, drawn in `style`.
    #[must_use]
    pub fn box_style(&self, style: Style) -> BoxStyle {
        if self.ascii_lines {
            BoxStyle::ascii(style)
        } else {
            BoxStyle::single(style)
        }
    }

    /// Get dimensions as (width, height).
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.back.size()
    }

    /// The picture being composed.
    #[must_use]
    pub fn buffer(&self) -> &ScreenBuffer {
        &self.back
    }

    pub fn buffer_mut(&mut self) -> &mut ScreenBuffer {
        &mut self.back
    }

    /// What the terminal was last told to show.
    #[must_use]
    pub fn front_buffer(&self) -> &ScreenBuffer {
        &self.front
    }

    #[must_use]
    pub fn stats(&self) -> PresentStats {
        self.stats
    }

    /// Blank the picture and repaint everything on the next present.
    pub fn clear(&mut self) {
        self.back.clear();
        self.force_full = true;
    }

    /// Repaint everything on the next present without touching the picture.
    pub fn invalidate(&mut self) {
        self.force_full = true;
    }

    /// Resize both buffers; contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.back.resize(width, height);
        self.front.resize(width, height);
        self.force_full = true;
    }

    /// Show the hardware cursor at (row, col) after the next present.
    pub fn show_cursor_at(&mut self, row: u32, col: u32) {
        self.cursor = Some((row, col));
    }

    /// Hide the hardware cursor after the next present.
    pub fn hide_cursor(&mut self) {
        self.cursor = None;
    }

    /// Current cursor position when visible.
    #[must_use]
    pub fn cursor(&self) -> Option<(u32, u32)> {
        self.cursor
    }

    /// Ring the terminal bell immediately.
    pub fn bell(&mut self) -> io::Result<()> {
        self.writer.write_str(ansi::BELL);
        self.writer.flush()
    }

    /// Push changed cells and cursor state to the terminal.
    pub fn present(&mut self) -> io::Result<()> {
        let (width, height) = self.back.size();
        let total_cells = (width as usize).saturating_mul(height as usize);
        let diff = BufferDiff::compute(&self.front, &self.back);
        let full = self.force_full || diff.should_full_redraw(total_cells);

        let mut cells = 0;
        if full || !diff.is_empty() {
            if self.sync_output {
                self.writer.write_str(ansi::sync::BEGIN);
            }
            self.writer.reset_state();
            self.writer.write_str(ansi::CURSOR_HOME);

            if full {
                self.writer.write_str(ansi::RESET);
                self.writer.write_str(ansi::CLEAR_SCREEN);
                let blank = Cell::default();
                for y in 0..height {
                    for x in 0..width {
                        if let Some(cell) = self.back.get(x, y) {
                            if cell.is_continuation() || *cell == blank {
                                continue;
                            }
                            self.writer.write_cell_at(y, x, cell);
                            cells += 1;
                        }
                    }
                }
            } else {
                for region in &diff.dirty_regions {
                    for x in region.x..region.x + region.width {
                        if let Some(cell) = self.back.get(x, region.y) {
                            if cell.is_continuation() {
                                continue;
                            }
                            self.writer.write_cell_at(region.y, x, cell);
                            cells += 1;
                        }
                    }
                }
            }

            self.writer.reset();
            if self.sync_output {
                self.writer.write_str(ansi::sync::END);
            }
            self.stats.frames += 1;
        }

        match self.cursor {
            Some((row, col)) => {
                self.writer.place_cursor(row, col);
                if self.cursor_shown != Some(true) {
                    self.writer.write_str(ansi::CURSOR_SHOW);
                    self.cursor_shown = Some(true);
                }
            }
            None => {
                if self.cursor_shown != Some(false) {
                    self.writer.write_str(ansi::CURSOR_HIDE);
                    self.cursor_shown = Some(false);
                }
            }
        }

        self.writer.flush()?;
        self.front.copy_from(&self.back);
        self.force_full = false;
        self.stats.last_cells = cells;
        self.stats.last_full = full;
        Ok(())
    }
}
