//! The terminal session the wizard runs in.

mod capabilities;
mod raw;

pub use capabilities::{Capabilities, ColorSupport};
pub use raw::{
    RawModeGuard, enable_raw_mode, is_tty, poll_readable, read_available, take_resize,
    terminal_size, watch_resize,
};

use crate::ansi::sequences;
use std::io::{self, Write};

/// Raw mode plus the alternate screen, for as long as the value lives.
///
/// Dropping it restores the shell's screen and cooked mode, which also
/// covers a panic unwinding out of the event loop.
pub struct Terminal<W: Write> {
    writer: W,
    alt_screen: bool,
    cursor_hidden: bool,
    raw_mode_guard: Option<RawModeGuard>,
}

impl<W: Write> Terminal<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            alt_screen: false,
            cursor_hidden: false,
            raw_mode_guard: None,
        }
    }

    #[must_use]
    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode_guard.is_some()
    }

    /// Take over the screen: raw stdin, alternate screen, hidden cursor.
    pub fn start(&mut self) -> io::Result<()> {
        if self.raw_mode_guard.is_none() {
            self.raw_mode_guard = Some(enable_raw_mode()?);
        }
        self.show_alt_screen()
    }

    fn show_alt_screen(&mut self) -> io::Result<()> {
        if !self.alt_screen {
            self.writer.write_all(sequences::ALT_SCREEN_ON.as_bytes())?;
            self.alt_screen = true;
        }
        if !self.cursor_hidden {
            self.writer.write_all(sequences::CURSOR_HIDE.as_bytes())?;
            self.cursor_hidden = true;
        }
        self.writer.flush()
    }

    /// Give the screen back. Safe to call more than once.
    pub fn restore(&mut self) -> io::Result<()> {
        self.writer.write_all(sequences::RESET.as_bytes())?;
        if self.cursor_hidden {
            self.writer.write_all(sequences::CURSOR_SHOW.as_bytes())?;
            self.cursor_hidden = false;
        }
        if self.alt_screen {
            self.writer.write_all(sequences::ALT_SCREEN_OFF.as_bytes())?;
            self.alt_screen = false;
        }
        self.raw_mode_guard = None;
        self.writer.flush()
    }
}

impl<W: Write> Drop for Terminal<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
