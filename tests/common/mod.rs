//! Shared helpers for integration tests: output capture, screen decoding
//! and scripted input.

#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry
#![allow(dead_code)] // Not every test binary uses every helper

use setup_tui::ColorMode;
use setup_tui::context::UiContext;
use setup_tui::input::{KeyEvent, ScriptedInput};
use setup_tui::renderer::Surface;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A writer whose bytes can be inspected after the surface wrote them.
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    /// Everything written since the last take.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A context whose presents are captured.
pub fn capture_context(width: u32, height: u32) -> (UiContext, SharedOutput) {
    let out = SharedOutput::new();
    let surface = Surface::new(width, height, Box::new(out.clone()), ColorMode::Ansi);
    (UiContext::new(surface), out)
}

/// Decode terminal output into a screen.
pub struct Screen {
    parser: vt100::Parser,
    width: u16,
}

impl Screen {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width as u16, height as u16);
        Self {
            parser: vt100::Parser::new(height, width, 0),
            width,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> &mut Self {
        self.parser.process(bytes);
        self
    }

    /// Row text with trailing blanks removed.
    pub fn row(&self, row: u16) -> String {
        self.parser
            .screen()
            .rows(0, self.width)
            .nth(row as usize)
            .unwrap_or_default()
            .trim_end()
            .to_string()
    }

    pub fn cell(&self, row: u16, col: u16) -> vt100::Cell {
        self.parser.screen().cell(row, col).cloned().expect("cell in range")
    }

    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }
}

/// Script that types `text`, one key per character.
pub fn typed(text: &str) -> ScriptedInput {
    let mut script = ScriptedInput::new();
    script.type_str(text);
    script
}

/// Script of the given keys.
pub fn keys(keys: impl IntoIterator<Item = KeyEvent>) -> ScriptedInput {
    ScriptedInput::keys(keys)
}
