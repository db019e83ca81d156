//! Keyboard input: key types, the byte-level parser, and event sources.
//!
//! The UI thread reads events through an [`InputSource`]. [`StdinInput`]
//! decodes the raw terminal; [`ScriptedInput`] replays a fixed event list
//! and backs the headless tests.

mod event;
mod keyboard;
mod parser;
mod source;

pub use event::{Event, ResizeEvent};
pub use keyboard::{KeyCode, KeyEvent, KeyModifiers};
pub use parser::{InputParser, ParseError, ParseResult};
pub use source::{InputSource, ScriptedInput, StdinInput};
