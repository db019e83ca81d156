//! Event sources feeding the UI thread.

use crate::input::event::{Event, ResizeEvent};
use crate::input::keyboard::KeyEvent;
use crate::input::parser::{InputParser, ParseError};
use crate::terminal::{poll_readable, read_available, take_resize, terminal_size};
use std::collections::VecDeque;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::time::{Duration, Instant};

/// How long a lone `ESC` may wait for the rest of a sequence.
const ESCAPE_TIMEOUT: Duration = Duration::from_millis(25);

/// A source of terminal events.
pub trait InputSource: Send {
    /// Wait for the next event.
    ///
    /// `None` blocks until an event arrives. With a timeout, `Ok(None)`
    /// means nothing happened in time.
    fn poll_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<Event>>;
}

/// Reads and decodes key presses from the controlling terminal.
pub struct StdinInput {
    fd: RawFd,
    resize_events: bool,
    parser: InputParser,
    pending: Vec<u8>,
    buf: [u8; 256],
}

impl StdinInput {
    /// Read from the process's stdin, reporting terminal resizes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resize_events: true,
            ..Self::from_fd(io::stdin().as_raw_fd())
        }
    }

    /// Read from an arbitrary descriptor. No resize events are reported.
    #[must_use]
    pub fn from_fd(fd: RawFd) -> Self {
        Self {
            fd,
            resize_events: false,
            parser: InputParser::new(),
            pending: Vec::with_capacity(64),
            buf: [0; 256],
        }
    }

    /// Decode the next complete key from the pending bytes.
    fn next_buffered(&mut self) -> Option<KeyEvent> {
        loop {
            match self.parser.parse(&self.pending) {
                Ok((key, consumed)) => {
                    self.pending.drain(..consumed);
                    return Some(key);
                }
                Err(ParseError::UnrecognizedSequence(seq)) => {
                    tracing::trace!(?seq, "dropping unrecognized input sequence");
                    self.pending.drain(..seq.len().clamp(1, self.pending.len()));
                }
                Err(ParseError::InvalidUtf8) => {
                    self.pending.drain(..1);
                }
                Err(ParseError::Empty | ParseError::Incomplete) => return None,
            }
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for StdinInput {
    fn poll_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<Event>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if self.resize_events && take_resize() {
                match terminal_size() {
                    Ok((cols, rows)) => {
                        return Ok(Some(Event::Resize(ResizeEvent::new(cols, rows))));
                    }
                    Err(err) => tracing::debug!(%err, "resize without a terminal size"),
                }
            }
            if let Some(key) = self.next_buffered() {
                return Ok(Some(key.into()));
            }

            let wait = if self.pending.is_empty() {
                deadline.map(|d| d.saturating_duration_since(Instant::now()))
            } else {
                Some(ESCAPE_TIMEOUT)
            };
            if poll_readable(self.fd, wait)? {
                let n = read_available(self.fd, &mut self.buf)?;
                if n == 0 {
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
                }
                self.pending.extend_from_slice(&self.buf[..n]);
                continue;
            }

            // A sequence that stalls was never a sequence.
            if let Some(&first) = self.pending.first() {
                self.pending.drain(..1);
                if first == 0x1b {
                    return Ok(Some(self.parser.escape_key().into()));
                }
                continue;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(None);
            }
        }
    }
}

/// Timed polls answered with "no event" after the script runs out.
const SCRIPT_IDLE_POLLS: usize = 16;

/// Replays a prepared list of events.
///
/// Once the script runs out, blocking polls fail with
/// [`io::ErrorKind::UnexpectedEof`]. Timed polls report no event a few
/// times and then fail the same way, so a test that forgets to quit ends
/// instead of hanging.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<Event>,
    idle_polls: usize,
}

impl ScriptedInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a script from keys.
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyEvent>,
    {
        Self {
            events: keys.into_iter().map(|k| Event::Key(k.into())).collect(),
            idle_polls: 0,
        }
    }

    /// Append an event.
    pub fn push(&mut self, event: impl Into<Event>) -> &mut Self {
        self.events.push_back(event.into());
        self
    }

    /// Append every character of `text` as a key press.
    pub fn type_str(&mut self, text: &str) -> &mut Self {
        self.events
            .extend(text.chars().map(|c| Event::Key(KeyEvent::char(c))));
        self
    }

    /// Events not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<Event>> {
        if let Some(event) = self.events.pop_front() {
            return Ok(Some(event));
        }
        if timeout.is_some() && self.idle_polls < SCRIPT_IDLE_POLLS {
            self.idle_polls += 1;
            return Ok(None);
        }
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input script exhausted"))
    }
}
