//! Turns the bytes a terminal sends for a key press into [`KeyEvent`]s.
//!
//! Only keyboard input is decoded: xterm CSI and SS3 cursor keys (with the
//! `1;N` modifier form), `~`-terminated editing keys, control chords and
//! UTF-8 text. Anything else is dropped a sequence at a time.

#![allow(clippy::match_same_arms)]
#![allow(clippy::unused_self)]

use crate::input::keyboard::{KeyCode, KeyEvent, KeyModifiers};

/// Why [`InputParser::parse`] produced no key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    /// A sequence has started; read more bytes and try again.
    Incomplete,
    /// Unrecognized escape sequence; the bytes are consumed and dropped.
    UnrecognizedSequence(Vec<u8>),
    InvalidUtf8,
}

/// Result of parsing input: the key and the number of bytes consumed.
pub type ParseResult = Result<(KeyEvent, usize), ParseError>;

/// Stateless key parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputParser;

impl InputParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode the key at the start of `input` and how many bytes it used.
    ///
    /// A lone `ESC` reports [`ParseError::Incomplete`]; the caller decides
    /// after a short wait whether it is the Escape key.
    pub fn parse(&self, input: &[u8]) -> ParseResult {
        let Some(&first) = input.first() else {
            return Err(ParseError::Empty);
        };

        match first {
            0x1b => self.parse_escape(input),
            b'\r' | b'\n' => Ok((KeyEvent::key(KeyCode::Enter), 1)),
            b'\t' => Ok((KeyEvent::key(KeyCode::Tab), 1)),
            0x08 | 0x7f => Ok((KeyEvent::key(KeyCode::Backspace), 1)),
            0x00 => Ok((KeyEvent::with_ctrl(KeyCode::Char(' ')), 1)),
            0x01..=0x1a => {
                // ^A..^Z, minus the Tab/Enter/Backspace arms above
                let c = (first - 1 + b'a') as char;
                Ok((KeyEvent::with_ctrl(KeyCode::Char(c)), 1))
            }
            0x1c..=0x1f => Err(ParseError::UnrecognizedSequence(vec![first])),
            0x20..=0x7e => Ok((KeyEvent::char(first as char), 1)),
            0x80..=0xff => self.parse_utf8(input),
        }
    }

    /// Interpret a lone escape byte as the Escape key.
    #[must_use]
    pub fn escape_key(&self) -> KeyEvent {
        KeyEvent::key(KeyCode::Esc)
    }

    fn parse_escape(&self, input: &[u8]) -> ParseResult {
        if input.len() == 1 {
            return Err(ParseError::Incomplete);
        }

        match input[1] {
            b'[' => self.parse_csi(input),
            b'O' => self.parse_ss3(input),
            // meta sends ESC before the key
            0x20..=0x7e => {
                let c = input[1] as char;
                Ok((KeyEvent::new(KeyCode::Char(c), KeyModifiers::ALT), 2))
            }
            _ => Ok((self.escape_key(), 1)),
        }
    }

    fn parse_csi(&self, input: &[u8]) -> ParseResult {
        if input.len() < 3 {
            return Err(ParseError::Incomplete);
        }

        // parameters run up to the final byte in @..~
        let Some(end) = input[2..]
            .iter()
            .position(|b| (0x40..=0x7e).contains(b))
            .map(|p| p + 2)
        else {
            return Err(ParseError::Incomplete);
        };

        let params = &input[2..end];
        let consumed = end + 1;
        let code = match input[end] {
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'Z' => return Ok((KeyEvent::key(KeyCode::BackTab), consumed)),
            b'~' => {
                return self
                    .parse_tilde_key(params, consumed)
                    .map_err(|err| match err {
                        ParseError::UnrecognizedSequence(_) => {
                            ParseError::UnrecognizedSequence(input[..consumed].to_vec())
                        }
                        other => other,
                    });
            }
            _ => return Err(ParseError::UnrecognizedSequence(input[..consumed].to_vec())),
        };
        let modifiers = self.parse_modifiers(params)?;
        Ok((KeyEvent::new(code, modifiers), consumed))
    }

    /// The `N` of `1;N`.
    fn parse_modifiers(&self, params: &[u8]) -> Result<KeyModifiers, ParseError> {
        // N - 1 is a bit set: shift 1, alt 2, ctrl 4
        let s = std::str::from_utf8(params).map_err(|_| ParseError::InvalidUtf8)?;
        let Some(n) = s.split(';').nth(1).and_then(|p| p.parse::<u8>().ok()) else {
            return Ok(KeyModifiers::empty());
        };
        let n = n.saturating_sub(1);
        let mut mods = KeyModifiers::empty();
        if n & 1 != 0 {
            mods |= KeyModifiers::SHIFT;
        }
        if n & 2 != 0 {
            mods |= KeyModifiers::ALT;
        }
        if n & 4 != 0 {
            mods |= KeyModifiers::CTRL;
        }
        Ok(mods)
    }

    /// `ESC [ n ~` editing and function keys.
    fn parse_tilde_key(&self, params: &[u8], consumed: usize) -> ParseResult {
        let s = std::str::from_utf8(params).map_err(|_| ParseError::InvalidUtf8)?;
        let num: u8 = s
            .split(';')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);
        let modifiers = self.parse_modifiers(params)?;

        let code = match num {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            11..=15 => KeyCode::F(num - 10),
            17..=21 => KeyCode::F(num - 11),
            23 | 24 => KeyCode::F(num - 12),
            _ => return Err(ParseError::UnrecognizedSequence(params.to_vec())),
        };

        Ok((KeyEvent::new(code, modifiers), consumed))
    }

    /// `ESC O x`, sent for F1-F4 and by keypads in application mode.
    fn parse_ss3(&self, input: &[u8]) -> ParseResult {
        if input.len() < 3 {
            return Err(ParseError::Incomplete);
        }

        let code = match input[2] {
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'M' => KeyCode::Enter,
            _ => return Err(ParseError::UnrecognizedSequence(input[..3].to_vec())),
        };

        Ok((KeyEvent::key(code), 3))
    }

    fn parse_utf8(&self, input: &[u8]) -> ParseResult {
        let first = input[0];

        let expected_len = if first & 0b1110_0000 == 0b1100_0000 {
            2
        } else if first & 0b1111_0000 == 0b1110_0000 {
            3
        } else if first & 0b1111_1000 == 0b1111_0000 {
            4
        } else {
            return Err(ParseError::InvalidUtf8);
        };

        if input.len() < expected_len {
            return Err(ParseError::Incomplete);
        }

        let s = std::str::from_utf8(&input[..expected_len]).map_err(|_| ParseError::InvalidUtf8)?;
        let c = s.chars().next().ok_or(ParseError::InvalidUtf8)?;

        Ok((KeyEvent::char(c), expected_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> ParseResult {
        InputParser::new().parse(bytes)
    }

    #[test]
    fn test_plain_letter() {
        assert_eq!(parse(b"a"), Ok((KeyEvent::char('a'), 1)));
    }

    #[test]
    fn test_enter_is_not_ctrl_m() {
        assert_eq!(parse(b"\r"), Ok((KeyEvent::key(KeyCode::Enter), 1)));
        assert_eq!(parse(b"\n"), Ok((KeyEvent::key(KeyCode::Enter), 1)));
        assert_eq!(parse(b"\t"), Ok((KeyEvent::key(KeyCode::Tab), 1)));
    }

    #[test]
    fn test_parse_ctrl_l() {
        let (event, n) = parse(b"\x0c").unwrap();
        assert_eq!(n, 1);
        assert_eq!(event, KeyEvent::with_ctrl(KeyCode::Char('l')));
    }

    #[test]
    fn test_lone_escape_is_incomplete() {
        assert_eq!(parse(b"\x1b"), Err(ParseError::Incomplete));
        assert_eq!(parse(b"\x1b\x1b"), Ok((KeyEvent::key(KeyCode::Esc), 1)));
    }

    #[test]
    fn test_parse_arrows() {
        assert_eq!(parse(b"\x1b[A"), Ok((KeyEvent::key(KeyCode::Up), 3)));
        assert_eq!(parse(b"\x1b[D"), Ok((KeyEvent::key(KeyCode::Left), 3)));
        assert_eq!(parse(b"\x1bOB"), Ok((KeyEvent::key(KeyCode::Down), 3)));
    }

    #[test]
    fn test_ctrl_arrow() {
        let (event, n) = parse(b"\x1b[1;5C").unwrap();
        assert_eq!(n, 6);
        assert_eq!(event.code, KeyCode::Right);
        assert!(event.ctrl());
    }

    #[test]
    fn test_parse_tilde_keys() {
        assert_eq!(parse(b"\x1b[3~"), Ok((KeyEvent::key(KeyCode::Delete), 4)));
        assert_eq!(parse(b"\x1b[5~"), Ok((KeyEvent::key(KeyCode::PageUp), 4)));
        assert_eq!(parse(b"\x1b[1~"), Ok((KeyEvent::key(KeyCode::Home), 4)));
        assert_eq!(parse(b"\x1b[15~"), Ok((KeyEvent::key(KeyCode::F(5)), 5)));
        assert_eq!(parse(b"\x1b[24~"), Ok((KeyEvent::key(KeyCode::F(12)), 5)));
    }

    #[test]
    fn test_incomplete_csi() {
        assert_eq!(parse(b"\x1b["), Err(ParseError::Incomplete));
        assert_eq!(parse(b"\x1b[1;5"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_unrecognized_sequence_is_consumed() {
        assert_eq!(
            parse(b"\x1b[99q"),
            Err(ParseError::UnrecognizedSequence(b"\x1b[99q".to_vec()))
        );
    }

    #[test]
    fn test_multibyte_char() {
        assert_eq!(parse("é".as_bytes()), Ok((KeyEvent::char('é'), 2)));
        assert_eq!(parse(&"é".as_bytes()[..1]), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_del_is_backspace() {
        assert_eq!(parse(b"\x7f"), Ok((KeyEvent::key(KeyCode::Backspace), 1)));
    }
}
