//! SGR and cursor sequences for the surface.

pub mod output;
pub mod sequences;

pub use output::AnsiWriter;
pub use sequences::*;

use crate::color::Color;
use crate::style::TextAttributes;
use crate::terminal::ColorSupport;
use std::io::{self, Write};

/// How cell colors are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// SGR 30-37 / 40-47, 39 / 49 for the defaults.
    #[default]
    Ansi,
    /// No color output; attributes only.
    NoColor,
}

impl From<ColorSupport> for ColorMode {
    fn from(support: ColorSupport) -> Self {
        match support {
            ColorSupport::None => ColorMode::NoColor,
            ColorSupport::Basic => ColorMode::Ansi,
        }
    }
}

/// Decimal digits of `n`, without going through `fmt`.
#[inline]
fn write_u32_decimal(w: &mut impl Write, n: u32) -> io::Result<()> {
    if n < 10 {
        return w.write_all(&[b'0' + n as u8]);
    }
    if n < 100 {
        return w.write_all(&[b'0' + (n / 10) as u8, b'0' + (n % 10) as u8]);
    }

    let mut buf = [0u8; 10];
    let mut i = buf.len();
    let mut val = n;
    while val > 0 {
        i -= 1;
        buf[i] = b'0' + (val % 10) as u8;
        val /= 10;
    }
    w.write_all(&buf[i..])
}

pub fn write_fg_color(w: &mut impl Write, color: Color, mode: ColorMode) -> io::Result<()> {
    match mode {
        ColorMode::Ansi => {
            w.write_all(b"\x1b[")?;
            write_u32_decimal(w, u32::from(color.fg_code()))?;
            w.write_all(b"m")
        }
        ColorMode::NoColor => Ok(()),
    }
}

pub fn write_bg_color(w: &mut impl Write, color: Color, mode: ColorMode) -> io::Result<()> {
    match mode {
        ColorMode::Ansi => {
            w.write_all(b"\x1b[")?;
            write_u32_decimal(w, u32::from(color.bg_code()))?;
            w.write_all(b"m")
        }
        ColorMode::NoColor => Ok(()),
    }
}

/// One SGR sequence turning on every flag in `attrs`; nothing when empty.
pub fn write_attributes(w: &mut impl Write, attrs: TextAttributes) -> io::Result<()> {
    const TABLE: [(TextAttributes, &str); 8] = [
        (TextAttributes::BOLD, "1"),
        (TextAttributes::DIM, "2"),
        (TextAttributes::ITALIC, "3"),
        (TextAttributes::UNDERLINE, "4"),
        (TextAttributes::BLINK, "5"),
        (TextAttributes::INVERSE, "7"),
        (TextAttributes::HIDDEN, "8"),
        (TextAttributes::STRIKETHROUGH, "9"),
    ];

    let mut codes: [&str; 8] = [""; 8];
    let mut count = 0;
    for (flag, code) in TABLE {
        if attrs.contains(flag) {
            codes[count] = code;
            count += 1;
        }
    }

    if count == 0 {
        return Ok(());
    }
    w.write_all(b"\x1b[")?;
    for (i, code) in codes[..count].iter().enumerate() {
        if i > 0 {
            w.write_all(b";")?;
        }
        w.write_all(code.as_bytes())?;
    }
    w.write_all(b"m")
}

/// CUP for a 0-based `(row, col)`.
pub fn write_cursor_position(w: &mut impl Write, row: u32, col: u32) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    write_u32_decimal(w, row + 1)?;
    w.write_all(b";")?;
    write_u32_decimal(w, col + 1)?;
    w.write_all(b"H")
}

/// CUU/CUD then CUF/CUB.
pub fn write_cursor_move(w: &mut impl Write, dx: i32, dy: i32) -> io::Result<()> {
    if dy < 0 {
        w.write_all(b"\x1b[")?;
        write_u32_decimal(w, dy.unsigned_abs())?;
        w.write_all(b"A")?;
    } else if dy > 0 {
        w.write_all(b"\x1b[")?;
        write_u32_decimal(w, dy.unsigned_abs())?;
        w.write_all(b"B")?;
    }

    if dx > 0 {
        w.write_all(b"\x1b[")?;
        write_u32_decimal(w, dx.unsigned_abs())?;
        w.write_all(b"C")?;
    } else if dx < 0 {
        w.write_all(b"\x1b[")?;
        write_u32_decimal(w, dx.unsigned_abs())?;
        w.write_all(b"D")?;
    }
    Ok(())
}
