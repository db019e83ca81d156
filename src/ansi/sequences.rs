//! Fixed escape strings written by the surface and the terminal guard.

/// SGR 0: plain text, default colors.
pub const RESET: &str = "\x1b[0m";

/// Erase the whole display. Used by full presents.
pub const CLEAR_SCREEN: &str = "\x1b[2J";

pub const CURSOR_HIDE: &str = "\x1b[?25l";
pub const CURSOR_SHOW: &str = "\x1b[?25h";

/// Top-left cell.
pub const CURSOR_HOME: &str = "\x1b[H";

/// Switch to the alternate screen so the shell's scrollback survives the session.
pub const ALT_SCREEN_ON: &str = "\x1b[?1049h";
pub const ALT_SCREEN_OFF: &str = "\x1b[?1049l";

/// BEL, rung when a text field rejects a key.
pub const BELL: &str = "\x07";

/// Mode 2026 brackets around one present, so the terminal paints the frame at once.
pub mod sync {
    pub const BEGIN: &str = "\x1b[?2026h";
    pub const END: &str = "\x1b[?2026l";
}
