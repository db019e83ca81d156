//! What the environment says about the terminal we were started in.

use std::env;

/// Whether SGR colors may be written at all.
///
/// The panels only use the eight standard colors, so anything beyond
/// "has color" is not distinguished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorSupport {
    /// `NO_COLOR`, `TERM=dumb` or no `TERM`.
    None,
    #[default]
    Basic,
}

/// Terminal features the surface adapts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub color: ColorSupport,
    /// UTF-8 locale; box drawing falls back to ASCII without it.
    pub unicode: bool,
    /// Mode 2026 brackets around each present.
    pub sync_output: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            color: ColorSupport::Basic,
            unicode: true,
            sync_output: false,
        }
    }
}

impl Capabilities {
    /// Read `TERM`, `NO_COLOR`, `TERM_PROGRAM` and the locale variables.
    #[must_use]
    pub fn detect() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default();
        let no_color = env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        let locale = ["LC_ALL", "LC_CTYPE", "LANG"].map(var);

        Self {
            color: if no_color { ColorSupport::None } else { color_for_term(&var("TERM")) },
            unicode: locale_is_utf8(&locale),
            sync_output: has_sync_output(&var("TERM_PROGRAM")),
        }
    }
}

fn color_for_term(term: &str) -> ColorSupport {
    if term.is_empty() || term == "dumb" {
        ColorSupport::None
    } else {
        ColorSupport::Basic
    }
}

/// The first non-empty variable wins, as in setlocale(3).
fn locale_is_utf8(vars: &[String]) -> bool {
    vars.iter().find(|v| !v.is_empty()).is_some_and(|v| {
        let v = v.to_ascii_lowercase();
        v.contains("utf-8") || v.contains("utf8")
    })
}

fn has_sync_output(term_program: &str) -> bool {
    ["WezTerm", "kitty", "Alacritty", "ghostty", "iTerm.app"]
        .iter()
        .any(|t| term_program.eq_ignore_ascii_case(t))
}
