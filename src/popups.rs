//! Transient popups: help, about, menus and status-line messages.
//!
//! All of these run on the event-loop thread. They hold the Surface Lock
//! from the moment they open until the user dismisses them, so background
//! redraws skip their turn rather than paint over the popup. Closing one
//! requests a full redraw from the controller.

use crate::buffer::ClipRect;
use crate::context::UiContext;
use crate::error::Result;
use crate::input::{Event, KeyCode, KeyEvent};
use crate::panel::{Canvas, HelpEntry, ModalInput, TextField};
use crate::renderer::Surface;
use crate::style::Style;
use crate::text::{display_cols, is_scroll_key, is_selection_key};
use std::sync::MutexGuard;
use std::time::Duration;

/// Height of the help and about popups.
const SHEET_HEIGHT: u32 = 9;
/// Width of the help and about popups.
const SHEET_WIDTH: u32 = 80;
/// Column of the second help column.
const HELP_SECOND_COLUMN: u32 = 41;

/// A boxed area below the sticky panels, holding the Surface Lock.
pub struct Popup<'a> {
    ctx: &'a UiContext,
    surface: MutexGuard<'a, Surface>,
    region: ClipRect,
}

impl<'a> Popup<'a> {
    /// Open a popup of at most `height` by `width` cells, blocking on the
    /// Surface Lock. `None` when there is no room on screen.
    #[must_use]
    pub fn open(ctx: &'a UiContext, height: u32, width: u32) -> Option<Self> {
        let (screen_width, screen_height) = ctx.size();
        let top = ctx.popup_top();
        let height = height.min(screen_height.saturating_sub(top));
        let width = width.min(screen_width);
        if height == 0 || width == 0 {
            return None;
        }
        let surface = ctx.lock();
        Some(Self {
            ctx,
            surface,
            region: ClipRect::new(0, top, width, height),
        })
    }

    #[must_use]
    pub fn region(&self) -> ClipRect {
        self.region
    }

    /// Clipped drawing access to the popup area.
    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas::new(&mut self.surface, self.region)
    }

    /// Erase the popup, draw its border and put `title` over the top-left
    /// corner.
    pub fn frame(&mut self, title: &str) -> Canvas<'_> {
        let region = self.region;
        let mut canvas = Canvas::new(&mut self.surface, region);
        canvas.erase();
        canvas.draw_box(0, 0, region.height, region.width, Style::NONE);
        canvas.addstr(0, 0, title, Style::standout());
        canvas
    }

    /// Show the popup and wait for a key. A resize or timeout closes it
    /// with `None`.
    pub fn wait_key(&mut self, modal: &mut dyn ModalInput, timeout: Option<Duration>) -> Result<Option<KeyEvent>> {
        Ok(match modal.wait_event(&mut self.surface, timeout)? {
            Some(Event::Key(key)) => Some(key),
            Some(Event::Resize(_)) | None => None,
        })
    }
}

impl Drop for Popup<'_> {
    fn drop(&mut self) {
        self.surface.hide_cursor();
        self.ctx.request_redraw();
    }
}

/// Row for one-line messages: the status line, or the row below the
/// sticky panels when there is none.
fn message_row(ctx: &UiContext) -> Option<u32> {
    let row = ctx.status_row().unwrap_or_else(|| ctx.popup_top());
    let (width, height) = ctx.size();
    (row < height && width > 0).then_some(row)
}

/// Show `msg` on the status line until a key is pressed or `max_wait`
/// passes. Returns the key that dismissed it.
pub fn show_message(
    ctx: &UiContext,
    modal: &mut dyn ModalInput,
    msg: &str,
    style: Style,
    max_wait: Option<Duration>,
) -> Result<Option<KeyEvent>> {
    let Some(row) = message_row(ctx) else {
        return Ok(None);
    };
    let mut surface = ctx.lock();
    {
        let mut canvas = Canvas::new(&mut surface, ClipRect::new(0, row, ctx.size().0, 1));
        canvas.erase();
        canvas.addstr(0, 0, msg, style);
    }
    let event = modal.wait_event(&mut surface, max_wait)?;
    drop(surface);
    ctx.request_redraw();
    Ok(event.and_then(|e| e.key().copied()))
}

/// Prompt for a line of text on the status line.
///
/// Returns `None` when cancelled.
pub fn input_prompt(
    ctx: &UiContext,
    modal: &mut dyn ModalInput,
    msg: &str,
    initial: &str,
) -> Result<Option<String>> {
    let Some(row) = message_row(ctx) else {
        return Ok(None);
    };
    let width = ctx.size().0;
    let field_left = display_cols(msg).min(width.saturating_sub(1));

    let mut surface = ctx.lock();
    {
        let mut canvas = Canvas::new(&mut surface, ClipRect::new(0, row, width, 1));
        canvas.erase();
        canvas.addstr(0, 0, msg, Style::NONE);
    }
    let mut field = TextField::new(row, field_left, width - field_left, initial);
    let response = modal.read_line(&mut surface, &mut field);
    drop(surface);
    ctx.request_redraw();
    response
}

/// Two-column listing of the current page's commands.
///
/// Returns the key that closed the popup so the caller can act on it,
/// unless it was a selection, scroll or page-switch key.
pub fn show_help(
    ctx: &UiContext,
    modal: &mut dyn ModalInput,
    page: usize,
    entries: &[HelpEntry],
) -> Result<Option<KeyEvent>> {
    let Some(mut popup) = Popup::open(ctx, SHEET_HEIGHT, SHEET_WIDTH) else {
        return Ok(None);
    };
    let height = popup.region().height;

    let mut options = entries.to_vec();
    options.push(HelpEntry::new("a", concat!("about ", env!("CARGO_PKG_NAME"))));
    {
        let mut canvas = popup.frame(&format!("Page {} Commands:", page + 1));
        for (i, entry) in options.iter().enumerate() {
            let row = u32::try_from(i / 2).unwrap_or(u32::MAX) + 1;
            if row > height.saturating_sub(2) {
                break;
            }
            let mut col = if i % 2 == 0 { 2 } else { HELP_SECOND_COLUMN };
            col = canvas.addstr(row, col, &entry.key, Style::bold());
            col = canvas.addstr(row, col, &format!(": {}", entry.description), Style::NONE);
            if let Some(selection) = &entry.selection {
                col = canvas.addstr(row, col, " (", Style::NONE);
                col = canvas.addstr(row, col, selection, Style::bold());
                canvas.addstr(row, col, ")", Style::NONE);
            }
        }
        if options.len() < 13 && height == SHEET_HEIGHT {
            canvas.addstr(SHEET_HEIGHT - 2, 2, "Press any key...", Style::NONE);
        }
    }

    let key = popup.wait_key(modal, None)?;
    Ok(key.filter(|key| {
        !is_selection_key(key) && !is_scroll_key(key) && !key.is(KeyCode::Left) && !key.is(KeyCode::Right)
    }))
}

/// Name, version and license.
pub fn show_about(ctx: &UiContext, modal: &mut dyn ModalInput) -> Result<()> {
    let Some(mut popup) = Popup::open(ctx, SHEET_HEIGHT, SHEET_WIDTH) else {
        return Ok(());
    };
    {
        let mut canvas = popup.frame("About:");
        canvas.addstr(
            1,
            2,
            concat!(env!("CARGO_PKG_NAME"), ", version ", env!("CARGO_PKG_VERSION")),
            Style::bold(),
        );
        canvas.addstr(2, 4, env!("CARGO_PKG_DESCRIPTION"), Style::NONE);
        canvas.addstr(
            5,
            2,
            concat!("Released under the ", env!("CARGO_PKG_LICENSE"), " license"),
            Style::NONE,
        );
        canvas.addstr(7, 2, "Press any key...", Style::NONE);
    }
    popup.wait_key(modal, None)?;
    Ok(())
}

/// Single-column menu. Returns the chosen index, or `None` when cancelled
/// with Escape.
///
/// `current` is marked with `>` and selected initially.
pub fn show_menu(
    ctx: &UiContext,
    modal: &mut dyn ModalInput,
    title: &str,
    options: &[String],
    current: Option<usize>,
) -> Result<Option<usize>> {
    if options.is_empty() {
        return Ok(None);
    }
    let width = options.iter().map(|o| display_cols(o)).max().unwrap_or(0) + 9;
    let height = u32::try_from(options.len()).unwrap_or(u32::MAX).saturating_add(2);
    let Some(mut popup) = Popup::open(ctx, height, width) else {
        return Ok(None);
    };

    let mut selection = current.unwrap_or(0).min(options.len() - 1);
    loop {
        {
            let mut canvas = popup.frame(title);
            for (i, label) in options.iter().enumerate() {
                let row = u32::try_from(i).unwrap_or(u32::MAX) + 1;
                let style = if i == selection { Style::standout() } else { Style::NONE };
                let tab = if Some(i) == current { "> " } else { "  " };
                canvas.addstr(row, 2, tab, Style::NONE);
                canvas.addstr(row, 4, &format!(" {label} "), style);
            }
        }

        let Some(key) = popup.wait_key(modal, None)? else {
            return Ok(None);
        };
        if key.is_esc() {
            return Ok(None);
        }
        if is_selection_key(&key) {
            return Ok(Some(selection));
        }
        if key.is(KeyCode::Up) {
            selection = selection.saturating_sub(1);
        } else if key.is(KeyCode::Down) {
            selection = (selection + 1).min(options.len() - 1);
        }
    }
}
