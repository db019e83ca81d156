//! Scrollable panel of raw command output.

use crate::bridge::{AsyncBridge, BridgeSender};
use crate::config::expand_path;
use crate::context::UiContext;
use crate::error::{Error, Result};
use crate::input::KeyEvent;
use crate::log::write_snapshot;
use crate::panel::{Canvas, HelpEntry, KeyOutcome, ModalInput, Panel, PanelBase, ScrollBar, Tracked};
use crate::popups;
use crate::style::Style;
use crate::text::{is_scroll_key, pad_str, printable, scroll_position, split_str};
use std::collections::VecDeque;
use std::time::Duration;

const FEEDBACK_WAIT: Duration = Duration::from_secs(2);

/// Output lines with a scroll bar.
///
/// New output is followed until the user scrolls up; scrolling back to the
/// bottom resumes following.
#[derive(Debug)]
pub struct OutputPanel {
    base: PanelBase,
    lines: Tracked<VecDeque<String>>,
    backlog: usize,
    scroll_top: usize,
    scroll_height: usize,
    scroll_lines: usize,
    follow: bool,
    inbound: AsyncBridge<String>,
}

impl OutputPanel {
    /// Panel at `top` keeping at most `backlog` lines (0 keeps everything).
    #[must_use]
    pub fn new(ctx: UiContext, name: &str, top: u32, backlog: usize) -> Self {
        Self {
            base: PanelBase::new(ctx, name, top, 0),
            lines: Tracked::new(VecDeque::new()),
            backlog,
            scroll_top: 0,
            scroll_height: 0,
            scroll_lines: 0,
            follow: true,
            inbound: AsyncBridge::new(),
        }
    }

    /// Append output, one line per `\n`-separated piece.
    pub fn add(&mut self, output: &str) {
        let lines = self.lines.get_mut();
        lines.extend(output.split('\n').map(printable));
        if self.backlog > 0 && lines.len() > self.backlog {
            let excess = lines.len() - self.backlog;
            lines.drain(..excess);
        }
    }

    /// Handle for other threads to queue output. Queued output shows up
    /// after the owner calls [`Panel::flush_inbound`].
    #[must_use]
    pub fn sender(&self) -> BridgeSender<String> {
        self.inbound.sender()
    }

    /// Lines as displayed (the pause snapshot while paused).
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.get().iter().map(String::as_str)
    }

    #[must_use]
    pub fn scroll(&self) -> usize {
        self.scroll_top
    }

    #[must_use]
    pub fn is_following(&self) -> bool {
        self.follow
    }

    fn max_scroll(&self) -> usize {
        self.scroll_lines.saturating_sub(self.scroll_height)
    }

    fn save_prompt(&mut self, modal: &mut dyn ModalInput) -> Result<()> {
        let ctx = self.base.context().clone();
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let suggestion = expand_path(&format!("~/setup-tui.output.{stamp}.log"));
        let answer =
            popups::input_prompt(&ctx, modal, "Path to save output: ", &suggestion.to_string_lossy())?;
        let Some(answer) = answer.filter(|a| !a.is_empty()) else {
            return Ok(());
        };

        let msg = match write_snapshot(&expand_path(&answer), self.lines.live()) {
            Ok(()) => format!("Saved output as: {answer}"),
            Err(Error::Snapshot { source, .. }) => format!("Unable to save output: {source}"),
            Err(err) => return Err(err),
        };
        popups::show_message(&ctx, modal, &msg, Style::standout(), Some(FEEDBACK_WAIT))?;
        Ok(())
    }
}

impl Panel for OutputPanel {
    fn base(&self) -> &PanelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PanelBase {
        &mut self.base
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        let (width, height) = (canvas.width() as usize, canvas.height() as usize);
        let mut y = 0;
        if self.base.is_title_visible() {
            let style = if self.base.is_focused() { Style::standout() } else { Style::bold() };
            canvas.addstr(0, 0, self.base.name(), style);
            y += 1;
        }

        let mut wrapped = Vec::new();
        for line in self.lines.get() {
            let pieces = split_str(line, width.saturating_sub(2));
            if pieces.is_empty() {
                wrapped.push(String::new());
            } else {
                wrapped.extend(pieces);
            }
        }

        self.scroll_lines = wrapped.len();
        self.scroll_height = height.saturating_sub(y as usize);
        if self.follow {
            self.scroll_top = self.max_scroll();
        }
        self.scroll_top = self.scroll_top.min(self.max_scroll());
        let bottom = (self.scroll_top + self.scroll_height).min(self.scroll_lines);

        if self.scroll_lines > 0 {
            canvas.add_scroll_bar(ScrollBar::new(self.scroll_top, bottom, self.scroll_lines).draw_top(y));
            for line in &wrapped[self.scroll_top..bottom] {
                canvas.addstr(y, 3, &pad_str(line, width.saturating_sub(3)), Style::NONE);
                y += 1;
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: &KeyEvent, modal: &mut dyn ModalInput) -> Result<KeyOutcome> {
        if is_scroll_key(key) {
            let target = scroll_position(key, self.scroll_top, self.scroll_height, self.scroll_lines, false, false);
            if target != self.scroll_top {
                self.scroll_top = target;
                self.follow = target >= self.max_scroll();
                self.redraw(true, true)?;
            }
            return Ok(KeyOutcome::Consumed);
        }
        if key.plain_char() == Some('s') {
            self.save_prompt(modal)?;
            return Ok(KeyOutcome::Consumed);
        }
        Ok(KeyOutcome::Ignored)
    }

    fn takes_focus(&self) -> bool {
        true
    }

    fn help(&self) -> Vec<HelpEntry> {
        vec![
            HelpEntry::new("up arrow", "scroll output up a line"),
            HelpEntry::new("down arrow", "scroll output down a line"),
            HelpEntry::new("s", "save output"),
        ]
    }

    fn on_pause(&mut self, paused: bool) {
        self.lines.set_paused(paused);
    }

    fn flush_inbound(&mut self) -> usize {
        let pending = self.inbound.drain();
        for line in &pending {
            self.add(line);
        }
        pending.len()
    }
}
