//! Scrollable, level-filtered event log.

use super::worker::{self, RedrawSignal};
use super::{LogEntry, LogLevel, LogSender, write_snapshot};
use crate::bridge::AsyncBridge;
use crate::config::expand_path;
use crate::context::UiContext;
use crate::error::{Error, Result};
use crate::input::{KeyCode, KeyEvent};
use crate::panel::{
    BackgroundWorker, Canvas, HelpEntry, KeyOutcome, ModalInput, Panel, PanelBase, ScrollBar, Tracked,
};
use crate::popups::{self, Popup};
use crate::style::Style;
use crate::text::{Ending, crop_str, display_cols, is_scroll_key, scroll_position};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Drift between the estimated and drawn content height that triggers an
/// immediate corrective redraw.
pub const CONTENT_HEIGHT_REDRAW_THRESHOLD: usize = 3;
/// Indent of an entry's continuation line.
pub const ENTRY_INDENT: u32 = 2;

const MAX_LINES_PER_ENTRY: i64 = 2;
/// Redraw at most this often while entries keep arriving.
const MAX_UPDATE_RATE: Duration = Duration::from_secs(1);
const MIN_UPDATE_WAIT: Duration = Duration::from_millis(50);
/// Sleep while paused or idle.
const IDLE_WAIT: Duration = Duration::from_secs(5);
/// How long status-line feedback stays up.
const FEEDBACK_WAIT: Duration = Duration::from_secs(2);
/// How long `stop` waits for the redraw thread to exit.
const STOP_WAIT: Duration = Duration::from_secs(2);

/// Event log with a verbosity threshold and its own redraw thread.
pub struct LogPanel {
    base: PanelBase,
    /// Entries passing the threshold, newest first.
    msg_log: Tracked<VecDeque<Arc<LogEntry>>>,
    /// Every entry ever logged, oldest first.
    backlog: Vec<Arc<LogEntry>>,
    capacity: usize,
    level: LogLevel,
    scroll: usize,
    last_content_height: usize,
    revision: u64,
    drawn_revision: u64,
    last_update: Option<Instant>,
    needs_correction: bool,
    inbound: AsyncBridge<LogEntry>,
    signal: Arc<RedrawSignal>,
    this: Weak<Mutex<LogPanel>>,
    thread: Option<JoinHandle<()>>,
}

impl LogPanel {
    /// A panel without a redraw thread, showing at most `capacity` entries.
    #[must_use]
    pub fn new(ctx: UiContext, top: u32, level: LogLevel, capacity: usize) -> Self {
        Self::with_handle(ctx, top, level, capacity, Weak::new())
    }

    /// A shared panel whose redraw thread can be started with
    /// [`BackgroundWorker::start`].
    #[must_use]
    pub fn shared(ctx: UiContext, top: u32, level: LogLevel, capacity: usize) -> Arc<Mutex<Self>> {
        Arc::new_cyclic(|this| Mutex::new(Self::with_handle(ctx, top, level, capacity, this.clone())))
    }

    fn with_handle(
        ctx: UiContext,
        top: u32,
        level: LogLevel,
        capacity: usize,
        this: Weak<Mutex<Self>>,
    ) -> Self {
        Self {
            base: PanelBase::new(ctx, "log", top, 0),
            msg_log: Tracked::new(VecDeque::new()),
            backlog: Vec::new(),
            capacity: capacity.max(1),
            level,
            scroll: 0,
            last_content_height: 0,
            revision: 0,
            drawn_revision: 0,
            last_update: None,
            needs_correction: false,
            inbound: AsyncBridge::new(),
            signal: Arc::new(RedrawSignal::default()),
            this,
            thread: None,
        }
    }

    /// Handle for logging from other threads.
    #[must_use]
    pub fn sender(&self) -> LogSender {
        LogSender::new(self.inbound.sender(), Arc::clone(&self.signal))
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Displayed entries, newest first. Frozen while paused.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.msg_log.get().iter().map(AsRef::as_ref)
    }

    /// All entries ever logged, oldest first.
    pub fn backlog(&self) -> impl Iterator<Item = &LogEntry> {
        self.backlog.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Content height measured by the last draw.
    #[must_use]
    pub fn content_height(&self) -> usize {
        self.last_content_height
    }

    #[must_use]
    pub fn title(&self) -> String {
        format!("Log ({} level)", self.level)
    }

    /// Log from the owning thread.
    pub fn log(&mut self, level: LogLevel, message: &str) {
        self.push(Arc::new(LogEntry::new(level, message)));
    }

    /// Log with a severity given by name. Unknown severities are dropped.
    pub fn log_str(&mut self, severity: &str, message: &str) {
        if let Ok(level) = severity.parse() {
            self.log(level, message);
        }
    }

    pub fn error(&mut self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn info(&mut self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&mut self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn push(&mut self, entry: Arc<LogEntry>) {
        self.backlog.push(Arc::clone(&entry));
        if self.level.includes(entry.level()) {
            let visible = self.msg_log.get_mut();
            visible.push_front(entry);
            visible.truncate(self.capacity);
            self.revision += 1;
            self.signal.wake();
        }
    }

    /// Change the verbosity threshold. Setting the current level is a no-op.
    pub fn set_level(&mut self, level: LogLevel) -> Result<()> {
        if level == self.level {
            return Ok(());
        }
        self.level = level;
        self.debug(&format!("set new log level '{level}'"));
        self.repopulate();
        self.redraw(true, false)
    }

    /// Rebuild the displayed entries from the backlog.
    pub fn repopulate(&mut self) {
        let level = self.level;
        let visible: VecDeque<_> = self
            .backlog
            .iter()
            .rev()
            .filter(|entry| level.includes(entry.level()))
            .take(self.capacity)
            .cloned()
            .collect();
        *self.msg_log.get_mut() = visible;
        self.revision += 1;
    }

    /// Empty the displayed log. The backlog is kept.
    pub fn clear(&mut self) -> Result<()> {
        self.msg_log.get_mut().clear();
        self.revision += 1;
        self.redraw(true, false)
    }

    /// Write the displayed log to `path`, oldest entry first, with dates.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        write_snapshot(path, self.msg_log.live().iter().rev().map(|e| e.dated_display()))
    }

    /// One step of the redraw thread. Returns how long to sleep, or `None`
    /// after redrawing.
    pub(crate) fn redraw_tick(&mut self) -> Option<Duration> {
        self.flush_inbound();
        if !self.base.is_visible() {
            self.drawn_revision = self.revision;
        }
        if self.base.is_paused() || self.revision == self.drawn_revision {
            return Some(IDLE_WAIT);
        }
        if let Some(since) = self.last_update.map(|t| t.elapsed()) {
            if since < MAX_UPDATE_RATE {
                return Some((MAX_UPDATE_RATE - since).max(MIN_UPDATE_WAIT));
            }
        }

        if let Err(err) = self.redraw(true, false) {
            tracing::warn!(error = %err, "log redraw failed");
        }
        // Counted as an update even when the Surface Lock was busy, so a
        // contended lock cannot turn this into a busy loop.
        self.last_update = Some(Instant::now());
        None
    }

    fn show_level_prompt(&mut self, modal: &mut dyn ModalInput) -> Result<()> {
        let ctx = self.base.context().clone();
        let key = {
            let Some(mut popup) = Popup::open(&ctx, 12, 80) else {
                return Ok(());
            };
            {
                let mut canvas = popup.frame("Select a log level:");
                let mut lines: Vec<String> = LogLevel::ALL
                    .iter()
                    .map(|level| format!("{} : {}", level.shortcut(), level.description()))
                    .collect();
                lines.push("ESC : keep current level".to_string());
                let mut row = 2;
                for line in &lines {
                    canvas.addstr(row, 2, line, Style::NONE);
                    row += 2;
                }
                canvas.addstr(row, 2, "Press any key...", Style::NONE);
            }
            popup.wait_key(modal, None)?
        };

        let Some(key) = key else {
            return Ok(());
        };
        if let Some(level) = key.plain_char().and_then(LogLevel::from_shortcut) {
            return self.set_level(level);
        }
        let msg = if key.is_esc() {
            "Cancelled log level selection".to_string()
        } else {
            format!("Invalid log level selection: {}", key_name(&key))
        };
        popups::show_message(&ctx, modal, &msg, Style::standout(), Some(FEEDBACK_WAIT))?;
        Ok(())
    }

    fn show_snapshot_prompt(&mut self, modal: &mut dyn ModalInput) -> Result<()> {
        let ctx = self.base.context().clone();
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let suggestion = expand_path(&format!("~/{}.{stamp}.log", env!("CARGO_PKG_NAME").replace('_', "-")));
        let answer = popups::input_prompt(
            &ctx,
            modal,
            "Path to save log snapshot: ",
            &suggestion.to_string_lossy(),
        )?;
        let Some(answer) = answer.filter(|a| !a.is_empty()) else {
            return Ok(());
        };

        let msg = match self.save_snapshot(&expand_path(&answer)) {
            Ok(()) => format!("Saved log as: {answer}"),
            Err(Error::Snapshot { source, .. }) => format!("Unable to save snapshot: {source}"),
            Err(err) => return Err(err),
        };
        popups::show_message(&ctx, modal, &msg, Style::standout(), Some(FEEDBACK_WAIT))?;
        Ok(())
    }
}

fn key_name(key: &KeyEvent) -> String {
    match key.code {
        KeyCode::Char(c) => c.to_string(),
        code => format!("{code:?}"),
    }
}

impl Panel for LogPanel {
    fn base(&self) -> &PanelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PanelBase {
        &mut self.base
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)] // Line counts are far below i64::MAX.
    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        let entries: Vec<Arc<LogEntry>> = self.msg_log.get().iter().cloned().collect();
        self.drawn_revision = self.revision;
        self.last_update = Some(Instant::now());

        let width = canvas.width();
        let height = canvas.height() as usize;
        let top = usize::from(self.base.is_title_visible());
        let rows = height.saturating_sub(top);
        if top > 0 {
            let style = if self.base.is_focused() { Style::underline().with_bold() } else { Style::bold() };
            canvas.addstr(0, 0, &self.title(), style);
        }

        self.scroll = self.scroll.min(self.last_content_height.saturating_sub(rows));

        let scroll_bar_visible = self.last_content_height > rows;
        let msg_indent: u32 = if scroll_bar_visible { 3 } else { 1 };
        if scroll_bar_visible {
            canvas.add_scroll_bar(
                ScrollBar::new(self.scroll, self.scroll + rows, self.last_content_height).draw_top(top as u32),
            );
        }

        let mut line_count = top as i64 - self.scroll as i64;
        for entry in &entries {
            let mut style = Style::fg(entry.level().color());
            if entry.level() == LogLevel::Error {
                style = style.with_bold();
            }

            let parts: Vec<&str> = entry.display().split('\n').collect();
            let mut queue: VecDeque<(String, bool)> = parts
                .iter()
                .enumerate()
                .map(|(i, part)| (part.trim().to_string(), i + 1 != parts.len()))
                .collect();

            let mut cursor = msg_indent;
            let mut line_offset = 0;
            while let Some((mut msg, mut include_break)) = queue.pop_front() {
                if line_offset == MAX_LINES_PER_ENTRY {
                    break;
                }
                let draw_line = line_count + line_offset;
                let max_msg_size = width.saturating_sub(cursor + 1) as usize;
                if display_cols(&msg) as usize > max_msg_size {
                    if line_offset == MAX_LINES_PER_ENTRY - 1 {
                        msg = crop_str(&msg, max_msg_size, Ending::Ellipsis).0;
                    } else {
                        let (line, rest) = crop_str(&msg, max_msg_size, Ending::Hyphen);
                        if !rest.is_empty() {
                            queue.push_front((rest.trim().to_string(), include_break));
                        }
                        msg = line;
                    }
                    include_break = true;
                }

                if draw_line >= top as i64 && draw_line < height as i64 {
                    let row = u32::try_from(draw_line).unwrap_or(u32::MAX);
                    canvas.addstr(row, cursor, &msg, style);
                }
                cursor += display_cols(&msg);

                if include_break || queue.is_empty() {
                    line_offset += 1;
                    cursor = msg_indent + ENTRY_INDENT;
                }
            }
            line_count += line_offset;
        }

        let new_content_height = usize::try_from(line_count + self.scroll as i64 - top as i64).unwrap_or(0);
        let drift = self.last_content_height.abs_diff(new_content_height);
        let reason = if drift >= CONTENT_HEIGHT_REDRAW_THRESHOLD {
            Some("estimate was off")
        } else if new_content_height > height && self.scroll + rows > new_content_height {
            Some("scrolled off the bottom of the page")
        } else if !scroll_bar_visible && new_content_height > rows {
            Some("scroll bar wasn't previously visible")
        } else if scroll_bar_visible && new_content_height <= rows {
            Some("scroll bar shouldn't be visible")
        } else {
            None
        };

        self.last_content_height = new_content_height;
        if let Some(reason) = reason {
            tracing::debug!(reason, drift, new_content_height, "forcing log redraw with corrected content height");
            self.needs_correction = true;
        }
        Ok(())
    }

    fn handle_key(&mut self, key: &KeyEvent, modal: &mut dyn ModalInput) -> Result<KeyOutcome> {
        if is_scroll_key(key) {
            let top = usize::from(self.base.is_title_visible());
            let page_height = (self.preferred_size().0 as usize).saturating_sub(top);
            let scroll = scroll_position(key, self.scroll, page_height, self.last_content_height, false, false);
            if scroll != self.scroll {
                self.scroll = scroll;
                self.redraw(true, true)?;
            }
            return Ok(KeyOutcome::Consumed);
        }

        match key.plain_char().map(|c| c.to_ascii_lowercase()) {
            Some('c') => {
                let ctx = self.base.context().clone();
                let confirm = popups::show_message(
                    &ctx,
                    modal,
                    "This will clear the log. Are you sure (c again to confirm)?",
                    Style::bold(),
                    None,
                )?;
                if confirm.and_then(|k| k.plain_char()).is_some_and(|c| c.eq_ignore_ascii_case(&'c')) {
                    self.clear()?;
                }
            }
            Some('l') => self.show_level_prompt(modal)?,
            Some('s') => self.show_snapshot_prompt(modal)?,
            _ => return Ok(KeyOutcome::Ignored),
        }
        Ok(KeyOutcome::Consumed)
    }

    fn takes_focus(&self) -> bool {
        true
    }

    fn help(&self) -> Vec<HelpEntry> {
        vec![
            HelpEntry::new("up arrow", "scroll log up a line"),
            HelpEntry::new("down arrow", "scroll log down a line"),
            HelpEntry::new("c", "clear log"),
            HelpEntry::new("l", "change log level displayed").with_selection(self.level.name()),
            HelpEntry::new("s", "save log snapshot"),
        ]
    }

    fn on_pause(&mut self, paused: bool) {
        self.msg_log.set_paused(paused);
        if !paused {
            self.signal.wake();
        }
    }

    fn flush_inbound(&mut self) -> usize {
        let entries = self.inbound.drain();
        let count = entries.len();
        for entry in entries {
            self.push(Arc::new(entry));
        }
        count
    }

    fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_correction)
    }

    fn as_background_worker(&mut self) -> Option<&mut dyn BackgroundWorker> {
        Some(self)
    }
}

impl BackgroundWorker for LogPanel {
    fn start(&mut self) -> Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }
        if self.this.strong_count() == 0 {
            return Err(Error::Worker {
                name: self.base.name().to_string(),
                reason: "panel was not created with LogPanel::shared".to_string(),
            });
        }
        self.signal.reset();
        let handle = worker::spawn(self.base.name(), self.this.clone(), Arc::clone(&self.signal))?;
        self.thread = Some(handle);
        tracing::info!(panel = %self.base.name(), "started log redraw thread");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.signal.halt();
        let Some(handle) = self.thread.take() else {
            return Ok(());
        };
        let deadline = Instant::now() + STOP_WAIT;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                self.thread = Some(handle);
                return Err(Error::Worker {
                    name: self.base.name().to_string(),
                    reason: format!("redraw thread did not stop within {STOP_WAIT:?}"),
                });
            }
            thread::sleep(Duration::from_millis(10));
        }
        handle.join().map_err(|_| Error::Worker {
            name: self.base.name().to_string(),
            reason: "redraw thread panicked".to_string(),
        })?;
        tracing::info!(panel = %self.base.name(), "stopped log redraw thread");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for LogPanel {
    fn drop(&mut self) {
        // The last handle may be dropped on the redraw thread itself, so
        // only signal here; joining is `stop`'s job.
        self.signal.halt();
    }
}

impl std::fmt::Debug for LogPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogPanel")
            .field("level", &self.level)
            .field("entries", &self.msg_log.live().len())
            .field("backlog", &self.backlog.len())
            .field("scroll", &self.scroll)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::input::ScriptedInput;
    use crate::panel::BlockingInput;
    use crate::style::TextAttributes;
    use std::thread;

    fn panel(height: u32, capacity: usize) -> (UiContext, LogPanel) {
        let ctx = UiContext::headless(40, height);
        let mut log = LogPanel::new(ctx.clone(), 0, LogLevel::Info, capacity);
        log.set_visible(true);
        (ctx, log)
    }

    fn messages(log: &LogPanel) -> Vec<String> {
        log.entries().map(|e| e.message().to_string()).collect()
    }

    #[test]
    fn test_visible_log_evicts_oldest() {
        let (_ctx, mut log) = panel(10, 5);
        for i in 0..10 {
            log.info(&format!("entry {i}"));
        }
        assert_eq!(messages(&log), ["entry 9", "entry 8", "entry 7", "entry 6", "entry 5"]);
        assert_eq!(log.backlog().count(), 10);
    }

    #[test]
    fn test_threshold_filters_and_repopulates() {
        let (_ctx, mut log) = panel(10, 50);
        log.error("bad");
        log.info("note");
        log.debug("noise");
        assert_eq!(messages(&log), ["note", "bad"]);

        log.set_level(LogLevel::Debug).unwrap();
        assert_eq!(log.level(), LogLevel::Debug);
        assert_eq!(
            messages(&log),
            ["set new log level 'DEBUG'", "noise", "note", "bad"]
        );

        log.set_level(LogLevel::Error).unwrap();
        assert_eq!(messages(&log), ["bad"]);
    }

    #[test]
    fn test_repeated_level_is_noop() {
        let (_ctx, mut log) = panel(10, 50);
        log.info("a");
        log.set_level(LogLevel::Info).unwrap();
        assert_eq!(log.backlog().count(), 1);
    }

    #[test]
    fn test_unknown_severity_is_dropped() {
        let (_ctx, mut log) = panel(10, 50);
        log.log_str("NOTICE", "ignored");
        log.log_str("error", "kept");
        assert_eq!(messages(&log), ["kept"]);
        assert_eq!(log.backlog().count(), 1);
    }

    #[test]
    fn test_clear_keeps_backlog() {
        let (_ctx, mut log) = panel(10, 50);
        log.info("a");
        log.clear().unwrap();
        assert_eq!(log.entries().count(), 0);
        assert_eq!(log.backlog().count(), 1);
    }

    #[test]
    fn test_pause_freezes_displayed_entries() {
        let (_ctx, mut log) = panel(10, 50);
        log.info("before");
        log.set_paused(true, true).unwrap();
        log.info("during");
        assert_eq!(messages(&log), ["before"]);
        log.set_paused(false, true).unwrap();
        assert_eq!(messages(&log), ["during", "before"]);
    }

    #[test]
    fn test_sender_entries_arrive_on_flush() {
        let (_ctx, mut log) = panel(10, 50);
        let sender = log.sender();
        thread::spawn(move || {
            sender.info("from worker");
            assert!(!sender.log_str("TRACE", "dropped"));
        })
        .join()
        .unwrap();
        assert_eq!(log.entries().count(), 0);
        assert_eq!(log.flush_inbound(), 1);
        assert_eq!(messages(&log), ["from worker"]);
    }

    #[test]
    fn test_draw_newest_first_with_level_styles() {
        let (ctx, mut log) = panel(6, 50);
        log.info("first");
        log.error("second");
        log.redraw(true, true).unwrap();

        let surface = ctx.lock();
        let buffer = surface.buffer();
        assert!(buffer.row_text(0).starts_with("Log (INFO level)"));
        assert!(buffer.row_text(1).contains("[ERROR] second"));
        assert!(buffer.row_text(2).contains("[INFO] first"));

        let error_cell = buffer.get(1, 1).unwrap();
        assert_eq!(error_cell.fg, Color::Red);
        assert!(error_cell.attributes.contains(TextAttributes::BOLD));
        assert_eq!(buffer.get(1, 2).unwrap().fg, Color::Green);
    }

    #[test]
    fn test_long_entry_wraps_to_two_lines() {
        let (ctx, mut log) = panel(6, 50);
        log.info("alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu");
        log.redraw(true, true).unwrap();

        let surface = ctx.lock();
        let buffer = surface.buffer();
        assert!(buffer.row_text(1).contains("alpha"));
        assert!(buffer.row_text(2).starts_with("   "));
        assert!(buffer.row_text(2).trim_end().ends_with("..."));
        assert!(buffer.row_text(3).trim().is_empty());
        assert_eq!(log.content_height(), 2);
    }

    #[test]
    fn test_height_estimate_corrects_itself() {
        let (ctx, mut log) = panel(5, 50);
        for i in 0..10 {
            log.info(&format!("m{i}"));
        }
        log.redraw(true, true).unwrap();
        assert_eq!(log.content_height(), 10);

        // The corrective pass drew with the scroll bar and indented text.
        let surface = ctx.lock();
        let row: Vec<char> = surface.buffer().row_text(1).chars().collect();
        assert!(row[3].is_ascii_digit());
        assert!(surface.buffer().row_text(1).contains("m9"));
        let bar = surface.buffer().get(0, 1).unwrap();
        assert!(bar.attributes.contains(TextAttributes::INVERSE));
    }

    #[test]
    fn test_scroll_keys_move_view() {
        let (_ctx, mut log) = panel(5, 50);
        for i in 0..10 {
            log.info(&format!("m{i}"));
        }
        log.redraw(true, true).unwrap();

        let mut script = ScriptedInput::new();
        let mut modal = BlockingInput::new(&mut script);
        let outcome = log.handle_key(&KeyEvent::key(KeyCode::Down), &mut modal).unwrap();
        assert_eq!(outcome, KeyOutcome::Consumed);
        assert_eq!(log.scroll(), 1);
        let outcome = log.handle_key(&KeyEvent::key(KeyCode::End), &mut modal).unwrap();
        assert_eq!(outcome, KeyOutcome::Consumed);
        assert_eq!(log.scroll(), 6);
    }

    #[test]
    fn test_clear_needs_confirmation() {
        let (_ctx, mut log) = panel(10, 50);
        log.info("a");
        let mut script = ScriptedInput::keys(['x', 'c', 'C']);
        let mut modal = BlockingInput::new(&mut script);

        log.handle_key(&KeyEvent::char('c'), &mut modal).unwrap();
        assert_eq!(log.entries().count(), 1);
        log.handle_key(&KeyEvent::char('c'), &mut modal).unwrap();
        assert_eq!(log.entries().count(), 0);
    }

    #[test]
    fn test_level_prompt() {
        let (_ctx, mut log) = panel(14, 50);
        // 'z' dismisses the "invalid selection" message.
        let mut script = ScriptedInput::keys(['D', 'q', 'z']);
        script.push(KeyEvent::key(KeyCode::Esc));
        let mut modal = BlockingInput::new(&mut script);

        log.handle_key(&KeyEvent::char('l'), &mut modal).unwrap();
        assert_eq!(log.level(), LogLevel::Debug);

        // Invalid and cancelled selections keep the level.
        log.handle_key(&KeyEvent::char('l'), &mut modal).unwrap();
        log.handle_key(&KeyEvent::char('l'), &mut modal).unwrap();
        assert_eq!(log.level(), LogLevel::Debug);
    }

    #[test]
    fn test_snapshot_is_oldest_first_and_dated() {
        let (_ctx, mut log) = panel(10, 50);
        log.info("one");
        log.error("two");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/snap.log");
        log.save_snapshot(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] one"));
        assert!(lines[1].ends_with("[ERROR] two"));
        assert!(lines[0].contains('/'));
    }

    #[test]
    fn test_hidden_title_gives_first_row_to_entries() {
        let (ctx, mut log) = panel(4, 50);
        log.base_mut().set_title_visible(false);
        for i in 0..4 {
            log.info(&format!("m{i}"));
        }
        log.redraw(true, true).unwrap();
        assert_eq!(log.content_height(), 4);

        {
            let surface = ctx.lock();
            let buffer = surface.buffer();
            assert!(buffer.row_text(0).contains("m3"));
            assert!(buffer.row_text(3).contains("m0"));
            // Four entries fit four rows, so no scroll bar.
            assert!(!buffer.get(0, 0).unwrap().attributes.contains(TextAttributes::INVERSE));
        }

        log.info("m4");
        log.redraw(true, true).unwrap();
        let mut script = ScriptedInput::new();
        let mut modal = BlockingInput::new(&mut script);
        log.handle_key(&KeyEvent::key(KeyCode::End), &mut modal).unwrap();
        assert_eq!(log.scroll(), 1);
        assert!(ctx.lock().buffer().row_text(3).contains("m0"));
    }

    #[test]
    fn test_unfocused_title_drops_underline() {
        let (ctx, mut log) = panel(6, 50);
        log.base_mut().set_focused(false);
        log.redraw(true, true).unwrap();
        let cell = ctx.lock().buffer().get(0, 0).unwrap().clone();
        assert!(cell.attributes.contains(TextAttributes::BOLD));
        assert!(!cell.attributes.contains(TextAttributes::UNDERLINE));
    }

    #[test]
    fn test_start_requires_shared_panel() {
        let (_ctx, mut log) = panel(10, 50);
        assert!(matches!(log.start(), Err(Error::Worker { .. })));
    }

    #[test]
    fn test_redraw_thread_draws_new_entries() {
        let ctx = UiContext::headless(40, 6);
        let log = LogPanel::shared(ctx.clone(), 0, LogLevel::Info, 50);
        let sender = {
            let mut panel = log.lock().unwrap();
            panel.set_visible(true);
            panel.start().unwrap();
            assert!(panel.is_running());
            panel.sender()
        };

        sender.info("streamed line");
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut drawn = false;
        while Instant::now() < deadline {
            if ctx.lock().buffer().row_text(1).contains("streamed line") {
                drawn = true;
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert!(drawn);

        let mut panel = log.lock().unwrap();
        panel.stop().unwrap();
        assert!(!panel.is_running());
    }
}
