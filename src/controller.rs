//! Pages of panels and the event loop that drives them.
//!
//! The controller owns the sticky panels (shown on every page, such as the
//! header and the toolbar) and one panel group per page. Each loop iteration
//! drains the Async Bridges of the displayed panels, redraws, then waits a
//! bounded time for input so periodic redraws keep happening while idle.
//!
//! Global keys are handled before any panel sees the key:
//!
//! | key | action |
//! |-----|--------|
//! | `q` | quit |
//! | `p` | pause or resume |
//! | `h` | help for the current page |
//! | `a` | about |
//! | left / right | previous / next page |
//! | tab / shift-tab | focus the next / previous scrolling panel |
//! | `Ctrl-L` | repaint everything |
//!
//! Tab only counts as a global key while more than one displayed panel
//! [takes focus](Panel::takes_focus); otherwise panels receive it. Owners
//! add their own global keys with [`Controller::bind_key`].

use crate::context::UiContext;
use crate::error::{Error, Result};
use crate::input::{Event, InputSource, KeyCode, KeyEvent, ResizeEvent};
use crate::panel::{
    BlockingInput, HelpEntry, KeyOutcome, LabelPanel, ModalInput, Panel, PanelAction, PanelHandle,
};
use crate::popups;
use crate::style::Style;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Interval of forced redraws, and the longest the loop waits for input.
pub const REFRESH_RATE: Duration = Duration::from_secs(1);

fn lock(panel: &PanelHandle) -> MutexGuard<'_, dyn Panel + 'static> {
    panel.lock().unwrap_or_else(PoisonError::into_inner)
}

fn same_panel(a: &PanelHandle, b: &PanelHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

type PauseHook = Box<dyn FnMut(bool)>;

/// Page state plus the single input dispatch loop.
pub struct Controller {
    ctx: UiContext,
    sticky: Vec<PanelHandle>,
    pages: Vec<Vec<PanelHandle>>,
    page: usize,
    /// Index among the displayed panels that take focus.
    focus: usize,
    paused: bool,
    force_redraw: bool,
    last_drawn: Option<Instant>,
    done: bool,
    toolbar: Option<Arc<Mutex<LabelPanel>>>,
    toolbar_msg: String,
    pause_hooks: Vec<PauseHook>,
    bindings: Vec<(char, HelpEntry, PanelAction)>,
}

impl Controller {
    #[must_use]
    pub fn new(ctx: UiContext) -> Self {
        Self {
            ctx,
            sticky: Vec::new(),
            pages: Vec::new(),
            page: 0,
            focus: 0,
            paused: false,
            force_redraw: false,
            last_drawn: None,
            done: false,
            toolbar: None,
            toolbar_msg: String::new(),
            pause_hooks: Vec::new(),
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &UiContext {
        &self.ctx
    }

    /// Add a panel shown at the top of every page, below earlier sticky
    /// panels.
    pub fn add_sticky_panel(&mut self, panel: PanelHandle) {
        self.sticky.push(panel);
        self.refresh_panels();
    }

    /// Add a bold one-line header as a sticky panel.
    pub fn add_header(&mut self, message: &str) {
        let mut header = LabelPanel::new(self.ctx.clone(), "header");
        header.set_message(message, Style::bold());
        self.add_sticky_panel(Arc::new(Mutex::new(header)));
    }

    /// Add the toolbar as a sticky panel. It shows `page x / y - message`
    /// (or just `message` with a single page), or `Paused` while paused.
    /// Status-line messages are drawn on its row.
    pub fn add_toolbar(&mut self, message: &str) {
        let toolbar = Arc::new(Mutex::new(LabelPanel::new(self.ctx.clone(), "toolbar")));
        self.toolbar_msg = message.to_string();
        self.toolbar = Some(Arc::clone(&toolbar));
        self.add_sticky_panel(toolbar);
        self.refresh_toolbar();
    }

    /// Add a page; panels are listed top to bottom.
    pub fn add_page(&mut self, panels: Vec<PanelHandle>) {
        self.pages.push(panels);
        self.refresh_panels();
        self.refresh_toolbar();
    }

    /// Called with the new state whenever the interface is paused or
    /// resumed, after the panels.
    pub fn add_pause_hook(&mut self, hook: impl FnMut(bool) + 'static) {
        self.pause_hooks.push(Box::new(hook));
    }

    /// Make `key` (either case) a global key that hands `action` to the
    /// run loop's callback. Built-in global keys keep precedence.
    pub fn bind_key(&mut self, key: char, description: &str, action: PanelAction) {
        let entry = HelpEntry::new(key.to_string(), description);
        self.bindings.push((key, entry, action));
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Select page `page`, showing its panels below the sticky ones and
    /// hiding every other page.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPage`] if there is no such page.
    pub fn set_page(&mut self, page: usize) -> Result<()> {
        let count = self.page_count();
        if page >= count {
            return Err(Error::InvalidPage { page, count });
        }
        if page == self.page {
            return Ok(());
        }

        self.page = page;
        self.focus = 0;
        self.refresh_panels();
        self.refresh_toolbar();
        self.force_redraw = true;
        self.ctx.lock().clear();
        tracing::debug!(page, count, "switched page");
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::InvalidPage`] when there are no pages.
    pub fn next_page(&mut self) -> Result<()> {
        let count = self.nonzero_page_count()?;
        self.set_page((self.page + 1) % count)
    }

    /// # Errors
    ///
    /// [`Error::InvalidPage`] when there are no pages.
    pub fn prev_page(&mut self) -> Result<()> {
        let count = self.nonzero_page_count()?;
        self.set_page((self.page + count - 1) % count)
    }

    /// Show exactly the displayed panels and focus one focus-taking panel.
    ///
    /// A handle that is both sticky and on another page stays visible.
    fn refresh_panels(&mut self) {
        let displayed = self.displayed_panels();
        for panel in self.all_panels() {
            let shown = displayed.iter().any(|d| same_panel(d, &panel));
            lock(&panel).set_visible(shown);
        }

        let focusable = self.focusable_panels();
        if !focusable.is_empty() {
            self.focus %= focusable.len();
        }
        for panel in &displayed {
            let mut guard = lock(panel);
            let focused = !guard.takes_focus() || same_panel(panel, &focusable[self.focus]);
            guard.base_mut().set_focused(focused);
        }
    }

    fn focusable_panels(&self) -> Vec<PanelHandle> {
        self.displayed_panels()
            .into_iter()
            .filter(|panel| lock(panel).takes_focus())
            .collect()
    }

    /// Focus the next (or previous) displayed focus-taking panel, wrapping
    /// around. Returns whether focus moved.
    pub fn cycle_focus(&mut self, forward: bool) -> bool {
        let count = self.focusable_panels().len();
        if count < 2 {
            return false;
        }
        self.focus = if forward {
            (self.focus + 1) % count
        } else {
            (self.focus + count - 1) % count
        };
        self.refresh_panels();
        self.force_redraw = true;
        tracing::debug!(focus = self.focus, count, "focus moved");
        true
    }

    /// The displayed panel currently holding focus, if any takes it.
    #[must_use]
    pub fn focused_panel(&self) -> Option<PanelHandle> {
        self.focusable_panels().into_iter().find(|panel| lock(panel).base().is_focused())
    }

    fn nonzero_page_count(&self) -> Result<usize> {
        match self.page_count() {
            0 => Err(Error::InvalidPage { page: 0, count: 0 }),
            count => Ok(count),
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume every panel, on every page.
    ///
    /// # Errors
    ///
    /// Propagates panel errors.
    pub fn set_paused(&mut self, paused: bool) -> Result<()> {
        if paused == self.paused {
            return Ok(());
        }
        self.paused = paused;
        for panel in self.all_panels() {
            lock(&panel).set_paused(paused, true)?;
        }
        for hook in &mut self.pause_hooks {
            hook(paused);
        }
        self.force_redraw = true;
        self.refresh_toolbar();
        tracing::debug!(paused, "pause toggled");
        Ok(())
    }

    /// Sticky panels followed by the current page's panels.
    #[must_use]
    pub fn displayed_panels(&self) -> Vec<PanelHandle> {
        let page = self.pages.get(self.page).map(Vec::as_slice).unwrap_or_default();
        self.sticky.iter().chain(page).cloned().collect()
    }

    /// Every panel, sticky first then page by page.
    #[must_use]
    pub fn all_panels(&self) -> Vec<PanelHandle> {
        self.sticky.iter().chain(self.pages.iter().flatten()).cloned().collect()
    }

    /// First panel named `name`.
    #[must_use]
    pub fn panel(&self, name: &str) -> Option<PanelHandle> {
        self.all_panels().into_iter().find(|p| lock(p).name() == name)
    }

    /// Change the toolbar's default message.
    pub fn set_toolbar_message(&mut self, message: &str) {
        self.toolbar_msg = message.to_string();
        self.refresh_toolbar();
    }

    fn refresh_toolbar(&mut self) {
        let Some(toolbar) = &self.toolbar else {
            return;
        };
        let (message, style) = if self.paused {
            ("Paused".to_string(), Style::standout())
        } else if self.page_count() > 1 {
            (
                format!("page {} / {} - {}", self.page + 1, self.page_count(), self.toolbar_msg),
                Style::NONE,
            )
        } else {
            (self.toolbar_msg.clone(), Style::NONE)
        };
        toolbar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_message(message, style);
        self.force_redraw = true;
    }

    /// Make the next [`redraw`](Self::redraw) a forced one.
    pub fn request_redraw(&mut self) {
        self.force_redraw = true;
    }

    /// When content was last fully redrawn.
    #[must_use]
    pub fn last_redraw(&self) -> Option<Instant> {
        self.last_drawn
    }

    /// Help entries of the panels that currently receive keys.
    #[must_use]
    pub fn help_entries(&self) -> Vec<HelpEntry> {
        let mut entries: Vec<_> = self
            .displayed_panels()
            .iter()
            .filter(|panel| lock(panel).base().is_focused())
            .flat_map(|panel| lock(panel).help())
            .collect();
        if self.focusable_panels().len() > 1 {
            entries.push(HelpEntry::new("tab", "switch panel"));
        }
        entries.extend(self.bindings.iter().map(|(_, entry, _)| entry.clone()));
        entries
    }

    /// Lay out the displayed panels top to bottom and redraw them.
    ///
    /// The redraw is forced when asked to, when something requested it, or
    /// when [`REFRESH_RATE`] passed since the last forced redraw.
    ///
    /// # Errors
    ///
    /// Propagates panel drawing errors.
    pub fn redraw(&mut self, force: bool) -> Result<()> {
        let mut force = force || std::mem::take(&mut self.force_redraw) || self.ctx.take_redraw_request();
        let now = Instant::now();
        if self
            .last_drawn
            .is_none_or(|drawn| now.duration_since(drawn) >= REFRESH_RATE)
        {
            force = true;
        }

        let displayed = self.displayed_panels();
        let mut offset = 0u32;
        let mut status_row = None;
        let toolbar_ptr = self.toolbar.as_ref().map(|t| Arc::as_ptr(t).cast::<()>());
        for (index, handle) in displayed.iter().enumerate() {
            let mut panel = lock(handle);
            panel.base_mut().set_top(offset);
            let height = panel.preferred_size().0;
            if height > 0 && toolbar_ptr == Some(Arc::as_ptr(handle).cast::<()>()) {
                status_row = Some(offset);
            }
            offset = offset.saturating_add(height);
            if index + 1 == self.sticky.len() {
                self.ctx.set_popup_top(offset);
            }
        }
        self.ctx.set_status_row(status_row);

        for panel in &displayed {
            lock(panel).redraw(force, true)?;
        }
        if force {
            self.last_drawn = Some(now);
        }
        Ok(())
    }

    /// Move bridged messages into every displayed panel. Returns how many
    /// were moved.
    pub fn flush_bridges(&mut self) -> usize {
        self.displayed_panels()
            .iter()
            .map(|panel| lock(panel).flush_inbound())
            .sum()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// End the loop after the current key is handled.
    pub fn quit(&mut self) {
        self.done = true;
    }

    /// Run the event loop until [`quit`](Self::quit).
    ///
    /// Panel actions are handed to `on_action` together with the
    /// controller, so the callback can switch pages or quit.
    ///
    /// # Errors
    ///
    /// Input errors and errors from panels or `on_action`.
    pub fn run<F>(&mut self, input: &mut dyn InputSource, mut on_action: F) -> Result<()>
    where
        F: FnMut(&mut Self, PanelAction) -> Result<()>,
    {
        tracing::info!(pages = self.page_count(), "event loop started");
        while !self.done {
            let flushed = self.flush_bridges();
            self.redraw(flushed > 0)?;

            let mut modal = BlockingInput::new(input);
            let event = modal.poll(Some(REFRESH_RATE))?;
            let action = match event {
                Some(Event::Key(key)) => self.dispatch(&key, &mut modal)?,
                // Resizes, including ones seen by popups, are picked up below.
                Some(Event::Resize(_)) | None => None,
            };
            if let Some(resize) = modal.take_resize() {
                self.apply_resize(resize);
            }
            drop(modal);

            if let Some(action) = action {
                tracing::debug!(?action, "panel action");
                on_action(self, action)?;
            }
        }
        tracing::info!("event loop finished");
        Ok(())
    }

    fn apply_resize(&mut self, resize: ResizeEvent) {
        self.ctx.resize(u32::from(resize.width), u32::from(resize.height));
        self.force_redraw = true;
    }

    /// Handle one key: global keys first, then the focused displayed panels
    /// top to bottom until one consumes it.
    ///
    /// # Errors
    ///
    /// Propagates panel and popup errors.
    pub fn dispatch(&mut self, key: &KeyEvent, modal: &mut dyn ModalInput) -> Result<Option<PanelAction>> {
        if key.is_ctrl('l') {
            self.ctx.lock().invalidate();
            self.force_redraw = true;
            return Ok(None);
        }
        if key.is(KeyCode::Left) || key.is(KeyCode::Right) {
            if self.page_count() > 0 {
                if key.is(KeyCode::Left) {
                    self.prev_page()?;
                } else {
                    self.next_page()?;
                }
            }
            return Ok(None);
        }
        if (key.is(KeyCode::Tab) || key.is(KeyCode::BackTab)) && self.cycle_focus(key.is(KeyCode::Tab)) {
            return Ok(None);
        }
        match key.plain_char() {
            Some('q') => {
                self.quit();
                return Ok(None);
            }
            Some('p') => {
                self.set_paused(!self.paused)?;
                return Ok(None);
            }
            Some('a') => {
                popups::show_about(&self.ctx, modal)?;
                return Ok(None);
            }
            Some('h') => {
                let entries = self.help_entries();
                let follow_up = popups::show_help(&self.ctx, modal, self.page, &entries)?;
                self.force_redraw = true;
                return match follow_up {
                    Some(next) if next.plain_char() != Some('h') => self.dispatch(&next, modal),
                    _ => Ok(None),
                };
            }
            Some(c) => {
                let bound = self.bindings.iter().find(|(key, _, _)| key.eq_ignore_ascii_case(&c));
                if let Some((_, _, action)) = bound {
                    return Ok(Some(action.clone()));
                }
            }
            None => {}
        }

        for panel in self.displayed_panels() {
            let mut panel = lock(&panel);
            if !panel.base().is_focused() {
                continue;
            }
            let outcome = panel.handle_key(key, modal)?;
            match outcome {
                KeyOutcome::Ignored => {}
                KeyOutcome::Consumed => return Ok(None),
                KeyOutcome::Action(action) => return Ok(Some(action)),
            }
        }
        Ok(None)
    }

    /// Halt drawing and stop every panel that runs a thread.
    ///
    /// Every worker is asked to stop even if an earlier one fails; the first
    /// failure is returned.
    ///
    /// # Errors
    ///
    /// [`Error::Worker`] for a worker that failed or did not stop in time.
    pub fn shutdown(&mut self) -> Result<()> {
        self.ctx.halt();
        let mut first_error = None;
        for panel in self.all_panels() {
            let mut panel = lock(&panel);
            let name = panel.name().to_string();
            let Some(worker) = panel.as_background_worker() else {
                continue;
            };
            if let Err(err) = worker.stop() {
                tracing::warn!(panel = %name, error = %err, "background worker did not stop cleanly");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("sticky", &self.sticky.len())
            .field("pages", &self.pages.len())
            .field("page", &self.page)
            .field("paused", &self.paused)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
