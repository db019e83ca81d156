//! Panels: independently drawn regions of the shared surface.
//!
//! A panel owns a [`PanelBase`] (geometry, visibility, pause state and its
//! subregion) and implements [`Panel::draw`] for its content. Everything
//! else, including the redraw protocol, comes from the trait's provided
//! methods.
//!
//! # Subregions
//!
//! A panel's subregion is the rectangle it last drew into. It starts out
//! absent and is (re)bound lazily on the next redraw after:
//! - a geometry change (`set_top`, `set_left`, `set_height`, `set_width`)
//! - vertical growth of the parent
//! - displacement of the anchor
//! - shrinking in either dimension
//!
//! Horizontal growth is adopted in place. A rebinding always forces the
//! content to be redrawn. A zero-sized preferred area releases the
//! subregion and draws nothing.
//!
//! # Focus
//!
//! Panels that answer to the same keys (two scrolling panels on one page)
//! return `true` from [`Panel::takes_focus`]. The controller keeps exactly
//! one of them focused per page and only offers keys to focused panels.
//! Every other panel stays focused.

mod canvas;
mod control;
mod field;
mod label;
mod modal;
mod options;
mod output;
mod popup;
mod tracked;

pub use canvas::{Canvas, ScrollBar};
pub use control::{Control, ControlPanel};
pub use field::{BasicInterceptor, FieldStatus, HistoryInterceptor, Intercept, KeyInterceptor, TextField};
pub use label::LabelPanel;
pub use modal::{BlockingInput, ModalInput};
pub use options::{OptionItem, OptionPanel, Validator};
pub use output::OutputPanel;
pub use popup::PopupPanel;
pub use tracked::Tracked;

use crate::buffer::ClipRect;
use crate::context::UiContext;
use crate::error::Result;
use crate::input::KeyEvent;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Upper bound on back-to-back corrective redraws in one `redraw` call.
const MAX_CORRECTIVE_REDRAWS: usize = 2;

/// A size cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Extent {
    /// Use all the space the parent offers.
    #[default]
    Unbounded,
    /// At most this many cells.
    Fixed(u32),
}

impl Extent {
    fn clamp(self, available: u32) -> u32 {
        match self {
            Self::Unbounded => available,
            Self::Fixed(cap) => available.min(cap),
        }
    }
}

/// Something a panel asks its owner to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelAction {
    /// A named control was chosen.
    Select(String),
    /// Leave this step.
    Back,
    /// Accept this step.
    Next,
}

/// Result of offering a key to a panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not for this panel.
    #[default]
    Ignored,
    /// Handled.
    Consumed,
    /// Handled, and the owner should act on it.
    Action(PanelAction),
}

impl KeyOutcome {
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// One line of the help popup: `key: description[ (selection)]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelpEntry {
    pub key: String,
    pub description: String,
    pub selection: Option<String>,
}

impl HelpEntry {
    #[must_use]
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            selection: None,
        }
    }

    #[must_use]
    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }
}

/// A panel that runs its own thread.
///
/// The controller stops every such panel on shutdown. Stopping must be
/// cooperative: signal, then join.
pub trait BackgroundWorker {
    /// Start the thread. Starting twice is a no-op.
    fn start(&mut self) -> Result<()>;
    /// Ask the thread to stop and wait for it.
    fn stop(&mut self) -> Result<()>;
    fn is_running(&self) -> bool;
}

/// Shared handle to a panel.
pub type PanelHandle = Arc<Mutex<dyn Panel>>;

/// Wrap a panel in a [`PanelHandle`].
pub fn share<P: Panel + 'static>(panel: P) -> Arc<Mutex<P>> {
    Arc::new(Mutex::new(panel))
}

/// State common to all panels.
#[derive(Debug)]
pub struct PanelBase {
    ctx: UiContext,
    name: String,
    top: u32,
    left: u32,
    height: Extent,
    width: Extent,
    visible: bool,
    title_visible: bool,
    focused: bool,
    paused: bool,
    pause_time: Option<SystemTime>,
    subregion: Option<ClipRect>,
    last_dims: Option<(u32, u32)>,
}

impl PanelBase {
    /// A hidden panel anchored at `(top, left)` filling the available space.
    pub fn new(ctx: UiContext, name: impl Into<String>, top: u32, left: u32) -> Self {
        Self {
            ctx,
            name: name.into(),
            top,
            left,
            height: Extent::Unbounded,
            width: Extent::Unbounded,
            visible: false,
            title_visible: true,
            focused: true,
            paused: false,
            pause_time: None,
            subregion: None,
            last_dims: None,
        }
    }

    #[must_use]
    pub fn with_height(mut self, height: Extent) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: Extent) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn context(&self) -> &UiContext {
        &self.ctx
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[must_use]
    pub fn is_title_visible(&self) -> bool {
        self.title_visible
    }

    pub fn set_title_visible(&mut self, visible: bool) {
        self.title_visible = visible;
    }

    /// Whether keys reach this panel. Panels start out focused.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// When the panel was last paused.
    #[must_use]
    pub fn pause_time(&self) -> Option<SystemTime> {
        self.pause_time
    }

    #[must_use]
    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn set_top(&mut self, top: u32) {
        if self.top != top {
            self.top = top;
            self.subregion = None;
        }
    }

    #[must_use]
    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn set_left(&mut self, left: u32) {
        if self.left != left {
            self.left = left;
            self.subregion = None;
        }
    }

    #[must_use]
    pub fn height(&self) -> Extent {
        self.height
    }

    pub fn set_height(&mut self, height: Extent) {
        if self.height != height {
            self.height = height;
            self.subregion = None;
        }
    }

    #[must_use]
    pub fn width(&self) -> Extent {
        self.width
    }

    pub fn set_width(&mut self, width: Extent) {
        if self.width != width {
            self.width = width;
            self.subregion = None;
        }
    }

    /// The subregion last bound, if any.
    #[must_use]
    pub fn subregion(&self) -> Option<ClipRect> {
        self.subregion
    }

    /// `(height, width)` the panel would get if redrawn now.
    #[must_use]
    pub fn preferred_size(&self) -> (u32, u32) {
        let (parent_width, parent_height) = self.ctx.size();
        let height = self.height.clamp(parent_height.saturating_sub(self.top));
        let width = self.width.clamp(parent_width.saturating_sub(self.left));
        (height, width)
    }

    /// Record a pause transition. Returns whether the state changed.
    fn transition_pause(&mut self, paused: bool) -> bool {
        if self.paused == paused {
            return false;
        }
        if paused {
            self.pause_time = Some(SystemTime::now());
        }
        self.paused = paused;
        true
    }

    /// Bind the subregion for a `(height, width)` area. Returns whether a
    /// new one was created.
    fn reset_subregion(&mut self, height: u32, width: u32) -> bool {
        let recreate = match self.subregion {
            None => true,
            Some(region) => {
                region.height < height
                    || region.y != self.top
                    || region.x != self.left
                    || region.width > width
                    || region.height > height
            }
        };

        if recreate {
            self.subregion = Some(ClipRect::new(self.left, self.top, width, height));
            tracing::trace!(panel = %self.name, height, width, "recreating subregion");
        } else if let Some(region) = &mut self.subregion {
            region.width = width;
        }
        recreate
    }

    /// Run the subregion state machine ahead of a redraw.
    ///
    /// Returns the region and whether content must be redrawn, or `None`
    /// when there is nothing to draw.
    fn prepare(&mut self, force: bool) -> Option<(ClipRect, bool)> {
        if !self.visible || self.ctx.is_halted() {
            return None;
        }
        let (height, width) = self.preferred_size();
        if height == 0 || width == 0 {
            if self.subregion.take().is_some() {
                tracing::trace!(panel = %self.name, "released subregion");
            }
            return None;
        }

        let recreated = self.reset_subregion(height, width);
        let region = self.subregion?;
        let dims = (region.height, region.width);
        Some((region, force || recreated || self.last_dims != Some(dims)))
    }
}

/// A drawable, keyboard-driven region of the surface.
pub trait Panel: Send {
    fn base(&self) -> &PanelBase;
    fn base_mut(&mut self) -> &mut PanelBase;

    /// Draw the content into a freshly erased subregion.
    ///
    /// Only called from [`redraw`](Self::redraw) with the Surface Lock held.
    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()>;

    /// Offer a key to the panel.
    fn handle_key(&mut self, _key: &KeyEvent, _modal: &mut dyn ModalInput) -> Result<KeyOutcome> {
        Ok(KeyOutcome::Ignored)
    }

    /// Whether this panel shares its keys with other panels on a page and
    /// needs focus to receive them.
    fn takes_focus(&self) -> bool {
        false
    }

    /// Entries for the help popup.
    fn help(&self) -> Vec<HelpEntry> {
        Vec::new()
    }

    /// Snapshot or release tracked fields. Called on every pause
    /// transition, before the redraw.
    fn on_pause(&mut self, _paused: bool) {}

    /// Move queued messages from an Async Bridge into the panel's own
    /// state. Returns how many were moved.
    fn flush_inbound(&mut self) -> usize {
        0
    }

    /// Whether the last draw found its own layout estimate stale and wants
    /// another pass right away. Reading the flag clears it.
    fn take_redraw_request(&mut self) -> bool {
        false
    }

    /// This panel's thread control, if it runs one.
    fn as_background_worker(&mut self) -> Option<&mut dyn BackgroundWorker> {
        None
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn is_visible(&self) -> bool {
        self.base().is_visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.base_mut().set_visible(visible);
    }

    fn preferred_size(&self) -> (u32, u32) {
        self.base().preferred_size()
    }

    /// Pause or resume. Returns whether the state changed.
    ///
    /// Tracked fields are snapshotted on pause. The panel is redrawn
    /// (forced, non-blocking) unless `suppress_redraw` is set.
    fn set_paused(&mut self, paused: bool, suppress_redraw: bool) -> Result<bool> {
        if !self.base_mut().transition_pause(paused) {
            return Ok(false);
        }
        self.on_pause(paused);
        if !suppress_redraw {
            self.redraw(true, false)?;
        }
        Ok(true)
    }

    /// Redraw the panel.
    ///
    /// Content is only redrawn when `force` is set or the subregion changed;
    /// otherwise the surface is just presented. With `block == false` a
    /// contended Surface Lock skips this redraw entirely.
    fn redraw(&mut self, force: bool, block: bool) -> Result<()> {
        let mut force = force;
        for _ in 0..=MAX_CORRECTIVE_REDRAWS {
            let Some((region, force_content)) = self.base_mut().prepare(force) else {
                return Ok(());
            };
            let ctx = self.base().context().clone();
            let Some(mut surface) = ctx.acquire(block) else {
                return Ok(());
            };

            if force_content {
                let mut canvas = Canvas::new(&mut surface, region);
                canvas.erase();
                self.draw(&mut canvas)?;
            }
            self.base_mut().last_dims = Some((region.height, region.width));
            surface.present()?;
            drop(surface);

            if !self.take_redraw_request() {
                break;
            }
            force = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Surface;

    struct CountingPanel {
        base: PanelBase,
        draws: usize,
        seen: Tracked<u32>,
        corrections: usize,
    }

    impl CountingPanel {
        fn new(ctx: &UiContext, top: u32) -> Self {
            let mut base = PanelBase::new(ctx.clone(), "counting", top, 0);
            base.set_visible(true);
            Self {
                base,
                draws: 0,
                seen: Tracked::new(0),
                corrections: 0,
            }
        }
    }

    impl Panel for CountingPanel {
        fn base(&self) -> &PanelBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut PanelBase {
            &mut self.base
        }

        fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
            self.draws += 1;
            canvas.addstr(0, 0, &format!("value {}", self.seen.get()), crate::Style::NONE);
            Ok(())
        }

        fn on_pause(&mut self, paused: bool) {
            self.seen.set_paused(paused);
        }

        fn take_redraw_request(&mut self) -> bool {
            if self.corrections > 0 {
                self.corrections -= 1;
                return true;
            }
            false
        }
    }

    #[test]
    fn test_preferred_size_clamps() {
        let ctx = UiContext::headless(40, 10);
        let base = PanelBase::new(ctx.clone(), "p", 3, 5).with_height(Extent::Fixed(4));
        assert_eq!(base.preferred_size(), (4, 35));

        let below = PanelBase::new(ctx, "p", 12, 0);
        assert_eq!(below.preferred_size(), (0, 40));
    }

    #[test]
    fn test_panels_start_focused_without_taking_focus() {
        let ctx = UiContext::headless(20, 5);
        let panel = CountingPanel::new(&ctx, 0);
        assert!(panel.base.is_focused());
        assert!(!panel.takes_focus());
    }

    #[test]
    fn test_first_redraw_binds_and_draws() {
        let ctx = UiContext::headless(20, 5);
        let mut panel = CountingPanel::new(&ctx, 1);
        panel.redraw(false, true).unwrap();
        assert_eq!(panel.draws, 1);
        assert_eq!(panel.base.subregion(), Some(ClipRect::new(0, 1, 20, 4)));
        assert!(ctx.lock().buffer().row_text(1).starts_with("value 0"));

        // Unchanged: only presented.
        panel.redraw(false, true).unwrap();
        assert_eq!(panel.draws, 1);
    }

    #[test]
    fn test_invisible_panel_never_draws() {
        let ctx = UiContext::headless(20, 5);
        let mut panel = CountingPanel::new(&ctx, 0);
        panel.set_visible(false);
        panel.redraw(true, true).unwrap();
        assert_eq!(panel.draws, 0);
        assert!(panel.base.subregion().is_none());
    }

    #[test]
    fn test_zero_height_releases_subregion() {
        let ctx = UiContext::headless(40, 10);
        let mut panel = CountingPanel::new(&ctx, 4);
        panel.redraw(true, true).unwrap();
        assert!(panel.base.subregion().is_some());

        ctx.resize(40, 4);
        assert_eq!(panel.preferred_size(), (0, 40));
        panel.redraw(true, true).unwrap();
        assert!(panel.base.subregion().is_none());
        assert_eq!(panel.draws, 1);
    }

    #[test]
    fn test_resize_transitions() {
        let ctx = UiContext::headless(20, 5);
        let mut panel = CountingPanel::new(&ctx, 0);
        panel.redraw(false, true).unwrap();

        // Horizontal growth is adopted in place but still redraws content.
        ctx.resize(30, 5);
        panel.redraw(false, true).unwrap();
        assert_eq!(panel.base.subregion(), Some(ClipRect::new(0, 0, 30, 5)));
        assert_eq!(panel.draws, 2);

        // Vertical growth recreates.
        ctx.resize(30, 8);
        panel.redraw(false, true).unwrap();
        assert_eq!(panel.base.subregion(), Some(ClipRect::new(0, 0, 30, 8)));
        assert_eq!(panel.draws, 3);

        // Moving the anchor invalidates.
        panel.base_mut().set_top(2);
        assert!(panel.base.subregion().is_none());
        panel.redraw(false, true).unwrap();
        assert_eq!(panel.base.subregion(), Some(ClipRect::new(0, 2, 30, 6)));
    }

    #[test]
    fn test_halted_context_blocks_drawing() {
        let ctx = UiContext::headless(20, 5);
        let mut panel = CountingPanel::new(&ctx, 0);
        ctx.halt();
        panel.redraw(true, true).unwrap();
        assert_eq!(panel.draws, 0);
    }

    #[test]
    fn test_contended_non_blocking_redraw_is_skipped() {
        let ctx = UiContext::headless(20, 5);
        let mut panel = CountingPanel::new(&ctx, 0);
        let guard = ctx.lock();
        let handle = std::thread::spawn(move || {
            panel.redraw(true, false).unwrap();
            panel.draws
        });
        let draws = handle.join().unwrap();
        drop(guard);
        assert_eq!(draws, 0);
    }

    #[test]
    fn test_pause_freezes_tracked_value() {
        let ctx = UiContext::headless(20, 5);
        let mut panel = CountingPanel::new(&ctx, 0);
        panel.seen.set(1);

        assert!(panel.set_paused(true, false).unwrap());
        assert!(!panel.set_paused(true, false).unwrap());
        assert!(panel.base.pause_time().is_some());
        panel.seen.set(2);
        assert_eq!(*panel.seen.get(), 1);
        assert!(ctx.lock().buffer().row_text(0).starts_with("value 1"));

        assert!(panel.set_paused(false, true).unwrap());
        assert_eq!(*panel.seen.get(), 2);
    }

    #[test]
    fn test_corrective_redraws_are_bounded() {
        let ctx = UiContext::headless(20, 5);
        let mut panel = CountingPanel::new(&ctx, 0);
        panel.corrections = 10;
        panel.redraw(false, true).unwrap();
        assert_eq!(panel.draws, 1 + MAX_CORRECTIVE_REDRAWS);
    }

    #[test]
    fn test_independent_contexts() {
        let a = UiContext::new(Surface::headless(20, 5));
        let b = UiContext::new(Surface::headless(20, 5));
        let mut pa = CountingPanel::new(&a, 0);
        pa.redraw(true, true).unwrap();
        assert!(b.lock().buffer().row_text(0).trim().is_empty());
    }
}
