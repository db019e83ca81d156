//! The shared UI context: the Surface Lock and the halt flag.
//!
//! Every panel and the controller hold a cheap clone of [`UiContext`].
//! There is no process-wide singleton, so several independent UIs (one per
//! test, say) can coexist in a process.
//!
//! # Locking
//!
//! [`UiContext::acquire`] is the only way to reach the [`Surface`]. A panel
//! that also has its own state lock must take that lock first and the
//! surface lock second, never the reverse.
//!
//! The context also carries the little layout state popups need: how many
//! rows the sticky panels occupy and which row holds the status line.

use crate::renderer::Surface;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

struct Shared {
    surface: Mutex<Surface>,
    halted: AtomicBool,
    width: AtomicU32,
    height: AtomicU32,
    popup_top: AtomicU32,
    status_row: AtomicU32,
    redraw_requested: AtomicBool,
}

const NO_STATUS_ROW: u32 = u32::MAX;

/// Handle to a shared terminal surface.
#[derive(Clone)]
pub struct UiContext {
    shared: Arc<Shared>,
}

impl UiContext {
    #[must_use]
    pub fn new(surface: Surface) -> Self {
        let (width, height) = surface.size();
        Self {
            shared: Arc::new(Shared {
                surface: Mutex::new(surface),
                halted: AtomicBool::new(false),
                width: AtomicU32::new(width),
                height: AtomicU32::new(height),
                popup_top: AtomicU32::new(0),
                status_row: AtomicU32::new(NO_STATUS_ROW),
                redraw_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Context over a surface that writes nowhere.
    #[must_use]
    pub fn headless(width: u32, height: u32) -> Self {
        Self::new(Surface::headless(width, height))
    }

    /// Take the Surface Lock.
    ///
    /// With `block == false` a contended lock returns `None` immediately.
    /// A lock poisoned by a panicking drawer is recovered; the surface only
    /// holds cells, so a half-drawn frame is repaired by the next redraw.
    #[must_use]
    pub fn acquire(&self, block: bool) -> Option<MutexGuard<'_, Surface>> {
        if block {
            return Some(
                self.shared
                    .surface
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
        }
        match self.shared.surface.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Take the Surface Lock, blocking.
    #[must_use]
    pub fn lock(&self) -> MutexGuard<'_, Surface> {
        self.shared
            .surface
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current surface size as `(width, height)`, readable without the lock.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (
            self.shared.width.load(Ordering::Acquire),
            self.shared.height.load(Ordering::Acquire),
        )
    }

    /// Resize the surface. Every panel sees the new parent size on its next
    /// redraw.
    pub fn resize(&self, width: u32, height: u32) {
        let mut surface = self.lock();
        surface.resize(width, height);
        self.shared.width.store(width, Ordering::Release);
        self.shared.height.store(height, Ordering::Release);
        tracing::debug!(width, height, "surface resized");
    }

    /// Stop all drawing. Used on shutdown so background redraws cannot
    /// paint over the restored terminal.
    pub fn halt(&self) {
        self.shared.halted.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.shared.halted.load(Ordering::Acquire)
    }

    /// First row below the sticky panels, where popups open.
    #[must_use]
    pub fn popup_top(&self) -> u32 {
        self.shared.popup_top.load(Ordering::Acquire)
    }

    pub fn set_popup_top(&self, row: u32) {
        self.shared.popup_top.store(row, Ordering::Release);
    }

    /// Row of the one-line status area used for transient messages.
    #[must_use]
    pub fn status_row(&self) -> Option<u32> {
        match self.shared.status_row.load(Ordering::Acquire) {
            NO_STATUS_ROW => None,
            row => Some(row),
        }
    }

    pub fn set_status_row(&self, row: Option<u32>) {
        self.shared
            .status_row
            .store(row.unwrap_or(NO_STATUS_ROW), Ordering::Release);
    }

    /// Ask the owner of the event loop for a full, forced redraw. Popups
    /// call this when they close.
    pub fn request_redraw(&self) {
        self.shared.redraw_requested.store(true, Ordering::Release);
    }

    /// Read and clear the redraw request.
    pub fn take_redraw_request(&self) -> bool {
        self.shared.redraw_requested.swap(false, Ordering::AcqRel)
    }

    /// Whether two handles refer to the same surface.
    #[must_use]
    pub fn same_surface(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.size();
        f.debug_struct("UiContext")
            .field("width", &width)
            .field("height", &height)
            .field("halted", &self.is_halted())
            .finish()
    }
}
