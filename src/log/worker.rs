//! The log panel's background redraw thread.
//!
//! New entries may arrive many times a second. The thread batches them so
//! the panel redraws at most about once a second, and sleeps while the
//! panel is paused or nothing changed.

use super::LogPanel;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::{Condvar, Mutex, PoisonError, TryLockError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Wait while the panel is busy on the event-loop thread.
const BUSY_RETRY: Duration = Duration::from_millis(50);

#[derive(Debug, Default)]
struct SignalState {
    halt: bool,
    wake: bool,
}

/// Wakeup and stop flags shared by the panel, its senders and its thread.
#[derive(Debug, Default)]
pub(crate) struct RedrawSignal {
    state: Mutex<SignalState>,
    cond: Condvar,
}

impl RedrawSignal {
    /// Cut the current wait short.
    pub(crate) fn wake(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.wake = true;
        self.cond.notify_all();
    }

    /// Ask the thread to exit.
    pub(crate) fn halt(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.halt = true;
        self.cond.notify_all();
    }

    /// Clear the stop flag ahead of a restart.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = SignalState::default();
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).halt
    }

    /// Sleep up to `timeout` or until woken. Returns whether the thread
    /// should exit.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while !state.halt && !state.wake {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            state = self
                .cond
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        state.wake = false;
        state.halt
    }
}

/// Spawn the redraw thread for `panel`.
///
/// The thread only holds a weak handle and only ever `try_lock`s the panel,
/// so the owner can stop and join it while holding the panel lock.
pub(crate) fn spawn(
    name: &str,
    panel: Weak<Mutex<LogPanel>>,
    signal: std::sync::Arc<RedrawSignal>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{name}-redraw"))
        .spawn(move || {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| run(&panel, &signal)));
            if let Err(payload) = result {
                tracing::error!(panic = %panic_message(payload.as_ref()), "log redraw thread panicked");
            }
        })
}

fn run(panel: &Weak<Mutex<LogPanel>>, signal: &RedrawSignal) {
    tracing::debug!("log redraw thread started");
    while !signal.is_halted() {
        let Some(panel) = panel.upgrade() else {
            break;
        };
        let wait = match panel.try_lock() {
            Ok(mut panel) => panel.redraw_tick(),
            Err(TryLockError::WouldBlock) => Some(BUSY_RETRY),
            Err(TryLockError::Poisoned(_)) => break,
        };
        drop(panel);

        if let Some(wait) = wait {
            if signal.wait(wait) {
                break;
            }
        }
    }
    tracing::debug!("log redraw thread stopped");
}

fn panic_message(payload: &dyn std::any::Any) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "log redraw thread panicked".to_string())
}
