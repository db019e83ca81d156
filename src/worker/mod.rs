//! Background work: shell commands and the step chains built from them.
//!
//! Workers run on their own threads and never draw. Everything they have to
//! say goes through an [`OutputSink`], which forwards to a panel's Async
//! Bridge. The event loop talks back through a [`WorkerControl`]: a
//! cooperative stop flag and a pause flag that suspends running commands.

mod command;
mod setup;
mod steps;

pub use command::{run_command, shell_quote};
pub use setup::{auto_setup, fetch_archive, interactive_setup, uninstall};
pub use steps::{ChainOutcome, ERROR_BANNER, Step, StepChain, StepContext, run_commands};

use crate::bridge::BridgeSender;
use crate::error::{Error, Result};
use crate::log::LogSender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long [`WorkerThread::stop`] waits for the thread to exit.
pub const STOP_WAIT: Duration = Duration::from_secs(5);

/// Somewhere for a worker to put lines of text.
pub trait OutputSink: Send + Sync {
    fn line(&self, line: &str);
}

impl OutputSink for BridgeSender<String> {
    fn line(&self, line: &str) {
        self.put(line.to_string());
    }
}

/// Lines become INFO entries.
impl OutputSink for LogSender {
    fn line(&self, line: &str) {
        self.info(line);
    }
}

/// Stop and pause flags shared between the event loop and a worker.
#[derive(Clone, Debug, Default)]
pub struct WorkerControl {
    stop: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl WorkerControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the worker to finish. Running commands are killed.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Suspend or resume running commands.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// A named worker thread with its control flags.
#[derive(Debug)]
pub struct WorkerThread {
    name: String,
    control: WorkerControl,
    handle: Option<JoinHandle<()>>,
}

impl WorkerThread {
    /// Run `work` on a new thread.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the thread cannot be spawned.
    pub fn spawn<F>(name: &str, control: WorkerControl, work: F) -> Result<Self>
    where
        F: FnOnce(WorkerControl) + Send + 'static,
    {
        let thread_control = control.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || work(thread_control))?;
        tracing::info!(worker = name, "started worker");
        Ok(Self {
            name: name.to_string(),
            control,
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn control(&self) -> &WorkerControl {
        &self.control
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Set the stop flag and join, waiting at most [`STOP_WAIT`].
    ///
    /// # Errors
    ///
    /// [`Error::Worker`] if the thread panicked or is still running at the
    /// deadline. A thread that outlives the deadline is left detached.
    pub fn stop(&mut self) -> Result<()> {
        self.control.stop();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let deadline = Instant::now() + STOP_WAIT;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                self.handle = Some(handle);
                return Err(Error::Worker {
                    name: self.name.clone(),
                    reason: format!("did not stop within {STOP_WAIT:?}"),
                });
            }
            thread::sleep(Duration::from_millis(10));
        }
        handle.join().map_err(|_| Error::Worker {
            name: self.name.clone(),
            reason: "thread panicked".to_string(),
        })?;
        tracing::info!(worker = %self.name, "stopped worker");
        Ok(())
    }
}
