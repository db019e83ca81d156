//! Named steps run in order until one fails.

use super::{OutputSink, WorkerControl, run_command};
use crate::error::{Error, Result};
use crate::log::LogSender;
use std::fmt;
use std::path::{Path, PathBuf};

/// Shown in the output after a failed step.
pub const ERROR_BANNER: &str = "**There was an ERROR. Check the log.";

/// Where a running step reports to.
pub struct StepContext<'a> {
    /// User-facing log.
    pub log: &'a LogSender,
    /// Raw command output.
    pub output: &'a dyn OutputSink,
    pub control: &'a WorkerControl,
}

type Action = Box<dyn FnOnce(&StepContext<'_>) -> Result<()> + Send>;

/// One unit of work in a [`StepChain`].
pub struct Step {
    name: String,
    action: Action,
}

impl Step {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce(&StepContext<'_>) -> Result<()> + Send + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(action),
        }
    }

    /// Run `commands` in `cwd` one after another; any non-zero exit fails
    /// the step.
    pub fn commands(name: impl Into<String>, cwd: Option<PathBuf>, commands: Vec<String>) -> Self {
        let name = name.into();
        let step_name = name.clone();
        Self::new(name, move |ctx| run_commands(&step_name, cwd.as_deref(), &commands, ctx))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Run `commands` in order, failing on the first non-zero exit.
///
/// # Errors
///
/// [`Error::Worker`] naming `step` for a non-zero exit, and whatever
/// [`run_command`] returns.
pub fn run_commands(step: &str, cwd: Option<&Path>, commands: &[String], ctx: &StepContext<'_>) -> Result<()> {
    for command in commands {
        let code = run_command(command, cwd, ctx.output, ctx.control)?;
        if code != 0 {
            return Err(Error::Worker {
                name: step.to_string(),
                reason: format!("'{command}' returned {code}"),
            });
        }
    }
    Ok(())
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish_non_exhaustive()
    }
}

/// How a chain ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainOutcome {
    Completed,
    /// The named step failed; later steps did not run.
    Failed { step: String },
    /// The worker was stopped.
    Stopped,
}

/// Steps run in order, halting at the first failure.
#[derive(Debug)]
pub struct StepChain {
    name: String,
    steps: Vec<Step>,
}

impl StepChain {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(Step::name)
    }

    /// Run every step.
    ///
    /// A failure is logged as an ERROR entry naming the step, and
    /// [`ERROR_BANNER`] is written to the output. A step failing because the
    /// worker was stopped counts as stopped, not failed.
    pub fn run(self, ctx: &StepContext<'_>) -> ChainOutcome {
        ctx.log.info(&format!("Starting {}", self.name));
        for step in self.steps {
            if ctx.control.is_stopped() {
                ctx.log.info(&format!("{} stopped", self.name));
                return ChainOutcome::Stopped;
            }
            ctx.log.debug(&format!("Running step: {}", step.name));
            if let Err(err) = (step.action)(ctx) {
                if ctx.control.is_stopped() {
                    ctx.log.info(&format!("{} stopped during {}", self.name, step.name));
                    return ChainOutcome::Stopped;
                }
                tracing::warn!(chain = %self.name, step = %step.name, error = %err, "step failed");
                ctx.log.error(&format!("{}: {err}", step.name));
                ctx.output.line(ERROR_BANNER);
                return ChainOutcome::Failed { step: step.name };
            }
        }
        ctx.log.info(&format!("{} complete", self.name));
        ChainOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AsyncBridge;
    use crate::context::UiContext;
    use crate::log::{LogLevel, LogPanel};
    use crate::panel::Panel;
    use std::sync::{Arc, Mutex};

    fn chain_with_log(chain: StepChain, control: &WorkerControl) -> (ChainOutcome, Vec<String>, Vec<String>) {
        let mut log = LogPanel::new(UiContext::headless(60, 10), 0, LogLevel::Debug, 100);
        let output = AsyncBridge::new();
        let sender = log.sender();
        let outcome = chain.run(&StepContext {
            log: &sender,
            output: &output.sender(),
            control,
        });
        log.flush_inbound();
        let entries = log.entries().map(|e| format!("{} {}", e.level(), e.message())).collect();
        (outcome, entries, output.drain())
    }

    #[test]
    fn test_steps_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (a, b) = (Arc::clone(&seen), Arc::clone(&seen));
        let chain = StepChain::new("Setup")
            .with(Step::new("first", move |_| {
                a.lock().unwrap().push("first");
                Ok(())
            }))
            .with(Step::new("second", move |_| {
                b.lock().unwrap().push("second");
                Ok(())
            }));
        assert_eq!(chain.step_names().collect::<Vec<_>>(), ["first", "second"]);

        let (outcome, _, output) = chain_with_log(chain, &WorkerControl::new());
        assert_eq!(outcome, ChainOutcome::Completed);
        assert_eq!(*seen.lock().unwrap(), ["first", "second"]);
        assert!(output.is_empty());
    }

    #[test]
    fn test_first_failure_halts_chain() {
        let ran_after = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran_after);
        let chain = StepChain::new("Setup")
            .with(Step::commands("build", None, vec!["true".into(), "exit 2".into()]))
            .with(Step::new("install", move |_| {
                *flag.lock().unwrap() = true;
                Ok(())
            }));

        let (outcome, entries, output) = chain_with_log(chain, &WorkerControl::new());
        assert_eq!(outcome, ChainOutcome::Failed { step: "build".into() });
        assert!(!*ran_after.lock().unwrap());
        assert!(entries.iter().any(|e| e.starts_with("ERROR build:") && e.contains("returned 2")));
        assert_eq!(output.last().map(String::as_str), Some(ERROR_BANNER));
        assert!(output.contains(&"Command: 'exit 2' returned 2".to_string()));
    }

    #[test]
    fn test_stopped_chain_is_not_an_error() {
        let control = WorkerControl::new();
        let stopper = control.clone();
        let chain = StepChain::new("Setup")
            .with(Step::new("stop", move |_| {
                stopper.stop();
                Ok(())
            }))
            .with(Step::new("never", |_| panic!("ran after stop")));

        let (outcome, entries, output) = chain_with_log(chain, &control);
        assert_eq!(outcome, ChainOutcome::Stopped);
        assert!(entries.iter().all(|e| !e.starts_with("ERROR")));
        assert!(output.is_empty());
    }
}
