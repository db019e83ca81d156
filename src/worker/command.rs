//! Running one shell command with its output streamed line by line.

use super::{OutputSink, WorkerControl};
use crate::error::{Error, Result};
use std::io::{self, BufRead, BufReader};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// How often the stop and pause flags are checked while a command runs.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quote `text` as a single `sh` word.
#[must_use]
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Run `command` with `sh -c`, in `cwd` when given.
///
/// Standard output and error are merged and sent to `out` a line at a time,
/// bracketed by `Executing command: '…'` and `Command: '…' returned N`. A
/// command killed by a signal returns the negated signal number.
///
/// The command runs in its own process group. It is killed when `control`
/// is stopped, and suspended with `SIGSTOP` while `control` is paused.
///
/// # Errors
///
/// [`Error::Io`] if the command cannot be started, and [`Error::Worker`] if
/// it was stopped before finishing.
pub fn run_command(command: &str, cwd: Option<&Path>, out: &dyn OutputSink, control: &WorkerControl) -> Result<i32> {
    if control.is_stopped() {
        return Err(stopped(command));
    }
    out.line(&format!("Executing command: '{command}'"));

    let mut builder = Command::new("sh");
    builder
        .arg("-c")
        .arg(format!("exec 2>&1; {command}"))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .process_group(0);
    if let Some(cwd) = cwd {
        builder.current_dir(cwd);
    }
    let mut child = builder.spawn()?;
    let pgid = libc::pid_t::try_from(child.id())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "process id out of range"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "command stdout not captured"))?;

    let (tx, rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        let mut stdout = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match stdout.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if tx.send(line.trim_end_matches(['\r', '\n']).to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut killed = false;
    let mut suspended = false;
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => out.line(&line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if control.is_stopped() {
            if !killed {
                signal_group(pgid, libc::SIGKILL);
                killed = true;
            }
        } else if control.is_paused() != suspended {
            suspended = !suspended;
            signal_group(pgid, if suspended { libc::SIGSTOP } else { libc::SIGCONT });
        }
    }
    // The reader only exits on EOF or a read error.
    let _ = reader.join();

    let status = child.wait()?;
    let code = status
        .code()
        .unwrap_or_else(|| status.signal().map_or(-1, |signal| -signal));
    out.line(&format!("Command: '{command}' returned {code}"));
    tracing::info!(command, code, killed, "command exited");

    if killed {
        return Err(stopped(command));
    }
    Ok(code)
}

fn stopped(command: &str) -> Error {
    Error::Worker {
        name: command.to_string(),
        reason: "stopped before completion".to_string(),
    }
}

fn signal_group(pgid: libc::pid_t, signal: libc::c_int) {
    // SAFETY: kill has no memory-safety preconditions; a negative pid
    // addresses the process group.
    let result = unsafe { libc::kill(-pgid, signal) };
    if result == -1 {
        tracing::debug!(pgid, signal, error = %io::Error::last_os_error(), "unable to signal command");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AsyncBridge;
    use std::time::Instant;

    fn run(command: &str, cwd: Option<&Path>) -> (Result<i32>, Vec<String>) {
        let bridge = AsyncBridge::new();
        let result = run_command(command, cwd, &bridge.sender(), &WorkerControl::new());
        (result, bridge.drain())
    }

    #[test]
    fn test_output_is_bracketed_and_merged() {
        let (result, lines) = run("echo out; echo err >&2", None);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(lines.first().unwrap(), "Executing command: 'echo out; echo err >&2'");
        assert!(lines.contains(&"out".to_string()));
        assert!(lines.contains(&"err".to_string()));
        assert_eq!(lines.last().unwrap(), "Command: 'echo out; echo err >&2' returned 0");
    }

    #[test]
    fn test_exit_code_is_returned() {
        let (result, lines) = run("exit 3", None);
        assert_eq!(result.unwrap(), 3);
        assert_eq!(lines.last().unwrap(), "Command: 'exit 3' returned 3");
    }

    #[test]
    fn test_runs_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let (result, lines) = run("ls", Some(dir.path()));
        assert_eq!(result.unwrap(), 0);
        assert!(lines.contains(&"marker".to_string()));
    }

    #[test]
    fn test_stop_kills_command() {
        let control = WorkerControl::new();
        let stopper = control.clone();
        let bridge = AsyncBridge::new();
        let started = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            stopper.stop();
        });
        let result = run_command("sleep 30", None, &bridge.sender(), &control);
        handle.join().unwrap();
        assert!(matches!(result, Err(Error::Worker { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_stopped_control_never_starts() {
        let control = WorkerControl::new();
        control.stop();
        let bridge = AsyncBridge::new();
        assert!(run_command("echo hi", None, &bridge.sender(), &control).is_err());
        assert!(bridge.drain().is_empty());
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
