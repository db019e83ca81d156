//! Raw mode, readiness polling and resize notification.
//!
//! Raw mode disables line buffering and echo so keys arrive one at a time.
//! Reads are driven by `poll(2)` with an explicit timeout, which is what
//! lets the event loop wake up on its refresh cadence.
//!
//! Everything here is a thin wrapper over libc; the `unsafe` blocks are
//! limited to the FFI calls themselves. `SIGWINCH` goes through
//! signal-hook, which only sets a flag from the handler.

#![allow(unsafe_code)]
#![allow(clippy::borrow_as_ptr)]

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Terminal modes as they were before raw mode; put back on drop.
#[derive(Debug)]
pub struct RawModeGuard {
    fd: RawFd,
    original: libc::termios,
}

impl RawModeGuard {
    /// Switch `fd` to raw mode.
    ///
    /// Fails with the `tcgetattr` error when `fd` is not a terminal.
    pub fn new<F: AsRawFd>(fd: &F) -> io::Result<Self> {
        let fd = fd.as_raw_fd();
        let original = get_termios(fd)?;

        let mut raw = original;

        // Enter arrives as CR, ^S/^Q reach us as keys
        raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);

        raw.c_oflag &= !libc::OPOST;

        raw.c_cflag |= libc::CS8;

        // ^C is a key like any other; quitting goes through the controller
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

        // read() returns at once; poll_readable does the waiting
        raw.c_cc[libc::VMIN] = 0;
        raw.c_cc[libc::VTIME] = 0;

        set_termios(fd, &raw)?;

        Ok(Self { fd, original })
    }

    fn restore(&self) -> io::Result<()> {
        set_termios(self.fd, &self.original)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Raw mode on stdin for as long as the guard lives.
pub fn enable_raw_mode() -> io::Result<RawModeGuard> {
    RawModeGuard::new(&io::stdin())
}

#[must_use]
pub fn is_tty<F: AsRawFd>(fd: &F) -> bool {
    // SAFETY: isatty is safe to call with any fd
    unsafe { libc::isatty(fd.as_raw_fd()) == 1 }
}

/// `(columns, rows)` of the terminal on stdout.
///
/// A zero dimension is reported as an error so callers fall back to a default.
pub fn terminal_size() -> io::Result<(u16, u16)> {
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };

    // SAFETY: ioctl with TIOCGWINSZ is safe when passed a valid winsize struct
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut size) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else if size.ws_col == 0 || size.ws_row == 0 {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "terminal reported zero dimensions",
        ))
    } else {
        Ok((size.ws_col, size.ws_row))
    }
}

/// Wait until `fd` is readable.
///
/// `None` waits indefinitely. Returns `false` on timeout. An interrupted
/// wait (for example by `SIGWINCH`) also returns `false` so the caller can
/// look at the resize flag.
pub fn poll_readable(fd: RawFd, timeout: Option<Duration>) -> io::Result<bool> {
    let timeout_ms = timeout.map_or(-1, |t| i32::try_from(t.as_millis()).unwrap_or(i32::MAX));
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };

    // SAFETY: pfd is a valid pollfd and the count is 1
    let result = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if result == -1 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    if result > 0 && pfd.revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0
        && pfd.revents & libc::POLLIN == 0
    {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed",
        ));
    }
    Ok(result > 0)
}

/// Read whatever bytes are available on `fd` into `buf`.
pub fn read_available(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    // SAFETY: buf is valid for buf.len() bytes
    let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    if n < 0 {
        let err = io::Error::last_os_error();
        if matches!(
            err.kind(),
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
        ) {
            return Ok(0);
        }
        return Err(err);
    }
    Ok(n as usize)
}

fn resize_flag() -> &'static Arc<AtomicBool> {
    static RESIZED: OnceLock<Arc<AtomicBool>> = OnceLock::new();
    RESIZED.get_or_init(|| Arc::new(AtomicBool::new(false)))
}

/// Route `SIGWINCH` to a flag readable with [`take_resize`]. Registers the
/// handler once however often it is called.
pub fn watch_resize() -> io::Result<()> {
    static REGISTERED: OnceLock<()> = OnceLock::new();
    if REGISTERED.get().is_none() {
        signal_hook::flag::register(signal_hook::consts::SIGWINCH, Arc::clone(resize_flag()))?;
        let _ = REGISTERED.set(());
    }
    Ok(())
}

/// Return and clear the "terminal was resized" flag.
#[must_use]
pub fn take_resize() -> bool {
    resize_flag().swap(false, Ordering::SeqCst)
}

fn get_termios(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: tcgetattr is safe when passed a valid termios struct
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(termios)
    }
}

/// TCSAFLUSH drops keys typed before the mode change.
fn set_termios(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    // SAFETY: tcsetattr is safe when passed a valid termios struct
    let result = unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, termios) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::os::unix::io::FromRawFd;

    // ============================================================================
    // Modes
    // ============================================================================

    #[test]
    fn test_is_tty_pipe_returns_false() {
        let (read_fd, write_fd) = create_pipe().unwrap();
        assert!(!is_tty(&read_fd));
        assert!(!is_tty(&write_fd));
    }

    #[test]
    fn test_is_tty_file_returns_false() {
        let file = tempfile::tempfile().unwrap();
        assert!(!is_tty(&file));
    }

    #[test]
    fn test_raw_mode_guard_new_on_pipe_fails() {
        let (read_fd, _write_fd) = create_pipe().unwrap();
        assert!(RawModeGuard::new(&read_fd).is_err());
    }

    // ============================================================================
    // Reading
    // ============================================================================

    #[test]
    fn test_poll_times_out_on_empty_pipe() {
        let (read_fd, _write_fd) = create_pipe().unwrap();
        let ready = poll_readable(read_fd.as_raw_fd(), Some(Duration::from_millis(10))).unwrap();
        assert!(!ready);
    }

    #[test]
    fn test_poll_and_read_pending_bytes() {
        let (read_fd, mut write_fd) = create_pipe().unwrap();
        write_fd.write_all(b"\x1b[A").unwrap();

        let ready = poll_readable(read_fd.as_raw_fd(), Some(Duration::from_millis(100))).unwrap();
        assert!(ready);

        let mut buf = [0u8; 8];
        let n = read_available(read_fd.as_raw_fd(), &mut buf).unwrap();
        assert_eq!(&buf[..n], b"\x1b[A");
    }

    #[test]
    fn test_sigwinch_sets_resize_flag_once() {
        watch_resize().unwrap();
        watch_resize().unwrap();
        let _ = take_resize();

        signal_hook::low_level::raise(signal_hook::consts::SIGWINCH).unwrap();
        assert!(take_resize());
        assert!(!take_resize());
    }

    /// Both ends of a fresh pipe, closed when dropped.
    fn create_pipe() -> io::Result<(File, File)> {
        let mut fds = [0i32; 2];
        let result = unsafe { libc::pipe(fds.as_mut_ptr()) };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: pipe() succeeded, so fds are valid
        let read_file = unsafe { File::from_raw_fd(fds[0]) };
        let write_file = unsafe { File::from_raw_fd(fds[1]) };
        Ok((read_file, write_file))
    }
}
