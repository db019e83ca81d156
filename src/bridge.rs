//! Thread-safe hand-off from worker threads to the render thread.
//!
//! Workers never touch panels or the surface. They [`put`](BridgeSender::put)
//! messages into a bridge, and the render thread moves everything queued into
//! the owning panel with [`drain`](AsyncBridge::drain) right before it draws.
//!
//! # Examples
//!
//! ```
//! use setup_tui::bridge::AsyncBridge;
//!
//! let bridge = AsyncBridge::new();
//! let sender = bridge.sender();
//! std::thread::spawn(move || {
//!     sender.put("line 1".to_string());
//!     sender.put("line 2".to_string());
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(bridge.drain(), vec!["line 1", "line 2"]);
//! assert!(bridge.drain().is_empty());
//! ```

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Receiving end, owned by a panel.
#[derive(Debug)]
pub struct AsyncBridge<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

/// Producing end. Cheap to clone and safe to move into any thread.
#[derive(Debug)]
pub struct BridgeSender<T> {
    tx: Sender<T>,
}

impl<T> Clone for BridgeSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> BridgeSender<T> {
    /// Queue a message. Never blocks.
    ///
    /// Returns `false` once the receiving panel is gone; the message is
    /// dropped.
    pub fn put(&self, message: T) -> bool {
        self.tx.send(message).is_ok()
    }
}

impl<T> AsyncBridge<T> {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// A new producer handle.
    #[must_use]
    pub fn sender(&self) -> BridgeSender<T> {
        BridgeSender {
            tx: self.tx.clone(),
        }
    }

    /// Queue a message from the owning thread.
    pub fn put(&self, message: T) {
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.tx.send(message);
    }

    /// Everything queued so far, oldest first, without waiting.
    pub fn drain(&self) -> Vec<T> {
        let mut messages = Vec::new();
        self.flush(|message| messages.push(message));
        messages
    }

    /// Hand each queued message to `f` in arrival order. Returns how many
    /// were handled.
    pub fn flush(&self, mut f: impl FnMut(T)) -> usize {
        let mut count = 0;
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    f(message);
                    count += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        count
    }
}

impl<T> Default for AsyncBridge<T> {
    fn default() -> Self {
        Self::new()
    }
}
