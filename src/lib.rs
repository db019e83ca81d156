//! `setup_tui` - terminal panel framework and setup wizard
//!
//! Panels are independently redrawn regions of one shared terminal
//! surface. A single [`UiContext`] owns the surface behind the Surface Lock;
//! panels draw through it, popups hold it while they are open, and worker
//! threads never touch it at all. Workers push messages into a panel's
//! [`AsyncBridge`](bridge::AsyncBridge) instead, and the event loop moves
//! them into the panel right before it redraws.
//!
//! The [`Controller`] arranges panels into pages below a set of sticky
//! panels and runs the event loop.
//!
//! # Example
//!
//! ```
//! use setup_tui::context::UiContext;
//! use setup_tui::controller::Controller;
//! use setup_tui::panel::{LabelPanel, PanelHandle, share};
//! use setup_tui::style::Style;
//!
//! let ctx = UiContext::headless(40, 10);
//! let mut controller = Controller::new(ctx.clone());
//! controller.add_header("Setup");
//!
//! let mut body = LabelPanel::new(ctx.clone(), "body");
//! body.set_message("Hello", Style::NONE);
//! controller.add_page(vec![share(body) as PanelHandle]);
//!
//! controller.redraw(true).unwrap();
//! assert_eq!(ctx.lock().buffer().row_text(1).trim_end(), "Hello");
//! ```

// Crate-level lint configuration
#![warn(unsafe_code)] // Unsafe code needs justification (termios, ioctl and kill FFI)
#![allow(clippy::cast_possible_truncation)] // Intentional coordinate casts
#![allow(clippy::cast_sign_loss)] // Intentional coordinate conversions
#![allow(clippy::cast_possible_wrap)] // Intentional coordinate conversions
#![allow(clippy::module_name_repetitions)] // Allow LogPanel in log, PanelBase in panel
#![allow(clippy::struct_excessive_bools)] // Terminal state needs multiple flags
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine
#![allow(clippy::significant_drop_tightening)] // Surface guards span whole draws

pub mod ansi;
pub mod bridge;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod input;
pub mod log;
pub mod panel;
pub mod popups;
pub mod renderer;
pub mod style;
pub mod terminal;
pub mod text;
pub mod worker;

// Re-export core types at crate root
pub use cell::Cell;
pub use color::Color;
pub use config::Config;
pub use context::UiContext;
pub use controller::Controller;
pub use error::{Error, Result};
pub use style::{Style, TextAttributes};

// Re-export input types
pub use input::{Event, InputSource, KeyCode, KeyEvent, KeyModifiers};

// Re-export commonly used types
pub use ansi::ColorMode;
pub use bridge::{AsyncBridge, BridgeSender};
pub use buffer::{ClipRect, ScreenBuffer};
pub use log::{LogLevel, LogPanel, LogSender};
pub use panel::{Panel, PanelAction, PanelBase, PanelHandle};
pub use renderer::Surface;
pub use terminal::{Terminal, is_tty, terminal_size};
