//! Blocking, user-driven input used by popups and inline editors.
//!
//! Everything here runs on the event-loop thread and blocks it on purpose.
//! Callers hold the Surface Lock for the duration, so background redraws
//! skip their turn instead of painting over the popup.

use crate::error::Result;
use crate::input::{Event, InputSource, ResizeEvent};
use crate::panel::field::{FieldStatus, TextField};
use crate::renderer::Surface;
use std::time::Duration;

/// Narrow interface to modal user input.
pub trait ModalInput {
    /// Present `surface` and wait for the next event. `None` timeout waits
    /// indefinitely; `Ok(None)` means the timeout passed.
    fn wait_event(&mut self, surface: &mut Surface, timeout: Option<Duration>) -> Result<Option<Event>>;

    /// Edit `field` until the user submits or cancels.
    ///
    /// Returns the trimmed text, or `None` when cancelled. The cursor is
    /// visible while editing and hidden again afterwards.
    fn read_line(&mut self, surface: &mut Surface, field: &mut TextField) -> Result<Option<String>>;
}

/// [`ModalInput`] reading from an [`InputSource`].
pub struct BlockingInput<'a> {
    source: &'a mut dyn InputSource,
    resized: Option<ResizeEvent>,
}

impl<'a> BlockingInput<'a> {
    pub fn new(source: &'a mut dyn InputSource) -> Self {
        Self {
            source,
            resized: None,
        }
    }

    /// Take a terminal resize that arrived while a modal was open.
    pub fn take_resize(&mut self) -> Option<ResizeEvent> {
        self.resized.take()
    }

    /// Poll the underlying source directly.
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<Option<Event>> {
        let event = self.source.poll_event(timeout)?;
        if let Some(Event::Resize(resize)) = event {
            self.resized = Some(resize);
        }
        Ok(event)
    }
}

impl ModalInput for BlockingInput<'_> {
    fn wait_event(&mut self, surface: &mut Surface, timeout: Option<Duration>) -> Result<Option<Event>> {
        surface.present()?;
        self.poll(timeout)
    }

    fn read_line(&mut self, surface: &mut Surface, field: &mut TextField) -> Result<Option<String>> {
        let result = loop {
            field.render(surface);
            if let Err(err) = surface.present() {
                break Err(err.into());
            }
            let event = match self.poll(None) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(err) => break Err(err),
            };
            match field.handle(&event) {
                FieldStatus::Editing => {}
                FieldStatus::Submitted => break Ok(Some(field.text().trim().to_string())),
                FieldStatus::Cancelled => {
                    // The bell is best effort.
                    let _ = surface.bell();
                    break Ok(None);
                }
            }
        };
        surface.hide_cursor();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyCode, KeyEvent, ScriptedInput};

    #[test]
    fn test_read_line_submits_trimmed_text() {
        let mut script = ScriptedInput::new();
        script.type_str("  x ").push(KeyEvent::key(KeyCode::Enter));
        let mut modal = BlockingInput::new(&mut script);
        let mut surface = Surface::headless(30, 3);
        let mut field = TextField::new(1, 0, 20, "a");

        let result = modal.read_line(&mut surface, &mut field).unwrap();
        assert_eq!(result.as_deref(), Some("a  x"));
        assert_eq!(surface.cursor(), None);
    }

    #[test]
    fn test_read_line_cancel_is_distinct_from_empty() {
        let mut script = ScriptedInput::keys([KeyEvent::key(KeyCode::Esc)]);
        let mut modal = BlockingInput::new(&mut script);
        let mut surface = Surface::headless(30, 3);
        let mut field = TextField::new(0, 0, 20, "");
        assert_eq!(modal.read_line(&mut surface, &mut field).unwrap(), None);

        let mut script = ScriptedInput::keys([KeyEvent::key(KeyCode::Enter)]);
        let mut modal = BlockingInput::new(&mut script);
        assert_eq!(
            modal.read_line(&mut surface, &mut field).unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn test_resize_is_remembered() {
        let mut script = ScriptedInput::new();
        script.push(ResizeEvent::new(100, 40));
        let mut modal = BlockingInput::new(&mut script);
        let mut surface = Surface::headless(30, 3);
        let mut field = TextField::new(0, 0, 20, "keep");
        assert_eq!(modal.read_line(&mut surface, &mut field).unwrap(), None);
        assert_eq!(modal.take_resize(), Some(ResizeEvent::new(100, 40)));
    }
}
