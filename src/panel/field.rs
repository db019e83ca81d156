//! Single-line text input with a chain of key interceptors.
//!
//! [`TextField`] owns the edited text and where it is drawn. Every event is
//! first offered to the field's interceptors in order; the first one that
//! does not [`Intercept::Pass`] decides what happens. Keys nobody claims get
//! the field's built-in editing (Enter, Backspace, Delete, Left, Right).

use crate::input::{Event, KeyCode};
use crate::renderer::Surface;
use crate::style::Style;

/// What an interceptor did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intercept {
    /// Not handled; offer it to the next interceptor.
    Pass,
    /// Handled; keep editing.
    Consumed,
    /// Finish, returning the current text.
    Submit,
    /// Abandon the input.
    Cancel,
}

/// Editing state after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldStatus {
    Editing,
    Submitted,
    Cancelled,
}

/// Hook that may rewrite or claim keys before the field sees them.
pub trait KeyInterceptor: Send {
    fn intercept(&mut self, event: &Event, field: &mut TextField) -> Intercept;
}

/// Insert-mode typing, Escape to cancel, Home/End jumps.
///
/// Right arrow stops at the end of the content, and a terminal resize
/// cancels the input (a resize would otherwise garble the field).
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicInterceptor;

impl KeyInterceptor for BasicInterceptor {
    fn intercept(&mut self, event: &Event, field: &mut TextField) -> Intercept {
        let Event::Key(key) = event else {
            return Intercept::Cancel;
        };
        if let Some(c) = key.plain_char() {
            field.insert(c);
            return Intercept::Consumed;
        }
        match key.code {
            KeyCode::Esc => Intercept::Cancel,
            KeyCode::Home => {
                field.move_home();
                Intercept::Consumed
            }
            KeyCode::End => {
                field.move_end();
                Intercept::Consumed
            }
            KeyCode::Right if field.cursor() >= field.len() => Intercept::Consumed,
            _ => Intercept::Pass,
        }
    }
}

/// Up/Down walk through earlier inputs.
///
/// The history is newest first. Leaving the current input for the history
/// remembers it, so coming back down restores what was typed.
#[derive(Clone, Debug, Default)]
pub struct HistoryInterceptor {
    history: Vec<String>,
    selection: Option<usize>,
    custom_input: String,
}

impl HistoryInterceptor {
    #[must_use]
    pub fn new(history: Vec<String>) -> Self {
        Self {
            history,
            selection: None,
            custom_input: String::new(),
        }
    }
}

impl KeyInterceptor for HistoryInterceptor {
    fn intercept(&mut self, event: &Event, field: &mut TextField) -> Intercept {
        let Some(key) = event.key() else {
            return Intercept::Pass;
        };
        let new_selection = match key.code {
            KeyCode::Up => match self.selection {
                None if self.history.is_empty() => None,
                None => Some(0),
                Some(i) => Some((i + 1).min(self.history.len() - 1)),
            },
            KeyCode::Down => self.selection.and_then(|i| i.checked_sub(1)),
            _ => return Intercept::Pass,
        };

        if new_selection == self.selection {
            return Intercept::Consumed;
        }
        if self.selection.is_none() {
            self.custom_input = field.text().trim().to_string();
        }
        let text = match new_selection {
            Some(i) => self.history[i].clone(),
            None => self.custom_input.clone(),
        };
        field.set_text(&text);
        self.selection = new_selection;
        Intercept::Consumed
    }
}

/// A one-row input field at a fixed position on the surface.
pub struct TextField {
    chars: Vec<char>,
    cursor: usize,
    row: u32,
    col: u32,
    width: u32,
    style: Style,
    interceptors: Vec<Box<dyn KeyInterceptor>>,
}

impl TextField {
    /// Field at surface position `(row, col)` spanning `width` columns,
    /// pre-filled with `initial`.
    #[must_use]
    pub fn new(row: u32, col: u32, width: u32, initial: &str) -> Self {
        let mut field = Self {
            chars: Vec::new(),
            cursor: 0,
            row,
            col,
            width,
            style: Style::NONE,
            interceptors: Vec::new(),
        };
        field.set_text(initial);
        field
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Add an interceptor behind the ones already registered.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: impl KeyInterceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// Most characters the field holds; one cell stays free for the cursor.
    fn capacity(&self) -> usize {
        (self.width as usize).saturating_sub(1).max(1)
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Replace the text, cropped to the field, with the cursor at its end.
    pub fn set_text(&mut self, text: &str) {
        let capacity = self.capacity();
        self.chars = text.chars().filter(|c| !c.is_control()).take(capacity).collect();
        self.cursor = self.chars.len();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert(&mut self, c: char) {
        if self.chars.len() < self.capacity() {
            self.chars.insert(self.cursor, c);
            self.cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.chars.len();
    }

    /// Apply one event.
    pub fn handle(&mut self, event: &Event) -> FieldStatus {
        let mut interceptors = std::mem::take(&mut self.interceptors);
        if interceptors.is_empty() {
            interceptors.push(Box::new(BasicInterceptor));
        }
        let verdict = interceptors
            .iter_mut()
            .map(|i| i.intercept(event, self))
            .find(|v| *v != Intercept::Pass)
            .unwrap_or(Intercept::Pass);
        self.interceptors = interceptors;

        match verdict {
            Intercept::Consumed => FieldStatus::Editing,
            Intercept::Submit => FieldStatus::Submitted,
            Intercept::Cancel => FieldStatus::Cancelled,
            Intercept::Pass => self.default_edit(event),
        }
    }

    fn default_edit(&mut self, event: &Event) -> FieldStatus {
        let Some(key) = event.key() else {
            return FieldStatus::Editing;
        };
        match key.code {
            KeyCode::Enter => return FieldStatus::Submitted,
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            _ => {}
        }
        FieldStatus::Editing
    }

    /// Draw the field and place the cursor.
    pub fn render(&self, surface: &mut Surface) {
        let text = self.text();
        let buffer = surface.buffer_mut();
        let area = crate::buffer::ClipRect::new(self.col, self.row, self.width, 1);
        buffer.push_scissor(area);
        buffer.fill_rect(area, self.style);
        buffer.draw_text(self.col, self.row, &text, self.style);
        buffer.pop_scissor();

        let offset = u32::try_from(self.cursor).unwrap_or(u32::MAX);
        surface.show_cursor_at(self.row, self.col + offset.min(self.width.saturating_sub(1)));
    }
}

impl std::fmt::Debug for TextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextField")
            .field("text", &self.text())
            .field("cursor", &self.cursor)
            .field("row", &self.row)
            .field("col", &self.col)
            .field("width", &self.width)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyEvent, ResizeEvent};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::key(code))
    }

    fn type_str(field: &mut TextField, text: &str) {
        for c in text.chars() {
            assert_eq!(field.handle(&Event::Key(KeyEvent::char(c))), FieldStatus::Editing);
        }
    }

    #[test]
    fn test_typing_inserts_at_cursor() {
        let mut field = TextField::new(0, 0, 20, "ac");
        field.handle(&key(KeyCode::Left));
        type_str(&mut field, "b");
        assert_eq!(field.text(), "abc");
        assert_eq!(field.handle(&key(KeyCode::Enter)), FieldStatus::Submitted);
    }

    #[test]
    fn test_escape_and_resize_cancel() {
        let mut field = TextField::new(0, 0, 20, "x");
        assert_eq!(field.handle(&key(KeyCode::Esc)), FieldStatus::Cancelled);
        let resize = Event::Resize(ResizeEvent::new(80, 24));
        assert_eq!(field.handle(&resize), FieldStatus::Cancelled);
    }

    #[test]
    fn test_home_end_and_right_stop() {
        let mut field = TextField::new(0, 0, 20, "abc");
        field.handle(&key(KeyCode::Home));
        assert_eq!(field.cursor(), 0);
        field.handle(&key(KeyCode::End));
        assert_eq!(field.cursor(), 3);
        field.handle(&key(KeyCode::Right));
        assert_eq!(field.cursor(), 3);
    }

    #[test]
    fn test_capacity_limits_input() {
        let mut field = TextField::new(0, 0, 4, "");
        type_str(&mut field, "abcdef");
        assert_eq!(field.text(), "abc");
    }

    #[test]
    fn test_history_walks_and_restores_custom_input() {
        let history = vec!["newest".to_string(), "older".to_string()];
        let mut field = TextField::new(0, 0, 20, "draft")
            .with_interceptor(HistoryInterceptor::new(history))
            .with_interceptor(BasicInterceptor);

        field.handle(&key(KeyCode::Up));
        assert_eq!(field.text(), "newest");
        field.handle(&key(KeyCode::Up));
        assert_eq!(field.text(), "older");
        field.handle(&key(KeyCode::Up));
        assert_eq!(field.text(), "older");
        field.handle(&key(KeyCode::Down));
        field.handle(&key(KeyCode::Down));
        assert_eq!(field.text(), "draft");
    }

    #[test]
    fn test_render_places_cursor() {
        let mut surface = Surface::headless(20, 3);
        let field = TextField::new(1, 2, 10, "hi").with_style(Style::standout());
        field.render(&mut surface);
        assert_eq!(surface.cursor(), Some((1, 4)));
        assert_eq!(surface.buffer().row_text(1).trim_end(), "  hi");
    }
}
