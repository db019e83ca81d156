//! Scrolling and selection key handling shared by list-like panels.

use crate::input::{KeyCode, KeyEvent};

/// Whether `key` moves a scroll position or cursor.
#[must_use]
pub fn is_scroll_key(key: &KeyEvent) -> bool {
    key.modifiers.is_empty()
        && matches!(
            key.code,
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown | KeyCode::Home | KeyCode::End
        )
}

/// Whether `key` confirms a selection (Enter or space).
#[must_use]
pub fn is_selection_key(key: &KeyEvent) -> bool {
    key.is(KeyCode::Enter) || key.is(KeyCode::Char(' '))
}

/// New position after applying a scroll key.
///
/// In scroll mode `position` is the first visible line and may go as far as
/// `content_height - page_height`. In cursor mode it is a selected index
/// that may reach the last item, and paging keeps one line of overlap.
/// With `wrap`, moving past either end jumps to the other one. Keys that
/// don't scroll leave the position unchanged.
#[must_use]
pub fn scroll_position(
    key: &KeyEvent,
    position: usize,
    page_height: usize,
    content_height: usize,
    cursor: bool,
    wrap: bool,
) -> usize {
    if !is_scroll_key(key) {
        return position;
    }

    let page = page_height as i64;
    let content = content_height as i64;
    let shift = match key.code {
        KeyCode::Up => -1,
        KeyCode::Down => 1,
        KeyCode::PageUp if cursor => 1 - page,
        KeyCode::PageUp => -page,
        KeyCode::PageDown if cursor => page - 1,
        KeyCode::PageDown => page,
        KeyCode::Home => -content,
        KeyCode::End => content,
        _ => 0,
    };

    let max_location = if cursor { content - 1 } else { content - page }.max(0);
    let target = position as i64 + shift;
    let target = if wrap && target > max_location {
        0
    } else if wrap && target < 0 {
        max_location
    } else {
        target.clamp(0, max_location)
    };
    usize::try_from(target).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::key(code)
    }

    #[test]
    fn test_scroll_mode_clamps_to_last_page() {
        assert_eq!(scroll_position(&key(KeyCode::Down), 0, 10, 30, false, false), 1);
        assert_eq!(scroll_position(&key(KeyCode::End), 3, 10, 30, false, false), 20);
        assert_eq!(scroll_position(&key(KeyCode::PageDown), 15, 10, 30, false, false), 20);
        assert_eq!(scroll_position(&key(KeyCode::Up), 0, 10, 30, false, false), 0);
    }

    #[test]
    fn test_short_content_never_scrolls() {
        assert_eq!(scroll_position(&key(KeyCode::Down), 0, 10, 4, false, false), 0);
    }

    #[test]
    fn test_cursor_mode_wraps() {
        assert_eq!(scroll_position(&key(KeyCode::Down), 2, 10, 3, true, true), 0);
        assert_eq!(scroll_position(&key(KeyCode::Up), 0, 10, 3, true, true), 2);
        assert_eq!(scroll_position(&key(KeyCode::Down), 0, 10, 3, true, true), 1);
    }

    #[test]
    fn test_non_scroll_key_keeps_position() {
        assert_eq!(scroll_position(&KeyEvent::char('x'), 5, 10, 30, false, false), 5);
        assert!(is_selection_key(&key(KeyCode::Enter)));
        assert!(!is_scroll_key(&key(KeyCode::Left)));
    }
}
