//! Clipping rectangles.
//!
//! A panel draws through a [`ClipRect`] covering its subregion, so content
//! past its edge is dropped instead of landing on a neighbour.

/// A rectangle in screen cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClipRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ClipRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the rightmost column.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// One past the bottom row.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    #[must_use]
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px < self.right() && py < self.bottom()
    }

    /// The overlap, or `None` when the two only touch or are apart.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 > x1 && y2 > y1 {
            Some(Self::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Unbounded; the buffer edges do the clipping.
impl Default for ClipRect {
    fn default() -> Self {
        Self::new(0, 0, u32::MAX, u32::MAX)
    }
}

/// Nested clips: a popup field inside a popup inside the screen.
///
/// Each push narrows the current clip to its overlap with the new one.
#[derive(Clone, Debug, Default)]
pub struct ScissorStack {
    stack: Vec<ClipRect>,
    current: ClipRect,
}

impl ScissorStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rect: ClipRect) {
        self.stack.push(self.current);
        self.current = self
            .current
            .intersect(&rect)
            .unwrap_or(ClipRect::new(rect.x, rect.y, 0, 0));
    }

    /// Back to the clip before the matching push; no-op when empty.
    pub fn pop(&mut self) {
        if let Some(rect) = self.stack.pop() {
            self.current = rect;
        }
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.current = ClipRect::default();
    }

    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.current.contains(x, y)
    }

    #[must_use]
    pub fn current(&self) -> ClipRect {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subregion_edges_are_exclusive() {
        // a log panel below a one-row label on an 80x24 screen
        let log = ClipRect::new(0, 1, 80, 23);
        assert!(log.contains(0, 1));
        assert!(log.contains(79, 23));
        assert!(!log.contains(80, 5));
        assert!(!log.contains(10, 0));
        assert_eq!((log.right(), log.bottom()), (80, 24));
    }

    #[test]
    fn test_stacked_panels_do_not_overlap() {
        let label = ClipRect::new(0, 0, 80, 1);
        let log = ClipRect::new(0, 1, 80, 23);
        assert_eq!(label.intersect(&log), None);

        let popup = ClipRect::new(0, 1, 80, 9);
        assert_eq!(popup.intersect(&log), Some(popup));
    }

    #[test]
    fn test_unbounded_default() {
        let rect = ClipRect::default();
        assert_eq!(rect.right(), u32::MAX);
        assert!(rect.contains(1_000_000, 1_000_000));
    }

    #[test]
    fn test_nested_clips_narrow_and_restore() {
        let mut stack = ScissorStack::new();
        stack.push(ClipRect::new(0, 1, 80, 9));
        stack.push(ClipRect::new(2, 6, 100, 1));
        assert_eq!(stack.current(), ClipRect::new(2, 6, 78, 1));
        assert!(!stack.contains(2, 5));

        stack.pop();
        assert!(stack.contains(2, 5));

        stack.push(ClipRect::new(0, 20, 5, 5));
        assert!(stack.current().is_empty());
        stack.pop();
        stack.pop();
        stack.pop();
        assert_eq!(stack.current(), ClipRect::default());

        stack.push(ClipRect::new(1, 1, 1, 1));
        stack.clear();
        assert_eq!(stack.current(), ClipRect::default());
    }
}
