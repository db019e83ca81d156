//! Fields whose value freezes while a panel is paused.

/// A value with a pause snapshot.
///
/// Writers always update the live value. Readers that should respect pause
/// go through [`get`](Self::get), which returns the copy taken when the
/// panel was paused, or the live value otherwise.
///
/// ```
/// use setup_tui::panel::Tracked;
///
/// let mut lines = Tracked::new(vec!["a"]);
/// lines.set_paused(true);
/// lines.get_mut().push("b");
/// assert_eq!(lines.get(), &vec!["a"]);
/// lines.set_paused(false);
/// assert_eq!(lines.get(), &vec!["a", "b"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Tracked<T: Clone> {
    live: T,
    snapshot: T,
    paused: bool,
}

impl<T: Clone> Tracked<T> {
    /// Start tracking `value`; the snapshot is initialized immediately.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            snapshot: value.clone(),
            live: value,
            paused: false,
        }
    }

    /// The value as the display should see it.
    #[must_use]
    pub fn get(&self) -> &T {
        if self.paused { &self.snapshot } else { &self.live }
    }

    /// The live value, ignoring pause.
    #[must_use]
    pub fn live(&self) -> &T {
        &self.live
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.live
    }

    pub fn set(&mut self, value: T) {
        self.live = value;
    }

    /// Freeze (copying the live value) or unfreeze the displayed value.
    pub fn set_paused(&mut self, paused: bool) {
        if paused && !self.paused {
            self.snapshot = self.live.clone();
        }
        self.paused = paused;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
