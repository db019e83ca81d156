//! Boxed list of selectable controls, such as the wizard's setup modes.

use crate::color::Color;
use crate::context::UiContext;
use crate::error::Result;
use crate::input::{KeyCode, KeyEvent};
use crate::panel::{Canvas, HelpEntry, KeyOutcome, ModalInput, Panel, PanelAction, PanelBase};
use crate::style::Style;
use crate::text::{display_cols, is_selection_key, pad_str, split_str};

/// Widest the message and descriptions are wrapped to.
const TEXT_WIDTH: u32 = 54;

/// A named action with a description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Control {
    name: String,
    description: String,
    executed: bool,
}

impl Control {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            executed: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the control has been chosen.
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.executed
    }
}

/// Displays a message followed by selectable controls.
#[derive(Debug)]
pub struct ControlPanel {
    base: PanelBase,
    message: String,
    controls: Vec<Control>,
    selected: Option<usize>,
    name_style: Style,
    description_style: Style,
}

impl ControlPanel {
    #[must_use]
    pub fn new(ctx: UiContext, top: u32) -> Self {
        Self {
            base: PanelBase::new(ctx, "Controls", top, 0),
            message: String::new(),
            controls: Vec::new(),
            selected: None,
            name_style: Style::bold().with_fg(Color::Red),
            description_style: Style::fg(Color::Red),
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Replace the controls, selecting the first one.
    pub fn set_controls(&mut self, controls: Vec<Control>) {
        self.selected = (!controls.is_empty()).then_some(0);
        self.controls = controls;
    }

    #[must_use]
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Control> {
        self.controls.get(self.selected?)
    }
}

impl Panel for ControlPanel {
    fn base(&self) -> &PanelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PanelBase {
        &mut self.base
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        let (width, height) = (canvas.width(), canvas.height());
        canvas.draw_box(0, 0, height, width, Style::NONE);
        let text_width = TEXT_WIDTH.min(width.saturating_sub(4));

        let message = split_str(&self.message, text_width as usize);
        for (row, line) in (1..).zip(&message) {
            canvas.addstr(row, 2, line, self.name_style);
        }

        let mut row = u32::try_from(message.len()).unwrap_or(u32::MAX).saturating_add(1);
        for (index, control) in self.controls.iter().enumerate() {
            let extra = if Some(index) == self.selected {
                Style::standout()
            } else {
                Style::NONE
            };
            row += 1;
            let end = canvas.addstr(row, 2, &control.name, self.name_style.merge(extra));
            let gap = text_width.saturating_sub(display_cols(&control.name));
            canvas.fill(row, end, gap, self.description_style.merge(extra));
            row += 1;

            for line in split_str(&control.description, text_width as usize) {
                canvas.addstr(row, 2, &pad_str(&line, text_width as usize), self.description_style.merge(extra));
                row += 1;
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: &KeyEvent, _modal: &mut dyn ModalInput) -> Result<KeyOutcome> {
        let Some(selected) = self.selected else {
            return Ok(KeyOutcome::Ignored);
        };
        let count = self.controls.len();
        if key.is(KeyCode::Up) {
            self.selected = Some((selected + count - 1) % count);
        } else if key.is(KeyCode::Down) {
            self.selected = Some((selected + 1) % count);
        } else if is_selection_key(key) {
            let control = &mut self.controls[selected];
            control.executed = true;
            tracing::debug!(control = %control.name, "control selected");
            return Ok(KeyOutcome::Action(PanelAction::Select(control.name.clone())));
        } else {
            return Ok(KeyOutcome::Ignored);
        }
        self.redraw(true, true)?;
        Ok(KeyOutcome::Consumed)
    }

    fn help(&self) -> Vec<HelpEntry> {
        let mut entries = vec![
            HelpEntry::new("up arrow", "select previous control"),
            HelpEntry::new("down arrow", "select next control"),
        ];
        let enter = HelpEntry::new("enter", "run the selected control");
        entries.push(match self.selected() {
            Some(control) => enter.with_selection(control.name()),
            None => enter,
        });
        entries
    }
}
