//! Editable option list with Back and Next buttons.
//!
//! Options may carry one level of suboptions, drawn under their parent with
//! a corner connector. Disabled suboptions are hidden. Toggling a toggle
//! option enables or disables its suboptions to match the new value.

use crate::color::Color;
use crate::context::UiContext;
use crate::error::Result;
use crate::input::{KeyCode, KeyEvent};
use crate::panel::{Canvas, HelpEntry, KeyOutcome, ModalInput, Panel, PanelAction, PanelBase, TextField};
use crate::popups;
use crate::style::Style;
use crate::text::{display_cols, is_selection_key, pad_str, split_str};
use std::fmt;
use std::time::Duration;

const BACK_LABEL: &str = "Back";
const BACK_DESCRIPTION: &str = "Return to re-select the setup mode.";
const NEXT_LABEL: &str = "Confirm config and start setup";
const NEXT_DESCRIPTION: &str = "Confirm the above configuration and start the setup process.";

const REJECTED_WAIT: Duration = Duration::from_secs(3);

/// Checks a value before an option accepts it. `Err` carries the reason
/// shown to the user.
pub type Validator = Box<dyn Fn(&str) -> std::result::Result<(), String> + Send>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Kind {
    Text,
    Toggle {
        on: bool,
        true_label: String,
        false_label: String,
    },
}

/// One row of an [`OptionPanel`].
pub struct OptionItem {
    label: String,
    description: String,
    value: String,
    kind: Kind,
    validator: Option<Validator>,
    enabled: bool,
    suboptions: Vec<OptionItem>,
}

impl OptionItem {
    /// Free-text option.
    #[must_use]
    pub fn text(label: impl Into<String>, description: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            value: value.into(),
            kind: Kind::Text,
            validator: None,
            enabled: true,
            suboptions: Vec::new(),
        }
    }

    /// Boolean option shown as `true_label` or `false_label`.
    #[must_use]
    pub fn toggle(
        label: impl Into<String>,
        description: impl Into<String>,
        true_label: impl Into<String>,
        false_label: impl Into<String>,
        on: bool,
    ) -> Self {
        Self {
            kind: Kind::Toggle {
                on,
                true_label: true_label.into(),
                false_label: false_label.into(),
            },
            ..Self::text(label, description, on.to_string())
        }
    }

    /// Attach suboptions. Under a toggle they start enabled only if it is on.
    #[must_use]
    pub fn with_suboptions(mut self, suboptions: Vec<OptionItem>) -> Self {
        self.suboptions = suboptions;
        if let Kind::Toggle { on, .. } = self.kind {
            self.set_suboptions_enabled(on);
        }
        self
    }

    #[must_use]
    pub fn with_validator(
        mut self,
        validator: impl Fn(&str) -> std::result::Result<(), String> + Send + 'static,
    ) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The raw value; `"true"` or `"false"` for toggles.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The toggle state, or `None` for text options.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        match self.kind {
            Kind::Toggle { on, .. } => Some(on),
            Kind::Text => None,
        }
    }

    /// Text shown in the value column.
    #[must_use]
    pub fn display_value(&self) -> &str {
        match &self.kind {
            Kind::Text => &self.value,
            Kind::Toggle {
                on,
                true_label,
                false_label,
            } => {
                if *on {
                    true_label
                } else {
                    false_label
                }
            }
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn suboptions(&self) -> &[OptionItem] {
        &self.suboptions
    }

    fn set_suboptions_enabled(&mut self, enabled: bool) {
        for sub in &mut self.suboptions {
            sub.enabled = enabled;
        }
    }

    /// Set a text value after running the validator.
    ///
    /// # Errors
    ///
    /// The validator's reason when it rejects `value`.
    pub fn set_value(&mut self, value: &str) -> std::result::Result<(), String> {
        if let Some(validator) = &self.validator {
            validator(value)?;
        }
        self.value = value.to_string();
        Ok(())
    }

    /// Flip a toggle. The validator sees the new state as `"true"` or
    /// `"false"` and may veto it. Text options are left alone.
    ///
    /// # Errors
    ///
    /// The validator's reason when it rejects the change.
    pub fn flip(&mut self) -> std::result::Result<(), String> {
        let Kind::Toggle { on, .. } = self.kind else {
            return Ok(());
        };
        let next = !on;
        if let Some(validator) = &self.validator {
            validator(&next.to_string())?;
        }
        if let Kind::Toggle { on, .. } = &mut self.kind {
            *on = next;
        }
        self.value = next.to_string();
        self.set_suboptions_enabled(next);
        Ok(())
    }

    fn style(&self) -> Style {
        let color = if self.enabled { Color::Yellow } else { Color::Cyan };
        Style::bold().with_fg(color)
    }
}

impl fmt::Debug for OptionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionItem")
            .field("label", &self.label)
            .field("value", &self.value)
            .field("kind", &self.kind)
            .field("enabled", &self.enabled)
            .field("validator", &self.validator.is_some())
            .field("suboptions", &self.suboptions)
            .finish()
    }
}

/// Position of a displayed row in the option tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slot {
    option: usize,
    sub: Option<usize>,
}

/// A boxed message, option rows, Back/Next and the selection's description.
#[derive(Debug)]
pub struct OptionPanel {
    base: PanelBase,
    message: String,
    options: Vec<OptionItem>,
    selected: usize,
    right_align_values: bool,
    options_top: u32,
    last_indent: u32,
    last_value_width: u32,
}

impl OptionPanel {
    #[must_use]
    pub fn new(ctx: UiContext, top: u32, message: impl Into<String>) -> Self {
        Self {
            base: PanelBase::new(ctx, "options", top, 0),
            message: message.into(),
            options: Vec::new(),
            selected: 0,
            right_align_values: false,
            options_top: 0,
            last_indent: 0,
            last_value_width: 20,
        }
    }

    /// Draw values flush against the right border instead of in a column.
    #[must_use]
    pub fn with_right_aligned_values(mut self) -> Self {
        self.right_align_values = true;
        self
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn add_option(&mut self, option: OptionItem) {
        self.options.push(option);
    }

    #[must_use]
    pub fn options(&self) -> &[OptionItem] {
        &self.options
    }

    /// Find an option or suboption by label.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<&OptionItem> {
        self.options
            .iter()
            .flat_map(|o| std::iter::once(o).chain(o.suboptions.iter()))
            .find(|o| o.label == label)
    }

    /// Index of the selection among displayed rows; the row count selects
    /// Back and one past it selects Next.
    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    fn displayed(&self) -> Vec<Slot> {
        let mut slots = Vec::new();
        for (i, option) in self.options.iter().enumerate() {
            if !option.enabled {
                continue;
            }
            slots.push(Slot { option: i, sub: None });
            for (j, sub) in option.suboptions.iter().enumerate() {
                if sub.enabled {
                    slots.push(Slot { option: i, sub: Some(j) });
                }
            }
        }
        slots
    }

    fn item(&self, slot: Slot) -> &OptionItem {
        let option = &self.options[slot.option];
        slot.sub.map_or(option, |j| &option.suboptions[j])
    }

    fn item_mut(&mut self, slot: Slot) -> &mut OptionItem {
        let option = &mut self.options[slot.option];
        match slot.sub {
            Some(j) => &mut option.suboptions[j],
            None => option,
        }
    }

    fn edit(&mut self, slot: Slot, row: u32, modal: &mut dyn ModalInput) -> Result<()> {
        let Some(region) = self.base.subregion() else {
            return Ok(());
        };
        let ctx = self.base.context().clone();
        let answer = {
            let mut field = TextField::new(
                region.y + self.options_top + row,
                region.x + self.last_indent,
                self.last_value_width.max(1),
                self.item(slot).value(),
            )
            .with_style(Style::standout().with_fg(Color::Yellow));
            let mut surface = ctx.lock();
            modal.read_line(&mut surface, &mut field)?
        };
        let Some(answer) = answer.filter(|a| !a.is_empty()) else {
            return Ok(());
        };

        if let Err(reason) = self.item_mut(slot).set_value(&answer) {
            tracing::debug!(option = %self.item(slot).label, %reason, "rejected option value");
            popups::show_message(&ctx, modal, &reason, Style::standout(), Some(REJECTED_WAIT))?;
        }
        Ok(())
    }
}

impl Panel for OptionPanel {
    fn base(&self) -> &PanelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PanelBase {
        &mut self.base
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        let (width, height) = (canvas.width(), canvas.height());
        let bold = Style::bold();
        canvas.draw_box(0, 0, height, width, Style::NONE);

        let text_width = width.saturating_sub(4);
        let message = split_str(&self.message, text_width as usize);
        for (row, line) in (1..).zip(&message) {
            canvas.addstr(row, 2, line, bold);
        }

        let mut y = u32::try_from(message.len()).unwrap_or(u32::MAX).saturating_add(2);
        self.options_top = y;

        let indent = self
            .options
            .iter()
            .map(|o| display_cols(&o.label))
            .max()
            .unwrap_or(0)
            + 5;

        let slots = self.displayed();
        let mut description = Vec::new();
        for (index, slot) in slots.iter().enumerate() {
            let option = self.item(*slot);
            let is_sub = slot.sub.is_some();
            let extra = if index == self.selected {
                description = split_str(&option.description, text_width as usize);
                Style::standout().with_bold()
            } else {
                Style::NONE
            };
            let style = option.style().merge(extra);

            let mut x = 2;
            if is_sub {
                let corner = canvas.surface().box_style(Style::NONE).bottom_left;
                canvas.addch(y, 2, corner, Style::NONE);
                canvas.hline(y, 3, 1, Style::NONE);
                x += 3;
            }
            let label_end = canvas.addstr(y, x, &option.label, style);
            let value = option.display_value();
            let value_len = display_cols(value);

            if self.right_align_values {
                let value_x = width.saturating_sub(2 + value_len);
                canvas.fill(y, label_end, value_x.saturating_sub(label_end), style);
                canvas.addstr(y, value_x, value, style);
            } else {
                canvas.fill(y, label_end, indent.saturating_sub(label_end), style);
                let value_end = canvas.addstr(y, indent, value, style);
                canvas.fill(y, value_end, width.saturating_sub(2).saturating_sub(value_end), style);
            }
            y += 1;
        }

        y += 1;
        let (back_style, next_style) = if self.selected == slots.len() {
            description = split_str(BACK_DESCRIPTION, text_width as usize);
            (bold.with_standout(), bold)
        } else if self.selected == slots.len() + 1 {
            description = split_str(NEXT_DESCRIPTION, text_width as usize);
            (bold, bold.with_standout())
        } else {
            (bold, bold)
        };
        canvas.addstr(y, 4, BACK_LABEL, back_style);
        canvas.addstr(y, width.saturating_sub(4 + display_cols(NEXT_LABEL)), NEXT_LABEL, next_style);
        y += 1;

        canvas.hline(y, 1, width.saturating_sub(2), Style::NONE);
        y += 1;
        for line in &description {
            canvas.addstr(y, 2, &pad_str(line, text_width as usize), Style::NONE);
            y += 1;
        }

        self.last_indent = indent;
        self.last_value_width = width.saturating_sub(indent + 2);
        Ok(())
    }

    fn handle_key(&mut self, key: &KeyEvent, modal: &mut dyn ModalInput) -> Result<KeyOutcome> {
        let slots = self.displayed();
        let count = slots.len() + 2;
        let si = self.selected.min(count - 1);

        if key.is(KeyCode::Up) {
            self.selected = (si + count - 1) % count;
        } else if key.is(KeyCode::Down) {
            self.selected = (si + 1) % count;
        } else if key.is_esc() {
            self.selected = slots.len();
        } else if is_selection_key(key) {
            if si == slots.len() {
                return Ok(KeyOutcome::Action(PanelAction::Back));
            }
            if si == slots.len() + 1 {
                return Ok(KeyOutcome::Action(PanelAction::Next));
            }
            let slot = slots[si];
            if self.item(slot).is_on().is_some() {
                if let Err(reason) = self.item_mut(slot).flip() {
                    let ctx = self.base.context().clone();
                    popups::show_message(&ctx, modal, &reason, Style::standout(), Some(REJECTED_WAIT))?;
                }
            } else {
                let row = u32::try_from(si).unwrap_or(u32::MAX);
                self.edit(slot, row, modal)?;
            }
        } else {
            return Ok(KeyOutcome::Ignored);
        }
        self.redraw(true, true)?;
        Ok(KeyOutcome::Consumed)
    }

    fn help(&self) -> Vec<HelpEntry> {
        vec![
            HelpEntry::new("up arrow", "select previous option"),
            HelpEntry::new("down arrow", "select next option"),
            HelpEntry::new("enter", "edit or toggle the selected option"),
            HelpEntry::new("esc", "select the back button"),
        ]
    }
}
