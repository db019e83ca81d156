//! Single-line text panel, used for the header and the toolbar.

use crate::context::UiContext;
use crate::error::Result;
use crate::panel::{Canvas, Extent, Panel, PanelBase};
use crate::style::Style;

/// Displays one line of styled text.
#[derive(Debug)]
pub struct LabelPanel {
    base: PanelBase,
    message: String,
    style: Style,
}

impl LabelPanel {
    #[must_use]
    pub fn new(ctx: UiContext, name: &str) -> Self {
        Self {
            base: PanelBase::new(ctx, name, 0, 0).with_height(Extent::Fixed(1)),
            message: String::new(),
            style: Style::NONE,
        }
    }

    /// Replace the message. Takes effect on the next forced redraw.
    pub fn set_message(&mut self, message: impl Into<String>, style: Style) {
        self.message = message.into();
        self.style = style;
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn style(&self) -> Style {
        self.style
    }
}

impl Panel for LabelPanel {
    fn base(&self) -> &PanelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PanelBase {
        &mut self.base
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        canvas.addstr(0, 0, &self.message, self.style);
        Ok(())
    }
}
