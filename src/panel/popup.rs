//! Boxed query with a single-line response field.
//!
//! A library widget for applications that want a framed question at a
//! fixed spot. The built-in prompts (`popups::input_prompt`, the log and
//! output save prompts) ask on the status row instead and do not use it.

use crate::context::UiContext;
use crate::error::Result;
use crate::panel::{Canvas, Extent, ModalInput, Panel, PanelBase, TextField};
use crate::style::Style;
use crate::text::split_str;

/// A popup asking the user one question.
#[derive(Debug)]
pub struct PopupPanel {
    base: PanelBase,
    query: Option<String>,
    query_style: Style,
    default_response: String,
    response_top: u32,
    response_left: u32,
    response_width: u32,
}

impl PopupPanel {
    /// Popup at `(top, left)` of at most `height` by `width` cells.
    #[must_use]
    pub fn new(ctx: UiContext, top: u32, left: u32, height: u32, width: u32) -> Self {
        let base = PanelBase::new(ctx, "popup", top, left)
            .with_height(Extent::Fixed(height))
            .with_width(Extent::Fixed(width));
        Self {
            base,
            query: None,
            query_style: Style::bold(),
            default_response: String::new(),
            response_top: 0,
            response_left: 0,
            response_width: 0,
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>, style: Option<Style>) {
        self.query = Some(query.into());
        self.query_style = style.unwrap_or_else(Style::bold);
    }

    pub fn set_default_response(&mut self, response: impl Into<String>) {
        self.default_response = response.into();
    }

    /// Ask for input, blocking the calling (event-loop) thread.
    ///
    /// The response field is pre-filled with the default response. Returns
    /// the trimmed answer, or `None` if the user cancelled or the popup has
    /// no room on screen.
    pub fn get_user_response(&mut self, modal: &mut dyn ModalInput) -> Result<Option<String>> {
        self.base.set_visible(true);
        self.redraw(true, true)?;
        let Some(region) = self.base.subregion() else {
            return Ok(None);
        };
        if self.response_top >= region.height || self.response_left >= region.width {
            return Ok(None);
        }

        let width = self
            .response_width
            .min(region.width - self.response_left)
            .max(1);
        let mut field = TextField::new(
            region.y + self.response_top,
            region.x + self.response_left,
            width,
            &self.default_response,
        )
        .with_style(Style::standout());

        let ctx = self.base.context().clone();
        let mut surface = ctx.lock();
        modal.read_line(&mut surface, &mut field)
    }
}

impl Panel for PopupPanel {
    fn base(&self) -> &PanelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PanelBase {
        &mut self.base
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        let (width, height) = (canvas.width(), canvas.height());
        canvas.draw_box(0, 0, height, width, Style::NONE);

        let mut y = 2;
        if let Some(query) = &self.query {
            for line in split_str(query, width.saturating_sub(4) as usize) {
                canvas.addstr(y, 2, &line, self.query_style);
                y += 1;
            }
        }

        self.response_top = y + 1;
        self.response_left = 2;
        self.response_width = width.saturating_sub(6);
        Ok(())
    }
}
