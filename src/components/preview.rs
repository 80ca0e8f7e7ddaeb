use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::PreviewState;
use crate::theme::ThemeColors;

/// Plain-text preview of the selected file, with line numbers.
pub struct PreviewWidget<'a> {
    preview_state: &'a PreviewState,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> PreviewWidget<'a> {
    pub fn new(preview_state: &'a PreviewState, theme: &'a ThemeColors) -> Self {
        Self {
            preview_state,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }
}

impl<'a> Widget for PreviewWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let state = self.preview_state;
        if state.lines.is_empty() {
            let msg = state.placeholder.as_deref().unwrap_or("No preview");
            let line = Line::from(Span::styled(msg, Style::default().fg(self.theme.dim_fg)));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        let gutter = state.lines.len().to_string().len();
        let number_style = Style::default().fg(self.theme.preview_line_nr_fg);
        let text_style = Style::default().fg(self.theme.preview_fg);
        let start = state.scroll_offset.min(state.lines.len());

        for (i, text) in state.lines[start..]
            .iter()
            .take(inner.height as usize)
            .enumerate()
        {
            let line = Line::from(vec![
                Span::styled(format!("{:>gutter$} ", start + i + 1), number_style),
                Span::styled(text.as_str(), text_style),
            ]);
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}
