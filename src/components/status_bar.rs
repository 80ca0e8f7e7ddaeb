use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " ←→:fold  s:sort  o:dir  r:refresh  1-7:places  q:quit ";

/// Keep the last `budget` characters of `s`, prefixed with `...` when cut.
fn truncate_left(s: &str, budget: usize) -> String {
    let len = s.chars().count();
    if len <= budget {
        return s.to_string();
    }
    if budget <= 3 {
        return s.chars().take(budget).collect();
    }
    let tail: String = s.chars().skip(len - (budget - 3)).collect();
    format!("...{tail}")
}

/// Status bar: selected path, file details, ordering, and key hints, or a
/// transient status message.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    file_info: &'a str,
    order_label: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    loading: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, file_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            path_str,
            file_info,
            order_label: "",
            theme,
            status_message: None,
            is_error: false,
            loading: false,
        }
    }

    pub fn order_label(mut self, label: &'a str) -> Self {
        self.order_label = label;
        self
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    /// Show a loading marker while listings are in flight.
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;
        let base = Style::default().bg(self.theme.status_bg).fg(self.theme.status_fg);
        buf.set_style(area, base);

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default().bg(self.theme.error_fg).fg(self.theme.status_fg)
            } else {
                base.fg(self.theme.info_fg)
            };
            let shown: String = msg.chars().take(width).collect();
            let display = format!("{shown:<width$}");
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        let hints_len = KEY_HINTS.chars().count();
        let mut right = String::new();
        if self.loading {
            right.push_str(" ⟳");
        }
        if !self.order_label.is_empty() {
            right.push_str(&format!(" [{}]", self.order_label));
        }
        let right_len = right.chars().count();

        // Hints are the first thing to go on narrow terminals.
        let show_hints = width > hints_len + right_len + 20;
        let remaining = width
            .saturating_sub(right_len)
            .saturating_sub(if show_hints { hints_len } else { 0 });

        let info_len = self.file_info.chars().count();
        let path_budget = remaining.saturating_sub(info_len + 1);
        let path_display = truncate_left(self.path_str, path_budget);
        let info_budget = remaining.saturating_sub(path_display.chars().count());
        let info_display: String = self.file_info.chars().take(info_budget).collect();
        let gap = remaining
            .saturating_sub(path_display.chars().count())
            .saturating_sub(info_display.chars().count());

        let mut spans = vec![
            Span::styled(path_display, base),
            Span::styled(" ".repeat(gap), base),
            Span::styled(info_display, base.fg(self.theme.info_fg)),
            Span::styled(right, base.fg(self.theme.accent_fg).add_modifier(Modifier::BOLD)),
        ];
        if show_hints {
            spans.push(Span::styled(
                KEY_HINTS,
                base.fg(self.theme.dim_fg).add_modifier(Modifier::DIM),
            ));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
