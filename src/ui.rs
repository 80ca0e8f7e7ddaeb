use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::preview::PreviewWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::scroll::LayoutReport;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(outer[0]);

    let total = app.tree_state.visible_count();
    let position = app
        .tree_state
        .selected_index()
        .map(|i| format!("{}/{} ", i + 1, total))
        .unwrap_or_default();
    let theme = &app.theme_colors;
    let tree_block = Block::default()
        .title(format!(" Files [{}] {}", app.tree_state.order().label(), position))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused_fg))
        .style(Style::default().bg(theme.tree_bg).fg(theme.tree_fg));
    let tree_inner = tree_block.inner(panels[0]);
    app.tree_area = tree_inner;

    // Apply any queued scroll against the rows as they are now.
    let row_height = app.scroll_sync.row_height();
    app.viewport
        .prepare((tree_inner.height / row_height) as usize, total);

    let tree_widget = TreeWidget::new(&app.tree_state, theme, app.use_icons)
        .offset(app.viewport.offset())
        .row_height(row_height)
        .block(tree_block);
    frame.render_widget(tree_widget, panels[0]);

    let preview_block = Block::default()
        .title(" Preview ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_fg))
        .style(Style::default().bg(theme.preview_bg).fg(theme.preview_fg));
    frame.render_widget(
        PreviewWidget::new(&app.preview, theme).block(preview_block),
        panels[1],
    );

    let path = app.selected_path();
    let info = app.selected_info();
    let order = app.tree_state.order().label();
    let mut status = StatusBarWidget::new(&path, &info, theme)
        .order_label(&order)
        .loading(app.is_loading());
    if let Some(msg) = &app.status_message {
        status = status.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(status, outer[1]);

    let report = LayoutReport {
        measured_extent: app.scroll_sync.extent_of(total),
        rendered_revision: Some(app.tree_state.tree.revision()),
    };
    app.viewport.record_layout(report);
}
