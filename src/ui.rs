use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::search::SearchBarWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::theme::ThemeColors;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame, theme: &ThemeColors) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Search bar
    let search = app.picker.search().state();
    let scope = search.scope_root.as_ref().map(|p| p.to_string());
    let search_bar = SearchBarWidget::new(&search.term, theme)
        .editing(app.mode == AppMode::Search)
        .match_count(search.result.matches.len())
        .scope(scope);
    frame.render_widget(search_bar, chunks[0]);

    // Tree panel
    let block = Block::default()
        .title(format!(" {} ", app.picker.namespace()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.mode == AppMode::Search {
            theme.border_fg
        } else {
            theme.border_focused_fg
        }));
    let inner = block.inner(chunks[1]);
    app.tree_area = Some(inner);
    app.picker.set_viewport_height(inner.height as usize);

    let placeholder = if app.picker.is_loading() {
        "Loading…"
    } else if app.picker.search().is_active() {
        "No matching folders"
    } else {
        "No folders"
    };
    let tree = TreeWidget::new(app.picker.rows(), app.picker.viewport().offset, theme)
        .placeholder(placeholder)
        .block(block);
    frame.render_widget(tree, chunks[1]);

    // Status bar
    let target = match &app.upload_target {
        Some(t) => format!("Target: {}", t.path),
        None => "No folder selected".to_string(),
    };
    let mut status = StatusBarWidget::new(app.picker.namespace(), &target, theme)
        .loading(app.picker.is_loading());
    if let Some((msg, _)) = &app.status_message {
        status = status.status_message(msg, app.status_is_error);
    }
    frame.render_widget(status, chunks[2]);
}
