use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// One-line search bar shown above the tree.
pub struct SearchBarWidget<'a> {
    term: &'a str,
    editing: bool,
    match_count: usize,
    scope: Option<String>,
    theme: &'a ThemeColors,
}

impl<'a> SearchBarWidget<'a> {
    pub fn new(term: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            term,
            editing: false,
            match_count: 0,
            scope: None,
            theme,
        }
    }

    /// Show a cursor after the term.
    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    pub fn match_count(mut self, count: usize) -> Self {
        self.match_count = count;
        self
    }

    /// Folder the search is limited to.
    pub fn scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }
}

impl<'a> Widget for SearchBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let prompt_style = Style::default()
            .fg(self.theme.accent_fg)
            .add_modifier(Modifier::BOLD);
        let dim = Style::default().fg(self.theme.dim_fg);

        if self.term.is_empty() && !self.editing {
            let line = Line::from(vec![
                Span::styled("/ ", prompt_style),
                Span::styled("Press / to search loaded folders", dim),
            ]);
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let mut spans = vec![
            Span::styled("/ ", prompt_style),
            Span::styled(self.term, Style::default().fg(self.theme.tree_fg)),
        ];
        if self.editing {
            spans.push(Span::styled(
                " ",
                Style::default().bg(self.theme.tree_fg),
            ));
        }
        if !self.term.is_empty() {
            let count = match self.match_count {
                0 => "  no matches".to_string(),
                1 => "  1 match".to_string(),
                n => format!("  {} matches", n),
            };
            let count_style = if self.match_count == 0 {
                Style::default().fg(self.theme.error_fg)
            } else {
                dim
            };
            spans.push(Span::styled(count, count_style));
        }
        if let Some(scope) = self.scope {
            spans.push(Span::styled(format!(" in {}", scope), dim));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
