use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " /:search  enter:select  tab:namespace  ^r:refresh  esc:quit ";

/// Status bar: namespace, current upload target, key hints, or a transient
/// status message that replaces them.
pub struct StatusBarWidget<'a> {
    namespace: &'a str,
    target: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    loading: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(namespace: &'a str, target: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            namespace,
            target,
            theme,
            status_message: None,
            is_error: false,
            loading: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

/// Pad or truncate to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let line = Line::from(Span::styled(fit(msg, width), style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [namespace] [target] [loading] ... [key_hints]
        let ns_display = format!(" {} ", self.namespace);
        let target_display = format!(" {}", self.target);
        let loading_display = if self.loading { " loading…" } else { "" };

        let used = ns_display.chars().count()
            + target_display.chars().count()
            + loading_display.chars().count();
        let hints = if used + KEY_HINTS.len() <= width {
            KEY_HINTS
        } else {
            ""
        };
        let pad = width.saturating_sub(used + hints.len());

        let spans = vec![
            Span::styled(
                ns_display,
                Style::default()
                    .bg(self.theme.accent_fg)
                    .fg(self.theme.status_bg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(target_display, Style::default().fg(self.theme.status_fg)),
            Span::styled(
                loading_display,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::raw(" ".repeat(pad)),
            Span::styled(
                hints,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ),
        ];

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
