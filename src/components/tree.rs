use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::picker::ViewRow;
use crate::theme::ThemeColors;

/// Folder tree widget: one line per visible row, box-drawing guides,
/// expansion and loading markers, and the search match highlighted.
pub struct TreeWidget<'a> {
    rows: &'a [ViewRow],
    offset: usize,
    theme: &'a ThemeColors,
    placeholder: Option<&'a str>,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(rows: &'a [ViewRow], offset: usize, theme: &'a ThemeColors) -> Self {
        Self {
            rows,
            offset,
            theme,
            placeholder: None,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Text shown when there are no rows.
    pub fn placeholder(mut self, text: &'a str) -> Self {
        self.placeholder = Some(text);
        self
    }

    /// A row is the last of its siblings when the next row at its depth or
    /// shallower is shallower.
    fn is_last_sibling(rows: &[ViewRow], index: usize) -> bool {
        let depth = rows[index].depth;
        rows[index + 1..]
            .iter()
            .find(|r| r.depth <= depth)
            .map_or(true, |r| r.depth < depth)
    }

    /// Guides for every ancestor level, then the connector for this row.
    fn build_prefix(rows: &[ViewRow], index: usize) -> String {
        let row = &rows[index];
        let mut prefix = String::new();
        for d in 0..row.depth {
            // Nearest row above at depth d is the ancestor at that level.
            let ancestor_is_last = (0..index)
                .rev()
                .find(|&j| rows[j].depth == d)
                .map_or(true, |j| Self::is_last_sibling(rows, j));
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix.push_str(if Self::is_last_sibling(rows, index) {
            "└─"
        } else {
            "├─"
        });
        prefix
    }

    fn indicator(row: &ViewRow) -> &'static str {
        if !row.expandable {
            "  "
        } else if row.is_expanded {
            "▾ "
        } else {
            "▸ "
        }
    }

    fn name_spans(&self, row: &'a ViewRow, base: Style) -> Vec<Span<'a>> {
        let name = row.name.as_str();
        match &row.match_span {
            Some(span) if name.is_char_boundary(span.start) && name.is_char_boundary(span.end) => {
                let hit = base
                    .fg(self.theme.tree_match_fg)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                vec![
                    Span::styled(&name[..span.start], base),
                    Span::styled(&name[span.clone()], hit),
                    Span::styled(&name[span.end..], base),
                ]
            }
            _ => vec![Span::styled(name, base)],
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if visible_height == 0 || inner_area.width == 0 {
            return;
        }

        if self.rows.is_empty() {
            if let Some(text) = self.placeholder {
                let line = Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(self.theme.dim_fg)
                        .add_modifier(Modifier::ITALIC),
                ));
                buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            }
            return;
        }

        let visible = self
            .rows
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(visible_height);

        for (i, (idx, row)) in visible.enumerate() {
            let y = inner_area.y + i as u16;

            let mut base = if row.expandable {
                Style::default().fg(self.theme.tree_folder_fg)
            } else {
                Style::default().fg(self.theme.tree_fg)
            };
            if row.is_selected {
                base = base
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD);
            }
            if row.is_focused {
                base = base.bg(self.theme.tree_focused_bg);
            }
            let guide = Style::default().fg(self.theme.tree_guide_fg);

            let mut spans = vec![
                Span::styled(Self::build_prefix(self.rows, idx), guide),
                Span::styled(Self::indicator(row), base),
            ];
            if row.is_selected {
                spans.push(Span::styled("● ", base));
            }
            spans.extend(self.name_spans(row, base));
            if row.is_loading {
                spans.push(Span::styled(
                    " loading…",
                    Style::default()
                        .fg(self.theme.dim_fg)
                        .add_modifier(Modifier::ITALIC),
                ));
            }

            if row.is_focused {
                // Fill the rest of the line so the focus bar spans the panel.
                let used: usize = spans.iter().map(|s| s.width()).sum();
                let pad = (inner_area.width as usize).saturating_sub(used);
                spans.push(Span::styled(" ".repeat(pad), base));
            }

            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}
