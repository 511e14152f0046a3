use std::time::{Duration, Instant};

use crate::tree::expansion::ExpansionController;
use crate::tree::node::FolderNode;
use crate::tree::path::FolderPath;
use crate::tree::search::SearchEngine;
use crate::tree::store::TreeStore;

/// Default typeahead reset interval.
pub const DEFAULT_TYPEAHEAD_TIMEOUT_MS: u64 = 500;

/// One visible row of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub key: String,
    pub path: FolderPath,
    pub name: String,
    /// Top-level folders have depth 0.
    pub depth: usize,
    /// `None` for top-level folders.
    pub parent_key: Option<String>,
    pub expandable: bool,
    /// Children are shown directly below this row.
    pub expanded: bool,
}

/// Produce exactly the rows a user would see, in document order.
///
/// Outside search a folder's children follow it only when it is expanded.
/// While a search is active the filtered tree is shown as if every
/// ancestor of a match were open, without touching the expansion state.
pub fn flatten(
    store: &TreeStore,
    expansion: &ExpansionController,
    search: &SearchEngine,
) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    for child in &store.root().children {
        flatten_node(child, 0, None, expansion, search, &mut rows);
    }
    rows
}

fn flatten_node(
    node: &FolderNode,
    depth: usize,
    parent_key: Option<&str>,
    expansion: &ExpansionController,
    search: &SearchEngine,
    rows: &mut Vec<FlatRow>,
) {
    let key = node.key();
    let searching = search.is_active();
    if searching && !search.includes(&key) {
        return;
    }

    let open = if searching {
        search.shows_children(&key)
    } else {
        expansion.is_expanded(&key)
    };
    let has_visible_children = if searching {
        node.children.iter().any(|c| search.includes(&c.key()))
    } else {
        !node.children.is_empty()
    };

    rows.push(FlatRow {
        key: key.clone(),
        path: node.path.clone(),
        name: node.name.clone(),
        depth,
        parent_key: parent_key.map(str::to_string),
        expandable: node.is_expandable(),
        expanded: open && has_visible_children,
    });

    if open {
        for child in &node.children {
            flatten_node(child, depth + 1, Some(&key), expansion, search, rows);
        }
    }
}

/// Keys the navigation engine understands, independent of any terminal
/// library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// Enter or Space.
    Activate,
    Char(char),
}

/// Typeahead buffer with an explicit last-keystroke timestamp.
#[derive(Debug, Clone)]
pub struct Typeahead {
    buffer: String,
    last: Option<Instant>,
    timeout: Duration,
}

impl Default for Typeahead {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TYPEAHEAD_TIMEOUT_MS))
    }
}

impl Typeahead {
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: String::new(),
            last: None,
            timeout,
        }
    }

    /// Append a keystroke, starting over if the previous one is too old.
    pub fn push(&mut self, ch: char, now: Instant) -> &str {
        let expired = self
            .last
            .map_or(true, |last| now.saturating_duration_since(last) > self.timeout);
        if expired {
            self.buffer.clear();
        }
        self.buffer.push(ch);
        self.last = Some(now);
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last = None;
    }
}

/// Next row whose name starts with `prefix` (case-insensitive).
///
/// A single character (or the same character repeated) searches from the
/// row after `focus`, so repeated presses cycle through candidates. A
/// longer prefix starts at `focus` itself, so refining the prefix keeps a
/// row that still matches. Both wrap around to the top.
pub fn find_typeahead(rows: &[FlatRow], focus: Option<usize>, prefix: &str) -> Option<usize> {
    if rows.is_empty() || prefix.is_empty() {
        return None;
    }
    let mut chars = prefix.chars();
    let first = chars.next()?;
    let repeated = chars.all(|c| c == first);
    let (needle, start) = match focus {
        Some(i) if repeated => (first.to_string(), i + 1),
        Some(i) => (prefix.to_string(), i),
        None => (prefix.to_string(), 0),
    };
    let needle = needle.to_lowercase();
    (0..rows.len())
        .map(|offset| (start + offset) % rows.len())
        .find(|&i| rows[i].name.to_lowercase().starts_with(&needle))
}

/// The scrolled window over the row list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub offset: usize,
    pub height: usize,
}

impl Viewport {
    /// Adjust the offset once so row `index` lies inside the window.
    pub fn scroll_into_view(&mut self, index: usize) {
        if self.height == 0 {
            return;
        }
        if index < self.offset {
            self.offset = index;
        } else if index >= self.offset + self.height {
            self.offset = index + 1 - self.height;
        }
    }

    /// Keep the window from hanging past the end after rows disappear.
    pub fn clamp(&mut self, len: usize) {
        self.offset = self.offset.min(len.saturating_sub(self.height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::FolderEntry;

    fn row(name: &str) -> FlatRow {
        FlatRow {
            key: name.to_string(),
            path: FolderPath::from_segments([name]),
            name: name.to_string(),
            depth: 0,
            parent_key: None,
            expandable: false,
            expanded: false,
        }
    }

    fn rows(names: &[&str]) -> Vec<FlatRow> {
        names.iter().map(|n| row(n)).collect()
    }

    fn p(segments: &[&str]) -> FolderPath {
        FolderPath::from_segments(segments.iter().copied())
    }

    fn store() -> TreeStore {
        let mut store = TreeStore::new("ns");
        store
            .merge_children(
                &FolderPath::root(),
                vec![
                    FolderEntry::new("Clients", "/Clients", true),
                    FolderEntry::new("Internal", "/Internal", false),
                ],
            )
            .unwrap();
        store
            .merge_children(
                &p(&["Clients"]),
                vec![
                    FolderEntry::new("Acme", "/Clients/Acme", false),
                    FolderEntry::new("Globex", "/Clients/Globex", false),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn collapsed_tree_shows_top_level_only() {
        let store = store();
        let flat = flatten(
            &store,
            &ExpansionController::default(),
            &SearchEngine::default(),
        );
        let names: Vec<&str> = flat.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Clients", "Internal"]);
        assert!(flat[0].expandable && !flat[0].expanded);
    }

    #[test]
    fn expanded_children_follow_parent() {
        let store = store();
        let mut expansion = ExpansionController::default();
        expansion.expand(&store, &p(&["Clients"]));
        let flat = flatten(&store, &expansion, &SearchEngine::default());
        let names: Vec<&str> = flat.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Clients", "Acme", "Globex", "Internal"]);
        assert_eq!(flat[1].depth, 1);
        assert_eq!(flat[1].parent_key.as_deref(), Some("Clients"));
        assert!(flat[0].expanded);
    }

    #[test]
    fn search_view_is_implicitly_expanded() {
        let store = store();
        let mut expansion = ExpansionController::default();
        let mut search = SearchEngine::default();
        search.set_term(&store, &mut expansion, "glob", None);
        let flat = flatten(&store, &expansion, &search);
        let names: Vec<&str> = flat.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Clients", "Globex"]);
        assert!(flat[0].expanded);
        assert!(!expansion.is_expanded("Clients"));
    }

    #[test]
    fn typeahead_finds_next_prefix() {
        let flat = rows(&["Contracts", "Receipts", "Reports"]);
        assert_eq!(find_typeahead(&flat, Some(0), "re"), Some(1));
    }

    #[test]
    fn typeahead_refines_in_place_and_cycles_on_repeat() {
        let flat = rows(&["Contracts", "Receipts", "Reports"]);
        assert_eq!(find_typeahead(&flat, Some(1), "re"), Some(1));
        assert_eq!(find_typeahead(&flat, Some(1), "rep"), Some(2));
        assert_eq!(find_typeahead(&flat, Some(1), "r"), Some(2));
        assert_eq!(find_typeahead(&flat, Some(2), "rr"), Some(1));
    }

    #[test]
    fn typeahead_wraps_around() {
        let flat = rows(&["Contracts", "Receipts", "Reports"]);
        assert_eq!(find_typeahead(&flat, Some(2), "c"), Some(0));
        assert_eq!(find_typeahead(&flat, Some(0), "zz"), None);
    }

    #[test]
    fn typeahead_buffer_resets_after_timeout() {
        let mut typeahead = Typeahead::new(Duration::from_millis(500));
        let start = Instant::now();
        typeahead.push('r', start);
        assert_eq!(typeahead.push('e', start + Duration::from_millis(200)), "re");
        assert_eq!(typeahead.push('x', start + Duration::from_millis(800)), "x");
    }

    #[test]
    fn viewport_scrolls_minimally() {
        let mut viewport = Viewport {
            offset: 0,
            height: 5,
        };
        viewport.scroll_into_view(3);
        assert_eq!(viewport.offset, 0);
        viewport.scroll_into_view(7);
        assert_eq!(viewport.offset, 3);
        viewport.scroll_into_view(1);
        assert_eq!(viewport.offset, 1);
        viewport.clamp(4);
        assert_eq!(viewport.offset, 0);
    }
}
