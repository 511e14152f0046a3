use std::collections::HashSet;
use std::ops::Range;

use tracing::debug;

use super::expansion::ExpansionController;
use super::path::FolderPath;
use super::store::TreeStore;

/// Byte range of the first case-insensitive occurrence of `needle` in
/// `haystack`. An empty needle never matches.
pub fn match_span(haystack: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    for (start, _) in haystack.char_indices() {
        let mut want = needle.iter();
        let mut end = start;
        let mut pending = want.next();
        for (offset, ch) in haystack[start..].char_indices() {
            let Some(_) = pending else { break };
            let mut ok = true;
            for lower in ch.to_lowercase() {
                match pending {
                    None => break,
                    Some(&w) if w == lower => pending = want.next(),
                    Some(_) => {
                        ok = false;
                        break;
                    }
                }
            }
            if !ok {
                break;
            }
            end = start + offset + ch.len_utf8();
        }
        if pending.is_none() {
            return Some(start..end);
        }
    }
    None
}

/// Case-insensitive substring test used by search.
pub fn name_matches(name: &str, term: &str) -> bool {
    match_span(name, term).is_some()
}

/// Outcome of one search pass. Keys are canonical path keys.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Matching keys in tree order.
    pub matches: Vec<String>,
    /// Ancestors that must be open for every match to be visible.
    pub ancestors_to_expand: HashSet<String>,
    /// `matches` plus `ancestors_to_expand`: every row of the filtered view.
    pub included: HashSet<String>,
}

/// Filter the loaded tree by `term`.
///
/// With `scope`, only the scope folder and its loaded descendants are
/// candidates; ancestors above the scope are still reported so the matches
/// stay reachable from the top of the tree.
pub fn run(store: &TreeStore, term: &str, scope: Option<&FolderPath>) -> SearchResult {
    let mut result = SearchResult::default();
    if term.is_empty() {
        return result;
    }

    let candidates = match scope {
        Some(scope) if !scope.is_root() => match store.get_node(scope) {
            Some(node) => {
                let mut nodes = Vec::new();
                node.walk(&mut |n| nodes.push(n));
                nodes
            }
            None => Vec::new(),
        },
        _ => store.loaded_nodes(),
    };

    for node in candidates {
        if !name_matches(&node.name, term) {
            continue;
        }
        let key = node.key();
        for ancestor in store.index().ancestors_of(&key) {
            result.included.insert(ancestor.clone());
            result.ancestors_to_expand.insert(ancestor);
        }
        result.included.insert(key.clone());
        result.matches.push(key);
    }
    result
}

/// Active search term plus the filtered view it produces.
#[derive(Debug, Default, Clone)]
pub struct SearchState {
    pub term: String,
    /// `None` searches the whole loaded tree.
    pub scope_root: Option<FolderPath>,
    pub result: SearchResult,
    /// Rows the user folded in the filtered view for the current term.
    /// Cleared whenever the term changes; never touches expansion state.
    pub folded: HashSet<String>,
}

/// How a term change affected the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchChange {
    Started,
    Updated,
    Cleared,
    Unchanged,
}

/// Owns the search state of one picker, including the expansion snapshot
/// taken when a search starts.
#[derive(Debug, Default)]
pub struct SearchEngine {
    state: SearchState,
    snapshot: Option<HashSet<String>>,
}

impl SearchEngine {
    pub fn is_active(&self) -> bool {
        !self.state.term.is_empty()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn term(&self) -> &str {
        &self.state.term
    }

    /// Set the term. `scope` is only read when a new search starts; while
    /// typing, the scope chosen at the first keystroke is kept.
    pub fn set_term(
        &mut self,
        store: &TreeStore,
        expansion: &mut ExpansionController,
        term: &str,
        scope: Option<&FolderPath>,
    ) -> SearchChange {
        if term == self.state.term {
            return SearchChange::Unchanged;
        }
        if term.is_empty() {
            self.clear(expansion);
            return SearchChange::Cleared;
        }

        let change = if self.is_active() {
            SearchChange::Updated
        } else {
            self.snapshot = Some(expansion.snapshot());
            self.state.scope_root = scope.filter(|s| !s.is_root()).cloned();
            SearchChange::Started
        };
        self.state.term = term.to_string();
        self.state.folded.clear();
        self.rerun(store);
        change
    }

    /// Recompute after the tree changed.
    pub fn rerun(&mut self, store: &TreeStore) {
        if !self.is_active() {
            return;
        }
        self.state.result = run(store, &self.state.term, self.state.scope_root.as_ref());
        debug!(
            term = %self.state.term,
            matches = self.state.result.matches.len(),
            scoped = self.state.scope_root.is_some(),
            "search updated"
        );
    }

    /// Drop the term and put back the expansion set from before the search.
    pub fn clear(&mut self, expansion: &mut ExpansionController) {
        if let Some(snapshot) = self.snapshot.take() {
            expansion.restore(&snapshot, self.state.scope_root.as_ref());
        }
        self.state = SearchState::default();
    }

    /// Forget the search without touching expansion, used on tree reset.
    pub fn discard(&mut self) {
        self.snapshot = None;
        self.state = SearchState::default();
    }

    /// Whether a row's filtered children are shown.
    pub fn shows_children(&self, key: &str) -> bool {
        (key.is_empty() || self.state.result.ancestors_to_expand.contains(key))
            && !self.state.folded.contains(key)
    }

    pub fn includes(&self, key: &str) -> bool {
        self.state.result.included.contains(key)
    }

    pub fn fold(&mut self, key: &str) -> bool {
        self.state.result.ancestors_to_expand.contains(key)
            && self.state.folded.insert(key.to_string())
    }

    pub fn unfold(&mut self, key: &str) -> bool {
        self.state.folded.remove(key)
    }
}
