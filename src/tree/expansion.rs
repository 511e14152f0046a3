use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::TreeError;
use crate::service::{FetchKind, FetchRequest, FetchResponse};

use super::path::{key_is_descendant, parent_key, FolderPath};
use super::store::TreeStore;

/// Which folders are expanded and which have a fetch in flight.
///
/// A key may be in both sets at once, e.g. an expanded folder that is
/// being refreshed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpansionState {
    pub expanded: HashSet<String>,
    pub loading: HashSet<String>,
}

impl ExpansionState {
    pub fn is_expanded(&self, key: &str) -> bool {
        key.is_empty() || self.expanded.contains(key)
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.loading.contains(key)
    }

    /// Remove `key` and every descendant from the expanded set.
    fn fold(&mut self, key: &str) {
        self.expanded
            .retain(|k| k != key && !key_is_descendant(key, k));
    }
}

/// Drives children-on-demand loading.
///
/// Every method that needs data from the folder service returns a
/// [`FetchRequest`] for the caller to dispatch; at most one request per
/// path is outstanding at a time.
#[derive(Debug, Default)]
pub struct ExpansionController {
    state: ExpansionState,
}

impl ExpansionController {
    pub fn state(&self) -> &ExpansionState {
        &self.state
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.state.is_expanded(key)
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.state.is_loading(key)
    }

    /// Forget everything, e.g. when the namespace changes.
    pub fn reset(&mut self) {
        self.state = ExpansionState::default();
    }

    /// Ask for the top-level listing of the current tree.
    pub fn request_root(&mut self, store: &TreeStore) -> Option<FetchRequest> {
        if !self.state.loading.insert(String::new()) {
            return None;
        }
        Some(FetchRequest {
            generation: store.generation(),
            path: FolderPath::root(),
            kind: FetchKind::Root,
            expand_on_arrival: false,
        })
    }

    /// Expand if collapsed, collapse if expanded.
    pub fn toggle(&mut self, store: &TreeStore, path: &FolderPath) -> Option<FetchRequest> {
        if path.is_root() {
            return None;
        }
        if self.state.expanded.contains(&path.key()) {
            self.collapse(path);
            None
        } else {
            self.expand(store, path)
        }
    }

    /// Expand a folder, fetching its children first if they are unknown.
    ///
    /// Repeated calls while a fetch is in flight are dropped.
    pub fn expand(&mut self, store: &TreeStore, path: &FolderPath) -> Option<FetchRequest> {
        let key = path.key();
        let node = store.get_by_key(&key)?;
        if self.state.loading.contains(&key) {
            debug!(path = %path, "expand coalesced with in-flight fetch");
            return None;
        }
        if node.needs_fetch() {
            self.state.loading.insert(key);
            debug!(path = %path, "fetching children");
            return Some(FetchRequest {
                generation: store.generation(),
                path: path.clone(),
                kind: FetchKind::Children,
                expand_on_arrival: true,
            });
        }
        if node.is_expandable() {
            self.state.expanded.insert(key);
        }
        None
    }

    /// Collapse a folder and fold its whole visible subtree.
    pub fn collapse(&mut self, path: &FolderPath) {
        self.state.fold(&path.key());
    }

    /// Re-fetch children of a folder that already has some loaded.
    pub fn refresh(&mut self, store: &TreeStore, path: &FolderPath) -> Option<FetchRequest> {
        let key = path.key();
        if path.is_root() {
            return self.request_root(store);
        }
        store.get_by_key(&key)?;
        if !self.state.loading.insert(key) {
            return None;
        }
        Some(FetchRequest {
            generation: store.generation(),
            path: path.clone(),
            kind: FetchKind::Children,
            expand_on_arrival: false,
        })
    }

    /// Expand every ancestor of a loaded path so it becomes visible.
    pub fn reveal(&mut self, store: &TreeStore, path: &FolderPath) -> bool {
        let key = path.key();
        if !store.index().contains(&key) {
            return false;
        }
        for ancestor in store.index().ancestors_of(&key) {
            self.state.expanded.insert(ancestor);
        }
        true
    }

    /// Apply a finished fetch. Returns notices for the user or the log.
    pub fn complete(&mut self, store: &mut TreeStore, response: FetchResponse) -> Vec<TreeError> {
        let FetchResponse { request, result } = response;
        let key = request.path.key();

        if request.generation != store.generation() {
            info!(
                path = %request.path,
                generation = request.generation,
                current = store.generation(),
                "discarding response from previous tree"
            );
            return vec![TreeError::StaleResponse { path: request.path }];
        }
        self.state.loading.remove(&key);

        let entries = match result {
            Ok(entries) => entries,
            Err(source) => {
                warn!(path = %request.path, error = %source, "fetch failed");
                self.state.fold(&key);
                return vec![TreeError::FetchFailed {
                    path: request.path,
                    source,
                }];
            }
        };

        let report = match store.merge_children(&request.path, entries) {
            Ok(report) => report,
            Err(err) => return vec![err],
        };

        if request.expand_on_arrival && self.parent_is_open(&key) {
            if let Some(node) = store.get_by_key(&key) {
                if !node.children.is_empty() {
                    self.state.expanded.insert(key);
                }
            }
        }
        report.notices
    }

    /// Snapshot of the expanded set, used to undo search-time changes.
    pub fn snapshot(&self) -> HashSet<String> {
        self.state.expanded.clone()
    }

    /// Put back a snapshot. With a scope, only keys at or below the scope
    /// are restored; everything else keeps its current state.
    pub fn restore(&mut self, snapshot: &HashSet<String>, scope: Option<&FolderPath>) {
        match scope {
            None => self.state.expanded = snapshot.clone(),
            Some(scope) => {
                let scope_key = scope.key();
                let inside = |k: &str| k == scope_key || key_is_descendant(&scope_key, k);
                self.state.expanded.retain(|k| !inside(k.as_str()));
                self.state.expanded.extend(
                    snapshot
                        .iter()
                        .filter(|k| inside(k.as_str()))
                        .cloned(),
                );
            }
        }
    }

    fn parent_is_open(&self, key: &str) -> bool {
        parent_key(key).is_some_and(|parent| self.state.is_expanded(parent))
    }
}
