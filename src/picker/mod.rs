//! One folder picker instance: tree, expansion, search, selection and
//! keyboard state owned together and driven by discrete events.
//!
//! Every mutation runs synchronously and ends by recomputing the view
//! rows. Work that needs the folder service is queued as
//! [`FetchRequest`]s for the caller to dispatch; answers come back through
//! [`FolderPicker::apply_response`].

pub mod nav;
pub mod selection;

use std::collections::HashSet;
use std::ops::Range;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::TreeError;
use crate::service::{FetchRequest, FetchResponse};
use crate::tree::expansion::ExpansionController;
use crate::tree::path::FolderPath;
use crate::tree::search::{match_span, SearchChange, SearchEngine};
use crate::tree::store::TreeStore;

use nav::{find_typeahead, flatten, FlatRow, NavKey, Typeahead, Viewport};
use selection::{SelectionSink, SelectionState, UploadTarget};

/// Tunables for a picker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptions {
    pub typeahead_timeout: Duration,
    pub page_size: usize,
    /// Restrict search to the selected folder when one is selected.
    pub scoped_search: bool,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            typeahead_timeout: Duration::from_millis(nav::DEFAULT_TYPEAHEAD_TIMEOUT_MS),
            page_size: 10,
            scoped_search: true,
        }
    }
}

/// Read-only projection of one visible row for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    pub key: String,
    pub path: FolderPath,
    pub name: String,
    pub depth: usize,
    pub expandable: bool,
    pub is_expanded: bool,
    pub is_loading: bool,
    pub is_selected: bool,
    pub is_focused: bool,
    pub is_match: bool,
    /// Byte range of the search term inside `name`.
    pub match_span: Option<Range<usize>>,
}

pub struct FolderPicker {
    namespace: String,
    options: PickerOptions,
    store: TreeStore,
    expansion: ExpansionController,
    search: SearchEngine,
    selection: SelectionState,
    typeahead: Typeahead,
    viewport: Viewport,
    flat: Vec<FlatRow>,
    rows: Vec<ViewRow>,
    /// Last known focus index, used when the focused row disappears.
    focus_hint: usize,
    pending: Vec<FetchRequest>,
    notices: Vec<TreeError>,
    sink: Option<Box<dyn SelectionSink>>,
}

impl FolderPicker {
    /// Create a picker for `namespace` and queue the root listing.
    pub fn new(namespace: impl Into<String>, options: PickerOptions) -> Self {
        let namespace = namespace.into();
        let mut picker = Self {
            store: TreeStore::new(namespace.clone()),
            namespace,
            typeahead: Typeahead::new(options.typeahead_timeout),
            options,
            expansion: ExpansionController::default(),
            search: SearchEngine::default(),
            selection: SelectionState::default(),
            viewport: Viewport::default(),
            flat: Vec::new(),
            rows: Vec::new(),
            focus_hint: 0,
            pending: Vec::new(),
            notices: Vec::new(),
            sink: None,
        };
        let request = picker.expansion.request_root(&picker.store);
        picker.queue(request);
        picker
    }

    pub fn set_sink(&mut self, sink: Box<dyn SelectionSink>) {
        self.sink = Some(sink);
    }

    /// Throw the tree away and start over on another namespace. Responses
    /// still in flight for the old tree will be discarded on arrival.
    pub fn reset(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
        info!(namespace = %self.namespace, "switching namespace");
        self.store.reset(self.namespace.clone());
        self.expansion.reset();
        self.search.discard();
        self.typeahead.reset();
        self.pending.clear();
        self.selection.focused = None;
        self.focus_hint = 0;
        self.viewport.offset = 0;
        if self.selection.selected.take().is_some() {
            self.notify_selection(None);
        }
        let request = self.expansion.request_root(&self.store);
        self.queue(request);
        self.refresh_view();
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    #[allow(dead_code)]
    pub fn expansion(&self) -> &ExpansionController {
        &self.expansion
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_loading(&self) -> bool {
        !self.expansion.state().loading.is_empty()
    }

    pub fn focused_index(&self) -> Option<usize> {
        let focused = self.selection.focused.as_ref()?;
        self.flat.iter().position(|row| &row.path == focused)
    }

    /// Current selection as a consumer would receive it.
    pub fn selected_target(&self) -> Option<UploadTarget> {
        let path = self.selection.selected.as_ref()?;
        self.store.get_node(path).map(UploadTarget::from_node)
    }

    /// Fetches queued since the last call, for the caller to dispatch.
    pub fn take_fetches(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Errors queued since the last call.
    pub fn take_notices(&mut self) -> Vec<TreeError> {
        std::mem::take(&mut self.notices)
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport.height = height;
        self.viewport.clamp(self.flat.len());
        if let Some(i) = self.focused_index() {
            self.viewport.scroll_into_view(i);
        }
    }

    // ── Loading ─────────────────────────────────────────────────────────

    /// Merge a finished fetch and recompute everything derived from it.
    pub fn apply_response(&mut self, response: FetchResponse) {
        let notices = self.expansion.complete(&mut self.store, response);
        self.notices.extend(notices);
        self.search.rerun(&self.store);
        self.refresh_view();
    }

    pub fn toggle(&mut self, path: &FolderPath) {
        let request = self.expansion.toggle(&self.store, path);
        self.queue(request);
        self.refresh_view();
    }

    pub fn expand(&mut self, path: &FolderPath) {
        let request = self.expansion.expand(&self.store, path);
        self.queue(request);
        self.refresh_view();
    }

    pub fn collapse(&mut self, path: &FolderPath) {
        self.expansion.collapse(path);
        self.refresh_view();
    }

    /// Re-fetch the focused folder's children (or the root listing when
    /// nothing is focused) and merge them in.
    pub fn refresh_focused(&mut self) {
        let path = match self.focused_index() {
            Some(i) => self.flat[i].path.clone(),
            None => FolderPath::root(),
        };
        let request = self.expansion.refresh(&self.store, &path);
        self.queue(request);
        self.refresh_view();
    }

    /// Open every ancestor of a loaded folder and focus it.
    pub fn reveal(&mut self, path: &FolderPath) -> bool {
        if !self.expansion.reveal(&self.store, path) {
            return false;
        }
        self.refresh_view();
        if let Some(i) = self.index_of(path) {
            self.focus_at(i);
        }
        true
    }

    // ── Search ──────────────────────────────────────────────────────────

    pub fn set_search_term(&mut self, term: &str) {
        let scope = if self.options.scoped_search {
            self.selection.selected.clone()
        } else {
            None
        };
        let change = self
            .search
            .set_term(&self.store, &mut self.expansion, term, scope.as_ref());
        match change {
            SearchChange::Started | SearchChange::Updated => {
                self.refresh_view();
                let first = self.search.state().result.matches.first().cloned();
                if let Some(i) = first.and_then(|key| self.flat.iter().position(|r| r.key == key)) {
                    self.focus_at(i);
                }
            }
            SearchChange::Cleared => self.refresh_view(),
            SearchChange::Unchanged => {}
        }
    }

    pub fn push_search_char(&mut self, ch: char) {
        let mut term = self.search.term().to_string();
        term.push(ch);
        self.set_search_term(&term);
    }

    pub fn pop_search_char(&mut self) {
        let mut term = self.search.term().to_string();
        term.pop();
        self.set_search_term(&term);
    }

    /// Leave search keeping the focused match: the pre-search expansion is
    /// restored, then the match's ancestors are opened.
    pub fn accept_search(&mut self) {
        let focused = self.focused_index().map(|i| self.flat[i].path.clone());
        self.set_search_term("");
        if let Some(path) = focused {
            self.reveal(&path);
        }
    }

    // ── Keyboard and mouse ──────────────────────────────────────────────

    /// Run one keystroke through the navigation state machine. `now` is
    /// the keystroke time, used for typeahead.
    pub fn handle_key(&mut self, key: NavKey, now: Instant) {
        let len = self.flat.len();
        if len == 0 {
            return;
        }
        let current = self.focused_index();
        let page = self.options.page_size.max(1);

        match key {
            NavKey::Up => self.focus_at(current.map_or(0, |i| i.saturating_sub(1))),
            NavKey::Down => self.focus_at(current.map_or(0, |i| (i + 1).min(len - 1))),
            NavKey::Home => self.focus_at(0),
            NavKey::End => self.focus_at(len - 1),
            NavKey::PageUp => self.focus_at(current.map_or(0, |i| i.saturating_sub(page))),
            NavKey::PageDown => self.focus_at(current.map_or(0, |i| (i + page).min(len - 1))),
            NavKey::Right => {
                if let Some(i) = current {
                    self.move_right(i);
                }
            }
            NavKey::Left => {
                if let Some(i) = current {
                    self.move_left(i);
                }
            }
            NavKey::Activate => self.toggle_selection(),
            NavKey::Char(ch) => {
                let buffer = self.typeahead.push(ch, now).to_string();
                if let Some(i) = find_typeahead(&self.flat, current, &buffer) {
                    self.focus_at(i);
                }
            }
        }
    }

    /// Click on the `offset`-th row of the viewport: focus it and toggle
    /// its expansion.
    pub fn click(&mut self, offset: usize) {
        let index = self.viewport.offset + offset;
        if index >= self.flat.len() {
            return;
        }
        self.focus_at(index);
        self.toggle_row(index);
    }

    fn move_right(&mut self, index: usize) {
        let row = self.flat[index].clone();
        if !row.expandable {
            return;
        }
        if row.expanded {
            if self.flat.get(index + 1).is_some_and(|next| next.depth > row.depth) {
                self.focus_at(index + 1);
            }
            return;
        }
        if self.search.is_active() && self.search.unfold(&row.key) {
            self.refresh_view();
            return;
        }
        self.expand(&row.path);
    }

    fn move_left(&mut self, index: usize) {
        let row = self.flat[index].clone();
        if row.expanded {
            if self.search.is_active() {
                self.search.fold(&row.key);
                self.refresh_view();
            } else {
                self.collapse(&row.path);
            }
            return;
        }
        if let Some(parent) = row.parent_key {
            if let Some(i) = self.flat.iter().position(|r| r.key == parent) {
                self.focus_at(i);
            }
        }
    }

    fn toggle_row(&mut self, index: usize) {
        let row = self.flat[index].clone();
        if self.search.is_active() {
            if row.expanded {
                self.search.fold(&row.key);
                self.refresh_view();
                return;
            }
            if self.search.unfold(&row.key) {
                self.refresh_view();
                return;
            }
        }
        self.toggle(&row.path);
    }

    /// Select the focused folder, or clear the selection if it is already
    /// selected.
    fn toggle_selection(&mut self) {
        let Some(focused) = self.focused_index().map(|i| self.flat[i].path.clone()) else {
            return;
        };
        if self.selection.selected.as_ref() == Some(&focused) {
            self.selection.selected = None;
            self.notify_selection(None);
        } else {
            let target = self.store.get_node(&focused).map(UploadTarget::from_node);
            self.selection.selected = Some(focused);
            self.notify_selection(target);
        }
        self.rebuild_rows();
    }

    fn notify_selection(&mut self, target: Option<UploadTarget>) {
        debug!(target = ?target.as_ref().map(|t| t.path.to_string()), "selection changed");
        if let Some(sink) = self.sink.as_mut() {
            sink.selection_changed(target);
        }
    }

    // ── View maintenance ────────────────────────────────────────────────

    fn queue(&mut self, request: Option<FetchRequest>) {
        if let Some(request) = request {
            self.pending.push(request);
        }
    }

    fn index_of(&self, path: &FolderPath) -> Option<usize> {
        self.flat.iter().position(|row| &row.path == path)
    }

    fn focus_at(&mut self, index: usize) {
        let Some(row) = self.flat.get(index) else {
            return;
        };
        self.selection.focused = Some(row.path.clone());
        self.focus_hint = index;
        self.viewport.scroll_into_view(index);
        self.rebuild_rows();
    }

    /// Re-flatten and repair focus. A focused folder that is no longer
    /// visible hands focus to its nearest visible ancestor.
    fn refresh_view(&mut self) {
        self.flat = flatten(&self.store, &self.expansion, &self.search);

        let index = match self.selection.focused.clone() {
            // Rows are in document order, so the last visible ancestor is
            // the nearest one.
            Some(path) => self.index_of(&path).or_else(|| {
                self.flat
                    .iter()
                    .rposition(|row| row.path.is_ancestor_of(&path))
                    .or(Some(self.focus_hint.min(self.flat.len().saturating_sub(1))))
            }),
            None => Some(self.focus_hint.min(self.flat.len().saturating_sub(1))),
        };

        match index.filter(|&i| i < self.flat.len()) {
            Some(i) => {
                self.selection.focused = Some(self.flat[i].path.clone());
                self.focus_hint = i;
                self.viewport.clamp(self.flat.len());
                self.viewport.scroll_into_view(i);
            }
            // Nothing visible: keep the focused path so it comes back
            // once rows reappear.
            None => self.viewport.offset = 0,
        }
        self.rebuild_rows();
    }

    fn rebuild_rows(&mut self) {
        let searching = self.search.is_active();
        let term = self.search.term();
        let matches: HashSet<&str> = self
            .search
            .state()
            .result
            .matches
            .iter()
            .map(String::as_str)
            .collect();
        let focused = self.selection.focused.as_ref();
        let selected = self.selection.selected.as_ref();

        self.rows = self
            .flat
            .iter()
            .map(|row| {
                let is_match = searching && matches.contains(row.key.as_str());
                ViewRow {
                    key: row.key.clone(),
                    path: row.path.clone(),
                    name: row.name.clone(),
                    depth: row.depth,
                    expandable: row.expandable,
                    is_expanded: row.expanded,
                    is_loading: self.expansion.is_loading(&row.key),
                    is_selected: selected == Some(&row.path),
                    is_focused: focused == Some(&row.path),
                    is_match,
                    match_span: if is_match {
                        match_span(&row.name, term)
                    } else {
                        None
                    },
                }
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::error::FetchError;
    use crate::service::fixture::Fixture;
    use crate::service::{execute, FetchKind, FolderService};
    use crate::tree::node::FolderEntry;

    fn p(segments: &[&str]) -> FolderPath {
        FolderPath::from_segments(segments.iter().copied())
    }

    fn names(picker: &FolderPicker) -> Vec<&str> {
        picker.rows().iter().map(|r| r.name.as_str()).collect()
    }

    fn focused_name(picker: &FolderPicker) -> Option<&str> {
        picker
            .rows()
            .iter()
            .find(|r| r.is_focused)
            .map(|r| r.name.as_str())
    }

    /// Answer the single pending request for `path` with `entries`.
    fn answer(picker: &mut FolderPicker, path: &FolderPath, entries: Vec<FolderEntry>) {
        let pending = picker.take_fetches();
        let (matching, rest): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|r| &r.path == path);
        picker.pending.extend(rest);
        let request = matching.into_iter().next().expect("request pending");
        picker.apply_response(FetchResponse {
            request,
            result: Ok(entries),
        });
    }

    fn clients_picker() -> FolderPicker {
        let mut picker = FolderPicker::new("acme-corp", PickerOptions::default());
        answer(
            &mut picker,
            &FolderPath::root(),
            vec![FolderEntry::new("Clients", "/Clients", true)],
        );
        picker
    }

    /// Run pending fetches against a service until none are left.
    async fn settle(picker: &mut FolderPicker, service: &dyn FolderService) {
        loop {
            let pending = picker.take_fetches();
            if pending.is_empty() {
                break;
            }
            for request in pending {
                let response = execute(service, request).await;
                picker.apply_response(response);
            }
        }
    }

    struct Recorder(Rc<RefCell<Vec<Option<UploadTarget>>>>);

    impl SelectionSink for Recorder {
        fn selection_changed(&mut self, target: Option<UploadTarget>) {
            self.0.borrow_mut().push(target);
        }
    }

    #[test]
    fn new_picker_requests_root() {
        let mut picker = FolderPicker::new("acme-corp", PickerOptions::default());
        let pending = picker.take_fetches();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, FetchKind::Root);
        assert!(picker.rows().is_empty());
    }

    #[test]
    fn root_listing_focuses_first_row() {
        let picker = clients_picker();
        assert_eq!(names(&picker), vec!["Clients"]);
        assert_eq!(focused_name(&picker), Some("Clients"));
    }

    #[test]
    fn expand_then_search_scenario() {
        let mut picker = clients_picker();
        picker.toggle(&p(&["Clients"]));
        assert!(picker.rows()[0].is_loading);
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![
                FolderEntry::new("Acme", "/Clients/Acme", false),
                FolderEntry::new("Globex", "/Clients/Globex", false),
            ],
        );
        assert_eq!(names(&picker), vec!["Clients", "Acme", "Globex"]);

        picker.set_search_term("glob");
        assert_eq!(names(&picker), vec!["Clients", "Globex"]);
        let result = &picker.search().state().result;
        assert_eq!(
            result.ancestors_to_expand,
            HashSet::from(["Clients".to_string()])
        );
        assert!(!picker.rows()[0].is_match);
        assert!(picker.rows()[1].is_match);
        assert_eq!(picker.rows()[1].match_span, Some(0..4));
        assert_eq!(focused_name(&picker), Some("Globex"));
    }

    #[test]
    fn rapid_double_expand_issues_one_fetch() {
        let mut picker = clients_picker();
        picker.click(0);
        picker.click(0);
        let pending = picker.take_fetches();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].path, p(&["Clients"]));
    }

    #[tokio::test]
    async fn slow_service_sees_one_children_call() {
        struct Slow {
            children_calls: AtomicUsize,
        }

        #[async_trait]
        impl FolderService for Slow {
            async fn fetch_root(&self) -> Result<Vec<FolderEntry>, FetchError> {
                Ok(vec![FolderEntry::new("Clients", "/Clients", true)])
            }

            async fn fetch_children(
                &self,
                _path: &FolderPath,
            ) -> Result<Vec<FolderEntry>, FetchError> {
                self.children_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(vec![FolderEntry::new("Acme", "/Clients/Acme", false)])
            }
        }

        let service = Arc::new(Slow {
            children_calls: AtomicUsize::new(0),
        });
        let mut picker = FolderPicker::new("acme-corp", PickerOptions::default());
        settle(&mut picker, service.as_ref()).await;

        picker.toggle(&p(&["Clients"]));
        picker.toggle(&p(&["Clients"]));
        settle(&mut picker, service.as_ref()).await;

        assert_eq!(service.children_calls.load(Ordering::SeqCst), 1);
        assert_eq!(names(&picker), vec!["Clients", "Acme"]);
    }

    #[test]
    fn late_response_after_reset_is_ignored() {
        let mut picker = clients_picker();
        picker.toggle(&p(&["Clients"]));
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![FolderEntry::new("Acme", "/Clients/Acme", true)],
        );
        picker.toggle(&p(&["Clients", "Acme"]));
        let in_flight = picker.take_fetches().pop().expect("acme fetch");

        picker.reset("globex-inc");
        answer(
            &mut picker,
            &FolderPath::root(),
            vec![FolderEntry::new("Clients", "/Clients", true)],
        );
        picker.toggle(&p(&["Clients"]));
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![FolderEntry::new("Acme", "/Clients/Acme", true)],
        );

        picker.apply_response(FetchResponse {
            request: in_flight,
            result: Ok(vec![FolderEntry::new("Secret", "/Clients/Acme/Secret", false)]),
        });
        assert!(!picker.store().contains(&p(&["Clients", "Acme", "Secret"])));
        let notices = picker.take_notices();
        assert!(matches!(notices[..], [TreeError::StaleResponse { .. }]));
    }

    #[test]
    fn up_and_down_clamp_at_edges() {
        let mut picker = FolderPicker::new("ns", PickerOptions::default());
        answer(
            &mut picker,
            &FolderPath::root(),
            vec![
                FolderEntry::new("A", "/A", false),
                FolderEntry::new("B", "/B", false),
            ],
        );
        let now = Instant::now();
        picker.handle_key(NavKey::Up, now);
        assert_eq!(picker.focused_index(), Some(0));
        picker.handle_key(NavKey::End, now);
        assert_eq!(picker.focused_index(), Some(1));
        picker.handle_key(NavKey::Down, now);
        assert_eq!(picker.focused_index(), Some(1));
        picker.handle_key(NavKey::Home, now);
        assert_eq!(picker.focused_index(), Some(0));
    }

    #[test]
    fn typed_prefix_moves_focus() {
        let mut picker = FolderPicker::new("ns", PickerOptions::default());
        answer(
            &mut picker,
            &FolderPath::root(),
            vec![
                FolderEntry::new("Contracts", "/Contracts", false),
                FolderEntry::new("Receipts", "/Receipts", false),
                FolderEntry::new("Reports", "/Reports", false),
            ],
        );
        let now = Instant::now();
        picker.handle_key(NavKey::Char('r'), now);
        picker.handle_key(NavKey::Char('e'), now + Duration::from_millis(100));
        assert_eq!(focused_name(&picker), Some("Receipts"));
        picker.handle_key(NavKey::Char('p'), now + Duration::from_millis(200));
        assert_eq!(focused_name(&picker), Some("Reports"));
        // Too late: buffer restarts with "c".
        picker.handle_key(NavKey::Char('c'), now + Duration::from_secs(2));
        assert_eq!(focused_name(&picker), Some("Contracts"));
    }

    #[test]
    fn right_expands_then_descends_and_left_climbs_then_collapses() {
        let mut picker = clients_picker();
        let now = Instant::now();
        picker.handle_key(NavKey::Right, now);
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![FolderEntry::new("Acme", "/Clients/Acme", false)],
        );
        assert!(picker.rows()[0].is_expanded);
        assert_eq!(focused_name(&picker), Some("Clients"));

        picker.handle_key(NavKey::Right, now);
        assert_eq!(focused_name(&picker), Some("Acme"));

        picker.handle_key(NavKey::Left, now);
        assert_eq!(focused_name(&picker), Some("Clients"));
        picker.handle_key(NavKey::Left, now);
        assert_eq!(names(&picker), vec!["Clients"]);
        assert!(!picker.expansion().is_expanded("Clients"));
    }

    #[test]
    fn collapse_expand_cycle_does_not_refetch() {
        let mut picker = clients_picker();
        picker.toggle(&p(&["Clients"]));
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![FolderEntry::new("Acme", "/Clients/Acme", true)],
        );
        picker.toggle(&p(&["Clients", "Acme"]));
        answer(
            &mut picker,
            &p(&["Clients", "Acme"]),
            vec![FolderEntry::new("2024", "/Clients/Acme/2024", false)],
        );
        assert_eq!(names(&picker), vec!["Clients", "Acme", "2024"]);

        picker.toggle(&p(&["Clients"]));
        assert!(!picker.expansion().is_expanded("Clients/Acme"));
        picker.toggle(&p(&["Clients"]));
        assert!(picker.take_fetches().is_empty());
        assert_eq!(names(&picker), vec!["Clients", "Acme"]);
    }

    #[test]
    fn focus_moves_to_parent_when_hidden_by_collapse() {
        let mut picker = clients_picker();
        picker.toggle(&p(&["Clients"]));
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![FolderEntry::new("Acme", "/Clients/Acme", false)],
        );
        picker.handle_key(NavKey::Down, Instant::now());
        assert_eq!(focused_name(&picker), Some("Acme"));
        picker.collapse(&p(&["Clients"]));
        assert_eq!(focused_name(&picker), Some("Clients"));
    }

    #[test]
    fn activate_toggles_selection_and_notifies_sink() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut picker = clients_picker();
        picker.set_sink(Box::new(Recorder(log.clone())));
        let now = Instant::now();

        picker.handle_key(NavKey::Activate, now);
        assert_eq!(picker.selection().selected, Some(p(&["Clients"])));
        assert!(picker.rows()[0].is_selected);
        picker.handle_key(NavKey::Activate, now);
        assert_eq!(picker.selection().selected, None);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].as_ref().map(|t| t.path.clone()), Some(p(&["Clients"])));
        assert!(log[1].is_none());
    }

    #[test]
    fn reset_clears_selection_and_notifies() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut picker = clients_picker();
        picker.set_sink(Box::new(Recorder(log.clone())));
        picker.handle_key(NavKey::Activate, Instant::now());
        picker.reset("globex-inc");
        assert!(picker.selection().selected.is_none());
        assert_eq!(log.borrow().last(), Some(&None));
        assert_eq!(picker.take_fetches().len(), 1);
    }

    #[test]
    fn fetch_failure_reverts_and_reports() {
        let mut picker = clients_picker();
        picker.toggle(&p(&["Clients"]));
        let request = picker.take_fetches().pop().expect("request");
        picker.apply_response(FetchResponse {
            request,
            result: Err(FetchError::Transient("offline".into())),
        });
        assert!(!picker.rows()[0].is_expanded);
        assert!(!picker.rows()[0].is_loading);
        let notices = picker.take_notices();
        assert!(matches!(notices[..], [TreeError::FetchFailed { .. }]));
        assert!(notices[0].is_user_visible());
    }

    #[tokio::test]
    async fn scoped_search_follows_selection() {
        let fixture = Fixture::demo();
        let service = fixture
            .service("acme-corp", Duration::ZERO)
            .expect("namespace");
        let mut picker = FolderPicker::new("acme-corp", PickerOptions::default());
        settle(&mut picker, &service).await;
        picker.expand(&p(&["Clients"]));
        settle(&mut picker, &service).await;
        picker.expand(&p(&["Clients", "Acme"]));
        picker.expand(&p(&["Internal"]));
        settle(&mut picker, &service).await;

        picker.set_search_term("in");
        assert!(names(&picker).contains(&"Internal"));
        picker.set_search_term("");

        let acme = picker.index_of(&p(&["Clients", "Acme"])).expect("acme row");
        picker.focus_at(acme);
        picker.handle_key(NavKey::Activate, Instant::now());
        picker.set_search_term("in");
        assert_eq!(picker.search().state().scope_root, Some(p(&["Clients", "Acme"])));
        assert!(!names(&picker).contains(&"Internal"));
        picker.set_search_term("");
        assert!(picker.expansion().is_expanded("Internal"));
    }

    #[tokio::test]
    async fn clearing_search_restores_expansion_and_keeps_focus_nearby() {
        let service = Fixture::demo()
            .service("acme-corp", Duration::ZERO)
            .expect("namespace");
        let mut picker = FolderPicker::new("acme-corp", PickerOptions::default());
        settle(&mut picker, &service).await;
        picker.expand(&p(&["Clients"]));
        settle(&mut picker, &service).await;
        picker.expand(&p(&["Clients", "Acme"]));
        settle(&mut picker, &service).await;
        picker.collapse(&p(&["Clients"]));
        assert_eq!(names(&picker), vec!["Clients", "Internal"]);

        picker.set_search_term("rep");
        assert_eq!(names(&picker), vec!["Clients", "Acme", "Reports"]);
        assert_eq!(focused_name(&picker), Some("Reports"));

        picker.set_search_term("");
        assert_eq!(names(&picker), vec!["Clients", "Internal"]);
        assert_eq!(focused_name(&picker), Some("Clients"));
    }

    #[tokio::test]
    async fn search_without_matches_keeps_focus_for_clear() {
        let service = Fixture::demo()
            .service("acme-corp", Duration::ZERO)
            .expect("namespace");
        let mut picker = FolderPicker::new("acme-corp", PickerOptions::default());
        settle(&mut picker, &service).await;
        picker.expand(&p(&["Clients"]));
        settle(&mut picker, &service).await;
        let now = Instant::now();
        for _ in 0..4 {
            picker.handle_key(NavKey::Down, now);
        }
        assert_eq!(picker.focused_index(), Some(4));
        assert_eq!(focused_name(&picker), Some("Umbrella"));

        picker.set_search_term("zzz");
        assert!(picker.rows().is_empty());
        assert_eq!(picker.focused_index(), None);

        picker.set_search_term("");
        assert_eq!(picker.focused_index(), Some(4));
        assert_eq!(focused_name(&picker), Some("Umbrella"));
    }

    #[tokio::test]
    async fn accept_search_reveals_match() {
        let service = Fixture::demo()
            .service("acme-corp", Duration::ZERO)
            .expect("namespace");
        let mut picker = FolderPicker::new("acme-corp", PickerOptions::default());
        settle(&mut picker, &service).await;
        picker.expand(&p(&["Clients"]));
        settle(&mut picker, &service).await;
        picker.expand(&p(&["Clients", "Globex"]));
        settle(&mut picker, &service).await;
        picker.collapse(&p(&["Clients"]));

        picker.set_search_term("invo");
        picker.accept_search();
        assert!(!picker.search().is_active());
        assert_eq!(focused_name(&picker), Some("Invoices"));
        assert!(picker.expansion().is_expanded("Clients"));
        assert!(picker.expansion().is_expanded("Clients/Globex"));
    }

    #[test]
    fn search_left_folds_without_touching_expansion() {
        let mut picker = clients_picker();
        picker.toggle(&p(&["Clients"]));
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![FolderEntry::new("Globex", "/Clients/Globex", false)],
        );
        picker.collapse(&p(&["Clients"]));
        picker.set_search_term("glob");
        let now = Instant::now();
        picker.handle_key(NavKey::Left, now);
        assert_eq!(focused_name(&picker), Some("Clients"));
        picker.handle_key(NavKey::Left, now);
        assert_eq!(names(&picker), vec!["Clients"]);
        picker.handle_key(NavKey::Right, now);
        assert_eq!(names(&picker), vec!["Clients", "Globex"]);
        assert!(!picker.expansion().is_expanded("Clients"));
    }

    #[test]
    fn empty_result_notice_and_leaf() {
        let mut picker = clients_picker();
        picker.toggle(&p(&["Clients"]));
        answer(&mut picker, &p(&["Clients"]), Vec::new());
        assert!(!picker.rows()[0].expandable);
        assert!(matches!(
            picker.take_notices()[..],
            [TreeError::EmptyResult { .. }]
        ));
    }

    #[test]
    fn refresh_focused_merges_without_losing_children() {
        let mut picker = clients_picker();
        picker.toggle(&p(&["Clients"]));
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![FolderEntry::new("Acme", "/Clients/Acme", false)],
        );
        picker.refresh_focused();
        answer(
            &mut picker,
            &p(&["Clients"]),
            vec![FolderEntry::new("Globex", "/Clients/Globex", false)],
        );
        assert_eq!(names(&picker), vec!["Clients", "Acme", "Globex"]);
    }

    #[test]
    fn page_keys_move_by_page_size() {
        let mut picker = FolderPicker::new(
            "ns",
            PickerOptions {
                page_size: 2,
                ..PickerOptions::default()
            },
        );
        let entries = (0..5)
            .map(|i| FolderEntry::new(format!("F{}", i), format!("/F{}", i), false))
            .collect();
        answer(&mut picker, &FolderPath::root(), entries);
        let now = Instant::now();
        picker.handle_key(NavKey::PageDown, now);
        assert_eq!(picker.focused_index(), Some(2));
        picker.handle_key(NavKey::PageDown, now);
        picker.handle_key(NavKey::PageDown, now);
        assert_eq!(picker.focused_index(), Some(4));
        picker.handle_key(NavKey::PageUp, now);
        assert_eq!(picker.focused_index(), Some(2));
    }

    #[test]
    fn focus_changes_scroll_viewport() {
        let mut picker = FolderPicker::new("ns", PickerOptions::default());
        let entries = (0..10)
            .map(|i| FolderEntry::new(format!("F{}", i), format!("/F{}", i), false))
            .collect();
        answer(&mut picker, &FolderPath::root(), entries);
        picker.set_viewport_height(3);
        picker.handle_key(NavKey::End, Instant::now());
        assert_eq!(picker.viewport().offset, 7);
        picker.handle_key(NavKey::Home, Instant::now());
        assert_eq!(picker.viewport().offset, 0);
    }
}
