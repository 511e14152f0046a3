use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use tracing::info;

use crate::error::{AppError, Result};
use crate::picker::selection::UploadTarget;
use crate::picker::{FolderPicker, PickerOptions};
use crate::service::fixture::Fixture;
use crate::service::{FetchRequest, FetchResponse, FolderService};

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Application mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Keystrokes edit the search term.
    Search,
}

/// Main application state.
pub struct App {
    pub picker: FolderPicker,
    services: BTreeMap<String, Arc<dyn FolderService>>,
    namespaces: Vec<String>,
    namespace_index: usize,
    pub mode: AppMode,
    pub should_quit: bool,
    /// Message plus creation time; `is_error` styles it as a failure.
    pub status_message: Option<(String, Instant)>,
    pub status_is_error: bool,
    /// Last value delivered to the selection sink.
    pub upload_target: Option<UploadTarget>,
    /// Where the tree rows were last drawn, for mouse hit-testing.
    pub tree_area: Option<Rect>,
}

impl App {
    /// Build the app over a fixture, opening `namespace` (or the first one).
    pub fn new(
        fixture: &Fixture,
        namespace: Option<&str>,
        latency: Duration,
        options: PickerOptions,
    ) -> Result<Self> {
        let namespaces = fixture.namespace_names();
        let namespace_index = match namespace {
            Some(name) => namespaces
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "unknown namespace `{}` (available: {})",
                        name,
                        namespaces.join(", ")
                    ))
                })?,
            None => 0,
        };
        let current = namespaces
            .get(namespace_index)
            .cloned()
            .ok_or_else(|| AppError::Config("fixture defines no namespaces".into()))?;

        let mut services: BTreeMap<String, Arc<dyn FolderService>> = BTreeMap::new();
        for name in &namespaces {
            if let Some(service) = fixture.service(name, latency) {
                services.insert(name.clone(), Arc::new(service));
            }
        }

        Ok(Self {
            picker: FolderPicker::new(current, options),
            services,
            namespaces,
            namespace_index,
            mode: AppMode::Normal,
            should_quit: false,
            status_message: None,
            status_is_error: false,
            upload_target: None,
            tree_area: None,
        })
    }

    /// Service answering for the current namespace.
    pub fn service(&self) -> Option<Arc<dyn FolderService>> {
        self.services.get(self.picker.namespace()).cloned()
    }

    /// Fetches the picker queued since the last call.
    pub fn take_fetches(&mut self) -> Vec<FetchRequest> {
        self.picker.take_fetches()
    }

    /// Merge a finished fetch and surface its notices.
    pub fn handle_fetch(&mut self, response: FetchResponse) {
        self.picker.apply_response(response);
        let visible = self
            .picker
            .take_notices()
            .into_iter()
            .filter(|notice| notice.is_user_visible())
            .last();
        if let Some(notice) = visible {
            self.set_error_message(notice.to_string());
        }
    }

    pub fn handle_selection(&mut self, target: Option<UploadTarget>) {
        match &target {
            Some(t) => self.set_status_message(format!("Upload target: {}", t.path)),
            None => self.set_status_message("Selection cleared".to_string()),
        }
        self.upload_target = target;
    }

    /// Switch to the next namespace, discarding the current tree.
    pub fn next_namespace(&mut self) {
        if self.namespaces.len() < 2 {
            return;
        }
        self.namespace_index = (self.namespace_index + 1) % self.namespaces.len();
        let name = self.namespaces[self.namespace_index].clone();
        info!(namespace = %name, "namespace changed by user");
        self.mode = AppMode::Normal;
        self.picker.reset(name.clone());
        self.set_status_message(format!("Namespace: {}", name));
    }

    // ── Search input ────────────────────────────────────────────────────

    pub fn enter_search(&mut self) {
        self.mode = AppMode::Search;
    }

    pub fn search_input_char(&mut self, c: char) {
        self.picker.push_search_char(c);
    }

    pub fn search_delete_char(&mut self) {
        self.picker.pop_search_char();
    }

    /// Stop editing, keep the filtered view.
    pub fn finish_search_input(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Leave search entirely, landing on the focused match.
    pub fn accept_search(&mut self) {
        self.mode = AppMode::Normal;
        self.picker.accept_search();
    }

    /// Drop the term and restore the pre-search tree.
    pub fn cancel_search(&mut self) {
        self.mode = AppMode::Normal;
        self.picker.set_search_term("");
    }

    // ── Status line ─────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
        self.status_is_error = false;
    }

    pub fn set_error_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
        self.status_is_error = true;
    }

    /// Clear the status message once it has been shown long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created)) = self.status_message {
            if created.elapsed() > STATUS_TTL {
                self.status_message = None;
            }
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
