//! Folder service boundary: the async collaborator that lists folders, and
//! the request/response values the picker exchanges with it.

pub mod fixture;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::FetchError;
use crate::event::Event;
use crate::tree::node::FolderEntry;
use crate::tree::path::FolderPath;

/// Remote source of folder listings.
#[async_trait]
pub trait FolderService: Send + Sync {
    /// Top-level folders of the namespace.
    async fn fetch_root(&self) -> Result<Vec<FolderEntry>, FetchError>;

    /// Immediate children of `path`. Fails with `NotFound` if the folder no
    /// longer exists, `Transient` for retryable errors.
    async fn fetch_children(&self, path: &FolderPath) -> Result<Vec<FolderEntry>, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Root,
    Children,
}

/// A listing the picker wants. Tagged with the tree generation it was
/// issued for so late answers can be recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub path: FolderPath,
    pub kind: FetchKind,
    /// Expand the folder once its children arrive.
    pub expand_on_arrival: bool,
}

#[derive(Debug)]
pub struct FetchResponse {
    pub request: FetchRequest,
    pub result: Result<Vec<FolderEntry>, FetchError>,
}

/// Run one request against the service.
pub async fn execute(service: &dyn FolderService, request: FetchRequest) -> FetchResponse {
    let result = match request.kind {
        FetchKind::Root => service.fetch_root().await,
        FetchKind::Children => service.fetch_children(&request.path).await,
    };
    FetchResponse { request, result }
}

/// Run a request on the runtime and post the answer back as an event.
pub fn spawn_fetch(
    service: Arc<dyn FolderService>,
    request: FetchRequest,
    event_tx: mpsc::UnboundedSender<Event>,
) {
    debug!(path = %request.path, kind = ?request.kind, "dispatching fetch");
    tokio::spawn(async move {
        let response = execute(service.as_ref(), request).await;
        // The receiver is gone only when the app is shutting down.
        let _ = event_tx.send(Event::FetchComplete(response));
    });
}
