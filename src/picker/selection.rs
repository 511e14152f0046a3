use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::event::Event;
use crate::tree::node::FolderNode;
use crate::tree::path::FolderPath;

/// Selected and focused folders. Focus is the keyboard cursor and may
/// differ from the selection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub selected: Option<FolderPath>,
    pub focused: Option<FolderPath>,
}

/// What selection consumers (upload target, preview pane) receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadTarget {
    pub path: FolderPath,
    pub can_upload: bool,
    pub can_create: bool,
    pub templates: Value,
}

impl UploadTarget {
    pub fn from_node(node: &FolderNode) -> Self {
        Self {
            path: node.path.clone(),
            can_upload: node.can_upload,
            can_create: node.can_create,
            templates: node.templates.clone(),
        }
    }
}

/// Receives every selection change; `None` means the selection was cleared.
pub trait SelectionSink {
    fn selection_changed(&mut self, target: Option<UploadTarget>);
}

impl SelectionSink for mpsc::UnboundedSender<Event> {
    fn selection_changed(&mut self, target: Option<UploadTarget>) {
        let _ = self.send(Event::SelectionChanged(target));
    }
}
