use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::path::FolderPath;

/// One folder as returned by the folder service, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub name: String,
    /// Raw server path. May be empty, in which case the path is derived
    /// from the parent and `name`.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub can_upload: bool,
    #[serde(default)]
    pub can_create: bool,
    /// Opaque payload handed through to selection consumers.
    #[serde(default)]
    pub templates: Value,
}

impl FolderEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, has_children: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            has_children,
            can_upload: false,
            can_create: false,
            templates: Value::Null,
        }
    }
}

/// A folder in the in-memory tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    pub name: String,
    pub path: FolderPath,
    /// Server hint, independent of whether `children` is loaded.
    pub has_children: bool,
    /// Loaded children in server order. Empty with `has_children` set
    /// means "not loaded yet".
    pub children: Vec<FolderNode>,
    pub can_upload: bool,
    pub can_create: bool,
    pub templates: Value,
}

impl FolderNode {
    /// The synthetic namespace root that owns every top-level folder.
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            name: label.into(),
            path: FolderPath::root(),
            has_children: true,
            children: Vec::new(),
            can_upload: false,
            can_create: false,
            templates: Value::Null,
        }
    }

    pub fn from_entry(entry: FolderEntry, path: FolderPath) -> Self {
        Self {
            name: entry.name,
            path,
            has_children: entry.has_children,
            children: Vec::new(),
            can_upload: entry.can_upload,
            can_create: entry.can_create,
            templates: entry.templates,
        }
    }

    pub fn key(&self) -> String {
        self.path.key()
    }

    /// Children are known to exist but have not been fetched.
    pub fn needs_fetch(&self) -> bool {
        self.has_children && self.children.is_empty()
    }

    /// Whether the row can be expanded at all.
    pub fn is_expandable(&self) -> bool {
        self.has_children || !self.children.is_empty()
    }

    /// Refresh attributes from a newer copy, keeping loaded children.
    pub fn refresh_from(&mut self, other: FolderNode) {
        self.name = other.name;
        self.has_children = other.has_children;
        self.can_upload = other.can_upload;
        self.can_create = other.can_create;
        self.templates = other.templates;
    }

    /// Depth-first walk over `self` and every loaded descendant.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a FolderNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
