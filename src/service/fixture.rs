use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::FolderService;
use crate::error::{AppError, FetchError, Result};
use crate::tree::node::FolderEntry;
use crate::tree::path::FolderPath;

/// One folder in a fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureFolder {
    pub name: String,
    #[serde(default)]
    pub can_upload: bool,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub templates: Value,
    #[serde(default)]
    pub children: Vec<FixtureFolder>,
    /// Override the `has_children` hint, e.g. to advertise children that
    /// turn out to be empty.
    #[serde(default)]
    pub has_children: Option<bool>,
    /// Listing this folder fails with a transient error.
    #[serde(default)]
    pub fail: bool,
}

impl FixtureFolder {
    fn entry(&self, parent: &FolderPath) -> FolderEntry {
        let path = parent.join(&self.name);
        FolderEntry {
            name: self.name.clone(),
            // Trailing separator, like the document store returns.
            path: format!("{}/", path),
            has_children: self.has_children.unwrap_or(!self.children.is_empty()),
            can_upload: self.can_upload,
            can_create: self.can_create,
            templates: self.templates.clone(),
        }
    }
}

/// A set of namespaces (one per client), each a list of top-level folders.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub namespaces: BTreeMap<String, Vec<FixtureFolder>>,
}

impl Fixture {
    /// Read a JSON fixture from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        if fixture.namespaces.is_empty() {
            return Err(AppError::Config(format!(
                "{}: fixture defines no namespaces",
                path.display()
            )));
        }
        Ok(fixture)
    }

    /// Built-in sample data so the picker runs without a fixture file.
    pub fn demo() -> Self {
        let value = json!({
            "namespaces": {
                "acme-corp": [
                    { "name": "Clients", "can_create": true, "children": [
                        { "name": "Acme", "can_upload": true, "children": [
                            { "name": "Contracts", "can_upload": true },
                            { "name": "Receipts", "can_upload": true },
                            { "name": "Reports", "can_upload": true, "children": [
                                { "name": "2023", "can_upload": true },
                                { "name": "2024", "can_upload": true }
                            ]}
                        ]},
                        { "name": "Globex", "can_upload": true, "children": [
                            { "name": "Invoices", "can_upload": true,
                              "templates": [{ "id": "inv", "label": "Invoice" }] }
                        ]},
                        { "name": "Initech", "has_children": true },
                        { "name": "Umbrella", "fail": true, "children": [
                            { "name": "Research" }
                        ]}
                    ]},
                    { "name": "Internal", "children": [
                        { "name": "HR" },
                        { "name": "Finance", "can_upload": true }
                    ]}
                ],
                "globex-inc": [
                    { "name": "Projects", "can_create": true, "children": [
                        { "name": "Cypress Creek", "can_upload": true },
                        { "name": "Hammock District", "can_upload": true }
                    ]},
                    { "name": "Legal", "children": [
                        { "name": "Patents", "can_upload": true }
                    ]}
                ]
            }
        });
        // The literal above always matches the schema.
        serde_json::from_value(value).unwrap_or(Fixture {
            namespaces: BTreeMap::new(),
        })
    }

    pub fn namespace_names(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }

    /// Service for one namespace, or `None` if it does not exist.
    pub fn service(&self, namespace: &str, latency: Duration) -> Option<FixtureService> {
        self.namespaces
            .get(namespace)
            .map(|folders| FixtureService::new(folders.clone(), latency))
    }
}

/// Serves a single fixture namespace, optionally with artificial latency.
#[derive(Debug, Clone)]
pub struct FixtureService {
    folders: Vec<FixtureFolder>,
    latency: Duration,
}

impl FixtureService {
    pub fn new(folders: Vec<FixtureFolder>, latency: Duration) -> Self {
        Self { folders, latency }
    }

    fn find(&self, path: &FolderPath) -> Option<&FixtureFolder> {
        let (first, rest) = path.segments().split_first()?;
        let mut folder = self.folders.iter().find(|f| &f.name == first)?;
        for segment in rest {
            folder = folder.children.iter().find(|f| &f.name == segment)?;
        }
        Some(folder)
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl FolderService for FixtureService {
    async fn fetch_root(&self) -> std::result::Result<Vec<FolderEntry>, FetchError> {
        self.pause().await;
        let root = FolderPath::root();
        Ok(self.folders.iter().map(|f| f.entry(&root)).collect())
    }

    async fn fetch_children(
        &self,
        path: &FolderPath,
    ) -> std::result::Result<Vec<FolderEntry>, FetchError> {
        self.pause().await;
        let folder = self
            .find(path)
            .ok_or_else(|| FetchError::NotFound(path.to_string()))?;
        if folder.fail {
            return Err(FetchError::Transient(format!(
                "{} is temporarily unavailable",
                path
            )));
        }
        Ok(folder.children.iter().map(|f| f.entry(path)).collect())
    }
}
