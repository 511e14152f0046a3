use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{PathError, TreeError};

use super::index::TreeIndex;
use super::node::{FolderEntry, FolderNode};
use super::path::FolderPath;

/// What a merge changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    /// Non-fatal problems found while merging (malformed entries, empty
    /// results).
    pub notices: Vec<TreeError>,
}

/// Owns the folder tree of one namespace and its derived index.
///
/// Trees are only ever grown by merges. Switching namespace replaces the
/// whole store contents and bumps `generation`, so responses fetched for
/// the previous tree can be recognized and dropped.
pub struct TreeStore {
    root: FolderNode,
    index: TreeIndex,
    generation: u64,
}

impl TreeStore {
    pub fn new(label: impl Into<String>) -> Self {
        let root = FolderNode::root(label);
        let index = TreeIndex::build(&root);
        Self {
            root,
            index,
            generation: 0,
        }
    }

    /// Discard the current tree and start a new generation.
    pub fn reset(&mut self, label: impl Into<String>) {
        self.root = FolderNode::root(label);
        self.index = TreeIndex::build(&self.root);
        self.generation += 1;
        debug!(generation = self.generation, "tree store reset");
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn root(&self) -> &FolderNode {
        &self.root
    }

    pub fn index(&self) -> &TreeIndex {
        &self.index
    }

    pub fn get_node(&self, path: &FolderPath) -> Option<&FolderNode> {
        self.get_by_key(&path.key())
    }

    pub fn get_by_key(&self, key: &str) -> Option<&FolderNode> {
        self.index.resolve(&self.root, key)
    }

    pub fn contains(&self, path: &FolderPath) -> bool {
        self.index.contains(&path.key())
    }

    /// Merge a server listing into the children of `parent`.
    ///
    /// Children already present (by path key) get their attributes refreshed
    /// and keep their own loaded subtrees; new children are appended;
    /// children missing from the listing are left alone. Calling this twice
    /// with the same listing yields the same tree as calling it once.
    ///
    /// Returns `StaleResponse` when `parent` is not in the current tree.
    pub fn merge_children(
        &mut self,
        parent: &FolderPath,
        entries: Vec<FolderEntry>,
    ) -> Result<MergeReport, TreeError> {
        let parent_key = parent.key();
        let mut report = MergeReport::default();

        let listed = entries.len();
        let incoming = Self::prepare(parent, entries, &mut report.notices);

        let Some(node) = self.index.resolve_mut(&mut self.root, &parent_key) else {
            warn!(path = %parent, "merge target missing from tree");
            return Err(TreeError::StaleResponse {
                path: parent.clone(),
            });
        };

        if incoming.is_empty() {
            // Rejected entries still prove the folder is not empty.
            if listed == 0 && node.children.is_empty() && node.has_children && !parent.is_root()
            {
                node.has_children = false;
                report.notices.push(TreeError::EmptyResult {
                    path: parent.clone(),
                });
            }
            return Ok(report);
        }

        if node.children.is_empty() {
            report.added = incoming.len();
            node.children = incoming;
        } else {
            let mut positions: HashMap<String, usize> = node
                .children
                .iter()
                .enumerate()
                .map(|(i, child)| (child.key(), i))
                .collect();
            for child in incoming {
                match positions.get(&child.key()) {
                    Some(&i) => {
                        node.children[i].refresh_from(child);
                        report.updated += 1;
                    }
                    None => {
                        positions.insert(child.key(), node.children.len());
                        node.children.push(child);
                        report.added += 1;
                    }
                }
            }
        }
        node.has_children = true;

        self.index = TreeIndex::build(&self.root);
        debug!(
            path = %parent,
            added = report.added,
            updated = report.updated,
            "merged children"
        );
        Ok(report)
    }

    /// Normalize and de-duplicate a listing. Later duplicates refresh the
    /// attributes of the first occurrence.
    fn prepare(
        parent: &FolderPath,
        entries: Vec<FolderEntry>,
        notices: &mut Vec<TreeError>,
    ) -> Vec<FolderNode> {
        let mut nodes: Vec<FolderNode> = Vec::with_capacity(entries.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for mut entry in entries {
            let path = match Self::entry_path(parent, &entry) {
                Ok(path) => path,
                Err(reason) => {
                    warn!(raw = %entry.path, %reason, "skipping malformed entry");
                    notices.push(TreeError::MalformedPath {
                        raw: entry.path.clone(),
                        reason,
                    });
                    continue;
                }
            };
            if entry.name.is_empty() {
                entry.name = path.name().unwrap_or_default().to_string();
            }
            let node = FolderNode::from_entry(entry, path);
            match seen.get(&node.key()) {
                Some(&i) => nodes[i].refresh_from(node),
                None => {
                    seen.insert(node.key(), nodes.len());
                    nodes.push(node);
                }
            }
        }
        nodes
    }

    fn entry_path(parent: &FolderPath, entry: &FolderEntry) -> Result<FolderPath, PathError> {
        if entry.path.trim().is_empty() {
            let normalized = FolderPath::normalize(&entry.name)?;
            return match normalized.segments() {
                [segment] => Ok(parent.join(segment)),
                [] => Err(PathError::Empty),
                _ => Err(PathError::NotAChild {
                    parent: parent.to_string(),
                }),
            };
        }
        let path = FolderPath::normalize(&entry.path)?;
        if path.is_root() {
            return Err(PathError::Empty);
        }
        if path.parent().as_ref() != Some(parent) {
            return Err(PathError::NotAChild {
                parent: parent.to_string(),
            });
        }
        Ok(path)
    }

    /// Every loaded node except the root, in document order.
    pub fn loaded_nodes(&self) -> Vec<&FolderNode> {
        let mut nodes = Vec::with_capacity(self.index.len());
        self.root.walk(&mut |node| {
            if !node.path.is_root() {
                nodes.push(node);
            }
        });
        nodes
    }
}
