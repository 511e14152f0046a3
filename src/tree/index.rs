use std::collections::HashMap;

use super::node::FolderNode;

/// Derived lookup tables over a folder tree.
///
/// Nodes are addressed by their child-index route from the root, so the
/// tree itself stays a plain owning forest. Rebuilt after every mutation;
/// never authoritative.
#[derive(Debug, Default, Clone)]
pub struct TreeIndex {
    routes: HashMap<String, Vec<usize>>,
    parents: HashMap<String, String>,
}

impl TreeIndex {
    pub fn build(root: &FolderNode) -> Self {
        let mut index = Self::default();
        let mut route = Vec::new();
        index.visit(root, None, &mut route);
        index
    }

    fn visit(&mut self, node: &FolderNode, parent: Option<&str>, route: &mut Vec<usize>) {
        let key = node.key();
        if let Some(parent) = parent {
            self.parents.insert(key.clone(), parent.to_string());
        }
        for (i, child) in node.children.iter().enumerate() {
            route.push(i);
            self.visit(child, Some(&key), route);
            route.pop();
        }
        self.routes.insert(key, route.clone());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.routes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn parent_of(&self, key: &str) -> Option<&str> {
        self.parents.get(key).map(String::as_str)
    }

    /// Ancestor keys from the top-level folder down to the parent,
    /// excluding the root key.
    pub fn ancestors_of(&self, key: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self.parent_of(key);
        while let Some(parent) = current {
            if parent.is_empty() {
                break;
            }
            chain.push(parent.to_string());
            current = self.parent_of(parent);
        }
        chain.reverse();
        chain
    }

    pub fn resolve<'a>(&self, root: &'a FolderNode, key: &str) -> Option<&'a FolderNode> {
        let route = self.routes.get(key)?;
        let mut node = root;
        for &i in route {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn resolve_mut<'a>(
        &self,
        root: &'a mut FolderNode,
        key: &str,
    ) -> Option<&'a mut FolderNode> {
        let route = self.routes.get(key)?;
        let mut node = root;
        for &i in route {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::FolderEntry;
    use crate::tree::path::FolderPath;

    fn folder(segments: &[&str]) -> FolderNode {
        let path = FolderPath::from_segments(segments.iter().copied());
        let name = segments.last().copied().unwrap_or_default();
        FolderNode::from_entry(FolderEntry::new(name, "", true), path)
    }

    fn sample() -> FolderNode {
        let mut root = FolderNode::root("ns");
        let mut clients = folder(&["Clients"]);
        let mut acme = folder(&["Clients", "Acme"]);
        acme.children.push(folder(&["Clients", "Acme", "2024"]));
        clients.children.push(acme);
        clients.children.push(folder(&["Clients", "Globex"]));
        root.children.push(clients);
        root
    }

    #[test]
    fn indexes_every_node_including_root() {
        let root = sample();
        let index = TreeIndex::build(&root);
        assert_eq!(index.len(), 5);
        assert!(index.contains(""));
        assert!(index.contains("Clients/Acme/2024"));
    }

    #[test]
    fn resolves_nodes_by_key() {
        let root = sample();
        let index = TreeIndex::build(&root);
        let node = index.resolve(&root, "Clients/Globex").unwrap();
        assert_eq!(node.name, "Globex");
        assert!(index.resolve(&root, "Clients/Initech").is_none());
    }

    #[test]
    fn parent_and_ancestor_walks() {
        let root = sample();
        let index = TreeIndex::build(&root);
        assert_eq!(index.parent_of("Clients/Acme"), Some("Clients"));
        assert_eq!(index.parent_of("Clients"), Some(""));
        assert_eq!(index.parent_of(""), None);
        assert_eq!(
            index.ancestors_of("Clients/Acme/2024"),
            vec!["Clients".to_string(), "Clients/Acme".to_string()]
        );
    }

    #[test]
    fn resolve_mut_allows_in_place_edit() {
        let mut root = sample();
        let index = TreeIndex::build(&root);
        index.resolve_mut(&mut root, "Clients/Acme").unwrap().can_upload = true;
        assert!(root.children[0].children[0].can_upload);
    }
}
