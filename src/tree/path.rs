use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::PathError;

/// Separator used to build canonical keys. Raw server paths may use `/` or
/// `\`, doubled or trailing; neither can survive inside a segment.
pub const KEY_SEPARATOR: char = '/';

/// A folder location as an ordered list of segments.
///
/// Equality is by segment value, so the same folder seen in two different
/// server responses compares equal. The empty path is the namespace root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    /// The namespace root (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from already-clean segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a raw server path.
    ///
    /// Accepts `/` and `\` as separators, collapses runs of separators
    /// (including double-escaped `\\`) and drops leading and trailing ones.
    pub fn normalize(raw: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        for segment in raw.split(['/', '\\']) {
            if segment.is_empty() {
                continue;
            }
            if segment == "." || segment == ".." {
                return Err(PathError::RelativeSegment(segment.to_string()));
            }
            if segment.contains('\0') {
                return Err(PathError::NulCharacter);
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Canonical lookup key: segments joined by [`KEY_SEPARATOR`].
    pub fn key(&self) -> String {
        let mut key = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(segment);
        }
        key
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments; top-level folders have depth 1.
    #[allow(dead_code)]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing folder, or `None` for the root.
    pub fn parent(&self) -> Option<FolderPath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Child path one level below `self`.
    pub fn join(&self, segment: &str) -> FolderPath {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// Strict ancestry: a path is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &FolderPath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.key())
    }
}

impl Serialize for FolderPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parent key of a canonical key; `None` for the root key.
pub fn parent_key(key: &str) -> Option<&str> {
    if key.is_empty() {
        return None;
    }
    Some(key.rfind(KEY_SEPARATOR).map_or("", |i| &key[..i]))
}

/// Whether `key` lies strictly below `ancestor` by canonical key.
pub fn key_is_descendant(ancestor: &str, key: &str) -> bool {
    if ancestor.is_empty() {
        return !key.is_empty();
    }
    key.len() > ancestor.len()
        && key.starts_with(ancestor)
        && key[ancestor.len()..].starts_with(KEY_SEPARATOR)
}
