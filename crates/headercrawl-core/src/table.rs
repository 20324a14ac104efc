//! Header table
//!
//! Maps each header base filename (`bar.h`) to where it lives. Entries start
//! out as the include text found in source (`foo/bar.h`) and are replaced by
//! a verified path once a search directory yields the file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of a header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "path", rename_all = "snake_case")]
pub enum HeaderLocation {
    /// Include text as written in the directive, not yet located
    Unresolved(String),
    /// Existing, readable file found in a search directory
    Resolved(PathBuf),
}

impl HeaderLocation {
    pub fn is_resolved(&self) -> bool {
        matches!(self, HeaderLocation::Resolved(_))
    }

    /// The resolved path, if any
    pub fn resolved_path(&self) -> Option<&Path> {
        match self {
            HeaderLocation::Resolved(path) => Some(path),
            HeaderLocation::Unresolved(_) => None,
        }
    }
}

impl std::fmt::Display for HeaderLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderLocation::Unresolved(text) => write!(f, "{} (unresolved)", text),
            HeaderLocation::Resolved(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Header filename to location, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderTable {
    entries: IndexMap<String, HeaderLocation>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an include unless its filename is already known.
    ///
    /// Returns `true` when a new entry was added.
    pub fn insert_if_absent(&mut self, file_name: &str, include_text: &str) -> bool {
        if self.entries.contains_key(file_name) {
            return false;
        }
        self.entries.insert(
            file_name.to_string(),
            HeaderLocation::Unresolved(include_text.to_string()),
        );
        true
    }

    pub fn get(&self, file_name: &str) -> Option<&HeaderLocation> {
        self.entries.get(file_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HeaderLocation)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut HeaderLocation)> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.values().filter(|l| l.is_resolved()).count()
    }

    /// Names of headers still holding their include text
    pub fn unresolved_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, l)| !l.is_resolved())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
