//! Header Path Resolver
//!
//! Locates each header recorded in a [`HeaderTable`] by trying the include
//! search directories in order, the way a compiler walks its `-I` list.

use headercrawl_core::{HeaderLocation, HeaderTable};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Entries resolved during this pass
    pub resolved: usize,
    /// Header names no search directory could provide
    pub unresolved: Vec<String>,
    /// Search directories from the cache that are not directories on disk
    pub missing_include_paths: Vec<PathBuf>,
}

/// Header file resolver over an ordered list of search directories
pub struct HeaderResolver {
    /// Include search paths
    include_paths: Vec<PathBuf>,
}

impl HeaderResolver {
    /// Create a new header resolver
    pub fn new(include_paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut resolver = Self {
            include_paths: Vec::new(),
        };
        for path in include_paths {
            resolver.add_include_path(path);
        }
        resolver
    }

    /// Add an include path; a repeated path keeps its first position
    pub fn add_include_path(&mut self, path: PathBuf) {
        if !self.include_paths.contains(&path) {
            self.include_paths.push(path);
        }
    }

    /// Get all include paths
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// Get include paths that actually exist
    pub fn existing_include_paths(&self) -> Vec<PathBuf> {
        self.include_paths
            .iter()
            .filter(|p| p.is_dir())
            .cloned()
            .collect()
    }

    /// Resolve one include text (`foo/bar.h`) to the first readable match.
    ///
    /// An absolute include text ignores the search directories and resolves
    /// only if that exact file is readable.
    pub fn resolve(&self, include_text: &str) -> Option<PathBuf> {
        let text_path = Path::new(include_text);
        if text_path.is_absolute() {
            if is_readable_file(text_path) {
                debug!("Resolved absolute include {}", include_text);
                return Some(text_path.to_path_buf());
            }
            debug!("Absolute include {} does not exist", include_text);
            return None;
        }

        for include_path in &self.include_paths {
            let full_path = include_path.join(include_text);
            if is_readable_file(&full_path) {
                debug!("Resolved {} in {:?}", include_text, include_path);
                return Some(full_path);
            }
        }

        debug!("Failed to resolve header: {}", include_text);
        None
    }

    /// Resolve every unresolved entry of `table` in place.
    ///
    /// Entries nothing matches keep their include text and are reported.
    pub fn resolve_table(&self, table: &mut HeaderTable) -> ResolveStats {
        let mut stats = ResolveStats::default();

        let existing = self.existing_include_paths();
        for path in &self.include_paths {
            if !existing.contains(path) {
                warn!("Include path {} is not a directory", path.display());
                stats.missing_include_paths.push(path.clone());
            }
        }

        for (name, location) in table.iter_mut() {
            let HeaderLocation::Unresolved(text) = location else {
                continue;
            };
            match self.resolve(text) {
                Some(path) => {
                    *location = HeaderLocation::Resolved(path);
                    stats.resolved += 1;
                }
                None => {
                    warn!("Header {} ({}) not found in any include path", name, text);
                    stats.unresolved.push(name.clone());
                }
            }
        }

        info!(
            "Resolved {} headers against {} include paths, {} unresolved",
            stats.resolved,
            self.include_paths.len(),
            stats.unresolved.len()
        );
        stats
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn create_include_trees() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("a/sub")).unwrap();
        fs::create_dir_all(root.join("b/sub")).unwrap();
        fs::create_dir_all(root.join("b/only")).unwrap();

        fs::write(root.join("a/sub/h.h"), "// from a").unwrap();
        fs::write(root.join("b/sub/h.h"), "// from b").unwrap();
        fs::write(root.join("b/only/o.h"), "// only in b").unwrap();

        temp
    }

    #[test]
    fn test_first_search_path_wins() {
        let temp = create_include_trees();
        let resolver = HeaderResolver::new(vec![temp.path().join("a"), temp.path().join("b")]);

        assert_eq!(resolver.resolve("sub/h.h"), Some(temp.path().join("a/sub/h.h")));
    }

    #[test]
    fn test_falls_through_to_later_path() {
        let temp = create_include_trees();
        let resolver = HeaderResolver::new(vec![temp.path().join("a"), temp.path().join("b")]);

        assert_eq!(resolver.resolve("only/o.h"), Some(temp.path().join("b/only/o.h")));
        assert_eq!(resolver.resolve("nowhere.h"), None);
    }

    #[test]
    fn test_join_inserts_separator() {
        let temp = create_include_trees();
        // No trailing slash on the search directory: a plain string
        // concatenation would look in ".../asub/h.h" and never match.
        let dir = temp.path().join("a");
        assert!(!dir.to_string_lossy().ends_with('/'));

        let resolver = HeaderResolver::new(vec![dir]);
        assert!(resolver.resolve("sub/h.h").is_some());
    }

    #[test]
    fn test_absolute_include_ignores_search_paths() {
        let temp = create_include_trees();
        let resolver = HeaderResolver::new(vec![temp.path().join("a")]);

        let real = temp.path().join("b/only/o.h");
        assert_eq!(resolver.resolve(&real.to_string_lossy()), Some(real.clone()));

        let absent = temp.path().join("a/nothing-here.h");
        assert_eq!(resolver.resolve(&absent.to_string_lossy()), None);
        assert_eq!(resolver.resolve("/sub/h.h"), None);
    }

    #[test]
    fn test_directory_is_not_a_match() {
        let temp = create_include_trees();
        let resolver = HeaderResolver::new(vec![temp.path().join("a")]);
        assert_eq!(resolver.resolve("sub"), None);
    }

    #[test]
    fn test_duplicate_paths_keep_first_position() {
        let resolver = HeaderResolver::new(vec![
            PathBuf::from("/b"),
            PathBuf::from("/a"),
            PathBuf::from("/b"),
        ]);
        assert_eq!(
            resolver.include_paths(),
            &[PathBuf::from("/b"), PathBuf::from("/a")]
        );
    }

    #[test]
    fn test_existing_include_paths() {
        let temp = create_include_trees();
        let resolver = HeaderResolver::new(vec![
            temp.path().join("a"),
            temp.path().join("missing"),
        ]);
        assert_eq!(resolver.existing_include_paths(), vec![temp.path().join("a")]);
    }

    #[test]
    fn test_resolve_table() {
        let temp = create_include_trees();
        let resolver = HeaderResolver::new(vec![temp.path().join("a"), temp.path().join("b")]);

        let mut table = HeaderTable::new();
        table.insert_if_absent("h.h", "sub/h.h");
        table.insert_if_absent("lost.h", "gone/lost.h");

        let stats = resolver.resolve_table(&mut table);

        assert!(stats.missing_include_paths.is_empty());
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.unresolved, vec!["lost.h".to_string()]);
        assert_eq!(
            table.get("h.h"),
            Some(&HeaderLocation::Resolved(temp.path().join("a/sub/h.h")))
        );
        assert_eq!(
            table.get("lost.h"),
            Some(&HeaderLocation::Unresolved("gone/lost.h".into()))
        );
    }

    #[test]
    fn test_missing_include_paths_are_reported() {
        let temp = create_include_trees();
        let missing = temp.path().join("never-built/include");
        let resolver = HeaderResolver::new(vec![temp.path().join("a"), missing.clone()]);

        let mut table = HeaderTable::new();
        table.insert_if_absent("h.h", "sub/h.h");
        let stats = resolver.resolve_table(&mut table);

        assert_eq!(stats.missing_include_paths, vec![missing]);
        assert_eq!(stats.resolved, 1);
    }

    #[test]
    fn test_resolved_entries_are_left_alone() {
        let temp = create_include_trees();
        let resolver = HeaderResolver::new(vec![temp.path().join("b")]);

        let mut table = HeaderTable::new();
        table.insert_if_absent("h.h", "sub/h.h");
        resolver.resolve_table(&mut table);
        let stats = resolver.resolve_table(&mut table);

        assert_eq!(stats, ResolveStats::default());
        assert_eq!(table.resolved_count(), 1);
    }
}
