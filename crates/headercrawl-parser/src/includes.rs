//! Include Scanner
//!
//! Walks a source root for files matching glob patterns and records every
//! header named by an `#include` directive into a [`HeaderTable`].

use globset::Glob;
use headercrawl_core::{Error, HarvestConfig, HeaderTable, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const INCLUDE_DIRECTIVE: &str = "#include ";

/// Counters collected while scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_unreadable: usize,
    pub includes_seen: usize,
    pub malformed_includes: usize,
    pub new_headers: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: ScanStats) {
        self.files_scanned += other.files_scanned;
        self.files_unreadable += other.files_unreadable;
        self.includes_seen += other.includes_seen;
        self.malformed_includes += other.malformed_includes;
        self.new_headers += other.new_headers;
    }
}

/// Classification of a single source line
#[derive(Debug, Clone, PartialEq, Eq)]
enum IncludeLine<'a> {
    /// Anything that is not an `#include ` directive
    Other,
    /// Directive without a usable `<...>` or `"..."` argument
    Malformed,
    Include { text: &'a str, file_name: &'a str },
}

fn classify_line(line: &str) -> IncludeLine<'_> {
    if !line.starts_with('#') {
        return IncludeLine::Other;
    }
    let Some(rest) = line.strip_prefix(INCLUDE_DIRECTIVE) else {
        return IncludeLine::Other;
    };

    let rest = rest.trim_start();
    let close = match rest.chars().next() {
        Some('<') => '>',
        Some('"') => '"',
        _ => return IncludeLine::Malformed,
    };

    let body = &rest[1..];
    let text = match body.rfind(close) {
        Some(end) if end > 0 => &body[..end],
        _ => return IncludeLine::Malformed,
    };

    let file_name = text
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(text);
    if file_name.is_empty() {
        return IncludeLine::Malformed;
    }

    IncludeLine::Include { text, file_name }
}

/// Scanner for `#include` directives
#[derive(Debug, Clone)]
pub struct IncludeScanner {
    /// Non-include lines tolerated after the first include before giving up
    window: Option<usize>,
    recursive: bool,
    exclude_dirs: Vec<String>,
}

impl IncludeScanner {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            window: config.effective_include_window(),
            recursive: config.recursive,
            exclude_dirs: config.exclude_dirs.clone(),
        }
    }

    /// Top-level scanner with a custom early-stop window (zero disables it)
    pub fn with_window(window: Option<usize>) -> Self {
        Self {
            window: window.filter(|&w| w > 0),
            recursive: false,
            exclude_dirs: Vec::new(),
        }
    }

    /// Make sure the source root can be listed before any scanning starts
    pub fn check_source_root(root: &Path) -> Result<()> {
        std::fs::read_dir(root)
            .map(|_| ())
            .map_err(|source| Error::SourceRootInaccessible {
                path: root.to_path_buf(),
                source,
            })
    }

    /// Files under `base_dir` matching `pattern`, sorted by name
    pub fn matching_files(&self, base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let matcher = Glob::new(pattern)
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.kind().to_string(),
            })?
            .compile_matcher();

        let mut walker = WalkDir::new(base_dir).min_depth(1).sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        let entries = walker.into_iter().filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .map(|name| self.exclude_dirs.iter().any(|d| d == name))
                    .unwrap_or(false))
        });
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let relative = entry.path().strip_prefix(base_dir).unwrap_or(entry.path());
            if matcher.is_match(relative) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Scan every file matching `pattern` under `base_dir` into `table`.
    ///
    /// A pattern matching nothing contributes nothing. Files that cannot be
    /// read are logged and counted, not fatal.
    pub fn scan_pattern(
        &self,
        base_dir: &Path,
        pattern: &str,
        table: &mut HeaderTable,
    ) -> Result<ScanStats> {
        let files = self.matching_files(base_dir, pattern)?;
        debug!("Pattern {} matched {} files", pattern, files.len());

        let mut stats = ScanStats::default();
        for file in &files {
            match self.scan_file(file, table) {
                Ok(file_stats) => stats.merge(file_stats),
                Err(err @ Error::FileUnreadable { .. }) => {
                    warn!("{}", err);
                    stats.files_unreadable += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            "Scanned {} files for {}: {} new headers",
            stats.files_scanned, pattern, stats.new_headers
        );
        Ok(stats)
    }

    /// Scan one source file into `table`
    pub fn scan_file(&self, path: &Path, table: &mut HeaderTable) -> Result<ScanStats> {
        let file = File::open(path).map_err(|source| Error::FileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.scan_source(BufReader::new(file), path, table))
    }

    /// Scan source text from a reader; `origin` labels log lines.
    ///
    /// A read failure part way through keeps the headers and counts recorded
    /// so far and marks the source unreadable instead of scanned.
    pub fn scan_source<R: BufRead>(
        &self,
        reader: R,
        origin: &Path,
        table: &mut HeaderTable,
    ) -> ScanStats {
        let mut stats = ScanStats::default();
        match self.read_includes(reader, origin, table, &mut stats) {
            Ok(()) => stats.files_scanned += 1,
            Err(source) => {
                let err = Error::FileUnreadable {
                    path: origin.to_path_buf(),
                    source,
                };
                warn!("{} (after {} includes)", err, stats.includes_seen);
                stats.files_unreadable += 1;
            }
        }
        stats
    }

    fn read_includes<R: BufRead>(
        &self,
        mut reader: R,
        origin: &Path,
        table: &mut HeaderTable,
        stats: &mut ScanStats,
    ) -> std::io::Result<()> {
        let mut found_include = false;
        let mut misses = 0usize;
        let mut buf = Vec::new();

        loop {
            if let Some(window) = self.window {
                if found_include && misses >= window {
                    debug!(
                        "{}: stopping after {} lines without an include",
                        origin.display(),
                        misses
                    );
                    break;
                }
            }

            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');

            match classify_line(line) {
                IncludeLine::Other => {
                    if found_include {
                        misses += 1;
                    }
                }
                IncludeLine::Malformed => {
                    warn!(
                        "{}: could not find closing character in '{}'",
                        origin.display(),
                        line
                    );
                    stats.malformed_includes += 1;
                }
                IncludeLine::Include { text, file_name } => {
                    found_include = true;
                    misses = 0;
                    stats.includes_seen += 1;
                    if table.insert_if_absent(file_name, text) {
                        debug!("{}: new header {} ({})", origin.display(), file_name, text);
                        stats.new_headers += 1;
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for IncludeScanner {
    fn default() -> Self {
        Self::new(&HarvestConfig::default())
    }
}
