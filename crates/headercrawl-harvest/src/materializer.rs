//! Header Materializer
//!
//! Copies resolved headers into an output tree that mirrors each header's
//! resolved location, e.g. `/usr/include/foo/bar.h` lands at
//! `<out>/usr/include/foo/bar.h`.

use headercrawl_core::{Error, HeaderLocation, HeaderTable, Result};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a materialization pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    /// Headers copied into the output tree
    pub copied: usize,
    /// Unresolved headers that were not attempted
    pub skipped: usize,
    /// Copies that failed to read or write
    pub failed: usize,
    /// Destinations computed in dry-run mode
    pub planned: Vec<PathBuf>,
}

impl CopyReport {
    pub fn attempted(&self) -> usize {
        self.copied + self.failed
    }
}

/// Writes resolved headers below an output directory
pub struct HeaderMaterializer {
    output_dir: PathBuf,
    dry_run: bool,
}

impl HeaderMaterializer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dry_run: false,
        }
    }

    /// Only compute destinations; never touch the filesystem
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Destination of `resolved` inside the output tree.
    ///
    /// `..` steps back one directory but never above the output directory;
    /// root, prefix and `.` components are dropped.
    pub fn mirror_path(&self, resolved: &Path) -> PathBuf {
        let mut parts: Vec<&OsStr> = Vec::new();
        for component in resolved.components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::ParentDir => {
                    parts.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        let mut dest = self.output_dir.clone();
        dest.extend(parts);
        dest
    }

    /// Copy one resolved header, creating parent directories as needed
    pub fn copy_header(&self, resolved: &Path) -> Result<PathBuf> {
        let dest = self.mirror_path(resolved);
        let copy_failed = |source| Error::CopyFailed {
            from: resolved.to_path_buf(),
            to: dest.clone(),
            source,
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(copy_failed)?;
        }
        fs::copy(resolved, &dest).map_err(copy_failed)?;
        Ok(dest)
    }

    /// Copy every resolved entry of `table`.
    ///
    /// Unresolved entries are skipped and single failures are logged; the
    /// pass only fails when copies were attempted and none succeeded.
    pub fn materialize(&self, table: &HeaderTable) -> Result<CopyReport> {
        let mut report = CopyReport::default();

        for (name, location) in table.iter() {
            let resolved = match location {
                HeaderLocation::Resolved(path) => path,
                HeaderLocation::Unresolved(text) => {
                    warn!("Not copying unresolved header {} ({})", name, text);
                    report.skipped += 1;
                    continue;
                }
            };

            if self.dry_run {
                let dest = self.mirror_path(resolved);
                debug!("Would copy {} to {}", resolved.display(), dest.display());
                report.planned.push(dest);
                continue;
            }

            match self.copy_header(resolved) {
                Ok(dest) => {
                    debug!("Copied {} to {}", resolved.display(), dest.display());
                    report.copied += 1;
                }
                Err(err) => {
                    warn!("{}", err);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Materialized headers into {}: {} copied, {} skipped, {} failed",
            self.output_dir.display(),
            report.copied,
            report.skipped,
            report.failed
        );

        if report.attempted() > 0 && report.copied == 0 {
            return Err(Error::AllCopiesFailed {
                attempted: report.attempted(),
            });
        }
        Ok(report)
    }
}
