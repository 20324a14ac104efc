//! HeaderCrawl Harvest
//!
//! The header harvesting pipeline. Stages run strictly in order:
//!
//! 1. mine the build cache for the source root and include directories
//! 2. scan the source root for `#include` directives
//! 3. resolve each header against the include directories
//! 4. copy resolved headers into the output tree
//!
//! ## Modules
//!
//! - `resolver` - Include search path resolution
//! - `materializer` - Mirrored copies into the output directory

pub mod materializer;
pub mod resolver;

pub use materializer::{CopyReport, HeaderMaterializer};
pub use resolver::{HeaderResolver, ResolveStats};

use headercrawl_core::{HarvestConfig, HeaderTable, Result};
use headercrawl_parser::{BuildCache, CacheMiner, IncludeScanner, ScanStats};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a harvest run produced
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub source_root: PathBuf,
    pub include_paths: Vec<PathBuf>,
    pub scan: ScanStats,
    pub resolve: ResolveStats,
    pub copy: CopyReport,
    /// Final header table, resolved and unresolved entries alike
    pub headers: HeaderTable,
}

/// Runs the four pipeline stages for one build directory
pub struct Harvester {
    config: HarvestConfig,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Mine the build cache in `build_dir`
    pub fn mine(&self, build_dir: &Path) -> Result<BuildCache> {
        CacheMiner::new(&self.config).mine(build_dir)
    }

    /// Scan `source_root` with every configured pattern into a fresh table
    pub fn scan(&self, source_root: &Path) -> Result<(HeaderTable, ScanStats)> {
        IncludeScanner::check_source_root(source_root)?;

        let scanner = IncludeScanner::new(&self.config);
        let mut table = HeaderTable::new();
        let mut stats = ScanStats::default();
        for pattern in &self.config.patterns {
            stats.merge(scanner.scan_pattern(source_root, pattern, &mut table)?);
        }

        info!(
            "Found {} unique headers in {} source files under {}",
            table.len(),
            stats.files_scanned,
            source_root.display()
        );
        Ok((table, stats))
    }

    /// Run the whole pipeline, copying headers below `output_dir`
    pub fn run(&self, build_dir: &Path, output_dir: &Path) -> Result<HarvestReport> {
        let cache = self.mine(build_dir)?;
        let (mut headers, scan) = self.scan(&cache.source_root)?;

        let resolver = HeaderResolver::new(cache.include_paths.iter().cloned());
        let resolve = resolver.resolve_table(&mut headers);

        let copy = HeaderMaterializer::new(output_dir)
            .dry_run(self.config.dry_run)
            .materialize(&headers)?;

        Ok(HarvestReport {
            source_root: cache.source_root,
            include_paths: cache.include_paths,
            scan,
            resolve,
            copy,
            headers,
        })
    }
}

impl Default for Harvester {
    fn default() -> Self {
        Self {
            config: HarvestConfig::default(),
        }
    }
}
