//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Default number of consecutive non-include lines tolerated after the
/// first `#include` before a file scan stops.
pub const DEFAULT_INCLUDE_WINDOW: usize = 10;

/// Harvest run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Name of the cache file inside the build directory
    pub cache_file_name: String,

    /// Cache key holding the project's source root
    pub source_root_key: String,

    /// Glob patterns selecting the source files to scan
    pub patterns: Vec<String>,

    /// Early-stop window for include scanning (`None` scans whole files)
    pub include_window: Option<usize>,

    /// Match patterns against the whole source tree, not just its top level
    pub recursive: bool,

    /// Directory names skipped during a recursive walk
    pub exclude_dirs: Vec<String>,

    /// Plan copies without touching the output tree
    pub dry_run: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            cache_file_name: "CMakeCache.txt".into(),
            source_root_key: "OSSIM_DEV_HOME".into(),
            patterns: vec!["*.cpp".into(), "*.c".into()],
            include_window: Some(DEFAULT_INCLUDE_WINDOW),
            recursive: false,
            exclude_dirs: vec![".git".into()],
            dry_run: false,
        }
    }
}

impl HarvestConfig {
    /// Load configuration from a YAML file, filling unset fields with defaults
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut config: HarvestConfig =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.include_window = config.effective_include_window();
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.cache_file_name.trim().is_empty() {
            return Err(Error::Config("cache_file_name must not be empty".into()));
        }
        if self.source_root_key.trim().is_empty() {
            return Err(Error::Config("source_root_key must not be empty".into()));
        }
        if self.patterns.is_empty() {
            return Err(Error::Config("at least one source pattern is required".into()));
        }
        Ok(())
    }

    /// Early-stop window to apply; a window of zero scans whole files
    pub fn effective_include_window(&self) -> Option<usize> {
        self.include_window.filter(|&window| window > 0)
    }

    /// The `KEY:` prefix that introduces the source-root line in the cache
    pub fn source_root_prefix(&self) -> String {
        format!("{}:", self.source_root_key)
    }
}
