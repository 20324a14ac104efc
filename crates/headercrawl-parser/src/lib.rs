//! HeaderCrawl Parser
//!
//! Text-level extraction for the harvesting pipeline.
//!
//! ## Modules
//!
//! - `cmake_cache` - Source root and include directories from a build cache
//! - `includes` - `#include` scanning over a project's source files

pub mod cmake_cache;
pub mod includes;

pub use cmake_cache::{BuildCache, CacheMiner};
pub use includes::{IncludeScanner, ScanStats};
