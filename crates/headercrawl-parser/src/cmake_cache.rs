//! Build Cache Miner
//!
//! Recovers the project source root and the include search directories from
//! a CMake cache file (`KEY:TYPE=VALUE` lines).

use headercrawl_core::{Error, HarvestConfig, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const INCLUDE_KEY_MARKER: &str = "_INCLUDE_";
const PATH_VALUE_MARKER: &str = "PATH=";

/// What the pipeline needs from the build cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCache {
    /// Configured project source root
    pub source_root: PathBuf,
    /// Include search directories, in file order
    pub include_paths: Vec<PathBuf>,
}

/// Extracts a [`BuildCache`] from a build directory
pub struct CacheMiner {
    cache_file_name: String,
    source_root_prefix: String,
}

impl CacheMiner {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            cache_file_name: config.cache_file_name.clone(),
            source_root_prefix: config.source_root_prefix(),
        }
    }

    /// Path of the cache file inside `build_dir`
    pub fn cache_path(&self, build_dir: &Path) -> PathBuf {
        build_dir.join(&self.cache_file_name)
    }

    /// Open and mine the cache file in `build_dir`
    pub fn mine(&self, build_dir: &Path) -> Result<BuildCache> {
        let path = self.cache_path(build_dir);
        let file = File::open(&path).map_err(|source| Error::ConfigNotFound {
            path: path.clone(),
            source,
        })?;

        let cache = self.mine_reader(BufReader::new(file), &path)?;
        info!(
            "Build cache {}: source root {}, {} include paths",
            path.display(),
            cache.source_root.display(),
            cache.include_paths.len()
        );
        Ok(cache)
    }

    /// Mine cache text from any reader; `origin` labels errors.
    ///
    /// Bytes that are not UTF-8 are decoded lossily. A read failure is
    /// reported as `ConfigNotFound` naming `origin`.
    pub fn mine_reader<R: BufRead>(&self, mut reader: R, origin: &Path) -> Result<BuildCache> {
        let mut source_root = None;
        let mut include_paths = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| Error::ConfigNotFound {
                    path: origin.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                continue;
            }

            if source_root.is_none() {
                if let Some(value) = self.source_root_value(line) {
                    debug!("Source root line: {}", line);
                    source_root = Some(PathBuf::from(value));
                    continue;
                }
            }

            if let Some(value) = include_path_value(line) {
                debug!("Include path: {}", value);
                include_paths.push(PathBuf::from(value));
            }
        }

        let source_root = source_root.ok_or_else(|| Error::SourceRootMissing {
            key: self.source_root_prefix.trim_end_matches(':').to_string(),
            path: origin.to_path_buf(),
        })?;

        Ok(BuildCache {
            source_root,
            include_paths,
        })
    }

    fn source_root_value<'a>(&self, line: &'a str) -> Option<&'a str> {
        if !line.starts_with(&self.source_root_prefix) {
            return None;
        }
        let (_, value) = line.split_once('=')?;
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// Value of a `..._INCLUDE_...:PATH=<dir>` line.
///
/// The marker must sit inside the key (after its first character); the
/// remainder of the line must carry `PATH=`. Empty and `-NOTFOUND` values
/// name no directory and are skipped.
fn include_path_value(line: &str) -> Option<&str> {
    let key_end = line.find(|c: char| c == ':' || c == '=').unwrap_or(line.len());
    let key = &line[..key_end];
    match key.find(INCLUDE_KEY_MARKER) {
        Some(pos) if pos > 0 => {}
        _ => return None,
    }

    let rest = &line[key_end..];
    let value_start = rest.find(PATH_VALUE_MARKER)? + PATH_VALUE_MARKER.len();
    let value = rest[value_start..].trim();
    if value.is_empty() || value.ends_with("-NOTFOUND") {
        debug!("Skipping include entry without a directory: {}", line);
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tempfile::TempDir;

    const SAMPLE_CACHE: &str = r#"# This is the CMakeCache file.
# For build in directory: /proj/build

//Path to a file.
FOO_INCLUDE_DIR:PATH=/usr/include/foo

//Value Computed by CMake
OSSIM_DEV_HOME:PATH=/proj/src
CMAKE_BUILD_TYPE:STRING=Release
GEOS_INCLUDE_DIR:PATH=/opt/geos/include
GEOS_INCLUDE_DIR-ADVANCED:INTERNAL=1
JPEG_INCLUDE_DIR:PATH=JPEG_INCLUDE_DIR-NOTFOUND
_INCLUDE_BROKEN:PATH=/nowhere
CMAKE_INSTALL_PREFIX:PATH=/usr/local
"#;

    fn miner() -> CacheMiner {
        CacheMiner::new(&HarvestConfig::default())
    }

    fn mine(text: &str) -> Result<BuildCache> {
        miner().mine_reader(Cursor::new(text), Path::new("CMakeCache.txt"))
    }

    #[test]
    fn test_mine_sample() {
        let cache = mine(SAMPLE_CACHE).unwrap();
        assert_eq!(cache.source_root, PathBuf::from("/proj/src"));
        assert_eq!(
            cache.include_paths,
            vec![
                PathBuf::from("/usr/include/foo"),
                PathBuf::from("/opt/geos/include"),
            ]
        );
    }

    #[test]
    fn test_non_utf8_comment_is_tolerated() {
        let mut bytes = b"//Caf\xe9 help text\n".to_vec();
        bytes.extend_from_slice(SAMPLE_CACHE.as_bytes());

        let cache = miner()
            .mine_reader(Cursor::new(bytes), Path::new("CMakeCache.txt"))
            .unwrap();
        assert_eq!(cache.source_root, PathBuf::from("/proj/src"));
        assert_eq!(cache.include_paths.len(), 2);
    }

    #[test]
    fn test_read_failure_names_cache_file() {
        struct Unreadable;

        impl std::io::Read for Unreadable {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "bad sector"))
            }
        }

        let origin = Path::new("/proj/build/CMakeCache.txt");
        let err = miner()
            .mine_reader(std::io::BufReader::new(Unreadable), origin)
            .unwrap_err();

        assert!(matches!(err, Error::ConfigNotFound { .. }));
        assert!(err.to_string().contains("/proj/build/CMakeCache.txt"));
    }

    #[test]
    fn test_first_source_root_wins() {
        let cache = mine("OSSIM_DEV_HOME:PATH=/first\nOSSIM_DEV_HOME:PATH=/second\n").unwrap();
        assert_eq!(cache.source_root, PathBuf::from("/first"));
    }

    #[test]
    fn test_source_root_key_must_match_exactly() {
        let err = mine("OSSIM_DEV_HOME_EXTRA:PATH=/x\nMY_OSSIM_DEV_HOME:PATH=/y\n").unwrap_err();
        assert!(matches!(err, Error::SourceRootMissing { .. }));
    }

    #[test]
    fn test_missing_source_root() {
        let err = mine("FOO_INCLUDE_DIR:PATH=/usr/include\n").unwrap_err();
        match err {
            Error::SourceRootMissing { key, .. } => assert_eq!(key, "OSSIM_DEV_HOME"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_include_paths_keep_file_order_and_duplicates() {
        let text = "B_INCLUDE_DIR:PATH=/b\r\nOSSIM_DEV_HOME:PATH=/src\r\n\r\nA_INCLUDE_DIR:PATH=/a\r\nC_INCLUDE_PATH:PATH=/b\r\n";
        let cache = mine(text).unwrap();
        assert_eq!(
            cache.include_paths,
            vec![PathBuf::from("/b"), PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_custom_source_root_key() {
        let config = HarvestConfig {
            source_root_key: "MY_HOME".into(),
            ..HarvestConfig::default()
        };
        let cache = CacheMiner::new(&config)
            .mine_reader(Cursor::new("MY_HOME:PATH=/home/me/src\n"), Path::new("c"))
            .unwrap();
        assert_eq!(cache.source_root, PathBuf::from("/home/me/src"));
    }

    #[test]
    fn test_missing_cache_file() {
        let dir = TempDir::new().unwrap();
        let err = miner().mine(dir.path()).unwrap_err();
        match err {
            Error::ConfigNotFound { path, .. } => {
                assert_eq!(path, dir.path().join("CMakeCache.txt"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mine_from_build_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("CMakeCache.txt"), SAMPLE_CACHE).unwrap();
        let cache = miner().mine(dir.path()).unwrap();
        assert_eq!(cache.include_paths.len(), 2);
    }
}
