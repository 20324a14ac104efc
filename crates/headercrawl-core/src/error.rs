//! Error types for HeaderCrawl

use std::path::PathBuf;
use thiserror::Error;

/// HeaderCrawl error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open build cache file {}: {source}", path.display())]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find {key} in build cache file {}", path.display())]
    SourceRootMissing { key: String, path: PathBuf },

    #[error("Failed to open source root directory {}: {source}. Check permissions.", path.display())]
    SourceRootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open source file {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("All {attempted} header copies failed")]
    AllCopiesFailed { attempted: usize },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error aborts the whole run.
    ///
    /// Unreadable sources and failed single copies are reported and skipped;
    /// everything else stops the pipeline.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::FileUnreadable { .. } | Error::CopyFailed { .. })
    }
}

/// Result type alias for HeaderCrawl
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_fatal_classification() {
        let unreadable = Error::FileUnreadable {
            path: PathBuf::from("a.c"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!unreadable.is_fatal());

        let missing = Error::SourceRootMissing {
            key: "OSSIM_DEV_HOME".into(),
            path: PathBuf::from("build/CMakeCache.txt"),
        };
        assert!(missing.is_fatal());
        assert!(Error::AllCopiesFailed { attempted: 3 }.is_fatal());
    }

    #[test]
    fn test_message_names_path() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/tmp/build/CMakeCache.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/tmp/build/CMakeCache.txt"));
    }
}
