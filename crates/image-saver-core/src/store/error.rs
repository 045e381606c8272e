use std::path::PathBuf;
use thiserror::Error;

/// Result type for content store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Content store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store directory cannot be created or accessed
    #[error("store directory {} is unavailable: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store path exists but is not a directory
    #[error("store path {} is occupied by a non-directory", .0.display())]
    NotADirectory(PathBuf),

    /// The target file name already holds different content
    #[error("{} already exists with different content", .0.display())]
    NameCollision(PathBuf),

    /// A stored file could not be read, so its content cannot be compared
    #[error("cannot read stored image {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or publishing an artifact failed
    #[error("write to {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Whether the store itself cannot be used, as opposed to a single write failing
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::NotADirectory(_))
    }
}
