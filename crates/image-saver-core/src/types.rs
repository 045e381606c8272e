use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::fetch::FetchError;
use crate::hashing::ContentDigest;
use crate::source::SourceError;
use crate::store::StoreError;

/// A candidate image as listed by the image source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Opaque identifier assigned by the source
    pub id: String,

    /// Location of the image bytes
    pub url: String,
}

impl ImageRecord {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Image bytes exactly as transmitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage(Vec<u8>);

impl RawImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// A file committed to the content store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Full path to the stored file
    pub path: PathBuf,

    /// Digest of the file contents
    pub digest: ContentDigest,

    /// File size in bytes
    pub size: u64,
}

impl StoredArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether the file name is the one derived from its content digest
    pub fn is_canonical(&self) -> bool {
        self.file_name() == self.digest.artifact_file_name()
    }
}

/// Final result of one save attempt
#[derive(Debug)]
pub enum Outcome {
    /// The image was new and has been committed
    Saved(StoredArtifact),

    /// Identical content is already stored
    Duplicate { existing: PathBuf },

    /// The image bytes could not be obtained
    FetchError(FetchError),

    /// The store could not accept the image
    StorageError(StoreError),

    /// The image source listed no images
    EmptySource,

    /// The image source could not be queried
    SourceError(SourceError),
}

impl Outcome {
    /// Saved and Duplicate are both successful terminal states
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved(_) | Self::Duplicate { .. })
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Saved(_) | Self::Duplicate { .. } => 0,
            Self::FetchError(_) => 1,
            Self::StorageError(_) => 2,
            Self::EmptySource | Self::SourceError(_) => 3,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(artifact) => write!(f, "Saved image: {}", artifact.file_name()),
            Self::Duplicate { existing } => write!(
                f,
                "Image already stored as {}, nothing to do",
                display_name(existing)
            ),
            Self::FetchError(e) => write!(f, "Error fetching image: {}", e),
            Self::StorageError(e) => write!(f, "Error storing image: {}", e),
            Self::EmptySource => write!(f, "No images found in response"),
            Self::SourceError(e) => write!(f, "Error requesting images: {}", e),
        }
    }
}
