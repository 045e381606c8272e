//! Content digests for fetched image bytes.
//!
//! A [`ContentDigest`] is the identity of an image in the store: two images are the
//! same content exactly when their digests are equal. Both supported algorithms
//! produce 256-bit digests, so stored file names always carry 64 hex characters.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use std::{fmt, fs::File, io::Read, path::Path, str::FromStr};

/// File extension given to every stored artifact
pub const ARTIFACT_EXTENSION: &str = "jpg";

/// Digest algorithms supported by the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

/// Fixed-length digest of an image's bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Name under which content with this digest is committed
    pub fn artifact_file_name(&self) -> String {
        format!("{}.{}", self.to_hex(), ARTIFACT_EXTENSION)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Incremental hasher over either algorithm
enum Hasher {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> ContentDigest {
        match self {
            Self::Sha256(h) => ContentDigest(h.finalize().into()),
            Self::Blake3(h) => ContentDigest(*h.finalize().as_bytes()),
        }
    }
}

/// Compute the digest of a byte slice
pub fn digest(algorithm: HashAlgorithm, bytes: &[u8]) -> ContentDigest {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(bytes);
    hasher.finalize()
}

/// Compute the digest of a file's contents, reading it in chunks
pub fn digest_file<P: AsRef<Path>>(path: P, algorithm: HashAlgorithm) -> std::io::Result<ContentDigest> {
    // Open the file with explicit scope to ensure it's closed promptly
    let digest = {
        let mut file = File::open(&path)?;
        let mut hasher = Hasher::new(algorithm);

        let mut buffer = [0; 8192]; // 8KB buffer
        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        hasher.finalize()
    };

    Ok(digest)
}
