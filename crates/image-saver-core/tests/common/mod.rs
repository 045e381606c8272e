#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use image_saver_core::fetch::{FetchError, ImageFetcher};
use image_saver_core::hashing::{ContentDigest, HashAlgorithm};
use image_saver_core::store::{ArtifactStore, CommitOutcome, ContentStore, StoreResult};
use image_saver_core::RawImage;

/// Fetcher serving canned bytes per URL; unknown URLs time out
#[derive(Default)]
pub struct FakeFetcher {
    images: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.images.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<RawImage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.images.get(url) {
            Some(bytes) => Ok(RawImage::new(bytes.clone())),
            None => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

/// Real content store that counts commit attempts
pub struct CountingStore {
    inner: ContentStore,
    commits: AtomicUsize,
}

impl CountingStore {
    pub fn new(root: &Path) -> Self {
        let inner = ContentStore::new(root, HashAlgorithm::Sha256);
        inner.ensure_ready().unwrap();
        Self {
            inner,
            commits: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &ContentStore {
        &self.inner
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl ArtifactStore for CountingStore {
    fn ensure_ready(&self) -> StoreResult<()> {
        self.inner.ensure_ready()
    }

    fn commit(&self, digest: &ContentDigest, bytes: &[u8]) -> StoreResult<CommitOutcome> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(digest, bytes)
    }
}

/// Number of entries directly inside `dir`
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
