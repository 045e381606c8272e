//! Directory-backed content store.
//!
//! Every stored image lives directly in one flat directory under the name
//! `<hex digest>.jpg`. Duplicate detection is decided by hashing the *contents* of
//! the stored files, never by their names alone, so files placed under some other
//! naming scheme are still recognised as duplicates.
//!
//! Commits are atomic: bytes are written to an `.incoming-*.part` file in the
//! store directory, flushed to disk and then published under the final name with a
//! rename that refuses to replace an existing file. Readers never observe a partial
//! artifact, and a failed write leaves nothing behind.
mod error;

pub use error::{StoreError, StoreResult};

use log::{debug, info, warn};
use rayon::prelude::*;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use walkdir::{DirEntry, WalkDir};

use crate::hashing::{digest_file, ContentDigest, HashAlgorithm};
use crate::logging::{log_digest_error, log_store_change, log_store_io_error};
use crate::types::StoredArtifact;

/// In-flight temporary files are named `.incoming-*.part` and are never treated as artifacts
const TEMP_PREFIX: &str = ".incoming-";
const TEMP_SUFFIX: &str = ".part";

/// Result of a commit that did not fail
#[derive(Debug)]
pub enum CommitOutcome {
    /// The bytes were new and now live at the artifact's path
    Committed(StoredArtifact),

    /// Identical content was already stored; nothing was written
    Duplicate { existing: PathBuf },
}

/// Storage seam used by the save workflow
pub trait ArtifactStore {
    /// Make sure the backing storage exists
    fn ensure_ready(&self) -> StoreResult<()>;

    /// Store `bytes` under `digest` unless identical content is already present
    fn commit(&self, digest: &ContentDigest, bytes: &[u8]) -> StoreResult<CommitOutcome>;
}

/// Flat directory of images keyed by content digest
pub struct ContentStore {
    root: PathBuf,
    algorithm: HashAlgorithm,
    commit_lock: Mutex<()>,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>, algorithm: HashAlgorithm) -> Self {
        Self {
            root: root.into(),
            algorithm,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Path at which content with `digest` is committed
    pub fn artifact_path(&self, digest: &ContentDigest) -> PathBuf {
        self.root.join(digest.artifact_file_name())
    }

    /// Create the store directory if it does not exist yet
    pub fn ensure_ready(&self) -> StoreResult<()> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => return Err(StoreError::NotADirectory(self.root.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Unavailable {
                    path: self.root.clone(),
                    source,
                })
            }
        }

        fs::create_dir_all(&self.root).map_err(|source| {
            log_store_io_error(&self.root, "create_dir", &source);
            StoreError::Unavailable {
                path: self.root.clone(),
                source,
            }
        })?;
        log_store_change("create_dir", &self.root, None);
        Ok(())
    }

    /// Whether any stored file holds content with this digest
    pub fn exists_by_digest(&self, digest: &ContentDigest) -> StoreResult<bool> {
        Ok(self.find_by_digest(digest)?.is_some())
    }

    /// Locate a stored file whose contents hash to `digest`.
    ///
    /// The digest-derived name is checked first, but only counts once its contents
    /// have been hashed. Otherwise every stored file is hashed in parallel. Any stored
    /// file that cannot be read fails the lookup with `StoreError::Unreadable`.
    pub fn find_by_digest(&self, digest: &ContentDigest) -> StoreResult<Option<PathBuf>> {
        let candidate = self.artifact_path(digest);
        if candidate.symlink_metadata().is_ok() {
            if self.holds(&candidate, digest)? {
                return Ok(Some(candidate));
            }
            warn!(
                "{} does not hold the content its name claims",
                candidate.display()
            );
        }

        let paths = self.artifact_paths()?;
        debug!("Scanning {} stored images for {}", paths.len(), digest);

        paths
            .par_iter()
            .filter(|path| **path != candidate)
            .find_map_any(|path| match self.holds(path, digest) {
                Ok(true) => Some(Ok(path.clone())),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            })
            .transpose()
    }

    /// List every stored file together with its content digest
    pub fn artifacts(&self) -> StoreResult<Vec<StoredArtifact>> {
        let algorithm = self.algorithm;
        let artifacts = self
            .artifact_paths()?
            .into_par_iter()
            .filter_map(|path| {
                let size = match fs::metadata(&path) {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        log_store_io_error(&path, "metadata", &e);
                        return None;
                    }
                };
                match digest_file(&path, algorithm) {
                    Ok(digest) => Some(StoredArtifact { path, digest, size }),
                    Err(e) => {
                        log_digest_error(&path, &e);
                        None
                    }
                }
            })
            .collect();

        Ok(artifacts)
    }

    /// Commit `bytes` unless identical content is already stored
    pub fn commit(&self, digest: &ContentDigest, bytes: &[u8]) -> StoreResult<CommitOutcome> {
        self.commit_with(digest, |file| file.write_all(bytes))
    }

    /// Commit whatever `write` puts into the temporary file.
    ///
    /// The content scan and the publish happen under one lock so two saves of the
    /// same content in this process cannot both conclude it is new.
    fn commit_with<F>(&self, digest: &ContentDigest, write: F) -> StoreResult<CommitOutcome>
    where
        F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
    {
        let _guard = self
            .commit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = self.find_by_digest(digest)? {
            info!("{} is already stored at {}", digest, existing.display());
            return Ok(CommitOutcome::Duplicate { existing });
        }

        let target = self.artifact_path(digest);
        if target.symlink_metadata().is_ok() {
            return Err(StoreError::NameCollision(target));
        }

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.root)
            .map_err(|source| {
                log_store_io_error(&self.root, "create_temp", &source);
                StoreError::Write {
                    path: target.clone(),
                    source,
                }
            })?;

        // Dropping `temp` on any early return removes the partial file
        if let Err(source) = write(&mut temp).and_then(|()| temp.as_file().sync_all()) {
            log_store_io_error(temp.path(), "write", &source);
            return Err(StoreError::Write {
                path: target,
                source,
            });
        }

        let file = match temp.persist_noclobber(&target) {
            Ok(file) => file,
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                // Another process published this name between our scan and rename
                return self.resolve_lost_race(digest, target);
            }
            Err(e) => {
                log_store_io_error(&target, "publish", &e.error);
                return Err(StoreError::Write {
                    path: target,
                    source: e.error,
                });
            }
        };

        let size = file
            .metadata()
            .map_err(|source| StoreError::Write {
                path: target.clone(),
                source,
            })?
            .len();
        drop(file);

        sync_dir(&self.root);
        make_read_only(&target);
        log_store_change("commit", &target, Some(&format!("{} bytes", size)));

        Ok(CommitOutcome::Committed(StoredArtifact {
            path: target,
            digest: *digest,
            size,
        }))
    }

    fn resolve_lost_race(
        &self,
        digest: &ContentDigest,
        target: PathBuf,
    ) -> StoreResult<CommitOutcome> {
        if self.holds(&target, digest)? {
            Ok(CommitOutcome::Duplicate { existing: target })
        } else {
            Err(StoreError::NameCollision(target))
        }
    }

    /// Whether the file at `path` holds content with `digest`.
    ///
    /// A file removed since it was listed holds nothing. Other read failures are errors.
    fn holds(&self, path: &Path, digest: &ContentDigest) -> StoreResult<bool> {
        match digest_file(path, self.algorithm) {
            Ok(found) => Ok(found == *digest),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => {
                log_digest_error(path, &source);
                Err(StoreError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Paths of all committed files, skipping in-flight temporaries
    fn artifact_paths(&self) -> StoreResult<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(StoreError::Unavailable {
                        path: self.root.clone(),
                        source: e.into(),
                    })
                }
                Err(e) => {
                    warn!("Skipping unreadable store entry: {}", e);
                    continue;
                }
            };

            if is_stored_file(&entry) && !is_in_flight(entry.file_name()) {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        Ok(paths)
    }
}

impl ArtifactStore for ContentStore {
    fn ensure_ready(&self) -> StoreResult<()> {
        ContentStore::ensure_ready(self)
    }

    fn commit(&self, digest: &ContentDigest, bytes: &[u8]) -> StoreResult<CommitOutcome> {
        ContentStore::commit(self, digest, bytes)
    }
}

/// Regular files, and symlinks unless they lead to a directory or nowhere.
/// Links that cannot be resolved otherwise are kept so the scan reports them.
fn is_stored_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    if !file_type.is_symlink() {
        return false;
    }
    match fs::metadata(entry.path()) {
        Ok(meta) => meta.is_file(),
        Err(e) => e.kind() != io::ErrorKind::NotFound,
    }
}

fn is_in_flight(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    {
        if let Ok(handle) = fs::File::open(dir) {
            let _ = handle.sync_all();
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}

fn make_read_only(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o444));
    }
    #[cfg(not(unix))]
    let _ = path;
}
