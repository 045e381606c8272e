use log::{error, info, warn};

use crate::fetch::{FetchError, ImageFetcher};
use crate::hashing::{self, HashAlgorithm};
use crate::store::{ArtifactStore, CommitOutcome};
use crate::types::{ImageRecord, Outcome};

/// Fetch, hash and commit a single image.
///
/// Expected conditions (duplicates, fetch failures, store failures) come back as
/// [`Outcome`] values rather than errors.
pub struct SaveWorkflow<F, S> {
    fetcher: F,
    store: S,
    algorithm: HashAlgorithm,
}

impl<F: ImageFetcher, S: ArtifactStore> SaveWorkflow<F, S> {
    pub fn new(fetcher: F, store: S, algorithm: HashAlgorithm) -> Self {
        Self {
            fetcher,
            store,
            algorithm,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save the first of `records`, the way the image source is normally consumed
    pub fn save_first(&self, records: &[ImageRecord]) -> Outcome {
        match records.first() {
            Some(record) => self.save(record),
            None => {
                warn!("Image source returned no records");
                Outcome::EmptySource
            }
        }
    }

    /// Run the pipeline for one record
    pub fn save(&self, record: &ImageRecord) -> Outcome {
        if record.url.trim().is_empty() {
            warn!("Record {} has no URL", record.id);
            return Outcome::FetchError(FetchError::InvalidUrl(record.url.clone()));
        }

        let image = match self.fetcher.fetch(&record.url) {
            Ok(image) => image,
            Err(e) => {
                error!("Failed to fetch image {}: {}", record.id, e);
                return Outcome::FetchError(e);
            }
        };

        // Never hash or store an empty artifact
        if image.is_empty() {
            return Outcome::FetchError(FetchError::EmptyBody {
                url: record.url.clone(),
            });
        }

        let digest = hashing::digest(self.algorithm, image.as_bytes());

        match self.store.commit(&digest, image.as_bytes()) {
            Ok(CommitOutcome::Committed(artifact)) => {
                info!("Saved image {} as {}", record.id, artifact.path.display());
                Outcome::Saved(artifact)
            }
            Ok(CommitOutcome::Duplicate { existing }) => {
                info!(
                    "Image {} duplicates {}, skipping",
                    record.id,
                    existing.display()
                );
                Outcome::Duplicate { existing }
            }
            Err(e) => {
                error!("Failed to store image {}: {}", record.id, e);
                Outcome::StorageError(e)
            }
        }
    }
}
