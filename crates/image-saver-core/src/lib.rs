//! Core functionality for saving remote images into a content-addressed store.
//!
//! This library provides the components of the save pipeline:
//! - Querying an image source for candidate images
//! - Fetching raw image bytes
//! - Content hashing
//! - A flat directory store that never holds the same content twice

// -- External Dependencies --
use log::info;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod config;
pub mod fetch;
pub mod hashing;
pub mod logging;
pub mod source;
pub mod store;
pub mod types;
pub mod workflow;

use fetch::HttpFetcher;
use source::{HttpImageSource, ImageSource};
use store::ContentStore;
use workflow::SaveWorkflow;

/// Main entry point wiring the configured collaborators together
pub struct ImageSaver {
    source: HttpImageSource,
    workflow: SaveWorkflow<HttpFetcher, ContentStore>,
}

impl ImageSaver {
    /// Create a new ImageSaver with the provided configuration
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let client = fetch::build_client(config.fetch_timeout())
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let source = HttpImageSource::new(client.clone(), config.source_url.clone());
        let store = ContentStore::new(config.store_dir.clone(), config.hash_algorithm);
        let workflow = SaveWorkflow::new(HttpFetcher::new(client), store, config.hash_algorithm);

        Ok(Self { source, workflow })
    }

    pub fn store(&self) -> &ContentStore {
        self.workflow.store()
    }

    /// Query the image source and save the first image it lists
    pub fn run(&self) -> Outcome {
        if let Err(e) = self.store().ensure_ready() {
            return Outcome::StorageError(e);
        }

        info!("Requesting images from {}", self.source.url());
        let records = match self.source.images() {
            Ok(records) => records,
            Err(source::SourceError::Empty) => return Outcome::EmptySource,
            Err(e) => return Outcome::SourceError(e),
        };

        self.workflow.save_first(&records)
    }

    /// Save one caller-chosen image
    pub fn save(&self, record: &ImageRecord) -> Outcome {
        if let Err(e) = self.store().ensure_ready() {
            return Outcome::StorageError(e);
        }

        self.workflow.save(record)
    }
}
