use thiserror::Error;

use crate::fetch::FetchError;
use crate::source::SourceError;
use crate::store::StoreError;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the image-saver library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetching image bytes failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Content store failure
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The image source returned nothing usable
    #[error("Image source error: {0}")]
    Source(#[from] SourceError),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}
