//! The remote listing that names candidate images.
use log::{debug, error};
use reqwest::blocking::Client;
use thiserror::Error;

use crate::types::ImageRecord;

/// Reasons the image source yields nothing usable
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("no images found in response")]
    Empty,

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Something that lists candidate images
pub trait ImageSource {
    fn images(&self) -> Result<Vec<ImageRecord>, SourceError>;
}

/// Image listing served as a JSON array of `{ "id", "url" }` objects
pub struct HttpImageSource {
    client: Client,
    url: String,
}

impl HttpImageSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ImageSource for HttpImageSource {
    fn images(&self) -> Result<Vec<ImageRecord>, SourceError> {
        let request_error = |source| SourceError::Request {
            url: self.url.clone(),
            source,
        };

        debug!("Requesting image list from {}", self.url);
        let response = self.client.get(&self.url).send().map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            error!("Image list request to {} returned {}", self.url, status);
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(request_error)?;
        let records: Vec<ImageRecord> =
            serde_json::from_str(&body).map_err(|source| SourceError::Malformed {
                url: self.url.clone(),
                source,
            })?;

        if records.is_empty() {
            return Err(SourceError::Empty);
        }

        debug!("Image source listed {} images", records.len());
        Ok(records)
    }
}
