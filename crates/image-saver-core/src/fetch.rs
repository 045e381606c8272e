//! Retrieval of raw image bytes.
use log::{debug, error};
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

use crate::types::RawImage;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("image-saver/", env!("CARGO_PKG_VERSION"));

/// Reasons a fetch can fail
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid image URL: {0:?}")]
    InvalidUrl(String),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned an empty body")]
    EmptyBody { url: String },
}

/// Something that can turn a URL into image bytes
pub trait ImageFetcher {
    /// Fetch the bytes behind `url` in a single attempt
    fn fetch(&self, url: &str) -> Result<RawImage, FetchError>;
}

/// Build the HTTP client shared by the fetcher and the image source
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Fetches images over HTTP(S)
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetcher with its own client bounded by `timeout`
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self::new(build_client(timeout)?))
    }
}

fn transport_error(url: &str, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source,
        }
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<RawImage, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }
        let parsed =
            reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        debug!("Fetching image from {}", url);
        let response = self
            .client
            .get(parsed)
            .send()
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            error!("Image request to {} returned {}", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| transport_error(url, e))?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(RawImage::new(bytes.to_vec()))
    }
}
