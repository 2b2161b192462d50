//! HTTP client wrapper shared by every site integration.
//!
//! All requests go out with the browser identity from [`crate::user_agent`];
//! sites that need more (an API `Authorization` header) layer extra default
//! headers on top when the client is built.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use tracing::{debug, instrument};
use url::Url;

use super::FetchError;
use crate::user_agent::{BROWSER_ACCEPT, BROWSER_USER_AGENT};

/// HTTP connect timeout. The overall deadline is enforced per album run.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for listing pages, API calls and image bodies.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client that sends only the browser identity headers.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_headers(HeaderMap::new())
    }

    /// Creates a client that additionally sends `extra` on every request.
    ///
    /// Entries in `extra` replace the built-in `Accept` header when they collide.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying client cannot be built.
    pub fn with_headers(extra: HeaderMap) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.extend(extra);

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(FetchError::client)?;
        Ok(Self { client })
    }

    /// Sends a GET request and returns the response once its status is a success.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failures and non-2xx statuses.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn send(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self.execute(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }

    async fn execute(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))?;
        debug!(status = response.status().as_u16(), "response received");
        Ok(response)
    }

    /// Fetches `url` and returns the body decoded as text.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), plus [`FetchError::Body`] when the body cannot be read.
    pub async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        self.send(url)
            .await?
            .text()
            .await
            .map_err(|e| FetchError::body(url.as_str(), e))
    }

    /// Fetches `url` and returns the status with the raw body, whatever the status.
    ///
    /// For APIs that explain a rejection in the response body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failures or when the body cannot be read.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn get_bytes_any_status(&self, url: &Url) -> Result<(u16, Vec<u8>), FetchError> {
        let response = self.execute(url).await?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::body(url.as_str(), e))?;
        // No copy when the buffer is uniquely owned.
        Ok((status, Vec::from(bytes)))
    }
}
