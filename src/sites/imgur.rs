//! imgur: album listing through the v3 JSON API.
//!
//! The images endpoint has answered with two different envelopes over time:
//! an album object with nested `data.images`, and a bare `data` array of
//! images. Both are tried in a fixed order and the first one that yields a
//! non-empty image list wins.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{AlbumSource, ImageReference, SiteError};
use crate::fetch::{FetchError, HttpClient};

/// Public imgur API root.
pub const DEFAULT_API_BASE: &str = "https://api.imgur.com";

/// Payload excerpt length kept in decode errors.
const EXCERPT_CHARS: usize = 200;

/// Errors raised by the imgur API integration.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The client id cannot be sent as an HTTP header.
    #[error("imgur client id contains characters not allowed in an HTTP header")]
    InvalidClientId,

    /// The API base URL is unusable.
    #[error("invalid imgur API base '{base}'")]
    InvalidApiBase {
        /// The configured base.
        base: String,
    },

    /// No known payload shape produced any image.
    #[error(
        "imgur payload matched no known shape{}: {excerpt}",
        .status.map(|s| format!(" (API status {s})")).unwrap_or_default()
    )]
    UnrecognizedPayload {
        /// `status` field of the payload, when it has one.
        status: Option<u16>,
        /// Leading part of the payload.
        excerpt: String,
    },

    /// The API answered with a non-2xx status.
    #[error("imgur API rejected the request with HTTP {status}: {excerpt}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body.
        excerpt: String,
    },

    /// Images were listed but none had a parseable link.
    #[error("imgur album listed {listed} images but none had a usable link")]
    NoUsableLinks {
        /// Number of images in the payload.
        listed: usize,
    },
}

/// Leading [`EXCERPT_CHARS`] characters of a response body.
fn excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(EXCERPT_CHARS)
        .collect()
}

/// One image entry of an API response. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImgurImage {
    /// imgur image id.
    #[serde(default)]
    pub id: String,
    /// Direct link to the image bytes.
    pub link: String,
}

/// Album object envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumEnvelope {
    data: AlbumData,
}

#[derive(Debug, Clone, Deserialize)]
struct AlbumData {
    images: Vec<ImgurImage>,
}

/// Flat image array envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageListEnvelope {
    data: Vec<ImgurImage>,
}

#[derive(Deserialize)]
struct StatusProbe {
    status: Option<u16>,
}

/// The response envelopes the images endpoint is known to return.
#[derive(Debug, Clone)]
pub enum ImgurPayload {
    /// `{"data": {"images": [...]}, ...}`
    Album(AlbumEnvelope),
    /// `{"data": [...], ...}`
    ImageList(ImageListEnvelope),
}

impl ImgurPayload {
    /// Consumes the payload, returning its images.
    #[must_use]
    pub fn into_images(self) -> Vec<ImgurImage> {
        match self {
            Self::Album(envelope) => envelope.data.images,
            Self::ImageList(envelope) => envelope.data,
        }
    }
}

/// A decode attempt for one payload envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Album object with nested images.
    Album,
    /// Flat image array.
    ImageList,
}

impl PayloadShape {
    /// Decode attempts, in the order they are tried.
    pub const ORDER: [Self; 2] = [Self::Album, Self::ImageList];

    /// Decodes `body` as this shape.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `body` does not have this shape.
    pub fn decode(self, body: &[u8]) -> Result<ImgurPayload, serde_json::Error> {
        match self {
            Self::Album => serde_json::from_slice(body).map(ImgurPayload::Album),
            Self::ImageList => serde_json::from_slice(body).map(ImgurPayload::ImageList),
        }
    }
}

/// Decodes an images-endpoint response into its image list.
///
/// # Errors
///
/// Returns [`ApiError::UnrecognizedPayload`] when no shape in
/// [`PayloadShape::ORDER`] decodes to a non-empty list.
pub fn decode_album_images(body: &[u8]) -> Result<Vec<ImgurImage>, ApiError> {
    for shape in PayloadShape::ORDER {
        match shape.decode(body) {
            Ok(payload) => {
                let images = payload.into_images();
                if images.is_empty() {
                    debug!(?shape, "payload shape decoded without images");
                    continue;
                }
                debug!(?shape, images = images.len(), "decoded imgur payload");
                return Ok(images);
            }
            Err(error) => debug!(?shape, error = %error, "payload shape did not match"),
        }
    }

    let status = serde_json::from_slice::<StatusProbe>(body)
        .ok()
        .and_then(|probe| probe.status);
    Err(ApiError::UnrecognizedPayload {
        status,
        excerpt: excerpt(body),
    })
}

/// imgur album integration.
#[derive(Debug, Clone)]
pub struct Imgur {
    authorization: HeaderValue,
    api_base: Url,
}

impl Imgur {
    /// Creates the integration for an imgur developer `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidClientId`] if the id cannot be used as a header value.
    pub fn new(client_id: &str) -> Result<Self, ApiError> {
        let mut authorization = HeaderValue::from_str(&format!("Client-ID {}", client_id.trim()))
            .map_err(|_| ApiError::InvalidClientId)?;
        authorization.set_sensitive(true);
        let api_base = Url::parse(DEFAULT_API_BASE).map_err(|_| ApiError::InvalidApiBase {
            base: DEFAULT_API_BASE.to_string(),
        })?;
        Ok(Self {
            authorization,
            api_base,
        })
    }

    /// Points API calls at `base` instead of the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidApiBase`] for URLs that cannot carry a path.
    pub fn with_api_base(mut self, base: &Url) -> Result<Self, ApiError> {
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidApiBase {
                base: base.to_string(),
            });
        }
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        self.api_base = base;
        Ok(self)
    }

    /// Album hash: the last non-empty path segment of the album URL.
    #[must_use]
    pub fn album_hash(album: &Url) -> Option<String> {
        album
            .path_segments()?
            .rev()
            .find(|segment| !segment.is_empty())
            .map(str::to_string)
    }

    fn images_endpoint(&self, hash: &str) -> Result<Url, ApiError> {
        self.api_base
            .join(&format!("3/album/{hash}/images"))
            .map_err(|_| ApiError::InvalidApiBase {
                base: self.api_base.to_string(),
            })
    }
}

#[async_trait]
impl AlbumSource for Imgur {
    fn name(&self) -> &'static str {
        "imgur"
    }

    fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.authorization.clone());
        headers
    }

    #[instrument(skip(self, client), fields(site = "imgur", album = %album))]
    async fn discover(
        &self,
        client: &HttpClient,
        album: &Url,
    ) -> Result<Vec<ImageReference>, SiteError> {
        let hash = Self::album_hash(album)
            .ok_or_else(|| SiteError::invalid_album_url(album, "no album hash in path"))?;
        info!(hash = %hash, "imgur album hash");

        let endpoint = self.images_endpoint(&hash)?;
        let (status, body) = client
            .get_bytes_any_status(&endpoint)
            .await
            .map_err(ApiError::from)?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Rejected {
                status,
                excerpt: excerpt(&body),
            }
            .into());
        }
        let images = decode_album_images(&body)?;

        let listed = images.len();
        let references: Vec<ImageReference> = images
            .into_iter()
            .filter_map(|image| match Url::parse(&image.link) {
                Ok(url) => Some(ImageReference::direct(url)),
                Err(error) => {
                    warn!(id = %image.id, link = %image.link, error = %error, "skipping image with unusable link");
                    None
                }
            })
            .collect();
        if references.is_empty() {
            return Err(ApiError::NoUsableLinks { listed }.into());
        }
        Ok(references)
    }
}
