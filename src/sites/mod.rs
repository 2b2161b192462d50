//! Site integrations.
//!
//! Every supported host implements [`AlbumSource`]: it turns an album URL
//! into a flat list of [`ImageReference`]s and, for references that point at
//! a detail page, resolves the direct download link later on demand.
//!
//! - [`ImgCredit`] - listing crawl, then one detail page per image
//! - [`Imgur`] - JSON API listing with direct links
//! - [`PutMega`] - listing crawl of thumbnails rewritten to full resolution

mod imgcredit;
mod imgur;
mod putmega;

pub use imgcredit::ImgCredit;
pub use imgur::{ApiError, DEFAULT_API_BASE, Imgur, ImgurImage, ImgurPayload, PayloadShape, decode_album_images};
pub use putmega::PutMega;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use thiserror::Error;
use url::Url;

use crate::crawl::CrawlError;
use crate::fetch::HttpClient;

/// How an [`ImageReference`] reaches the image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// The URL returns the image itself.
    Direct,
    /// The URL is a detail page that must be resolved first.
    DetailPage,
}

/// One image discovered in an album.
///
/// The output filename is derived from the direct URL once it is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    url: Url,
    kind: LinkKind,
}

impl ImageReference {
    /// A reference whose URL already serves the image.
    #[must_use]
    pub fn direct(url: Url) -> Self {
        Self {
            url,
            kind: LinkKind::Direct,
        }
    }

    /// A reference to a detail page that hides the image behind a button.
    #[must_use]
    pub fn detail_page(url: Url) -> Self {
        Self {
            url,
            kind: LinkKind::DetailPage,
        }
    }

    /// The discovered URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// How the URL reaches the image.
    #[must_use]
    pub fn kind(&self) -> LinkKind {
        self.kind
    }
}

/// Errors raised while discovering an album's images.
#[derive(Debug, Error)]
pub enum SiteError {
    /// Listing crawl failed.
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    /// API listing failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The album URL does not have the shape the site expects.
    #[error("invalid album URL '{url}': {reason}")]
    InvalidAlbumUrl {
        /// The album URL.
        url: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl SiteError {
    /// Creates an invalid album URL error.
    pub fn invalid_album_url(url: &Url, reason: impl Into<String>) -> Self {
        Self::InvalidAlbumUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// A supported image host.
///
/// Uses `async_trait` so the pipeline can hold sources as `Arc<dyn AlbumSource>`.
#[async_trait]
pub trait AlbumSource: Send + Sync {
    /// Short site name used in logs (e.g. "imgur").
    fn name(&self) -> &str;

    /// Extra headers sent on every request made for this site.
    fn request_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Directory the album's files land in, given the user's destination.
    fn destination(&self, base: &Path) -> PathBuf {
        base.to_path_buf()
    }

    /// Discovers every image of the album at `album`, in listing order.
    async fn discover(
        &self,
        client: &HttpClient,
        album: &Url,
    ) -> Result<Vec<ImageReference>, SiteError>;

    /// Returns the URL serving the bytes of `image`.
    ///
    /// Direct references resolve to themselves; sites with detail pages override this.
    async fn direct_link(
        &self,
        _client: &HttpClient,
        image: &ImageReference,
    ) -> Result<Url, CrawlError> {
        Ok(image.url().clone())
    }
}
