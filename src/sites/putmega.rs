//! putmega: listing thumbnails whose filenames encode the full-size variant.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::{debug, instrument};
use url::Url;

use super::{AlbumSource, ImageReference, SiteError};
use crate::crawl::{AlbumCrawler, CrawlError, ListingMarkers};
use crate::fetch::HttpClient;
use crate::filename::full_resolution_url;
use crate::folder::dated_folder;

const THUMBNAIL_SELECTOR: &str =
    "#content-listing-tabs .list-item-image.fixed-size a.image-container img";
const NEXT_PAGE_SELECTOR: &str = ".pagination-next > a";

/// putmega album integration. Files land in a dated subfolder of the destination.
#[derive(Debug, Clone)]
pub struct PutMega {
    crawler: AlbumCrawler,
    date: NaiveDate,
}

impl PutMega {
    /// Creates the integration, dating the output folder with today's local date.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidSelector`] if a built-in selector fails to parse.
    pub fn new() -> Result<Self, CrawlError> {
        let markers = ListingMarkers::new(THUMBNAIL_SELECTOR, "src", NEXT_PAGE_SELECTOR)?;
        Ok(Self {
            crawler: AlbumCrawler::new(markers),
            date: Local::now().date_naive(),
        })
    }

    /// Uses `date` for the output subfolder instead of today.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}

#[async_trait]
impl AlbumSource for PutMega {
    fn name(&self) -> &'static str {
        "putmega"
    }

    fn destination(&self, base: &Path) -> PathBuf {
        dated_folder(base, self.date)
    }

    #[instrument(skip(self, client), fields(site = "putmega", album = %album))]
    async fn discover(
        &self,
        client: &HttpClient,
        album: &Url,
    ) -> Result<Vec<ImageReference>, SiteError> {
        let thumbnails = self.crawler.crawl(client, album).await?;
        Ok(thumbnails
            .iter()
            .map(|thumbnail| {
                let full = full_resolution_url(thumbnail);
                debug!(thumbnail = %thumbnail, full = %full, "rewrote thumbnail");
                ImageReference::direct(full)
            })
            .collect())
    }
}
