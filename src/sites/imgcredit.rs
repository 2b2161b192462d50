//! imgcredit.xyz: paginated listing of detail pages, each hiding one download button.

use async_trait::async_trait;
use tracing::instrument;
use url::Url;

use super::{AlbumSource, ImageReference, LinkKind, SiteError};
use crate::crawl::{AlbumCrawler, CrawlError, DetailResolver, ListingMarkers};
use crate::fetch::HttpClient;

const ITEM_SELECTOR: &str = ".image-container";
const NEXT_PAGE_SELECTOR: &str = ".pagination-next > a";
const DOWNLOAD_BUTTON_SELECTOR: &str = ".btn.btn-download.default";
const LISTING_QUERY: &str = "sort=title_asc&page=1";

/// imgcredit album integration.
#[derive(Debug, Clone)]
pub struct ImgCredit {
    crawler: AlbumCrawler,
    detail: DetailResolver,
}

impl ImgCredit {
    /// Creates the integration with the site's current page markers.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidSelector`] if a built-in selector fails to parse.
    pub fn new() -> Result<Self, CrawlError> {
        let markers = ListingMarkers::new(ITEM_SELECTOR, "href", NEXT_PAGE_SELECTOR)?;
        Ok(Self {
            crawler: AlbumCrawler::new(markers),
            detail: DetailResolver::new(DOWNLOAD_BUTTON_SELECTOR, "href")?,
        })
    }

    /// First listing page of `album`, sorted by title.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::InvalidAlbumUrl`] for URLs that cannot carry a path.
    pub fn listing_start_url(album: &Url) -> Result<Url, SiteError> {
        if album.cannot_be_a_base() {
            return Err(SiteError::invalid_album_url(album, "URL has no path"));
        }
        let mut start = album.clone();
        start.set_fragment(None);
        let path = format!("{}/", album.path().trim_end_matches('/'));
        start.set_path(&path);
        start.set_query(Some(LISTING_QUERY));
        Ok(start)
    }
}

#[async_trait]
impl AlbumSource for ImgCredit {
    fn name(&self) -> &'static str {
        "imgcredit"
    }

    #[instrument(skip(self, client), fields(site = "imgcredit", album = %album))]
    async fn discover(
        &self,
        client: &HttpClient,
        album: &Url,
    ) -> Result<Vec<ImageReference>, SiteError> {
        let start = Self::listing_start_url(album)?;
        let links = self.crawler.crawl(client, &start).await?;
        Ok(links.into_iter().map(ImageReference::detail_page).collect())
    }

    async fn direct_link(
        &self,
        client: &HttpClient,
        image: &ImageReference,
    ) -> Result<Url, CrawlError> {
        match image.kind() {
            LinkKind::Direct => Ok(image.url().clone()),
            LinkKind::DetailPage => self.detail.resolve(client, image.url()).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_start_url_appends_sort_and_page() {
        let album = Url::parse("https://imgcredit.xyz/album/AbCd").unwrap();
        let start = ImgCredit::listing_start_url(&album).unwrap();
        assert_eq!(
            start.as_str(),
            "https://imgcredit.xyz/album/AbCd/?sort=title_asc&page=1"
        );
    }

    #[test]
    fn test_listing_start_url_trims_trailing_slash_and_query() {
        let album = Url::parse("https://imgcredit.xyz/album/AbCd/?page=4#top").unwrap();
        let start = ImgCredit::listing_start_url(&album).unwrap();
        assert_eq!(
            start.as_str(),
            "https://imgcredit.xyz/album/AbCd/?sort=title_asc&page=1"
        );
    }

    #[test]
    fn test_builtin_selectors_parse() {
        let site = ImgCredit::new().unwrap();
        assert_eq!(site.name(), "imgcredit");
    }
}
