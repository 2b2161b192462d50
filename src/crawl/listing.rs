//! Paginated listing crawl.
//!
//! A listing page yields the link attribute of every element matching the
//! item selector, plus at most one next-page link. The crawler walks next
//! links one page at a time, appending each page's items after the previous
//! page's, until a page without a usable next link is reached.

use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use super::CrawlError;
use crate::fetch::HttpClient;

/// Upper bound on listing pages followed in one crawl.
pub const DEFAULT_MAX_PAGES: usize = 500;

const NEXT_LINK_ATTR: &str = "href";

/// Parses a CSS selector, mapping parser errors to [`CrawlError::InvalidSelector`].
pub(crate) fn parse_selector(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| CrawlError::invalid_selector(selector, e.to_string()))
}

/// Resolves a possibly relative link attribute against the page it was found on.
pub(crate) fn join_link(page: &Url, raw: &str) -> Result<Url, CrawlError> {
    page.join(raw.trim())
        .map_err(|_| CrawlError::invalid_link(page.as_str(), raw))
}

/// Site-specific markers locating items and the next-page link on a listing page.
#[derive(Debug, Clone)]
pub struct ListingMarkers {
    item: Selector,
    item_attr: String,
    next: Selector,
}

impl ListingMarkers {
    /// Builds markers from CSS selectors.
    ///
    /// `item_attr` names the attribute carrying each item's link (`href` for
    /// anchors, `src` for thumbnails). The next-page element must carry `href`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidSelector`] when either selector does not parse.
    pub fn new(item: &str, item_attr: &str, next: &str) -> Result<Self, CrawlError> {
        Ok(Self {
            item: parse_selector(item)?,
            item_attr: item_attr.to_string(),
            next: parse_selector(next)?,
        })
    }
}

/// Whether a listing page continues the album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    /// The page advertises a next page at this URL.
    HasNextPage(Url),
    /// Terminal page: no next marker, or a marker without a usable link.
    NoNextPage,
}

/// Links and pagination state extracted from one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Item links in document order.
    pub links: Vec<Url>,
    /// Pagination state.
    pub state: PageState,
}

/// Extracts item links and the next-page state from a listing page body.
///
/// Items without the link attribute, or with an empty one, are skipped.
///
/// # Errors
///
/// Returns [`CrawlError::InvalidLink`] when a link cannot be resolved against `page_url`.
pub fn parse_listing_page(
    html: &str,
    page_url: &Url,
    markers: &ListingMarkers,
) -> Result<ListingPage, CrawlError> {
    let document = Html::parse_document(html);

    let links = document
        .select(&markers.item)
        .filter_map(|element| element.value().attr(&markers.item_attr))
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| join_link(page_url, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let next_link = document
        .select(&markers.next)
        .next()
        .and_then(|element| element.value().attr(NEXT_LINK_ATTR))
        .map(str::trim)
        .filter(|raw| !raw.is_empty() && !raw.starts_with('#'));

    let state = match next_link {
        Some(raw) => PageState::HasNextPage(join_link(page_url, raw)?),
        None => PageState::NoNextPage,
    };

    Ok(ListingPage { links, state })
}

/// Sequential crawler over a paginated album listing.
#[derive(Debug, Clone)]
pub struct AlbumCrawler {
    markers: ListingMarkers,
    max_pages: usize,
}

impl AlbumCrawler {
    /// Creates a crawler using `markers` and the default page cap.
    #[must_use]
    pub fn new(markers: ListingMarkers) -> Self {
        Self {
            markers,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Overrides the maximum number of pages followed.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Crawls from `start` until a terminal page, returning every item link in page order.
    ///
    /// # Errors
    ///
    /// Any fetch or link error aborts the crawl; no partial list is returned.
    /// A next link back to a visited page yields [`CrawlError::PaginationCycle`]
    /// and exceeding the page cap yields [`CrawlError::TooManyPages`].
    #[instrument(skip(self, client), fields(start = %start))]
    pub async fn crawl(&self, client: &HttpClient, start: &Url) -> Result<Vec<Url>, CrawlError> {
        let mut links = Vec::new();
        let mut visited = HashSet::new();
        let mut current = start.clone();

        loop {
            if visited.len() >= self.max_pages {
                return Err(CrawlError::TooManyPages {
                    limit: self.max_pages,
                });
            }
            visited.insert(page_key(&current));

            let body = client.get_text(&current).await?;
            let page = parse_listing_page(&body, &current, &self.markers)?;
            debug!(
                page = visited.len(),
                url = %current,
                items = page.links.len(),
                "parsed listing page"
            );
            links.extend(page.links);

            match page.state {
                PageState::NoNextPage => break,
                PageState::HasNextPage(next) => {
                    if visited.contains(&page_key(&next)) {
                        return Err(CrawlError::pagination_cycle(next.as_str()));
                    }
                    current = next;
                }
            }
        }

        info!(pages = visited.len(), links = links.len(), "album crawl complete");
        Ok(links)
    }
}

fn page_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}
