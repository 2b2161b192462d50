//! HTML discovery: paginated listing crawls and detail page resolution.
//!
//! # Example
//!
//! ```no_run
//! use albumdl_core::crawl::{AlbumCrawler, ListingMarkers};
//! use albumdl_core::fetch::HttpClient;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let markers = ListingMarkers::new(".image-container", "href", ".pagination-next > a")?;
//! let crawler = AlbumCrawler::new(markers);
//! let client = HttpClient::new()?;
//! let links = crawler
//!     .crawl(&client, &Url::parse("https://imgcredit.xyz/album/abc/?page=1")?)
//!     .await?;
//! println!("{} items", links.len());
//! # Ok(())
//! # }
//! ```

mod detail;
mod error;
mod listing;

pub use detail::DetailResolver;
pub use error::CrawlError;
pub use listing::{
    AlbumCrawler, DEFAULT_MAX_PAGES, ListingMarkers, ListingPage, PageState, parse_listing_page,
};
