//! Concurrent image downloads into a destination directory.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use albumdl_core::download::{BatchDownloader, Concurrency, DownloadStats};
//! use albumdl_core::fetch::HttpClient;
//! use albumdl_core::sites::{AlbumSource, Imgur};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source: Arc<dyn AlbumSource> = Arc::new(Imgur::new("client-id")?);
//! let client = HttpClient::with_headers(source.request_headers())?;
//! let images = source
//!     .discover(&client, &Url::parse("https://imgur.com/a/B88tSQQ")?)
//!     .await?;
//! let stats = DownloadStats::new();
//! BatchDownloader::new(client, Concurrency::Unbounded)
//!     .download_all(source, images, Path::new("./cats"), &stats)
//!     .await?;
//! println!("{} written, {} skipped", stats.completed(), stats.failed());
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;

pub use engine::{BatchDownloader, Concurrency, DownloadStats};
pub use error::DownloadError;
