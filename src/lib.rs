//! albumdl Core Library
//!
//! Downloads every image of an album from a supported image host into a
//! local directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`folder`] - Destination directory preparation
//! - [`fetch`] - Shared HTTP client with browser identity headers
//! - [`filename`] - Filenames and full-resolution rewrites from image URLs
//! - [`crawl`] - Paginated listing crawl and detail page resolution
//! - [`sites`] - Per-host album discovery
//! - [`download`] - Concurrent batch downloads
//! - [`pipeline`] - One album run under a single deadline

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crawl;
pub mod download;
pub mod fetch;
pub mod filename;
pub mod folder;
pub mod pipeline;
pub mod sites;
pub mod user_agent;

// Re-export commonly used types
pub use download::{BatchDownloader, Concurrency, DownloadError, DownloadStats};
pub use fetch::{FetchError, HttpClient};
pub use folder::{FolderError, resolve_folder};
pub use pipeline::{AlbumError, AlbumJob, AlbumSummary, run_album};
pub use sites::{AlbumSource, ImageReference, ImgCredit, Imgur, LinkKind, PutMega, SiteError};
