//! Error types for the batch downloader.
//!
//! Every per-image failure carries the URL (and path, for filesystem errors)
//! it happened on, so a skipped image can be logged with full context.

use std::path::PathBuf;

use thiserror::Error;

use crate::crawl::CrawlError;
use crate::fetch::FetchError;

/// Errors that can occur while downloading a single image.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The direct link behind a detail page could not be resolved.
    #[error("could not resolve direct link for {url}: {source}")]
    Resolve {
        /// The reference being resolved.
        url: String,
        /// The underlying crawl error.
        #[source]
        source: CrawlError,
    },

    /// Fetching the image failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The response body stream broke off.
    #[error("network error streaming {url}: {source}")]
    Stream {
        /// The image URL.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The direct URL has no final path segment to name the file after.
    #[error("no filename in URL {url}")]
    NoFilename {
        /// The direct URL.
        url: String,
    },

    /// File system error while writing the image.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The concurrency gate was closed while tasks were waiting on it.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

impl DownloadError {
    /// Creates a resolve error.
    pub fn resolve(url: impl Into<String>, source: CrawlError) -> Self {
        Self::Resolve {
            url: url.into(),
            source,
        }
    }

    /// Creates a body stream error.
    pub fn stream(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Stream {
            url: url.into(),
            source,
        }
    }

    /// Creates a missing filename error.
    pub fn no_filename(url: impl Into<String>) -> Self {
        Self::NoFilename { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the failure must abort the whole batch.
    ///
    /// Only site-structure mismatches qualify; everything else skips one image.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Resolve { source, .. } => source.is_structural(),
            Self::SemaphoreClosed => true,
            _ => false,
        }
    }
}
