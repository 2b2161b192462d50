//! One album run: destination folder, discovery, batch download.
//!
//! The whole run sits under a single deadline. When it elapses the run future
//! is dropped, which aborts every in-flight download task.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::download::{BatchDownloader, Concurrency, DownloadError, DownloadStats};
use crate::fetch::{FetchError, HttpClient};
use crate::folder::{FolderError, resolve_folder};
use crate::sites::{AlbumSource, SiteError};

/// Default deadline for a whole album run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// What to download and where.
#[derive(Debug, Clone)]
pub struct AlbumJob {
    /// Album URL as given by the user.
    pub album_url: Url,
    /// Base destination directory. A site may append a subfolder.
    pub destination: PathBuf,
    /// Deadline for the whole run.
    pub timeout: Duration,
    /// Bound on simultaneous downloads.
    pub concurrency: Concurrency,
}

impl AlbumJob {
    /// Creates a job with the default timeout and unbounded concurrency.
    #[must_use]
    pub fn new(album_url: Url, destination: impl Into<PathBuf>) -> Self {
        Self {
            album_url,
            destination: destination.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: Concurrency::Unbounded,
        }
    }
}

/// Outcome of a finished album run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSummary {
    /// Directory the files were written to.
    pub destination: PathBuf,
    /// Images found in the album.
    pub discovered: usize,
    /// Images written to disk.
    pub completed: usize,
    /// Images skipped after an error.
    pub failed: usize,
}

/// Errors that end an album run.
#[derive(Debug, Error)]
pub enum AlbumError {
    /// Destination folder could not be prepared.
    #[error(transparent)]
    Folder(#[from] FolderError),

    /// HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] FetchError),

    /// Image discovery failed.
    #[error(transparent)]
    Site(#[from] SiteError),

    /// A download failure aborted the batch.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The run did not finish before its deadline.
    #[error("album {album} did not finish within {secs}s")]
    Timeout {
        /// The album URL.
        album: String,
        /// The deadline in seconds.
        secs: u64,
    },
}

/// Downloads every image of `job.album_url` through `source`.
///
/// `stats` is updated live so a progress display can follow along.
///
/// # Errors
///
/// Returns [`AlbumError`] when the folder cannot be prepared, discovery fails,
/// a structural mismatch aborts the batch, or the deadline elapses.
#[instrument(skip_all, fields(site = source.name(), album = %job.album_url))]
pub async fn run_album(
    source: Arc<dyn AlbumSource>,
    job: &AlbumJob,
    stats: Arc<DownloadStats>,
) -> Result<AlbumSummary, AlbumError> {
    match tokio::time::timeout(job.timeout, run_album_inner(source, job, &stats)).await {
        Ok(result) => result,
        Err(_) => Err(AlbumError::Timeout {
            album: job.album_url.to_string(),
            secs: job.timeout.as_secs(),
        }),
    }
}

async fn run_album_inner(
    source: Arc<dyn AlbumSource>,
    job: &AlbumJob,
    stats: &DownloadStats,
) -> Result<AlbumSummary, AlbumError> {
    let destination = resolve_folder(&source.destination(&job.destination))?;
    let client = HttpClient::with_headers(source.request_headers()).map_err(AlbumError::Client)?;

    let images = source.discover(&client, &job.album_url).await?;
    stats.record_discovered(images.len());
    if images.is_empty() {
        warn!("no images found");
        return Ok(AlbumSummary {
            destination,
            discovered: 0,
            completed: 0,
            failed: 0,
        });
    }
    info!(count = images.len(), "discovered images");

    BatchDownloader::new(client, job.concurrency)
        .download_all(source, images, &destination, stats)
        .await?;

    Ok(AlbumSummary {
        destination,
        discovered: stats.discovered(),
        completed: stats.completed(),
        failed: stats.failed(),
    })
}
