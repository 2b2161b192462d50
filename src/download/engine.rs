//! Batch downloader: one task per image, optionally gated by a semaphore.
//!
//! # Concurrency Model
//!
//! - Every image gets its own Tokio task, spawned eagerly into a `JoinSet`
//! - With [`Concurrency::Limited`], a task holds a semaphore permit while it runs
//! - With [`Concurrency::Unbounded`], nothing gates the tasks
//! - The batch returns once every task has finished (or a fatal error aborted the rest)
//!
//! # Failure Policy
//!
//! Per-image transport, status and write failures are logged and counted as
//! failed; the batch carries on. A site-structure mismatch while resolving a
//! detail page aborts all remaining tasks and is returned to the caller.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::StreamExt;
use reqwest::Response;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::DownloadError;
use crate::fetch::HttpClient;
use crate::filename::filename_from_url;
use crate::sites::{AlbumSource, ImageReference};

/// Bound on simultaneously running downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// Every image downloads at once.
    #[default]
    Unbounded,
    /// At most this many downloads run at once.
    Limited(NonZeroUsize),
}

impl Concurrency {
    /// Maps a numeric limit to a bound, with `0` meaning unbounded.
    #[must_use]
    pub fn from_limit(limit: usize) -> Self {
        NonZeroUsize::new(limit).map_or(Self::Unbounded, Self::Limited)
    }

    /// The numeric limit, `None` when unbounded.
    #[must_use]
    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Limited(limit) => Some(limit.get()),
        }
    }
}

/// Counters shared by every download task of one album run.
///
/// Uses atomic counters so concurrent tasks and a progress display can read
/// and update them without locking.
#[derive(Debug, Default)]
pub struct DownloadStats {
    discovered: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of images discovered for the album.
    #[must_use]
    pub fn discovered(&self) -> usize {
        self.discovered.load(Ordering::SeqCst)
    }

    /// Number of images written to disk.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Number of images skipped after an error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Completed plus failed.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.completed() + self.failed()
    }

    pub(crate) fn record_discovered(&self, count: usize) {
        self.discovered.store(count, Ordering::SeqCst);
    }

    fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fetches a batch of images into one directory.
#[derive(Debug, Clone)]
pub struct BatchDownloader {
    client: HttpClient,
    concurrency: Concurrency,
}

impl BatchDownloader {
    /// Creates a downloader that fetches with `client` under `concurrency`.
    #[must_use]
    pub fn new(client: HttpClient, concurrency: Concurrency) -> Self {
        Self {
            client,
            concurrency,
        }
    }

    /// Returns the configured concurrency bound.
    #[must_use]
    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// Downloads every image into `dest`, blocking until all tasks finish.
    ///
    /// Files are named after the final path segment of each direct URL and
    /// replace any existing file of the same name once fully downloaded.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`DownloadError`] (see [`DownloadError::is_fatal`]);
    /// remaining tasks are aborted. Non-fatal failures only show up in `stats`.
    #[instrument(skip_all, fields(site = source.name(), images = images.len(), dest = %dest.display()))]
    pub async fn download_all(
        &self,
        source: Arc<dyn AlbumSource>,
        images: Vec<ImageReference>,
        dest: &Path,
        stats: &DownloadStats,
    ) -> Result<(), DownloadError> {
        let semaphore = self
            .concurrency
            .limit()
            .map(|limit| Arc::new(Semaphore::new(limit)));
        let mut tasks = JoinSet::new();

        for image in images {
            let client = self.client.clone();
            let source = Arc::clone(&source);
            let dest = dest.to_path_buf();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = match semaphore {
                    Some(semaphore) => Some(
                        semaphore
                            .acquire_owned()
                            .await
                            .map_err(|_| DownloadError::SemaphoreClosed)?,
                    ),
                    None => None,
                };
                download_one(&client, source.as_ref(), &image, &dest).await
            });
        }

        debug!(
            task_count = tasks.len(),
            limit = ?self.concurrency.limit(),
            "waiting for downloads to complete"
        );

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => stats.increment_completed(),
                Ok(Err(error)) if error.is_fatal() => {
                    tasks.abort_all();
                    return Err(error);
                }
                Ok(Err(error)) => {
                    warn!(error = %error, "skipping image");
                    stats.increment_failed();
                }
                Err(error) => {
                    warn!(error = %error, "download task panicked");
                    stats.increment_failed();
                }
            }
        }

        info!(
            completed = stats.completed(),
            failed = stats.failed(),
            "batch download complete"
        );
        Ok(())
    }
}

async fn download_one(
    client: &HttpClient,
    source: &dyn AlbumSource,
    image: &ImageReference,
    dest: &Path,
) -> Result<PathBuf, DownloadError> {
    let direct = source
        .direct_link(client, image)
        .await
        .map_err(|e| DownloadError::resolve(image.url().as_str(), e))?;
    let filename =
        filename_from_url(&direct).ok_or_else(|| DownloadError::no_filename(direct.as_str()))?;
    let path = dest.join(filename);

    let response = client.send(&direct).await?;
    let bytes = write_body(response, &direct, &path).await?;

    info!(url = %direct, path = %path.display(), bytes, "image written");
    Ok(path)
}

/// Writes the response body next to `path` and moves it into place once complete.
///
/// An existing file at `path` is only replaced by a fully written body.
async fn write_body(response: Response, url: &Url, path: &Path) -> Result<u64, DownloadError> {
    let partial = PartialFile::new(partial_path(path));
    let file = File::create(partial.path())
        .await
        .map_err(|e| DownloadError::io(partial.path(), e))?;

    let bytes = stream_to_file(file, response, url, partial.path()).await?;
    tokio::fs::rename(partial.path(), path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    partial.persist();
    Ok(bytes)
}

/// `<name>.part` in the same directory as `path`.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// In-progress download file, removed on drop unless persisted.
///
/// Dropping covers error returns as well as tasks aborted or timed out mid-body.
#[derive(Debug)]
struct PartialFile {
    path: PathBuf,
    persisted: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persist(mut self) {
        self.persisted = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if std::fs::remove_file(&self.path).is_ok() {
            debug!(path = %self.path.display(), "removed partial file");
        }
    }
}

async fn stream_to_file(
    file: File,
    response: Response,
    url: &Url,
    path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::stream(url.as_str(), e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        bytes_written = bytes_written.saturating_add(chunk.len() as u64);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_zero_is_unbounded() {
        assert_eq!(Concurrency::from_limit(0), Concurrency::Unbounded);
        assert_eq!(Concurrency::from_limit(0).limit(), None);
        assert_eq!(Concurrency::default(), Concurrency::Unbounded);
    }

    #[test]
    fn test_concurrency_positive_is_limited() {
        let concurrency = Concurrency::from_limit(4);
        assert_eq!(
            concurrency,
            Concurrency::Limited(NonZeroUsize::new(4).unwrap())
        );
        assert_eq!(concurrency.limit(), Some(4));
    }

    #[test]
    fn test_download_stats_default() {
        let stats = DownloadStats::default();
        assert_eq!(stats.discovered(), 0);
        assert_eq!(stats.completed(), 0);
        assert_eq!(stats.failed(), 0);
        assert_eq!(stats.finished(), 0);
    }

    #[test]
    fn test_download_stats_thread_safe() {
        use std::thread;

        let stats = Arc::new(DownloadStats::new());
        stats.record_discovered(2000);
        let mut handles = Vec::new();

        for _ in 0..10 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats.increment_completed();
                    stats.increment_failed();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.completed(), 1000);
        assert_eq!(stats.failed(), 1000);
        assert_eq!(stats.finished(), stats.discovered());
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/out/cat.jpg")),
            PathBuf::from("/out/cat.jpg.part")
        );
    }

    #[test]
    fn test_partial_file_removed_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.jpg.part");
        std::fs::write(&path, b"half").unwrap();

        drop(PartialFile::new(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn test_persisted_partial_file_is_kept() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.jpg.part");
        std::fs::write(&path, b"whole").unwrap();

        PartialFile::new(path.clone()).persist();
        assert!(path.exists());
    }
}
