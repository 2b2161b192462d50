use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use albumdl_core::download::DownloadStats;
use albumdl_core::pipeline::{AlbumJob, run_album};
use albumdl_core::sites::{AlbumSource, ImgCredit, Imgur, PutMega};
use anyhow::{Context, Result};
use tracing::{debug, info};
use url::Url;

use crate::app::config::{self, RunSettings, VerbositySetting};
use crate::app::{progress, terminal};
use crate::cli::{Cli, Command};

pub(crate) async fn run_albumdl(cli: Cli) -> Result<()> {
    let file_config = config::load_default_file_config()?;
    let settings = config::resolve_settings(
        cli.command.album_args(),
        cli.verbose,
        cli.quiet,
        file_config.as_ref(),
        config::env_imgur_api_base(),
    );

    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(settings.verbosity.log_level(), no_color);

    debug!(?cli, ?settings, "CLI arguments parsed");

    let source = build_source(&cli.command, &settings)?;
    let args = cli.command.album_args();
    let job = AlbumJob {
        album_url: args.album.clone(),
        destination: args.destination.clone(),
        timeout: settings.timeout,
        concurrency: settings.concurrency,
    };
    info!(site = source.name(), album = %job.album_url, "albumdl starting");

    let stats = Arc::new(DownloadStats::new());
    let use_spinner = terminal::should_use_spinner(
        io::stderr().is_terminal(),
        settings.verbosity == VerbositySetting::Quiet,
        terminal::is_dumb_terminal(),
    );
    let (progress_handle, progress_stop) =
        progress::spawn_progress_ui(use_spinner, Arc::clone(&stats));

    let result = run_album(Arc::clone(&source), &job, Arc::clone(&stats)).await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let summary = result.with_context(|| format!("{} album {} failed", source.name(), job.album_url))?;
    info!(
        destination = %summary.destination.display(),
        discovered = summary.discovered,
        completed = summary.completed,
        failed = summary.failed,
        "Download complete"
    );
    Ok(())
}

fn build_source(command: &Command, settings: &RunSettings) -> Result<Arc<dyn AlbumSource>> {
    let source: Arc<dyn AlbumSource> = match command {
        Command::Imgcredit(_) => Arc::new(ImgCredit::new()?),
        Command::Putmega(_) => Arc::new(PutMega::new()?),
        Command::Imgur(args) => {
            let mut imgur = Imgur::new(&args.client_id)?;
            if let Some(base) = settings.imgur_api_base.as_deref() {
                let base = Url::parse(base)
                    .with_context(|| format!("Invalid imgur API base URL '{base}'"))?;
                imgur = imgur.with_api_base(&base)?;
            }
            Arc::new(imgur)
        }
    };
    Ok(source)
}
