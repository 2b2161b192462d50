//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use url::Url;

/// Download every image of an album from a supported image host.
#[derive(Parser, Debug)]
#[command(name = "albumdl")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Supported image hosts.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download an imgcredit album
    Imgcredit(AlbumArgs),
    /// Download an imgur album through the imgur API
    Imgur(ImgurArgs),
    /// Download a putmega album into a dated subfolder
    Putmega(AlbumArgs),
}

impl Command {
    /// Arguments shared by every site.
    pub fn album_args(&self) -> &AlbumArgs {
        match self {
            Self::Imgcredit(args) | Self::Putmega(args) => args,
            Self::Imgur(args) => &args.album,
        }
    }
}

/// Arguments shared by every site subcommand.
#[derive(Args, Debug, Clone)]
pub struct AlbumArgs {
    /// Album URL
    #[arg(short, long, value_parser = parse_album_url)]
    pub album: Url,

    /// Directory to write images into (created if missing)
    #[arg(short, long)]
    pub destination: PathBuf,

    /// Deadline for the whole album in seconds (default 60)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub timeout: Option<u64>,

    /// Maximum simultaneous downloads, 0 for unbounded (default 0)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(0..=1000))]
    pub concurrency: Option<u16>,
}

/// Arguments for the imgur subcommand.
#[derive(Args, Debug, Clone)]
pub struct ImgurArgs {
    #[command(flatten)]
    pub album: AlbumArgs,

    /// imgur API client ID
    #[arg(short = 'i', long)]
    pub client_id: String,
}

fn parse_album_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL '{raw}': {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}', expected http or https", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("URL '{raw}' has no host"));
    }
    Ok(url)
}
