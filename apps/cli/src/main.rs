//! mediadrop: upload one media file through the chunked upload API.

mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mediadrop_http::HttpTransport;
use mediadrop_uploader::{MediaUploader, UploadEvent};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Debug, Parser)]
#[command(name = "mediadrop", version, about = "Upload a media file in chunks")]
struct Args {
    /// File to upload.
    file: PathBuf,

    /// Configuration file (default: ~/.config/mediadrop/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bearer token; overrides the configuration file.
    #[arg(long, env = "MEDIADROP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API root, e.g. https://upload.twitter.com/1.1
    #[arg(long)]
    base_url: Option<String>,

    /// Give up after this many processing status checks.
    #[arg(long)]
    max_polls: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mediadrop=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        file = %args.file.display(),
        "starting mediadrop"
    );

    let mut config = match &args.config {
        Some(path) => CliConfig::load_from(path),
        None => CliConfig::load(),
    }
    .context("failed to load configuration")?;
    config.apply_overrides(args.token, args.base_url, args.max_polls);

    if config.bearer_token.is_empty() {
        anyhow::bail!(
            "no bearer token: pass --token, set MEDIADROP_TOKEN, \
             or set bearer_token in the config file"
        );
    }

    let transport =
        HttpTransport::new(&config.bearer_token)?.with_base_url(config.api_base_url.clone());

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let uploader =
        MediaUploader::with_config(transport, config.uploader_config()).with_events(events_tx);

    let reporter = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            report(&event);
        }
    });

    let result = uploader.upload(&args.file).await;
    // Closes the event channel so the reporter drains and exits.
    drop(uploader);
    let _ = reporter.await;

    let response = result.with_context(|| format!("upload of {} failed", args.file.display()))?;
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(())
}

/// Prints a one-line progress message to stderr.
fn report(event: &UploadEvent) {
    match event {
        UploadEvent::Initialized {
            media_id,
            descriptor,
        } => eprintln!(
            "initialized {media_id} ({}, {} bytes)",
            descriptor.media_type, descriptor.size_bytes
        ),
        UploadEvent::ChunkAppended {
            segment_index,
            bytes_sent,
            total_bytes,
            ..
        } => {
            let percent = if *total_bytes == 0 {
                100.0
            } else {
                *bytes_sent as f64 * 100.0 / *total_bytes as f64
            };
            eprintln!(
                "segment {segment_index} sent, {bytes_sent}/{total_bytes} bytes ({percent:.0}%)"
            );
        }
        UploadEvent::Finalized { media_id } => eprintln!("finalized {media_id}"),
        UploadEvent::Processing {
            state,
            progress_percent,
            check_after,
            ..
        } => {
            let progress = progress_percent
                .map(|p| format!(" {p}%"))
                .unwrap_or_default();
            eprintln!(
                "processing {state:?}{progress}, checking again in {}s",
                check_after.as_secs()
            );
        }
        UploadEvent::Completed { media_id } => eprintln!("done: {media_id}"),
        UploadEvent::Failed { error } => eprintln!("failed: {error}"),
    }
}
