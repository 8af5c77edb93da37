use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use raw_viewer::api::HttpApi;
use raw_viewer::config::Configuration;
use raw_viewer::events::ViewerEvent;
use raw_viewer::session::Session;
use raw_viewer::surface::ConsoleSurface;
use raw_viewer::tasks;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use viewer_wire::Identifier;

#[derive(Debug, Parser)]
#[command(
    name = "raw-viewer",
    version,
    about = "Pan, zoom and filter images rendered by a raw processing server"
)]
struct Args {
    /// Path to YAML config; built-in defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the server base URL
    #[arg(long, value_name = "URL")]
    server: Option<String>,
    /// Write the displayed image's bytes to this file
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,
    /// Preview identifier known before the first poll
    #[arg(long, value_name = "NAME")]
    preview: Option<String>,
    /// Full-render identifier known before the first poll
    #[arg(long, value_name = "NAME")]
    full: Option<String>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!("warn,raw_viewer={level}")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        server,
        snapshot,
        preview,
        full,
        verbose,
    } = Args::parse();
    init_tracing(verbose)?;

    let mut cfg = match &config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(server) = server {
        cfg.server = server;
    }
    if snapshot.is_some() {
        cfg.snapshot_path = snapshot;
    }
    if let Some(preview) = preview {
        cfg.initial.preview = Identifier::non_empty(preview);
    }
    if let Some(full) = full {
        cfg.initial.full = Identifier::non_empty(full);
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    tracing::debug!("configuration:\n{:#?}", cfg);

    let api = HttpApi::new(cfg.server_url()?, cfg.request_timeout)?;
    tracing::info!(server = %api.base(), "viewer starting");

    let (events_tx, events_rx) = mpsc::channel::<ViewerEvent>(64);
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let session = Session::new(&cfg, ConsoleSurface::new(cfg.snapshot_path.clone()));
        let api = api.clone();
        let feedback = events_tx.clone();
        let cancel = cancel.clone();
        async move {
            tasks::session::run(session, api, feedback, events_rx, cancel)
                .await
                .context("session task failed")
        }
    });

    tasks.spawn({
        let api = api.clone();
        let interval = cfg.poll_interval;
        let events = events_tx.clone();
        let cancel = cancel.clone();
        async move {
            tasks::sync::run(api, interval, events, cancel)
                .await
                .context("status sync task failed")
        }
    });

    tasks.spawn({
        let eof_cancels = io::stdin().is_terminal();
        let lines = tasks::input::spawn_stdin_reader()?;
        let events = events_tx;
        let cancel = cancel.clone();
        async move {
            tasks::input::run(lines, events, eof_cancels, cancel)
                .await
                .context("input task failed")
        }
    });

    let mut failed = false;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => tracing::error!("task error: {err:?}"),
            Err(err) => tracing::error!("join error: {err}"),
        }
        failed = true;
        cancel.cancel();
    }
    if failed {
        bail!("viewer stopped after a task failure");
    }
    tracing::info!("viewer stopped");
    Ok(())
}
