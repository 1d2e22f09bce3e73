use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use photo_slideshow::config::Configuration;
use photo_slideshow::decode::FileDecoder;
use photo_slideshow::display::SnapshotSink;
use photo_slideshow::events::{Command, MediaListing};
use photo_slideshow::media::{LibraryScanner, MediaSource};
use photo_slideshow::slideshow::timer::TimerQueue;
use photo_slideshow::slideshow::{Slideshow, SlideshowOptions};
use photo_slideshow::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "photo-slideshow",
    version,
    about = "Unattended photo and video slideshow"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,photo_slideshow={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let result = runtime.block_on(run(args));
    // A blocking stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

async fn run(Args { config, .. }: Args) -> Result<()> {
    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::info!(
        "Loaded configuration from {}:\n{:#?}",
        config.display(),
        cfg
    );

    let scanner = LibraryScanner::from_config(&cfg);
    let initial = scanner.list_media().unwrap_or_else(|err| {
        tracing::warn!("initial library scan failed: {err}");
        Vec::new()
    });
    tracing::info!(
        count = initial.len(),
        interval = %humantime::format_duration(cfg.slideshow_interval),
        "initial media listing"
    );

    let slideshow = Slideshow::new(
        FileDecoder::from_config(&cfg),
        SnapshotSink::new(cfg.output_path.clone()),
        TimerQueue::new(Instant::now()),
        SlideshowOptions::from(&cfg),
    )
    .with_media(initial);

    // Channels (small/bounded)
    let (listing_tx, listing_rx) = mpsc::channel::<MediaListing>(8); // Files -> Player
    let (command_tx, command_rx) = mpsc::channel::<Command>(32); // Input -> Player

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
        let refresh = cfg.refresh_interval;
        let cancel = cancel.clone();
        async move {
            tasks::files::run(scanner, refresh, listing_tx, cancel)
                .await
                .context("files task failed")
        }
    });

    tasks.spawn({
        let command_tx = command_tx.clone();
        let cancel = cancel.clone();
        async move {
            tasks::input::run(command_tx, cancel)
                .await
                .context("input task failed")
        }
    });

    #[cfg(unix)]
    tasks.spawn({
        let command_tx = command_tx.clone();
        let cancel = cancel.clone();
        async move {
            tasks::input::run_signals(command_tx, cancel)
                .await
                .context("signal task failed")
        }
    });
    drop(command_tx);

    // The player owns the slideshow and runs on this task until quit or shutdown
    let player = tasks::player::run(
        slideshow,
        cfg.screen,
        command_rx,
        listing_rx,
        cancel.clone(),
    );
    if let Err(e) = player.await.context("player failed") {
        tracing::error!("{e:?}");
    }
    // Ensure other tasks are asked to stop
    cancel.cancel();

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}
