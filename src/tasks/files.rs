use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::mpsc::{self, Sender};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::events::MediaListing;
use crate::media::{LibraryScanner, MediaKind, MediaSource};

/// Keep the player's media list in sync with the library directory.
///
/// Publishes the initial listing, then relists on relevant filesystem events
/// and every `refresh` regardless. A snapshot is only sent when the listing
/// actually changed.
#[instrument(skip(scanner, to_player, cancel), fields(root = %scanner.root().display()))]
pub async fn run(
    scanner: LibraryScanner,
    refresh: Duration,
    to_player: Sender<MediaListing>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut last: Option<Vec<PathBuf>> = None;
    publish(&scanner, &mut last, &to_player).await;

    // Bridge notify callback -> async channel
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Result<Event>>(128);
    let mut watcher = recommended_watcher(move |res| {
        let _ = watch_tx.blocking_send(res);
    })?;
    watcher.watch(scanner.root(), RecursiveMode::NonRecursive)?;
    info!("notify watcher initialized");

    let mut rescan = tokio::time::interval(refresh);
    rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the initial scan already ran.
    rescan.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting files task");
                break;
            }

            _ = rescan.tick() => {
                debug!("periodic rescan");
                publish(&scanner, &mut last, &to_player).await;
            }

            Some(res) = watch_rx.recv() => match res {
                Ok(event) if is_relevant(&event) => {
                    debug!(kind = ?event.kind, paths = ?event.paths, "fs: library changed");
                    publish(&scanner, &mut last, &to_player).await;
                }
                Ok(event) => debug!(kind = ?event.kind, "fs: ignored"),
                Err(err) => error!("watch error: {err}"),
            }
        }
    }
    Ok(())
}

async fn publish(
    scanner: &LibraryScanner,
    last: &mut Option<Vec<PathBuf>>,
    to_player: &Sender<MediaListing>,
) {
    let listing = match scanner.list_media() {
        Ok(listing) => listing,
        Err(err) => {
            warn!("library scan failed: {err}");
            return;
        }
    };
    if last.as_ref() == Some(&listing) {
        debug!(count = listing.len(), "listing unchanged");
        return;
    }
    info!(count = listing.len(), "publishing media listing");
    *last = Some(listing.clone());
    if to_player.send(MediaListing(listing)).await.is_err() {
        debug!("player gone; listing dropped");
    }
}

fn is_relevant(event: &Event) -> bool {
    let kind_matters = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    );
    kind_matters && event.paths.iter().any(|p| MediaKind::of(p).is_some())
}
