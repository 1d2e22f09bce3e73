use std::future;

use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::ScreenOptions;
use crate::decode::MediaDecoder;
use crate::display::DisplaySink;
use crate::events::{Command, MediaListing};
use crate::gesture::classify_tap;
use crate::slideshow::timer::TimerQueue;
use crate::slideshow::{Slideshow, Trigger};

/// Drive the slideshow: the one place its callbacks are invoked from.
///
/// Timers, commands and new listings are handled strictly one at a time.
/// Returns after cancellation or a [`Command::Quit`], which also cancels
/// `cancel` so sibling tasks wind down.
#[instrument(skip_all)]
pub async fn run<D, S>(
    mut slideshow: Slideshow<D, S, TimerQueue>,
    screen: ScreenOptions,
    mut commands: Receiver<Command>,
    mut listings: Receiver<MediaListing>,
    cancel: CancellationToken,
) -> Result<()>
where
    D: MediaDecoder,
    S: DisplaySink,
{
    let now = sync_clock(&mut slideshow);
    slideshow.advance(Trigger::Auto, now);

    loop {
        let deadline = slideshow.timers().next_deadline();
        let wake = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(Instant::from_std(at)).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting player task");
                break;
            }

            _ = wake => {
                let now = sync_clock(&mut slideshow);
                while let Some((handle, tick)) = slideshow.timers_mut().pop_due(now) {
                    slideshow.on_timer(handle, tick, now);
                }
            }

            Some(cmd) = commands.recv() => {
                let now = sync_clock(&mut slideshow);
                if !dispatch(&mut slideshow, screen, cmd, now) {
                    info!("quit requested");
                    cancel.cancel();
                    break;
                }
            }

            Some(MediaListing(media)) = listings.recv() => {
                sync_clock(&mut slideshow);
                slideshow.notify_new_media(media);
            }
        }
    }
    Ok(())
}

/// Apply one command. Returns `false` when the player should stop.
pub fn dispatch<D, S>(
    slideshow: &mut Slideshow<D, S, TimerQueue>,
    screen: ScreenOptions,
    cmd: Command,
    now: std::time::Instant,
) -> bool
where
    D: MediaDecoder,
    S: DisplaySink,
{
    match cmd {
        Command::Navigate(trigger) => slideshow.advance(trigger, now),
        Command::TogglePause => slideshow.toggle_pause(),
        Command::Zoom { action, direction } => slideshow.apply_zoom(action, direction),
        Command::Tap { x, y } => {
            let zoom_active = slideshow.is_paused() && slideshow.zoom().is_ready();
            match classify_tap(x, y, screen.width, screen.height, zoom_active) {
                Some(resolved) => return dispatch(slideshow, screen, resolved, now),
                None => debug!(x, y, "tap outside the screen"),
            }
        }
        Command::Quit => return false,
    }
    true
}

fn sync_clock<D, S>(slideshow: &mut Slideshow<D, S, TimerQueue>) -> std::time::Instant
where
    D: MediaDecoder,
    S: DisplaySink,
{
    let now = Instant::now().into_std();
    slideshow.timers_mut().set_now(now);
    now
}
