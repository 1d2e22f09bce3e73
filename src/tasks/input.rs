use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::Command;
use crate::slideshow::Trigger;
use crate::slideshow::zoom::{Direction, ZoomAction};

/// Parse one control line. Blank lines yield `None`, unknown words an error message.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let zoom = |action, direction| Command::Zoom { action, direction };
    let cmd = match head.to_ascii_lowercase().as_str() {
        "next" | "n" => Command::Navigate(Trigger::Next),
        "prev" | "p" => Command::Navigate(Trigger::Prev),
        "restart" => Command::Navigate(Trigger::Restart),
        "pause" | "resume" | "toggle" => Command::TogglePause,
        "zoom" | "+" => zoom(Some(ZoomAction::Zoom), None),
        "dezoom" | "-" => zoom(Some(ZoomAction::Dezoom), None),
        "up" => zoom(None, Some(Direction::Up)),
        "down" | "bottom" => zoom(None, Some(Direction::Bottom)),
        "left" => zoom(None, Some(Direction::Left)),
        "right" => zoom(None, Some(Direction::Right)),
        "tap" => {
            let mut coord = || {
                words
                    .next()
                    .and_then(|w| w.parse::<u32>().ok())
                    .ok_or_else(|| format!("usage: tap X Y (got {line:?})"))
            };
            let x = coord()?;
            let y = coord()?;
            Command::Tap { x, y }
        }
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command {other:?}")),
    };
    Ok(Some(cmd))
}

/// Forward stdin control lines to the player until EOF or cancellation.
pub async fn run(to_player: Sender<Command>, cancel: CancellationToken) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed; no more control input");
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(cmd)) => {
                        debug!(?cmd, "stdin command");
                        if to_player.send(cmd).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => warn!("{msg}"),
                }
            }
        }
    }
    Ok(())
}

/// SIGUSR1 toggles pause, SIGUSR2 skips to the next item.
#[cfg(unix)]
pub async fn run_signals(to_player: Sender<Command>, cancel: CancellationToken) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigusr1 = signal(SignalKind::user_defined1())?;
    let mut sigusr2 = signal(SignalKind::user_defined2())?;
    loop {
        let cmd = tokio::select! {
            _ = cancel.cancelled() => break,
            Some(()) = sigusr1.recv() => {
                info!("SIGUSR1 received; toggling pause");
                Command::TogglePause
            }
            Some(()) = sigusr2.recv() => {
                info!("SIGUSR2 received; next item");
                Command::Navigate(Trigger::Next)
            }
            else => break,
        };
        if let Err(err) = to_player.send(cmd).await {
            warn!("failed to forward signal command: {err}");
            break;
        }
    }
    Ok(())
}
