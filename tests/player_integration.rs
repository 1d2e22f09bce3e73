use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use photo_slideshow::config::{ClockOptions, ScreenOptions};
use photo_slideshow::decode::{MediaDecoder, VideoClip};
use photo_slideshow::display::DisplaySink;
use photo_slideshow::error::Error;
use photo_slideshow::events::{Command, MediaListing};
use photo_slideshow::slideshow::timer::TimerQueue;
use photo_slideshow::slideshow::{Slideshow, SlideshowOptions, Trigger};
use photo_slideshow::tasks::player;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const SCREEN: ScreenOptions = ScreenOptions {
    width: 300,
    height: 300,
};

struct TaggedDecoder;

impl MediaDecoder for TaggedDecoder {
    fn decode_image(&mut self, path: &Path) -> Result<RgbaImage, Error> {
        let tag = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.bytes().next())
            .unwrap_or(0);
        Ok(RgbaImage::from_pixel(4, 4, Rgba([tag, 0, 0, 255])))
    }

    fn decode_video(&mut self, path: &Path) -> Result<VideoClip, Error> {
        Err(Error::UnsupportedMedia(path.to_path_buf()))
    }
}

/// Records the red channel of every rendered frame.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn rendered(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl DisplaySink for SharedSink {
    fn render(&mut self, frame: &RgbaImage) {
        self.0.lock().unwrap().push(frame.get_pixel(0, 0).0[0]);
    }
    fn show_placeholder(&mut self, _text: &str) {}
    fn set_clock(&mut self, _text: &str) {}
    fn set_paused(&mut self, _paused: bool) {}
    fn set_highlight(&mut self, _highlight: bool) {}
}

fn slideshow(
    items: &[&str],
    interval: Duration,
    sink: SharedSink,
) -> Slideshow<TaggedDecoder, SharedSink, TimerQueue> {
    let options = SlideshowOptions {
        interval,
        new_media_window: Duration::from_secs(60),
        clock: ClockOptions::default(),
        speedup_factor: 0.25,
        navigation_step_px: 15,
    };
    let media: Vec<PathBuf> = items.iter().map(|n| PathBuf::from("/m").join(n)).collect();
    Slideshow::new(TaggedDecoder, sink, TimerQueue::new(Instant::now()), options).with_media(media)
}

async fn wait_for(sink: &SharedSink, count: usize) -> Vec<u8> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let rendered = sink.rendered();
            if rendered.len() >= count {
                return rendered;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timeout waiting for renders")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn commands_navigate_and_quit_cancels_everything() {
    let sink = SharedSink::default();
    let show = slideshow(&["a.jpg", "b.jpg", "c.jpg"], Duration::from_secs(60), sink.clone());
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (_list_tx, list_rx) = mpsc::channel::<MediaListing>(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(player::run(show, SCREEN, cmd_rx, list_rx, cancel.clone()));

    assert_eq!(wait_for(&sink, 1).await, vec![b'a']);

    cmd_tx.send(Command::Navigate(Trigger::Next)).await.unwrap();
    // Top-right cell of the tap grid is "next".
    cmd_tx.send(Command::Tap { x: 290, y: 10 }).await.unwrap();
    assert_eq!(wait_for(&sink, 3).await, vec![b'a', b'b', b'c']);

    cmd_tx.send(Command::Quit).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("player did not stop")
        .unwrap();
    assert!(result.is_ok());
    assert!(cancel.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timers_fire_on_the_runtime_clock() {
    let sink = SharedSink::default();
    let show = slideshow(&["a.jpg", "b.jpg"], Duration::from_millis(50), sink.clone());
    let (_cmd_tx, cmd_rx) = mpsc::channel::<Command>(8);
    let (_list_tx, list_rx) = mpsc::channel::<MediaListing>(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(player::run(show, SCREEN, cmd_rx, list_rx, cancel.clone()));

    let rendered = wait_for(&sink, 3).await;
    assert_eq!(rendered[..3], [b'a', b'b', b'a']);

    cancel.cancel();
    let _ = handle.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listing_from_files_starts_an_empty_show() {
    let sink = SharedSink::default();
    let show = slideshow(&[], Duration::from_millis(50), sink.clone());
    let (_cmd_tx, cmd_rx) = mpsc::channel::<Command>(8);
    let (list_tx, list_rx) = mpsc::channel::<MediaListing>(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(player::run(show, SCREEN, cmd_rx, list_rx, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sink.rendered().is_empty());

    list_tx
        .send(MediaListing(vec![PathBuf::from("/m/z.jpg")]))
        .await
        .unwrap();
    assert_eq!(wait_for(&sink, 1).await, vec![b'z']);

    cancel.cancel();
    let _ = handle.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn paused_taps_drive_zoom() {
    let sink = SharedSink::default();
    let show = slideshow(&["a.jpg", "b.jpg"], Duration::from_secs(60), sink.clone());
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (_list_tx, list_rx) = mpsc::channel::<MediaListing>(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(player::run(show, SCREEN, cmd_rx, list_rx, cancel.clone()));

    wait_for(&sink, 1).await;
    // Top-centre toggles pause; middle-right then zooms instead of navigating.
    cmd_tx.send(Command::Tap { x: 150, y: 10 }).await.unwrap();
    cmd_tx.send(Command::Tap { x: 290, y: 150 }).await.unwrap();
    let rendered = wait_for(&sink, 2).await;
    assert_eq!(rendered.len(), 2);
    assert!(rendered[1].abs_diff(b'a') <= 1, "zoomed view of the same still");

    cancel.cancel();
    let _ = handle.await;
}
