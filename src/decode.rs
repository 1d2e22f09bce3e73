//! Turns media files into rasters sized for the frame.

#[cfg(feature = "ffmpeg")]
mod libav;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, RgbaImage};
use tracing::{debug, trace};

use crate::config::{Configuration, ScreenOptions, VideoOptions};
use crate::error::Error;
use crate::processing::layout::fit_within;
use crate::processing::resize::resize_rgba;

/// A bounded run of decoded frames and the rate the source was captured at.
#[derive(Debug, Clone)]
pub struct VideoClip {
    pub frames: Vec<RgbaImage>,
    pub fps: f64,
}

pub trait MediaDecoder {
    fn decode_image(&mut self, path: &Path) -> Result<RgbaImage, Error>;
    fn decode_video(&mut self, path: &Path) -> Result<VideoClip, Error>;
}

/// Decodes from the local filesystem and fits the result to the screen.
#[derive(Debug, Clone)]
pub struct FileDecoder {
    screen: ScreenOptions,
    video: VideoOptions,
}

impl FileDecoder {
    pub fn new(screen: ScreenOptions, video: VideoOptions) -> Self {
        Self { screen, video }
    }

    pub fn from_config(cfg: &Configuration) -> Self {
        Self::new(cfg.screen, cfg.video)
    }

    fn fit_to_screen(
        &self,
        path: &Path,
        img: RgbaImage,
        allow_upscale: bool,
    ) -> Result<RgbaImage, Error> {
        let (w, h) = img.dimensions();
        let (mut tw, mut th) = fit_within(self.screen.width, self.screen.height, w, h);
        if !allow_upscale && (tw > w || th > h) {
            (tw, th) = (w, h);
        }
        if (tw, th) == (w, h) {
            return Ok(img);
        }
        resize_rgba(&img, tw, th).map_err(|e| Error::decode(path, format!("{e:#}")))
    }
}

impl MediaDecoder for FileDecoder {
    fn decode_image(&mut self, path: &Path) -> Result<RgbaImage, Error> {
        let img = decode_oriented(path)?;
        self.fit_to_screen(path, img, true)
    }

    fn decode_video(&mut self, path: &Path) -> Result<VideoClip, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let clip = match ext.as_deref() {
            Some("gif") => decode_gif(path, &self.video)?,
            #[cfg(feature = "ffmpeg")]
            Some("mp4" | "avi") => libav::decode_clip(path, &self.video, self.screen)?,
            _ => return Err(Error::UnsupportedMedia(path.to_path_buf())),
        };
        if !clip.fps.is_finite() || clip.fps <= 0.0 {
            return Err(Error::ZeroFps(path.to_path_buf()));
        }

        // Downscale only: clips keep every frame in memory.
        let mut frames = Vec::with_capacity(clip.frames.len());
        for frame in clip.frames {
            frames.push(self.fit_to_screen(path, frame, false)?);
        }
        debug!(
            path = %path.display(),
            frames = frames.len(),
            fps = clip.fps,
            "decoded clip"
        );
        Ok(VideoClip {
            frames,
            fps: clip.fps,
        })
    }
}

/// Keeps one frame out of `stride`, stopping once `max` frames are held.
pub(crate) struct FrameSampler {
    stride: usize,
    max: usize,
    seen: usize,
    kept: usize,
}

impl FrameSampler {
    pub(crate) fn new(opts: &VideoOptions) -> Self {
        Self {
            stride: opts.frame_stride.max(1),
            max: opts.max_frames,
            seen: 0,
            kept: 0,
        }
    }

    /// Whether the next decoded frame should be kept.
    pub(crate) fn offer(&mut self) -> bool {
        let keep = self.seen % self.stride == 0 && self.kept < self.max;
        self.seen += 1;
        if keep {
            self.kept += 1;
        }
        keep
    }

    pub(crate) fn is_full(&self) -> bool {
        self.kept >= self.max
    }
}

/// Send/receive half of a packet decoder such as libavcodec's.
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
pub(crate) trait PacketDecoder {
    type Packet;
    type Frame;

    /// Feed one packet, or signal end of stream with `None`. Returns false if
    /// the decoder rejected the input.
    fn send(&mut self, packet: Option<&Self::Packet>) -> bool;
    /// Next decoded frame, or `None` once the decoder wants more input.
    fn receive(&mut self) -> Option<Self::Frame>;
}

/// Feed every packet, then flush the decoder and drain the frames it still
/// buffers. `take` returns true once no more frames are wanted.
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
pub(crate) fn drain_packets<D, I, F>(decoder: &mut D, packets: I, mut take: F)
where
    D: PacketDecoder,
    I: IntoIterator<Item = D::Packet>,
    F: FnMut(D::Frame) -> bool,
{
    let mut drain = |decoder: &mut D| {
        while let Some(frame) = decoder.receive() {
            if take(frame) {
                return true;
            }
        }
        false
    };

    for packet in packets {
        if decoder.send(Some(&packet)) && drain(&mut *decoder) {
            return;
        }
    }
    if decoder.send(None) {
        drain(decoder);
    }
}

fn decode_gif(path: &Path, opts: &VideoOptions) -> Result<VideoClip, Error> {
    let reader = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(reader).map_err(|e| Error::decode(path, e))?;
    let mut sampler = FrameSampler::new(opts);
    let mut frames = Vec::new();
    let mut total_delay_ms = 0.0_f64;
    let mut delays = 0_u32;

    for frame in decoder.into_frames() {
        let frame = frame.map_err(|e| Error::decode(path, e))?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        if denom > 0 {
            total_delay_ms += f64::from(numer) / f64::from(denom);
            delays += 1;
        }
        if sampler.offer() {
            frames.push(frame.into_buffer());
        }
        if sampler.is_full() {
            break;
        }
    }

    let fps = if delays == 0 || total_delay_ms <= 0.0 {
        0.0
    } else {
        1000.0 / (total_delay_ms / f64::from(delays))
    };
    trace!(path = %path.display(), fps, kept = frames.len(), "gif frames sampled");
    Ok(VideoClip { frames, fps })
}

fn decode_oriented(path: &Path) -> Result<RgbaImage, Error> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| Error::decode(path, e))?
        .to_rgba8();
    Ok(match exif_orientation(path) {
        Some(tag) => orient(img, tag),
        None => img,
    })
}

/// EXIF orientation tag as clockwise quarter turns followed by an optional
/// horizontal mirror. Unknown tags leave the image alone.
fn orientation_steps(tag: u32) -> (u8, bool) {
    match tag {
        2 => (0, true),
        3 => (2, false),
        4 => (2, true),
        5 => (1, true),
        6 => (1, false),
        7 => (3, true),
        8 => (3, false),
        _ => (0, false),
    }
}

fn orient(img: RgbaImage, tag: u32) -> RgbaImage {
    use image::imageops::{flip_horizontal, rotate90, rotate180, rotate270};

    let (turns, mirror) = orientation_steps(tag);
    let img = match turns {
        1 => rotate90(&img),
        2 => rotate180(&img),
        3 => rotate270(&img),
        _ => img,
    };
    if mirror { flip_horizontal(&img) } else { img }
}

fn exif_orientation(path: &Path) -> Option<u32> {
    let mut reader = BufReader::new(File::open(path).ok()?);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let tag = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)?;
    trace!(path = %path.display(), tag, "exif orientation");
    Some(tag)
}
