use std::path::Path;

use ffmpeg_next as ffmpeg;
use image::RgbaImage;

use super::{FrameSampler, PacketDecoder, VideoClip, drain_packets};
use crate::config::{ScreenOptions, VideoOptions};
use crate::error::Error;
use crate::processing::layout::fit_within;

/// Decode the leading frames of a container file, already scaled for the screen.
pub(super) fn decode_clip(
    path: &Path,
    opts: &VideoOptions,
    screen: ScreenOptions,
) -> Result<VideoClip, Error> {
    ffmpeg::init().map_err(|e| Error::decode(path, e))?;
    let mut input = ffmpeg::format::input(path).map_err(|e| Error::decode(path, e))?;
    let stream = input
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| Error::decode(path, "no video stream"))?;
    let stream_index = stream.index();
    let rate = stream.avg_frame_rate();
    let fps = if rate.denominator() == 0 {
        0.0
    } else {
        f64::from(rate.numerator()) / f64::from(rate.denominator())
    };

    let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| Error::decode(path, e))?;
    let mut decoder = context
        .decoder()
        .video()
        .map_err(|e| Error::decode(path, e))?;

    let src_width = decoder.width().max(1);
    let src_height = decoder.height().max(1);
    let (mut target_width, mut target_height) =
        fit_within(screen.width, screen.height, src_width, src_height);
    if target_width > src_width || target_height > src_height {
        (target_width, target_height) = (src_width, src_height);
    }
    let mut scaler = ffmpeg::software::scaling::Context::get(
        decoder.format(),
        src_width,
        src_height,
        ffmpeg::util::format::Pixel::RGBA,
        target_width,
        target_height,
        ffmpeg::software::scaling::Flags::BILINEAR,
    )
    .map_err(|e| Error::decode(path, e))?;

    let mut sampler = FrameSampler::new(opts);
    let mut frames = Vec::new();
    let mut rgba_frame = ffmpeg::util::frame::Video::empty();

    let packets = input
        .packets()
        .filter(|(stream, _)| stream.index() == stream_index)
        .map(|(_, packet)| packet);
    drain_packets(&mut LibavDecoder(decoder), packets, |decoded| {
        if sampler.offer() && scaler.run(&decoded, &mut rgba_frame).is_ok() {
            if let Some(img) = frame_to_rgba(&rgba_frame) {
                frames.push(img);
            }
        }
        sampler.is_full()
    });

    Ok(VideoClip { frames, fps })
}

struct LibavDecoder(ffmpeg::decoder::Video);

impl PacketDecoder for LibavDecoder {
    type Packet = ffmpeg::Packet;
    type Frame = ffmpeg::util::frame::Video;

    fn send(&mut self, packet: Option<&ffmpeg::Packet>) -> bool {
        match packet {
            Some(packet) => self.0.send_packet(packet).is_ok(),
            None => self.0.send_eof().is_ok(),
        }
    }

    fn receive(&mut self) -> Option<Self::Frame> {
        let mut decoded = ffmpeg::util::frame::Video::empty();
        self.0.receive_frame(&mut decoded).ok().map(|()| decoded)
    }
}

fn frame_to_rgba(frame: &ffmpeg::util::frame::Video) -> Option<RgbaImage> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    if width == 0 || height == 0 {
        return None;
    }

    let stride = frame.stride(0);
    let row_bytes = width * 4;
    if stride < row_bytes {
        return None;
    }

    let data = frame.data(0);
    let mut buffer = vec![0_u8; row_bytes * height];
    for y in 0..height {
        let src_offset = y * stride;
        let dst_offset = y * row_bytes;
        let src_slice = data.get(src_offset..src_offset + row_bytes)?;
        buffer[dst_offset..dst_offset + row_bytes].copy_from_slice(src_slice);
    }

    RgbaImage::from_vec(width as u32, height as u32, buffer)
}
