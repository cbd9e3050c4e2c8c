//! Sequential decode → per-frame callback → encode.
//!
//! One synchronous pass over the source video: every decoded frame is
//! converted to RGB24, handed to the caller's callback (which may annotate it
//! in place), then encoded to the output at the source's dimensions and frame
//! rate. Audio streams are not carried over.

use crate::frame::RgbFrame;
use ffmpeg_next as ffmpeg;
use ffmpeg_next::{
    codec, encoder, format, frame, media, software::scaling, util::rational::Rational, Dictionary,
};
use std::path::Path;
use thiserror::Error;

/// Output pixel format for the encoder (YUV420p is universally compatible).
const ENCODE_FORMAT: format::Pixel = format::Pixel::YUV420P;
/// Scaling flags for the RGB conversion on both sides of the callback.
const SCALE_FLAGS: scaling::Flags = scaling::Flags::BILINEAR;
/// Target bit rate for encoders that are rate-driven (MPEG-4 part 2).
const MPEG4_BIT_RATE: usize = 4_000_000;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("ffmpeg: {0}")]
    Ffmpeg(#[from] ffmpeg::Error),
    #[error("no video stream found in {0}")]
    NoVideoStream(String),
    #[error("{0} encoder not found; check the FFmpeg build")]
    EncoderNotFound(&'static str),
}

/// Output video codec. MPEG-4 part 2 ("mp4v") is the default; H.264 is
/// available where libx264 is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    Mpeg4,
    H264,
}

impl VideoCodec {
    pub fn id(self) -> codec::Id {
        match self {
            VideoCodec::Mpeg4 => codec::Id::MPEG4,
            VideoCodec::H264 => codec::Id::H264,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VideoCodec::Mpeg4 => "mpeg4",
            VideoCodec::H264 => "h264",
        }
    }
}

/// Open `input_path`, apply `frame_fn` to every frame in decode order
/// (frames are numbered from 1 and carry their playback timestamp), and
/// write the result to `output_path` with the same dimensions and frame
/// rate as the source. The callback must not change the frame's dimensions.
///
/// Returns the number of frames written. Both handles are flushed and
/// closed before returning; the only exit paths are stream exhaustion and
/// error propagation.
pub fn transcode<P, Q, F>(
    input_path: P,
    output_path: Q,
    codec: VideoCodec,
    mut frame_fn: F,
) -> Result<u64, VideoError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    F: FnMut(&mut RgbFrame),
{
    ffmpeg::init()?;

    let mut ictx = format::input(&input_path)?;

    let (video_stream_index, time_base, frame_rate, parameters) = {
        let stream = ictx
            .streams()
            .best(media::Type::Video)
            .ok_or_else(|| VideoError::NoVideoStream(input_path.as_ref().display().to_string()))?;
        (
            stream.index(),
            stream.time_base(),
            stream.avg_frame_rate(),
            stream.parameters(),
        )
    };

    let decoder_ctx = codec::context::Context::from_parameters(parameters)?;
    let mut decoder = decoder_ctx.decoder().video()?;

    let width = decoder.width();
    let height = decoder.height();
    let src_format = decoder.format();

    let fps = rational_to_f64(frame_rate);
    tracing::info!(width, height, fps, codec = codec.name(), "opened input video stream");

    let to_rgb = scaling::Context::get(
        src_format,
        width,
        height,
        format::Pixel::RGB24,
        width,
        height,
        SCALE_FLAGS,
    )?;

    let mut octx = format::output(&output_path)?;
    let global_header = octx
        .format()
        .flags()
        .contains(format::flag::Flags::GLOBAL_HEADER);

    let encoder_codec =
        encoder::find(codec.id()).ok_or(VideoError::EncoderNotFound(codec.name()))?;

    let enc_ctx = codec::context::Context::new_with_codec(encoder_codec);
    let mut enc = enc_ctx.encoder().video()?;
    enc.set_width(width);
    enc.set_height(height);
    enc.set_format(ENCODE_FORMAT);
    enc.set_time_base(time_base);
    enc.set_frame_rate(Some(frame_rate));
    if global_header {
        enc.set_flags(codec::flag::Flags::GLOBAL_HEADER);
    }

    let video_encoder = match codec {
        VideoCodec::H264 => enc.open_as_with(
            encoder_codec,
            Dictionary::from_iter([("crf", "18"), ("preset", "fast")]),
        )?,
        VideoCodec::Mpeg4 => {
            enc.set_bit_rate(MPEG4_BIT_RATE);
            enc.open_as(encoder_codec)?
        }
    };

    let out_index = {
        let mut out_stream = octx.add_stream(encoder_codec)?;
        out_stream.set_parameters(&video_encoder);
        out_stream.index()
    };

    octx.write_header()?;

    let to_yuv = scaling::Context::get(
        format::Pixel::RGB24,
        width,
        height,
        ENCODE_FORMAT,
        width,
        height,
        SCALE_FLAGS,
    )?;

    let mut pipeline = EncodePipeline {
        to_rgb,
        to_yuv,
        rgb_avframe: frame::Video::empty(),
        out_rgb: frame::Video::new(format::Pixel::RGB24, width, height),
        yuv: frame::Video::empty(),
        encoder: video_encoder,
        out_index,
        time_base,
        seconds_per_tick: rational_to_f64(time_base),
        width,
        height,
        fps,
        frame_count: 0,
    };

    let mut decoded = frame::Video::empty();

    for (stream, packet) in ictx.packets() {
        if stream.index() != video_stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            pipeline.consume(&decoded, &mut octx, &mut frame_fn)?;
        }
    }

    // Drain the decoder through the same frame path as the main loop.
    decoder.send_eof().ok();
    while decoder.receive_frame(&mut decoded).is_ok() {
        pipeline.consume(&decoded, &mut octx, &mut frame_fn)?;
    }

    pipeline.finish(&mut octx)?;
    octx.write_trailer()?;

    tracing::info!(frames = pipeline.frame_count, "transcode complete");
    Ok(pipeline.frame_count)
}

/// Encode-side state for one transcode pass.
struct EncodePipeline {
    to_rgb: scaling::Context,
    to_yuv: scaling::Context,
    rgb_avframe: frame::Video,
    out_rgb: frame::Video,
    yuv: frame::Video,
    encoder: encoder::Video,
    out_index: usize,
    time_base: Rational,
    seconds_per_tick: f64,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: u64,
}

impl EncodePipeline {
    /// Convert one decoded frame to RGB, run the callback, encode the result.
    fn consume(
        &mut self,
        decoded: &frame::Video,
        octx: &mut format::context::Output,
        frame_fn: &mut dyn FnMut(&mut RgbFrame),
    ) -> Result<(), VideoError> {
        self.to_rgb.run(decoded, &mut self.rgb_avframe)?;

        // Compact to a plain Vec<u8>, removing any stride padding.
        let stride = self.rgb_avframe.stride(0);
        let raw = self.rgb_avframe.data(0);
        let row_bytes = self.width as usize * 3;
        let mut rgb_data = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * stride;
            rgb_data.extend_from_slice(&raw[start..start + row_bytes]);
        }

        self.frame_count += 1;
        let pts = decoded.pts();
        let timestamp = match pts {
            Some(p) => p as f64 * self.seconds_per_tick,
            None if self.fps > 0.0 => (self.frame_count - 1) as f64 / self.fps,
            None => 0.0,
        };

        let mut rgb = RgbFrame {
            data: rgb_data,
            width: self.width,
            height: self.height,
            index: self.frame_count,
            timestamp,
        };

        frame_fn(&mut rgb);
        debug_assert_eq!(
            (rgb.width, rgb.height),
            (self.width, self.height),
            "frame callback must preserve dimensions"
        );

        // Write the (possibly annotated) RGB data back into an AVFrame.
        let out_stride = self.out_rgb.stride(0);
        let plane = self.out_rgb.data_mut(0);
        for row in 0..self.height as usize {
            let dst = row * out_stride;
            let src = row * row_bytes;
            plane[dst..dst + row_bytes].copy_from_slice(&rgb.data[src..src + row_bytes]);
        }

        self.to_yuv.run(&self.out_rgb, &mut self.yuv)?;
        self.yuv
            .set_pts(Some(pts.unwrap_or(self.frame_count as i64 - 1)));

        self.encoder.send_frame(&self.yuv)?;
        self.drain_packets(octx)
    }

    /// Write all pending packets from the encoder to the muxer.
    fn drain_packets(&mut self, octx: &mut format::context::Output) -> Result<(), VideoError> {
        let mut encoded = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.out_index);
            let dst_tb = octx
                .stream(self.out_index)
                .map(|s| s.time_base())
                .unwrap_or(self.time_base);
            encoded.rescale_ts(self.time_base, dst_tb);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }

    /// Flush the encoder at end of stream.
    fn finish(&mut self, octx: &mut format::context::Output) -> Result<(), VideoError> {
        self.encoder.send_eof().ok();
        self.drain_packets(octx)
    }
}

fn rational_to_f64(r: Rational) -> f64 {
    if r.denominator() == 0 {
        0.0
    } else {
        r.numerator() as f64 / r.denominator() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_ids() {
        assert_eq!(VideoCodec::Mpeg4.id(), codec::Id::MPEG4);
        assert_eq!(VideoCodec::H264.id(), codec::Id::H264);
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(VideoCodec::Mpeg4.name(), "mpeg4");
        assert_eq!(VideoCodec::H264.name(), "h264");
    }

    #[test]
    fn test_rational_to_f64() {
        assert!((rational_to_f64(Rational::new(30, 1)) - 30.0).abs() < 1e-9);
        assert!((rational_to_f64(Rational::new(1, 15360)) - 1.0 / 15360.0).abs() < 1e-12);
        assert_eq!(rational_to_f64(Rational::new(1, 0)), 0.0);
    }
}
