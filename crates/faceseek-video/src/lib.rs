//! faceseek-video — sequential video I/O and frame annotation.
//!
//! Wraps FFmpeg decode→callback→encode in a single synchronous pass,
//! provides the [`RgbFrame`] type the rest of the pipeline works on, and
//! draws the match annotations that get burned into the output video.

pub mod annotate;
pub mod frame;
pub mod transcode;

pub use annotate::annotate_match;
pub use frame::RgbFrame;
pub use transcode::{transcode, VideoCodec, VideoError};
