//! Frame type and downscaling.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// A single decoded video frame in packed RGB24 format.
#[derive(Clone)]
pub struct RgbFrame {
    /// Packed RGB24 pixel data, row-major, width * height * 3 bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1-based frame index in decode order.
    pub index: u64,
    /// Playback position of this frame, in seconds.
    pub timestamp: f64,
}

impl RgbFrame {
    /// Copy of this frame shrunk by `factor` (both dimensions scaled equally,
    /// bilinear). The copy keeps the source frame's index and timestamp;
    /// detections made on it must be rescaled by `1 / factor` before being
    /// drawn on the original.
    pub fn downscaled(&self, factor: f32) -> RgbFrame {
        let new_w = ((self.width as f32 * factor).round() as u32).max(1);
        let new_h = ((self.height as f32 * factor).round() as u32).max(1);

        let img = RgbImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height));
        let small = imageops::resize(&img, new_w, new_h, FilterType::Triangle);

        RgbFrame {
            data: small.into_raw(),
            width: new_w,
            height: new_h,
            index: self.index,
            timestamp: self.timestamp,
        }
    }
}
