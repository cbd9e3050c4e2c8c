//! Match annotation — green box + "Match" label burned into the frame.
//!
//! Rectangles go through imageproc; the label uses a small built-in bitmap
//! font so no font asset is needed for the one fixed string we draw.

use crate::frame::RgbFrame;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Annotation color (green).
pub const MATCH_COLOR: [u8; 3] = [0, 255, 0];
/// Box outline thickness in pixels.
const BOX_THICKNESS: i32 = 2;
/// Vertical gap between the label and the top edge of the box.
const LABEL_GAP: i32 = 10;
/// Pixel scale applied to the 5×7 bitmap glyphs.
const GLYPH_SCALE: i32 = 2;
const GLYPH_WIDTH: i32 = 5;
const GLYPH_HEIGHT: i32 = 7;
/// Horizontal advance between glyphs (one blank column).
const GLYPH_ADVANCE: i32 = GLYPH_WIDTH + 1;

const LABEL: &str = "Match";

/// Draw a hollow rectangle and a "Match" label onto the frame, in place.
///
/// Coordinates are (left, top, right, bottom) in the frame's own pixel
/// space; they are clamped to the frame, so boxes that were rescaled from a
/// downscaled detection and poke past an edge are drawn truncated rather
/// than rejected.
pub fn annotate_match(frame: &mut RgbFrame, left: i32, top: i32, right: i32, bottom: i32) {
    let width = frame.width;
    let height = frame.height;

    let mut img: RgbImage = match RgbImage::from_raw(width, height, std::mem::take(&mut frame.data))
    {
        Some(img) => img,
        None => return, // buffer/dimension mismatch; leave the frame as-is
    };

    let l = left.clamp(0, width as i32 - 1);
    let t = top.clamp(0, height as i32 - 1);
    let r = right.clamp(0, width as i32 - 1);
    let b = bottom.clamp(0, height as i32 - 1);

    if r > l && b > t {
        // `right`/`bottom` are inclusive edges, hence the +1 on the extent.
        for inset in 0..BOX_THICKNESS {
            let w = r - l - 2 * inset + 1;
            let h = b - t - 2 * inset + 1;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(l + inset, t + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut img, rect, Rgb(MATCH_COLOR));
        }

        let label_y = (t - LABEL_GAP - GLYPH_HEIGHT * GLYPH_SCALE).max(0);
        draw_label(&mut img, l, label_y);
    }

    frame.data = img.into_raw();
}

/// 5×7 bitmap for one label glyph, one row per byte, bit 4 = leftmost column.
fn glyph(ch: char) -> [u8; 7] {
    match ch {
        'M' => [
            0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001,
        ],
        'a' => [
            0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111,
        ],
        't' => [
            0b00100, 0b00100, 0b01110, 0b00100, 0b00100, 0b00100, 0b00010,
        ],
        'c' => [
            0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110,
        ],
        'h' => [
            0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001,
        ],
        _ => [0; 7],
    }
}

fn draw_label(img: &mut RgbImage, x: i32, y: i32) {
    let mut cursor_x = x;
    for ch in LABEL.chars() {
        draw_glyph(img, cursor_x, y, ch);
        cursor_x += GLYPH_ADVANCE * GLYPH_SCALE;
    }
}

fn draw_glyph(img: &mut RgbImage, x: i32, y: i32, ch: char) {
    let rows = glyph(ch);
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    let px = x + col * GLYPH_SCALE + dx;
                    let py = y + row as i32 * GLYPH_SCALE + dy;
                    if px >= 0 && py >= 0 && px < img.width() as i32 && py < img.height() as i32 {
                        img.put_pixel(px as u32, py as u32, Rgb(MATCH_COLOR));
                    }
                }
            }
        }
    }
}
