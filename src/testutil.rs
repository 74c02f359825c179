//! Shared helpers for unit tests.

use std::io::Cursor;

use image::{Rgba, RgbaImage};

/// A small bitmap with some structure, PNG-encoded in memory.
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 16 % 256) as u8, (y * 16 % 256) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .expect("encoding test image");
    bytes
}
