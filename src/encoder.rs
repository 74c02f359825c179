//! Decoding onto a raster surface and re-encoding it.
//!
//! The panel never touches pixels itself: source bytes are decoded into a
//! bitmap, painted 1:1 onto an off-screen surface of the same dimensions, and
//! handed to an [`Encoder`] together with the target format and quality. The
//! production encoder delegates JPEG to mozjpeg and PNG to the image crate's
//! encoder; no resampling happens anywhere, so output dimensions always equal
//! input dimensions.

use image::buffer::ConvertBuffer;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{imageops, GenericImageView, ImageEncoder as _, RgbImage, RgbaImage};
use log::debug;
use mozjpeg::{ColorSpace, Compress};

use crate::error::PanelError;
use crate::format::TargetFormat;

/// Off-screen pixel buffer carrying the decoded source image.
#[derive(Debug)]
pub struct Canvas {
    surface: RgbaImage,
}

impl Canvas {
    /// Decode `bytes` and paint the bitmap onto a fresh surface sized exactly
    /// to the bitmap's pixel dimensions.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, PanelError> {
        let bitmap = image::load_from_memory(bytes)?;
        let (width, height) = bitmap.dimensions();
        debug!("decoded bitmap {}x{}", width, height);

        let mut surface = RgbaImage::new(width, height);
        imageops::replace(&mut surface, &bitmap.to_rgba8(), 0, 0);
        Ok(Self { surface })
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }
}

/// Boundary to the platform's re-encode facility.
pub trait Encoder: Send + Sync {
    /// Re-encode the canvas at `quality` percent into `format`.
    fn encode(&self, canvas: &Canvas, format: TargetFormat, quality: u8)
        -> Result<Vec<u8>, PanelError>;
}

/// Production encoder: mozjpeg for JPEG, the image crate for PNG.
pub struct SystemEncoder;

impl Encoder for SystemEncoder {
    fn encode(
        &self,
        canvas: &Canvas,
        format: TargetFormat,
        quality: u8,
    ) -> Result<Vec<u8>, PanelError> {
        match format {
            TargetFormat::Jpeg => encode_jpeg(canvas, quality),
            TargetFormat::Png => encode_png(canvas, quality),
        }
    }
}

fn encode_jpeg(canvas: &Canvas, quality: u8) -> Result<Vec<u8>, PanelError> {
    // mozjpeg wants a raw RGB buffer.
    let rgb: RgbImage = canvas.surface.convert();

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(canvas.width() as usize, canvas.height() as usize);
    comp.set_quality(f32::from(quality));
    comp.set_optimize_coding(true); // better Huffman tables
    comp.set_progressive_mode();

    let mut started = comp
        .start_compress(Vec::new())
        .map_err(PanelError::JpegEncode)?;
    started
        .write_scanlines(rgb.as_raw())
        .map_err(PanelError::JpegEncode)?;
    started.finish().map_err(PanelError::JpegEncode)
}

fn encode_png(canvas: &Canvas, quality: u8) -> Result<Vec<u8>, PanelError> {
    // PNG is lossless; the quality slider picks how hard the encoder works.
    let compression = match quality {
        0..=40 => CompressionType::Best,
        41..=75 => CompressionType::Default,
        _ => CompressionType::Fast,
    };

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, compression, FilterType::Up);
    encoder
        .write_image(
            canvas.surface.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ColorType::Rgba8,
        )
        .map_err(PanelError::PngEncode)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_png;

    #[test]
    fn canvas_matches_bitmap_dimensions() {
        let canvas = Canvas::from_encoded(&sample_png(17, 9)).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (17, 9));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = Canvas::from_encoded(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PanelError::Decode(_)));
    }

    #[test]
    fn jpeg_output_decodes_to_same_dimensions() {
        let canvas = Canvas::from_encoded(&sample_png(32, 24)).unwrap();
        let jpeg = SystemEncoder.encode(&canvas, TargetFormat::Jpeg, 80).unwrap();
        assert!(!jpeg.is_empty());

        let round = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(round.dimensions(), (32, 24));
    }

    #[test]
    fn png_output_decodes_to_same_dimensions() {
        let canvas = Canvas::from_encoded(&sample_png(32, 24)).unwrap();
        let png = SystemEncoder.encode(&canvas, TargetFormat::Png, 40).unwrap();

        let round = image::load_from_memory(&png).unwrap();
        assert_eq!(round.dimensions(), (32, 24));
    }
}
