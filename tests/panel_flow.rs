//! End-to-end run of the panel against the real encoders.

use std::io::Cursor;

use image::{GenericImageView, Rgba, RgbaImage};

use imagesqueeze::{
    Intake, PanelConfig, PanelSession, PanelState, SelectedFile, SizeReadout, TargetFormat,
};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 8 % 256) as u8, (y * 8 % 256) as u8, 200, 255])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .expect("encoding fixture image");
    bytes
}

#[tokio::test]
async fn select_estimate_compress_download() {
    let (mut panel, mut events) = PanelSession::with_system_encoder(PanelConfig::default());

    let source = png_bytes(48, 32);
    let original_size = source.len() as u64;
    panel
        .select_file(
            Intake::Picker,
            SelectedFile {
                name: "photo.png".to_string(),
                media_type: "image/png".to_string(),
                bytes: source,
            },
        )
        .expect("picker accepts png");

    // The selector starts on the detected type; the user flips it to JPEG
    // and tightens the slider, which only moves the estimate.
    panel.set_target_format(TargetFormat::Jpeg);
    panel.set_quality(60).expect("60 is on the slider");
    match panel.readout() {
        Some(SizeReadout::Estimated { bytes, .. }) => {
            assert!((bytes - original_size as f64 * 0.9 * 0.6).abs() < 1e-6);
        }
        other => panic!("expected an estimate, got {:?}", other),
    }

    let job = panel.begin_compress().expect("a file is selected");
    let outcome = job.run().await;
    panel.finish_compress(outcome);

    assert_eq!(panel.state(), PanelState::Compressed);
    let (width, height, size_bytes, download_name) = {
        let compressed = panel.compressed().expect("compressed artifact");
        (
            compressed.width,
            compressed.height,
            compressed.size_bytes,
            compressed.download_name.clone(),
        )
    };
    assert_eq!((width, height), (48, 32), "no resampling may happen");
    assert_eq!(download_name, "compressed.jpeg");

    // The readout now carries the encoder's measured output size.
    match panel.readout() {
        Some(SizeReadout::Actual { bytes, .. }) => assert_eq!(bytes, size_bytes),
        other => panic!("expected the actual size, got {:?}", other),
    }

    // The downloadable bytes are a decodable JPEG with the source dimensions.
    let bytes = panel.compressed_bytes().expect("download bytes");
    let decoded = image::load_from_memory(&bytes).expect("valid jpeg");
    assert_eq!(decoded.dimensions(), (48, 32));
    assert_eq!(bytes.len() as u64, size_bytes);

    // Events arrived in panel order.
    let mut seen = Vec::new();
    while let Ok(ev) = events.try_recv() {
        seen.push(ev);
    }
    assert!(!seen.is_empty());
}
