//! imagesqueeze: a single-image JPEG/PNG recompression panel.
//!
//! The panel takes one image, shows a live size estimate while the quality
//! slider moves, then performs a real re-encode (mozjpeg for JPEG, the image
//! crate for PNG) and reports the measured output size next to a
//! `compressed.<ext>` download artifact. Pixels are never resampled; output
//! dimensions always equal input dimensions.

pub mod blob;
pub mod config;
pub mod encoder;
pub mod error;
pub mod estimate;
pub mod format;
pub mod panel;

#[cfg(test)]
mod testutil;

pub use blob::{BlobStore, BlobUrl};
pub use config::{EstimatorProfile, PanelConfig, QUALITY_MAX, QUALITY_MIN};
pub use encoder::{Canvas, Encoder, SystemEncoder};
pub use error::PanelError;
pub use format::TargetFormat;
pub use panel::{
    CompressJob, CompressOutcome, Intake, PanelEvent, PanelSession, PanelState, SelectedFile,
    SizeReadout,
};
