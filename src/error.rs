use thiserror::Error;

use crate::config::{QUALITY_MAX, QUALITY_MIN};

/// Everything that can go wrong inside the panel.
#[derive(Debug, Error)]
pub enum PanelError {
    /// The selected or dropped bytes could not be interpreted as an image.
    #[error("could not decode image data: {0}")]
    Decode(#[from] image::ImageError),

    /// The picker refused the file's declared media type. Drag-and-drop
    /// intake never produces this.
    #[error("media type '{0}' is not accepted")]
    RejectedByPicker(String),

    #[error("file is {size} bytes, over the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },

    #[error("quality {0} is outside {QUALITY_MIN}..={QUALITY_MAX}")]
    QualityOutOfRange(u8),

    #[error("jpeg encoder failed: {0}")]
    JpegEncode(std::io::Error),

    #[error("png encoder failed: {0}")]
    PngEncode(image::ImageError),

    #[error("compression canceled")]
    Canceled,

    /// The background encode task died before producing an outcome.
    #[error("compression task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
