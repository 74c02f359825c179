use std::fmt;

use serde::Serialize;

/// Output format the panel can re-encode into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Jpeg,
    Png,
}

impl TargetFormat {
    /// Derive the target format from a file's declared media type.
    ///
    /// Anything that does not mention "png" is treated as JPEG, matching the
    /// picker's auto-detection. Dropped files with arbitrary types therefore
    /// land on the JPEG path and are sorted out at decode time.
    pub fn from_media_type(media_type: &str) -> Self {
        if media_type.contains("png") {
            TargetFormat::Png
        } else {
            TargetFormat::Jpeg
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
        }
    }

    /// Filename offered for the encoded result.
    pub fn download_name(self) -> String {
        format!("compressed.{}", self.extension())
    }

    pub fn toggled(self) -> Self {
        match self {
            TargetFormat::Jpeg => TargetFormat::Png,
            TargetFormat::Png => TargetFormat::Jpeg,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_from_media_type() {
        assert_eq!(TargetFormat::from_media_type("image/png"), TargetFormat::Png);
        assert_eq!(TargetFormat::from_media_type("image/x-png"), TargetFormat::Png);
    }

    #[test]
    fn everything_else_is_jpeg() {
        assert_eq!(TargetFormat::from_media_type("image/jpeg"), TargetFormat::Jpeg);
        assert_eq!(TargetFormat::from_media_type("text/plain"), TargetFormat::Jpeg);
        assert_eq!(TargetFormat::from_media_type(""), TargetFormat::Jpeg);
    }

    #[test]
    fn download_names() {
        assert_eq!(TargetFormat::Jpeg.download_name(), "compressed.jpeg");
        assert_eq!(TargetFormat::Png.download_name(), "compressed.png");
    }
}
