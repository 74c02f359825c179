use std::env;

/// Slider bounds exposed by the UI.
pub const QUALITY_MIN: u8 = 10;
pub const QUALITY_MAX: u8 = 100;

/// Delay before the compressed result is brought into view.
pub const REVEAL_DELAY_MS: u64 = 200;

/// Coefficients for the pre-encode size estimate.
///
/// These are the "refined" placeholder formulas, not measured regressions:
/// JPEG shrinks to `headroom * quality`, PNG responds weakly to quality and
/// never drops below `best_ratio - quality_span` of the original.
#[derive(Debug, Clone, Copy)]
pub struct EstimatorProfile {
    pub jpeg_headroom: f64,
    pub png_best_ratio: f64,
    pub png_quality_span: f64,
}

impl Default for EstimatorProfile {
    fn default() -> Self {
        Self {
            jpeg_headroom: 0.9,
            png_best_ratio: 0.9,
            png_quality_span: 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Upper bound on accepted input files, in bytes.
    pub max_file_size: usize,
    /// Media types the picker filter admits. Drag-and-drop ignores this.
    pub accepted_media_types: Vec<String>,
    pub default_quality: u8,
    pub estimator: EstimatorProfile,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            max_file_size: 12 * 1024 * 1024,
            accepted_media_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
            default_quality: 80,
            estimator: EstimatorProfile::default(),
        }
    }
}

impl PanelConfig {
    /// Build the config from the environment, falling back to defaults.
    ///
    /// `MAX_FILE_SIZE` is in megabytes, `ACCEPTED_TYPES` is a comma-separated
    /// media type list, `DEFAULT_QUALITY` is a percent inside the slider
    /// range.
    pub fn from_env() -> Self {
        let max_file_size = env::var("MAX_FILE_SIZE")
            .unwrap_or_else(|_| "12".to_string())
            .parse::<usize>()
            .unwrap_or(12)
            * 1024
            * 1024;

        let accepted_media_types: Vec<String> = env::var("ACCEPTED_TYPES")
            .unwrap_or_else(|_| "image/jpeg,image/png".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let default_quality = env::var("DEFAULT_QUALITY")
            .unwrap_or_else(|_| "80".to_string())
            .parse::<u8>()
            .unwrap_or(80)
            .clamp(QUALITY_MIN, QUALITY_MAX);

        Self {
            max_file_size,
            accepted_media_types,
            default_quality,
            estimator: EstimatorProfile::default(),
        }
    }

    pub fn accepts_media_type(&self, media_type: &str) -> bool {
        self.accepted_media_types.iter().any(|t| t == media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_picker_filter() {
        let config = PanelConfig::default();
        assert!(config.accepts_media_type("image/jpeg"));
        assert!(config.accepts_media_type("image/png"));
        assert!(!config.accepts_media_type("image/webp"));
        assert!(!config.accepts_media_type("text/plain"));
    }

    #[test]
    fn default_quality_inside_slider_range() {
        let config = PanelConfig::default();
        assert!((QUALITY_MIN..=QUALITY_MAX).contains(&config.default_quality));
    }
}
