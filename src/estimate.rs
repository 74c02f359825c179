//! Pre-encode size prediction.
//!
//! The estimate is shown while the user drags the quality slider, before any
//! real encoding happens. It is a closed-form guess from the original byte
//! count alone and is expected to diverge from what the encoder actually
//! produces; the panel replaces it with the measured size after a real
//! compression.

use crate::config::EstimatorProfile;
use crate::format::TargetFormat;

/// Predicted output size in bytes for re-encoding `original_bytes` at
/// `quality` percent.
pub fn estimate_bytes(
    profile: &EstimatorProfile,
    original_bytes: u64,
    quality: u8,
    format: TargetFormat,
) -> f64 {
    let q = f64::from(quality) / 100.0;
    let ratio = match format {
        TargetFormat::Jpeg => profile.jpeg_headroom * q,
        // PNG responds weakly to quality: best case `best_ratio`, worst case
        // `best_ratio - quality_span`.
        TargetFormat::Png => profile.png_best_ratio - profile.png_quality_span * (1.0 - q),
    };
    original_bytes as f64 * ratio
}

/// Percentage saved relative to the original, rounded to the nearest integer.
pub fn savings_percent(original_bytes: u64, result_bytes: f64) -> i32 {
    if original_bytes == 0 {
        return 0;
    }
    let saved = 100.0 * (original_bytes as f64 - result_bytes) / original_bytes as f64;
    saved.round() as i32
}

/// Bytes expressed in KB for display.
pub fn to_kb(bytes: f64) -> f64 {
    bytes / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QUALITY_MAX, QUALITY_MIN};

    fn profile() -> EstimatorProfile {
        EstimatorProfile::default()
    }

    #[test]
    fn jpeg_estimate_never_exceeds_original() {
        let original = 1_234_567;
        for q in QUALITY_MIN..=QUALITY_MAX {
            let est = estimate_bytes(&profile(), original, q, TargetFormat::Jpeg);
            assert!(
                est <= original as f64,
                "quality {} estimated {} above original {}",
                q,
                est,
                original
            );
        }
    }

    #[test]
    fn jpeg_estimate_is_non_decreasing_in_quality() {
        let original = 500_000;
        let mut prev = 0.0;
        for q in QUALITY_MIN..=QUALITY_MAX {
            let est = estimate_bytes(&profile(), original, q, TargetFormat::Jpeg);
            assert!(est >= prev, "estimate dropped between {} and {}", q - 1, q);
            prev = est;
        }
    }

    #[test]
    fn refined_jpeg_formula_at_quality_80() {
        // 1024x768 photo weighing 150 000 bytes: 0.9 * 0.8 of the original.
        let est = estimate_bytes(&profile(), 150_000, 80, TargetFormat::Jpeg);
        assert!((est - 150_000.0 * 0.9 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn png_formula_spans_the_documented_range() {
        let original = 100_000;
        let worst = estimate_bytes(&profile(), original, QUALITY_MIN, TargetFormat::Png);
        let best = estimate_bytes(&profile(), original, QUALITY_MAX, TargetFormat::Png);
        // 0.9 - 0.2 * (1 - 0.1) = 0.72 at the bottom of the slider.
        assert!((worst - 72_000.0).abs() < 1e-6);
        assert!((best - 90_000.0).abs() < 1e-6);
    }

    #[test]
    fn savings_round_to_nearest_percent() {
        assert_eq!(savings_percent(100_000, 72_000.0), 28);
        assert_eq!(savings_percent(3, 2.0), 33);
        assert_eq!(savings_percent(0, 0.0), 0);
    }
}
