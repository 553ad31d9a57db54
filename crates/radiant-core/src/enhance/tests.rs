//! Tests for the enhancement entry points

use super::*;
use crate::parallel::{with_thread_count, PARALLEL_THRESHOLD};
use crate::quality::assess_quality;

/// Deterministic pseudo-random texture (LCG) so runs are reproducible.
fn textured_field(width: u32, height: u32, seed: u32) -> Field16 {
    let mut state = seed;
    Field16::from_fn(width, height, |x, y| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let noise = state >> 20; // 0..4096
        let ramp = (x * 40_000 / width) + (y * 8_000 / height);
        (ramp + noise).min(65535) as u16
    })
    .unwrap()
}

fn ramp_4x4() -> Field16 {
    Field16::from_fn(4, 4, |x, y| ((y * 4 + x) * 10_000).min(65535) as u16).unwrap()
}

// ========================================================================
// EnhancementConfig Tests
// ========================================================================

#[test]
fn test_config_defaults() {
    let config = EnhancementConfig::default();
    assert!((config.strength - 5.0).abs() < f32::EPSILON);
    assert_eq!(config.scale_levels, 3);
}

#[test]
fn test_effective_levels_clamped() {
    assert_eq!(EnhancementConfig::new(5.0, 0).effective_levels(), 2);
    assert_eq!(EnhancementConfig::new(5.0, 1).effective_levels(), 2);
    assert_eq!(EnhancementConfig::new(5.0, 4).effective_levels(), 4);
    assert_eq!(EnhancementConfig::new(5.0, 10).effective_levels(), 5);
}

#[test]
fn test_invalid_strength_rejected() {
    let field = ramp_4x4();
    for strength in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let result = enhance(&field, &EnhancementConfig::new(strength, 3));
        assert!(
            matches!(result, Err(Error::InvalidArgument(_))),
            "strength {} accepted",
            strength
        );
    }
}

// ========================================================================
// enhance Tests
// ========================================================================

#[test]
fn test_ramp_end_to_end() {
    let field = ramp_4x4();
    let output = enhance(&field, &EnhancementConfig::new(5.0, 3)).unwrap();

    assert_eq!(output.enhanced.dimensions(), (4, 4));
    assert_eq!(output.original, field);

    let metrics = assess_quality(&output.original, &output.enhanced).unwrap();
    assert!(metrics.ssim > 0.0, "ssim {}", metrics.ssim);
    assert!(metrics.ssim <= 1.0 + 1e-12, "ssim {}", metrics.ssim);
    assert!(metrics.spatial_frequency_processed >= 0.0);
}

#[test]
fn test_constant_field_unchanged() {
    let field = Field16::filled(9, 7, 30_000).unwrap();
    let output = enhance(&field, &EnhancementConfig::default()).unwrap();

    for &v in output.enhanced.data() {
        assert!((v as i32 - 30_000).abs() <= 1, "got {}", v);
    }
}

#[test]
fn test_enhance_is_deterministic() {
    let field = textured_field(24, 18, 7);
    let config = EnhancementConfig::new(6.0, 4);

    let first = enhance(&field, &config).unwrap();
    let second = enhance(&field, &config).unwrap();

    assert_eq!(first.enhanced, second.enhanced);
}

#[test]
fn test_enhance_identical_across_thread_counts() {
    // Large enough to take the parallel path
    let width = 272;
    let height = (PARALLEL_THRESHOLD as u32 / width) + 8;
    let field = textured_field(width, height, 42);
    let config = EnhancementConfig::new(5.0, 2);

    let single = with_thread_count(1, || enhance(&field, &config))
        .unwrap()
        .unwrap();
    let multi = with_thread_count(4, || enhance(&field, &config))
        .unwrap()
        .unwrap();

    assert_eq!(single.enhanced, multi.enhanced);
}

#[test]
fn test_requested_levels_clamped() {
    let field = textured_field(12, 10, 3);

    let one = enhance(&field, &EnhancementConfig::new(5.0, 1)).unwrap();
    let two = enhance(&field, &EnhancementConfig::new(5.0, 2)).unwrap();
    assert_eq!(one.enhanced, two.enhanced);

    let ten = enhance(&field, &EnhancementConfig::new(5.0, 10)).unwrap();
    let five = enhance(&field, &EnhancementConfig::new(5.0, 5)).unwrap();
    assert_eq!(ten.enhanced, five.enhanced);
}

#[test]
fn test_enhancement_raises_spatial_frequency() {
    let field = textured_field(32, 32, 11);
    let output = enhance(&field, &EnhancementConfig::new(8.0, 3)).unwrap();
    let metrics = assess_quality(&output.original, &output.enhanced).unwrap();

    assert!(
        metrics.spatial_frequency_processed > metrics.spatial_frequency_original,
        "sf before {} after {}",
        metrics.spatial_frequency_original,
        metrics.spatial_frequency_processed
    );
}

// ========================================================================
// Polarity and cancellation Tests
// ========================================================================

#[test]
fn test_enhance_dicom_inverts_first() {
    let field = ramp_4x4();
    let output = enhance_dicom(&field, &EnhancementConfig::default()).unwrap();

    assert_eq!(output.original, crate::field::invert_polarity(&field));

    let via_inverted = enhance(&output.original, &EnhancementConfig::default()).unwrap();
    assert_eq!(output.enhanced, via_inverted.enhanced);
}

#[test]
fn test_enhance_with_raised_flag_is_cancelled() {
    let field = ramp_4x4();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let result = enhance_with_cancel(
        &field,
        &EnhancementConfig::default(),
        Polarity::Normal,
        &cancel,
    );
    assert!(matches!(result, Err(Error::Cancelled)));
}
