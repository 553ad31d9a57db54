use super::*;

/// Deterministic zero-mean noise of roughly uniform amplitude `amp`.
fn add_noise(field: &Field16, amp: i32, seed: u32) -> Field16 {
    let mut state = seed;
    let data = field
        .data()
        .iter()
        .map(|&v| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let unit = ((state >> 16) & 0x7fff) as i32 - 16_384;
            let noise = unit * amp / 16_384;
            (v as i32 + noise).clamp(0, 65535) as u16
        })
        .collect();
    Field16::new(field.width(), field.height(), data).unwrap()
}

fn mid_gray_texture() -> Field16 {
    Field16::from_fn(32, 24, |x, y| (20_000 + x * 300 + y * 200) as u16).unwrap()
}

// ========================================================================
// PSNR Tests
// ========================================================================

#[test]
fn test_psnr_identical_is_infinite() {
    let field = mid_gray_texture();
    let value = psnr(&field, &field).unwrap();
    assert!(value.is_infinite() && value > 0.0);
}

#[test]
fn test_psnr_known_value() {
    // Constant offset of 65535 / 100 gives mse = peak^2 / 10_000 -> 40 dB
    let a = Field16::filled(10, 10, 10_000).unwrap();
    let b = Field16::filled(10, 10, 10_000 + 655).unwrap();
    let expected = 10.0 * (PEAK * PEAK / (655.0 * 655.0)).log10();
    assert!((psnr(&a, &b).unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_psnr_decreases_with_noise() {
    let field = mid_gray_texture();
    let mut previous = f64::INFINITY;
    for amp in [50, 200, 800, 3_200] {
        let noisy = add_noise(&field, amp, 99);
        let value = psnr(&field, &noisy).unwrap();
        assert!(value < previous, "amp {} gave {} after {}", amp, value, previous);
        previous = value;
    }
}

#[test]
fn test_psnr_shape_mismatch() {
    let a = Field16::zeros(4, 4).unwrap();
    let b = Field16::zeros(4, 5).unwrap();
    assert!(matches!(
        psnr(&a, &b),
        Err(Error::ShapeMismatch {
            expected: (4, 4),
            actual: (4, 5)
        })
    ));
}

// ========================================================================
// SSIM Tests
// ========================================================================

#[test]
fn test_ssim_identical_is_one() {
    let field = mid_gray_texture();
    assert!((ssim(&field, &field).unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn test_ssim_identical_constant_is_one() {
    let field = Field16::filled(5, 5, 12_345).unwrap();
    assert!((ssim(&field, &field).unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn test_ssim_drops_with_noise() {
    let field = mid_gray_texture();
    let light = ssim(&field, &add_noise(&field, 500, 1)).unwrap();
    let heavy = ssim(&field, &add_noise(&field, 8_000, 1)).unwrap();
    assert!(light < 1.0);
    assert!(heavy < light);
}

#[test]
fn test_ssim_single_pixel_is_degenerate() {
    let a = Field16::filled(1, 1, 7).unwrap();
    assert!(matches!(ssim(&a, &a), Err(Error::DegenerateInput(_))));
}

// ========================================================================
// Spatial frequency Tests
// ========================================================================

#[test]
fn test_spatial_frequency_constant_is_zero() {
    let field = Field16::filled(6, 9, 40_000).unwrap();
    assert_eq!(spatial_frequency(&field), 0.0);
}

#[test]
fn test_spatial_frequency_known_value() {
    // Horizontal steps of 10, no vertical change: rf = 10, cf = 0
    let field = Field16::from_fn(5, 3, |x, _| (x * 10) as u16).unwrap();
    assert!((spatial_frequency(&field) - 10.0).abs() < 1e-12);

    // Both directions: rf = 3, cf = 4 -> 5
    let field = Field16::from_fn(4, 4, |x, y| (x * 3 + y * 4) as u16).unwrap();
    assert!((spatial_frequency(&field) - 5.0).abs() < 1e-12);
}

#[test]
fn test_spatial_frequency_single_column() {
    let field = Field16::from_fn(1, 4, |_, y| (y * 100) as u16).unwrap();
    assert!((spatial_frequency(&field) - 100.0).abs() < 1e-12);
}

// ========================================================================
// assess_quality Tests
// ========================================================================

#[test]
fn test_assess_quality_combines_metrics() {
    let a = mid_gray_texture();
    let b = add_noise(&a, 400, 5);
    let metrics = assess_quality(&a, &b).unwrap();

    assert_eq!(metrics.psnr, psnr(&a, &b).unwrap());
    assert_eq!(metrics.ssim, ssim(&a, &b).unwrap());
    assert_eq!(metrics.spatial_frequency_original, spatial_frequency(&a));
    assert_eq!(metrics.spatial_frequency_processed, spatial_frequency(&b));
    assert!(metrics.spatial_frequency_gain() > 0.0);
}

#[test]
fn test_assess_quality_shape_mismatch() {
    let a = Field16::zeros(3, 3).unwrap();
    let b = Field16::zeros(2, 3).unwrap();
    assert!(matches!(
        assess_quality(&a, &b),
        Err(Error::ShapeMismatch { .. })
    ));
}
