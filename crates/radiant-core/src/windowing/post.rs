//! 8-bit display post-processing
//!
//! Optional stages applied in a fixed order after the LUT:
//! 1. tiled local contrast equalization with a clip limit (CLAHE)
//! 2. unsharp-mask sharpening
//! 3. median-filter denoising
//!
//! Every stage reads an immutable source and writes a fresh buffer row by
//! row, replacing the field it was given.

use log::debug;

use super::WindowingConfig;
use crate::field::Field8;
use crate::parallel::for_each_row_mut;

/// Gaussian sigma of the unsharp-mask blur.
pub const SHARPEN_SIGMA: f32 = 1.0;

const GRAY_LEVELS: usize = 256;

/// Run the enabled post-processing stages in order.
pub fn post_process(mut field: Field8, config: &WindowingConfig) -> Field8 {
    if !config.apply_post_processing {
        return field;
    }

    if config.use_local_contrast {
        let [tiles_x, tiles_y] = config.local_contrast_tile_grid;
        field = equalize_local_contrast(&field, tiles_x, tiles_y, config.local_contrast_clip_limit);
        debug!("local contrast: {}x{} tiles, clip {}", tiles_x, tiles_y, config.local_contrast_clip_limit);
    }
    if config.sharpening_amount > 0.0 {
        field = unsharp_mask(&field, config.sharpening_amount);
        debug!("sharpened with amount {}", config.sharpening_amount);
    }
    if config.noise_reduction > 0 {
        let kernel = median_kernel_size(config.noise_reduction);
        field = median_filter(&field, kernel);
        debug!("median denoise with {}x{} kernel", kernel, kernel);
    }
    field
}

/// Median kernel side for a noise-reduction level: `3 + (level - 1) * 2`.
pub fn median_kernel_size(level: u32) -> usize {
    3 + (level.max(1) as usize - 1) * 2
}

// ============================================================
// Local contrast (CLAHE)
// ============================================================

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `tiles_x` x `tiles_y` grid. Each tile's
/// histogram is clipped at `clip_limit` times the uniform bin count, the
/// excess is spread evenly over all bins, and the tile's CDF becomes its
/// LUT. Pixels blend the LUTs of the four nearest tile centres bilinearly.
pub fn equalize_local_contrast(field: &Field8, tiles_x: u32, tiles_y: u32, clip_limit: f32) -> Field8 {
    let w = field.width() as usize;
    let h = field.height() as usize;
    let tile_w = w.div_ceil(tiles_x.max(1) as usize).max(1);
    let tile_h = h.div_ceil(tiles_y.max(1) as usize).max(1);
    let cols = w.div_ceil(tile_w);
    let rows = h.div_ceil(tile_h);
    let src = field.data();

    let mut tile_luts = vec![[0u8; GRAY_LEVELS]; cols * rows];
    for ty in 0..rows {
        for tx in 0..cols {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            let area = (x1 - x0) * (y1 - y0);

            let mut hist = [0u32; GRAY_LEVELS];
            for y in y0..y1 {
                for &v in &src[y * w + x0..y * w + x1] {
                    hist[v as usize] += 1;
                }
            }
            if clip_limit > 0.0 {
                clip_histogram(&mut hist, area, clip_limit);
            }
            tile_luts[ty * cols + tx] = cdf_lut(&hist, area);
        }
    }

    let centre_x = |tx: usize| (tx as f32 + 0.5) * tile_w as f32;
    let centre_y = |ty: usize| (ty as f32 + 0.5) * tile_h as f32;

    let mut out = vec![0u8; src.len()];
    for_each_row_mut(&mut out, w, |y, row| {
        let py = y as f32;
        let fy = py / tile_h as f32 - 0.5;
        let ty0 = (fy.floor().max(0.0) as usize).min(rows - 1);
        let ty1 = (ty0 + 1).min(rows - 1);
        let ay = if ty0 == ty1 {
            0.0
        } else {
            ((py - centre_y(ty0)) / (centre_y(ty1) - centre_y(ty0))).clamp(0.0, 1.0)
        };

        for (x, dst) in row.iter_mut().enumerate() {
            let px = x as f32;
            let fx = px / tile_w as f32 - 0.5;
            let tx0 = (fx.floor().max(0.0) as usize).min(cols - 1);
            let tx1 = (tx0 + 1).min(cols - 1);
            let ax = if tx0 == tx1 {
                0.0
            } else {
                ((px - centre_x(tx0)) / (centre_x(tx1) - centre_x(tx0))).clamp(0.0, 1.0)
            };

            let v = src[y * w + x] as usize;
            let v00 = tile_luts[ty0 * cols + tx0][v] as f32;
            let v10 = tile_luts[ty0 * cols + tx1][v] as f32;
            let v01 = tile_luts[ty1 * cols + tx0][v] as f32;
            let v11 = tile_luts[ty1 * cols + tx1][v] as f32;

            let value = v00 * (1.0 - ax) * (1.0 - ay)
                + v10 * ax * (1.0 - ay)
                + v01 * (1.0 - ax) * ay
                + v11 * ax * ay;
            *dst = value.round().clamp(0.0, 255.0) as u8;
        }
    });

    field.with_data(out)
}

/// Clip bins at `clip_multiplier * area / 256` and spread the excess evenly.
fn clip_histogram(hist: &mut [u32; GRAY_LEVELS], area: usize, clip_multiplier: f32) {
    let clip = ((area as f32 / GRAY_LEVELS as f32) * clip_multiplier).ceil().max(1.0) as u32;

    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    let per_bin = excess / GRAY_LEVELS as u32;
    let remainder = (excess % GRAY_LEVELS as u32) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += per_bin;
        if i < remainder {
            *bin += 1;
        }
    }
}

/// `lut[i] = round((cdf[i] - cdf_min) * 255 / (area - cdf_min))`
///
/// `cdf_min` is the first non-zero CDF value, so the darkest occupied level
/// maps to 0. A tile holding a single level maps everything to 0.
fn cdf_lut(hist: &[u32; GRAY_LEVELS], area: usize) -> [u8; GRAY_LEVELS] {
    let mut cdf = [0u32; GRAY_LEVELS];
    let mut running = 0u32;
    for (c, &count) in cdf.iter_mut().zip(hist.iter()) {
        running += count;
        *c = running;
    }

    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    let mut lut = [0u8; GRAY_LEVELS];
    let denom = area as f32 - cdf_min as f32;
    if denom <= 0.0 {
        return lut;
    }

    for (entry, &c) in lut.iter_mut().zip(cdf.iter()) {
        let value = (c as f32 - cdf_min as f32) / denom * 255.0;
        *entry = value.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

// ============================================================
// Unsharp mask
// ============================================================

/// `out = image * (1 + amount) - blurred * amount`
pub fn unsharp_mask(field: &Field8, amount: f32) -> Field8 {
    let blurred = gaussian_blur(field, SHARPEN_SIGMA);
    let w = field.width() as usize;
    let src = field.data();

    let mut out = vec![0u8; src.len()];
    for_each_row_mut(&mut out, w, |y, row| {
        let offset = y * w;
        for (x, dst) in row.iter_mut().enumerate() {
            let value = src[offset + x] as f32 * (1.0 + amount) - blurred[offset + x] * amount;
            *dst = value.round().clamp(0.0, 255.0) as u8;
        }
    });

    field.with_data(out)
}

/// Normalized 1-D Gaussian taps of radius `ceil(3 * sigma)`.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil() as isize;
    let coeff = -1.0 / (2.0 * sigma * sigma);
    let taps: Vec<f32> = (-radius..=radius)
        .map(|i| (coeff * (i * i) as f32).exp())
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

/// Separable Gaussian blur with replicated edges, returned as floats.
fn gaussian_blur(field: &Field8, sigma: f32) -> Vec<f32> {
    let w = field.width() as usize;
    let h = field.height() as usize;
    let src = field.data();
    let taps = gaussian_kernel(sigma);
    let radius = (taps.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; src.len()];
    for_each_row_mut(&mut horizontal, w, |y, row| {
        let src_row = &src[y * w..(y + 1) * w];
        for (x, dst) in row.iter_mut().enumerate() {
            *dst = taps
                .iter()
                .enumerate()
                .map(|(k, &tap)| {
                    let nx = (x as isize + k as isize - radius).clamp(0, w as isize - 1);
                    tap * src_row[nx as usize] as f32
                })
                .sum();
        }
    });

    let mut blurred = vec![0.0f32; src.len()];
    for_each_row_mut(&mut blurred, w, |y, row| {
        for (x, dst) in row.iter_mut().enumerate() {
            *dst = taps
                .iter()
                .enumerate()
                .map(|(k, &tap)| {
                    let ny = (y as isize + k as isize - radius).clamp(0, h as isize - 1);
                    tap * horizontal[ny as usize * w + x]
                })
                .sum();
        }
    });

    blurred
}

// ============================================================
// Median filter
// ============================================================

/// Square median filter of side `kernel` (odd) with replicated edges.
pub fn median_filter(field: &Field8, kernel: usize) -> Field8 {
    let w = field.width() as usize;
    let h = field.height() as usize;
    let src = field.data();
    let radius = (kernel / 2) as isize;
    let mid = (kernel * kernel) / 2;

    let mut out = vec![0u8; src.len()];
    for_each_row_mut(&mut out, w, |y, row| {
        let mut window = Vec::with_capacity(kernel * kernel);
        for (x, dst) in row.iter_mut().enumerate() {
            window.clear();
            for dy in -radius..=radius {
                let ny = (y as isize + dy).clamp(0, h as isize - 1) as usize;
                for dx in -radius..=radius {
                    let nx = (x as isize + dx).clamp(0, w as isize - 1) as usize;
                    window.push(src[ny * w + nx]);
                }
            }
            let (_, median, _) = window.select_nth_unstable(mid);
            *dst = *median;
        }
    });

    field.with_data(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_kernel_size() {
        assert_eq!(median_kernel_size(1), 3);
        assert_eq!(median_kernel_size(2), 5);
        assert_eq!(median_kernel_size(3), 7);
    }

    #[test]
    fn test_median_removes_salt() {
        let mut data = vec![100u8; 25];
        data[12] = 255;
        let field = Field8::new(5, 5, data).unwrap();

        let out = median_filter(&field, 3);
        assert!(out.data().iter().all(|&v| v == 100));
    }

    #[test]
    fn test_median_keeps_step_edge() {
        let field = Field8::from_fn(6, 6, |x, _| if x < 3 { 10 } else { 200 }).unwrap();
        let out = median_filter(&field, 3);
        assert_eq!(out, field);
    }

    #[test]
    fn test_unsharp_mask_constant_field() {
        let field = Field8::filled(6, 4, 90).unwrap();
        let out = unsharp_mask(&field, 0.5);
        assert_eq!(out, field);
    }

    #[test]
    fn test_unsharp_mask_increases_edge_contrast() {
        let field = Field8::from_fn(12, 4, |x, _| if x < 6 { 80 } else { 160 }).unwrap();
        let out = unsharp_mask(&field, 1.0);

        // Overshoot on both sides of the edge
        assert!(out.get(5, 2).copied().unwrap() < 80);
        assert!(out.get(6, 2).copied().unwrap() > 160);
        // Far from the edge nothing changes
        assert_eq!(out.get(0, 2), Some(&80));
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        let taps = gaussian_kernel(1.0);
        assert_eq!(taps.len(), 7);
        assert!((taps.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(taps[3] > taps[2]);
    }

    #[test]
    fn test_clip_histogram_preserves_total() {
        let mut hist = [0u32; GRAY_LEVELS];
        hist[10] = 1000;
        hist[20] = 24;
        clip_histogram(&mut hist, 1024, 2.0);

        assert_eq!(hist.iter().sum::<u32>(), 1024);
        // Clip value is 8, so no bin holds more than 8 + redistributed share
        assert!(hist.iter().all(|&c| c <= 8 + 5));
    }

    #[test]
    fn test_local_contrast_stretches_narrow_range() {
        // Values confined to 100..=131 spread toward the full range
        let field = Field8::from_fn(64, 64, |x, y| (100 + (x + y) % 32) as u8).unwrap();
        let out = equalize_local_contrast(&field, 8, 8, 40.0);

        let (lo, hi) = out
            .data()
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        assert!(hi - lo > 100, "range {}..{}", lo, hi);
    }

    #[test]
    fn test_cdf_lut_darkest_level_maps_to_zero() {
        let mut hist = [0u32; GRAY_LEVELS];
        hist[40] = 2;
        hist[41] = 2;
        let lut = cdf_lut(&hist, 4);
        assert_eq!(lut[40], 0);
        assert_eq!(lut[41], 255);
        assert_eq!(lut[0], 0);
    }

    #[test]
    fn test_local_contrast_tiny_field() {
        // More tiles than pixels must still work
        let field = Field8::new(2, 2, vec![0, 50, 100, 150]).unwrap();
        let out = equalize_local_contrast(&field, 8, 8, 2.5);
        assert_eq!(out.dimensions(), (2, 2));
    }

    #[test]
    fn test_post_process_disabled_is_identity() {
        let field = Field8::from_fn(8, 8, |x, y| (x * 30 + y) as u8).unwrap();
        let config = WindowingConfig {
            apply_post_processing: false,
            ..WindowingConfig::default()
        };
        assert_eq!(post_process(field.clone(), &config), field);
    }

    #[test]
    fn test_post_process_all_zero_stays_zero() {
        let field = Field8::zeros(16, 16).unwrap();
        let out = post_process(field.clone(), &WindowingConfig::default());
        assert_eq!(out, field);
    }
}
