//! Objective quality metrics
//!
//! Full-reference fidelity between an original and a processed 16-bit field
//! (PSNR, global SSIM) and a no-reference sharpness measure (spatial
//! frequency). Sums are accumulated per row in f64 and combined in row order.

#[cfg(test)]
mod tests;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::{Field16, MAX_SAMPLE};
use crate::parallel::map_rows;

/// Peak sample value used by PSNR and the SSIM constants.
const PEAK: f64 = MAX_SAMPLE as f64;

/// SSIM luminance stabilizer `(0.01 * peak)^2`.
pub const SSIM_C1: f64 = (0.01 * PEAK) * (0.01 * PEAK);
/// SSIM contrast stabilizer `(0.03 * peak)^2`.
pub const SSIM_C2: f64 = (0.03 * PEAK) * (0.03 * PEAK);

/// Metrics for one original/processed pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Peak signal-to-noise ratio in dB; infinite for identical fields
    pub psnr: f64,
    pub ssim: f64,
    pub spatial_frequency_original: f64,
    pub spatial_frequency_processed: f64,
}

impl QualityMetrics {
    /// Spatial frequency gained by processing.
    pub fn spatial_frequency_gain(&self) -> f64 {
        self.spatial_frequency_processed - self.spatial_frequency_original
    }
}

/// Compute every metric for a pair of same-shape fields.
pub fn assess_quality(original: &Field16, processed: &Field16) -> Result<QualityMetrics> {
    original.ensure_same_shape(processed)?;

    let metrics = QualityMetrics {
        psnr: psnr(original, processed)?,
        ssim: ssim(original, processed)?,
        spatial_frequency_original: spatial_frequency(original),
        spatial_frequency_processed: spatial_frequency(processed),
    };
    debug!(
        "psnr {:.2} dB, ssim {:.4}, sf {:.2} -> {:.2}",
        metrics.psnr,
        metrics.ssim,
        metrics.spatial_frequency_original,
        metrics.spatial_frequency_processed
    );
    Ok(metrics)
}

/// Peak signal-to-noise ratio in dB.
///
/// Returns `f64::INFINITY` when the fields are identical.
pub fn psnr(a: &Field16, b: &Field16) -> Result<f64> {
    a.ensure_same_shape(b)?;
    let width = a.width() as usize;
    let other = b.data();

    let row_sums = map_rows(a.data(), width, |y, row| {
        let other_row = &other[y * width..(y + 1) * width];
        row.iter()
            .zip(other_row)
            .map(|(&p, &q)| {
                let d = p as f64 - q as f64;
                d * d
            })
            .sum::<f64>()
    });
    let mse = row_sums.iter().sum::<f64>() / a.len() as f64;

    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (PEAK * PEAK / mse).log10())
}

/// Global structural similarity over the whole field.
///
/// Means, unbiased variances and covariance are taken over all pixels.
/// Needs at least two pixels for the `N - 1` estimates.
pub fn ssim(a: &Field16, b: &Field16) -> Result<f64> {
    a.ensure_same_shape(b)?;
    let n = a.len();
    if n < 2 {
        return Err(Error::DegenerateInput(format!(
            "SSIM needs at least 2 pixels, got {}",
            n
        )));
    }
    let width = a.width() as usize;
    let other = b.data();

    let sums = map_rows(a.data(), width, |y, row| {
        let other_row = &other[y * width..(y + 1) * width];
        row.iter().zip(other_row).fold((0.0f64, 0.0f64), |(sa, sb), (&p, &q)| {
            (sa + p as f64, sb + q as f64)
        })
    });
    let (sum_a, sum_b) = sums
        .iter()
        .fold((0.0, 0.0), |(sa, sb), &(ra, rb)| (sa + ra, sb + rb));
    let mean_a = sum_a / n as f64;
    let mean_b = sum_b / n as f64;

    let moments = map_rows(a.data(), width, |y, row| {
        let other_row = &other[y * width..(y + 1) * width];
        row.iter().zip(other_row).fold(
            (0.0f64, 0.0f64, 0.0f64),
            |(va, vb, cov), (&p, &q)| {
                let da = p as f64 - mean_a;
                let db = q as f64 - mean_b;
                (va + da * da, vb + db * db, cov + da * db)
            },
        )
    });
    let (var_a, var_b, cov) = moments
        .iter()
        .fold((0.0, 0.0, 0.0), |(va, vb, c), &(ra, rb, rc)| {
            (va + ra, vb + rb, c + rc)
        });
    let denom_n = (n - 1) as f64;
    let var_a = var_a / denom_n;
    let var_b = var_b / denom_n;
    let cov = cov / denom_n;

    let numerator = (2.0 * mean_a * mean_b + SSIM_C1) * (2.0 * cov + SSIM_C2);
    let denominator =
        (mean_a * mean_a + mean_b * mean_b + SSIM_C1) * (var_a + var_b + SSIM_C2);
    Ok(numerator / denominator)
}

/// Spatial frequency `sqrt(rf^2 + cf^2)`.
///
/// `rf` is the RMS of horizontal neighbour differences over the
/// `h * (w - 1)` pairs, `cf` the RMS of vertical differences over the
/// `(h - 1) * w` pairs. A direction with no pairs contributes 0.
pub fn spatial_frequency(field: &Field16) -> f64 {
    let width = field.width() as usize;
    let height = field.height() as usize;
    let data = field.data();

    let partials = map_rows(data, width, |y, row| {
        let horizontal: f64 = row
            .windows(2)
            .map(|pair| {
                let d = pair[1] as f64 - pair[0] as f64;
                d * d
            })
            .sum();
        let vertical: f64 = if y + 1 < height {
            let below = &data[(y + 1) * width..(y + 2) * width];
            row.iter()
                .zip(below)
                .map(|(&p, &q)| {
                    let d = q as f64 - p as f64;
                    d * d
                })
                .sum()
        } else {
            0.0
        };
        (horizontal, vertical)
    });
    let (h_sum, v_sum) = partials
        .iter()
        .fold((0.0, 0.0), |(hs, vs), &(h, v)| (hs + h, vs + v));

    let h_pairs = height * (width - 1);
    let v_pairs = (height - 1) * width;
    let rf_sq = if h_pairs > 0 { h_sum / h_pairs as f64 } else { 0.0 };
    let cf_sq = if v_pairs > 0 { v_sum / v_pairs as f64 } else { 0.0 };

    (rf_sq + cf_sq).sqrt()
}
