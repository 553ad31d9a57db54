//! Adaptive window estimation
//!
//! Two interchangeable strategies pick raw low/high bounds:
//! - histogram: percentile crossings on a 4096-bin histogram
//! - block: medians of per-tile min/max/mean over 256x256 tiles
//!
//! Both then share the same finishing: minimum span, safety margin,
//! clamping and the window width limits.

use log::debug;

use super::{WindowParams, WindowingConfig};
use crate::field::{Field16, MAX_SAMPLE};
use crate::parallel::fold_rows;

/// Bins of the coarse window histogram.
pub const HISTOGRAM_BINS: usize = 4096;

/// Samples per histogram bin.
const BIN_WIDTH: usize = 65536 / HISTOGRAM_BINS;

/// Tile side for block statistics.
pub const BLOCK_SIZE: u32 = 256;

/// Fraction of the mean-to-extreme distance the block bounds move inward.
const BLOCK_PULL: f64 = 0.3;

/// Minimum window span as a fraction of the global range.
const MIN_SPAN_FRACTION: f64 = 0.05;

/// Margin added on both sides as a fraction of the span.
const SAFETY_MARGIN: f64 = 0.05;

/// Global sample range and raw bounds picked by a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBounds {
    pub low: f64,
    pub high: f64,
    pub global_min: f64,
    pub global_max: f64,
}

/// Estimate the display window for a field.
pub fn estimate_window(field: &Field16, config: &WindowingConfig) -> WindowParams {
    let raw = if config.use_block_statistics {
        block_bounds(field)
    } else {
        histogram_bounds(field, config.lower_percentile, config.upper_percentile)
    };
    let window = finish_window(raw, config.min_window_width, config.max_window_width);

    debug!(
        "window bounds {:.0}..{:.0} (global {:.0}..{:.0}) -> level {:.1}, width {:.1}",
        raw.low, raw.high, raw.global_min, raw.global_max, window.level, window.width
    );
    window
}

/// Build the 4096-bin histogram.
pub fn coarse_histogram(field: &Field16) -> Vec<u64> {
    fold_rows(
        field.data(),
        field.width() as usize,
        || vec![0u64; HISTOGRAM_BINS],
        |mut hist, row| {
            for &v in row {
                hist[v as usize / BIN_WIDTH] += 1;
            }
            hist
        },
        |mut total, partial| {
            for (sum, count) in total.iter_mut().zip(partial) {
                *sum += count;
            }
            total
        },
    )
}

/// Percentile bounds from the coarse histogram.
///
/// The lower bin is the first whose cumulative count reaches
/// `lower_percentile`% of the pixels, widened one bin toward zero; the upper
/// bin is found the same way scanning down from the top, widened one bin
/// toward the maximum.
pub fn histogram_bounds(field: &Field16, lower_percentile: f64, upper_percentile: f64) -> RawBounds {
    let histogram = coarse_histogram(field);
    let total = field.len() as f64;
    let (global_min, global_max) = field.min_max();

    let lower_target = total * lower_percentile / 100.0;
    let upper_target = total * (100.0 - upper_percentile) / 100.0;

    let mut low_bin = 0usize;
    let mut cumulative = 0u64;
    for (bin, &count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative as f64 >= lower_target {
            low_bin = bin.saturating_sub(1);
            break;
        }
    }

    let mut high_bin = HISTOGRAM_BINS - 1;
    cumulative = 0;
    for (bin, &count) in histogram.iter().enumerate().rev() {
        cumulative += count;
        if cumulative as f64 >= upper_target {
            high_bin = (bin + 1).min(HISTOGRAM_BINS - 1);
            break;
        }
    }

    RawBounds {
        low: (low_bin * BIN_WIDTH) as f64,
        high: ((high_bin + 1) * BIN_WIDTH - 1) as f64,
        global_min: global_min as f64,
        global_max: global_max as f64,
    }
}

/// Per-tile extremes and mean.
#[derive(Debug, Clone, Copy)]
struct TileStats {
    min: f64,
    max: f64,
    mean: f64,
}

/// Block-statistics bounds.
///
/// Tiles are few, so they are scanned sequentially.
pub fn block_bounds(field: &Field16) -> RawBounds {
    let width = field.width();
    let height = field.height();
    let mut tiles = Vec::new();

    for ty in (0..height).step_by(BLOCK_SIZE as usize) {
        for tx in (0..width).step_by(BLOCK_SIZE as usize) {
            let x1 = (tx + BLOCK_SIZE).min(width);
            let y1 = (ty + BLOCK_SIZE).min(height);
            let mut min = u16::MAX;
            let mut max = u16::MIN;
            let mut sum = 0u64;

            for y in ty..y1 {
                for &v in &field.row(y)[tx as usize..x1 as usize] {
                    min = min.min(v);
                    max = max.max(v);
                    sum += v as u64;
                }
            }

            let count = ((x1 - tx) * (y1 - ty)) as f64;
            tiles.push(TileStats {
                min: min as f64,
                max: max as f64,
                mean: sum as f64 / count,
            });
        }
    }

    let median_min = median(tiles.iter().map(|t| t.min).collect());
    let median_max = median(tiles.iter().map(|t| t.max).collect());
    let median_mean = median(tiles.iter().map(|t| t.mean).collect());

    let global_min = tiles.iter().map(|t| t.min).fold(f64::INFINITY, f64::min);
    let global_max = tiles.iter().map(|t| t.max).fold(f64::NEG_INFINITY, f64::max);

    RawBounds {
        low: median_min.max(global_min + BLOCK_PULL * (median_mean - global_min)),
        high: median_max.min(global_max - BLOCK_PULL * (global_max - median_mean)),
        global_min,
        global_max,
    }
}

/// Median of a non-empty list; the upper middle element for even counts.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    values[values.len() / 2]
}

/// Shared finishing steps turning raw bounds into a window.
pub fn finish_window(raw: RawBounds, min_width: f64, max_width: f64) -> WindowParams {
    let mut low = raw.low;
    let mut high = raw.high;

    let min_span = MIN_SPAN_FRACTION * (raw.global_max - raw.global_min);
    if high - low < min_span {
        let centre = (low + high) / 2.0;
        low = centre - min_span / 2.0;
        high = centre + min_span / 2.0;
    }

    let margin = SAFETY_MARGIN * (high - low);
    low = (low - margin).clamp(0.0, MAX_SAMPLE as f64);
    high = (high + margin).clamp(0.0, MAX_SAMPLE as f64);

    let level = (low + high) / 2.0;
    let mut width = (high - low).max(1.0);
    if width < min_width {
        width = min_width;
    }
    if max_width > 0.0 && width > max_width {
        width = max_width;
    }

    WindowParams { level, width }
}
