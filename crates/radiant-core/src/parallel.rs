//! Row-parallel helpers for image processing stages
//!
//! Every per-pixel stage in the crate writes disjoint output rows while
//! reading from an immutable source. These helpers hide the common pattern
//! of conditionally running rows on the rayon pool or sequentially based on
//! the field size.
//!
//! Float reductions are never folded in parallel: per-row partials are
//! collected in row order and combined sequentially, so results do not
//! depend on the number of worker threads. Integer accumulators (counts,
//! histograms) go through [`fold_rows`], where any grouping gives the same
//! answer.

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Minimum number of samples before a stage fans out across the pool.
pub const PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Parallel for-each over mutable rows with automatic threshold-based dispatch.
///
/// `f` receives the row index and the row slice. `data.len()` must be a
/// multiple of `width`.
///
/// # Example
/// ```ignore
/// for_each_row_mut(&mut out, width, |y, row| {
///     for (x, value) in row.iter_mut().enumerate() {
///         *value = src[y * width + x] / 65535.0;
///     }
/// });
/// ```
pub fn for_each_row_mut<T, F>(data: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    if width == 0 {
        return;
    }

    if data.len() >= PARALLEL_THRESHOLD {
        data.par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        for (y, row) in data.chunks_mut(width).enumerate() {
            f(y, row);
        }
    }
}

/// Parallel for-each over two same-shape mutable buffers, row by row.
///
/// Used where one pass writes two outputs (e.g. the next base layer and the
/// detail accumulator). Both buffers must have the same length.
pub fn for_each_row_pair_mut<A, B, F>(a: &mut [A], b: &mut [B], width: usize, f: F)
where
    A: Send,
    B: Send,
    F: Fn(usize, &mut [A], &mut [B]) + Sync,
{
    debug_assert_eq!(a.len(), b.len());
    if width == 0 {
        return;
    }

    if a.len() >= PARALLEL_THRESHOLD {
        a.par_chunks_mut(width)
            .zip(b.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, (row_a, row_b))| f(y, row_a, row_b));
    } else {
        for (y, (row_a, row_b)) in a.chunks_mut(width).zip(b.chunks_mut(width)).enumerate() {
            f(y, row_a, row_b);
        }
    }
}

/// Map every row to a partial result, preserving row order.
///
/// The caller folds the returned partials sequentially.
pub fn map_rows<T, A, F>(data: &[T], width: usize, f: F) -> Vec<A>
where
    T: Sync,
    A: Send,
    F: Fn(usize, &[T]) -> A + Sync,
{
    if width == 0 {
        return Vec::new();
    }

    if data.len() >= PARALLEL_THRESHOLD {
        data.par_chunks(width)
            .enumerate()
            .map(|(y, row)| f(y, row))
            .collect()
    } else {
        data.chunks(width)
            .enumerate()
            .map(|(y, row)| f(y, row))
            .collect()
    }
}

/// Fold rows into per-worker accumulators, then merge them.
///
/// `reduce` must be associative and commutative (integer counts are); the
/// number of live accumulators is bounded by the pool size, not the height.
///
/// # Example
/// ```ignore
/// let hist = fold_rows(data, width, || vec![0u64; 256], |mut acc, row| {
///     for &v in row {
///         acc[v as usize] += 1;
///     }
///     acc
/// }, merge);
/// ```
pub fn fold_rows<T, A, I, F, R>(data: &[T], width: usize, init: I, fold: F, reduce: R) -> A
where
    T: Sync,
    A: Send,
    I: Fn() -> A + Sync,
    F: Fn(A, &[T]) -> A + Sync,
    R: Fn(A, A) -> A + Sync,
{
    if width == 0 {
        return init();
    }

    if data.len() >= PARALLEL_THRESHOLD {
        data.par_chunks(width).fold(&init, &fold).reduce(&init, &reduce)
    } else {
        data.chunks(width).fold(init(), fold)
    }
}

/// Run `op` inside a dedicated rayon pool with exactly `threads` workers.
///
/// Stages called inside `op` fan out over that pool instead of the global
/// one. Fails with `ComputationFailure` if the pool cannot be built.
pub fn with_thread_count<R, F>(threads: usize, op: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| Error::failure("building worker pool", e))?;
    Ok(pool.install(op))
}
