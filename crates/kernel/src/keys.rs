//! Sort-key evaluation over the unified buffer layout.
//!
//! One key per pixel of the used region, padding included. Keys are
//! bucket indices for the counting sort; smaller key = drawn earlier
//! (farther from the camera).

use splatsort_common::{CentersLayout, SortMode, SplatSortParams};

use crate::range::DistRange;
use crate::weights::{BinWeights, NUM_BINS};

/// Errors from key evaluation.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("{params} sort params / {centers} center buffers for {placements} placements")]
    ParamsMismatch {
        params: usize,
        centers: usize,
        placements: usize,
    },
    #[error("key buffer holds {got} entries, layout needs {expected}")]
    BufferMismatch { expected: u32, got: usize },
    #[error("count buffer holds {got} buckets, weights produce keys up to {max_key}")]
    CountBufferTooSmall { max_key: u32, got: usize },
    #[error("placement {index} wrote {written} keys, layout reserves {expected}")]
    PlacementMismatch {
        index: usize,
        written: u32,
        expected: u32,
    },
}

/// Summary of one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyStats {
    /// Keys written (equals the layout's used pixels on success).
    pub written: u32,
    /// Distances that fell outside the computed range and were clamped
    /// into the first or last bucket. Non-zero means a set's AABB does
    /// not contain all of its centers.
    pub clamped: u32,
}

/// Evaluates sort keys for every placement of `layout` into `keys`,
/// tallying bucket occupancy into `counts`.
///
/// `centers` must parallel `layout.placements` (flat xyz triples per
/// set). `counts` must be zeroed by the caller and sized past
/// `weights.max_key()`; scratch reuse across sorts is the caller's
/// business.
pub fn evaluate_sort_keys(
    mode: SortMode,
    params: &[SplatSortParams],
    centers: &[&[f32]],
    layout: &CentersLayout,
    range: DistRange,
    weights: &BinWeights,
    keys: &mut [u32],
    counts: &mut [u32],
) -> Result<KeyStats, KernelError> {
    if params.len() != layout.placements.len() || centers.len() != layout.placements.len() {
        return Err(KernelError::ParamsMismatch {
            params: params.len(),
            centers: centers.len(),
            placements: layout.placements.len(),
        });
    }
    if keys.len() != layout.total_used_pixels as usize {
        return Err(KernelError::BufferMismatch {
            expected: layout.total_used_pixels,
            got: keys.len(),
        });
    }
    if counts.len() as u64 <= weights.max_key() as u64 {
        return Err(KernelError::CountBufferTooSmall {
            max_key: weights.max_key(),
            got: counts.len(),
        });
    }

    let span = range.span();
    if span <= f32::EPSILON {
        // all splats at the same effective distance
        keys.fill(0);
        counts[0] += layout.total_used_pixels;
        return Ok(KeyStats {
            written: layout.total_used_pixels,
            clamped: 0,
        });
    }

    let inv_bin_range = NUM_BINS as f32 / span;
    let texture_size = layout.texture_size;
    let mut stats = KeyStats::default();

    for (index, placement) in layout.placements.iter().enumerate() {
        let set_centers = centers[index];
        let p = &params[index];
        let start_target = (placement.line_start * texture_size) as usize;
        let mut target = start_target;

        let full = [(0u32, (set_centers.len() / 3) as u32)];
        let ranges: &[(u32, u32)] = if placement.intervals.is_empty() {
            &full
        } else {
            &placement.intervals
        };

        match mode {
            SortMode::Linear => {
                // fold scale into the direction, range minimum into the offset
                let sd = p.transformed_direction * p.scale;
                let add = p.offset - range.min;
                for &(start, end) in ranges {
                    let slice = &set_centers[start as usize * 3..end as usize * 3];
                    for c in slice.chunks_exact(3) {
                        let dist = c[0] * sd.x + c[1] * sd.y + c[2] * sd.z + add;
                        let (key, clamped) = weights.key_for(dist * inv_bin_range);
                        keys[target] = key;
                        counts[key as usize] += 1;
                        stats.clamped += clamped as u32;
                        target += 1;
                    }
                }
            }
            SortMode::Radial => {
                let cam = p.transformed_position;
                for &(start, end) in ranges {
                    let slice = &set_centers[start as usize * 3..end as usize * 3];
                    for c in slice.chunks_exact(3) {
                        let dx = c[0] - cam.x;
                        let dy = c[1] - cam.y;
                        let dz = c[2] - cam.z;
                        let dist = (dx * dx + dy * dy + dz * dz).sqrt() * p.scale;
                        // invert so far splats get small keys
                        let inverted = span - dist;
                        let (key, clamped) = weights.key_for(inverted * inv_bin_range);
                        keys[target] = key;
                        counts[key as usize] += 1;
                        stats.clamped += clamped as u32;
                        target += 1;
                    }
                }
            }
        }

        // cover the padded tail of the last line so the whole buffer is
        // part of the permutation
        let pad = placement.padding as usize;
        keys[target..target + pad].fill(0);
        counts[0] += placement.padding;
        target += pad;

        let expected = placement.line_count * texture_size;
        let written = (target - start_target) as u32;
        if written != expected {
            return Err(KernelError::PlacementMismatch {
                index,
                written,
                expected,
            });
        }
        stats.written += written;
    }

    tracing::trace!(
        written = stats.written,
        clamped = stats.clamped,
        mode = ?mode,
        "sort keys evaluated"
    );
    Ok(stats)
}
