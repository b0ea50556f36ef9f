//! Camera-relative bin weighting.
//!
//! The effective distance range is partitioned into [`NUM_BINS`] bins
//! and the sort-key bucket budget is spread across them non-uniformly,
//! concentrating key resolution in the bins near the camera. Nearby
//! splats are the ones whose ordering errors are visible, so they get
//! the fine-grained keys; far bins degrade gracefully.

use splatsort_common::SortMode;

/// Number of camera-relative depth bins.
pub const NUM_BINS: usize = 32;

/// Bin index the camera falls into for the given mode and distance
/// range.
///
/// In radial mode distances are inverted before binning (far splats get
/// small keys), so the camera always maps to the last bin. In linear
/// mode the camera sits at effective distance zero.
pub fn camera_bin(mode: SortMode, min_dist: f32, range: f32) -> usize {
    match mode {
        SortMode::Radial => NUM_BINS - 1,
        SortMode::Linear => {
            if range <= f32::EPSILON {
                return 0;
            }
            let normalized = -min_dist / range;
            ((normalized * NUM_BINS as f32).floor() as i64).clamp(0, NUM_BINS as i64 - 1) as usize
        }
    }
}

/// Per-bin bucket allocation: `base` (first bucket of the bin) and
/// `divider` (buckets the bin owns).
///
/// Arrays are `NUM_BINS + 1` long: the entry at index `NUM_BINS` is a
/// safety entry (`base` saturated, `divider` zero) so floating point
/// truncation that lands exactly on the range end stays in bounds
/// without a branch in the hot loop.
#[derive(Debug, Clone)]
pub struct BinWeights {
    base: [f32; NUM_BINS + 1],
    divider: [f32; NUM_BINS + 1],
    max_key: u32,
}

impl BinWeights {
    /// Distributes a budget of `bucket_count - 1` buckets across the
    /// bins with inverse-distance falloff from `camera_bin`, then
    /// derives the per-bin base offsets.
    pub fn compute(camera_bin: usize, bucket_count: u32) -> Self {
        debug_assert!(camera_bin < NUM_BINS);
        let budget = bucket_count.saturating_sub(1);

        // Inverse-distance weights around the camera bin.
        let mut weight = [0.0f32; NUM_BINS];
        let mut total = 0.0f32;
        for (i, w) in weight.iter_mut().enumerate() {
            *w = 1.0 / (1.0 + (i as i64 - camera_bin as i64).unsigned_abs() as f32);
            total += *w;
        }

        // Integer allocation: one bucket per bin guaranteed, the rest by
        // proportional floor with largest-remainder rounding.
        let mut divider = [0u32; NUM_BINS];
        let reserve = if budget >= NUM_BINS as u32 {
            NUM_BINS as u32
        } else {
            0
        };
        if reserve > 0 {
            divider.fill(1);
        }
        let distributable = budget - reserve;

        let mut fractions: Vec<(f32, usize)> = Vec::with_capacity(NUM_BINS);
        let mut assigned = 0u32;
        for i in 0..NUM_BINS {
            let exact = distributable as f64 * (weight[i] / total) as f64;
            let floor = exact.floor() as u32;
            divider[i] += floor;
            assigned += floor;
            fractions.push(((exact - exact.floor()) as f32, i));
        }

        // Hand out the remainder to the largest fractional shares; ties
        // go to the lower bin index for determinism.
        fractions.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        let mut leftover = distributable - assigned;
        for &(_, i) in &fractions {
            if leftover == 0 {
                break;
            }
            divider[i] += 1;
            leftover -= 1;
        }

        let mut base = [0.0f32; NUM_BINS + 1];
        let mut div = [0.0f32; NUM_BINS + 1];
        let mut acc = 0u32;
        for i in 0..NUM_BINS {
            base[i] = acc as f32;
            div[i] = divider[i] as f32;
            acc += divider[i];
        }
        // safety entry
        base[NUM_BINS] = acc as f32;
        div[NUM_BINS] = 0.0;

        Self {
            base,
            divider: div,
            max_key: acc,
        }
    }

    /// Largest key this weighting can produce (`bucket_count - 1`).
    pub fn max_key(&self) -> u32 {
        self.max_key
    }

    /// Buckets allocated to `bin`.
    pub fn allocation(&self, bin: usize) -> u32 {
        self.divider[bin] as u32
    }

    /// Maps a bin-space distance `d` (nominally in `0..NUM_BINS`) to a
    /// sort key. Out-of-range distances are clamped into the first or
    /// last bucket; the returned flag reports the clamp so callers can
    /// diagnose bounds that do not contain all centers.
    #[inline]
    pub fn key_for(&self, d: f32) -> (u32, bool) {
        if !(d >= 0.0) {
            // negative distance or NaN
            return (0, true);
        }
        let bin = d as usize;
        if bin > NUM_BINS {
            return (self.max_key, true);
        }
        let frac = d - bin as f32;
        ((self.base[bin] + self.divider[bin] * frac) as u32, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_fully_allocated() {
        for cam in [0, 7, NUM_BINS - 1] {
            let w = BinWeights::compute(cam, (1 << 14) + 1);
            let total: u32 = (0..NUM_BINS).map(|b| w.allocation(b)).sum();
            assert_eq!(total, 1 << 14);
            assert_eq!(w.max_key(), 1 << 14);
        }
    }

    #[test]
    fn camera_bin_gets_largest_share() {
        for cam in 0..NUM_BINS {
            let w = BinWeights::compute(cam, 1025);
            let peak = w.allocation(cam);
            for bin in 0..NUM_BINS {
                assert!(
                    w.allocation(bin) <= peak,
                    "bin {bin} outweighs camera bin {cam}"
                );
            }
        }
    }

    #[test]
    fn allocation_falls_off_with_distance() {
        let cam = 5;
        let w = BinWeights::compute(cam, (1 << 16) + 1);
        for d in 1..NUM_BINS {
            for bin in 0..NUM_BINS {
                let dist = (bin as i64 - cam as i64).unsigned_abs() as usize;
                if dist == d {
                    // find any strictly closer bin and compare
                    for other in 0..NUM_BINS {
                        let odist = (other as i64 - cam as i64).unsigned_abs() as usize;
                        if odist < dist {
                            assert!(w.allocation(other) >= w.allocation(bin));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn every_bin_keeps_resolution() {
        let w = BinWeights::compute(0, 1025);
        for bin in 0..NUM_BINS {
            assert!(w.allocation(bin) >= 1);
        }
    }

    #[test]
    fn keys_stay_below_bucket_count() {
        let bucket_count = 1025u32;
        let w = BinWeights::compute(3, bucket_count);
        // sweep bin space densely, including the exact end
        let mut prev = 0u32;
        for step in 0..=(NUM_BINS * 64) {
            let d = step as f32 / 64.0;
            let (key, clamped) = w.key_for(d);
            assert!(key < bucket_count);
            assert!(!clamped);
            assert!(key >= prev, "keys must be monotonic in distance");
            prev = key;
        }
    }

    #[test]
    fn out_of_range_distances_clamp() {
        let w = BinWeights::compute(0, 1025);
        assert_eq!(w.key_for(-0.5), (0, true));
        assert_eq!(w.key_for(f32::NAN), (0, true));
        let (key, clamped) = w.key_for(NUM_BINS as f32 + 1.5);
        assert!(clamped);
        assert_eq!(key, w.max_key());
    }

    #[test]
    fn safety_entry_handles_range_end() {
        let w = BinWeights::compute(8, 1025);
        // d == NUM_BINS exactly: safety entry, not a clamp
        let (key, clamped) = w.key_for(NUM_BINS as f32);
        assert!(!clamped);
        assert_eq!(key, w.max_key());
    }

    #[test]
    fn camera_bin_linear_mode() {
        // camera in the middle of the range
        assert_eq!(camera_bin(SortMode::Linear, -50.0, 100.0), NUM_BINS / 2);
        // camera before every splat
        assert_eq!(camera_bin(SortMode::Linear, 10.0, 100.0), 0);
        // camera beyond every splat
        assert_eq!(camera_bin(SortMode::Linear, -200.0, 100.0), NUM_BINS - 1);
        // degenerate range
        assert_eq!(camera_bin(SortMode::Linear, 0.0, 0.0), 0);
    }

    #[test]
    fn camera_bin_radial_mode_is_last() {
        assert_eq!(camera_bin(SortMode::Radial, 0.0, 123.0), NUM_BINS - 1);
    }
}
