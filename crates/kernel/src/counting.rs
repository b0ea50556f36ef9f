//! Counting sort over the evaluated keys.
//!
//! Keys are small bounded integers, so occupancy tallies plus prefix
//! sums give the output position of every splat directly; no
//! comparisons in the hot path.

/// Default lower bound for the adaptive bit budget.
pub const DEFAULT_MIN_BITS: u32 = 10;
/// Default upper bound for the adaptive bit budget.
pub const DEFAULT_MAX_BITS: u32 = 20;

/// Number of bits of key resolution for `num_vertices` splats, clamped
/// to the given bounds. Small sets do not need many buckets; huge sets
/// cap out to keep the count buffer reasonable.
pub fn compare_bits(num_vertices: u32, min_bits: u32, max_bits: u32) -> u32 {
    if num_vertices == 0 {
        return min_bits;
    }
    let bits = (num_vertices as f32 / 4.0).log2().round() as i64;
    bits.clamp(min_bits as i64, max_bits as i64) as u32
}

/// Buckets for a bit budget. One past the power of two so the exact
/// range end keeps a slot of its own.
pub fn bucket_count(bits: u32) -> u32 {
    (1 << bits) + 1
}

/// Produces the draw-order permutation from bucket occupancy tallies.
///
/// `counts` holds per-key occupancy on entry and is consumed (turned
/// into running offsets). Splats are placed back-to-front: smaller keys
/// first, and within a bucket the later input index comes first.
/// Returns the cumulative total for the caller's coverage check.
pub fn counting_sort(counts: &mut [u32], keys: &[u32], order: &mut [u32]) -> u32 {
    debug_assert_eq!(keys.len(), order.len());

    // occupancy -> cumulative end offsets
    for i in 1..counts.len() {
        counts[i] += counts[i - 1];
    }
    let total = counts[counts.len() - 1];

    for (i, &key) in keys.iter().enumerate() {
        let slot = &mut counts[key as usize];
        *slot -= 1;
        order[*slot as usize] = i as u32;
    }

    total
}
