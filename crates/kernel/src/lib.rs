//! Sorting kernel: camera-relative bin weighting, sort-key evaluation
//! and the counting sort that produces the draw-order permutation.
//!
//! Everything in this crate is pure and single-threaded; the sorter
//! crate owns the worker thread and buffer traffic. Buffers are passed
//! in so the hot path allocates nothing.
//!
//! # Invariants
//! - Every computed sort key is strictly below the bucket count.
//! - The counting sort output is a permutation of `0..n`, ordered by key
//!   ascending (far splats first).
//! - Bucket allocation across depth bins concentrates resolution near
//!   the camera and never exceeds the budget.

pub mod counting;
pub mod keys;
pub mod range;
pub mod weights;

pub use counting::{DEFAULT_MAX_BITS, DEFAULT_MIN_BITS, bucket_count, compare_bits, counting_sort};
pub use keys::{KernelError, KeyStats, evaluate_sort_keys};
pub use range::{DistRange, effective_range};
pub use weights::{BinWeights, NUM_BINS, camera_bin};

pub fn crate_info() -> &'static str {
    "splatsort-kernel v0.1.0"
}
