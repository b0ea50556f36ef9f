//! Off-thread splat sorting.
//!
//! The worker owns the center buffers and runs the kernel; the
//! coordinator owns the worker, a pool of reusable order buffers, and
//! the version discipline that keeps the render loop from ever applying
//! a stale permutation.
//!
//! # Invariants
//! - Results for a retired layout version are never handed to the
//!   caller; they are recycled unseen.
//! - Applied versions never decrease.
//! - Every order buffer is in exactly one place at any time: free pool,
//!   in flight, pending, or lent to the caller.

pub mod coordinator;
pub mod view;
mod worker;

pub use coordinator::{SortStats, SortedFrame, SorterConfig, SorterError, UnifiedSorter};
pub use view::{CameraView, sort_params};

pub fn crate_info() -> &'static str {
    "splatsort-sorter v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("sorter"));
    }
}
