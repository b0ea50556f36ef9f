//! Shared vocabulary for the splat depth-sort workspace.
//!
//! # Invariants
//! - Types here carry no behavior beyond construction and queries; the
//!   kernel and sorter own the algorithmic semantics.
//! - A `CentersLayout` is always internally consistent (contiguous
//!   placements, padding accounted for) once built through `assign`.

pub mod layout;
pub mod types;

pub use layout::{CentersLayout, LayoutError, SetPlacement, SetSlice, estimate_texture_size};
pub use types::{Aabb, SortMode, SplatSetId, SplatSortParams};

pub fn crate_info() -> &'static str {
    "splatsort-common v0.1.0"
}
