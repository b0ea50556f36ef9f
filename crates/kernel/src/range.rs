//! Effective distance range across all splat sets in a sort request.
//!
//! The range is derived from each set's local AABB so the per-splat loop
//! never has to widen it. Bounds that do not actually contain all
//! centers show up later as clamped keys.

use splatsort_common::{SortMode, SplatSortParams};

/// Min/max effective distance for one sort request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistRange {
    pub min: f32,
    pub max: f32,
}

impl DistRange {
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// Computes the effective distance range for the given mode over all
/// sets. No sets (or empty bounds) yields `(0, 0)`.
pub fn effective_range(mode: SortMode, params: &[SplatSortParams]) -> DistRange {
    match mode {
        SortMode::Linear => linear_range(params),
        SortMode::Radial => radial_range(params),
    }
}

/// Projects each AABB onto the transformed direction. The extreme
/// corners along a direction are found per component from the sign of
/// the direction, so only two corners are evaluated per set.
fn linear_range(params: &[SplatSortParams]) -> DistRange {
    let mut min_dist = f32::INFINITY;
    let mut max_dist = f32::NEG_INFINITY;

    for p in params {
        let d = p.transformed_direction;
        let (bmin, bmax) = (p.aabb.min, p.aabb.max);

        let near = glam::Vec3::new(
            if d.x >= 0.0 { bmin.x } else { bmax.x },
            if d.y >= 0.0 { bmin.y } else { bmax.y },
            if d.z >= 0.0 { bmin.z } else { bmax.z },
        );
        let far = glam::Vec3::new(
            if d.x >= 0.0 { bmax.x } else { bmin.x },
            if d.y >= 0.0 { bmax.y } else { bmin.y },
            if d.z >= 0.0 { bmax.z } else { bmin.z },
        );

        let e_min = near.dot(d) * p.scale + p.offset;
        let e_max = far.dot(d) * p.scale + p.offset;

        // negative scale swaps the extremes
        let local_min = e_min.min(e_max);
        let local_max = e_min.max(e_max);

        min_dist = min_dist.min(local_min);
        max_dist = max_dist.max(local_max);
    }

    if min_dist == f32::INFINITY {
        return DistRange { min: 0.0, max: 0.0 };
    }
    DistRange {
        min: min_dist,
        max: max_dist,
    }
}

/// Max radial distance from the camera over all 8 AABB corners of every
/// set. The minimum is always zero: the camera is the origin of radial
/// distances.
fn radial_range(params: &[SplatSortParams]) -> DistRange {
    let mut max_dist = f32::NEG_INFINITY;

    for p in params {
        for i in 0..8u8 {
            let corner = p.aabb.corner(i);
            let dist = (corner - p.transformed_position).length() * p.scale;
            max_dist = max_dist.max(dist);
        }
    }

    DistRange {
        min: 0.0,
        max: max_dist.max(0.0),
    }
}
