use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identity of one registered splat set (one source point cloud placed
/// into the unified buffer). Ids are assigned by the caller and stay
/// stable for the lifetime of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SplatSetId(pub u64);

/// How splats are ordered relative to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Signed view-space depth along the camera axis, back-to-front.
    #[default]
    Linear,
    /// Absolute distance from the camera (cubemap-style rendering).
    /// Keys are inverted so far splats still come first.
    Radial,
}

/// Axis-aligned bounding box in a splat set's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds of a flat xyz center buffer. Non-finite components are
    /// skipped. Returns `None` when no finite point exists.
    pub fn from_centers(centers: &[f32]) -> Option<Self> {
        let mut min = Vec3::INFINITY;
        let mut max = Vec3::NEG_INFINITY;
        let mut any = false;
        for triple in centers.chunks_exact(3) {
            let p = Vec3::new(triple[0], triple[1], triple[2]);
            if !p.is_finite() {
                continue;
            }
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
        any.then_some(Self { min, max })
    }

    /// Corner `i` of 8, selected per component from the index bits.
    pub fn corner(&self, i: u8) -> Vec3 {
        Vec3::new(
            if i & 1 != 0 { self.max.x } else { self.min.x },
            if i & 2 != 0 { self.max.y } else { self.min.y },
            if i & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Per-set camera-relative parameters for one sort request.
///
/// Centers stay in set-local space on the worker; the camera is pulled
/// into that space instead so the per-splat work is a dot product
/// (linear) or a length (radial).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplatSortParams {
    /// Camera axis in the set's rotated local space, normalized.
    pub transformed_direction: Vec3,
    /// Camera position in the set's local space (radial mode).
    pub transformed_position: Vec3,
    /// World-space depth of the set origin along the camera axis.
    pub offset: f32,
    /// Uniform scale of the set's model transform.
    pub scale: f32,
    /// Local-space bounds of the set's centers.
    pub aabb: Aabb,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_from_centers_skips_non_finite() {
        let centers = [0.0, 0.0, 0.0, f32::NAN, 1.0, 1.0, 2.0, -1.0, 3.0];
        let aabb = Aabb::from_centers(&centers).unwrap();
        // the NaN triple is ignored entirely
        assert_eq!(aabb.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(2.0, 0.0, 3.0));
    }

    #[test]
    fn aabb_from_centers_empty() {
        assert!(Aabb::from_centers(&[]).is_none());
        assert!(Aabb::from_centers(&[f32::NAN, 0.0, 0.0]).is_none());
    }

    #[test]
    fn aabb_corners_cover_all_eight() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let mut seen = std::collections::HashSet::new();
        for i in 0..8 {
            let c = aabb.corner(i);
            seen.insert((c.x as i32, c.y as i32, c.z as i32));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn sort_mode_default_is_linear() {
        assert_eq!(SortMode::default(), SortMode::Linear);
    }
}
