//! Camera-to-sort-parameter derivation.
//!
//! The per-splat work stays in each set's local space; this module
//! pulls the camera into that space once per set per sort request.

use glam::{Mat4, Vec3};
use splatsort_common::{Aabb, SplatSortParams};

/// World-space camera state a sort request is derived from.
///
/// `axis` is the camera world transform's Z axis, normalized — depth is
/// measured along it, matching a view matrix whose forward is -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub axis: Vec3,
}

impl CameraView {
    /// Extracts position and sort axis from a camera world transform.
    pub fn from_world_transform(world: &Mat4) -> Self {
        Self {
            position: world.w_axis.truncate(),
            axis: world.z_axis.truncate().normalize_or(Vec3::Z),
        }
    }

    /// Camera at `position` looking at `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            axis: (position - target).normalize_or(Vec3::Z),
        }
    }
}

/// Derives one set's sort parameters from its model transform and local
/// bounds.
///
/// The camera axis is transformed by the full inverse model matrix and
/// then re-normalized, which cancels the uniform 1/s scaling factor.
/// Non-uniform scale is not supported; the x-axis length stands in for
/// the whole scale.
pub fn sort_params(model: &Mat4, aabb: Aabb, view: &CameraView) -> SplatSortParams {
    let inv_model = model.inverse();

    let transformed_direction = inv_model.transform_vector3(view.axis).normalize_or(Vec3::Z);
    let transformed_position = inv_model.transform_point3(view.position);

    let translation = model.w_axis.truncate();
    let offset = (translation - view.position).dot(view.axis);
    let scale = model.x_axis.truncate().length();

    SplatSortParams {
        transformed_direction,
        transformed_position,
        offset,
        scale,
        aabb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn unit_aabb() -> Aabb {
        Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    /// Effective distance the kernel computes for a local-space center.
    fn effective_distance(params: &SplatSortParams, center: Vec3) -> f32 {
        center.dot(params.transformed_direction * params.scale) + params.offset
    }

    /// The same depth measured directly in world space.
    fn world_depth(model: &Mat4, view: &CameraView, center: Vec3) -> f32 {
        (model.transform_point3(center) - view.position).dot(view.axis)
    }

    #[test]
    fn identity_model_passes_camera_through() {
        let view = CameraView {
            position: Vec3::new(1.0, 2.0, 3.0),
            axis: Vec3::Z,
        };
        let params = sort_params(&Mat4::IDENTITY, unit_aabb(), &view);
        assert_eq!(params.transformed_direction, Vec3::Z);
        assert_eq!(params.transformed_position, view.position);
        assert_eq!(params.scale, 1.0);
        assert_eq!(params.offset, -3.0);
    }

    #[test]
    fn effective_distance_matches_world_depth() {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.5),
            Quat::from_rotation_y(0.7),
            Vec3::new(10.0, -4.0, 2.0),
        );
        let view = CameraView::looking_at(Vec3::new(3.0, 8.0, -5.0), Vec3::new(10.0, -4.0, 2.0));
        let params = sort_params(&model, unit_aabb(), &view);

        for center in [
            Vec3::ZERO,
            Vec3::new(0.5, -0.25, 0.75),
            Vec3::new(-1.0, 1.0, -1.0),
        ] {
            let got = effective_distance(&params, center);
            let want = world_depth(&model, &view, center);
            assert!(
                (got - want).abs() < 1e-3,
                "center {center}: {got} vs {want}"
            );
        }
    }

    #[test]
    fn rotation_cancels_in_transformed_direction() {
        let model = Mat4::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let view = CameraView {
            position: Vec3::ZERO,
            axis: Vec3::X,
        };
        let params = sort_params(&model, unit_aabb(), &view);
        // world X pulled back through a 90-degree Z rotation lands on -Y
        assert!((params.transformed_direction - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-6);
        assert!((params.transformed_direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_scale_recovered_from_model() {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(3.0),
            Quat::from_rotation_x(1.0),
            Vec3::ZERO,
        );
        let view = CameraView {
            position: Vec3::ZERO,
            axis: Vec3::Z,
        };
        let params = sort_params(&model, unit_aabb(), &view);
        assert!((params.scale - 3.0).abs() < 1e-5);
        // direction stays unit length despite the scaled inverse
        assert!((params.transformed_direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn camera_view_from_world_transform_uses_z_axis() {
        let world = Mat4::from_rotation_translation(
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::new(0.0, 5.0, 0.0),
        );
        let view = CameraView::from_world_transform(&world);
        assert_eq!(view.position, Vec3::new(0.0, 5.0, 0.0));
        assert!((view.axis - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn looking_at_points_axis_back_at_camera() {
        let view = CameraView::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        assert_eq!(view.axis, Vec3::Z);
    }
}
