//! Gizmo orientation from a hit normal or the view ray

use glam::{EulerRot, Quat, Vec3};

use crate::constants::{DIRECTION_EPSILON, FORWARD_AXIS, UP_AXIS};
use crate::intersect::HitResult;

/// Computes the gizmo rotation for one tick
pub struct OrientationSolver;

impl OrientationSolver {
    /// On a hit, rotate [`UP_AXIS`] onto the surface normal. On a miss,
    /// rotate [`FORWARD_AXIS`] onto the fallback direction.
    ///
    /// Zero-length or non-finite directions yield [`Quat::IDENTITY`].
    pub fn solve(hit: &HitResult, fallback_direction: Vec3) -> Quat {
        match hit.hit() {
            Some(surface) => shortest_arc(UP_AXIS, surface.normal),
            None => shortest_arc(FORWARD_AXIS, fallback_direction),
        }
    }
}

/// Minimal rotation taking unit `from` onto the direction of `to`.
///
/// Anti-parallel inputs rotate half a turn about an axis perpendicular to
/// `from`.
fn shortest_arc(from: Vec3, to: Vec3) -> Quat {
    if !to.is_finite() || to.length_squared() <= DIRECTION_EPSILON * DIRECTION_EPSILON {
        return Quat::IDENTITY;
    }
    match to.try_normalize() {
        Some(to) => Quat::from_rotation_arc(from, to),
        None => Quat::IDENTITY,
    }
}

/// Rotation as XYZ Euler angles in degrees
pub fn euler_degrees(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersect::SurfaceHit;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn hit_with_normal(normal: Vec3) -> HitResult {
        HitResult::Hit(SurfaceHit {
            point: Vec3::ZERO,
            normal,
            uvw: Vec3::ZERO,
            prim: 0,
        })
    }

    fn sample_directions() -> Vec<Vec3> {
        let mut dirs = vec![
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for i in 0..12 {
            let theta = i as f32 * 0.53;
            let phi = i as f32 * 1.37;
            dirs.push(Vec3::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            ));
        }
        dirs.into_iter().map(Vec3::normalize).collect()
    }

    #[test]
    fn test_hit_rotates_up_onto_normal() {
        for n in sample_directions() {
            let q = OrientationSolver::solve(&hit_with_normal(n), Vec3::Z);
            let rotated = q * UP_AXIS;
            assert!(
                rotated.angle_between(n) < 1e-3,
                "up rotated to {rotated:?}, expected {n:?}"
            );
        }
    }

    #[test]
    fn test_miss_rotates_forward_onto_direction() {
        for d in sample_directions() {
            let q = OrientationSolver::solve(&HitResult::Miss, d * 7.5);
            let rotated = q * FORWARD_AXIS;
            assert!(
                rotated.angle_between(d) < 1e-3,
                "forward rotated to {rotated:?}, expected {d:?}"
            );
        }
    }

    #[test]
    fn test_zero_fallback_is_identity() {
        let q = OrientationSolver::solve(&HitResult::Miss, Vec3::ZERO);
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn test_nan_fallback_is_identity() {
        let q = OrientationSolver::solve(&HitResult::Miss, Vec3::new(f32::NAN, 0.0, 1.0));
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn test_normal_equal_to_up_is_identity() {
        let q = OrientationSolver::solve(&hit_with_normal(Vec3::Y), Vec3::Z);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert!(euler_degrees(q).abs_diff_eq(Vec3::ZERO, 1e-4));
    }

    #[test]
    fn test_miss_backwards_is_half_turn() {
        let q = OrientationSolver::solve(&HitResult::Miss, Vec3::new(0.0, 0.0, -1.0));
        let (axis, angle) = q.to_axis_angle();
        assert_relative_eq!(angle, PI, epsilon = 1e-4);
        assert!(axis.dot(FORWARD_AXIS).abs() < 1e-4);
        assert!((q * FORWARD_AXIS).abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn test_rotation_is_minimal() {
        // A quarter turn between up and +X must not pick a longer path
        let q = OrientationSolver::solve(&hit_with_normal(Vec3::X), Vec3::Z);
        let (_, angle) = q.to_axis_angle();
        assert_relative_eq!(angle, PI / 2.0, epsilon = 1e-4);
    }
}
