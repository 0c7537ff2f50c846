//! Per-part gizmo transforms

use glam::{Mat4, Vec3};

use super::{GizmoSizeParameters, Pose, TransformError, ViewDependentTransform};

/// Final matrices for each visual part of the gizmo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoTransforms {
    pub pointer: Mat4,
    pub pole: Mat4,
    pub quad: Mat4,
}

impl Default for GizmoTransforms {
    fn default() -> Self {
        Self {
            pointer: Mat4::IDENTITY,
            pole: Mat4::IDENTITY,
            quad: Mat4::IDENTITY,
        }
    }
}

/// Combines pose, view transform and sizes into part transforms
///
/// Matrices compose right to left (glam column vectors): a part's local
/// sizing applies first, then the pose, then the view transform.
pub struct CompositeTransformBuilder;

impl CompositeTransformBuilder {
    /// Build all three part transforms in one pass
    ///
    /// Fails without producing anything if the pose cannot form a valid
    /// matrix or any result is non-finite.
    pub fn build(
        pose: &Pose,
        view: &ViewDependentTransform,
        sizes: &GizmoSizeParameters,
    ) -> Result<GizmoTransforms, TransformError> {
        let base = view.matrix() * pose.to_matrix()?;

        let pointer = base;
        let pole = base * Mat4::from_scale(Vec3::new(1.0, sizes.line_height, 1.0));
        let quad = base
            * Mat4::from_translation(Vec3::new(0.0, sizes.line_height, 0.0))
            * Mat4::from_scale(Vec3::new(sizes.quad_half_width, 1.0, sizes.quad_half_depth));

        if !(pointer.is_finite() && pole.is_finite() && quad.is_finite()) {
            return Err(TransformError::NonFinite);
        }

        Ok(GizmoTransforms {
            pointer,
            pole,
            quad,
        })
    }
}
