//! Surface-locked gizmo
//!
//! The gizmo is made of three parts sharing one pose:
//!
//! - pointer: the hit-anchored cursor primitive
//! - pole: a unit vertical line stretched to the configured height
//! - quad: a flat marker at the top of the pole
//!
//! Resizing only rescales matrices. The part geometry is never regenerated.

mod composite;
mod instance;
mod orientation;
mod state;

use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::constants::{LINE_HEIGHT, QUAD_HALF_EXTENT, SINGULAR_EPSILON};

pub use composite::{CompositeTransformBuilder, GizmoTransforms};
pub use instance::{GizmoInstance, GizmoPart};
pub use orientation::{OrientationSolver, euler_degrees};
pub use state::{CommitAttempt, GizmoPhase, GizmoState, TickOutcome};

/// Placement of the gizmo in surface space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Pose {
    /// Pose with a uniform scale at the origin
    pub fn with_uniform_scale(scale: f32) -> Self {
        Self {
            scale: Vec3::splat(scale),
            ..Default::default()
        }
    }

    /// Build the scale, then rotate, then translate matrix
    pub fn to_matrix(&self) -> Result<Mat4, TransformError> {
        if !self.translation.is_finite() || !self.rotation.is_finite() || !self.scale.is_finite()
        {
            return Err(TransformError::NonFinite);
        }
        if self.scale.abs().min_element() <= f32::EPSILON {
            return Err(TransformError::Singular);
        }
        let rotation = Vec4::from(self.rotation)
            .try_normalize()
            .map(Quat::from_vec4)
            .ok_or(TransformError::Singular)?;
        Ok(Mat4::from_scale_rotation_translation(
            self.scale,
            rotation,
            self.translation,
        ))
    }

    /// Rotation as XYZ Euler angles in degrees
    pub fn euler_degrees(&self) -> Vec3 {
        euler_degrees(self.rotation)
    }
}

/// Per-part gizmo sizes, all non-negative
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoSizeParameters {
    pub line_height: f32,
    pub quad_half_width: f32,
    pub quad_half_depth: f32,
}

impl Default for GizmoSizeParameters {
    fn default() -> Self {
        Self {
            line_height: LINE_HEIGHT,
            quad_half_width: QUAD_HALF_EXTENT,
            quad_half_depth: QUAD_HALF_EXTENT,
        }
    }
}

impl GizmoSizeParameters {
    /// Negative and NaN sizes clamp to zero
    pub fn new(line_height: f32, quad_half_width: f32, quad_half_depth: f32) -> Self {
        Self {
            line_height: clamp_size(line_height),
            quad_half_width: clamp_size(quad_half_width),
            quad_half_depth: clamp_size(quad_half_depth),
        }
    }

    /// Same sizes with the clamping rules of [`Self::new`] re-applied
    pub fn sanitized(self) -> Self {
        Self::new(self.line_height, self.quad_half_width, self.quad_half_depth)
    }
}

fn clamp_size(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Inverted model-to-local mapping of the active viewport
///
/// Recomputed every tick, never stored beyond it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewDependentTransform(Mat4);

impl Default for ViewDependentTransform {
    fn default() -> Self {
        Self(Mat4::IDENTITY)
    }
}

impl ViewDependentTransform {
    pub fn from_model_to_local(model_to_local: Mat4) -> Result<Self, TransformError> {
        if !model_to_local.is_finite() {
            return Err(TransformError::NonFinite);
        }
        if model_to_local.determinant().abs() <= SINGULAR_EPSILON {
            return Err(TransformError::Singular);
        }
        Ok(Self(model_to_local.inverse()))
    }

    pub fn matrix(&self) -> Mat4 {
        self.0
    }
}

/// Transform composition failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("Transform contains non-finite values")]
    NonFinite,
    #[error("Transform is singular")]
    Singular,
}
