//! Gizmo state machine

use glam::Mat4;
use tracing::{debug, trace, warn};

use super::{
    CompositeTransformBuilder, GizmoInstance, GizmoPart, GizmoSizeParameters, GizmoTransforms,
    OrientationSolver, Pose, TransformError, ViewDependentTransform,
};
use crate::constants::CURSOR_SIZE;
use crate::intersect::{HitResult, Ray, SurfaceHit};

/// Gizmo lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoPhase {
    /// Not drawn; the last tick missed the surface
    #[default]
    Hidden,
    /// Following the surface under the pointer
    Tracking,
    /// A placement is running
    Committing,
}

/// Result of one pointer-move tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Pose and transforms were replaced
    Updated,
    /// The tick was dropped and the previous state kept
    Retained(TransformError),
}

/// Result of a commit press
#[derive(Debug, Clone, PartialEq)]
pub enum CommitAttempt<T> {
    /// The placement ran and produced a value
    Committed(T),
    /// The button is still held from an earlier press
    Suppressed,
    /// Nothing under the pointer to commit to
    NoTarget,
}

/// Latest gizmo pose, sizes and part transforms
///
/// Owned by a single tool instance; never shared across viewports.
#[derive(Debug, Clone)]
pub struct GizmoState {
    phase: GizmoPhase,
    enabled: bool,
    cursor_size: f32,
    pose: Pose,
    sizes: GizmoSizeParameters,
    transforms: GizmoTransforms,
    last_hit: Option<SurfaceHit>,
    button_held: bool,
    colors: [[f32; 4]; 3],
}

impl Default for GizmoState {
    fn default() -> Self {
        Self::new(CURSOR_SIZE)
    }
}

impl GizmoState {
    /// Create a hidden gizmo whose pointer has the given uniform size
    pub fn new(cursor_size: f32) -> Self {
        let cursor_size = if cursor_size.is_finite() && cursor_size > 0.0 {
            cursor_size
        } else {
            CURSOR_SIZE
        };
        Self {
            phase: GizmoPhase::Hidden,
            enabled: true,
            cursor_size,
            pose: Pose::with_uniform_scale(cursor_size),
            sizes: GizmoSizeParameters::default(),
            transforms: GizmoTransforms::default(),
            last_hit: None,
            button_held: false,
            colors: [[0.0, 1.0, 0.0, 1.0]; 3],
        }
    }

    pub fn phase(&self) -> GizmoPhase {
        self.phase
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn sizes(&self) -> &GizmoSizeParameters {
        &self.sizes
    }

    pub fn transforms(&self) -> &GizmoTransforms {
        &self.transforms
    }

    pub fn last_hit(&self) -> Option<&SurfaceHit> {
        self.last_hit.as_ref()
    }

    pub fn is_button_held(&self) -> bool {
        self.button_held
    }

    /// Drawn only when enabled and the last tick hit the surface
    pub fn is_visible(&self) -> bool {
        self.enabled && self.phase != GizmoPhase::Hidden
    }

    /// Show or hide the gizmo regardless of hits
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_part_color(&mut self, part: GizmoPart, color: [f32; 4]) {
        self.colors[part as usize] = color;
    }

    /// Reset for a fresh tool session
    pub fn enter(&mut self) {
        self.pose.scale = glam::Vec3::splat(self.cursor_size);
        self.phase = GizmoPhase::Hidden;
        self.last_hit = None;
        self.button_held = false;
    }

    pub fn exit(&mut self) {
        self.phase = GizmoPhase::Hidden;
        self.last_hit = None;
        self.button_held = false;
    }

    /// Run one pointer-move tick
    ///
    /// On a hit the gizmo moves to the hit point and tracks; on a miss it
    /// keeps its last position, faces along the ray and hides. If the
    /// transforms cannot be built, nothing changes.
    pub fn update(
        &mut self,
        hit: &HitResult,
        ray: &Ray,
        model_to_local: Mat4,
        sizes: GizmoSizeParameters,
    ) -> TickOutcome {
        let rotation = OrientationSolver::solve(hit, ray.direction);
        let translation = hit.hit().map_or(self.pose.translation, |h| h.point);
        let candidate = Pose {
            translation,
            rotation,
            scale: self.pose.scale,
        };
        let sizes = sizes.sanitized();

        let built = ViewDependentTransform::from_model_to_local(model_to_local)
            .and_then(|view| CompositeTransformBuilder::build(&candidate, &view, &sizes));

        let transforms = match built {
            Ok(transforms) => transforms,
            Err(e) => {
                warn!("Gizmo update dropped, keeping previous transforms: {e}");
                return TickOutcome::Retained(e);
            }
        };

        self.pose = candidate;
        self.sizes = sizes;
        self.transforms = transforms;
        self.last_hit = hit.hit().copied();
        self.phase = if hit.is_hit() {
            GizmoPhase::Tracking
        } else {
            GizmoPhase::Hidden
        };
        trace!(phase = ?self.phase, translation = ?self.pose.translation, "Gizmo updated");

        TickOutcome::Updated
    }

    /// Handle a commit press
    ///
    /// `place` runs at most once per press: further presses are suppressed
    /// until [`Self::release`]. The phase is `Committing` while `place` runs
    /// and returns to `Tracking` afterwards, whether it succeeded or not.
    pub fn commit_with<T, E>(
        &mut self,
        place: impl FnOnce(&Pose, &SurfaceHit) -> Result<T, E>,
    ) -> Result<CommitAttempt<T>, E> {
        if self.button_held {
            debug!("Commit suppressed: button still held");
            return Ok(CommitAttempt::Suppressed);
        }
        self.button_held = true;

        let hit = match (self.enabled, self.phase, self.last_hit) {
            (true, GizmoPhase::Tracking, Some(hit)) => hit,
            _ => return Ok(CommitAttempt::NoTarget),
        };

        self.phase = GizmoPhase::Committing;
        let result = place(&self.pose, &hit);
        self.phase = GizmoPhase::Tracking;

        result.map(CommitAttempt::Committed)
    }

    /// Handle a commit release, re-arming the next press
    pub fn release(&mut self) {
        self.button_held = false;
    }

    /// Instances for the current frame, empty while hidden
    pub fn draw_instances(&self) -> Vec<GizmoInstance> {
        if !self.is_visible() {
            return Vec::new();
        }
        GizmoPart::ALL
            .iter()
            .map(|&part| {
                let transform = match part {
                    GizmoPart::Pointer => self.transforms.pointer,
                    GizmoPart::Pole => self.transforms.pole,
                    GizmoPart::Quad => self.transforms.quad,
                };
                GizmoInstance::new(transform, self.colors[part as usize])
            })
            .collect()
    }
}
