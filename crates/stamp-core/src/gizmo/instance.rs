//! Draw-ready gizmo instance data

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Visual part of the gizmo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GizmoPart {
    Pointer,
    Pole,
    Quad,
}

impl GizmoPart {
    pub const ALL: [GizmoPart; 3] = [GizmoPart::Pointer, GizmoPart::Pole, GizmoPart::Quad];
}

/// Per-part instance data, laid out for direct upload as a vertex instance
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GizmoInstance {
    /// Part transform (column-major).
    pub transform: [[f32; 4]; 4],
    /// Part color (RGBA).
    pub color: [f32; 4],
}

impl GizmoInstance {
    /// Creates a new gizmo instance.
    pub fn new(transform: Mat4, color: [f32; 4]) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            color,
        }
    }

    /// Transform as a matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform)
    }
}

impl Default for GizmoInstance {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY.to_cols_array_2d(),
            color: [0.0, 1.0, 0.0, 1.0],
        }
    }
}
