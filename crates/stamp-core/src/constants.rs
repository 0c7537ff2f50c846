//! Global constants for stamp-core

use glam::Vec3;

/// Reference axis rotated onto the surface normal on a hit
pub const UP_AXIS: Vec3 = Vec3::Y;

/// Reference axis rotated onto the view ray on a miss
pub const FORWARD_AXIS: Vec3 = Vec3::Z;

/// Directions shorter than this are treated as zero-length
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// Determinant magnitude below which a matrix is considered singular
pub const SINGULAR_EPSILON: f32 = 1e-12;

/// Default pointer size (uniform scale of the cursor primitive)
pub const CURSOR_SIZE: f32 = 0.05;

/// Default pole height
pub const LINE_HEIGHT: f32 = 1.0;

/// Default quad half-extent along both horizontal axes
pub const QUAD_HALF_EXTENT: f32 = 0.5;

/// Input slots on a merge node
pub const MAX_MERGE_INPUTS: usize = 1024;

/// Default tool prompt
pub const PROMPT: &str = "Left-click to place a projection primitive.";

/// Parameter names read from the parameter source every tick
pub mod params {
    /// Pole height
    pub const LINE_HEIGHT: &str = "line_height";
    /// Quad half-extent along X
    pub const QUAD_WIDTH: &str = "quad_width";
    /// Quad half-extent along Z
    pub const QUAD_HEIGHT: &str = "quad_height";
}

/// Placeholder tokens recognized in export path templates
pub const TILE_TOKENS: [&str; 4] = ["<udim>", "<UDIM>", "<uvtile>", "<UVTILE>"];

/// Caches invalidated after a batch export
pub const DEFAULT_CACHES: [&str; 2] = ["glcache", "texcache"];
