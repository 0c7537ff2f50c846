//! Triangle surfaces used as intersection targets

mod obj;

use glam::Vec3;

pub use obj::{load_obj, load_obj_from_bytes};

/// Indexed triangle surface
///
/// Face normals are computed once on construction. Degenerate triangles keep
/// a `None` normal and are never reported as hits.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    pub name: String,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    face_normals: Vec<Option<Vec3>>,
}

impl SurfaceMesh {
    /// Create a surface from vertices and triangle indices
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if vertices.is_empty() || indices.len() < 3 {
            return Err(MeshError::EmptyMesh);
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::Parse(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::Parse(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }

        let face_normals = indices
            .chunks_exact(3)
            .map(|tri| {
                let v0 = vertices[tri[0] as usize];
                let v1 = vertices[tri[1] as usize];
                let v2 = vertices[tri[2] as usize];
                calculate_triangle_normal(v0, v1, v2)
            })
            .collect();

        Ok(Self {
            name: name.into(),
            vertices,
            indices,
            face_normals,
        })
    }

    /// Axis-aligned square in the XZ plane at height `y`, facing +Y
    pub fn plane(y: f32, half_size: f32) -> Self {
        let h = half_size.abs().max(f32::EPSILON);
        let vertices = vec![
            Vec3::new(-h, y, -h),
            Vec3::new(-h, y, h),
            Vec3::new(h, y, h),
            Vec3::new(h, y, -h),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        let face_normals = vec![Some(Vec3::Y), Some(Vec3::Y)];
        Self {
            name: "plane".to_string(),
            vertices,
            indices,
            face_normals,
        }
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of a triangle
    pub fn triangle(&self, prim: usize) -> Option<[Vec3; 3]> {
        let start = prim.checked_mul(3)?;
        let tri = self.indices.get(start..start.checked_add(3)?)?;
        Some([
            *self.vertices.get(tri[0] as usize)?,
            *self.vertices.get(tri[1] as usize)?,
            *self.vertices.get(tri[2] as usize)?,
        ])
    }

    /// Unit face normal of a triangle, `None` when degenerate
    pub fn face_normal(&self, prim: usize) -> Option<Vec3> {
        self.face_normals.get(prim).copied().flatten()
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), v| (min.min(*v), max.max(*v)),
        )
    }
}

/// Unit normal of a triangle (counter-clockwise winding), `None` when degenerate
pub fn calculate_triangle_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Option<Vec3> {
    (v1 - v0).cross(v2 - v0).try_normalize()
}

/// Mesh-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty mesh: no geometry found")]
    EmptyMesh,
}
