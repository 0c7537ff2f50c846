//! Ray/surface intersection
//!
//! The gizmo core treats intersection as an oracle supplied by whoever owns
//! the surface. [`SurfaceMesh`] is the built-in oracle for triangle surfaces.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::SurfaceMesh;

/// A ray in the surface's local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    /// Not required to be normalized
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point along the ray at parameter `t`
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Surface data at a ray hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHit {
    pub point: Vec3,
    /// Unit length, facing the ray origin
    pub normal: Vec3,
    /// Parametric coordinate inside the hit primitive (barycentric u, v, w)
    pub uvw: Vec3,
    /// Index of the hit primitive
    pub prim: usize,
}

/// Outcome of one intersection query
///
/// A miss carries no surface data, so it cannot be read by accident.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HitResult {
    #[default]
    Miss,
    Hit(SurfaceHit),
}

impl HitResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, HitResult::Hit(_))
    }

    pub fn hit(&self) -> Option<&SurfaceHit> {
        match self {
            HitResult::Hit(hit) => Some(hit),
            HitResult::Miss => None,
        }
    }

    /// Hit primitive, `None` standing in for the "no primitive" sentinel
    pub fn prim_id(&self) -> Option<usize> {
        self.hit().map(|h| h.prim)
    }
}

/// Ray/surface intersection service
pub trait RayIntersector {
    /// Closest intersection in front of the ray origin
    fn intersect(&self, ray: &Ray) -> HitResult;
}

impl RayIntersector for SurfaceMesh {
    fn intersect(&self, ray: &Ray) -> HitResult {
        let mut closest: Option<(f32, SurfaceHit)> = None;

        for prim in 0..self.triangle_count() {
            let Some(normal) = self.face_normal(prim) else {
                continue;
            };
            let Some([v0, v1, v2]) = self.triangle(prim) else {
                continue;
            };
            let Some((t, u, v)) = ray_triangle_intersection(ray.origin, ray.direction, v0, v1, v2)
            else {
                continue;
            };
            if closest.as_ref().is_some_and(|(best, _)| *best <= t) {
                continue;
            }

            let normal = if normal.dot(ray.direction) > 0.0 {
                -normal
            } else {
                normal
            };
            closest = Some((
                t,
                SurfaceHit {
                    point: ray.at(t),
                    normal,
                    uvw: Vec3::new(u, v, 1.0 - u - v),
                    prim,
                },
            ));
        }

        match closest {
            Some((_, hit)) => HitResult::Hit(hit),
            None => HitResult::Miss,
        }
    }
}

/// Ray-triangle intersection test (Möller–Trumbore).
///
/// Returns `(t, u, v)` where `t` is the ray parameter of the hit and `u`, `v`
/// are the barycentric weights of `v1` and `v2`. Hits behind the origin,
/// rays parallel to the triangle plane and degenerate rays return `None`.
/// Both faces of the triangle are hittable.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let p = ray_dir.cross(edge2);
    let det = edge1.dot(p);

    // Ray is parallel to the triangle plane
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray_origin - v0;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray_dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if t < EPSILON {
        return None;
    }

    Some((t, u, v))
}
