//! OBJ surface loading

use std::io::{BufRead, Cursor};
use std::path::Path;

use glam::Vec3;

use super::{MeshError, SurfaceMesh};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Load an OBJ file as a single surface
pub fn load_obj(path: impl AsRef<Path>) -> Result<SurfaceMesh, MeshError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MeshError::Io(format!("{} does not exist", path.display())));
    }

    let (models, _materials) =
        tobj::load_obj(path, &load_options()).map_err(|e| MeshError::Parse(e.to_string()))?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("surface")
        .to_string();
    combine_models(name, &models)
}

/// Load an OBJ surface from in-memory bytes
pub fn load_obj_from_bytes(name: &str, data: &[u8]) -> Result<SurfaceMesh, MeshError> {
    let mut cursor = Cursor::new(data);
    load_obj_from_reader(name, &mut cursor)
}

fn load_obj_from_reader(name: &str, reader: &mut impl BufRead) -> Result<SurfaceMesh, MeshError> {
    let (models, _materials) =
        tobj::load_obj_buf(reader, &load_options(), |_| Ok(Default::default()))
            .map_err(|e| MeshError::Parse(e.to_string()))?;
    combine_models(name.to_string(), &models)
}

/// Merge every model of an OBJ into one indexed surface
fn combine_models(name: String, models: &[tobj::Model]) -> Result<SurfaceMesh, MeshError> {
    if models.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let mut vertices: Vec<Vec3> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for model in models {
        let mesh = &model.mesh;
        let vertex_offset = vertices.len() as u32;

        vertices.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|c| Vec3::new(c[0], c[1], c[2])),
        );
        indices.extend(mesh.indices.iter().map(|&i| vertex_offset + i));
    }

    SurfaceMesh::new(name, vertices, indices)
}
