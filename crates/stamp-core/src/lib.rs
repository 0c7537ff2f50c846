//! Stamp tool core
//!
//! Surface-locked cursor gizmo for placing projection rigs, plus the tile
//! batch export runner that ships alongside it.
//!
//! # Architecture
//!
//! The core never talks to a host directly. Everything it needs from the
//! outside world comes in through small traits:
//!
//! - [`intersect::RayIntersector`] - ray/surface queries
//! - [`tool::ViewportQuery`] - the active viewport's model-to-local mapping
//! - [`tool::ParameterSource`] - UI-bound scalar parameters
//! - [`scene::SceneMutator`] - projection rig placement
//! - [`export::ExportHost`] - per-tile render and cache invalidation
//!
//! # Module Structure
//!
//! ```text
//! stamp-core/
//! ├── constants.rs     # Axes, default sizes, tile tokens
//! ├── config.rs        # RON-backed tool configuration
//! ├── mesh/            # OBJ loading into a triangle surface
//! ├── intersect.rs     # Ray intersector trait + triangle mesh oracle
//! ├── gizmo/           # Orientation, composite transforms, gizmo state
//! ├── tool.rs          # ViewportTool event interface + StampTool
//! ├── scene/           # In-memory scene graph and rig placement
//! └── export/          # Tile template + batch export job
//! ```

pub mod config;
pub mod constants;
pub mod export;
pub mod gizmo;
pub mod intersect;
pub mod mesh;
pub mod scene;
pub mod tool;

pub use config::{ConfigError, ToolConfig};
pub use export::{BatchExportJob, ExportError, ExportHost, ExportReport, TileTemplate};
pub use gizmo::{
    CompositeTransformBuilder, GizmoInstance, GizmoPart, GizmoPhase, GizmoSizeParameters,
    GizmoState, GizmoTransforms, OrientationSolver, Pose, TransformError,
    ViewDependentTransform,
};
pub use intersect::{HitResult, Ray, RayIntersector, SurfaceHit};
pub use mesh::{MeshError, SurfaceMesh};
pub use scene::{NodeId, NodeKind, RigHandle, SceneError, SceneGraph, SceneMutator};
pub use tool::{StampTool, ViewportTool};
