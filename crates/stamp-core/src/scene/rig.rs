//! Projection rig placement

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{NodeId, NodeKind, ParamValue, SceneError, SceneGraph, SceneMutator};
use crate::gizmo::{GizmoSizeParameters, Pose};
use crate::intersect::SurfaceHit;

/// Parameter set on rig containers so later commits can find them
pub const RIG_MARKER: &str = "projection_rig";

/// How projection rigs are built
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RigSettings {
    /// Name of the grouping container
    pub container_name: String,
    /// Input of the target node the rigs merge into
    pub secondary_input: usize,
    /// Grid rows
    pub grid_rows: i32,
    /// Grid columns
    pub grid_cols: i32,
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            container_name: "projections".to_string(),
            secondary_input: 1,
            grid_rows: 2,
            grid_cols: 2,
        }
    }
}

/// Everything a commit knows about where to place the rig
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigPlacement {
    pub pose: Pose,
    pub hit: SurfaceHit,
    pub sizes: GizmoSizeParameters,
}

/// Nodes touched by one rig placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RigHandle {
    pub container: NodeId,
    pub merge: NodeId,
    pub output: NodeId,
    pub grid: NodeId,
    pub transform: NodeId,
    pub normal: NodeId,
    pub uv_unwrap: NodeId,
    /// Whether this placement created the container
    pub created_container: bool,
}

struct Container {
    id: NodeId,
    merge: NodeId,
    output: NodeId,
}

impl SceneGraph {
    /// Rig container feeding `node`, together with its merge and output
    fn rig_container(&self, node: NodeId) -> Option<Container> {
        let container = self.node(node)?;
        if !container.kind.is_container()
            || container.param(RIG_MARKER) != Some(&ParamValue::Bool(true))
        {
            return None;
        }
        let output = self
            .children(Some(node))
            .find(|n| n.kind == NodeKind::Output)?;
        let merge = output.input(0)?;
        (self.node(merge)?.kind == NodeKind::Merge).then_some(Container {
            id: node,
            merge,
            output: output.id,
        })
    }

    /// Create an empty rig container wired into the target's secondary input
    fn create_container(
        &mut self,
        target: NodeId,
        network: Option<NodeId>,
        upstream: Option<NodeId>,
        settings: &RigSettings,
    ) -> Result<Container, SceneError> {
        let id = self.add_node(NodeKind::Subnet, &settings.container_name, network)?;
        self.set_param(id, RIG_MARKER, ParamValue::Bool(true))?;
        let merge = self.add_node(NodeKind::Merge, "merge", Some(id))?;
        let output = self.add_node(NodeKind::Output, "output0", Some(id))?;
        self.connect(merge, output, 0)?;

        // Keep whatever already fed the secondary input
        if let Some(upstream) = upstream {
            self.connect(upstream, merge, 0)?;
        }
        self.connect(id, target, settings.secondary_input)?;

        Ok(Container { id, merge, output })
    }

    fn build_rig(
        &mut self,
        target: NodeId,
        placement: &RigPlacement,
        settings: &RigSettings,
    ) -> Result<RigHandle, SceneError> {
        let network = self
            .node(target)
            .ok_or(SceneError::NodeNotFound(target))?
            .parent;
        let existing = self.input(target, settings.secondary_input);
        let (container, created_container) =
            match existing.and_then(|id| self.rig_container(id)) {
                Some(container) => (container, false),
                None => (
                    self.create_container(target, network, existing, settings)?,
                    true,
                ),
            };

        let sizes = placement.sizes;
        let grid = self.add_node(NodeKind::Grid, "grid", Some(container.id))?;
        self.set_param(grid, "orient", ParamValue::Text("zx".to_string()))?;
        self.set_param(
            grid,
            "size",
            ParamValue::Vec2([sizes.quad_half_width * 2.0, sizes.quad_half_depth * 2.0]),
        )?;
        self.set_param(grid, "center", ParamValue::Vec3([0.0, sizes.line_height, 0.0]))?;
        self.set_param(grid, "rows", ParamValue::Int(settings.grid_rows))?;
        self.set_param(grid, "cols", ParamValue::Int(settings.grid_cols))?;

        let transform = self.add_node(NodeKind::Transform, "transform", Some(container.id))?;
        self.set_param(
            transform,
            "t",
            ParamValue::Vec3(placement.pose.translation.to_array()),
        )?;
        self.set_param(
            transform,
            "r",
            ParamValue::Vec3(placement.pose.euler_degrees().to_array()),
        )?;
        self.set_param(
            transform,
            "s",
            ParamValue::Vec3(placement.pose.scale.to_array()),
        )?;
        self.set_param(transform, "rord", ParamValue::Text("xyz".to_string()))?;
        let prim = i32::try_from(placement.hit.prim).map_err(|_| SceneError::InvalidParam {
            node: transform,
            name: "prim".to_string(),
        })?;
        self.set_param(transform, "prim", ParamValue::Int(prim))?;
        self.connect(grid, transform, 0)?;

        let normal = self.add_node(NodeKind::Normal, "normal", Some(container.id))?;
        self.set_param(normal, "type", ParamValue::Text("point".to_string()))?;
        self.connect(transform, normal, 0)?;

        let uv_unwrap = self.add_node(NodeKind::UvUnwrap, "uvunwrap", Some(container.id))?;
        self.set_param(uv_unwrap, "plane", ParamValue::Text("zx".to_string()))?;
        self.connect(normal, uv_unwrap, 0)?;

        let slot = self
            .next_free_input(container.merge)
            .ok_or(SceneError::InputOutOfRange {
                node: container.merge,
                index: usize::MAX,
            })?;
        self.connect(uv_unwrap, container.merge, slot)?;

        Ok(RigHandle {
            container: container.id,
            merge: container.merge,
            output: container.output,
            grid,
            transform,
            normal,
            uv_unwrap,
            created_container,
        })
    }
}

impl SceneMutator for SceneGraph {
    fn place_projection_rig(
        &mut self,
        target: NodeId,
        placement: &RigPlacement,
    ) -> Result<RigHandle, SceneError> {
        let settings = self.rig_settings().clone();
        let handle = self.transaction("Place projection primitive", |graph| {
            graph.build_rig(target, placement, &settings)
        })?;
        info!(
            container = %handle.container,
            created = handle.created_container,
            translation = ?placement.pose.translation,
            "Projection rig placed"
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn placement_at(point: Vec3) -> RigPlacement {
        RigPlacement {
            pose: Pose {
                translation: point,
                rotation: Quat::IDENTITY,
                scale: Vec3::splat(0.05),
            },
            hit: SurfaceHit {
                point,
                normal: Vec3::Y,
                uvw: Vec3::ZERO,
                prim: 7,
            },
            sizes: GizmoSizeParameters::new(1.0, 0.5, 0.25),
        }
    }

    fn scene_with_target(max_inputs: usize) -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let network = graph.add_node(NodeKind::Subnet, "geo", None).unwrap();
        let target = graph
            .add_node(NodeKind::Geometry { max_inputs }, "image_stamp", Some(network))
            .unwrap();
        (graph, target)
    }

    #[test]
    fn test_first_commit_creates_one_container() {
        let (mut graph, target) = scene_with_target(2);
        let handle = graph
            .place_projection_rig(target, &placement_at(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();

        assert!(handle.created_container);
        assert_eq!(graph.input(target, 1), Some(handle.container));
        let inside: Vec<_> = graph.children(Some(handle.container)).map(|n| n.kind).collect();
        assert_eq!(inside.iter().filter(|k| **k == NodeKind::Merge).count(), 1);
        assert_eq!(inside.iter().filter(|k| **k == NodeKind::Output).count(), 1);
        assert_eq!(graph.input(handle.output, 0), Some(handle.merge));

        // grid -> transform -> normal -> uvunwrap -> merge
        assert_eq!(graph.input(handle.transform, 0), Some(handle.grid));
        assert_eq!(graph.input(handle.normal, 0), Some(handle.transform));
        assert_eq!(graph.input(handle.uv_unwrap, 0), Some(handle.normal));
        assert_eq!(graph.input(handle.merge, 0), Some(handle.uv_unwrap));

        let transform = graph.node(handle.transform).unwrap();
        assert_eq!(transform.param("t"), Some(&ParamValue::Vec3([1.0, 2.0, 3.0])));
        assert_eq!(transform.param("s"), Some(&ParamValue::Vec3([0.05; 3])));
        assert_eq!(transform.param("prim"), Some(&ParamValue::Int(7)));
        let grid = graph.node(handle.grid).unwrap();
        assert_eq!(grid.param("size"), Some(&ParamValue::Vec2([1.0, 0.5])));
    }

    #[test]
    fn test_second_commit_reuses_container() {
        let (mut graph, target) = scene_with_target(2);
        let first = graph
            .place_projection_rig(target, &placement_at(Vec3::ZERO))
            .unwrap();
        let second = graph
            .place_projection_rig(target, &placement_at(Vec3::X))
            .unwrap();

        assert!(!second.created_container);
        assert_eq!(first.container, second.container);
        assert_eq!(graph.count_kind(NodeKind::Subnet), 2); // network + rig container
        assert_eq!(graph.count_kind(NodeKind::Merge), 1);
        assert_eq!(graph.count_kind(NodeKind::Output), 1);
        assert_eq!(graph.count_kind(NodeKind::Grid), 2);
        assert_eq!(graph.input(first.merge, 1), Some(second.uv_unwrap));
    }

    #[test]
    fn test_existing_secondary_input_is_merged_in() {
        let (mut graph, target) = scene_with_target(2);
        let network = graph.node(target).unwrap().parent;
        let upstream = graph
            .add_node(NodeKind::Geometry { max_inputs: 0 }, "existing", network)
            .unwrap();
        graph.connect(upstream, target, 1).unwrap();

        let handle = graph
            .place_projection_rig(target, &placement_at(Vec3::ZERO))
            .unwrap();
        assert!(handle.created_container);
        assert_eq!(graph.input(handle.merge, 0), Some(upstream));
        assert_eq!(graph.input(handle.merge, 1), Some(handle.uv_unwrap));
        assert_eq!(graph.input(target, 1), Some(handle.container));
    }

    #[test]
    fn test_failed_placement_leaves_scene_untouched() {
        let (mut graph, target) = scene_with_target(1);
        let before: Vec<_> = graph.nodes().cloned().collect();

        let result = graph.place_projection_rig(target, &placement_at(Vec3::ZERO));
        assert_eq!(
            result,
            Err(SceneError::InputOutOfRange {
                node: target,
                index: 1
            })
        );
        let after: Vec<_> = graph.nodes().cloned().collect();
        assert_eq!(before, after);
        assert!(!graph.can_undo());
    }

    #[test]
    fn test_oversized_prim_rolls_back() {
        let (mut graph, target) = scene_with_target(2);
        let before = graph.len();
        let mut placement = placement_at(Vec3::ZERO);
        placement.hit.prim = usize::MAX;

        let result = graph.place_projection_rig(target, &placement);
        assert!(matches!(result, Err(SceneError::InvalidParam { ref name, .. }) if name == "prim"));
        assert_eq!(graph.len(), before);
        assert_eq!(graph.input(target, 1), None);
    }

    #[test]
    fn test_missing_target() {
        let mut graph = SceneGraph::new();
        let ghost = NodeId::new();
        let result = graph.place_projection_rig(ghost, &placement_at(Vec3::ZERO));
        assert_eq!(result, Err(SceneError::NodeNotFound(ghost)));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_placement_undoes_as_one_unit() {
        let (mut graph, target) = scene_with_target(2);
        let before = graph.len();
        graph
            .place_projection_rig(target, &placement_at(Vec3::ZERO))
            .unwrap();
        assert!(graph.len() > before);

        assert_eq!(graph.undo().as_deref(), Some("Place projection primitive"));
        assert_eq!(graph.len(), before);
        assert_eq!(graph.input(target, 1), None);
    }
}
