//! Viewport tool interface
//!
//! A host adapter forwards its lifecycle and input callbacks to a
//! [`ViewportTool`]. Every collaborator a callback needs arrives in a typed
//! context; the tool never looks anything up from ambient state.

use std::collections::HashMap;

use glam::Mat4;
use tracing::{debug, info, warn};

use crate::config::ToolConfig;
use crate::constants::params;
use crate::gizmo::{
    CommitAttempt, GizmoInstance, GizmoPart, GizmoSizeParameters, GizmoState, TickOutcome,
};
use crate::intersect::{Ray, RayIntersector};
use crate::scene::{NodeId, RigHandle, RigPlacement, SceneError, SceneMutator};

/// Active viewport queries
pub trait ViewportQuery {
    /// Mapping from model space to the surface's local space
    fn model_to_local_transform(&self) -> Mat4;
}

/// Viewport with a constant model-to-local mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedViewport(pub Mat4);

impl Default for FixedViewport {
    fn default() -> Self {
        Self(Mat4::IDENTITY)
    }
}

impl ViewportQuery for FixedViewport {
    fn model_to_local_transform(&self) -> Mat4 {
        self.0
    }
}

/// UI-bound scalar parameters
pub trait ParameterSource {
    fn float(&self, name: &str) -> Option<f32>;
}

/// Map-backed parameter source
#[derive(Debug, Clone, Default)]
pub struct StaticParameters {
    values: HashMap<String, f32>,
}

impl StaticParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f32) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: f32) {
        self.values.insert(name.to_string(), value);
    }
}

impl ParameterSource for StaticParameters {
    fn float(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }
}

/// Context for [`ViewportTool::on_enter`]
#[derive(Debug, Clone, Default)]
pub struct EnterContext {
    prompt: Option<String>,
}

impl EnterContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = Some(prompt.into());
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }
}

/// Context for [`ViewportTool::on_pointer_move`]
pub struct PointerContext<'a> {
    /// Pointer ray in the surface's local space
    pub ray: Ray,
    pub surface: &'a dyn RayIntersector,
    pub viewport: &'a dyn ViewportQuery,
    pub params: &'a dyn ParameterSource,
}

/// Primary button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Context for [`ViewportTool::on_commit`]
pub struct CommitContext<'a> {
    pub button: ButtonState,
    /// Node whose secondary input receives the rig
    pub target: NodeId,
    pub scene: &'a mut dyn SceneMutator,
}

/// Context for [`ViewportTool::on_draw`]
#[derive(Debug, Clone, Default)]
pub struct DrawContext {
    instances: Vec<GizmoInstance>,
    glow_width: u32,
}

impl DrawContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, instance: GizmoInstance) {
        self.instances.push(instance);
    }

    pub fn instances(&self) -> &[GizmoInstance] {
        &self.instances
    }

    /// Width in pixels of the highlight glow drawn behind the instances
    pub fn set_glow_width(&mut self, width: u32) {
        self.glow_width = width;
    }

    pub fn glow_width(&self) -> u32 {
        self.glow_width
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.glow_width = 0;
    }
}

/// What a commit event did
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// A rig was placed
    Placed(RigHandle),
    /// Press ignored while the button is held
    Suppressed,
    /// Press with nothing under the pointer
    NoTarget,
    /// Button released, next press is armed
    Released,
    /// The scene rejected the rig; nothing was changed
    Failed(SceneError),
}

/// Event interface a host adapter drives
///
/// Pointer moves are never consumed: the host keeps processing them for
/// navigation after the tool has seen them.
pub trait ViewportTool {
    fn on_enter(&mut self, ctx: &mut EnterContext);
    fn on_exit(&mut self);
    fn on_pointer_move(&mut self, ctx: &PointerContext<'_>);
    fn on_commit(&mut self, ctx: &mut CommitContext<'_>) -> CommitOutcome;
    fn on_draw(&self, ctx: &mut DrawContext);
}

/// Tool that stamps projection rigs onto a surface
///
/// Create one per viewport.
#[derive(Debug, Clone)]
pub struct StampTool {
    state: GizmoState,
    config: ToolConfig,
}

impl Default for StampTool {
    fn default() -> Self {
        Self::new(ToolConfig::default())
    }
}

impl StampTool {
    pub fn new(config: ToolConfig) -> Self {
        let mut state = GizmoState::new(config.cursor.size);
        state.set_part_color(GizmoPart::Pointer, config.cursor.pointer_color);
        state.set_part_color(GizmoPart::Pole, config.cursor.pole_color);
        state.set_part_color(GizmoPart::Quad, config.cursor.quad_color);
        Self { state, config }
    }

    pub fn state(&self) -> &GizmoState {
        &self.state
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Show or hide the gizmo without leaving the tool
    pub fn set_gizmo_enabled(&mut self, enabled: bool) {
        self.state.set_enabled(enabled);
    }

    /// Sizes for this tick, falling back to the configured defaults
    fn read_sizes(&self, source: &dyn ParameterSource) -> GizmoSizeParameters {
        let defaults = self.config.gizmo;
        GizmoSizeParameters::new(
            source
                .float(params::LINE_HEIGHT)
                .unwrap_or(defaults.line_height),
            source
                .float(params::QUAD_WIDTH)
                .unwrap_or(defaults.quad_half_width),
            source
                .float(params::QUAD_HEIGHT)
                .unwrap_or(defaults.quad_half_depth),
        )
    }
}

impl ViewportTool for StampTool {
    fn on_enter(&mut self, ctx: &mut EnterContext) {
        self.state.enter();
        ctx.set_prompt(self.config.cursor.prompt.clone());
        debug!("Stamp tool entered");
    }

    fn on_exit(&mut self) {
        self.state.exit();
        debug!("Stamp tool exited");
    }

    fn on_pointer_move(&mut self, ctx: &PointerContext<'_>) {
        let sizes = self.read_sizes(ctx.params);
        let model_to_local = ctx.viewport.model_to_local_transform();
        let hit = ctx.surface.intersect(&ctx.ray);

        if let TickOutcome::Retained(e) = self.state.update(&hit, &ctx.ray, model_to_local, sizes)
        {
            debug!("Pointer move kept previous gizmo: {e}");
        }
    }

    fn on_commit(&mut self, ctx: &mut CommitContext<'_>) -> CommitOutcome {
        if ctx.button == ButtonState::Released {
            self.state.release();
            return CommitOutcome::Released;
        }

        let sizes = *self.state.sizes();
        let target = ctx.target;
        let scene = &mut *ctx.scene;
        let attempt = self.state.commit_with(|pose, hit| {
            scene.place_projection_rig(
                target,
                &RigPlacement {
                    pose: *pose,
                    hit: *hit,
                    sizes,
                },
            )
        });

        match attempt {
            Ok(CommitAttempt::Committed(handle)) => {
                info!(node = %target, "Projection primitive placed");
                CommitOutcome::Placed(handle)
            }
            Ok(CommitAttempt::Suppressed) => CommitOutcome::Suppressed,
            Ok(CommitAttempt::NoTarget) => CommitOutcome::NoTarget,
            Err(e) => {
                warn!("Projection primitive not placed: {e}");
                CommitOutcome::Failed(e)
            }
        }
    }

    fn on_draw(&self, ctx: &mut DrawContext) {
        let instances = self.state.draw_instances();
        if instances.is_empty() {
            return;
        }
        ctx.set_glow_width(self.config.cursor.glow_width);
        for instance in instances {
            ctx.submit(instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gizmo::GizmoPhase;
    use crate::mesh::SurfaceMesh;
    use crate::scene::{Node, NodeKind, ParamValue, SceneGraph};
    use glam::{EulerRot, Quat, Vec3};

    struct Fixture {
        surface: SurfaceMesh,
        viewport: FixedViewport,
        params: StaticParameters,
        scene: SceneGraph,
        target: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scene = SceneGraph::new();
            let target = scene
                .add_node(NodeKind::Geometry { max_inputs: 2 }, "image_stamp", None)
                .unwrap();
            Self {
                surface: SurfaceMesh::plane(2.0, 10.0),
                viewport: FixedViewport::default(),
                params: StaticParameters::new(),
                scene,
                target,
            }
        }

        fn move_to(&self, tool: &mut StampTool, x: f32, z: f32) {
            tool.on_pointer_move(&PointerContext {
                ray: Ray::new(Vec3::new(x, 20.0, z), Vec3::NEG_Y),
                surface: &self.surface,
                viewport: &self.viewport,
                params: &self.params,
            })
        }

        fn button(&mut self, tool: &mut StampTool, button: ButtonState) -> CommitOutcome {
            tool.on_commit(&mut CommitContext {
                button,
                target: self.target,
                scene: &mut self.scene,
            })
        }
    }

    /// Records placements without touching a scene
    #[derive(Default)]
    struct CountingScene {
        placements: Vec<RigPlacement>,
    }

    impl SceneMutator for CountingScene {
        fn place_projection_rig(
            &mut self,
            _target: NodeId,
            placement: &RigPlacement,
        ) -> Result<RigHandle, SceneError> {
            self.placements.push(*placement);
            let id = NodeId::new();
            Ok(RigHandle {
                container: id,
                merge: id,
                output: id,
                grid: id,
                transform: id,
                normal: id,
                uv_unwrap: id,
                created_container: self.placements.len() == 1,
            })
        }
    }

    #[test]
    fn test_enter_sets_prompt_and_hides() {
        let mut tool = StampTool::default();
        let mut ctx = EnterContext::new();
        tool.on_enter(&mut ctx);
        assert_eq!(ctx.prompt(), Some(crate::constants::PROMPT));
        assert_eq!(tool.state().phase(), GizmoPhase::Hidden);
    }

    #[test]
    fn test_pointer_over_surface_tracks() {
        let fixture = Fixture::new();
        let mut tool = StampTool::default();

        fixture.move_to(&mut tool, 1.0, 3.0);
        assert_eq!(tool.state().phase(), GizmoPhase::Tracking);

        let (_, rotation, translation) =
            tool.state().transforms().pointer.to_scale_rotation_translation();
        assert!(translation.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
        assert!(rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));

        fixture.move_to(&mut tool, 50.0, 0.0);
        assert_eq!(tool.state().phase(), GizmoPhase::Hidden);
    }

    #[test]
    fn test_parameters_drive_sizes() {
        let mut fixture = Fixture::new();
        fixture.params = StaticParameters::new()
            .with(params::LINE_HEIGHT, 3.0)
            .with(params::QUAD_WIDTH, 0.0)
            .with(params::QUAD_HEIGHT, 0.0);
        let mut tool = StampTool::default();

        fixture.move_to(&mut tool, 0.0, 0.0);
        let sizes = tool.state().sizes();
        assert_eq!(sizes.line_height, 3.0);
        assert_eq!(tool.state().transforms().quad.x_axis.length(), 0.0);
    }

    #[test]
    fn test_unbound_parameters_use_config() {
        let fixture = Fixture::new();
        let mut config = ToolConfig::default();
        config.gizmo = GizmoSizeParameters::new(4.0, 1.0, 2.0);
        let mut tool = StampTool::new(config);

        fixture.move_to(&mut tool, 0.0, 0.0);
        assert_eq!(*tool.state().sizes(), GizmoSizeParameters::new(4.0, 1.0, 2.0));
    }

    #[test]
    fn test_held_button_places_once() {
        let fixture = Fixture::new();
        let mut tool = StampTool::default();
        let mut scene = CountingScene::default();
        fixture.move_to(&mut tool, 0.0, 0.0);

        let press = |tool: &mut StampTool, scene: &mut CountingScene, button| {
            tool.on_commit(&mut CommitContext {
                button,
                target: fixture.target,
                scene,
            })
        };

        assert!(matches!(
            press(&mut tool, &mut scene, ButtonState::Pressed),
            CommitOutcome::Placed(_)
        ));
        for _ in 0..3 {
            fixture.move_to(&mut tool, 0.5, 0.5);
            assert_eq!(
                press(&mut tool, &mut scene, ButtonState::Pressed),
                CommitOutcome::Suppressed
            );
        }
        assert_eq!(scene.placements.len(), 1);

        assert_eq!(
            press(&mut tool, &mut scene, ButtonState::Released),
            CommitOutcome::Released
        );
        assert!(matches!(
            press(&mut tool, &mut scene, ButtonState::Pressed),
            CommitOutcome::Placed(_)
        ));
        assert_eq!(scene.placements.len(), 2);
        assert!(
            scene.placements[1]
                .pose
                .translation
                .abs_diff_eq(Vec3::new(0.5, 2.0, 0.5), 1e-5)
        );
    }

    #[test]
    fn test_press_off_surface_places_nothing() {
        let mut fixture = Fixture::new();
        let mut tool = StampTool::default();
        fixture.move_to(&mut tool, 50.0, 50.0);

        assert_eq!(
            fixture.button(&mut tool, ButtonState::Pressed),
            CommitOutcome::NoTarget
        );
        assert_eq!(fixture.scene.count_kind(NodeKind::Grid), 0);
    }

    #[test]
    fn test_commits_share_one_container() {
        let mut fixture = Fixture::new();
        let mut tool = StampTool::default();

        fixture.move_to(&mut tool, 0.0, 0.0);
        fixture.button(&mut tool, ButtonState::Pressed);
        fixture.button(&mut tool, ButtonState::Released);
        fixture.move_to(&mut tool, 1.0, 0.0);
        fixture.button(&mut tool, ButtonState::Pressed);

        assert_eq!(fixture.scene.count_kind(NodeKind::Subnet), 1);
        assert_eq!(fixture.scene.count_kind(NodeKind::Merge), 1);
        assert_eq!(fixture.scene.count_kind(NodeKind::Output), 1);
        assert_eq!(fixture.scene.count_kind(NodeKind::Grid), 2);
    }

    fn vec3_param(node: &Node, name: &str) -> Vec3 {
        match node.param(name) {
            Some(ParamValue::Vec3(v)) => Vec3::from_array(*v),
            other => panic!("{name}: {other:?}"),
        }
    }

    #[test]
    fn test_placed_rig_matches_preview_quad() {
        let mut fixture = Fixture::new();
        // Slope with normal (1, 1, 0) so the placement carries a rotation
        fixture.surface = SurfaceMesh::new(
            "slope",
            vec![
                Vec3::new(10.0, -10.0, -10.0),
                Vec3::new(10.0, -10.0, 10.0),
                Vec3::new(-10.0, 10.0, 0.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap();
        let mut tool = StampTool::default();
        fixture.move_to(&mut tool, 1.0, 1.0);
        assert_eq!(tool.state().phase(), GizmoPhase::Tracking);

        let CommitOutcome::Placed(handle) = fixture.button(&mut tool, ButtonState::Pressed) else {
            panic!("rig not placed");
        };
        let grid = fixture.scene.node(handle.grid).unwrap();
        let transform = fixture.scene.node(handle.transform).unwrap();

        let size = match grid.param("size") {
            Some(ParamValue::Vec2(v)) => *v,
            other => panic!("size: {other:?}"),
        };
        let r = vec3_param(transform, "r");
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            r.x.to_radians(),
            r.y.to_radians(),
            r.z.to_radians(),
        );
        let rig = Mat4::from_scale_rotation_translation(
            vec3_param(transform, "s"),
            rotation,
            vec3_param(transform, "t"),
        );

        let quad = tool.state().transforms().quad;
        for (x, z) in [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            let grid_corner =
                vec3_param(grid, "center") + Vec3::new(x * size[0] * 0.5, 0.0, z * size[1] * 0.5);
            let placed = rig.transform_point3(grid_corner);
            let preview = quad.transform_point3(Vec3::new(x, 0.0, z));
            assert!(placed.abs_diff_eq(preview, 1e-4), "{placed} != {preview}");
        }
    }

    #[test]
    fn test_scene_failure_is_absorbed() {
        let mut fixture = Fixture::new();
        let one_input = fixture
            .scene
            .add_node(NodeKind::Geometry { max_inputs: 1 }, "narrow", None)
            .unwrap();
        fixture.target = one_input;
        let before = fixture.scene.len();
        let mut tool = StampTool::default();

        fixture.move_to(&mut tool, 0.0, 0.0);
        let outcome = fixture.button(&mut tool, ButtonState::Pressed);
        assert!(matches!(outcome, CommitOutcome::Failed(_)));
        assert_eq!(fixture.scene.len(), before);
        assert_eq!(tool.state().phase(), GizmoPhase::Tracking);
    }

    #[test]
    fn test_draw_follows_latest_move() {
        let fixture = Fixture::new();
        let mut tool = StampTool::default();
        let mut draw = DrawContext::new();

        tool.on_draw(&mut draw);
        assert!(draw.instances().is_empty());
        assert_eq!(draw.glow_width(), 0);

        fixture.move_to(&mut tool, 2.0, -1.0);
        tool.on_draw(&mut draw);
        assert_eq!(draw.instances().len(), 3);
        assert_eq!(draw.glow_width(), tool.config().cursor.glow_width);
        let pointer = draw.instances()[0].matrix();
        assert!(
            pointer
                .transform_point3(Vec3::ZERO)
                .abs_diff_eq(Vec3::new(2.0, 2.0, -1.0), 1e-5)
        );

        draw.clear();
        tool.set_gizmo_enabled(false);
        tool.on_draw(&mut draw);
        assert!(draw.instances().is_empty());
    }

    #[test]
    fn test_tool_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<StampTool>();
    }

    #[test]
    fn test_viewports_have_independent_state() {
        let fixture = Fixture::new();
        let mut left = StampTool::default();
        let right = StampTool::default();

        fixture.move_to(&mut left, 0.0, 0.0);
        assert_eq!(left.state().phase(), GizmoPhase::Tracking);
        assert_eq!(right.state().phase(), GizmoPhase::Hidden);
    }
}
