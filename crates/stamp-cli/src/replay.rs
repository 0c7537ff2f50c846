//! Session replay
//!
//! Drives a [`StampTool`] with a recorded event list against an OBJ surface
//! and an in-memory scene graph.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use serde::Deserialize;
use stamp_core::tool::{
    ButtonState, CommitContext, CommitOutcome, DrawContext, EnterContext, FixedViewport,
    PointerContext, StaticParameters,
};
use stamp_core::{NodeId, NodeKind, Ray, SceneGraph, StampTool, ToolConfig, ViewportTool};
use tracing::{debug, info, warn};

use crate::error::{CliError, read_ron};

/// One recorded viewport event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum SessionEvent {
    /// Pointer ray in the surface's local space
    Move { origin: [f32; 3], direction: [f32; 3] },
    Press,
    Release,
    Draw,
}

/// Replay input file
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// OBJ surface, relative to the session file
    pub surface: PathBuf,
    /// Tool configuration, relative to the session file
    #[serde(default)]
    pub config: Option<PathBuf>,
    /// Column-major model-to-local matrix
    #[serde(default)]
    pub model_to_local: Option<[f32; 16]>,
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
    pub events: Vec<SessionEvent>,
}

/// What a replay did
#[derive(Debug)]
pub struct ReplayResult {
    pub scene: SceneGraph,
    pub target: NodeId,
    pub placed: usize,
    pub failed: usize,
    /// Instance count of every `Draw` event
    pub draws: Vec<usize>,
}

impl ReplayResult {
    pub fn scene_ron(&self) -> Result<String, CliError> {
        ron::ser::to_string_pretty(&self.scene, ron::ser::PrettyConfig::default())
            .map_err(|e| CliError::Serialize(e.to_string()))
    }
}

pub fn replay_file(path: impl AsRef<Path>) -> Result<ReplayResult, CliError> {
    let path = path.as_ref();
    let session: Session = read_ron(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    replay(&session, base)
}

/// Replay a session, resolving its relative paths against `base`
pub fn replay(session: &Session, base: &Path) -> Result<ReplayResult, CliError> {
    let surface = stamp_core::mesh::load_obj(base.join(&session.surface))?;
    let config = match &session.config {
        Some(config) => ToolConfig::load(base.join(config))?,
        None => ToolConfig::default(),
    };
    info!(
        surface = %surface.name,
        triangles = surface.triangle_count(),
        events = session.events.len(),
        "Replaying session"
    );

    let viewport = FixedViewport(
        session
            .model_to_local
            .map_or(Mat4::IDENTITY, |m| Mat4::from_cols_array(&m)),
    );
    let mut params = StaticParameters::new();
    for (name, value) in &session.params {
        params.set(name, *value);
    }

    let mut scene = SceneGraph::with_rig_settings(config.rig.clone());
    let target = scene.add_node(NodeKind::Geometry { max_inputs: 2 }, "image_stamp", None)?;

    let mut tool = StampTool::new(config);
    let mut enter = EnterContext::new();
    tool.on_enter(&mut enter);
    if let Some(prompt) = enter.prompt() {
        info!("{prompt}");
    }

    let mut result = ReplayResult {
        scene,
        target,
        placed: 0,
        failed: 0,
        draws: Vec::new(),
    };
    let mut draw = DrawContext::new();

    for (index, event) in session.events.iter().enumerate() {
        match event {
            SessionEvent::Move { origin, direction } => {
                tool.on_pointer_move(&PointerContext {
                    ray: Ray::new(Vec3::from_array(*origin), Vec3::from_array(*direction)),
                    surface: &surface,
                    viewport: &viewport,
                    params: &params,
                });
                debug!(index, phase = ?tool.state().phase(), "Move");
            }
            SessionEvent::Press | SessionEvent::Release => {
                let button = if *event == SessionEvent::Press {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                let outcome = tool.on_commit(&mut CommitContext {
                    button,
                    target,
                    scene: &mut result.scene,
                });
                match outcome {
                    CommitOutcome::Placed(handle) => {
                        result.placed += 1;
                        info!(index, grid = %handle.grid, "Placed");
                    }
                    CommitOutcome::Failed(e) => {
                        result.failed += 1;
                        warn!(index, "Placement failed: {e}");
                    }
                    other => debug!(index, outcome = ?other, "Commit"),
                }
            }
            SessionEvent::Draw => {
                draw.clear();
                tool.on_draw(&mut draw);
                debug!(index, instances = draw.instances().len(), "Draw");
                result.draws.push(draw.instances().len());
            }
        }
    }

    tool.on_exit();
    Ok(result)
}
