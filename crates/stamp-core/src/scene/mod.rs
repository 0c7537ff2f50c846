//! Scene graph for projection rig placement
//!
//! A structural record of nodes, their containers and their input wiring.
//! Nothing here evaluates geometry.

mod history;
mod rig;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use history::UndoStack;

use crate::constants::MAX_MERGE_INPUTS;

pub use rig::{RIG_MARKER, RigHandle, RigPlacement, RigSettings};

/// Stable node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Node type, which fixes the number of inputs a node accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Generic geometry operator with a fixed number of inputs
    Geometry { max_inputs: usize },
    /// Container holding a sub-network
    Subnet,
    Merge,
    Output,
    Grid,
    Transform,
    Normal,
    UvUnwrap,
}

impl NodeKind {
    pub fn max_inputs(&self) -> usize {
        match self {
            NodeKind::Geometry { max_inputs } => *max_inputs,
            NodeKind::Subnet => 4,
            NodeKind::Merge => MAX_MERGE_INPUTS,
            NodeKind::Grid => 0,
            NodeKind::Output | NodeKind::Transform | NodeKind::Normal | NodeKind::UvUnwrap => 1,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Subnet)
    }

    /// Base name for new nodes of this kind
    pub fn default_name(&self) -> &'static str {
        match self {
            NodeKind::Geometry { .. } => "geo",
            NodeKind::Subnet => "subnet",
            NodeKind::Merge => "merge",
            NodeKind::Output => "output",
            NodeKind::Grid => "grid",
            NodeKind::Transform => "transform",
            NodeKind::Normal => "normal",
            NodeKind::UvUnwrap => "uvunwrap",
        }
    }
}

/// Node parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Text(String),
}

/// A node in the scene graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Containing network, `None` at the root
    pub parent: Option<NodeId>,
    inputs: Vec<Option<NodeId>>,
    pub params: BTreeMap<String, ParamValue>,
}

impl Node {
    /// Connected input at `index`
    pub fn input(&self, index: usize) -> Option<NodeId> {
        self.inputs.get(index).copied().flatten()
    }

    /// All input slots, including empty ones
    pub fn inputs(&self) -> &[Option<NodeId>] {
        &self.inputs
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }
}

/// In-memory scene graph with transactional edits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    #[serde(skip)]
    rig: RigSettings,
    #[serde(skip)]
    history: UndoStack,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene graph that builds rigs with the given settings
    pub fn with_rig_settings(rig: RigSettings) -> Self {
        Self {
            rig,
            ..Default::default()
        }
    }

    pub fn rig_settings(&self) -> &RigSettings {
        &self.rig
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes directly inside a container (`None` for the root network)
    pub fn children(&self, parent: Option<NodeId>) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.parent == parent)
    }

    /// Number of nodes of a kind anywhere in the graph
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }

    /// Find a node by name within a container
    pub fn find(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        self.children(parent).find(|n| n.name == name).map(|n| n.id)
    }

    /// Add a node, renaming it if the name is taken within its container
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        name: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        if let Some(parent_id) = parent {
            let parent_node = self
                .nodes
                .get(&parent_id)
                .ok_or(SceneError::NodeNotFound(parent_id))?;
            if !parent_node.kind.is_container() {
                return Err(SceneError::NotAContainer(parent_id));
            }
        }

        let base = if name.is_empty() {
            kind.default_name()
        } else {
            name
        };
        let name = self.unique_name(parent, base);
        let id = NodeId::new();
        self.nodes.insert(
            id,
            Node {
                id,
                name,
                kind,
                parent,
                inputs: Vec::new(),
                params: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    fn unique_name(&self, parent: Option<NodeId>, base: &str) -> String {
        if self.find(parent, base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| self.find(parent, candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Set a parameter on a node
    pub fn set_param(
        &mut self,
        id: NodeId,
        name: &str,
        value: ParamValue,
    ) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        node.params.insert(name.to_string(), value);
        Ok(())
    }

    /// Connected input of a node
    pub fn input(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.input(index))
    }

    /// Connect `source`'s output into `target`'s input slot
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&source) {
            return Err(SceneError::NodeNotFound(source));
        }
        let target_node = self
            .nodes
            .get(&target)
            .ok_or(SceneError::NodeNotFound(target))?;
        if index >= target_node.kind.max_inputs() {
            return Err(SceneError::InputOutOfRange {
                node: target,
                index,
            });
        }
        if source == target || self.is_upstream(target, source) {
            return Err(SceneError::CycleDetected);
        }

        let node = self
            .nodes
            .get_mut(&target)
            .ok_or(SceneError::NodeNotFound(target))?;
        if node.inputs.len() <= index {
            node.inputs.resize(index + 1, None);
        }
        node.inputs[index] = Some(source);
        Ok(())
    }

    /// Clear an input slot, returning what was connected
    pub fn disconnect(&mut self, target: NodeId, index: usize) -> Result<Option<NodeId>, SceneError> {
        let node = self
            .nodes
            .get_mut(&target)
            .ok_or(SceneError::NodeNotFound(target))?;
        Ok(node.inputs.get_mut(index).and_then(Option::take))
    }

    /// First empty input slot of a node
    pub fn next_free_input(&self, id: NodeId) -> Option<usize> {
        let node = self.nodes.get(&id)?;
        let index = node
            .inputs
            .iter()
            .position(Option::is_none)
            .unwrap_or(node.inputs.len());
        (index < node.kind.max_inputs()).then_some(index)
    }

    /// Whether `candidate` feeds `id`, directly or transitively
    fn is_upstream(&self, candidate: NodeId, id: NodeId) -> bool {
        let mut stack = vec![id];
        let mut seen = std::collections::HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for input in node.inputs.iter().flatten() {
                if *input == candidate {
                    return true;
                }
                stack.push(*input);
            }
        }
        false
    }

    /// Run `edit` as one undoable unit
    ///
    /// If `edit` fails, every change it made is rolled back before the error
    /// is returned.
    pub fn transaction<T>(
        &mut self,
        label: &str,
        edit: impl FnOnce(&mut Self) -> Result<T, SceneError>,
    ) -> Result<T, SceneError> {
        let snapshot = self.nodes.clone();
        match edit(self) {
            Ok(value) => {
                self.history.record(label, snapshot);
                debug!("Transaction committed: {label}");
                Ok(value)
            }
            Err(e) => {
                self.nodes = snapshot;
                warn!("Transaction rolled back: {label}: {e}");
                Err(e)
            }
        }
    }

    /// Undo the last transaction, returning its label
    pub fn undo(&mut self) -> Option<String> {
        let (label, previous) = self.history.undo(self.nodes.clone())?;
        self.nodes = previous;
        Some(label)
    }

    /// Redo the last undone transaction, returning its label
    pub fn redo(&mut self) -> Option<String> {
        let (label, next) = self.history.redo(self.nodes.clone())?;
        self.nodes = next;
        Some(label)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

/// Scene mutation service used on commit
pub trait SceneMutator {
    /// Build a projection rig at the placement and merge it into the
    /// target's secondary input. Either the whole rig is built or nothing is.
    fn place_projection_rig(
        &mut self,
        target: NodeId,
        placement: &RigPlacement,
    ) -> Result<RigHandle, SceneError>;
}

/// Scene graph errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Node {node} has no input {index}")]
    InputOutOfRange { node: NodeId, index: usize },
    #[error("Connection would create a cycle")]
    CycleDetected,
    #[error("Node is not a container: {0}")]
    NotAContainer(NodeId),
    #[error("Parameter {name} on node {node} is out of range")]
    InvalidParam { node: NodeId, name: String },
}
