//! Undo history for scene graph transactions

use std::collections::BTreeMap;

use super::{Node, NodeId};

/// Maximum number of transactions kept for undo
const MAX_UNDO_DEPTH: usize = 64;

type Snapshot = BTreeMap<NodeId, Node>;

#[derive(Debug, Clone)]
struct HistoryEntry {
    label: String,
    nodes: Snapshot,
}

/// Snapshot-based undo/redo stacks
#[derive(Debug, Clone, Default)]
pub(crate) struct UndoStack {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
}

impl UndoStack {
    /// Record a committed transaction given the state before it ran
    pub fn record(&mut self, label: &str, before: Snapshot) {
        self.undo.push(HistoryEntry {
            label: label.to_string(),
            nodes: before,
        });
        if self.undo.len() > MAX_UNDO_DEPTH {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    /// Step back, returning the label and the state to restore
    pub fn undo(&mut self, current: Snapshot) -> Option<(String, Snapshot)> {
        let entry = self.undo.pop()?;
        self.redo.push(HistoryEntry {
            label: entry.label.clone(),
            nodes: current,
        });
        Some((entry.label, entry.nodes))
    }

    /// Step forward, returning the label and the state to restore
    pub fn redo(&mut self, current: Snapshot) -> Option<(String, Snapshot)> {
        let entry = self.redo.pop()?;
        self.undo.push(HistoryEntry {
            label: entry.label.clone(),
            nodes: current,
        });
        Some((entry.label, entry.nodes))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
