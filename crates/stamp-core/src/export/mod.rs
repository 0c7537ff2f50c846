//! Per-tile batch export
//!
//! Independent of the gizmo: renders a composited image once per UDIM tile,
//! substituting the tile into an output path template.

mod job;

use serde::{Deserialize, Serialize};

use crate::constants::TILE_TOKENS;

pub use job::{BatchExportJob, ExportHost, ExportReport, Progress, ProgressSink};

/// Output path template that may contain a tile token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileTemplate(String);

impl TileTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether any tile token appears in the template
    pub fn has_token(&self) -> bool {
        TILE_TOKENS.iter().any(|token| self.0.contains(token))
    }

    /// Replace every tile token with `tile`
    pub fn resolve(&self, tile: &str) -> String {
        TILE_TOKENS
            .iter()
            .fold(self.0.clone(), |path, token| path.replace(token, tile))
    }
}

impl From<&str> for TileTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Batch export errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("Render failed for {path}: {reason}")]
    Render { path: String, reason: String },
    #[error("Cache invalidation failed for {cache}: {reason}")]
    Cache { cache: String, reason: String },
    #[error("No tile selected")]
    NoSelection,
}
