//! Tool configuration
//!
//! This module provides the settings for the stamp tool. They can be
//! serialized to and loaded from RON files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{CURSOR_SIZE, DEFAULT_CACHES, PROMPT};
use crate::gizmo::GizmoSizeParameters;
use crate::scene::RigSettings;

/// Cursor appearance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CursorConfig {
    /// Uniform size of the pointer primitive
    pub size: f32,
    /// Pointer color (RGBA)
    pub pointer_color: [f32; 4],
    /// Pole color (RGBA)
    pub pole_color: [f32; 4],
    /// Quad color (RGBA)
    pub quad_color: [f32; 4],
    /// Highlight glow width in pixels
    pub glow_width: u32,
    /// Prompt shown while the tool is active
    pub prompt: String,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            size: CURSOR_SIZE,
            pointer_color: [0.0, 1.0, 0.0, 1.0],
            pole_color: [0.0, 1.0, 0.0, 1.0],
            quad_color: [0.0, 0.0, 0.0, 0.33],
            glow_width: 2,
            prompt: PROMPT.to_string(),
        }
    }
}

/// Batch export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Caches invalidated once an export finishes
    pub caches: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            caches: DEFAULT_CACHES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Complete tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolConfig {
    /// Cursor settings
    #[serde(default)]
    pub cursor: CursorConfig,
    /// Initial gizmo sizes, used when a parameter is not bound
    #[serde(default)]
    pub gizmo: GizmoSizeParameters,
    /// Projection rig settings
    #[serde(default)]
    pub rig: RigSettings,
    /// Batch export settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl ToolConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save configuration to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: ToolConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.gizmo = config.gizmo.sanitized();
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
