use stamp_core::{ConfigError, ExportError, MeshError, SceneError};

/// Command-line errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Cannot read {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("Invalid file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Read and parse a RON file
pub fn read_ron<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    ron::from_str(&content).map_err(|e| CliError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
