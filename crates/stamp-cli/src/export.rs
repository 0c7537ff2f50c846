//! Batch export through external commands

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use stamp_core::export::Progress;
use stamp_core::{BatchExportJob, ExportError, ExportHost, ExportReport, ToolConfig};
use tracing::{debug, info};

use crate::error::{CliError, read_ron};

const OUTPUT_PLACEHOLDER: &str = "{output}";
const TILE_PLACEHOLDER: &str = "{tile}";

/// Export input file
#[derive(Debug, Clone, Deserialize)]
pub struct ExportJobFile {
    pub template: String,
    pub tiles: Vec<String>,
    pub selected: String,
    #[serde(default)]
    pub export_all: bool,
    /// Render command argv; `{output}` and `{tile}` are substituted
    pub render: Vec<String>,
    /// Caches to invalidate, defaulting to the configured ones
    #[serde(default)]
    pub caches: Option<Vec<String>>,
    /// Optional argv per cache name
    #[serde(default)]
    pub cache_commands: BTreeMap<String, Vec<String>>,
    /// Tool configuration, relative to the job file
    #[serde(default)]
    pub config: Option<PathBuf>,
}

impl ExportJobFile {
    /// Load the referenced configuration, or the defaults when there is none
    pub fn load_config(&self, base: &Path) -> Result<ToolConfig, CliError> {
        match &self.config {
            Some(config) => Ok(ToolConfig::load(base.join(config))?),
            None => Ok(ToolConfig::default()),
        }
    }

    pub fn job(&self, config: &ToolConfig) -> BatchExportJob {
        let caches = self
            .caches
            .clone()
            .unwrap_or_else(|| config.export.caches.clone());
        BatchExportJob::new(self.template.as_str(), self.tiles.clone(), self.selected.clone())
            .with_export_all(self.export_all)
            .with_caches(caches)
    }
}

/// Export host that renders by spawning a process per tile
pub struct CommandHost {
    render: Vec<String>,
    cache_commands: BTreeMap<String, Vec<String>>,
    tile: String,
    output: String,
}

impl CommandHost {
    pub fn new(render: Vec<String>, cache_commands: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            render,
            cache_commands,
            tile: String::new(),
            output: String::new(),
        }
    }

    fn expand(&self, argv: &[String]) -> Vec<String> {
        argv.iter()
            .map(|arg| {
                arg.replace(OUTPUT_PLACEHOLDER, &self.output)
                    .replace(TILE_PLACEHOLDER, &self.tile)
            })
            .collect()
    }
}

/// Run an argv to completion
fn run_command(argv: &[String]) -> Result<(), String> {
    let (program, args) = argv.split_first().ok_or("empty command")?;
    debug!(?argv, "Spawning");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| format!("{program}: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("{program} exited with {status}"))
    }
}

impl ExportHost for CommandHost {
    fn select_tile(&mut self, tile: &str) {
        self.tile = tile.to_string();
    }

    fn set_output_path(&mut self, path: &str) {
        self.output = path.to_string();
    }

    fn render(&mut self) -> Result<(), ExportError> {
        run_command(&self.expand(&self.render)).map_err(|reason| ExportError::Render {
            path: self.output.clone(),
            reason,
        })
    }

    fn invalidate_cache(&mut self, cache: &str) -> Result<(), ExportError> {
        let Some(argv) = self.cache_commands.get(cache) else {
            debug!(cache, "No invalidation command");
            return Ok(());
        };
        run_command(&self.expand(argv)).map_err(|reason| ExportError::Cache {
            cache: cache.to_string(),
            reason,
        })
    }
}

pub fn export_file(path: impl AsRef<Path>) -> Result<ExportReport, CliError> {
    let path = path.as_ref();
    let file: ExportJobFile = read_ron(path)?;
    let config = file.load_config(path.parent().unwrap_or_else(|| Path::new(".")))?;
    run_export(&file, &config)
}

pub fn run_export(file: &ExportJobFile, config: &ToolConfig) -> Result<ExportReport, CliError> {
    let job = file.job(config);
    let mut host = CommandHost::new(file.render.clone(), file.cache_commands.clone());
    // The job starts with the selected tile displayed
    host.select_tile(&job.selected);

    let mut progress = |fraction: f32| {
        info!("Export {:.0}%", fraction * 100.0);
        Progress::Continue
    };
    Ok(job.run(&mut host, &mut progress)?)
}
