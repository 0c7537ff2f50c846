//! Batch export job runner

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ExportError, TileTemplate};
use crate::constants::DEFAULT_CACHES;

/// Host operations an export needs
pub trait ExportHost {
    /// Make `tile` the displayed/selected tile
    fn select_tile(&mut self, tile: &str);
    /// Point the image output at `path`
    fn set_output_path(&mut self, path: &str);
    /// Render the image to the current output path
    fn render(&mut self) -> Result<(), ExportError>;
    /// Drop a named cache
    fn invalidate_cache(&mut self, cache: &str) -> Result<(), ExportError>;
}

/// Whether a running export should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Interrupt,
}

/// Receives the completed fraction after each extra tile
pub trait ProgressSink {
    fn update(&mut self, fraction: f32) -> Progress;
}

impl<F: FnMut(f32) -> Progress> ProgressSink for F {
    fn update(&mut self, fraction: f32) -> Progress {
        self(fraction)
    }
}

/// What an export rendered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Output paths in render order
    pub rendered: Vec<String>,
    /// The progress sink stopped the job early
    pub interrupted: bool,
}

/// One export request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchExportJob {
    pub template: TileTemplate,
    /// Every tile of the image, in export order
    pub tiles: Vec<String>,
    /// Tile selected when the job starts; rendered first and restored at the end
    pub selected: String,
    /// Render every tile instead of only the selected one
    #[serde(default)]
    pub export_all: bool,
    /// Caches invalidated when the job ends
    #[serde(default = "default_caches")]
    pub caches: Vec<String>,
}

fn default_caches() -> Vec<String> {
    DEFAULT_CACHES.iter().map(|c| c.to_string()).collect()
}

impl BatchExportJob {
    pub fn new(
        template: impl Into<TileTemplate>,
        tiles: impl IntoIterator<Item = impl Into<String>>,
        selected: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            tiles: tiles.into_iter().map(Into::into).collect(),
            selected: selected.into(),
            export_all: false,
            caches: default_caches(),
        }
    }

    pub fn with_export_all(mut self, export_all: bool) -> Self {
        self.export_all = export_all;
        self
    }

    pub fn with_caches(mut self, caches: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.caches = caches.into_iter().map(Into::into).collect();
        self
    }

    /// Run the export
    ///
    /// Whatever happens while rendering, the originally selected tile is
    /// re-selected and every cache is invalidated before returning. A render
    /// error takes precedence over a cache error.
    pub fn run(
        &self,
        host: &mut dyn ExportHost,
        progress: &mut dyn ProgressSink,
    ) -> Result<ExportReport, ExportError> {
        let rendered = self.render_tiles(host, progress);

        host.select_tile(&self.selected);
        let invalidated = self.invalidate_caches(host);

        let report = rendered?;
        invalidated?;
        info!(
            renders = report.rendered.len(),
            interrupted = report.interrupted,
            "Export finished"
        );
        Ok(report)
    }

    fn render_tiles(
        &self,
        host: &mut dyn ExportHost,
        progress: &mut dyn ProgressSink,
    ) -> Result<ExportReport, ExportError> {
        let mut report = ExportReport::default();

        if !self.template.has_token() {
            render_path(host, self.template.as_str(), &mut report)?;
            return Ok(report);
        }

        if self.selected.is_empty() {
            return Err(ExportError::NoSelection);
        }
        render_path(host, &self.template.resolve(&self.selected), &mut report)?;

        if !self.export_all {
            return Ok(report);
        }

        let remaining: Vec<&String> = self.tiles.iter().filter(|t| **t != self.selected).collect();
        let total = remaining.len();
        for (i, tile) in remaining.into_iter().enumerate() {
            host.select_tile(tile);
            render_path(host, &self.template.resolve(tile), &mut report)?;

            if progress.update((i + 1) as f32 / total as f32) == Progress::Interrupt {
                info!(tile = %tile, "Export interrupted");
                report.interrupted = true;
                break;
            }
        }

        Ok(report)
    }

    /// Invalidate every cache, reporting the first failure
    fn invalidate_caches(&self, host: &mut dyn ExportHost) -> Result<(), ExportError> {
        let mut first_error = None;
        for cache in &self.caches {
            if let Err(e) = host.invalidate_cache(cache) {
                warn!("{e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn render_path(
    host: &mut dyn ExportHost,
    path: &str,
    report: &mut ExportReport,
) -> Result<(), ExportError> {
    host.set_output_path(path);
    host.render()?;
    info!(path, "Rendered");
    report.rendered.push(path.to_string());
    Ok(())
}
