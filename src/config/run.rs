//! JSON configuration for a segmentation run.
//!
//! Optional sections resolve onto the engine defaults, so a minimal config
//! is just `{"input_dir": ..., "output_dir": ...}`.
use crate::batch::{BatchOptions, DEFAULT_PATTERN};
use crate::driver::params::{OutputMode, SegmentationParams};
use crate::objects::{FilterParams, RadiusInterval};
use crate::threshold::ThresholdParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// Directory of input TIFF stacks.
    pub input_dir: PathBuf,
    /// Directory receiving the masks (created if absent).
    pub output_dir: PathBuf,
    /// Regular expression selecting input filenames.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Output filename prefix override.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Process only the first slice of 3D inputs.
    #[serde(default)]
    pub single_slice: bool,
    #[serde(default)]
    pub threshold: ThresholdConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    /// Write labeled masks instead of binary ones.
    #[serde(default)]
    pub labeled: bool,
    /// Deflate-compress the output TIFFs.
    #[serde(default)]
    pub compress: bool,
    /// Worker count, capped to hardware parallelism.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Write max-projection PNG previews next to the masks.
    #[serde(default)]
    pub previews: bool,
    /// Optional path for the JSON batch report.
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

fn default_workers() -> usize {
    1
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Side of the local-threshold window (odd).
    pub neighbourhood: Option<usize>,
    /// Offset subtracted from the local mean.
    pub local_offset: Option<f32>,
}

impl ThresholdConfig {
    pub fn resolve(&self) -> ThresholdParams {
        let mut params = ThresholdParams::default();
        if let Some(v) = self.neighbourhood {
            params.neighbourhood = v;
        }
        if let Some(v) = self.local_offset {
            params.local_offset = v;
        }
        params
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum equivalent radius in voxels.
    pub min_radius: Option<f64>,
    /// Maximum equivalent radius in voxels (unbounded when omitted).
    pub max_radius: Option<f64>,
    /// Minimum fraction of stack depth an object must span.
    pub min_z_fraction: Option<f64>,
    /// Discard objects touching the outer XY boundary.
    pub clear_xy_borders: Option<bool>,
}

impl FilterConfig {
    pub fn resolve(&self) -> FilterParams {
        let mut params = FilterParams::default();
        let mut radius = RadiusInterval::default();
        if let Some(v) = self.min_radius {
            radius.min = v;
        }
        if let Some(v) = self.max_radius {
            radius.max = v;
        }
        params.radius = radius;
        if let Some(v) = self.min_z_fraction {
            params.min_z_fraction = v;
        }
        if let Some(v) = self.clear_xy_borders {
            params.clear_xy_borders = v;
        }
        params
    }
}

impl RunConfig {
    /// Batch discovery/dispatch options.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            pattern: self
                .pattern
                .clone()
                .unwrap_or_else(|| DEFAULT_PATTERN.to_string()),
            workers: self.workers,
        }
    }

    /// Resolved per-image segmentation parameters.
    pub fn segmentation_params(&self) -> SegmentationParams {
        SegmentationParams {
            single_slice: self.single_slice,
            threshold: self.threshold.resolve(),
            filter: self.filter.resolve(),
            output_mode: if self.labeled {
                OutputMode::Labeled
            } else {
                OutputMode::Binary
            },
            compress: self.compress,
            prefix: self.prefix.clone(),
            previews: self.previews,
        }
    }
}

pub fn load_config(path: &Path) -> Result<RunConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
