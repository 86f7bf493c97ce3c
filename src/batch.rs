//! Batch discovery and parallel dispatch.
//!
//! The unit of work is one file path; a bounded rayon pool fans the file
//! list out across workers and collects per-image reports. Images share no
//! mutable state, so the fan-out is embarrassingly parallel.
use crate::driver::params::SegmentationParams;
use crate::driver::process_image;
use crate::driver::report::{BatchSummary, ImageReport};
use crate::error::SegmentationError;
use log::{info, warn};
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Default filename pattern: `.tif`/`.tiff`, case-insensitive.
pub const DEFAULT_PATTERN: &str = r"(?i)\.tiff?$";

/// Where to read stacks, where to write masks, and how wide to fan out.
#[derive(Clone, Debug)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Regular expression selecting input filenames.
    pub pattern: String,
    /// Requested worker count; capped to hardware parallelism.
    pub workers: usize,
}

impl BatchOptions {
    /// Options with the default pattern and a single worker.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            pattern: DEFAULT_PATTERN.to_string(),
            workers: 1,
        }
    }
}

/// List the input files matching `pattern`, sorted by name.
///
/// A missing directory, an invalid pattern or zero matches is an `Input`
/// error: the batch must not start.
pub fn discover_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, SegmentationError> {
    if !dir.is_dir() {
        return Err(SegmentationError::Input(format!(
            "input directory {} does not exist",
            dir.display()
        )));
    }
    let re = Regex::new(pattern).map_err(|e| {
        SegmentationError::Input(format!("invalid filename pattern {pattern:?}: {e}"))
    })?;

    let entries = fs::read_dir(dir).map_err(|e| {
        SegmentationError::Input(format!("cannot list {}: {e}", dir.display()))
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| SegmentationError::Input(format!("cannot list entry: {e}")))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if re.is_match(name) => files.push(path),
            Some(_) => {}
            None => warn!("skipping non-UTF-8 file name in {}", dir.display()),
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(SegmentationError::Input(format!(
            "no files matching {pattern:?} in {}",
            dir.display()
        )));
    }
    Ok(files)
}

/// Run the segmentation batch: discover, fan out, summarize.
///
/// Only batch-level problems (bad input directory, no matches, unusable
/// output directory) return an error; per-image failures land in the
/// summary and leave sibling images untouched.
pub fn run_batch(
    options: &BatchOptions,
    params: &SegmentationParams,
) -> Result<BatchSummary, SegmentationError> {
    let inputs = discover_inputs(&options.input_dir, &options.pattern)?;
    fs::create_dir_all(&options.output_dir).map_err(|e| {
        SegmentationError::Input(format!(
            "cannot create output directory {}: {e}",
            options.output_dir.display()
        ))
    })?;

    let workers = effective_workers(options.workers);
    info!(
        "segmenting {} stacks from {} with {workers} workers",
        inputs.len(),
        options.input_dir.display()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| SegmentationError::Input(format!("cannot build worker pool: {e}")))?;
    let reports: Vec<ImageReport> = pool.install(|| {
        inputs
            .par_iter()
            .map(|path| process_image(path, &options.output_dir, params))
            .collect()
    });

    let summary = BatchSummary::from_reports(inputs.len(), reports);
    info!(
        "batch done: {}/{} masks written, {} failed",
        summary.written,
        summary.discovered,
        summary.failed.len()
    );
    for failure in &summary.failed {
        warn!(
            "failed {} (reached {:?}): {}",
            failure.input.display(),
            failure.stage,
            failure.cause
        );
    }
    Ok(summary)
}

/// Requested worker count clamped to `[1, hardware parallelism]`.
fn effective_workers(requested: usize) -> usize {
    let hardware = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    requested.clamp(1, hardware)
}
