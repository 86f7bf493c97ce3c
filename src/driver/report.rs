//! Per-image and batch reports.
//!
//! The driver records the stage each image reached, the stage timings, the
//! global threshold used and every removed object, so the batch summary can
//! list successes and failures without re-reading anything.
use crate::objects::RemovedObject;
use serde::Serialize;
use std::path::PathBuf;

/// Pipeline stage reached by an image. `Written` is terminal; a failure
/// leaves the report at the last completed stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Stage {
    NotStarted,
    Preprocessed,
    Binarized,
    Cleaned,
    Filtered,
    Written,
}

/// Timing entry for a single pipeline stage.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Aggregated timing trace for one image.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }
}

/// Outcome of one image's trip through the pipeline.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReport {
    pub input: PathBuf,
    /// Written mask path, `None` on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Last stage completed.
    pub stage: Stage,
    /// Failure cause, `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the stack had no intensity spread (empty mask written).
    pub degenerate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_threshold: Option<f32>,
    pub objects_kept: u32,
    pub removed: Vec<RemovedObject>,
    pub timings: TimingBreakdown,
}

impl ImageReport {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            stage: Stage::NotStarted,
            error: None,
            degenerate: false,
            global_threshold: None,
            objects_kept: 0,
            removed: Vec::new(),
            timings: TimingBreakdown::default(),
        }
    }

    /// True when the image reached `Written` without an error.
    pub fn is_success(&self) -> bool {
        self.stage == Stage::Written && self.error.is_none()
    }
}

/// One failed image with its cause.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub input: PathBuf,
    /// Last stage completed before the failure.
    pub stage: Stage,
    pub cause: String,
}

/// Batch-level outcome: counts plus the per-image reports.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub discovered: usize,
    pub written: usize,
    pub failed: Vec<FailureRecord>,
    pub images: Vec<ImageReport>,
}

impl BatchSummary {
    /// Assemble the summary from per-image reports.
    pub fn from_reports(discovered: usize, images: Vec<ImageReport>) -> Self {
        let written = images.iter().filter(|r| r.is_success()).count();
        let failed = images
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| FailureRecord {
                input: r.input.clone(),
                stage: r.stage,
                cause: r
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown failure".to_string()),
            })
            .collect();
        Self {
            discovered,
            written,
            failed,
            images,
        }
    }
}
