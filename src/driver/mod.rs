//! Per-image segmentation driver.
//!
//! Runs one stack through the pipeline in strict sequence (preprocess,
//! binarize, clean, filter, write) and records the stage reached, the
//! per-stage timings and the removal diagnostics. Any failure is captured
//! in the report instead of propagating, so sibling images keep processing.
//!
//! Typical usage:
//! ```no_run
//! use nucleseg::{process_image, SegmentationParams};
//! use std::path::Path;
//!
//! let params = SegmentationParams::default();
//! let report = process_image(Path::new("deconvolved/field001.tif"), Path::new("masks"), &params);
//! if report.is_success() {
//!     println!("kept {} nuclei", report.objects_kept);
//! }
//! ```

pub mod params;
pub mod report;

use crate::error::SegmentationError;
use crate::objects::{filter_objects, FilterOutcome};
use crate::stack::{io, Stack};
use crate::{morphology, preprocess, threshold};
use log::{debug, warn};
use self::params::{OutputMode, SegmentationParams};
use self::report::{ImageReport, Stage};
use std::path::Path;
use std::time::Instant;

/// Foreground value of binary masks.
const BINARY_FOREGROUND: u8 = 255;

/// Process one stack file and write its mask into `output_dir`.
///
/// Never fails: errors are downgraded to the report's `error` field with
/// the stage that was reached.
pub fn process_image(
    input: &Path,
    output_dir: &Path,
    params: &SegmentationParams,
) -> ImageReport {
    let mut report = ImageReport::new(input);
    let total = Instant::now();
    if let Err(err) = run_pipeline(input, output_dir, params, &mut report) {
        warn!("{}: failed at {:?}: {err}", input.display(), report.stage);
        report.error = Some(err.to_string());
    }
    report.timings.total_ms = total.elapsed().as_secs_f64() * 1000.0;
    report
}

fn run_pipeline(
    input: &Path,
    output_dir: &Path,
    params: &SegmentationParams,
    report: &mut ImageReport,
) -> Result<(), SegmentationError> {
    debug!("process_image start {}", input.display());

    let start = Instant::now();
    let raw = io::read_stack(input)?;
    let stack = preprocess::preprocess(raw, input, params.single_slice)?;
    report.stage = Stage::Preprocessed;
    report
        .timings
        .push("preprocess", start.elapsed().as_secs_f64() * 1000.0);

    let start = Instant::now();
    let binarized = threshold::binarize(&stack, &params.threshold);
    report.global_threshold = Some(binarized.global_threshold);
    report.degenerate = binarized.degenerate;
    report.stage = Stage::Binarized;
    report
        .timings
        .push("binarize", start.elapsed().as_secs_f64() * 1000.0);

    let start = Instant::now();
    let mut mask = binarized.mask;
    morphology::clean(&mut mask);
    report.stage = Stage::Cleaned;
    report
        .timings
        .push("morphology", start.elapsed().as_secs_f64() * 1000.0);

    let start = Instant::now();
    let outcome = filter_objects(&mask, &params.filter);
    report.objects_kept = outcome.kept;
    report.removed = outcome.removed.clone();
    report.stage = Stage::Filtered;
    report
        .timings
        .push("filter", start.elapsed().as_secs_f64() * 1000.0);

    let start = Instant::now();
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            SegmentationError::Shape(format!("{}: non-UTF-8 file name", input.display()))
        })?;
    let out_path = output_dir.join(format!("{}{file_name}", params.effective_prefix()));
    let rendered = render_mask(&outcome, params.output_mode, input);
    io::write_stack_u8(&out_path, &rendered, params.compress)?;
    if params.previews {
        let preview = out_path.with_extension("png");
        io::save_mask_preview(&preview, &rendered)?;
    }
    report.output = Some(out_path);
    report.stage = Stage::Written;
    report
        .timings
        .push("write", start.elapsed().as_secs_f64() * 1000.0);

    debug!(
        "process_image done {}: kept={} removed={}",
        input.display(),
        outcome.kept,
        report.removed.len()
    );
    Ok(())
}

/// Render the filtered labels to 8-bit output.
fn render_mask(outcome: &FilterOutcome, mode: OutputMode, input: &Path) -> Stack<u8> {
    let data = match mode {
        OutputMode::Binary => outcome
            .labels
            .data
            .iter()
            .map(|&l| if l > 0 { BINARY_FOREGROUND } else { 0 })
            .collect(),
        OutputMode::Labeled => {
            if outcome.kept > u32::from(u8::MAX) {
                warn!(
                    "{}: {} objects exceed the 8-bit label range, saturating at 255",
                    input.display(),
                    outcome.kept
                );
            }
            outcome
                .labels
                .data
                .iter()
                .map(|&l| l.min(u32::from(u8::MAX)) as u8)
                .collect()
        }
    };
    Stack::from_vec(outcome.labels.shape, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::FilterOutcome;
    use crate::stack::Shape;

    fn outcome_with_labels(labels: Vec<u32>, kept: u32) -> FilterOutcome {
        FilterOutcome {
            labels: Stack::from_vec(Shape::two_d(1, labels.len()), labels),
            kept,
            removed: Vec::new(),
        }
    }

    #[test]
    fn binary_rendering_maps_all_labels_to_255() {
        let outcome = outcome_with_labels(vec![0, 1, 2, 0, 3], 3);
        let mask = render_mask(&outcome, OutputMode::Binary, Path::new("a.tif"));
        assert_eq!(mask.data, vec![0, 255, 255, 0, 255]);
    }

    #[test]
    fn labeled_rendering_keeps_ids_and_saturates() {
        let outcome = outcome_with_labels(vec![0, 1, 2, 300], 300);
        let mask = render_mask(&outcome, OutputMode::Labeled, Path::new("a.tif"));
        assert_eq!(mask.data, vec![0, 1, 2, 255]);
    }

    #[test]
    fn failure_is_downgraded_to_a_report() {
        let params = SegmentationParams::default();
        let report = process_image(
            Path::new("/nonexistent/field001.tif"),
            Path::new("/tmp"),
            &params,
        );
        assert!(!report.is_success());
        assert_eq!(report.stage, Stage::NotStarted);
        assert!(report.error.as_deref().unwrap_or("").contains("read error"));
    }
}
