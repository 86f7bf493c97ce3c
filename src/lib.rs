#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod batch;
pub mod config;
pub mod driver;
pub mod error;
pub mod stack;

// Pipeline stages – public so the stages can be driven individually.
pub mod labeling;
pub mod morphology;
pub mod objects;
pub mod preprocess;
pub mod threshold;

// --- High-level re-exports -------------------------------------------------

// Main entry points: batch runner + per-image driver.
pub use crate::batch::{discover_inputs, run_batch, BatchOptions};
pub use crate::driver::params::{OutputMode, SegmentationParams};
pub use crate::driver::process_image;

// Reports produced by the driver and the batch runner.
pub use crate::driver::report::{BatchSummary, ImageReport, Stage};

// Error taxonomy shared by every stage.
pub use crate::error::SegmentationError;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use nucleseg::prelude::*;
///
/// # fn main() {
/// let params = SegmentationParams::default();
/// let options = BatchOptions::new("deconvolved", "masks");
/// match run_batch(&options, &params) {
///     Ok(summary) => println!("written {}/{}", summary.written, summary.discovered),
///     Err(err) => eprintln!("{err}"),
/// }
/// # }
/// ```
pub mod prelude {
    pub use crate::stack::{Dim, Shape, Stack};
    pub use crate::{run_batch, BatchOptions, OutputMode, SegmentationParams};
}
