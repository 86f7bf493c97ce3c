//! Error taxonomy for the segmentation pipeline.
//!
//! `Input` aborts a batch before any image is touched; the remaining
//! variants are local to a single image and are downgraded by the driver to
//! a per-image failure record so sibling images keep processing.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by the pipeline stages and the batch runner.
#[derive(Debug, Error)]
pub enum SegmentationError {
    /// Batch-level problem: missing input directory, invalid filename
    /// pattern, or a pattern that matches no files.
    #[error("input error: {0}")]
    Input(String),

    /// A stack with unsupported dimensionality or sample layout.
    #[error("shape error: {0}")]
    Shape(String),

    /// A stack file could not be opened or decoded.
    #[error("read error ({}): {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// A mask could not be written.
    #[error("write error ({}): {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

impl SegmentationError {
    /// Wrap a decode failure for `path`.
    pub fn read(path: &Path, err: impl Display) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Wrap a write failure for `path`.
    pub fn write(path: &Path, err: impl Display) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
