//! Parameter types configuring the per-image segmentation driver.
//!
//! One [`SegmentationParams`] value is built per run and applied uniformly
//! to every image of the batch; nothing here mutates between images.
use crate::objects::FilterParams;
use crate::threshold::ThresholdParams;

/// How the final mask is rendered to 8-bit output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// Every surviving object at a single foreground value (255).
    Binary,
    /// Each surviving object at its own integer level.
    Labeled,
}

/// Driver-wide parameters controlling the segmentation pipeline.
#[derive(Clone, Debug)]
pub struct SegmentationParams {
    /// Process only the first slice of 3D inputs (explicit 2D mode).
    pub single_slice: bool,
    /// Dual-threshold binarization knobs.
    pub threshold: ThresholdParams,
    /// Object filtering knobs.
    pub filter: FilterParams,
    /// Binary or labeled output.
    pub output_mode: OutputMode,
    /// Deflate-compress the output TIFF.
    pub compress: bool,
    /// Output filename prefix; `None` selects `mask_`/`cmask_`.
    pub prefix: Option<String>,
    /// Write a max-projection PNG preview alongside each mask.
    pub previews: bool,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            single_slice: false,
            threshold: ThresholdParams::default(),
            filter: FilterParams::default(),
            output_mode: OutputMode::Binary,
            compress: false,
            prefix: None,
            previews: false,
        }
    }
}

impl SegmentationParams {
    /// Effective output prefix: the override when set, otherwise `mask_`
    /// (`cmask_` for compressed output).
    pub fn effective_prefix(&self) -> &str {
        match &self.prefix {
            Some(prefix) => prefix,
            None if self.compress => "cmask_",
            None => "mask_",
        }
    }
}
