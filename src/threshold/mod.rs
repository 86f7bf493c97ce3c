//! Dual-threshold binarization.
//!
//! A sample is foreground only if it exceeds both the global Otsu cutoff
//! and its local box-mean cutoff. The global gate rejects regions that are
//! merely brighter than their immediate noise floor; the local gate rejects
//! bright-but-flat artifacts.

pub mod local;
pub mod otsu;

pub use self::local::local_threshold;
pub use self::otsu::otsu_threshold;

use crate::stack::Stack;
use log::{debug, warn};

/// Parameters for the dual-threshold binarization.
#[derive(Clone, Debug)]
pub struct ThresholdParams {
    /// Side of the local window (odd; clamped per axis to the stack).
    pub neighbourhood: usize,
    /// Offset subtracted from the local mean.
    pub local_offset: f32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            neighbourhood: 101,
            local_offset: 0.0,
        }
    }
}

/// Binarization result, including the global threshold for logging.
#[derive(Clone, Debug)]
pub struct BinarizeOutcome {
    /// Foreground mask, same shape as the input stack.
    pub mask: Stack<bool>,
    /// Global Otsu threshold (the uniform value for degenerate stacks).
    pub global_threshold: f32,
    /// True when the stack had no intensity spread and the mask is empty.
    pub degenerate: bool,
}

/// Binarize a float stack with combined global and local thresholds.
///
/// A zero-variance stack cannot be thresholded; it produces an empty mask
/// and a warning instead of an error.
pub fn binarize(stack: &Stack<f32>, params: &ThresholdParams) -> BinarizeOutcome {
    let Some(global) = otsu_threshold(&stack.data) else {
        warn!("zero-variance stack, emitting all-background mask");
        return BinarizeOutcome {
            mask: Stack::filled(stack.shape, false),
            global_threshold: stack.data.first().copied().unwrap_or(0.0),
            degenerate: true,
        };
    };

    let local = local_threshold(stack, params.neighbourhood, params.local_offset);
    let data = stack
        .data
        .iter()
        .zip(&local.data)
        .map(|(&v, &cutoff)| v > global && v > cutoff)
        .collect();
    debug!(
        "binarize: global_threshold={global:.4} neighbourhood={}",
        params.neighbourhood
    );
    BinarizeOutcome {
        mask: Stack::from_vec(stack.shape, data),
        global_threshold: global,
        degenerate: false,
    }
}
