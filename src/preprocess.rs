//! Intensity preprocessing: dimensionality normalization and
//! deconvolution-aware rescaling.
//!
//! Deconvolution software stretches float results into the integer range
//! and records the factor in a sibling history file; dividing it back out
//! makes thresholds comparable across acquisition batches.
use crate::error::SegmentationError;
use crate::stack::io::RawStack;
use crate::stack::{Shape, Stack};
use log::debug;
use std::fs;
use std::path::Path;

/// Marker line written by Huygens deconvolution history files.
const RESCALE_MARKER: &str = "Stretched to Integer type";

/// Normalize a raw stack to 2D/3D and undo the deconvolution gain.
///
/// Leading axes are squeezed while they have size 1; more than three
/// non-singleton axes is a shape error. A 3D stack whose depth squeezes to
/// 1 becomes a 2D image. With `single_slice` set, only slice 0 of a 3D
/// stack is kept and processing continues in 2D.
pub fn preprocess(
    raw: RawStack,
    path: &Path,
    single_slice: bool,
) -> Result<Stack<f32>, SegmentationError> {
    let factor = find_rescaling_factor(path);
    let mut stack = normalize_dims(raw, path, single_slice)?;
    if factor != 1.0 {
        for v in &mut stack.data {
            *v /= factor;
        }
    }
    debug!(
        "preprocess {}: shape={:?} rescaling_factor={factor}",
        path.display(),
        stack.shape
    );
    Ok(stack)
}

fn normalize_dims(
    raw: RawStack,
    path: &Path,
    single_slice: bool,
) -> Result<Stack<f32>, SegmentationError> {
    let RawStack { mut axes, mut data } = raw;
    if axes.iter().any(|&n| n == 0) {
        return Err(SegmentationError::Shape(format!(
            "{}: empty stack with axes {axes:?}",
            path.display()
        )));
    }

    // Squeeze degenerate leading axes (time frames of length 1, single-page
    // depth) until at most three remain.
    while axes.len() > 2 && axes[0] == 1 {
        axes.remove(0);
    }
    if axes.len() > 3 {
        return Err(SegmentationError::Shape(format!(
            "{}: {} non-singleton axes {axes:?}, expected 2 or 3",
            path.display(),
            axes.len()
        )));
    }

    if single_slice && axes.len() == 3 {
        let plane = axes[1] * axes[2];
        data.truncate(plane);
        axes.remove(0);
    }

    let shape = match axes.as_slice() {
        [rows, cols] => Shape::two_d(*rows, *cols),
        [depth, rows, cols] => Shape::three_d(*depth, *rows, *cols),
        other => {
            return Err(SegmentationError::Shape(format!(
                "{}: unsupported axes {other:?}",
                path.display()
            )))
        }
    };
    Ok(Stack::from_vec(shape, data))
}

/// Rescaling factor recorded next to the stack, 1.0 when absent.
///
/// Looks for `<stem>_history.txt` and parses the number following the last
/// `Stretched to Integer type` line.
pub fn find_rescaling_factor(path: &Path) -> f32 {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return 1.0;
    };
    let history = path.with_file_name(format!("{stem}_history.txt"));
    let Ok(contents) = fs::read_to_string(&history) else {
        return 1.0;
    };

    let mut factor = 1.0f32;
    for line in contents.lines() {
        let Some(rest) = line.split(RESCALE_MARKER).nth(1) else {
            continue;
        };
        let token = rest
            .trim_start_matches([':', ' ', '\t'])
            .split_whitespace()
            .next();
        if let Some(value) = token.and_then(|t| t.parse::<f32>().ok()) {
            if value.is_finite() && value > 0.0 {
                factor = value;
            }
        }
    }
    factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Dim;

    fn raw(axes: Vec<usize>, value: f32) -> RawStack {
        let len = axes.iter().product();
        RawStack {
            axes,
            data: vec![value; len],
        }
    }

    #[test]
    fn multi_page_stack_stays_three_d() {
        let stack = preprocess(raw(vec![4, 8, 8], 1.0), Path::new("a.tif"), false).unwrap();
        assert_eq!(stack.shape, Shape::three_d(4, 8, 8));
        assert_eq!(stack.shape.dim, Dim::Three);
    }

    #[test]
    fn singleton_depth_squeezes_to_two_d() {
        let stack = preprocess(raw(vec![1, 8, 8], 1.0), Path::new("a.tif"), false).unwrap();
        assert_eq!(stack.shape, Shape::two_d(8, 8));
    }

    #[test]
    fn single_slice_mode_keeps_first_plane() {
        let mut input = raw(vec![3, 2, 2], 0.0);
        for (i, v) in input.data.iter_mut().enumerate() {
            *v = i as f32;
        }
        let stack = preprocess(input, Path::new("a.tif"), true).unwrap();
        assert_eq!(stack.shape, Shape::two_d(2, 2));
        assert_eq!(stack.data, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn non_singleton_extra_axis_is_rejected() {
        let err = preprocess(raw(vec![2, 3, 8, 8], 1.0), Path::new("a.tif"), false).unwrap_err();
        assert!(matches!(err, SegmentationError::Shape(_)), "{err}");
    }

    #[test]
    fn degenerate_time_axis_is_squeezed() {
        let stack = preprocess(raw(vec![1, 4, 8, 8], 1.0), Path::new("a.tif"), false);
        // [1, 4, 8, 8] squeezes to [4, 8, 8].
        assert_eq!(stack.unwrap().shape, Shape::three_d(4, 8, 8));
    }

    #[test]
    fn missing_history_file_means_unit_factor() {
        assert_eq!(find_rescaling_factor(Path::new("nowhere/img.tif")), 1.0);
    }

    #[test]
    fn recorded_factor_divides_intensities() {
        let dir = std::env::temp_dir().join(format!("nucleseg-rescale-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let image = dir.join("field003.tif");
        std::fs::write(
            dir.join("field003_history.txt"),
            "gaussian blur applied\nStretched to Integer type: 2.0\n",
        )
        .unwrap();

        let stack = preprocess(raw(vec![2, 4, 4], 200.0), &image, false).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert!(stack.data.iter().all(|&v| v == 100.0));
    }
}
