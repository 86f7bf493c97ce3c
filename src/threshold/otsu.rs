//! Global threshold selection by Otsu's criterion.
//!
//! One cutoff for the whole stack, chosen to maximize the inter-class
//! variance of the foreground/background partition of a 256-bin histogram.

const HIST_BINS: usize = 256;

/// Threshold maximizing inter-class variance over the intensity histogram.
///
/// The returned value is the upper edge of the last background bin, so
/// foreground is exactly `v > threshold`. Returns `None` when the input is
/// empty or has no intensity spread; the caller treats that as a degenerate
/// (all-background) stack.
pub fn otsu_threshold(data: &[f32]) -> Option<f32> {
    if data.is_empty() {
        return None;
    }
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in data {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() || max <= min {
        return None;
    }

    let bin_width = (max - min) / HIST_BINS as f32;
    let mut histogram = [0usize; HIST_BINS];
    for &v in data {
        let bin = (((v - min) / bin_width) as usize).min(HIST_BINS - 1);
        histogram[bin] += 1;
    }

    let total = data.len() as f64;
    let mut sum_total = 0.0f64;
    for (i, &count) in histogram.iter().enumerate() {
        sum_total += i as f64 * count as f64;
    }

    let mut sum_background = 0.0f64;
    let mut weight_background = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best_bin = 0usize;
    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count as f64;
        if weight_background == 0.0 {
            continue;
        }
        let weight_foreground = total - weight_background;
        if weight_foreground == 0.0 {
            break;
        }
        sum_background += t as f64 * count as f64;

        let mean_background = sum_background / weight_background;
        let mean_foreground = (sum_total - sum_background) / weight_foreground;
        let variance =
            weight_background * weight_foreground * (mean_background - mean_foreground).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_bin = t;
        }
    }

    Some(min + (best_bin + 1) as f32 * bin_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bimodal_threshold_lands_between_modes() {
        let mut data = Vec::new();
        for i in 0..100 {
            data.push(10.0 + 20.0 * (i as f32 / 100.0));
        }
        for i in 0..100 {
            data.push(70.0 + 20.0 * (i as f32 / 100.0));
        }
        let thr = otsu_threshold(&data).unwrap();
        assert!(
            thr > 30.0 && thr < 70.0,
            "threshold {thr} should separate the two modes"
        );
    }

    #[test]
    fn uniform_stack_is_degenerate() {
        assert_eq!(otsu_threshold(&[5.0; 64]), None);
    }

    #[test]
    fn empty_input_is_degenerate() {
        assert_eq!(otsu_threshold(&[]), None);
    }

    #[test]
    fn two_level_image_splits_exactly() {
        let mut data = vec![0.0f32; 900];
        data.extend(std::iter::repeat(200.0).take(100));
        let thr = otsu_threshold(&data).unwrap();
        assert!(thr > 0.0 && thr < 200.0, "threshold {thr}");
    }
}
