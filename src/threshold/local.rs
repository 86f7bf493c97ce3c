//! Local adaptive thresholds from box means.
//!
//! Each sample gets its own cutoff: the mean intensity inside an odd-sided
//! square (2D) or cube (3D) window centered on it, minus an offset. A
//! summed-area table keeps the window sweep O(1) per sample regardless of
//! the window side.
use crate::stack::{Shape, Stack};

/// Largest odd window side that fits `extent`, never below 1.
fn clamp_side(side: usize, extent: usize) -> usize {
    let side = side.min(extent).max(1);
    if side % 2 == 0 {
        side - 1
    } else {
        side
    }
}

/// Per-sample local threshold: boxed mean minus `offset`.
///
/// The configured `side` is clamped per axis to the largest odd value that
/// fits; windows are truncated at the stack borders.
pub fn local_threshold(stack: &Stack<f32>, side: usize, offset: f32) -> Stack<f32> {
    let Shape {
        depth, rows, cols, ..
    } = stack.shape;
    let rz = clamp_side(side, depth) / 2;
    let ry = clamp_side(side, rows) / 2;
    let rx = clamp_side(side, cols) / 2;

    let sat = summed_area_table(stack);
    let sat_plane = (rows + 1) * (cols + 1);
    let sat_row = cols + 1;
    let at = |z: usize, y: usize, x: usize| sat[z * sat_plane + y * sat_row + x];

    let mut out = Stack::filled(stack.shape, 0.0f32);
    for z in 0..depth {
        let z0 = z.saturating_sub(rz);
        let z1 = (z + rz).min(depth - 1);
        for y in 0..rows {
            let y0 = y.saturating_sub(ry);
            let y1 = (y + ry).min(rows - 1);
            for x in 0..cols {
                let x0 = x.saturating_sub(rx);
                let x1 = (x + rx).min(cols - 1);

                let sum = at(z1 + 1, y1 + 1, x1 + 1) - at(z0, y1 + 1, x1 + 1)
                    - at(z1 + 1, y0, x1 + 1)
                    - at(z1 + 1, y1 + 1, x0)
                    + at(z0, y0, x1 + 1)
                    + at(z0, y1 + 1, x0)
                    + at(z1 + 1, y0, x0)
                    - at(z0, y0, x0);
                let count = ((z1 - z0 + 1) * (y1 - y0 + 1) * (x1 - x0 + 1)) as f64;
                out.set(z, y, x, (sum / count) as f32 - offset);
            }
        }
    }
    out
}

/// Inclusive 3D summed-area table with a zero border plane on each axis.
fn summed_area_table(stack: &Stack<f32>) -> Vec<f64> {
    let Shape {
        depth, rows, cols, ..
    } = stack.shape;
    let plane = (rows + 1) * (cols + 1);
    let row = cols + 1;
    let mut sat = vec![0.0f64; (depth + 1) * plane];
    for z in 0..depth {
        for y in 0..rows {
            for x in 0..cols {
                let v = f64::from(stack.get(z, y, x));
                sat[(z + 1) * plane + (y + 1) * row + (x + 1)] = v
                    + sat[z * plane + (y + 1) * row + (x + 1)]
                    + sat[(z + 1) * plane + y * row + (x + 1)]
                    + sat[(z + 1) * plane + (y + 1) * row + x]
                    - sat[z * plane + y * row + (x + 1)]
                    - sat[z * plane + (y + 1) * row + x]
                    - sat[(z + 1) * plane + y * row + x]
                    + sat[z * plane + y * row + x];
            }
        }
    }
    sat
}
