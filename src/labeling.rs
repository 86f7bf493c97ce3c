//! Connected-component labeling of binary masks.
//!
//! Foreground adjacency is 26-connected in 3D and 8-connected in 2D.
//! Labels are dense positive integers assigned in scan order; 0 is
//! background.
use crate::stack::{Dim, Shape, Stack};
use std::collections::VecDeque;

/// Label connected foreground regions of `mask`.
///
/// Returns the labeled stack and the number of components.
pub fn label_components(mask: &Stack<bool>) -> (Stack<u32>, u32) {
    let shape = mask.shape;
    let offsets = neighbor_offsets(shape.dim);
    let mut labels = Stack::filled(shape, 0u32);
    let mut next = 0u32;
    let mut queue: VecDeque<(usize, usize, usize)> = VecDeque::new();

    for z in 0..shape.depth {
        for y in 0..shape.rows {
            for x in 0..shape.cols {
                let seed = shape.idx(z, y, x);
                if !mask.data[seed] || labels.data[seed] != 0 {
                    continue;
                }
                next += 1;
                labels.data[seed] = next;
                queue.push_back((z, y, x));
                while let Some((cz, cy, cx)) = queue.pop_front() {
                    for &(dz, dy, dx) in &offsets {
                        let (nz, ny, nx) = (cz as i64 + dz, cy as i64 + dy, cx as i64 + dx);
                        if !in_bounds(shape, nz, ny, nx) {
                            continue;
                        }
                        let (nz, ny, nx) = (nz as usize, ny as usize, nx as usize);
                        let i = shape.idx(nz, ny, nx);
                        if mask.data[i] && labels.data[i] == 0 {
                            labels.data[i] = next;
                            queue.push_back((nz, ny, nx));
                        }
                    }
                }
            }
        }
    }
    (labels, next)
}

/// Full-neighborhood offsets: 26 in 3D, 8 in 2D.
fn neighbor_offsets(dim: Dim) -> Vec<(i64, i64, i64)> {
    let z_range: &[i64] = match dim {
        Dim::Two => &[0],
        Dim::Three => &[-1, 0, 1],
    };
    let mut offsets = Vec::with_capacity(26);
    for &dz in z_range {
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if dz == 0 && dy == 0 && dx == 0 {
                    continue;
                }
                offsets.push((dz, dy, dx));
            }
        }
    }
    offsets
}

#[inline]
fn in_bounds(shape: Shape, z: i64, y: i64, x: i64) -> bool {
    z >= 0
        && (z as usize) < shape.depth
        && y >= 0
        && (y as usize) < shape.rows
        && x >= 0
        && (x as usize) < shape.cols
}
