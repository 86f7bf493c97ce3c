//! Binary mask cleanup: hole filling and morphological closing.
//!
//! Hole filling runs first, closing second: closing an unfilled mask can
//! seal surface pits into new false holes.
use crate::stack::{Dim, Shape, Stack};
use std::collections::VecDeque;

/// Structuring-element radius for the closing pass (side-3 cube/square).
const CLOSING_RADIUS: i64 = 1;

/// Clean a binary mask in place: fill enclosed holes, then close.
pub fn clean(mask: &mut Stack<bool>) {
    fill_holes(mask);
    close(mask, CLOSING_RADIUS);
}

/// Flip enclosed background regions to foreground.
///
/// Background is flood-filled from the outer boundary with face
/// connectivity (6 in 3D, 4 in 2D); background not reached is a hole. For
/// 2D masks only the row/col faces seed the fill; for 3D the z faces seed
/// too, so a cavity open to the top of the imaging volume is not a hole.
pub fn fill_holes(mask: &mut Stack<bool>) {
    let shape = mask.shape;
    let offsets = face_offsets(shape.dim);
    let mut reached = vec![false; shape.len()];
    let mut queue: VecDeque<(usize, usize, usize)> = VecDeque::new();

    for z in 0..shape.depth {
        for y in 0..shape.rows {
            for x in 0..shape.cols {
                if !on_outer_boundary(shape, z, y, x) {
                    continue;
                }
                let i = shape.idx(z, y, x);
                if !mask.data[i] && !reached[i] {
                    reached[i] = true;
                    queue.push_back((z, y, x));
                }
            }
        }
    }

    while let Some((z, y, x)) = queue.pop_front() {
        for &(dz, dy, dx) in &offsets {
            let (nz, ny, nx) = (z as i64 + dz, y as i64 + dy, x as i64 + dx);
            if !in_bounds(shape, nz, ny, nx) {
                continue;
            }
            let (nz, ny, nx) = (nz as usize, ny as usize, nx as usize);
            let i = shape.idx(nz, ny, nx);
            if !mask.data[i] && !reached[i] {
                reached[i] = true;
                queue.push_back((nz, ny, nx));
            }
        }
    }

    for (v, r) in mask.data.iter_mut().zip(&reached) {
        if !*v && !*r {
            *v = true;
        }
    }
}

/// Morphological closing: dilation then erosion with a cube/square element.
pub fn close(mask: &mut Stack<bool>, radius: i64) {
    let dilated = dilate(mask, radius);
    *mask = erode(&dilated, radius);
}

/// Dilation: a sample becomes foreground if any sample in its window is.
/// Out-of-bounds counts as background.
pub fn dilate(mask: &Stack<bool>, radius: i64) -> Stack<bool> {
    let shape = mask.shape;
    let rz = z_radius(shape.dim, radius);
    let mut out = Stack::filled(shape, false);
    for z in 0..shape.depth {
        for y in 0..shape.rows {
            for x in 0..shape.cols {
                'window: for dz in -rz..=rz {
                    for dy in -radius..=radius {
                        for dx in -radius..=radius {
                            let (nz, ny, nx) = (z as i64 + dz, y as i64 + dy, x as i64 + dx);
                            if in_bounds(shape, nz, ny, nx)
                                && mask.get(nz as usize, ny as usize, nx as usize)
                            {
                                out.set(z, y, x, true);
                                break 'window;
                            }
                        }
                    }
                }
            }
        }
    }
    out
}

/// Erosion: a sample survives only if every sample in its window is
/// foreground. Out-of-bounds counts as foreground, so objects touching the
/// image border are not eroded from outside (border clearing must still see
/// them).
pub fn erode(mask: &Stack<bool>, radius: i64) -> Stack<bool> {
    let shape = mask.shape;
    let rz = z_radius(shape.dim, radius);
    let mut out = Stack::filled(shape, false);
    for z in 0..shape.depth {
        for y in 0..shape.rows {
            for x in 0..shape.cols {
                if !mask.get(z, y, x) {
                    continue;
                }
                let mut keep = true;
                'window: for dz in -rz..=rz {
                    for dy in -radius..=radius {
                        for dx in -radius..=radius {
                            let (nz, ny, nx) = (z as i64 + dz, y as i64 + dy, x as i64 + dx);
                            if in_bounds(shape, nz, ny, nx)
                                && !mask.get(nz as usize, ny as usize, nx as usize)
                            {
                                keep = false;
                                break 'window;
                            }
                        }
                    }
                }
                out.set(z, y, x, keep);
            }
        }
    }
    out
}

fn z_radius(dim: Dim, radius: i64) -> i64 {
    match dim {
        Dim::Two => 0,
        Dim::Three => radius,
    }
}

fn face_offsets(dim: Dim) -> Vec<(i64, i64, i64)> {
    let mut offsets = vec![(0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1)];
    if dim == Dim::Three {
        offsets.push((-1, 0, 0));
        offsets.push((1, 0, 0));
    }
    offsets
}

fn on_outer_boundary(shape: Shape, z: usize, y: usize, x: usize) -> bool {
    let xy_face = y == 0 || y == shape.rows - 1 || x == 0 || x == shape.cols - 1;
    match shape.dim {
        Dim::Two => xy_face,
        Dim::Three => xy_face || z == 0 || z == shape.depth - 1,
    }
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
