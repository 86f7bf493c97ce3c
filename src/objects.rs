//! Object-level filtering of labeled masks.
//!
//! Three passes in fixed order: equivalent-radius interval, Z-span fraction
//! (3D only), XY-border contact. Objects discarded by an earlier pass are
//! never reconsidered by a later one. Surviving labels are renumbered
//! densely once, after the last pass.
use crate::labeling::label_components;
use crate::stack::{Dim, Stack};
use log::debug;
use serde::Serialize;
use std::f64::consts::PI;

/// Inclusive interval of acceptable equivalent radii, in voxels.
#[derive(Clone, Copy, Debug)]
pub struct RadiusInterval {
    pub min: f64,
    pub max: f64,
}

impl Default for RadiusInterval {
    fn default() -> Self {
        Self {
            min: 10.0,
            max: f64::INFINITY,
        }
    }
}

impl RadiusInterval {
    fn contains(&self, radius: f64) -> bool {
        radius >= self.min && radius <= self.max
    }
}

/// Parameters for the filtering passes.
#[derive(Clone, Debug)]
pub struct FilterParams {
    /// Acceptable equivalent-radius interval.
    pub radius: RadiusInterval,
    /// Minimum fraction of the stack depth an object must span (3D only).
    pub min_z_fraction: f64,
    /// Discard objects touching the outer XY boundary.
    pub clear_xy_borders: bool,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            radius: RadiusInterval::default(),
            min_z_fraction: 0.25,
            clear_xy_borders: false,
        }
    }
}

/// Per-object attributes from one pass over the labeled mask.
#[derive(Clone, Debug)]
pub struct ObjectStats {
    pub label: u32,
    pub voxels: usize,
    pub z_min: usize,
    pub z_max: usize,
    pub touches_xy_border: bool,
}

/// Why an object was removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    XySize,
    ZSize,
    BorderContact,
}

/// Diagnostics record for one removed object.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedObject {
    /// Scan-order label before renumbering.
    pub label: u32,
    pub voxels: usize,
    pub equivalent_radius: f64,
    pub reason: RemovalReason,
}

/// Filtered labeled mask plus removal diagnostics.
#[derive(Clone, Debug)]
pub struct FilterOutcome {
    /// Labeled mask with dense surviving IDs `1..=kept`.
    pub labels: Stack<u32>,
    /// Number of surviving objects.
    pub kept: u32,
    /// Removed objects, in pass order.
    pub removed: Vec<RemovedObject>,
}

/// Equivalent radius of a roughly spherical (3D) or circular (2D) object
/// with the given sample count.
pub fn equivalent_radius(voxels: usize, dim: Dim) -> f64 {
    let n = voxels as f64;
    match dim {
        Dim::Three => (3.0 * n / (4.0 * PI)).cbrt(),
        Dim::Two => (n / PI).sqrt(),
    }
}

/// Collect per-label statistics from a labeled mask.
pub fn object_stats(labels: &Stack<u32>, count: u32) -> Vec<ObjectStats> {
    let shape = labels.shape;
    let mut stats: Vec<ObjectStats> = (1..=count)
        .map(|label| ObjectStats {
            label,
            voxels: 0,
            z_min: usize::MAX,
            z_max: 0,
            touches_xy_border: false,
        })
        .collect();

    for z in 0..shape.depth {
        for y in 0..shape.rows {
            for x in 0..shape.cols {
                let label = labels.get(z, y, x);
                if label == 0 {
                    continue;
                }
                let s = &mut stats[(label - 1) as usize];
                s.voxels += 1;
                s.z_min = s.z_min.min(z);
                s.z_max = s.z_max.max(z);
                if y == 0 || y == shape.rows - 1 || x == 0 || x == shape.cols - 1 {
                    s.touches_xy_border = true;
                }
            }
        }
    }
    stats
}

/// Label a cleaned binary mask and run the filtering passes.
pub fn filter_objects(mask: &Stack<bool>, params: &FilterParams) -> FilterOutcome {
    let (labels, count) = label_components(mask);
    filter_labeled(labels, count, params)
}

/// Run the filtering passes over an already-labeled mask.
pub fn filter_labeled(labels: Stack<u32>, count: u32, params: &FilterParams) -> FilterOutcome {
    let dim = labels.shape.dim;
    let depth = labels.shape.depth;
    let stats = object_stats(&labels, count);

    let mut removed: Vec<RemovedObject> = Vec::new();
    let mut surviving: Vec<&ObjectStats> = Vec::with_capacity(stats.len());

    // Pass 1: equivalent-radius interval.
    for s in &stats {
        let radius = equivalent_radius(s.voxels, dim);
        if params.radius.contains(radius) {
            surviving.push(s);
        } else {
            removed.push(RemovedObject {
                label: s.label,
                voxels: s.voxels,
                equivalent_radius: radius,
                reason: RemovalReason::XySize,
            });
        }
    }

    // Pass 2: Z-span fraction, 3D only, over XY survivors.
    if dim == Dim::Three && params.min_z_fraction > 0.0 {
        surviving.retain(|s| {
            let span = (s.z_max - s.z_min + 1) as f64 / depth as f64;
            if span >= params.min_z_fraction {
                true
            } else {
                removed.push(RemovedObject {
                    label: s.label,
                    voxels: s.voxels,
                    equivalent_radius: equivalent_radius(s.voxels, dim),
                    reason: RemovalReason::ZSize,
                });
                false
            }
        });
    }

    // Pass 3: XY-border contact, over remaining survivors.
    if params.clear_xy_borders {
        surviving.retain(|s| {
            if s.touches_xy_border {
                removed.push(RemovedObject {
                    label: s.label,
                    voxels: s.voxels,
                    equivalent_radius: equivalent_radius(s.voxels, dim),
                    reason: RemovalReason::BorderContact,
                });
                false
            } else {
                true
            }
        });
    }

    // Renumber survivors densely, clearing removed labels.
    let mut remap = vec![0u32; count as usize + 1];
    for (new_id, s) in surviving.iter().enumerate() {
        remap[s.label as usize] = new_id as u32 + 1;
    }
    let kept = surviving.len() as u32;
    let mut labels = labels;
    for v in &mut labels.data {
        *v = remap[*v as usize];
    }

    debug!(
        "filter_objects: {count} labeled, {kept} kept, {} removed",
        removed.len()
    );
    FilterOutcome {
        labels,
        kept,
        removed,
    }
}
