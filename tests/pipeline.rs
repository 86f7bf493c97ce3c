mod common;

use common::synthetic_stack::{sphere_stack, Sphere};
use nucleseg::labeling::label_components;
use nucleseg::morphology;
use nucleseg::objects::filter_objects;
use nucleseg::stack::{Dim, Shape, Stack};
use nucleseg::threshold::{binarize, ThresholdParams};
use nucleseg::SegmentationParams;
use std::collections::VecDeque;

/// Hole-filling postcondition: every background component of `mask` must
/// touch the outer boundary.
fn enclosed_background_exists(mask: &Stack<bool>) -> bool {
    let shape = mask.shape;
    let mut reached = vec![false; shape.len()];
    let mut queue = VecDeque::new();
    for z in 0..shape.depth {
        for y in 0..shape.rows {
            for x in 0..shape.cols {
                let xy_face = y == 0 || y == shape.rows - 1 || x == 0 || x == shape.cols - 1;
                let z_face = shape.dim == Dim::Three && (z == 0 || z == shape.depth - 1);
                if !(xy_face || z_face) {
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
        let neighbors: &[(i64, i64, i64)] = &[
            (-1, 0, 0),
            (1, 0, 0),
            (0, -1, 0),
            (0, 1, 0),
            (0, 0, -1),
            (0, 0, 1),
        ];
        for &(dz, dy, dx) in neighbors {
            let (nz, ny, nx) = (z as i64 + dz, y as i64 + dy, x as i64 + dx);
            if nz < 0
                || nz as usize >= shape.depth
                || ny < 0
                || ny as usize >= shape.rows
                || nx < 0
                || nx as usize >= shape.cols
            {
                continue;
            }
            let i = shape.idx(nz as usize, ny as usize, nx as usize);
            if !mask.data[i] && !reached[i] {
                reached[i] = true;
                queue.push_back((nz as usize, ny as usize, nx as usize));
            }
        }
    }
    mask.data
        .iter()
        .zip(&reached)
        .any(|(&fg, &r)| !fg && !r)
}

#[test]
fn cleaned_masks_have_no_enclosed_background() {
    // A nucleus with a dim nucleolar cavity: bright shell, dark center.
    let shape = Shape::three_d(12, 30, 30);
    let mut stack = sphere_stack(
        shape,
        &[Sphere {
            center: (6, 15, 15),
            radius: 8,
        }],
        0.0,
        200.0,
    );
    for z in 4..9 {
        for y in 13..18 {
            for x in 13..18 {
                stack.set(z, y, x, 0.0);
            }
        }
    }

    let mut mask = binarize(&stack, &ThresholdParams::default()).mask;
    assert!(
        enclosed_background_exists(&mask),
        "the synthetic cavity must start out as a hole"
    );
    morphology::clean(&mut mask);
    assert!(
        !enclosed_background_exists(&mask),
        "cleaning must fill every enclosed background region"
    );
}

#[test]
fn object_filter_is_idempotent_on_pipeline_output() {
    let shape = Shape::three_d(10, 40, 40);
    let stack = sphere_stack(
        shape,
        &[
            Sphere {
                center: (5, 12, 12),
                radius: 9,
            },
            Sphere {
                center: (5, 30, 30),
                radius: 4,
            },
        ],
        0.0,
        180.0,
    );
    let mut mask = binarize(&stack, &ThresholdParams::default()).mask;
    morphology::clean(&mut mask);

    // Radius bound between the two blobs, so exactly one survives.
    let mut params = SegmentationParams::default().filter;
    params.radius.min = 5.0;
    let first = filter_objects(&mask, &params);
    assert_eq!(first.kept, 1);

    let survivors = Stack::from_vec(shape, first.labels.data.iter().map(|&l| l > 0).collect());
    let second = filter_objects(&survivors, &params);

    assert_eq!(second.kept, first.kept);
    assert!(
        second.removed.is_empty(),
        "re-filtering must not remove anything: {:?}",
        second.removed
    );
    assert_eq!(second.labels.data, first.labels.data);
}

#[test]
fn degenerate_stack_flows_through_as_all_background() {
    let stack = Stack::filled(Shape::three_d(6, 20, 20), 140.0f32);
    let binarized = binarize(&stack, &ThresholdParams::default());
    assert!(binarized.degenerate);
    assert_eq!(binarized.global_threshold, 140.0);

    let mut mask = binarized.mask;
    morphology::clean(&mut mask);
    assert!(mask.data.iter().all(|&v| !v), "mask must stay empty");

    let outcome = filter_objects(&mask, &SegmentationParams::default().filter);
    assert_eq!(outcome.kept, 0);
    assert!(outcome.removed.is_empty());
}

#[test]
fn labels_survive_relabeling_densely_after_each_pass_combination() {
    // Five blobs of mixed size; the filter must leave dense IDs whatever
    // the subset of survivors is.
    let shape = Shape::three_d(8, 60, 60);
    let stack = sphere_stack(
        shape,
        &[
            Sphere {
                center: (4, 10, 10),
                radius: 7,
            },
            Sphere {
                center: (4, 10, 40),
                radius: 3,
            },
            Sphere {
                center: (4, 40, 10),
                radius: 8,
            },
            Sphere {
                center: (4, 40, 40),
                radius: 2,
            },
            Sphere {
                center: (4, 25, 25),
                radius: 6,
            },
        ],
        0.0,
        210.0,
    );
    let mut mask = binarize(&stack, &ThresholdParams::default()).mask;
    morphology::clean(&mut mask);

    let mut params = SegmentationParams::default().filter;
    params.radius.min = 5.0;
    let outcome = filter_objects(&mask, &params);

    let (_, components) = label_components(&Stack::from_vec(
        shape,
        outcome.labels.data.iter().map(|&l| l > 0).collect(),
    ));
    assert_eq!(outcome.kept, components, "kept count matches components");
    let max_label = outcome.labels.data.iter().copied().max().unwrap();
    assert_eq!(max_label, outcome.kept, "IDs must be dense after filtering");
}
