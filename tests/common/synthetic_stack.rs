use nucleseg::stack::{Shape, Stack};

/// A filled sphere: center in (z, y, x) order, radius in voxels.
#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: (i64, i64, i64),
    pub radius: i64,
}

/// Generates a 3D stack of `background` intensity with filled spheres of
/// `foreground` intensity. Spheres are clipped at the stack bounds.
pub fn sphere_stack(
    shape: Shape,
    spheres: &[Sphere],
    background: f32,
    foreground: f32,
) -> Stack<f32> {
    assert!(!shape.is_empty(), "stack dimensions must be positive");
    let mut stack = Stack::filled(shape, background);
    for z in 0..shape.depth {
        for y in 0..shape.rows {
            for x in 0..shape.cols {
                for sphere in spheres {
                    let (cz, cy, cx) = sphere.center;
                    let (dz, dy, dx) = (z as i64 - cz, y as i64 - cy, x as i64 - cx);
                    if dz * dz + dy * dy + dx * dx <= sphere.radius * sphere.radius {
                        stack.set(z, y, x, foreground);
                        break;
                    }
                }
            }
        }
    }
    stack
}

/// Quantize a float stack to u8 for writing as a synthetic input TIFF.
pub fn to_u8(stack: &Stack<f32>) -> Stack<u8> {
    let data = stack
        .data
        .iter()
        .map(|&v| v.clamp(0.0, 255.0) as u8)
        .collect();
    Stack::from_vec(stack.shape, data)
}
