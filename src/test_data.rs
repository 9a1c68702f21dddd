//! # Test Data Generator
//!
//! Small canonical meshes for tests and benchmarks. All closed shapes are
//! wound so that face normals point outward.

use std::f64::consts::TAU;

use crate::connectivity::TriMesh;
use crate::vector::Vec3d;

fn build(points: &[Vec3d], triangles: &[[usize; 3]]) -> TriMesh {
    match TriMesh::from_triangles(points, triangles) {
        Ok(mesh) => mesh,
        Err(err) => unreachable!("fixed test mesh is invalid: {}", err),
    }
}

/// One counter-clockwise triangle in the XY plane: (0,0,0), (1,0,0), (0,1,0)
pub fn single_triangle() -> TriMesh {
    build(
        &[
            Vec3d::new(0.0, 0.0, 0.0),
            Vec3d::new(1.0, 0.0, 0.0),
            Vec3d::new(0.0, 1.0, 0.0),
        ],
        &[[0, 1, 2]],
    )
}

/// Regular tetrahedron inscribed in the cube [-1, 1]^3
pub fn tetrahedron() -> TriMesh {
    build(
        &[
            Vec3d::new(1.0, 1.0, 1.0),
            Vec3d::new(-1.0, -1.0, 1.0),
            Vec3d::new(-1.0, 1.0, -1.0),
            Vec3d::new(1.0, -1.0, -1.0),
        ],
        &[[0, 2, 1], [0, 3, 2], [0, 1, 3], [1, 2, 3]],
    )
}

/// Octahedron with vertices on the unit axes.
///
/// Vertex order is +x, -x, +y, -y, +z, -z.
pub fn octahedron() -> TriMesh {
    build(
        &[
            Vec3d::new(1.0, 0.0, 0.0),
            Vec3d::new(-1.0, 0.0, 0.0),
            Vec3d::new(0.0, 1.0, 0.0),
            Vec3d::new(0.0, -1.0, 0.0),
            Vec3d::new(0.0, 0.0, 1.0),
            Vec3d::new(0.0, 0.0, -1.0),
        ],
        &[
            // top
            [4, 0, 2],
            [4, 2, 1],
            [4, 1, 3],
            [4, 3, 0],
            // bottom
            [5, 2, 0],
            [5, 1, 2],
            [5, 3, 1],
            [5, 0, 3],
        ],
    )
}

/// Regular grid of `rows x cols` vertices in the XY plane, unit spacing.
///
/// Vertex `(r, c)` has index `r * cols + c` and position `(c, r, 0)`. Each cell
/// is split along its rising diagonal into two counter-clockwise triangles.
pub fn grid(rows: usize, cols: usize) -> TriMesh {
    let points: Vec<Vec3d> = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| Vec3d::new(c as f64, r as f64, 0.0)))
        .collect();

    let mut triangles = Vec::with_capacity(2 * rows.saturating_sub(1) * cols.saturating_sub(1));
    for r in 0..rows.saturating_sub(1) {
        for c in 0..cols.saturating_sub(1) {
            let a = r * cols + c;
            let b = a + 1;
            let d = a + cols;
            let e = d + 1;
            triangles.push([a, b, e]);
            triangles.push([a, e, d]);
        }
    }

    build(&points, &triangles)
}

/// Closed triangle fan: vertex 0 at the origin surrounded by `n` rim
/// vertices on the unit circle. Fewer than 3 rim vertices gives no faces.
pub fn fan(n: usize) -> TriMesh {
    let mut points = Vec::with_capacity(n + 1);
    points.push(Vec3d::ZERO);
    points.extend((0..n).map(|i| {
        let angle = TAU * i as f64 / n as f64;
        Vec3d::new(angle.cos(), angle.sin(), 0.0)
    }));

    let triangles: Vec<[usize; 3]> = if n < 3 {
        Vec::new()
    } else {
        (0..n).map(|i| [0, 1 + i, 1 + (i + 1) % n]).collect()
    };

    build(&points, &triangles)
}
