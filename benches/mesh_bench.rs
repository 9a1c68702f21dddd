//! TriMesh Benchmark

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use halfmesh::{cross, grid, FaceHandle, TriMesh, Vec3d, VertexHandle};

fn bench_build_grid(c: &mut Criterion) {
    c.bench_function("build_grid_64x64", |b| {
        b.iter(|| grid(black_box(64), black_box(64)))
    });
}

fn bench_add_faces(c: &mut Criterion) {
    c.bench_function("add_faces_strip_1000", |b| {
        b.iter(|| {
            let mut mesh = TriMesh::new();
            for i in 0..1002 {
                mesh.add_vertex(Vec3d::new((i / 2) as f64, (i % 2) as f64, 0.0));
            }
            for i in 0..1000u32 {
                let (p, q, r) = if i % 2 == 0 { (i, i + 1, i + 2) } else { (i, i + 2, i + 1) };
                mesh.add_face(VertexHandle::new(p), VertexHandle::new(q), VertexHandle::new(r))
                    .expect("strip face");
            }
            mesh
        })
    });
}

fn bench_vertex_vertices(c: &mut Criterion) {
    let mesh = grid(64, 64);

    c.bench_function("vertex_vertices_all", |b| {
        b.iter(|| {
            let mut sum = 0usize;
            for vh in mesh.vertices() {
                if let Ok(ring) = mesh.vertex_vertices(vh) {
                    sum += ring.count();
                }
            }
            black_box(sum)
        })
    });
}

fn bench_face_vertices(c: &mut Criterion) {
    let mesh = grid(64, 64);

    c.bench_function("face_vertices_all", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for fh in mesh.faces() {
                if let Ok(ring) = mesh.face_vertices(fh) {
                    sum += ring.map(|vh| vh.idx() as u64).sum::<u64>();
                }
            }
            black_box(sum)
        })
    });
}

fn bench_surface_area(c: &mut Criterion) {
    let mesh = grid(64, 64);

    c.bench_function("surface_area_64x64", |b| {
        b.iter(|| mesh.surface_area())
    });
}

fn bench_delete_and_collect(c: &mut Criterion) {
    c.bench_function("delete_half_and_collect_64x64", |b| {
        b.iter_batched(
            || grid(64, 64),
            |mut mesh| {
                let doomed: Vec<FaceHandle> = mesh.faces().step_by(2).collect();
                for fh in doomed {
                    mesh.delete_face(fh, true).expect("live face");
                }
                mesh.garbage_collection();
                mesh
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_cross(c: &mut Criterion) {
    let a = Vec3d::new(1.0, 2.0, 3.0);
    let v = Vec3d::new(-2.0, 0.5, 4.0);

    c.bench_function("vec3d_cross", |b| {
        b.iter(|| cross(black_box(a), black_box(v)))
    });
}

criterion_group!(
    benches,
    bench_build_grid,
    bench_add_faces,
    bench_vertex_vertices,
    bench_face_vertices,
    bench_surface_area,
    bench_delete_and_collect,
    bench_cross,
);
criterion_main!(benches);
