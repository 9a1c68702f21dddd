//! # Geometry
//!
//! Geometric utilities for mesh operations.

use crate::connectivity::TriMesh;
use crate::error::Result;
use crate::handles::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle};
use crate::vector::Vec3d;

pub type Point = Vec3d;
pub type Vector = Vec3d;
pub type Normal = Vec3d;

/// Calculate the centroid of a triangle
#[inline]
pub fn triangle_centroid(p0: Point, p1: Point, p2: Point) -> Point {
    (p0 + p1 + p2) / 3.0
}

/// Calculate the area of a triangle using cross product
#[inline]
pub fn triangle_area(p0: Point, p1: Point, p2: Point) -> f64 {
    0.5 * ((p1 - p0) % (p2 - p0)).norm()
}

/// Calculate the unit normal of a triangle (zero for degenerate triangles)
#[inline]
pub fn triangle_normal(p0: Point, p1: Point, p2: Point) -> Normal {
    ((p1 - p0) % (p2 - p0)).normalized_or_zero()
}

/// Calculate the bounding box of a point set
pub fn bounding_box(points: &[Point]) -> Option<(Point, Point)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
    )
}

/// Calculate the distance between two points
#[inline]
pub fn distance(p0: Point, p1: Point) -> f64 {
    (p0 - p1).norm()
}

impl TriMesh {
    /// Positions of the three corners of a face, in circulation order
    pub fn face_points(&self, fh: FaceHandle) -> Result<[Point; 3]> {
        let [a, b, c] = self.face_triangle(fh)?;
        Ok([self.point(a)?, self.point(b)?, self.point(c)?])
    }

    /// Unit normal of a face, following the right-hand rule on its winding
    pub fn face_normal(&self, fh: FaceHandle) -> Result<Normal> {
        let [p0, p1, p2] = self.face_points(fh)?;
        Ok(triangle_normal(p0, p1, p2))
    }

    pub fn face_area(&self, fh: FaceHandle) -> Result<f64> {
        let [p0, p1, p2] = self.face_points(fh)?;
        Ok(triangle_area(p0, p1, p2))
    }

    pub fn face_centroid(&self, fh: FaceHandle) -> Result<Point> {
        let [p0, p1, p2] = self.face_points(fh)?;
        Ok(triangle_centroid(p0, p1, p2))
    }

    /// Vector from the start to the end of a halfedge
    pub fn halfedge_vector(&self, heh: HalfedgeHandle) -> Result<Vector> {
        let from = self.point(self.from_vertex(heh)?)?;
        let to = self.point(self.to_vertex(heh)?)?;
        Ok(to - from)
    }

    pub fn edge_length(&self, eh: EdgeHandle) -> Result<f64> {
        Ok(self.halfedge_vector(self.edge_halfedge(eh, 0)?)?.norm())
    }

    /// Area-weighted average of the incident face normals.
    ///
    /// Isolated vertices get a zero normal.
    pub fn vertex_normal(&self, vh: VertexHandle) -> Result<Normal> {
        let mut sum = Vec3d::ZERO;
        for fh in self.vertex_faces(vh)? {
            let [p0, p1, p2] = self.face_points(fh)?;
            // |cross| is twice the area, so the raw cross product is already
            // area-weighted
            sum += (p1 - p0) % (p2 - p0);
        }
        Ok(sum.normalized_or_zero())
    }

    /// Sum of all face areas
    pub fn surface_area(&self) -> Result<f64> {
        self.faces().map(|fh| self.face_area(fh)).sum()
    }

    /// Axis-aligned bounding box of the live vertices; None if there are none
    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        self.kernel().bounding_box()
    }

    /// Mean live vertex position; None if there are no live vertices
    pub fn centroid(&self) -> Option<Point> {
        self.kernel().centroid()
    }
}
