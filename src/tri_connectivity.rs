//! # TriConnectivity
//!
//! Triangle-specific operations on [`TriMesh`]: polygon fan insertion, bulk
//! construction and the corner queries that only make sense for triangles.

use log::debug;

use crate::connectivity::TriMesh;
use crate::error::{Result, TopologyError};
use crate::handles::{FaceHandle, HalfedgeHandle, VertexHandle};
use crate::vector::Vec3d;

/// Handle for a raw index, rejecting indices a `u32` handle cannot hold
fn vertex_index(idx: usize) -> Result<VertexHandle> {
    match u32::try_from(idx) {
        Ok(raw) if raw != u32::MAX => Ok(VertexHandle::new(raw)),
        _ => Err(TopologyError::IndexOverflow(idx).into()),
    }
}

impl TriMesh {
    /// Build a mesh from a point list and triangle index triples
    pub fn from_triangles(points: &[Vec3d], triangles: &[[usize; 3]]) -> Result<Self> {
        let mut mesh = TriMesh::new();
        for &p in points {
            mesh.add_vertex(p);
        }
        for t in triangles {
            let [a, b, c] = [vertex_index(t[0])?, vertex_index(t[1])?, vertex_index(t[2])?];
            mesh.add_face(a, b, c)?;
        }
        debug!(
            "built mesh with {} vertices, {} faces",
            mesh.n_vertices(),
            mesh.n_faces()
        );
        Ok(mesh)
    }

    /// Add a polygon as a triangle fan around its first vertex.
    ///
    /// `[v0, v1, ..., vn]` becomes `(v0, v1, v2), (v0, v2, v3), ...`. Either all
    /// triangles are inserted or, on error, the mesh is restored to its state
    /// before the call.
    pub fn add_face_from(&mut self, vertices: &[VertexHandle]) -> Result<Vec<FaceHandle>> {
        if vertices.len() < 3 {
            return Err(TopologyError::TooFewVertices(vertices.len()).into());
        }

        let snapshot = (vertices.len() > 3).then(|| self.kernel().clone());
        let mut faces = Vec::with_capacity(vertices.len() - 2);

        for pair in vertices[1..].windows(2) {
            match self.add_face(vertices[0], pair[0], pair[1]) {
                Ok(fh) => faces.push(fh),
                Err(err) => {
                    if let Some(kernel) = snapshot {
                        *self.kernel_mut() = kernel;
                    }
                    return Err(err);
                }
            }
        }

        Ok(faces)
    }

    /// The three corners of a face, starting at the face's first vertex
    pub fn face_triangle(&self, fh: FaceHandle) -> Result<[VertexHandle; 3]> {
        let h0 = self.face_halfedge(fh)?;
        let kernel = self.kernel();
        let h1 = kernel.next(h0);
        let h2 = kernel.next(h1);
        Ok([kernel.to_vertex(h0), kernel.to_vertex(h1), kernel.to_vertex(h2)])
    }

    /// The corner of the halfedge's face that is not on the halfedge.
    ///
    /// None for boundary halfedges.
    pub fn opposite_vertex(&self, heh: HalfedgeHandle) -> Result<Option<VertexHandle>> {
        if self.is_boundary_halfedge(heh)? {
            return Ok(None);
        }
        Ok(Some(self.kernel().to_vertex(self.kernel().next(heh))))
    }

    /// The corner opposite the halfedge on the other side of its edge
    pub fn opposite_he_opposite_vertex(&self, heh: HalfedgeHandle) -> Result<Option<VertexHandle>> {
        self.check_halfedge(heh)?;
        self.opposite_vertex(heh.opposite())
    }

    /// True if the two vertices are joined by an edge
    pub fn is_edge(&self, v0: VertexHandle, v1: VertexHandle) -> Result<bool> {
        Ok(self.find_halfedge(v0, v1)?.is_some())
    }

    /// The face on the left of `from -> to`, if any
    pub fn face_of_edge(&self, from: VertexHandle, to: VertexHandle) -> Result<Option<FaceHandle>> {
        Ok(self
            .find_halfedge(from, to)?
            .and_then(|heh| self.kernel().face_of(heh)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use crate::test_data::{single_triangle, tetrahedron};

    fn quad() -> (TriMesh, [VertexHandle; 4]) {
        let mut mesh = TriMesh::new();
        let v = [
            mesh.add_vertex(Vec3d::new(0.0, 0.0, 0.0)),
            mesh.add_vertex(Vec3d::new(1.0, 0.0, 0.0)),
            mesh.add_vertex(Vec3d::new(1.0, 1.0, 0.0)),
            mesh.add_vertex(Vec3d::new(0.0, 1.0, 0.0)),
        ];
        (mesh, v)
    }

    #[test]
    fn test_add_quad_as_fan() {
        let (mut mesh, v) = quad();
        let faces = mesh.add_face_from(&v).expect("valid quad");
        assert_eq!(faces, vec![FaceHandle::new(0), FaceHandle::new(1)]);
        assert_eq!(mesh.face_triangle(faces[0]).expect("valid"), [v[0], v[1], v[2]]);
        assert_eq!(mesh.face_triangle(faces[1]).expect("valid"), [v[0], v[2], v[3]]);
        assert_eq!(mesh.n_edges(), 5);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_add_polygon_rolls_back() {
        let (mut mesh, v) = quad();
        mesh.add_face(v[0], v[2], v[3]).expect("seed face");
        let before = (mesh.n_faces(), mesh.n_edges());

        // The second fan triangle (v0, v2, v3) reuses v0 -> v2 in the same
        // direction as the seed face and is rejected.
        let err = mesh.add_face_from(&[v[0], v[1], v[2], v[3]]).unwrap_err();
        assert!(matches!(err, MeshError::InvalidTopology(TopologyError::ComplexEdge(..))));
        assert_eq!((mesh.n_faces(), mesh.n_edges()), before);
        assert!(mesh.validate().is_ok());
        assert!(mesh.is_isolated(v[1]).expect("valid"));
    }

    #[test]
    fn test_too_few_vertices() {
        let (mut mesh, v) = quad();
        let err = mesh.add_face_from(&v[..2]).unwrap_err();
        assert_eq!(err, MeshError::InvalidTopology(TopologyError::TooFewVertices(2)));
    }

    #[test]
    fn test_from_triangles_propagates_errors() {
        let points = [Vec3d::ZERO, Vec3d::new(1.0, 0.0, 0.0), Vec3d::new(0.0, 1.0, 0.0)];
        assert!(TriMesh::from_triangles(&points, &[[0, 1, 2]]).is_ok());
        assert!(TriMesh::from_triangles(&points, &[[0, 1, 3]]).is_err());
    }

    #[test]
    fn test_from_triangles_rejects_wide_indices() {
        let points = [Vec3d::ZERO, Vec3d::new(1.0, 0.0, 0.0), Vec3d::new(0.0, 1.0, 0.0)];

        // Must not wrap around to an existing vertex
        let err = TriMesh::from_triangles(&points, &[[0, 1, usize::MAX]]).unwrap_err();
        assert_eq!(
            err,
            MeshError::InvalidTopology(TopologyError::IndexOverflow(usize::MAX))
        );

        let err = TriMesh::from_triangles(&points, &[[u32::MAX as usize, 1, 2]]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidTopology(TopologyError::IndexOverflow(_))
        ));

        #[cfg(target_pointer_width = "64")]
        {
            let wrapped = (1usize << 32) + 2;
            let err = TriMesh::from_triangles(&points, &[[0, 1, wrapped]]).unwrap_err();
            assert_eq!(
                err,
                MeshError::InvalidTopology(TopologyError::IndexOverflow(wrapped))
            );
        }
    }

    #[test]
    fn test_opposite_vertices() {
        let mesh = single_triangle();
        let (v0, v1, v2) = (VertexHandle::new(0), VertexHandle::new(1), VertexHandle::new(2));
        let heh = mesh.find_halfedge(v0, v1).expect("valid").expect("edge");
        assert_eq!(mesh.opposite_vertex(heh).expect("valid"), Some(v2));
        assert_eq!(mesh.opposite_he_opposite_vertex(heh).expect("valid"), None);
        assert!(mesh.is_edge(v1, v0).expect("valid"));
        assert_eq!(mesh.face_of_edge(v0, v1).expect("valid"), Some(FaceHandle::new(0)));
        assert_eq!(mesh.face_of_edge(v1, v0).expect("valid"), None);
        assert_eq!(mesh.face_of_edge(v0, VertexHandle::new(0)).expect("valid"), None);
    }

    #[test]
    fn test_every_tetrahedron_edge_has_two_faces() {
        let mesh = tetrahedron();
        for eh in mesh.edges() {
            let heh = eh.halfedge(0);
            let a = mesh.opposite_vertex(heh).expect("valid");
            let b = mesh.opposite_he_opposite_vertex(heh).expect("valid");
            assert!(a.is_some() && b.is_some());
            assert_ne!(a, b);
        }
    }
}
