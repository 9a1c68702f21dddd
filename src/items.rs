//! # Mesh Items
//!
//! Connectivity records stored by the kernel. Vertex positions live in the
//! kernel's SoA arrays; these records only carry topology.

use crate::handles::{FaceHandle, HalfedgeHandle, VertexHandle};

/// A halfedge in the mesh (directional edge)
/// Each edge consists of two halfedges in opposite directions
#[derive(Debug, Clone, PartialEq)]
pub struct Halfedge {
    /// The vertex this halfedge points to
    pub vertex_handle: VertexHandle,
    /// The face this halfedge borders (None if boundary)
    pub face_handle: Option<FaceHandle>,
    /// The next halfedge in the face (or boundary loop)
    pub next_halfedge_handle: HalfedgeHandle,
    /// The previous halfedge in the face (or boundary loop)
    pub prev_halfedge_handle: HalfedgeHandle,
}

impl Halfedge {
    /// A fresh, unlinked boundary halfedge pointing to `vh`
    #[inline]
    pub fn new(vh: VertexHandle) -> Self {
        Self {
            vertex_handle: vh,
            face_handle: None,
            next_halfedge_handle: HalfedgeHandle::invalid(),
            prev_halfedge_handle: HalfedgeHandle::invalid(),
        }
    }

    /// Check if this is a boundary halfedge
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.face_handle.is_none()
    }
}

/// A face in the mesh (triangle)
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// The anchor halfedge; face circulation starts here
    pub halfedge_handle: HalfedgeHandle,
}

impl Face {
    #[inline]
    pub fn new(halfedge_handle: HalfedgeHandle) -> Self {
        Self { halfedge_handle }
    }
}
