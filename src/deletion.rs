//! # Deletion
//!
//! Removing elements happens in two steps. The `delete_*` operations unlink
//! faces from the halfedge structure and mark them, and any edge or vertex
//! left without a face, as deleted. Handles stay stable while elements are
//! only marked. [`TriMesh::garbage_collection`] then drops the marked
//! elements and renumbers the survivors densely.

use log::debug;

use crate::connectivity::TriMesh;
use crate::error::Result;
use crate::handles::{EdgeHandle, ElementKind, FaceHandle, VertexHandle};

impl TriMesh {
    /// Delete a face.
    ///
    /// Its halfedges become boundary halfedges. An edge whose other side was
    /// already boundary is deleted with it. With `delete_isolated_vertices`
    /// set, corners left without any edge are deleted as well; otherwise
    /// they stay as isolated vertices.
    pub fn delete_face(&mut self, fh: FaceHandle, delete_isolated_vertices: bool) -> Result<()> {
        let start = self.face_halfedge(fh)?;
        let kernel = self.kernel_mut();
        kernel.attribs_mut(ElementKind::Face).set_deleted(fh.idx_usize());

        let mut dead_edges = Vec::with_capacity(3);
        let mut corners = Vec::with_capacity(3);
        let mut heh = start;
        for _ in 0..3 {
            kernel.clear_face(heh);
            if kernel.is_boundary(heh.opposite()) {
                dead_edges.push(heh.edge());
            }
            corners.push(kernel.to_vertex(heh));
            heh = kernel.next(heh);
        }

        for eh in dead_edges {
            let h0 = eh.halfedge(0);
            let h1 = eh.halfedge(1);
            let v0 = kernel.to_vertex(h0);
            let v1 = kernel.to_vertex(h1);
            let next0 = kernel.next(h0);
            let prev0 = kernel.prev(h0);
            let next1 = kernel.next(h1);
            let prev1 = kernel.prev(h1);

            // Splice the edge out of the boundary loops around both ends
            kernel.set_next(prev0, next1);
            kernel.set_next(prev1, next0);
            kernel.remove_edge(eh);

            for (vh, outgoing, next) in [(v0, h1, next0), (v1, h0, next1)] {
                if kernel.vertex_halfedge(vh) != Some(outgoing) {
                    continue;
                }
                if next == outgoing {
                    // The edge was the last one at this vertex
                    if delete_isolated_vertices {
                        kernel.attribs_mut(ElementKind::Vertex).set_deleted(vh.idx_usize());
                    }
                    kernel.set_isolated(vh);
                } else {
                    kernel.set_vertex_halfedge(vh, next);
                }
            }
        }

        for vh in corners {
            self.adjust_outgoing_halfedge(vh);
        }
        Ok(())
    }

    /// Delete a vertex together with every face around it
    pub fn delete_vertex(&mut self, vh: VertexHandle, delete_isolated_vertices: bool) -> Result<()> {
        let faces: Vec<FaceHandle> = self.vertex_faces(vh)?.collect();
        for fh in faces {
            self.delete_face(fh, delete_isolated_vertices)?;
        }

        let kernel = self.kernel_mut();
        kernel.set_isolated(vh);
        kernel.attribs_mut(ElementKind::Vertex).set_deleted(vh.idx_usize());
        Ok(())
    }

    /// Delete an edge by deleting the faces on both of its sides
    pub fn delete_edge(&mut self, eh: EdgeHandle, delete_isolated_vertices: bool) -> Result<()> {
        self.check_edge(eh)?;
        let sides = [
            self.kernel().face_of(eh.halfedge(0)),
            self.kernel().face_of(eh.halfedge(1)),
        ];
        for fh in sides.into_iter().flatten() {
            self.delete_face(fh, delete_isolated_vertices)?;
        }
        Ok(())
    }

    /// True if some element is marked deleted
    #[inline]
    pub fn has_garbage(&self) -> bool {
        self.kernel().has_garbage()
    }

    /// Drop every deleted element.
    ///
    /// Survivors are renumbered densely and keep their relative order, so
    /// handles taken before the call are stale afterwards. Status flags and
    /// properties move with their elements.
    pub fn garbage_collection(&mut self) {
        if !self.has_garbage() {
            return;
        }
        let dropped = self.kernel_mut().compact();
        debug!(
            "garbage collection dropped {} vertices, {} edges, {} faces",
            dropped.vertices, dropped.edges, dropped.faces
        );
    }
}
