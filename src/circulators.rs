//! # Circulators
//!
//! Circulators walk the ring of elements around a vertex or a face.
//!
//! Every circulator is a cursor over halfedges: a start halfedge, the current
//! halfedge and a lap counter. The cursor is valid while the current halfedge
//! is valid and it has not come back to the start. Because boundary halfedges
//! are linked into loops, the ring always closes, including around boundary
//! and non-manifold vertices.
//!
//! Around a vertex the cursor starts at the vertex's outgoing halfedge (a
//! boundary halfedge for boundary vertices) and rotates clockwise with
//! `next(opposite(h))`; the `_ccw` variants rotate the other way. Around a
//! face it starts at the face's anchor halfedge, which points to the face's
//! first vertex, and follows `next`.
//!
//! Circulators are `Copy`; [`restart`](VertexVertexIter::restart) rewinds one
//! in place, and calling the mesh method again yields a fresh traversal.

use std::iter::FusedIterator;

use crate::connectivity::TriMesh;
use crate::error::Result;
use crate::handles::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle};
use crate::soa_kernel::SoAKernel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// `next(opposite(h))` - outgoing halfedges around a vertex, clockwise
    VertexCw,
    /// `opposite(prev(h))` - outgoing halfedges around a vertex, counter-clockwise
    VertexCcw,
    /// `next(h)` - halfedges of a face in stored order
    FaceNext,
    /// `prev(h)` - halfedges of a face in reverse order
    FacePrev,
}

/// Lap-counted cursor shared by all circulators
#[derive(Debug, Clone, Copy)]
struct HalfedgeRing<'a> {
    kernel: &'a SoAKernel,
    start: HalfedgeHandle,
    current: HalfedgeHandle,
    laps: u32,
    step: Step,
}

impl<'a> HalfedgeRing<'a> {
    fn new(kernel: &'a SoAKernel, start: Option<HalfedgeHandle>, step: Step) -> Self {
        let start = start.unwrap_or_default();
        Self {
            kernel,
            start,
            current: start,
            laps: 0,
            step,
        }
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.current.is_valid() && (self.current != self.start || self.laps == 0)
    }

    #[inline]
    fn advance(&mut self) {
        let kernel = self.kernel;
        self.current = match self.step {
            Step::VertexCw => kernel.next(self.current.opposite()),
            Step::VertexCcw => kernel.prev(self.current).opposite(),
            Step::FaceNext => kernel.next(self.current),
            Step::FacePrev => kernel.prev(self.current),
        };
        if self.current == self.start {
            self.laps += 1;
        }
    }

    #[inline]
    fn next_halfedge(&mut self) -> Option<HalfedgeHandle> {
        if !self.is_valid() {
            return None;
        }
        let heh = self.current;
        self.advance();
        Some(heh)
    }

    #[inline]
    fn restart(&mut self) {
        self.current = self.start;
        self.laps = 0;
    }
}

macro_rules! circulator {
    (
        $(#[$meta:meta])*
        $name:ident => $item:ty, |$kernel:ident, $heh:ident| $map:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            ring: HalfedgeRing<'a>,
        }

        impl<'a> $name<'a> {
            /// Rewind to the first element
            #[inline]
            pub fn restart(&mut self) {
                self.ring.restart();
            }

            /// The halfedge the next element will be read from, if any
            #[inline]
            pub fn current_halfedge(&self) -> Option<HalfedgeHandle> {
                self.ring.is_valid().then_some(self.ring.current)
            }
        }

        impl<'a> Iterator for $name<'a> {
            type Item = $item;

            fn next(&mut self) -> Option<Self::Item> {
                loop {
                    let $heh = self.ring.next_halfedge()?;
                    let $kernel = self.ring.kernel;
                    let item: Option<$item> = $map;
                    if item.is_some() {
                        return item;
                    }
                }
            }
        }

        impl<'a> FusedIterator for $name<'a> {}
    };
}

circulator!(
    /// Vertex-Vertex circulator: the one-ring neighbors of a vertex
    VertexVertexIter => VertexHandle, |kernel, heh| Some(kernel.to_vertex(heh))
);

circulator!(
    /// Vertex-Face circulator: faces incident to a vertex, skipping boundary gaps
    VertexFaceIter => FaceHandle, |kernel, heh| kernel.face_of(heh)
);

circulator!(
    /// Vertex-OutgoingHalfedge circulator
    VertexOHalfedgeIter => HalfedgeHandle, |_kernel, heh| Some(heh)
);

circulator!(
    /// Vertex-IncomingHalfedge circulator
    VertexIHalfedgeIter => HalfedgeHandle, |_kernel, heh| Some(heh.opposite())
);

circulator!(
    /// Vertex-Edge circulator
    VertexEdgeIter => EdgeHandle, |_kernel, heh| Some(heh.edge())
);

circulator!(
    /// Face-Vertex circulator: the corners of a face
    FaceVertexIter => VertexHandle, |kernel, heh| Some(kernel.to_vertex(heh))
);

circulator!(
    /// Face-Halfedge circulator: the halfedges bounding a face
    FaceHalfedgeIter => HalfedgeHandle, |_kernel, heh| Some(heh)
);

circulator!(
    /// Face-Edge circulator
    FaceEdgeIter => EdgeHandle, |_kernel, heh| Some(heh.edge())
);

circulator!(
    /// Face-Face circulator: faces sharing an edge with a face. Boundary
    /// edges contribute nothing.
    FaceFaceIter => FaceHandle, |kernel, heh| kernel.face_of(heh.opposite())
);

impl TriMesh {
    fn vertex_ring(&self, vh: VertexHandle, step: Step) -> Result<HalfedgeRing<'_>> {
        let start = self.vertex_halfedge(vh)?;
        Ok(HalfedgeRing::new(self.kernel(), start, step))
    }

    fn face_ring(&self, fh: FaceHandle, step: Step) -> Result<HalfedgeRing<'_>> {
        let start = self.face_halfedge(fh)?;
        Ok(HalfedgeRing::new(self.kernel(), Some(start), step))
    }

    /// Neighbor vertices of `vh`, clockwise. Empty for isolated vertices.
    pub fn vertex_vertices(&self, vh: VertexHandle) -> Result<VertexVertexIter<'_>> {
        Ok(VertexVertexIter {
            ring: self.vertex_ring(vh, Step::VertexCw)?,
        })
    }

    /// Neighbor vertices of `vh`, counter-clockwise
    pub fn vertex_vertices_ccw(&self, vh: VertexHandle) -> Result<VertexVertexIter<'_>> {
        Ok(VertexVertexIter {
            ring: self.vertex_ring(vh, Step::VertexCcw)?,
        })
    }

    /// Faces incident to `vh`, clockwise
    pub fn vertex_faces(&self, vh: VertexHandle) -> Result<VertexFaceIter<'_>> {
        Ok(VertexFaceIter {
            ring: self.vertex_ring(vh, Step::VertexCw)?,
        })
    }

    /// Halfedges leaving `vh`, clockwise
    pub fn vertex_outgoing_halfedges(&self, vh: VertexHandle) -> Result<VertexOHalfedgeIter<'_>> {
        Ok(VertexOHalfedgeIter {
            ring: self.vertex_ring(vh, Step::VertexCw)?,
        })
    }

    /// Halfedges arriving at `vh`, clockwise
    pub fn vertex_incoming_halfedges(&self, vh: VertexHandle) -> Result<VertexIHalfedgeIter<'_>> {
        Ok(VertexIHalfedgeIter {
            ring: self.vertex_ring(vh, Step::VertexCw)?,
        })
    }

    /// Edges incident to `vh`, clockwise
    pub fn vertex_edges(&self, vh: VertexHandle) -> Result<VertexEdgeIter<'_>> {
        Ok(VertexEdgeIter {
            ring: self.vertex_ring(vh, Step::VertexCw)?,
        })
    }

    /// Corners of `fh` in stored order, starting at its first vertex
    pub fn face_vertices(&self, fh: FaceHandle) -> Result<FaceVertexIter<'_>> {
        Ok(FaceVertexIter {
            ring: self.face_ring(fh, Step::FaceNext)?,
        })
    }

    /// Corners of `fh` in reverse order, starting at its first vertex
    pub fn face_vertices_ccw(&self, fh: FaceHandle) -> Result<FaceVertexIter<'_>> {
        Ok(FaceVertexIter {
            ring: self.face_ring(fh, Step::FacePrev)?,
        })
    }

    /// Halfedges bounding `fh`, starting at its anchor
    pub fn face_halfedges(&self, fh: FaceHandle) -> Result<FaceHalfedgeIter<'_>> {
        Ok(FaceHalfedgeIter {
            ring: self.face_ring(fh, Step::FaceNext)?,
        })
    }

    /// Edges of `fh`
    pub fn face_edges(&self, fh: FaceHandle) -> Result<FaceEdgeIter<'_>> {
        Ok(FaceEdgeIter {
            ring: self.face_ring(fh, Step::FaceNext)?,
        })
    }

    /// Faces adjacent to `fh` across its edges
    pub fn face_faces(&self, fh: FaceHandle) -> Result<FaceFaceIter<'_>> {
        Ok(FaceFaceIter {
            ring: self.face_ring(fh, Step::FaceNext)?,
        })
    }
}
