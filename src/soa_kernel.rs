//! # SoA Kernel
//!
//! Structure of Arrays (SoA) storage for vertex positions plus the flat
//! connectivity arrays (halfedges, faces) the mesh is built on.
//!
//! Memory Layout:
//! - x: Vec<f64> - all x coordinates (contiguous)
//! - y: Vec<f64> - all y coordinates (contiguous)
//! - z: Vec<f64> - all z coordinates (contiguous)
//! - vertex_halfedges: Vec<Option<HalfedgeHandle>> - one outgoing halfedge per vertex
//! - halfedges: Vec<Halfedge> - allocated in opposite pairs
//! - faces: Vec<Face>
//! - v/h/e/f_attribs: status words and properties, one entry per element
//!
//! The kernel does no topology checking. Handle accessors index straight into
//! the arrays and expect the caller to have validated the handle.

use std::collections::HashMap;

use log::debug;

use crate::handles::{EdgeHandle, ElementKind, FaceHandle, HalfedgeHandle, VertexHandle};
use crate::items::{Face, Halfedge};
use crate::property::{retain_marked, ElementAttribs};
use crate::vector::Vec3d;

/// SoA Kernel - flat mesh storage
#[derive(Debug, Clone, Default)]
pub struct SoAKernel {
    // Vertex position data
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,

    // Vertex auxiliary data
    vertex_halfedges: Vec<Option<HalfedgeHandle>>,

    // Connectivity data
    halfedges: Vec<Halfedge>,
    faces: Vec<Face>,

    // Edge lookup: (min_v, max_v) -> the halfedge pointing from min to max
    edge_map: HashMap<(u32, u32), HalfedgeHandle>,

    // Status and properties
    v_attribs: ElementAttribs,
    h_attribs: ElementAttribs,
    e_attribs: ElementAttribs,
    f_attribs: ElementAttribs,
}

/// Element counts dropped by [`SoAKernel::compact`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Compaction {
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
}

impl SoAKernel {
    /// Create a new empty SoA kernel
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty kernel with room for the given element counts
    pub fn with_capacity(n_vertices: usize, n_faces: usize) -> Self {
        let mut kernel = Self::default();
        kernel.reserve(n_vertices, n_faces);
        kernel
    }

    /// Reserve room for more elements.
    ///
    /// The request is only a hint. Sizes that overflow or that the allocator
    /// refuses are skipped and the arrays grow on demand instead.
    pub fn reserve(&mut self, n_vertices: usize, n_faces: usize) {
        // A closed triangle mesh has about 3 edges (6 halfedges) per 2 faces
        let n_halfedges = n_faces.saturating_mul(3).saturating_add(6);
        let n_edges = n_halfedges / 2;

        let reserved = self.x.try_reserve(n_vertices).is_ok()
            && self.y.try_reserve(n_vertices).is_ok()
            && self.z.try_reserve(n_vertices).is_ok()
            && self.vertex_halfedges.try_reserve(n_vertices).is_ok()
            && self.halfedges.try_reserve(n_halfedges).is_ok()
            && self.faces.try_reserve(n_faces).is_ok()
            && self.edge_map.try_reserve(n_edges).is_ok();
        if !reserved {
            debug!(
                "capacity for {} vertices / {} faces not reserved",
                n_vertices, n_faces
            );
            return;
        }

        self.v_attribs.reserve(n_vertices);
        self.h_attribs.reserve(n_halfedges);
        self.e_attribs.reserve(n_edges);
        self.f_attribs.reserve(n_faces);
    }

    /// Clear all data. Properties stay registered but lose their values.
    #[inline]
    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
        self.vertex_halfedges.clear();
        self.halfedges.clear();
        self.faces.clear();
        self.edge_map.clear();
        self.v_attribs.clear();
        self.h_attribs.clear();
        self.e_attribs.clear();
        self.f_attribs.clear();
    }

    // --- Vertex operations ---

    /// Add a new vertex and return its handle
    #[inline]
    pub fn add_vertex(&mut self, point: Vec3d) -> VertexHandle {
        let idx = self.x.len();
        self.x.push(point.x());
        self.y.push(point.y());
        self.z.push(point.z());
        self.vertex_halfedges.push(None);
        self.v_attribs.push();
        VertexHandle::from_usize(idx)
    }

    /// Get vertex count
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.x.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    #[inline]
    pub fn has_vertex(&self, vh: VertexHandle) -> bool {
        vh.idx_usize() < self.x.len()
    }

    // --- Position access ---

    /// Get x coordinates as slice
    #[inline]
    pub fn x_slice(&self) -> &[f64] {
        &self.x
    }

    /// Get y coordinates as slice
    #[inline]
    pub fn y_slice(&self) -> &[f64] {
        &self.y
    }

    /// Get z coordinates as slice
    #[inline]
    pub fn z_slice(&self) -> &[f64] {
        &self.z
    }

    /// Get vertex position by index
    #[inline]
    pub fn point(&self, idx: usize) -> Option<Vec3d> {
        if idx < self.x.len() {
            Some(Vec3d::new(self.x[idx], self.y[idx], self.z[idx]))
        } else {
            None
        }
    }

    /// Set vertex position; returns false if the index is out of range
    #[inline]
    pub fn set_point(&mut self, idx: usize, point: Vec3d) -> bool {
        if idx < self.x.len() {
            self.x[idx] = point.x();
            self.y[idx] = point.y();
            self.z[idx] = point.z();
            true
        } else {
            false
        }
    }

    /// Outgoing halfedge of a vertex (None if isolated)
    #[inline]
    pub fn vertex_halfedge(&self, vh: VertexHandle) -> Option<HalfedgeHandle> {
        self.vertex_halfedges.get(vh.idx_usize()).copied().flatten()
    }

    #[inline]
    pub fn set_vertex_halfedge(&mut self, vh: VertexHandle, heh: HalfedgeHandle) {
        self.vertex_halfedges[vh.idx_usize()] = Some(heh);
    }

    // --- Halfedge operations ---

    /// Create a new edge `from -> to` and return the halfedge pointing to `to`.
    ///
    /// The opposite halfedge is allocated right after it. Both start out as
    /// unlinked boundary halfedges.
    pub fn new_edge(&mut self, from: VertexHandle, to: VertexHandle) -> HalfedgeHandle {
        let heh = HalfedgeHandle::from_usize(self.halfedges.len());
        self.halfedges.push(Halfedge::new(to));
        self.halfedges.push(Halfedge::new(from));
        self.h_attribs.push();
        self.h_attribs.push();
        self.e_attribs.push();

        self.insert_edge_key(heh);
        heh
    }

    fn edge_key(a: VertexHandle, b: VertexHandle) -> (u32, u32) {
        (a.idx().min(b.idx()), a.idx().max(b.idx()))
    }

    /// Register the edge of `heh` in the lookup map
    fn insert_edge_key(&mut self, heh: HalfedgeHandle) {
        let from = self.from_vertex(heh);
        let to = self.to_vertex(heh);
        let stored = if from.idx() <= to.idx() { heh } else { heh.opposite() };
        self.edge_map.insert(Self::edge_key(from, to), stored);
    }

    /// Mark an edge and both of its halfedges deleted and drop it from the
    /// lookup map. Linkage is left to the caller.
    pub fn remove_edge(&mut self, eh: EdgeHandle) {
        let heh = HalfedgeHandle::from_usize(eh.idx_usize() * 2);
        let key = Self::edge_key(self.from_vertex(heh), self.to_vertex(heh));
        self.edge_map.remove(&key);
        self.e_attribs.set_deleted(eh.idx_usize());
        self.h_attribs.set_deleted(heh.idx_usize());
        self.h_attribs.set_deleted(heh.opposite().idx_usize());
    }

    /// Find the halfedge `from -> to`, if the edge exists
    #[inline]
    pub fn find_halfedge(&self, from: VertexHandle, to: VertexHandle) -> Option<HalfedgeHandle> {
        let heh = *self.edge_map.get(&Self::edge_key(from, to))?;
        if self.halfedges[heh.idx_usize()].vertex_handle == to {
            Some(heh)
        } else {
            Some(heh.opposite())
        }
    }

    /// Get halfedge count
    #[inline]
    pub fn n_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get edge count
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.halfedges.len() / 2
    }

    #[inline]
    pub fn to_vertex(&self, heh: HalfedgeHandle) -> VertexHandle {
        self.halfedges[heh.idx_usize()].vertex_handle
    }

    #[inline]
    pub fn from_vertex(&self, heh: HalfedgeHandle) -> VertexHandle {
        self.to_vertex(heh.opposite())
    }

    #[inline]
    pub fn next(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        self.halfedges[heh.idx_usize()].next_halfedge_handle
    }

    #[inline]
    pub fn prev(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        self.halfedges[heh.idx_usize()].prev_halfedge_handle
    }

    #[inline]
    pub fn face_of(&self, heh: HalfedgeHandle) -> Option<FaceHandle> {
        self.halfedges[heh.idx_usize()].face_handle
    }

    #[inline]
    pub fn is_boundary(&self, heh: HalfedgeHandle) -> bool {
        self.halfedges[heh.idx_usize()].is_boundary()
    }

    /// Link `heh -> next` and the matching `prev` back-pointer
    #[inline]
    pub fn set_next(&mut self, heh: HalfedgeHandle, next: HalfedgeHandle) {
        self.halfedges[heh.idx_usize()].next_halfedge_handle = next;
        self.halfedges[next.idx_usize()].prev_halfedge_handle = heh;
    }

    #[inline]
    pub fn set_face(&mut self, heh: HalfedgeHandle, fh: FaceHandle) {
        self.halfedges[heh.idx_usize()].face_handle = Some(fh);
    }

    /// Turn `heh` into a boundary halfedge
    #[inline]
    pub fn clear_face(&mut self, heh: HalfedgeHandle) {
        self.halfedges[heh.idx_usize()].face_handle = None;
    }

    /// Drop the outgoing halfedge of a vertex
    #[inline]
    pub fn set_isolated(&mut self, vh: VertexHandle) {
        self.vertex_halfedges[vh.idx_usize()] = None;
    }

    // --- Face operations ---

    /// Add a new face anchored at `heh`
    #[inline]
    pub fn new_face(&mut self, heh: HalfedgeHandle) -> FaceHandle {
        let fh = FaceHandle::from_usize(self.faces.len());
        self.faces.push(Face::new(heh));
        self.f_attribs.push();
        fh
    }

    /// Get face count
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// Anchor halfedge of a face
    #[inline]
    pub fn face_halfedge(&self, fh: FaceHandle) -> Option<HalfedgeHandle> {
        self.faces.get(fh.idx_usize()).map(|f| f.halfedge_handle)
    }

    // --- Status and properties ---

    #[inline]
    pub fn attribs(&self, kind: ElementKind) -> &ElementAttribs {
        match kind {
            ElementKind::Vertex => &self.v_attribs,
            ElementKind::Halfedge => &self.h_attribs,
            ElementKind::Edge => &self.e_attribs,
            ElementKind::Face => &self.f_attribs,
        }
    }

    #[inline]
    pub fn attribs_mut(&mut self, kind: ElementKind) -> &mut ElementAttribs {
        match kind {
            ElementKind::Vertex => &mut self.v_attribs,
            ElementKind::Halfedge => &mut self.h_attribs,
            ElementKind::Edge => &mut self.e_attribs,
            ElementKind::Face => &mut self.f_attribs,
        }
    }

    /// True if any element is marked deleted
    pub fn has_garbage(&self) -> bool {
        [&self.v_attribs, &self.e_attribs, &self.f_attribs]
            .iter()
            .any(|a| a.n_deleted() > 0)
    }
}

// ============================================================================
// Garbage collection
// ============================================================================

/// Old index -> new index, `u32::MAX` for dropped elements
fn remap_table(keep: &[bool]) -> Vec<u32> {
    let mut next = 0u32;
    keep.iter()
        .map(|&k| {
            if k {
                next += 1;
                next - 1
            } else {
                u32::MAX
            }
        })
        .collect()
}

impl SoAKernel {
    /// Drop every deleted element and renumber the survivors densely.
    ///
    /// Survivors keep their relative order. Every stored handle (outgoing
    /// halfedges, halfedge links, face anchors, the edge map) is rewritten
    /// to the new numbering and property columns are compacted alongside.
    pub fn compact(&mut self) -> Compaction {
        let keep_v: Vec<bool> = (0..self.n_vertices())
            .map(|i| !self.v_attribs.is_deleted(i))
            .collect();
        let keep_e: Vec<bool> = (0..self.n_edges())
            .map(|i| !self.e_attribs.is_deleted(i))
            .collect();
        let keep_h: Vec<bool> = (0..self.n_halfedges()).map(|i| keep_e[i >> 1]).collect();
        let keep_f: Vec<bool> = (0..self.n_faces())
            .map(|i| !self.f_attribs.is_deleted(i))
            .collect();

        let vmap = remap_table(&keep_v);
        let emap = remap_table(&keep_e);
        let fmap = remap_table(&keep_f);

        let map_v = |vh: VertexHandle| VertexHandle::new(vmap[vh.idx_usize()]);
        let map_f = |fh: FaceHandle| match fmap[fh.idx_usize()] {
            u32::MAX => None,
            idx => Some(FaceHandle::new(idx)),
        };
        let map_h = |heh: HalfedgeHandle| {
            if !heh.is_valid() {
                return heh;
            }
            match emap[heh.idx_usize() >> 1] {
                u32::MAX => HalfedgeHandle::invalid(),
                e => HalfedgeHandle::new(e * 2 + (heh.idx() & 1)),
            }
        };

        let dropped = Compaction {
            vertices: keep_v.iter().filter(|&&k| !k).count(),
            edges: keep_e.iter().filter(|&&k| !k).count(),
            faces: keep_f.iter().filter(|&&k| !k).count(),
        };

        retain_marked(&mut self.x, &keep_v);
        retain_marked(&mut self.y, &keep_v);
        retain_marked(&mut self.z, &keep_v);
        retain_marked(&mut self.vertex_halfedges, &keep_v);
        retain_marked(&mut self.halfedges, &keep_h);
        retain_marked(&mut self.faces, &keep_f);
        self.v_attribs.retain_marked(&keep_v);
        self.h_attribs.retain_marked(&keep_h);
        self.e_attribs.retain_marked(&keep_e);
        self.f_attribs.retain_marked(&keep_f);

        for out in self.vertex_halfedges.iter_mut() {
            *out = out.map(map_h).filter(|heh| heh.is_valid());
        }
        for he in self.halfedges.iter_mut() {
            he.vertex_handle = map_v(he.vertex_handle);
            he.face_handle = he.face_handle.and_then(map_f);
            he.next_halfedge_handle = map_h(he.next_halfedge_handle);
            he.prev_halfedge_handle = map_h(he.prev_halfedge_handle);
        }
        for face in self.faces.iter_mut() {
            face.halfedge_handle = map_h(face.halfedge_handle);
        }

        self.edge_map.clear();
        for e in 0..self.n_edges() {
            self.insert_edge_key(HalfedgeHandle::from_usize(e * 2));
        }

        dropped
    }
}

// ============================================================================
// Position reductions over the SoA arrays
// ============================================================================

impl SoAKernel {
    /// Positions of the vertices not marked deleted
    fn live_points(&self) -> impl Iterator<Item = Vec3d> + '_ {
        self.x_slice()
            .iter()
            .zip(self.y_slice())
            .zip(self.z_slice())
            .zip(&self.v_attribs.status)
            .filter(|(_, status)| !status.is_deleted())
            .map(|(((&x, &y), &z), _)| Vec3d::new(x, y, z))
    }

    /// Axis-aligned bounding box as (min, max); None without live vertices
    pub fn bounding_box(&self) -> Option<(Vec3d, Vec3d)> {
        let mut points = self.live_points();
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Mean of the live vertex positions; None without live vertices
    pub fn centroid(&self) -> Option<Vec3d> {
        let (sum, n) = self
            .live_points()
            .fold((Vec3d::ZERO, 0usize), |(sum, n), p| (sum + p, n + 1));
        if n == 0 {
            return None;
        }
        Some(sum / n as f64)
    }
}
