//! # Connectivity
//!
//! Triangle mesh connectivity on top of the [`SoAKernel`]: element insertion,
//! handle iteration and halfedge navigation.
//!
//! Boundary halfedges are linked into closed boundary loops, so every
//! halfedge belongs to a closed `next` cycle and every vertex ring can be
//! walked with `next(opposite(h))` until it returns to its start. The
//! outgoing halfedge stored for a boundary vertex is always a boundary
//! halfedge.
//!
//! Deleted elements keep their slot until garbage collection. Every check,
//! iterator and circulator here treats them as absent.

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Range;

use log::{trace, warn};

use crate::config::MeshConfig;
use crate::error::{ConfigError, Handle, MeshError, Result, TopologyError};
use crate::geometry::triangle_area;
use crate::handles::{EdgeHandle, ElementHandle, FaceHandle, HalfedgeHandle, VertexHandle};
use crate::soa_kernel::SoAKernel;
use crate::status::StatusFlags;
use crate::vector::Vec3d;

// ============================================================================
// Handle iterators
// ============================================================================

/// Iterator over the live handles of one element kind, in ascending order.
///
/// Obtained from [`TriMesh::vertices`], [`TriMesh::faces`],
/// [`TriMesh::edges`] or [`TriMesh::halfedges`]. Each call to those methods
/// starts a fresh traversal; cloning an iterator snapshots its position.
/// Elements marked deleted are skipped.
#[derive(Debug, Clone)]
pub struct HandleIter<'a, H> {
    status: &'a [StatusFlags],
    range: Range<usize>,
    _marker: PhantomData<H>,
}

impl<'a, H> HandleIter<'a, H> {
    fn new(status: &'a [StatusFlags]) -> Self {
        Self {
            status,
            range: 0..status.len(),
            _marker: PhantomData,
        }
    }

    #[inline]
    fn is_live(&self, idx: usize) -> bool {
        !self.status[idx].is_deleted()
    }
}

impl<H: From<usize>> Iterator for HandleIter<'_, H> {
    type Item = H;

    #[inline]
    fn next(&mut self) -> Option<H> {
        let status = self.status;
        let idx = self.range.by_ref().find(|&i| !status[i].is_deleted())?;
        Some(H::from(idx))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.range.len()))
    }
}

impl<H: From<usize>> DoubleEndedIterator for HandleIter<'_, H> {
    #[inline]
    fn next_back(&mut self) -> Option<H> {
        while let Some(idx) = self.range.next_back() {
            if self.is_live(idx) {
                return Some(H::from(idx));
            }
        }
        None
    }
}

impl<H: From<usize>> FusedIterator for HandleIter<'_, H> {}

pub type VertexIter<'a> = HandleIter<'a, VertexHandle>;
pub type FaceIter<'a> = HandleIter<'a, FaceHandle>;
pub type EdgeIter<'a> = HandleIter<'a, EdgeHandle>;
pub type HalfedgeIter<'a> = HandleIter<'a, HalfedgeHandle>;

// ============================================================================
// TriMesh
// ============================================================================

/// Half-edge triangle mesh.
///
/// Vertex and face handles are dense and assigned in insertion order. The
/// `delete_*` operations only mark elements; handles stay stable until
/// [`garbage_collection`](Self::garbage_collection) drops them and
/// renumbers the survivors. [`clear`](Self::clear) drops everything.
#[derive(Clone, Default)]
pub struct TriMesh {
    kernel: SoAKernel,
    config: MeshConfig,
}

impl std::fmt::Debug for TriMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriMesh")
            .field("n_vertices", &self.kernel.n_vertices())
            .field("n_edges", &self.kernel.n_edges())
            .field("n_faces", &self.kernel.n_faces())
            .field("n_halfedges", &self.kernel.n_halfedges())
            .finish()
    }
}

impl TriMesh {
    /// Create a new empty mesh
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh with the given options.
    ///
    /// The options are validated first, so a hand-built [`MeshConfig`] gets
    /// the same checks as one loaded from TOML.
    pub fn with_config(config: MeshConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            kernel: SoAKernel::with_capacity(config.reserve_vertices, config.reserve_faces),
            config,
        })
    }

    /// Options this mesh was created with
    #[inline]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Remove all elements; handle numbering restarts at zero
    #[inline]
    pub fn clear(&mut self) {
        self.kernel.clear();
    }

    #[inline]
    pub(crate) fn kernel(&self) -> &SoAKernel {
        &self.kernel
    }

    #[inline]
    pub(crate) fn kernel_mut(&mut self) -> &mut SoAKernel {
        &mut self.kernel
    }

    // --- Counts ---
    //
    // Counts include elements marked deleted until garbage collection.

    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.kernel.n_vertices()
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.kernel.n_faces()
    }

    #[inline]
    pub fn n_edges(&self) -> usize {
        self.kernel.n_edges()
    }

    #[inline]
    pub fn n_halfedges(&self) -> usize {
        self.kernel.n_halfedges()
    }

    /// True if the mesh has no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kernel.is_empty()
    }

    // --- Handle checks ---

    /// In range and not marked deleted
    #[inline]
    fn is_live<H: ElementHandle>(&self, h: H) -> bool {
        self.kernel
            .attribs(H::KIND)
            .status
            .get(h.index())
            .is_some_and(|s| !s.is_deleted())
    }

    pub(crate) fn check<H: ElementHandle>(&self, h: H) -> Result<()> {
        if self.is_live(h) {
            Ok(())
        } else {
            Err(MeshError::InvalidHandle(h.tagged()))
        }
    }

    #[inline]
    pub fn is_valid_vertex(&self, vh: VertexHandle) -> bool {
        self.is_live(vh)
    }

    #[inline]
    pub fn is_valid_face(&self, fh: FaceHandle) -> bool {
        self.is_live(fh)
    }

    #[inline]
    pub fn is_valid_halfedge(&self, heh: HalfedgeHandle) -> bool {
        self.is_live(heh)
    }

    #[inline]
    pub fn is_valid_edge(&self, eh: EdgeHandle) -> bool {
        self.is_live(eh)
    }

    pub(crate) fn check_vertex(&self, vh: VertexHandle) -> Result<()> {
        self.check(vh)
    }

    pub(crate) fn check_face(&self, fh: FaceHandle) -> Result<()> {
        self.check(fh)
    }

    pub(crate) fn check_halfedge(&self, heh: HalfedgeHandle) -> Result<()> {
        self.check(heh)
    }

    pub(crate) fn check_edge(&self, eh: EdgeHandle) -> Result<()> {
        self.check(eh)
    }

    // --- Status ---

    /// Status flags of any element, including one marked deleted
    pub fn status<H: ElementHandle>(&self, h: H) -> Result<StatusFlags> {
        self.kernel
            .attribs(H::KIND)
            .status
            .get(h.index())
            .copied()
            .ok_or(MeshError::InvalidHandle(h.tagged()))
    }

    /// Replace the status flags of a live element.
    ///
    /// `DELETED` is managed by the mesh and is not changed here.
    pub fn set_status<H: ElementHandle>(&mut self, h: H, flags: StatusFlags) -> Result<()> {
        self.check(h)?;
        let slot = &mut self.kernel.attribs_mut(H::KIND).status[h.index()];
        *slot = (flags & !StatusFlags::DELETED) | (*slot & StatusFlags::DELETED);
        Ok(())
    }

    /// True if the element is marked deleted and awaits garbage collection
    pub fn is_deleted<H: ElementHandle>(&self, h: H) -> Result<bool> {
        Ok(self.status(h)?.is_deleted())
    }

    // --- Iteration ---

    /// All live vertex handles in ascending order
    #[inline]
    pub fn vertices(&self) -> VertexIter<'_> {
        HandleIter::new(&self.kernel.attribs(VertexHandle::KIND).status)
    }

    /// All live face handles in ascending order
    #[inline]
    pub fn faces(&self) -> FaceIter<'_> {
        HandleIter::new(&self.kernel.attribs(FaceHandle::KIND).status)
    }

    /// All live edge handles in ascending order
    #[inline]
    pub fn edges(&self) -> EdgeIter<'_> {
        HandleIter::new(&self.kernel.attribs(EdgeHandle::KIND).status)
    }

    /// All live halfedge handles in ascending order
    #[inline]
    pub fn halfedges(&self) -> HalfedgeIter<'_> {
        HandleIter::new(&self.kernel.attribs(HalfedgeHandle::KIND).status)
    }

    // --- Vertices ---

    /// Append a vertex; its handle equals the vertex count before the call
    pub fn add_vertex(&mut self, point: Vec3d) -> VertexHandle {
        let vh = self.kernel.add_vertex(point);
        trace!("add_vertex {} at {}", vh, point);
        vh
    }

    /// Position of a vertex
    pub fn point(&self, vh: VertexHandle) -> Result<Vec3d> {
        self.check_vertex(vh)?;
        self.kernel
            .point(vh.idx_usize())
            .ok_or(MeshError::InvalidHandle(Handle::Vertex(vh)))
    }

    /// Move a vertex
    pub fn set_point(&mut self, vh: VertexHandle, point: Vec3d) -> Result<()> {
        self.check_vertex(vh)?;
        if self.kernel.set_point(vh.idx_usize(), point) {
            Ok(())
        } else {
            Err(MeshError::InvalidHandle(Handle::Vertex(vh)))
        }
    }

    // --- Faces ---

    /// Add the triangle `(v0, v1, v2)`.
    ///
    /// The returned handle equals the face count before the call. Face
    /// circulation starts at `v0` and follows the given order. On error the
    /// mesh is left unchanged.
    pub fn add_face(&mut self, v0: VertexHandle, v1: VertexHandle, v2: VertexHandle) -> Result<FaceHandle> {
        match self.insert_triangle([v0, v1, v2]) {
            Ok(fh) => {
                trace!("add_face {} = ({}, {}, {})", fh, v0, v1, v2);
                Ok(fh)
            }
            Err(err) => {
                warn!("add_face({}, {}, {}) rejected: {}", v0, v1, v2, err);
                Err(err.into())
            }
        }
    }

    fn insert_triangle(&mut self, vhs: [VertexHandle; 3]) -> std::result::Result<FaceHandle, TopologyError> {
        const N: usize = 3;

        // Validation: nothing below mutates until every check has passed.
        for &vh in &vhs {
            if !self.kernel.has_vertex(vh) {
                return Err(TopologyError::VertexOutOfRange(vh));
            }
            if !self.is_live(vh) {
                return Err(TopologyError::DeletedVertex(vh));
            }
        }
        for i in 0..N {
            if vhs[(i + 1)..].contains(&vhs[i]) {
                return Err(TopologyError::DuplicateVertex(vhs[i]));
            }
        }
        if self.config.reject_degenerate_faces {
            let area = self.triangle_area_of(vhs);
            if !(area >= self.config.degenerate_area_epsilon) {
                return Err(TopologyError::DegenerateFace {
                    area,
                    epsilon: self.config.degenerate_area_epsilon,
                });
            }
        }

        let mut halfedges = [HalfedgeHandle::invalid(); N];
        let mut is_new = [false; N];

        for i in 0..N {
            let ii = (i + 1) % N;
            if !self.is_boundary_vertex_unchecked(vhs[i]) {
                return Err(TopologyError::ComplexVertex(vhs[i]));
            }
            match self.kernel.find_halfedge(vhs[i], vhs[ii]) {
                Some(heh) if !self.kernel.is_boundary(heh) => {
                    return Err(TopologyError::ComplexEdge(vhs[i], vhs[ii]));
                }
                Some(heh) => halfedges[i] = heh,
                None => is_new[i] = true,
            }
        }

        // (halfedge, next) pairs, applied in order once the face exists
        let mut next_cache: Vec<(HalfedgeHandle, HalfedgeHandle)> = Vec::with_capacity(6 * N);

        // Two existing halfedges that are not yet consecutive: move the patch
        // between them into another boundary gap around the shared vertex.
        for i in 0..N {
            let ii = (i + 1) % N;
            if is_new[i] || is_new[ii] {
                continue;
            }

            let inner_prev = halfedges[i];
            let inner_next = halfedges[ii];
            if self.kernel.next(inner_prev) == inner_next {
                continue;
            }

            let boundary_prev = self
                .find_free_gap(inner_next.opposite())
                .ok_or(TopologyError::PatchRelinkFailed(vhs[ii]))?;
            if boundary_prev == inner_prev {
                return Err(TopologyError::PatchRelinkFailed(vhs[ii]));
            }
            let boundary_next = self.kernel.next(boundary_prev);

            let patch_start = self.kernel.next(inner_prev);
            let patch_end = self.kernel.prev(inner_next);

            next_cache.push((boundary_prev, patch_start));
            next_cache.push((patch_end, boundary_next));
            next_cache.push((inner_prev, inner_next));
        }

        // Mutation
        for i in 0..N {
            if is_new[i] {
                halfedges[i] = self.kernel.new_edge(vhs[i], vhs[(i + 1) % N]);
            }
        }

        // Anchor on the halfedge pointing to v0
        let fh = self.kernel.new_face(halfedges[N - 1]);

        let mut needs_adjust = [false; N];

        for i in 0..N {
            let ii = (i + 1) % N;
            let vh = vhs[ii];
            let inner_prev = halfedges[i];
            let inner_next = halfedges[ii];

            match (is_new[i], is_new[ii]) {
                (false, false) => {
                    needs_adjust[ii] = self.kernel.vertex_halfedge(vh) == Some(inner_next);
                }
                (true, false) => {
                    let outer_next = inner_prev.opposite();
                    let boundary_prev = self.kernel.prev(inner_next);
                    next_cache.push((boundary_prev, outer_next));
                    self.kernel.set_vertex_halfedge(vh, outer_next);
                    next_cache.push((inner_prev, inner_next));
                }
                (false, true) => {
                    let outer_prev = inner_next.opposite();
                    let boundary_next = self.kernel.next(inner_prev);
                    next_cache.push((outer_prev, boundary_next));
                    self.kernel.set_vertex_halfedge(vh, boundary_next);
                    next_cache.push((inner_prev, inner_next));
                }
                (true, true) => {
                    let outer_prev = inner_next.opposite();
                    let outer_next = inner_prev.opposite();
                    match self.kernel.vertex_halfedge(vh) {
                        None => {
                            self.kernel.set_vertex_halfedge(vh, outer_next);
                            next_cache.push((outer_prev, outer_next));
                        }
                        Some(boundary_next) => {
                            let boundary_prev = self.kernel.prev(boundary_next);
                            next_cache.push((boundary_prev, outer_next));
                            next_cache.push((outer_prev, boundary_next));
                        }
                    }
                    next_cache.push((inner_prev, inner_next));
                }
            }

            self.kernel.set_face(inner_prev, fh);
        }

        for (heh, next) in next_cache {
            self.kernel.set_next(heh, next);
        }

        for i in 0..N {
            if needs_adjust[i] {
                self.adjust_outgoing_halfedge(vhs[i]);
            }
        }

        Ok(fh)
    }

    /// Rotate from the incoming halfedge `start` to the next incoming
    /// boundary halfedge around the same vertex.
    fn find_free_gap(&self, start: HalfedgeHandle) -> Option<HalfedgeHandle> {
        let mut heh = start;
        for _ in 0..self.kernel.n_halfedges() {
            heh = self.kernel.next(heh).opposite();
            if self.kernel.is_boundary(heh) {
                return Some(heh);
            }
        }
        None
    }

    /// Make the vertex point at a boundary outgoing halfedge if it has one
    pub(crate) fn adjust_outgoing_halfedge(&mut self, vh: VertexHandle) {
        let Some(start) = self.kernel.vertex_halfedge(vh) else {
            return;
        };
        let mut heh = start;
        for _ in 0..self.kernel.n_halfedges() {
            if self.kernel.is_boundary(heh) {
                self.kernel.set_vertex_halfedge(vh, heh);
                return;
            }
            heh = self.kernel.next(heh.opposite());
            if heh == start {
                return;
            }
        }
    }

    fn triangle_area_of(&self, vhs: [VertexHandle; 3]) -> f64 {
        let p = |vh: VertexHandle| self.kernel.point(vh.idx_usize()).unwrap_or(Vec3d::ZERO);
        triangle_area(p(vhs[0]), p(vhs[1]), p(vhs[2]))
    }

    // --- Halfedge navigation ---

    /// Next halfedge in the face (or boundary loop)
    pub fn next_halfedge(&self, heh: HalfedgeHandle) -> Result<HalfedgeHandle> {
        self.check_halfedge(heh)?;
        Ok(self.kernel.next(heh))
    }

    /// Previous halfedge in the face (or boundary loop)
    pub fn prev_halfedge(&self, heh: HalfedgeHandle) -> Result<HalfedgeHandle> {
        self.check_halfedge(heh)?;
        Ok(self.kernel.prev(heh))
    }

    pub fn opposite_halfedge(&self, heh: HalfedgeHandle) -> Result<HalfedgeHandle> {
        self.check_halfedge(heh)?;
        Ok(heh.opposite())
    }

    /// Vertex the halfedge points to
    pub fn to_vertex(&self, heh: HalfedgeHandle) -> Result<VertexHandle> {
        self.check_halfedge(heh)?;
        Ok(self.kernel.to_vertex(heh))
    }

    /// Vertex the halfedge starts from
    pub fn from_vertex(&self, heh: HalfedgeHandle) -> Result<VertexHandle> {
        self.check_halfedge(heh)?;
        Ok(self.kernel.from_vertex(heh))
    }

    /// Face bordered by the halfedge; None for boundary halfedges
    pub fn halfedge_face(&self, heh: HalfedgeHandle) -> Result<Option<FaceHandle>> {
        self.check_halfedge(heh)?;
        Ok(self.kernel.face_of(heh))
    }

    pub fn edge_of(&self, heh: HalfedgeHandle) -> Result<EdgeHandle> {
        self.check_halfedge(heh)?;
        Ok(heh.edge())
    }

    /// One of the two halfedges of an edge (`side` is 0 or 1)
    pub fn edge_halfedge(&self, eh: EdgeHandle, side: u32) -> Result<HalfedgeHandle> {
        self.check_edge(eh)?;
        Ok(eh.halfedge(side))
    }

    /// Outgoing halfedge of a vertex; None for isolated vertices.
    ///
    /// For boundary vertices this is a boundary halfedge.
    pub fn vertex_halfedge(&self, vh: VertexHandle) -> Result<Option<HalfedgeHandle>> {
        self.check_vertex(vh)?;
        Ok(self.kernel.vertex_halfedge(vh))
    }

    /// Anchor halfedge of a face; it points to the face's first vertex
    pub fn face_halfedge(&self, fh: FaceHandle) -> Result<HalfedgeHandle> {
        self.check_face(fh)?;
        self.kernel
            .face_halfedge(fh)
            .ok_or(MeshError::InvalidHandle(Handle::Face(fh)))
    }

    /// Next outgoing halfedge clockwise around its start vertex
    pub fn cw_rotated_halfedge(&self, heh: HalfedgeHandle) -> Result<HalfedgeHandle> {
        self.check_halfedge(heh)?;
        Ok(self.kernel.next(heh.opposite()))
    }

    /// Next outgoing halfedge counter-clockwise around its start vertex
    pub fn ccw_rotated_halfedge(&self, heh: HalfedgeHandle) -> Result<HalfedgeHandle> {
        self.check_halfedge(heh)?;
        Ok(self.kernel.prev(heh).opposite())
    }

    /// The halfedge `from -> to`, if the two vertices are connected
    pub fn find_halfedge(&self, from: VertexHandle, to: VertexHandle) -> Result<Option<HalfedgeHandle>> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;
        Ok(self.kernel.find_halfedge(from, to))
    }

    // --- Boundary queries ---

    /// A vertex is on the boundary if it is isolated or one of its outgoing
    /// halfedges has no face.
    pub fn is_boundary_vertex(&self, vh: VertexHandle) -> Result<bool> {
        self.check_vertex(vh)?;
        Ok(self.is_boundary_vertex_unchecked(vh))
    }

    #[inline]
    fn is_boundary_vertex_unchecked(&self, vh: VertexHandle) -> bool {
        match self.kernel.vertex_halfedge(vh) {
            Some(heh) => self.kernel.is_boundary(heh),
            None => true,
        }
    }

    pub fn is_boundary_halfedge(&self, heh: HalfedgeHandle) -> Result<bool> {
        self.check_halfedge(heh)?;
        Ok(self.kernel.is_boundary(heh))
    }

    /// An edge is on the boundary if either of its halfedges is
    pub fn is_boundary_edge(&self, eh: EdgeHandle) -> Result<bool> {
        self.check_edge(eh)?;
        Ok(self.kernel.is_boundary(eh.halfedge(0)) || self.kernel.is_boundary(eh.halfedge(1)))
    }

    /// A face is on the boundary if one of its edges is
    pub fn is_boundary_face(&self, fh: FaceHandle) -> Result<bool> {
        let start = self.face_halfedge(fh)?;
        let mut heh = start;
        loop {
            if self.kernel.is_boundary(heh.opposite()) {
                return Ok(true);
            }
            heh = self.kernel.next(heh);
            if heh == start {
                return Ok(false);
            }
        }
    }

    /// True if the vertex has no incident edges
    pub fn is_isolated(&self, vh: VertexHandle) -> Result<bool> {
        Ok(self.vertex_halfedge(vh)?.is_none())
    }

    /// Number of edges incident to the vertex
    pub fn valence(&self, vh: VertexHandle) -> Result<usize> {
        Ok(self.vertex_outgoing_halfedges(vh)?.count())
    }

    /// A vertex is manifold if its incident faces form a single fan, that is,
    /// at most one of its outgoing halfedges is a boundary halfedge.
    pub fn is_manifold(&self, vh: VertexHandle) -> Result<bool> {
        let gaps = self
            .vertex_outgoing_halfedges(vh)?
            .filter(|&heh| self.kernel.is_boundary(heh))
            .count();
        Ok(gaps <= 1)
    }

    /// True if no edge of the mesh is a boundary edge
    pub fn is_closed(&self) -> bool {
        self.halfedges().all(|heh| !self.kernel.is_boundary(heh))
    }

    // --- Validation ---

    /// Check the live part of the halfedge structure for internal consistency
    pub fn validate(&self) -> Result<()> {
        let n_halfedges = self.n_halfedges();

        if n_halfedges % 2 != 0 {
            return Err(MeshError::Corrupted(format!("odd halfedge count {}", n_halfedges)));
        }

        for heh in self.halfedges() {
            let next = self.kernel.next(heh);
            let prev = self.kernel.prev(heh);
            if !self.is_valid_halfedge(next) || !self.is_valid_halfedge(prev) {
                return Err(MeshError::Corrupted(format!("halfedge {} is not linked", heh)));
            }
            if self.kernel.prev(next) != heh || self.kernel.next(prev) != heh {
                return Err(MeshError::Corrupted(format!("halfedge {} has inconsistent next/prev", heh)));
            }
            let to = self.kernel.to_vertex(heh);
            if !self.is_valid_vertex(to) {
                return Err(MeshError::Corrupted(format!("halfedge {} points to missing vertex {}", heh, to)));
            }
            if let Some(fh) = self.kernel.face_of(heh) {
                if !self.is_valid_face(fh) {
                    return Err(MeshError::Corrupted(format!("halfedge {} borders missing face {}", heh, fh)));
                }
            }
            if to == self.kernel.from_vertex(heh) {
                return Err(MeshError::Corrupted(format!("halfedge {} is a loop at vertex {}", heh, to)));
            }
            if self.kernel.from_vertex(next) != to {
                return Err(MeshError::Corrupted(format!("halfedge {} and its next are not chained", heh)));
            }
            if self.kernel.face_of(next) != self.kernel.face_of(heh) {
                return Err(MeshError::Corrupted(format!("halfedge {} and its next border different faces", heh)));
            }
        }

        for fh in self.faces() {
            let start = self.face_halfedge(fh)?;
            let mut heh = start;
            let mut count = 0;
            loop {
                if self.kernel.face_of(heh) != Some(fh) {
                    return Err(MeshError::Corrupted(format!("face {} cycle leaves the face at {}", fh, heh)));
                }
                count += 1;
                heh = self.kernel.next(heh);
                if heh == start || count > 3 {
                    break;
                }
            }
            if count != 3 {
                return Err(MeshError::Corrupted(format!("face {} is not a triangle", fh)));
            }
        }

        for vh in self.vertices() {
            let Some(heh) = self.kernel.vertex_halfedge(vh) else {
                continue;
            };
            if !self.is_valid_halfedge(heh) {
                return Err(MeshError::Corrupted(format!("vertex {} points to missing halfedge {}", vh, heh)));
            }
            if self.kernel.from_vertex(heh) != vh {
                return Err(MeshError::Corrupted(format!("vertex {} outgoing halfedge starts elsewhere", vh)));
            }
            let mut ring = heh;
            let mut has_boundary = false;
            for _ in 0..=n_halfedges {
                has_boundary |= self.kernel.is_boundary(ring);
                ring = self.kernel.next(ring.opposite());
                if ring == heh {
                    break;
                }
            }
            if ring != heh {
                return Err(MeshError::Corrupted(format!("vertex {} ring does not close", vh)));
            }
            if has_boundary && !self.kernel.is_boundary(heh) {
                return Err(MeshError::Corrupted(format!(
                    "boundary vertex {} does not point to a boundary halfedge",
                    vh
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{single_triangle, tetrahedron};

    #[test]
    fn test_vertex_handles_dense() {
        let mut mesh = TriMesh::new();
        for k in 0..10 {
            let vh = mesh.add_vertex(Vec3d::new(k as f64, 0.0, 0.0));
            assert_eq!(vh.idx_usize(), k);
        }
        let handles: Vec<_> = mesh.vertices().map(|vh| vh.idx_usize()).collect();
        assert_eq!(handles, (0..10).collect::<Vec<_>>());

        // Restartable: a second traversal sees the same sequence
        assert_eq!(mesh.vertices().count(), 10);
        assert_eq!(mesh.vertices().size_hint(), (0, Some(10)));
    }

    #[test]
    fn test_single_triangle_counts() {
        let mesh = single_triangle();
        assert_eq!(mesh.n_vertices(), 3);
        assert_eq!(mesh.n_faces(), 1);
        assert_eq!(mesh.n_edges(), 3);
        assert_eq!(mesh.n_halfedges(), 6);
        assert!(mesh.validate().is_ok());
        assert!(!mesh.is_closed());
    }

    #[test]
    fn test_face_handles_dense() {
        let mesh = tetrahedron();
        let faces: Vec<_> = mesh.faces().map(|fh| fh.idx()).collect();
        assert_eq!(faces, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_face_anchor_points_to_first_vertex() {
        let mesh = single_triangle();
        let heh = mesh.face_halfedge(FaceHandle::new(0)).expect("face 0");
        assert_eq!(mesh.to_vertex(heh).expect("valid"), VertexHandle::new(0));
    }

    #[test]
    fn test_boundary_vertex_points_to_boundary_halfedge() {
        let mesh = single_triangle();
        for vh in mesh.vertices() {
            let heh = mesh.vertex_halfedge(vh).expect("valid").expect("not isolated");
            assert!(mesh.is_boundary_halfedge(heh).expect("valid"));
            assert_eq!(mesh.from_vertex(heh).expect("valid"), vh);
            assert!(mesh.is_boundary_vertex(vh).expect("valid"));
        }
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let mesh = tetrahedron();
        assert_eq!(mesh.n_edges(), 6);
        assert!(mesh.is_closed());
        assert!(mesh.validate().is_ok());
        for vh in mesh.vertices() {
            assert!(!mesh.is_boundary_vertex(vh).expect("valid"));
            assert_eq!(mesh.valence(vh).expect("valid"), 3);
            assert!(mesh.is_manifold(vh).expect("valid"));
        }
        for fh in mesh.faces() {
            assert!(!mesh.is_boundary_face(fh).expect("valid"));
        }
    }

    #[test]
    fn test_add_face_out_of_range() {
        let mut mesh = single_triangle();
        let err = mesh
            .add_face(VertexHandle::new(0), VertexHandle::new(1), VertexHandle::new(9))
            .unwrap_err();
        assert_eq!(
            err,
            MeshError::InvalidTopology(TopologyError::VertexOutOfRange(VertexHandle::new(9)))
        );
        assert_eq!(mesh.n_faces(), 1);
        assert_eq!(mesh.n_edges(), 3);
    }

    #[test]
    fn test_add_face_duplicate_vertex() {
        let mut mesh = TriMesh::new();
        let v0 = mesh.add_vertex(Vec3d::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Vec3d::new(1.0, 0.0, 0.0));
        let err = mesh.add_face(v0, v1, v0).unwrap_err();
        assert_eq!(err, MeshError::InvalidTopology(TopologyError::DuplicateVertex(v0)));
        assert_eq!(mesh.n_edges(), 0);
        assert!(mesh.is_isolated(v0).expect("valid"));
    }

    #[test]
    fn test_add_face_complex_edge() {
        let mut mesh = single_triangle();
        let v0 = VertexHandle::new(0);
        let v1 = VertexHandle::new(1);
        let v3 = mesh.add_vertex(Vec3d::new(1.0, -1.0, 0.0));

        // v0 -> v1 is already used by face 0 in this direction
        let err = mesh.add_face(v0, v1, v3).unwrap_err();
        assert_eq!(err, MeshError::InvalidTopology(TopologyError::ComplexEdge(v0, v1)));
        assert_eq!(mesh.n_faces(), 1);
        assert_eq!(mesh.n_edges(), 3);
        assert!(mesh.validate().is_ok());

        // The consistently oriented neighbor is fine
        let fh = mesh.add_face(v1, v0, v3).expect("neighbor face");
        assert_eq!(fh, FaceHandle::new(1));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_add_face_complex_vertex() {
        let mut mesh = tetrahedron();
        let a = VertexHandle::new(0);
        let e = mesh.add_vertex(Vec3d::new(5.0, 5.0, 5.0));
        let f = mesh.add_vertex(Vec3d::new(6.0, 5.0, 5.0));

        let err = mesh.add_face(a, e, f).unwrap_err();
        assert_eq!(err, MeshError::InvalidTopology(TopologyError::ComplexVertex(a)));
        assert_eq!(mesh.n_faces(), 4);
        assert!(mesh.is_isolated(e).expect("valid"));
    }

    #[test]
    fn test_two_fans_share_a_vertex() {
        // Two triangles touching only at v0: a non-manifold vertex
        let mut mesh = TriMesh::new();
        let v0 = mesh.add_vertex(Vec3d::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Vec3d::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(Vec3d::new(0.0, 1.0, 0.0));
        let v3 = mesh.add_vertex(Vec3d::new(-1.0, 0.0, 0.0));
        let v4 = mesh.add_vertex(Vec3d::new(0.0, -1.0, 0.0));
        mesh.add_face(v0, v1, v2).expect("first fan");
        mesh.add_face(v0, v3, v4).expect("second fan");

        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.valence(v0).expect("valid"), 4);
        assert!(!mesh.is_manifold(v0).expect("valid"));
        assert!(mesh.is_manifold(v1).expect("valid"));
    }

    #[test]
    fn test_closing_a_fan() {
        // Four triangles around a center vertex, the last one closes the ring
        let mut mesh = TriMesh::new();
        let c = mesh.add_vertex(Vec3d::new(0.0, 0.0, 0.0));
        let ring: Vec<_> = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)]
            .iter()
            .map(|&(x, y)| mesh.add_vertex(Vec3d::new(x, y, 0.0)))
            .collect();
        for i in 0..4 {
            mesh.add_face(c, ring[i], ring[(i + 1) % 4]).expect("fan face");
            assert!(mesh.validate().is_ok());
        }
        assert!(!mesh.is_boundary_vertex(c).expect("valid"));
        assert_eq!(mesh.valence(c).expect("valid"), 4);
        assert_eq!(mesh.n_edges(), 8);
    }

    #[test]
    fn test_patch_relinking() {
        // Three separate fans around the center. Joining the first two with
        // a face moves the third fan to another gap in the boundary loop.
        let mut mesh = TriMesh::new();
        let c = mesh.add_vertex(Vec3d::new(0.0, 0.0, 0.0));
        let p: Vec<_> = (0..6)
            .map(|k| {
                let a = k as f64 * std::f64::consts::PI / 3.0;
                mesh.add_vertex(Vec3d::new(a.cos(), a.sin(), 0.0))
            })
            .collect();
        mesh.add_face(c, p[0], p[1]).expect("fan A");
        mesh.add_face(c, p[2], p[3]).expect("fan B");
        mesh.add_face(c, p[4], p[5]).expect("fan C");

        // next(p2 -> c) is currently c -> p5, so the join needs a relink
        let p2_c = mesh.find_halfedge(p[2], c).expect("valid").expect("edge exists");
        let c_p1 = mesh.find_halfedge(c, p[1]).expect("valid").expect("edge exists");
        assert_ne!(mesh.next_halfedge(p2_c).expect("valid"), c_p1);

        mesh.add_face(c, p[1], p[2]).expect("join A and B");
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.next_halfedge(p2_c).expect("valid"), c_p1);
        assert_eq!(mesh.valence(c).expect("valid"), 6);
        assert!(!mesh.is_manifold(c).expect("valid"));

        mesh.add_face(c, p[3], p[4]).expect("join B and C");
        mesh.add_face(c, p[5], p[0]).expect("close the ring");
        assert!(mesh.validate().is_ok());
        assert!(mesh.is_manifold(c).expect("valid"));
        assert!(!mesh.is_boundary_vertex(c).expect("valid"));
        assert_eq!(mesh.vertex_faces(c).expect("valid").count(), 6);
    }

    #[test]
    fn test_degenerate_policy() {
        let mut lenient = TriMesh::new();
        let a = lenient.add_vertex(Vec3d::new(0.0, 0.0, 0.0));
        let b = lenient.add_vertex(Vec3d::new(1.0, 0.0, 0.0));
        let c = lenient.add_vertex(Vec3d::new(2.0, 0.0, 0.0));
        assert!(lenient.add_face(a, b, c).is_ok());

        let mut strict = TriMesh::with_config(MeshConfig {
            reject_degenerate_faces: true,
            ..MeshConfig::default()
        })
        .expect("valid config");
        let a = strict.add_vertex(Vec3d::new(0.0, 0.0, 0.0));
        let b = strict.add_vertex(Vec3d::new(1.0, 0.0, 0.0));
        let c = strict.add_vertex(Vec3d::new(2.0, 0.0, 0.0));
        let err = strict.add_face(a, b, c).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidTopology(TopologyError::DegenerateFace { .. })
        ));
        assert_eq!(strict.n_faces(), 0);
    }

    #[test]
    fn test_with_config_validates() {
        let nan_epsilon = MeshConfig {
            reject_degenerate_faces: true,
            degenerate_area_epsilon: f64::NAN,
            ..MeshConfig::default()
        };
        assert!(matches!(
            TriMesh::with_config(nan_epsilon),
            Err(ConfigError::Invalid(_))
        ));

        let huge = MeshConfig {
            reserve_vertices: usize::MAX,
            reserve_faces: usize::MAX,
            ..MeshConfig::default()
        };
        assert!(matches!(TriMesh::with_config(huge), Err(ConfigError::Invalid(_))));

        let mesh = TriMesh::with_config(MeshConfig {
            reserve_vertices: 64,
            reserve_faces: 128,
            ..MeshConfig::default()
        })
        .expect("valid config");
        assert!(mesh.is_empty());
        assert_eq!(mesh.config().reserve_faces, 128);
    }

    #[test]
    fn test_status_flags_round_trip() {
        let mut mesh = single_triangle();
        let v1 = VertexHandle::new(1);
        assert_eq!(mesh.status(v1).expect("valid"), StatusFlags::empty());

        mesh.set_status(v1, StatusFlags::SELECTED | StatusFlags::DELETED)
            .expect("valid");
        let flags = mesh.status(v1).expect("valid");
        assert!(flags.is_selected());
        assert!(!flags.is_deleted());
        assert!(!mesh.is_deleted(v1).expect("valid"));

        assert!(mesh.status(FaceHandle::new(1)).is_err());
        assert!(mesh.set_status(EdgeHandle::new(3), StatusFlags::TAGGED).is_err());
    }

    #[test]
    fn test_invalid_handles() {
        let mesh = single_triangle();
        assert!(matches!(
            mesh.point(VertexHandle::new(3)),
            Err(MeshError::InvalidHandle(Handle::Vertex(_)))
        ));
        assert!(matches!(
            mesh.face_halfedge(FaceHandle::new(1)),
            Err(MeshError::InvalidHandle(Handle::Face(_)))
        ));
        assert!(matches!(
            mesh.next_halfedge(HalfedgeHandle::new(6)),
            Err(MeshError::InvalidHandle(Handle::Halfedge(_)))
        ));
        assert!(mesh.is_boundary_edge(EdgeHandle::invalid()).is_err());
    }

    #[test]
    fn test_set_point() {
        let mut mesh = single_triangle();
        let v1 = VertexHandle::new(1);
        mesh.set_point(v1, Vec3d::new(2.0, 0.0, 0.0)).expect("valid");
        assert_eq!(mesh.point(v1).expect("valid"), Vec3d::new(2.0, 0.0, 0.0));
        assert!(mesh.set_point(VertexHandle::new(5), Vec3d::ZERO).is_err());
    }

    #[test]
    fn test_rotation_inverse() {
        let mesh = tetrahedron();
        for heh in mesh.halfedges() {
            let cw = mesh.cw_rotated_halfedge(heh).expect("valid");
            assert_eq!(mesh.ccw_rotated_halfedge(cw).expect("valid"), heh);
            assert_eq!(mesh.from_vertex(cw).expect("valid"), mesh.from_vertex(heh).expect("valid"));
        }
    }

    #[test]
    fn test_clear_restarts_numbering() {
        let mut mesh = tetrahedron();
        mesh.clear();
        assert!(mesh.is_empty());
        assert_eq!(mesh.n_faces(), 0);
        assert_eq!(mesh.add_vertex(Vec3d::ZERO), VertexHandle::new(0));
    }
}
