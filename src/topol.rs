//! Halfedge connectivity, Euler operators, and topology queries
//! (spec.md §3.2, §4.2–§4.8).
//!
//! `Topology` owns the four per-kind property containers and the
//! connectivity fields every element needs (spec.md §3.2): a vertex's
//! outgoing halfedge, a halfedge's target vertex + next halfedge +
//! face, and a face's halfedge. It does not know about vertex
//! positions at all — [`crate::mesh::Mesh`] layers that, and the
//! named-property machinery, on top (mirrors the split in the
//! teacher's own `topol.rs`/`mesh.rs`).
//!
//! The one deliberate departure from both the teacher and
//! `original_source/src/pmp/surface_mesh.cpp`: halfedges here do not
//! store a `prev` field. spec.md §3.2 is explicit that "previous
//! halfedge is NOT stored; it is derived by walking `next`", so
//! `prev_halfedge` below is O(valence) instead of O(1).

use crate::error::Error;
use crate::handle::{Edge, Face, Halfedge, Vertex};
use crate::iterator::{HalfedgeAroundVertexIter, HalfedgeAroundFaceIter};
use crate::property::{PropertyContainer, PropertyHandle, TPropData};

#[derive(Debug, Clone, Copy)]
struct VertexConnectivity {
    halfedge: Halfedge,
}

impl Default for VertexConnectivity {
    fn default() -> Self {
        VertexConnectivity {
            halfedge: Halfedge::INVALID,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HalfedgeConnectivity {
    vertex: Vertex,
    next: Halfedge,
    face: Face,
}

impl Default for HalfedgeConnectivity {
    fn default() -> Self {
        HalfedgeConnectivity {
            vertex: Vertex::INVALID,
            next: Halfedge::INVALID,
            face: Face::INVALID,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FaceConnectivity {
    halfedge: Halfedge,
}

impl Default for FaceConnectivity {
    fn default() -> Self {
        FaceConnectivity {
            halfedge: Halfedge::INVALID,
        }
    }
}

/// Old-index -> new-index remap tables produced by
/// [`Topology::garbage_collection`] (spec.md §4.5, §5). Indexing with
/// a handle that was deleted (and therefore not remapped to anything)
/// returns `Handle::INVALID`.
pub struct GarbageCollectionRemap {
    pub vertices: Vec<Vertex>,
    pub halfedges: Vec<Halfedge>,
    pub faces: Vec<Face>,
}

impl GarbageCollectionRemap {
    pub fn vertex(&self, v: Vertex) -> Vertex {
        self.vertices[v.index() as usize]
    }

    pub fn halfedge(&self, h: Halfedge) -> Halfedge {
        self.halfedges[h.index() as usize]
    }

    pub fn edge(&self, e: Edge) -> Edge {
        self.halfedge(e.halfedge(0)).edge()
    }

    pub fn face(&self, f: Face) -> Face {
        self.faces[f.index() as usize]
    }
}

/// Scratch buffers reused across `add_face` calls so repeated imports
/// don't reallocate (named and shaped after the teacher's `Cache`).
#[derive(Default)]
struct EulerCache {
    halfedges: Vec<Halfedge>,
    is_new: Vec<bool>,
    needs_adjust: Vec<bool>,
    next_cache: Vec<(Halfedge, Halfedge)>,
}

pub struct Topology {
    vprops: PropertyContainer,
    hprops: PropertyContainer,
    eprops: PropertyContainer,
    fprops: PropertyContainer,

    vconn: PropertyHandle<VertexConnectivity>,
    hconn: PropertyHandle<HalfedgeConnectivity>,
    fconn: PropertyHandle<FaceConnectivity>,

    vdeleted: PropertyHandle<bool>,
    edeleted: PropertyHandle<bool>,
    fdeleted: PropertyHandle<bool>,

    deleted_vertices: usize,
    deleted_edges: usize,
    deleted_faces: usize,
    has_garbage: bool,

    cache: EulerCache,
}

impl Topology {
    pub fn new() -> Self {
        let mut vprops = PropertyContainer::new();
        let mut hprops = PropertyContainer::new();
        let mut eprops = PropertyContainer::new();
        let mut fprops = PropertyContainer::new();

        let vconn = vprops.add("v:connectivity", VertexConnectivity::default()).unwrap();
        let hconn = hprops.add("h:connectivity", HalfedgeConnectivity::default()).unwrap();
        let fconn = fprops.add("f:connectivity", FaceConnectivity::default()).unwrap();

        let vdeleted = vprops.add("v:deleted", false).unwrap();
        let edeleted = eprops.add("e:deleted", false).unwrap();
        let fdeleted = fprops.add("f:deleted", false).unwrap();

        Topology {
            vprops,
            hprops,
            eprops,
            fprops,
            vconn,
            hconn,
            fconn,
            vdeleted,
            edeleted,
            fdeleted,
            deleted_vertices: 0,
            deleted_edges: 0,
            deleted_faces: 0,
            has_garbage: false,
            cache: EulerCache::default(),
        }
    }

    pub fn with_capacity(nvertices: usize, nedges: usize, nfaces: usize) -> Self {
        let mut topol = Topology::new();
        topol.reserve(nvertices, nedges, nfaces);
        topol
    }

    /// Pre-reserves capacity on all four property containers, in the
    /// same ratio as `surface_mesh.cpp::reserve` (each edge owns two
    /// halfedges).
    pub fn reserve(&mut self, nvertices: usize, nedges: usize, nfaces: usize) {
        self.vprops.reserve(nvertices);
        self.hprops.reserve(2 * nedges);
        self.eprops.reserve(nedges);
        self.fprops.reserve(nfaces);

        // Pre-size the scratch buffers used by `add_face` too, for a
        // typical small polygon.
        self.cache.halfedges.reserve(4);
        self.cache.is_new.reserve(4);
        self.cache.needs_adjust.reserve(4);
        self.cache.next_cache.reserve(4 * 3);
    }

    pub fn clear(&mut self) {
        *self = Topology::new();
    }

    // ---- element counts -------------------------------------------------

    pub fn vertices_size(&self) -> usize {
        self.vprops.len()
    }

    pub fn halfedges_size(&self) -> usize {
        self.hprops.len()
    }

    pub fn edges_size(&self) -> usize {
        self.eprops.len()
    }

    pub fn faces_size(&self) -> usize {
        self.fprops.len()
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices_size() - self.deleted_vertices
    }

    pub fn n_halfedges(&self) -> usize {
        self.halfedges_size() - 2 * self.deleted_edges
    }

    pub fn n_edges(&self) -> usize {
        self.edges_size() - self.deleted_edges
    }

    pub fn n_faces(&self) -> usize {
        self.faces_size() - self.deleted_faces
    }

    pub fn has_garbage(&self) -> bool {
        self.has_garbage
    }

    // ---- deletion flags ---------------------------------------------------

    pub fn is_deleted_vertex(&self, v: Vertex) -> bool {
        self.vprops.value(self.vdeleted, v.index())
    }

    pub fn is_deleted_edge(&self, e: Edge) -> bool {
        self.eprops.value(self.edeleted, e.index())
    }

    pub fn is_deleted_face(&self, f: Face) -> bool {
        self.fprops.value(self.fdeleted, f.index())
    }

    // ---- raw connectivity accessors ---------------------------------------

    pub fn vertex_halfedge(&self, v: Vertex) -> Halfedge {
        self.vprops.value(self.vconn, v.index()).halfedge
    }

    pub fn set_vertex_halfedge(&mut self, v: Vertex, h: Halfedge) {
        self.vprops
            .set_value(self.vconn, v.index(), VertexConnectivity { halfedge: h });
    }

    pub fn to_vertex(&self, h: Halfedge) -> Vertex {
        self.hprops.value(self.hconn, h.index()).vertex
    }

    pub fn set_vertex(&mut self, h: Halfedge, v: Vertex) {
        let mut conn = self.hprops.value(self.hconn, h.index());
        conn.vertex = v;
        self.hprops.set_value(self.hconn, h.index(), conn);
    }

    pub fn from_vertex(&self, h: Halfedge) -> Vertex {
        self.to_vertex(self.opposite_halfedge(h))
    }

    pub fn next_halfedge(&self, h: Halfedge) -> Halfedge {
        self.hprops.value(self.hconn, h.index()).next
    }

    pub fn set_next_halfedge(&mut self, h: Halfedge, next: Halfedge) {
        let mut conn = self.hprops.value(self.hconn, h.index());
        conn.next = next;
        self.hprops.set_value(self.hconn, h.index(), conn);
        // Maintaining `next` is all that's needed: `prev` is derived.
    }

    /// O(valence(face(h))): walk `next` around the face cycle back to `h`.
    pub fn prev_halfedge(&self, h: Halfedge) -> Halfedge {
        let mut p = h;
        loop {
            let n = self.next_halfedge(p);
            if n == h {
                return p;
            }
            p = n;
        }
    }

    pub fn halfedge_face(&self, h: Halfedge) -> Face {
        self.hprops.value(self.hconn, h.index()).face
    }

    pub fn set_face(&mut self, h: Halfedge, f: Face) {
        let mut conn = self.hprops.value(self.hconn, h.index());
        conn.face = f;
        self.hprops.set_value(self.hconn, h.index(), conn);
    }

    pub fn face_halfedge(&self, f: Face) -> Halfedge {
        self.fprops.value(self.fconn, f.index()).halfedge
    }

    pub fn set_face_halfedge(&mut self, f: Face, h: Halfedge) {
        self.fprops
            .set_value(self.fconn, f.index(), FaceConnectivity { halfedge: h });
    }

    // ---- derived navigation primitives (spec.md §4.2) ----------------------

    pub const fn opposite_halfedge(&self, h: Halfedge) -> Halfedge {
        h.opposite()
    }

    pub const fn edge(&self, h: Halfedge) -> Edge {
        h.edge()
    }

    pub fn edge_halfedge(&self, e: Edge, side: u32) -> Halfedge {
        e.halfedge(side)
    }

    pub fn cw_rotated_halfedge(&self, h: Halfedge) -> Halfedge {
        self.next_halfedge(self.opposite_halfedge(h))
    }

    pub fn ccw_rotated_halfedge(&self, h: Halfedge) -> Halfedge {
        self.opposite_halfedge(self.prev_halfedge(h))
    }

    pub fn find_halfedge(&self, from: Vertex, to: Vertex) -> Halfedge {
        let start = self.vertex_halfedge(from);
        if !start.is_valid() {
            return Halfedge::INVALID;
        }
        let mut h = start;
        loop {
            if self.to_vertex(h) == to {
                return h;
            }
            h = self.cw_rotated_halfedge(h);
            if h == start {
                return Halfedge::INVALID;
            }
        }
    }

    // ---- boundary / manifold predicates (spec.md §4.6) ---------------------

    pub fn is_boundary_halfedge(&self, h: Halfedge) -> bool {
        !self.halfedge_face(h).is_valid()
    }

    pub fn is_boundary_vertex(&self, v: Vertex) -> bool {
        let h = self.vertex_halfedge(v);
        !h.is_valid() || self.is_boundary_halfedge(h)
    }

    pub fn is_boundary_edge(&self, e: Edge) -> bool {
        self.is_boundary_halfedge(e.halfedge(0)) || self.is_boundary_halfedge(e.halfedge(1))
    }

    pub fn is_boundary_face(&self, f: Face) -> bool {
        HalfedgeAroundFaceIter::new(self, self.face_halfedge(f))
            .any(|h| self.is_boundary_halfedge(self.opposite_halfedge(h)))
    }

    pub fn is_isolated_vertex(&self, v: Vertex) -> bool {
        !self.vertex_halfedge(v).is_valid()
    }

    pub fn is_manifold_vertex(&self, v: Vertex) -> bool {
        // At most one boundary loop through v: count boundary
        // halfedges in the outgoing fan; more than one means the
        // vertex is shared by disconnected boundary loops.
        if self.is_isolated_vertex(v) {
            return true;
        }
        HalfedgeAroundVertexIter::new(self, v)
            .filter(|&h| self.is_boundary_halfedge(h))
            .count()
            <= 1
    }

    pub fn vertex_valence(&self, v: Vertex) -> usize {
        HalfedgeAroundVertexIter::new(self, v).count()
    }

    pub fn face_valence(&self, f: Face) -> usize {
        HalfedgeAroundFaceIter::new(self, self.face_halfedge(f)).count()
    }

    fn adjust_outgoing_halfedge(&mut self, v: Vertex) {
        let start = self.vertex_halfedge(v);
        if !start.is_valid() {
            return;
        }
        let mut h = start;
        loop {
            if self.is_boundary_halfedge(h) {
                self.set_vertex_halfedge(v, h);
                return;
            }
            h = self.cw_rotated_halfedge(h);
            if h == start {
                return;
            }
        }
    }

    // ---- element creation ---------------------------------------------------

    pub fn add_vertex(&mut self) -> Result<Vertex, Error> {
        if self.vprops.len() >= u32::MAX as usize {
            return Err(Error::Allocation);
        }
        let v = Vertex::new(self.vprops.len() as u32);
        self.vprops.push();
        Ok(v)
    }

    fn new_edge(&mut self, v0: Vertex, v1: Vertex) -> Result<Halfedge, Error> {
        if self.hprops.len() + 2 > u32::MAX as usize {
            return Err(Error::Allocation);
        }
        self.eprops.push();
        self.hprops.push();
        self.hprops.push();
        let h0 = Edge::new((self.eprops.len() - 1) as u32).halfedge(0);
        let h1 = h0.opposite();
        self.set_vertex(h0, v1);
        self.set_vertex(h1, v0);
        Ok(h0)
    }

    fn new_face(&mut self) -> Result<Face, Error> {
        if self.fprops.len() >= u32::MAX as usize {
            return Err(Error::Allocation);
        }
        let f = Face::new(self.fprops.len() as u32);
        self.fprops.push();
        Ok(f)
    }

    // ---- add_face: the core Euler operation (spec.md §4.4) -----------------

    pub fn add_face(&mut self, vertices: &[Vertex]) -> Result<Face, Error> {
        let n = vertices.len();
        debug_assert!(n > 2);

        self.cache.halfedges.clear();
        self.cache.halfedges.resize(n, Halfedge::INVALID);
        self.cache.is_new.clear();
        self.cache.is_new.resize(n, false);
        self.cache.needs_adjust.clear();
        self.cache.needs_adjust.resize(n, false);
        self.cache.next_cache.clear();
        self.cache.next_cache.reserve(3 * n);

        // 1. Topological precondition checks, and locate existing halfedges.
        for i in 0..n {
            let j = (i + 1) % n;
            if !self.is_boundary_vertex(vertices[i]) {
                return Err(Error::ComplexVertex(vertices[i]));
            }
            let h = self.find_halfedge(vertices[i], vertices[j]);
            self.cache.is_new[i] = !h.is_valid();
            if !self.cache.is_new[i] && !self.is_boundary_halfedge(h) {
                return Err(Error::ComplexEdge(h));
            }
            self.cache.halfedges[i] = h;
        }

        // 2. Re-link patches where two existing halfedges are not yet
        //    connected via `next`.
        for i in 0..n {
            let j = (i + 1) % n;
            if self.cache.is_new[i] || self.cache.is_new[j] {
                continue;
            }
            let inner_prev = self.cache.halfedges[i];
            let inner_next = self.cache.halfedges[j];
            if self.next_halfedge(inner_prev) == inner_next {
                continue;
            }

            // Search for a free gap between boundary_prev and boundary_next.
            let outer_prev = self.opposite_halfedge(inner_next);
            let mut boundary_prev = outer_prev;
            loop {
                boundary_prev = self.opposite_halfedge(self.next_halfedge(boundary_prev));
                if self.is_boundary_halfedge(boundary_prev) && boundary_prev != inner_prev {
                    break;
                }
            }
            let boundary_next = self.next_halfedge(boundary_prev);
            if boundary_next == inner_next {
                return Err(Error::PatchRelinkingFailed);
            }
            debug_assert!(self.is_boundary_halfedge(boundary_prev));
            debug_assert!(self.is_boundary_halfedge(boundary_next));

            let patch_start = self.next_halfedge(inner_prev);
            let patch_end = self.prev_halfedge(inner_next);

            self.cache.next_cache.push((boundary_prev, patch_start));
            self.cache.next_cache.push((patch_end, boundary_next));
            self.cache.next_cache.push((inner_prev, inner_next));
        }

        // 3. Allocate missing edges.
        for i in 0..n {
            if self.cache.is_new[i] {
                let j = (i + 1) % n;
                self.cache.halfedges[i] = self.new_edge(vertices[i], vertices[j])?;
            }
        }

        // 4. Allocate the face.
        let face = self.new_face()?;
        self.set_face_halfedge(face, self.cache.halfedges[n - 1]);

        // 5. Classify each corner and schedule outer-boundary rewrites.
        for i in 0..n {
            let j = (i + 1) % n;
            let v = vertices[j];
            let inner_prev = self.cache.halfedges[i];
            let inner_next = self.cache.halfedges[j];

            let id = (self.cache.is_new[i] as u8) | ((self.cache.is_new[j] as u8) << 1);
            if id != 0 {
                let outer_prev = self.opposite_halfedge(inner_next);
                let outer_next = self.opposite_halfedge(inner_prev);

                match id {
                    1 => {
                        // prev is new, next is old
                        let boundary_prev = self.prev_halfedge(inner_next);
                        self.cache.next_cache.push((boundary_prev, outer_next));
                        self.set_vertex_halfedge(v, outer_next);
                    }
                    2 => {
                        // next is new, prev is old
                        let boundary_next = self.next_halfedge(inner_prev);
                        self.cache.next_cache.push((outer_prev, boundary_next));
                        self.set_vertex_halfedge(v, boundary_next);
                    }
                    3 => {
                        // both are new
                        if !self.vertex_halfedge(v).is_valid() {
                            self.set_vertex_halfedge(v, outer_next);
                            self.cache.next_cache.push((outer_prev, outer_next));
                        } else {
                            let boundary_next = self.vertex_halfedge(v);
                            let boundary_prev = self.prev_halfedge(boundary_next);
                            self.cache.next_cache.push((boundary_prev, outer_next));
                            self.cache.next_cache.push((outer_prev, boundary_next));
                        }
                    }
                    _ => unreachable!(),
                }
                self.cache.next_cache.push((inner_prev, inner_next));
            } else {
                self.cache.needs_adjust[j] = self.vertex_halfedge(v) == inner_next;
            }

            self.set_face(self.cache.halfedges[i], face);
        }

        // 6. Apply every scheduled rewrite as one batch.
        for idx in 0..self.cache.next_cache.len() {
            let (from, to) = self.cache.next_cache[idx];
            self.set_next_halfedge(from, to);
        }

        // 8. Fix up vertices whose outgoing halfedge became interior.
        for i in 0..self.cache.needs_adjust.len() {
            if self.cache.needs_adjust[i] {
                self.adjust_outgoing_halfedge(vertices[i]);
            }
        }

        Ok(face)
    }

    pub fn add_triangle(&mut self, v0: Vertex, v1: Vertex, v2: Vertex) -> Result<Face, Error> {
        self.add_face(&[v0, v1, v2])
    }

    pub fn add_quad(&mut self, v0: Vertex, v1: Vertex, v2: Vertex, v3: Vertex) -> Result<Face, Error> {
        self.add_face(&[v0, v1, v2, v3])
    }

    // ---- split(face, v): triangle fan (spec.md §4.5) ------------------------

    pub fn split_face(&mut self, f: Face, v: Vertex) -> Result<(), Error> {
        let hend = self.face_halfedge(f);
        let mut h = self.next_halfedge(hend);

        let mut hold = self.new_edge(self.to_vertex(hend), v)?;
        self.set_next_halfedge(hend, hold);
        self.set_face(hold, f);
        hold = self.opposite_halfedge(hold);

        while h != hend {
            let hnext = self.next_halfedge(h);

            let fnew = self.new_face()?;
            self.set_face_halfedge(fnew, h);

            let hnew = self.new_edge(self.to_vertex(h), v)?;

            self.set_next_halfedge(hnew, hold);
            self.set_next_halfedge(hold, h);
            self.set_next_halfedge(h, hnew);

            self.set_face(hnew, fnew);
            self.set_face(hold, fnew);
            self.set_face(h, fnew);

            hold = self.opposite_halfedge(hnew);
            h = hnext;
        }

        self.set_next_halfedge(hold, hend);
        self.set_next_halfedge(self.next_halfedge(hend), hold);
        self.set_face(hold, f);
        self.set_vertex_halfedge(v, hold);

        Ok(())
    }

    // ---- split(edge, v) (spec.md §4.5) --------------------------------------

    pub fn split_edge(&mut self, e: Edge, v: Vertex) -> Result<Halfedge, Error> {
        let h0 = e.halfedge(0);
        let o0 = e.halfedge(1);
        let v2 = self.to_vertex(o0);

        let e1 = self.new_edge(v, v2)?;
        let t1 = self.opposite_halfedge(e1);

        let f0 = self.halfedge_face(h0);
        let f3 = self.halfedge_face(o0);

        self.set_vertex_halfedge(v, h0);
        self.set_vertex(o0, v);

        if !self.is_boundary_halfedge(h0) {
            let h1 = self.next_halfedge(h0);
            let h2 = self.next_halfedge(h1);
            let v1 = self.to_vertex(h1);

            let e0 = self.new_edge(v, v1)?;
            let t0 = self.opposite_halfedge(e0);

            let f1 = self.new_face()?;
            self.set_face_halfedge(f0, h0);
            self.set_face_halfedge(f1, h2);

            self.set_face(h1, f0);
            self.set_face(t0, f0);
            self.set_face(h0, f0);

            self.set_face(h2, f1);
            self.set_face(t1, f1);
            self.set_face(e0, f1);

            self.set_next_halfedge(h0, h1);
            self.set_next_halfedge(h1, t0);
            self.set_next_halfedge(t0, h0);

            self.set_next_halfedge(e0, h2);
            self.set_next_halfedge(h2, t1);
            self.set_next_halfedge(t1, e0);
        } else {
            let p = self.prev_halfedge(h0);
            self.set_next_halfedge(p, t1);
            self.set_next_halfedge(t1, h0);
        }

        if !self.is_boundary_halfedge(o0) {
            let o1 = self.next_halfedge(o0);
            let o2 = self.next_halfedge(o1);
            let v3 = self.to_vertex(o1);

            let e2 = self.new_edge(v, v3)?;
            let t2 = self.opposite_halfedge(e2);

            let f2 = self.new_face()?;
            self.set_face_halfedge(f2, o1);
            self.set_face_halfedge(f3, o0);

            self.set_face(o1, f2);
            self.set_face(t2, f2);
            self.set_face(e1, f2);

            self.set_face(o2, f3);
            self.set_face(o0, f3);
            self.set_face(e2, f3);

            self.set_next_halfedge(e1, o1);
            self.set_next_halfedge(o1, t2);
            self.set_next_halfedge(t2, e1);

            self.set_next_halfedge(o0, e2);
            self.set_next_halfedge(e2, o2);
            self.set_next_halfedge(o2, o0);
        } else {
            let next_o0 = self.next_halfedge(o0);
            self.set_next_halfedge(e1, next_o0);
            self.set_next_halfedge(o0, e1);
            self.set_vertex_halfedge(v, e1);
        }

        if self.vertex_halfedge(v2) == h0 {
            self.set_vertex_halfedge(v2, t1);
        }

        Ok(t1)
    }

    // ---- insert_vertex (spec.md §4.5) ---------------------------------------

    pub fn insert_vertex(&mut self, h0: Halfedge, v: Vertex) -> Result<Halfedge, Error> {
        let h2 = self.next_halfedge(h0);
        let o0 = self.opposite_halfedge(h0);
        let o2 = self.prev_halfedge(o0);
        let v2 = self.to_vertex(h0);
        let fh = self.halfedge_face(h0);
        let fo = self.halfedge_face(o0);

        let h1 = self.new_edge(v, v2)?;
        let o1 = self.opposite_halfedge(h1);

        self.set_next_halfedge(h1, h2);
        self.set_next_halfedge(h0, h1);
        self.set_vertex(h0, v);
        self.set_vertex(h1, v2);
        self.set_face(h1, fh);

        self.set_next_halfedge(o1, o0);
        self.set_next_halfedge(o2, o1);
        self.set_vertex(o1, v);
        self.set_face(o1, fo);

        self.set_vertex_halfedge(v2, o1);
        self.adjust_outgoing_halfedge(v2);
        self.set_vertex_halfedge(v, h1);
        self.adjust_outgoing_halfedge(v);

        if fh.is_valid() {
            self.set_face_halfedge(fh, h0);
        }
        if fo.is_valid() {
            self.set_face_halfedge(fo, o1);
        }

        Ok(o1)
    }

    // ---- insert_edge (spec.md §4.5) -----------------------------------------

    pub fn insert_edge(&mut self, h0: Halfedge, h1: Halfedge) -> Result<Halfedge, Error> {
        let f = self.halfedge_face(h0);
        if f != self.halfedge_face(h1) || !f.is_valid() {
            return Err(Error::Topology(
                "insert_edge requires two halfedges of the same face",
            ));
        }

        let v0 = self.to_vertex(h0);
        let v1 = self.to_vertex(h1);

        let h2 = self.next_halfedge(h0);
        let h3 = self.next_halfedge(h1);

        let h4 = self.new_edge(v0, v1)?;
        let h5 = self.opposite_halfedge(h4);

        let f0 = f;
        let f1 = self.new_face()?;

        self.set_face_halfedge(f0, h0);
        self.set_face_halfedge(f1, h1);

        self.set_next_halfedge(h0, h4);
        self.set_next_halfedge(h4, h3);
        self.set_face(h4, f0);

        self.set_next_halfedge(h1, h5);
        self.set_next_halfedge(h5, h2);
        let mut h = h2;
        loop {
            self.set_face(h, f1);
            h = self.next_halfedge(h);
            if h == h2 {
                break;
            }
        }

        Ok(h4)
    }

    // ---- flip (spec.md §4.5) -------------------------------------------------

    pub fn is_flip_ok(&self, e: Edge) -> bool {
        if self.is_boundary_edge(e) {
            return false;
        }
        let h0 = e.halfedge(0);
        let h1 = e.halfedge(1);
        let v0 = self.to_vertex(self.next_halfedge(h0));
        let v1 = self.to_vertex(self.next_halfedge(h1));
        if v0 == v1 {
            return false;
        }
        !self.find_halfedge(v0, v1).is_valid()
    }

    pub fn flip(&mut self, e: Edge) -> Result<(), Error> {
        if !self.is_flip_ok(e) {
            return Err(Error::Topology("flip precondition (is_flip_ok) failed"));
        }

        let a0 = e.halfedge(0);
        let b0 = e.halfedge(1);

        let a1 = self.next_halfedge(a0);
        let a2 = self.next_halfedge(a1);
        let b1 = self.next_halfedge(b0);
        let b2 = self.next_halfedge(b1);

        let va0 = self.to_vertex(a0);
        let va1 = self.to_vertex(a1);
        let vb0 = self.to_vertex(b0);
        let vb1 = self.to_vertex(b1);

        let fa = self.halfedge_face(a0);
        let fb = self.halfedge_face(b0);

        self.set_vertex(a0, va1);
        self.set_vertex(b0, vb1);

        self.set_next_halfedge(a0, a2);
        self.set_next_halfedge(a2, b1);
        self.set_next_halfedge(b1, a0);

        self.set_next_halfedge(b0, b2);
        self.set_next_halfedge(b2, a1);
        self.set_next_halfedge(a1, b0);

        self.set_face(a1, fb);
        self.set_face(b1, fa);

        self.set_face_halfedge(fa, a0);
        self.set_face_halfedge(fb, b0);

        if self.vertex_halfedge(va0) == b0 {
            self.set_vertex_halfedge(va0, a1);
        }
        if self.vertex_halfedge(vb0) == a0 {
            self.set_vertex_halfedge(vb0, b1);
        }

        Ok(())
    }

    // ---- collapse (spec.md §4.5) ---------------------------------------------

    pub fn is_collapse_ok(&self, v0v1: Halfedge) -> bool {
        let v1v0 = self.opposite_halfedge(v0v1);
        let v0 = self.to_vertex(v1v0);
        let v1 = self.to_vertex(v0v1);
        let mut vl = Vertex::INVALID;
        let mut vr = Vertex::INVALID;

        if !self.is_boundary_halfedge(v0v1) {
            let h1 = self.next_halfedge(v0v1);
            let h2 = self.next_halfedge(h1);
            if self.is_boundary_halfedge(self.opposite_halfedge(h1))
                && self.is_boundary_halfedge(self.opposite_halfedge(h2))
            {
                return false;
            }
            vl = self.to_vertex(h1);
        }

        if !self.is_boundary_halfedge(v1v0) {
            let h1 = self.next_halfedge(v1v0);
            let h2 = self.next_halfedge(h1);
            if self.is_boundary_halfedge(self.opposite_halfedge(h1))
                && self.is_boundary_halfedge(self.opposite_halfedge(h2))
            {
                return false;
            }
            vr = self.to_vertex(h1);
        }

        if vl == vr {
            return false;
        }

        if self.is_boundary_vertex(v0)
            && self.is_boundary_vertex(v1)
            && !self.is_boundary_halfedge(v0v1)
            && !self.is_boundary_halfedge(v1v0)
        {
            return false;
        }

        for vv in HalfedgeAroundVertexIter::new(self, v0).map(|h| self.to_vertex(h)) {
            if vv != v1 && vv != vl && vv != vr && self.find_halfedge(vv, v1).is_valid() {
                return false;
            }
        }

        true
    }

    pub fn collapse(&mut self, h: Halfedge) -> Result<(), Error> {
        if !self.is_collapse_ok(h) {
            return Err(Error::Topology(
                "collapse precondition (is_collapse_ok) failed",
            ));
        }

        let h0 = h;
        let h1 = self.prev_halfedge(h0);
        let o0 = self.opposite_halfedge(h0);
        let o1 = self.next_halfedge(o0);

        self.remove_edge_helper(h0);

        if self.next_halfedge(self.next_halfedge(h1)) == h1 {
            self.remove_loop_helper(h1);
        }
        if self.next_halfedge(self.next_halfedge(o1)) == o1 {
            self.remove_loop_helper(o1);
        }

        Ok(())
    }

    fn remove_edge_helper(&mut self, h: Halfedge) {
        let hn = self.next_halfedge(h);
        let hp = self.prev_halfedge(h);

        let o = self.opposite_halfedge(h);
        let on = self.next_halfedge(o);
        let op = self.prev_halfedge(o);

        let fh = self.halfedge_face(h);
        let fo = self.halfedge_face(o);

        let vh = self.to_vertex(h);
        let vo = self.to_vertex(o);

        let incoming: Vec<Halfedge> = HalfedgeAroundVertexIter::new(self, vo)
            .map(|hc| self.opposite_halfedge(hc))
            .collect();
        for hc in incoming {
            self.set_vertex(hc, vh);
        }

        self.set_next_halfedge(hp, hn);
        self.set_next_halfedge(op, on);

        if fh.is_valid() {
            self.set_face_halfedge(fh, hn);
        }
        if fo.is_valid() {
            self.set_face_halfedge(fo, on);
        }

        if self.vertex_halfedge(vh) == o {
            self.set_vertex_halfedge(vh, hn);
        }
        self.adjust_outgoing_halfedge(vh);
        self.set_vertex_halfedge(vo, Halfedge::INVALID);

        self.mark_vertex_deleted(vo);
        self.mark_edge_deleted(self.edge(h));
    }

    fn remove_loop_helper(&mut self, h: Halfedge) {
        let h0 = h;
        let h1 = self.next_halfedge(h0);

        let o0 = self.opposite_halfedge(h0);
        let o1 = self.opposite_halfedge(h1);

        let v0 = self.to_vertex(h0);
        let v1 = self.to_vertex(h1);

        let fh = self.halfedge_face(h0);
        let fo = self.halfedge_face(o0);

        debug_assert!(self.next_halfedge(h1) == h0 && h1 != o0);

        self.set_next_halfedge(h1, self.next_halfedge(o0));
        self.set_next_halfedge(self.prev_halfedge(o0), h1);

        self.set_face(h1, fo);

        self.set_vertex_halfedge(v0, h1);
        self.adjust_outgoing_halfedge(v0);
        self.set_vertex_halfedge(v1, o1);
        self.adjust_outgoing_halfedge(v1);

        if fo.is_valid() && self.face_halfedge(fo) == o0 {
            self.set_face_halfedge(fo, h1);
        }

        if fh.is_valid() {
            self.mark_face_deleted(fh);
        }
        self.mark_edge_deleted(self.edge(h));
    }

    // ---- remove_edge (spec.md §4.5) -------------------------------------------

    pub fn is_removal_ok(&self, e: Edge) -> bool {
        let h0 = e.halfedge(0);
        let h1 = e.halfedge(1);
        let v0 = self.to_vertex(h0);
        let v1 = self.to_vertex(h1);
        let f0 = self.halfedge_face(h0);
        let f1 = self.halfedge_face(h1);

        if !f0.is_valid() || !f1.is_valid() || f0 == f1 {
            return false;
        }

        for v in crate::iterator::VertexAroundFaceIter::new(self, self.face_halfedge(f0)) {
            if v != v0 && v != v1 {
                for f in crate::iterator::FaceAroundVertexIter::new(self, v) {
                    if f == f1 {
                        return false;
                    }
                }
            }
        }

        true
    }

    pub fn remove_edge(&mut self, e: Edge) -> Result<(), Error> {
        if !self.is_removal_ok(e) {
            return Err(Error::Topology(
                "remove_edge precondition (is_removal_ok) failed",
            ));
        }

        let h0 = e.halfedge(0);
        let h1 = e.halfedge(1);

        let v0 = self.to_vertex(h0);
        let v1 = self.to_vertex(h1);

        let f0 = self.halfedge_face(h0);
        let f1 = self.halfedge_face(h1);

        let h0_prev = self.prev_halfedge(h0);
        let h0_next = self.next_halfedge(h0);
        let h1_prev = self.prev_halfedge(h1);
        let h1_next = self.next_halfedge(h1);

        if self.vertex_halfedge(v0) == h1 {
            self.set_vertex_halfedge(v0, h0_next);
        }
        if self.vertex_halfedge(v1) == h0 {
            self.set_vertex_halfedge(v1, h1_next);
        }

        let f0_halfedges: Vec<Halfedge> = HalfedgeAroundFaceIter::new(self, h0).collect();
        for hc in f0_halfedges {
            self.set_face(hc, f1);
        }

        self.set_next_halfedge(h1_prev, h0_next);
        self.set_next_halfedge(h0_prev, h1_next);

        if self.face_halfedge(f1) == h1 {
            self.set_face_halfedge(f1, h1_next);
        }

        self.mark_face_deleted(f0);
        self.mark_edge_deleted(e);

        Ok(())
    }

    // ---- delete_* (spec.md §4.5) -----------------------------------------------

    pub fn delete_vertex(&mut self, v: Vertex) {
        if self.is_deleted_vertex(v) {
            return;
        }
        let incident_faces: Vec<Face> = crate::iterator::FaceAroundVertexIter::new(self, v).collect();
        for f in incident_faces {
            self.delete_face(f);
        }
        if !self.is_deleted_vertex(v) {
            self.mark_vertex_deleted(v);
        }
    }

    pub fn delete_edge(&mut self, e: Edge) {
        if self.is_deleted_edge(e) {
            return;
        }
        let f0 = self.halfedge_face(e.halfedge(0));
        let f1 = self.halfedge_face(e.halfedge(1));
        if f0.is_valid() {
            self.delete_face(f0);
        }
        if f1.is_valid() {
            self.delete_face(f1);
        }
    }

    pub fn delete_face(&mut self, f: Face) {
        if self.is_deleted_face(f) {
            return;
        }
        self.mark_face_deleted(f);

        let face_halfedges: Vec<Halfedge> = HalfedgeAroundFaceIter::new(self, self.face_halfedge(f)).collect();

        let mut deleted_edges = Vec::with_capacity(3);
        let mut touched_vertices = Vec::with_capacity(3);

        for &hc in &face_halfedges {
            self.set_face(hc, Face::INVALID);
            if self.is_boundary_halfedge(self.opposite_halfedge(hc)) {
                deleted_edges.push(self.edge(hc));
            }
            touched_vertices.push(self.to_vertex(hc));
        }

        for e in deleted_edges {
            let h0 = e.halfedge(0);
            let v0 = self.to_vertex(h0);
            let next0 = self.next_halfedge(h0);
            let prev0 = self.prev_halfedge(h0);

            let h1 = e.halfedge(1);
            let v1 = self.to_vertex(h1);
            let next1 = self.next_halfedge(h1);
            let prev1 = self.prev_halfedge(h1);

            self.set_next_halfedge(prev0, next1);
            self.set_next_halfedge(prev1, next0);

            self.mark_edge_deleted(e);

            if self.vertex_halfedge(v0) == h1 {
                if next0 == h1 {
                    self.mark_vertex_deleted(v0);
                } else {
                    self.set_vertex_halfedge(v0, next0);
                }
            }

            if self.vertex_halfedge(v1) == h0 {
                if next1 == h0 {
                    self.mark_vertex_deleted(v1);
                } else {
                    self.set_vertex_halfedge(v1, next1);
                }
            }
        }

        for v in touched_vertices {
            if !self.is_deleted_vertex(v) {
                self.adjust_outgoing_halfedge(v);
            }
        }
    }

    fn mark_vertex_deleted(&mut self, v: Vertex) {
        if !self.vprops.value(self.vdeleted, v.index()) {
            self.vprops.set_value(self.vdeleted, v.index(), true);
            self.deleted_vertices += 1;
            self.has_garbage = true;
        }
    }

    fn mark_edge_deleted(&mut self, e: Edge) {
        if !self.eprops.value(self.edeleted, e.index()) {
            self.eprops.set_value(self.edeleted, e.index(), true);
            self.deleted_edges += 1;
            self.has_garbage = true;
        }
    }

    fn mark_face_deleted(&mut self, f: Face) {
        if !self.fprops.value(self.fdeleted, f.index()) {
            self.fprops.set_value(self.fdeleted, f.index(), true);
            self.deleted_faces += 1;
            self.has_garbage = true;
        }
    }

    // ---- garbage_collection (spec.md §4.5, §5) ---------------------------------

    pub fn garbage_collection(&mut self) -> GarbageCollectionRemap {
        let nv0 = self.vertices_size();
        let nh0 = self.halfedges_size();
        let nf0 = self.faces_size();

        if !self.has_garbage {
            return GarbageCollectionRemap {
                vertices: (0..nv0 as u32).map(Vertex::new).collect(),
                halfedges: (0..nh0 as u32).map(Halfedge::new).collect(),
                faces: (0..nf0 as u32).map(Face::new).collect(),
            };
        }

        let mut vmap: Vec<Vertex> = (0..nv0 as u32).map(Vertex::new).collect();
        let mut hmap: Vec<Halfedge> = (0..nh0 as u32).map(Halfedge::new).collect();
        let mut fmap: Vec<Face> = (0..nf0 as u32).map(Face::new).collect();

        let mut nv = nv0;
        if nv > 0 {
            let mut i0 = 0usize;
            let mut i1 = nv - 1;
            loop {
                while !self.is_deleted_vertex(Vertex::new(i0 as u32)) && i0 < i1 {
                    i0 += 1;
                }
                while self.is_deleted_vertex(Vertex::new(i1 as u32)) && i0 < i1 {
                    i1 -= 1;
                }
                if i0 >= i1 {
                    break;
                }
                self.vprops.swap(i0, i1);
                vmap.swap(i0, i1);
            }
            nv = if self.is_deleted_vertex(Vertex::new(i0 as u32)) { i0 } else { i0 + 1 };
        }

        let mut ne = self.edges_size();
        let mut nh = nh0;
        if ne > 0 {
            let mut i0 = 0usize;
            let mut i1 = ne - 1;
            loop {
                while !self.is_deleted_edge(Edge::new(i0 as u32)) && i0 < i1 {
                    i0 += 1;
                }
                while self.is_deleted_edge(Edge::new(i1 as u32)) && i0 < i1 {
                    i1 -= 1;
                }
                if i0 >= i1 {
                    break;
                }
                self.eprops.swap(i0, i1);
                self.hprops.swap(2 * i0, 2 * i1);
                self.hprops.swap(2 * i0 + 1, 2 * i1 + 1);
                hmap.swap(2 * i0, 2 * i1);
                hmap.swap(2 * i0 + 1, 2 * i1 + 1);
            }
            ne = if self.is_deleted_edge(Edge::new(i0 as u32)) { i0 } else { i0 + 1 };
            nh = 2 * ne;
        }

        let mut nf = self.faces_size();
        if nf > 0 {
            let mut i0 = 0usize;
            let mut i1 = nf - 1;
            loop {
                while !self.is_deleted_face(Face::new(i0 as u32)) && i0 < i1 {
                    i0 += 1;
                }
                while self.is_deleted_face(Face::new(i1 as u32)) && i0 < i1 {
                    i1 -= 1;
                }
                if i0 >= i1 {
                    break;
                }
                self.fprops.swap(i0, i1);
                fmap.swap(i0, i1);
            }
            nf = if self.is_deleted_face(Face::new(i0 as u32)) { i0 } else { i0 + 1 };
        }

        // Build old-index -> new-index (or INVALID) remaps.
        let mut v_remap = vec![Vertex::INVALID; nv0];
        for (new_idx, &old) in vmap.iter().enumerate().take(nv) {
            v_remap[old.index() as usize] = Vertex::new(new_idx as u32);
        }
        let mut h_remap = vec![Halfedge::INVALID; nh0];
        for (new_idx, &old) in hmap.iter().enumerate().take(nh) {
            h_remap[old.index() as usize] = Halfedge::new(new_idx as u32);
        }
        let mut f_remap = vec![Face::INVALID; nf0];
        for (new_idx, &old) in fmap.iter().enumerate().take(nf) {
            f_remap[old.index() as usize] = Face::new(new_idx as u32);
        }

        for i in 0..nv {
            let v = Vertex::new(i as u32);
            if !self.is_isolated_vertex(v) {
                let h = self.vertex_halfedge(v);
                self.set_vertex_halfedge(v, h_remap[h.index() as usize]);
            }
        }

        for i in 0..nh {
            let h = Halfedge::new(i as u32);
            let to = self.to_vertex(h);
            self.set_vertex(h, v_remap[to.index() as usize]);
            let next = self.next_halfedge(h);
            self.set_next_halfedge(h, h_remap[next.index() as usize]);
            if !self.is_boundary_halfedge(h) {
                let f = self.halfedge_face(h);
                self.set_face(h, f_remap[f.index() as usize]);
            }
        }

        for i in 0..nf {
            let f = Face::new(i as u32);
            let h = self.face_halfedge(f);
            self.set_face_halfedge(f, h_remap[h.index() as usize]);
        }

        self.vprops.resize(nv);
        self.hprops.resize(nh);
        self.eprops.resize(ne);
        self.fprops.resize(nf);

        self.deleted_vertices = 0;
        self.deleted_edges = 0;
        self.deleted_faces = 0;
        self.has_garbage = false;

        GarbageCollectionRemap {
            vertices: v_remap,
            halfedges: h_remap,
            faces: f_remap,
        }
    }

    // ---- generic named-property API (spec.md §4.1, §6) --------------------------

    pub fn vertex_property<T: TPropData>(&mut self, name: &str, default: T) -> Result<PropertyHandle<T>, Error> {
        self.vprops.add(name, default)
    }

    pub fn get_vertex_property<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        self.vprops.get(name)
    }

    pub fn remove_vertex_property<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        self.vprops.remove(handle)
    }

    pub fn vertex_property_value<T: TPropData>(&self, handle: PropertyHandle<T>, v: Vertex) -> T {
        self.vprops.value(handle, v.index())
    }

    pub fn set_vertex_property_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, v: Vertex, value: T) {
        self.vprops.set_value(handle, v.index(), value);
    }

    pub fn halfedge_property<T: TPropData>(&mut self, name: &str, default: T) -> Result<PropertyHandle<T>, Error> {
        self.hprops.add(name, default)
    }

    pub fn get_halfedge_property<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        self.hprops.get(name)
    }

    pub fn remove_halfedge_property<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        self.hprops.remove(handle)
    }

    pub fn halfedge_property_value<T: TPropData>(&self, handle: PropertyHandle<T>, h: Halfedge) -> T {
        self.hprops.value(handle, h.index())
    }

    pub fn set_halfedge_property_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, h: Halfedge, value: T) {
        self.hprops.set_value(handle, h.index(), value);
    }

    pub fn edge_property<T: TPropData>(&mut self, name: &str, default: T) -> Result<PropertyHandle<T>, Error> {
        self.eprops.add(name, default)
    }

    pub fn get_edge_property<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        self.eprops.get(name)
    }

    pub fn remove_edge_property<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        self.eprops.remove(handle)
    }

    pub fn edge_property_value<T: TPropData>(&self, handle: PropertyHandle<T>, e: Edge) -> T {
        self.eprops.value(handle, e.index())
    }

    pub fn set_edge_property_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, e: Edge, value: T) {
        self.eprops.set_value(handle, e.index(), value);
    }

    pub fn face_property<T: TPropData>(&mut self, name: &str, default: T) -> Result<PropertyHandle<T>, Error> {
        self.fprops.add(name, default)
    }

    pub fn get_face_property<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        self.fprops.get(name)
    }

    pub fn remove_face_property<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        self.fprops.remove(handle)
    }

    pub fn face_property_value<T: TPropData>(&self, handle: PropertyHandle<T>, f: Face) -> T {
        self.fprops.value(handle, f.index())
    }

    pub fn set_face_property_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, f: Face, value: T) {
        self.fprops.set_value(handle, f.index(), value);
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn triangle() -> (Topology, Vertex, Vertex, Vertex, Face) {
        let mut t = Topology::new();
        let v0 = t.add_vertex().unwrap();
        let v1 = t.add_vertex().unwrap();
        let v2 = t.add_vertex().unwrap();
        let f = t.add_face(&[v0, v1, v2]).unwrap();
        (t, v0, v1, v2, f)
    }

    #[test]
    fn reserve_does_not_allocate_elements() {
        let mut t = Topology::with_capacity(100, 200, 64);
        assert_eq!(t.n_vertices(), 0);
        assert_eq!(t.vertices_size(), 0);
        assert_eq!(t.edges_size(), 0);
        assert_eq!(t.faces_size(), 0);
        // Capacity is pre-sized but adding elements still works normally.
        let v0 = t.add_vertex().unwrap();
        let v1 = t.add_vertex().unwrap();
        let v2 = t.add_vertex().unwrap();
        t.add_face(&[v0, v1, v2]).unwrap();
        assert_eq!(t.n_vertices(), 3);
    }

    #[test]
    fn single_triangle_counts() {
        let (t, v0, _v1, _v2, _f) = triangle();
        assert_eq!(t.n_vertices(), 3);
        assert_eq!(t.n_edges(), 3);
        assert_eq!(t.n_faces(), 1);
        assert_eq!(t.n_halfedges(), 6);
        assert_eq!(t.vertex_valence(v0), 2);
        assert!(t.is_boundary_vertex(v0));
    }

    #[test]
    fn opposite_is_involution() {
        let (t, ..) = triangle();
        for i in 0..t.halfedges_size() as u32 {
            let h = Halfedge::new(i);
            assert_eq!(t.opposite_halfedge(t.opposite_halfedge(h)), h);
            assert_eq!(t.edge(h), t.edge(t.opposite_halfedge(h)));
        }
    }

    #[test]
    fn face_cycle_closes_in_valence_steps() {
        let mut t = Topology::new();
        let vs: Vec<Vertex> = (0..5).map(|_| t.add_vertex().unwrap()).collect();
        let f = t.add_face(&vs).unwrap();
        let start = t.face_halfedge(f);
        let mut h = start;
        let mut steps = 0;
        loop {
            assert_eq!(t.halfedge_face(h), f);
            h = t.next_halfedge(h);
            steps += 1;
            if h == start {
                break;
            }
        }
        assert_eq!(steps, t.face_valence(f));
        assert_eq!(steps, 5);
    }

    #[test]
    fn quad_split_into_triangles_then_flip() {
        let mut t = Topology::new();
        let v0 = t.add_vertex().unwrap();
        let v1 = t.add_vertex().unwrap();
        let v2 = t.add_vertex().unwrap();
        let v3 = t.add_vertex().unwrap();
        t.add_face(&[v0, v1, v2]).unwrap();
        t.add_face(&[v0, v2, v3]).unwrap();
        assert_eq!(t.n_faces(), 2);

        let h = t.find_halfedge(v0, v2);
        assert!(h.is_valid());
        let e = t.edge(h);
        assert!(t.is_flip_ok(e));

        t.flip(e).unwrap();
        assert_eq!(t.n_faces(), 2);
        assert!(t.find_halfedge(v1, v3).is_valid() || t.find_halfedge(v3, v1).is_valid());
        assert!(!t.find_halfedge(v0, v2).is_valid() && !t.find_halfedge(v2, v0).is_valid());
    }

    #[test]
    fn remove_interior_edge_makes_a_quad() {
        let mut t = Topology::new();
        let v0 = t.add_vertex().unwrap();
        let v1 = t.add_vertex().unwrap();
        let v2 = t.add_vertex().unwrap();
        let v3 = t.add_vertex().unwrap();
        t.add_face(&[v0, v1, v2]).unwrap();
        t.add_face(&[v0, v2, v3]).unwrap();

        let h = t.find_halfedge(v0, v2);
        let e = t.edge(h);
        assert!(t.is_removal_ok(e));
        t.remove_edge(e).unwrap();
        t.garbage_collection();
        assert_eq!(t.n_faces(), 1);
        let f = Face::new(0);
        assert_eq!(t.face_valence(f), 4);
    }

    #[test]
    fn face_split_quadruples_a_quad() {
        let mut t = Topology::new();
        let v0 = t.add_vertex().unwrap();
        let v1 = t.add_vertex().unwrap();
        let v2 = t.add_vertex().unwrap();
        let v3 = t.add_vertex().unwrap();
        let f = t.add_face(&[v0, v1, v2, v3]).unwrap();
        let center = t.add_vertex().unwrap();
        t.split_face(f, center).unwrap();

        assert_eq!(t.n_faces(), 4);
        assert_eq!(t.vertex_valence(center), 4);
    }

    #[test]
    fn add_then_delete_face_is_a_round_trip() {
        let mut t = Topology::new();
        let v0 = t.add_vertex().unwrap();
        let v1 = t.add_vertex().unwrap();
        let v2 = t.add_vertex().unwrap();
        let f = t.add_face(&[v0, v1, v2]).unwrap();
        t.delete_face(f);
        let remap = t.garbage_collection();
        assert_eq!(t.n_faces(), 0);
        assert_eq!(t.n_vertices(), 3);
        assert_eq!(remap.vertex(v0), Vertex::new(0));
    }

    #[test]
    fn add_then_delete_vertex_round_trips_count() {
        let mut t = Topology::new();
        let v = t.add_vertex().unwrap();
        t.delete_vertex(v);
        t.garbage_collection();
        assert_eq!(t.n_vertices(), 0);
    }
}
