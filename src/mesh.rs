//! The public facade (spec.md §6): a [`Topology`] plus vertex
//! positions and the optional unique-vertex index, wired together the
//! way the teacher's own `Mesh` wraps `Topology` with a `points`
//! property.

use std::collections::BTreeSet;

use crate::error::Error;
use crate::handle::{Edge, Face, Halfedge, Vertex};
use crate::iterator::{
    EdgeAroundVertexIter, EdgeIter, FaceAroundVertexIter, FaceIter, HalfedgeAroundFaceIter,
    HalfedgeAroundVertexIter, HalfedgeIter, VertexAroundFaceIter, VertexIter,
};
use crate::property::{PropertyHandle, TPropData};
use crate::topol::{GarbageCollectionRemap, Topology};

/// Orders vertices by position (lexicographically on x, y, z using
/// IEEE-754 total order, so `NaN` sorts consistently rather than
/// breaking the set's invariants) and falls back to the index for two
/// vertices placed at the exact same position — mirrors
/// `unique_vertices_set_`'s comparator in the original source.
#[derive(Clone, Copy, PartialEq)]
struct PositionKey {
    vertex: Vertex,
    position: glam::Vec3,
}

impl Eq for PositionKey {}

impl PartialOrd for PositionKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PositionKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.position
            .x
            .total_cmp(&other.position.x)
            .then_with(|| self.position.y.total_cmp(&other.position.y))
            .then_with(|| self.position.z.total_cmp(&other.position.z))
            .then_with(|| self.vertex.index().cmp(&other.vertex.index()))
    }
}

pub struct Mesh {
    topol: Topology,
    points: PropertyHandle<glam::Vec3>,
    unique_vertices: BTreeSet<PositionKey>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        let mut topol = Topology::new();
        let points = topol
            .vertex_property("v:point", glam::Vec3::ZERO)
            .expect("v:point registered once in Mesh::new");
        Mesh {
            topol,
            points,
            unique_vertices: BTreeSet::new(),
        }
    }

    pub fn with_capacity(nvertices: usize, nedges: usize, nfaces: usize) -> Self {
        let mut mesh = Mesh::new();
        mesh.reserve(nvertices, nedges, nfaces);
        mesh
    }

    pub fn reserve(&mut self, nvertices: usize, nedges: usize, nfaces: usize) {
        self.topol.reserve(nvertices, nedges, nfaces);
    }

    pub fn clear(&mut self) {
        self.topol.clear();
        self.unique_vertices.clear();
        self.points = self
            .topol
            .vertex_property("v:point", glam::Vec3::ZERO)
            .expect("v:point registered once in Mesh::clear");
    }

    // ---- vertex positions ---------------------------------------------------

    pub fn point(&self, v: Vertex) -> glam::Vec3 {
        self.topol.vertex_property_value(self.points, v)
    }

    pub fn set_point(&mut self, v: Vertex, position: glam::Vec3) {
        self.topol.set_vertex_property_value(self.points, v, position);
    }

    pub fn add_vertex(&mut self, position: glam::Vec3) -> Result<Vertex, Error> {
        let v = self.topol.add_vertex()?;
        self.set_point(v, position);
        Ok(v)
    }

    /// Adds `position` only if no existing, live vertex has the exact
    /// same position (bit-exact equality, spec.md §3.4/§9); otherwise
    /// returns the existing vertex. A vertex that was deleted but not
    /// yet garbage-collected still occupies a slot in the index, so a
    /// hit there is treated as stale and a new vertex is added.
    pub fn add_vertex_unique(&mut self, position: glam::Vec3) -> Result<Vertex, Error> {
        // A dummy key with the largest possible index would sort
        // after every real vertex at this position; instead probe
        // with the smallest index and walk forward while positions
        // still match bit-exactly.
        let probe = PositionKey {
            vertex: Vertex::new(0),
            position,
        };
        if let Some(existing) = self
            .unique_vertices
            .range(probe..)
            .next()
            .filter(|k| k.position == position && !self.topol.is_deleted_vertex(k.vertex))
        {
            return Ok(existing.vertex);
        }
        let v = self.add_vertex(position)?;
        self.unique_vertices.insert(PositionKey { vertex: v, position });
        Ok(v)
    }

    // ---- navigation (spec.md §4.2) -------------------------------------------

    pub fn opposite_halfedge(&self, h: Halfedge) -> Halfedge {
        self.topol.opposite_halfedge(h)
    }

    pub fn edge(&self, h: Halfedge) -> Edge {
        self.topol.edge(h)
    }

    pub fn edge_halfedge(&self, e: Edge, side: u32) -> Halfedge {
        self.topol.edge_halfedge(e, side)
    }

    pub fn from_vertex(&self, h: Halfedge) -> Vertex {
        self.topol.from_vertex(h)
    }

    pub fn to_vertex(&self, h: Halfedge) -> Vertex {
        self.topol.to_vertex(h)
    }

    pub fn next_halfedge(&self, h: Halfedge) -> Halfedge {
        self.topol.next_halfedge(h)
    }

    pub fn prev_halfedge(&self, h: Halfedge) -> Halfedge {
        self.topol.prev_halfedge(h)
    }

    pub fn halfedge_face(&self, h: Halfedge) -> Face {
        self.topol.halfedge_face(h)
    }

    pub fn vertex_halfedge(&self, v: Vertex) -> Halfedge {
        self.topol.vertex_halfedge(v)
    }

    pub fn face_halfedge(&self, f: Face) -> Halfedge {
        self.topol.face_halfedge(f)
    }

    pub fn cw_rotated_halfedge(&self, h: Halfedge) -> Halfedge {
        self.topol.cw_rotated_halfedge(h)
    }

    pub fn ccw_rotated_halfedge(&self, h: Halfedge) -> Halfedge {
        self.topol.ccw_rotated_halfedge(h)
    }

    pub fn find_halfedge(&self, from: Vertex, to: Vertex) -> Result<Halfedge, Error> {
        let h = self.topol.find_halfedge(from, to);
        if h.is_valid() {
            Ok(h)
        } else {
            Err(Error::HalfedgeNotFound)
        }
    }

    // ---- counts and predicates (spec.md §4.6) --------------------------------

    pub fn n_vertices(&self) -> usize {
        self.topol.n_vertices()
    }

    pub fn n_edges(&self) -> usize {
        self.topol.n_edges()
    }

    pub fn n_halfedges(&self) -> usize {
        self.topol.n_halfedges()
    }

    pub fn n_faces(&self) -> usize {
        self.topol.n_faces()
    }

    pub fn vertices_size(&self) -> usize {
        self.topol.vertices_size()
    }

    pub fn edges_size(&self) -> usize {
        self.topol.edges_size()
    }

    pub fn halfedges_size(&self) -> usize {
        self.topol.halfedges_size()
    }

    pub fn faces_size(&self) -> usize {
        self.topol.faces_size()
    }

    pub fn has_garbage(&self) -> bool {
        self.topol.has_garbage()
    }

    pub fn is_deleted_vertex(&self, v: Vertex) -> bool {
        self.topol.is_deleted_vertex(v)
    }

    pub fn is_deleted_edge(&self, e: Edge) -> bool {
        self.topol.is_deleted_edge(e)
    }

    pub fn is_deleted_face(&self, f: Face) -> bool {
        self.topol.is_deleted_face(f)
    }

    pub fn is_isolated_vertex(&self, v: Vertex) -> bool {
        self.topol.is_isolated_vertex(v)
    }

    pub fn is_boundary_vertex(&self, v: Vertex) -> bool {
        self.topol.is_boundary_vertex(v)
    }

    pub fn is_boundary_halfedge(&self, h: Halfedge) -> bool {
        self.topol.is_boundary_halfedge(h)
    }

    pub fn is_boundary_edge(&self, e: Edge) -> bool {
        self.topol.is_boundary_edge(e)
    }

    pub fn is_boundary_face(&self, f: Face) -> bool {
        self.topol.is_boundary_face(f)
    }

    pub fn is_manifold_vertex(&self, v: Vertex) -> bool {
        self.topol.is_manifold_vertex(v)
    }

    pub fn vertex_valence(&self, v: Vertex) -> usize {
        self.topol.vertex_valence(v)
    }

    pub fn face_valence(&self, f: Face) -> usize {
        self.topol.face_valence(f)
    }

    pub fn is_triangle_mesh(&self) -> bool {
        FaceIter::new(&self.topol).all(|f| self.face_valence(f) == 3)
    }

    pub fn is_quad_mesh(&self) -> bool {
        FaceIter::new(&self.topol).all(|f| self.face_valence(f) == 4)
    }

    // ---- element creation (spec.md §4.4) -------------------------------------

    pub fn add_face(&mut self, vertices: &[Vertex]) -> Result<Face, Error> {
        self.topol.add_face(vertices)
    }

    pub fn add_triangle(&mut self, v0: Vertex, v1: Vertex, v2: Vertex) -> Result<Face, Error> {
        self.topol.add_triangle(v0, v1, v2)
    }

    pub fn add_quad(&mut self, v0: Vertex, v1: Vertex, v2: Vertex, v3: Vertex) -> Result<Face, Error> {
        self.topol.add_quad(v0, v1, v2, v3)
    }

    // ---- other Euler operators (spec.md §4.5) --------------------------------

    pub fn split_face(&mut self, f: Face, position: glam::Vec3) -> Result<Vertex, Error> {
        let v = self.add_vertex(position)?;
        self.topol.split_face(f, v)?;
        Ok(v)
    }

    pub fn split_edge(&mut self, e: Edge, position: glam::Vec3) -> Result<Vertex, Error> {
        let v = self.add_vertex(position)?;
        self.topol.split_edge(e, v)?;
        Ok(v)
    }

    pub fn insert_vertex(&mut self, h: Halfedge, position: glam::Vec3) -> Result<Vertex, Error> {
        let v = self.add_vertex(position)?;
        self.topol.insert_vertex(h, v)?;
        Ok(v)
    }

    pub fn insert_edge(&mut self, h0: Halfedge, h1: Halfedge) -> Result<Halfedge, Error> {
        self.topol.insert_edge(h0, h1)
    }

    pub fn is_flip_ok(&self, e: Edge) -> bool {
        self.topol.is_flip_ok(e)
    }

    pub fn flip(&mut self, e: Edge) -> Result<(), Error> {
        self.topol.flip(e)
    }

    pub fn is_collapse_ok(&self, h: Halfedge) -> bool {
        self.topol.is_collapse_ok(h)
    }

    pub fn collapse(&mut self, h: Halfedge) -> Result<(), Error> {
        self.topol.collapse(h)
    }

    pub fn is_removal_ok(&self, e: Edge) -> bool {
        self.topol.is_removal_ok(e)
    }

    pub fn remove_edge(&mut self, e: Edge) -> Result<(), Error> {
        self.topol.remove_edge(e)
    }

    pub fn delete_vertex(&mut self, v: Vertex) {
        self.topol.delete_vertex(v);
    }

    pub fn delete_edge(&mut self, e: Edge) {
        self.topol.delete_edge(e);
    }

    pub fn delete_face(&mut self, f: Face) {
        self.topol.delete_face(f);
    }

    /// Compacts the mesh, dropping deleted elements, and keeps the
    /// unique-vertex index (if in use) consistent with the new indices.
    pub fn garbage_collection(&mut self) -> GarbageCollectionRemap {
        let remap = self.topol.garbage_collection();
        self.unique_vertices = self
            .unique_vertices
            .iter()
            .map(|k| PositionKey {
                vertex: remap.vertex(k.vertex),
                position: k.position,
            })
            .filter(|k| k.vertex.is_valid())
            .collect();
        remap
    }

    // ---- iteration (spec.md §4.3) --------------------------------------------

    pub fn vertices(&self) -> VertexIter<'_> {
        VertexIter::new(&self.topol)
    }

    pub fn halfedges(&self) -> HalfedgeIter<'_> {
        HalfedgeIter::new(&self.topol)
    }

    pub fn edges(&self) -> EdgeIter<'_> {
        EdgeIter::new(&self.topol)
    }

    pub fn faces(&self) -> FaceIter<'_> {
        FaceIter::new(&self.topol)
    }

    pub fn voh(&self, v: Vertex) -> HalfedgeAroundVertexIter<'_> {
        HalfedgeAroundVertexIter::new(&self.topol, v)
    }

    pub fn ve(&self, v: Vertex) -> EdgeAroundVertexIter<'_> {
        EdgeAroundVertexIter::new(&self.topol, v)
    }

    pub fn vf(&self, v: Vertex) -> FaceAroundVertexIter<'_> {
        FaceAroundVertexIter::new(&self.topol, v)
    }

    pub fn fh(&self, f: Face) -> HalfedgeAroundFaceIter<'_> {
        HalfedgeAroundFaceIter::new(&self.topol, self.topol.face_halfedge(f))
    }

    pub fn fv(&self, f: Face) -> VertexAroundFaceIter<'_> {
        VertexAroundFaceIter::new(&self.topol, self.topol.face_halfedge(f))
    }

    // ---- generic named properties (spec.md §4.1) -----------------------------

    pub fn vertex_property<T: TPropData>(&mut self, name: &str, default: T) -> Result<PropertyHandle<T>, Error> {
        self.topol.vertex_property(name, default)
    }

    pub fn get_vertex_property<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        self.topol.get_vertex_property(name)
    }

    pub fn remove_vertex_property<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        self.topol.remove_vertex_property(handle)
    }

    pub fn vertex_property_value<T: TPropData>(&self, handle: PropertyHandle<T>, v: Vertex) -> T {
        self.topol.vertex_property_value(handle, v)
    }

    pub fn set_vertex_property_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, v: Vertex, value: T) {
        self.topol.set_vertex_property_value(handle, v, value);
    }

    pub fn halfedge_property<T: TPropData>(&mut self, name: &str, default: T) -> Result<PropertyHandle<T>, Error> {
        self.topol.halfedge_property(name, default)
    }

    pub fn get_halfedge_property<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        self.topol.get_halfedge_property(name)
    }

    pub fn remove_halfedge_property<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        self.topol.remove_halfedge_property(handle)
    }

    pub fn halfedge_property_value<T: TPropData>(&self, handle: PropertyHandle<T>, h: Halfedge) -> T {
        self.topol.halfedge_property_value(handle, h)
    }

    pub fn set_halfedge_property_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, h: Halfedge, value: T) {
        self.topol.set_halfedge_property_value(handle, h, value);
    }

    pub fn edge_property<T: TPropData>(&mut self, name: &str, default: T) -> Result<PropertyHandle<T>, Error> {
        self.topol.edge_property(name, default)
    }

    pub fn get_edge_property<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        self.topol.get_edge_property(name)
    }

    pub fn remove_edge_property<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        self.topol.remove_edge_property(handle)
    }

    pub fn edge_property_value<T: TPropData>(&self, handle: PropertyHandle<T>, e: Edge) -> T {
        self.topol.edge_property_value(handle, e)
    }

    pub fn set_edge_property_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, e: Edge, value: T) {
        self.topol.set_edge_property_value(handle, e, value);
    }

    pub fn face_property<T: TPropData>(&mut self, name: &str, default: T) -> Result<PropertyHandle<T>, Error> {
        self.topol.face_property(name, default)
    }

    pub fn get_face_property<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        self.topol.get_face_property(name)
    }

    pub fn remove_face_property<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        self.topol.remove_face_property(handle)
    }

    pub fn face_property_value<T: TPropData>(&self, handle: PropertyHandle<T>, f: Face) -> T {
        self.topol.face_property_value(handle, f)
    }

    pub fn set_face_property_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, f: Face, value: T) {
        self.topol.set_face_property_value(handle, f, value);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_triangle() {
        let mut mesh = Mesh::new();
        let v0 = mesh.add_vertex(glam::vec3(0.0, 0.0, 0.0)).unwrap();
        let v1 = mesh.add_vertex(glam::vec3(1.0, 0.0, 0.0)).unwrap();
        let v2 = mesh.add_vertex(glam::vec3(0.0, 1.0, 0.0)).unwrap();
        let f = mesh.add_triangle(v0, v1, v2).unwrap();
        assert_eq!(mesh.n_faces(), 1);
        assert!(mesh.is_triangle_mesh());
        assert_eq!(mesh.fv(f).count(), 3);
        assert_eq!(mesh.point(v1), glam::vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn add_vertex_unique_dedupes_bit_exact_positions() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex_unique(glam::vec3(1.0, 2.0, 3.0)).unwrap();
        let b = mesh.add_vertex_unique(glam::vec3(1.0, 2.0, 3.0)).unwrap();
        let c = mesh.add_vertex_unique(glam::vec3(1.0, 2.0, 3.0001)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(mesh.n_vertices(), 2);
    }

    #[test]
    fn add_vertex_unique_ignores_a_deleted_but_uncollected_hit() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex_unique(glam::vec3(1.0, 2.0, 3.0)).unwrap();
        mesh.delete_vertex(a);
        assert!(mesh.is_deleted_vertex(a));

        let b = mesh.add_vertex_unique(glam::vec3(1.0, 2.0, 3.0)).unwrap();
        assert_ne!(a, b);
        assert!(!mesh.is_deleted_vertex(b));
    }

    #[test]
    fn reserve_pre_sizes_without_adding_elements() {
        let mut mesh = Mesh::with_capacity(100, 200, 64);
        assert_eq!(mesh.n_vertices(), 0);
        assert_eq!(mesh.vertices_size(), 0);
    }

    #[test]
    fn collapse_vertex_one_ring() {
        let mut mesh = Mesh::new();
        let center = mesh.add_vertex(glam::vec3(0.0, 0.0, 0.0)).unwrap();
        let ring: Vec<_> = (0..6)
            .map(|i| {
                let theta = i as f32;
                mesh.add_vertex(glam::vec3(theta, theta, 0.0)).unwrap()
            })
            .collect();
        for i in 0..6 {
            let j = (i + 1) % 6;
            mesh.add_triangle(center, ring[i], ring[j]).unwrap();
        }
        assert_eq!(mesh.n_faces(), 6);

        let h = mesh.find_halfedge(center, ring[0]).unwrap();
        assert!(mesh.is_collapse_ok(h));
        mesh.collapse(h).unwrap();
        mesh.garbage_collection();
        assert_eq!(mesh.n_vertices(), 6);
    }

    #[test]
    fn split_face_adds_center_vertex() {
        let mut mesh = Mesh::new();
        let v0 = mesh.add_vertex(glam::vec3(0.0, 0.0, 0.0)).unwrap();
        let v1 = mesh.add_vertex(glam::vec3(1.0, 0.0, 0.0)).unwrap();
        let v2 = mesh.add_vertex(glam::vec3(1.0, 1.0, 0.0)).unwrap();
        let v3 = mesh.add_vertex(glam::vec3(0.0, 1.0, 0.0)).unwrap();
        let f = mesh.add_quad(v0, v1, v2, v3).unwrap();
        let center = mesh.split_face(f, glam::vec3(0.5, 0.5, 0.0)).unwrap();
        assert_eq!(mesh.n_faces(), 4);
        assert_eq!(mesh.vertex_valence(center), 4);
    }

    #[test]
    fn custom_property_round_trips() {
        let mut mesh = Mesh::new();
        let v0 = mesh.add_vertex(glam::vec3(0.0, 0.0, 0.0)).unwrap();
        let quality = mesh.vertex_property::<f32>("v:quality", 0.0).unwrap();
        mesh.set_vertex_property_value(quality, v0, 0.75);
        assert_eq!(mesh.vertex_property_value(quality, v0), 0.75);
    }
}
