//! Circulators and element iterators over a [`Topology`] (spec.md §4.3).
//!
//! Circulators walk the one-ring of a vertex or the boundary of a face
//! by repeatedly applying a single connectivity primitive
//! (`cw_rotated_halfedge` or `next_halfedge`) until they return to
//! where they started — the same "stop at start" shape the teacher's
//! `OutgoingCCWHalfedgeIter`/`OutgoingCWHalfedgeIter` use, generalized
//! here to vertices, edges and faces and to both vertex and face
//! circulation.

use crate::handle::{Edge, Face, Halfedge, Vertex};
use crate::topol::Topology;

/// Outgoing halfedges around a vertex, in clockwise order.
pub struct HalfedgeAroundVertexIter<'a> {
    topol: &'a Topology,
    hstart: Halfedge,
    hcurrent: Option<Halfedge>,
}

impl<'a> HalfedgeAroundVertexIter<'a> {
    pub fn new(topol: &'a Topology, v: Vertex) -> Self {
        let hstart = topol.vertex_halfedge(v);
        HalfedgeAroundVertexIter {
            topol,
            hstart,
            hcurrent: if hstart.is_valid() { Some(hstart) } else { None },
        }
    }
}

impl<'a> Iterator for HalfedgeAroundVertexIter<'a> {
    type Item = Halfedge;

    fn next(&mut self) -> Option<Halfedge> {
        let current = self.hcurrent?;
        let next = self.topol.cw_rotated_halfedge(current);
        self.hcurrent = if next == self.hstart { None } else { Some(next) };
        Some(current)
    }
}

/// Edges incident to a vertex (one per outgoing halfedge).
pub struct EdgeAroundVertexIter<'a> {
    inner: HalfedgeAroundVertexIter<'a>,
}

impl<'a> EdgeAroundVertexIter<'a> {
    pub fn new(topol: &'a Topology, v: Vertex) -> Self {
        EdgeAroundVertexIter {
            inner: HalfedgeAroundVertexIter::new(topol, v),
        }
    }
}

impl<'a> Iterator for EdgeAroundVertexIter<'a> {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        self.inner.next().map(|h| h.edge())
    }
}

/// Faces incident to a vertex, skipping the boundary gap(s).
pub struct FaceAroundVertexIter<'a> {
    topol: &'a Topology,
    inner: HalfedgeAroundVertexIter<'a>,
}

impl<'a> FaceAroundVertexIter<'a> {
    pub fn new(topol: &'a Topology, v: Vertex) -> Self {
        FaceAroundVertexIter {
            topol,
            inner: HalfedgeAroundVertexIter::new(topol, v),
        }
    }
}

impl<'a> Iterator for FaceAroundVertexIter<'a> {
    type Item = Face;

    fn next(&mut self) -> Option<Face> {
        for h in self.inner.by_ref() {
            let f = self.topol.halfedge_face(h);
            if f.is_valid() {
                return Some(f);
            }
        }
        None
    }
}

/// Halfedges around a face boundary, following `next`.
pub struct HalfedgeAroundFaceIter<'a> {
    topol: &'a Topology,
    hstart: Halfedge,
    hcurrent: Option<Halfedge>,
}

impl<'a> HalfedgeAroundFaceIter<'a> {
    pub fn new(topol: &'a Topology, hstart: Halfedge) -> Self {
        HalfedgeAroundFaceIter {
            topol,
            hstart,
            hcurrent: if hstart.is_valid() { Some(hstart) } else { None },
        }
    }
}

impl<'a> Iterator for HalfedgeAroundFaceIter<'a> {
    type Item = Halfedge;

    fn next(&mut self) -> Option<Halfedge> {
        let current = self.hcurrent?;
        let next = self.topol.next_halfedge(current);
        self.hcurrent = if next == self.hstart { None } else { Some(next) };
        Some(current)
    }
}

/// Vertices around a face boundary.
pub struct VertexAroundFaceIter<'a> {
    topol: &'a Topology,
    inner: HalfedgeAroundFaceIter<'a>,
}

impl<'a> VertexAroundFaceIter<'a> {
    pub fn new(topol: &'a Topology, hstart: Halfedge) -> Self {
        VertexAroundFaceIter {
            topol,
            inner: HalfedgeAroundFaceIter::new(topol, hstart),
        }
    }
}

impl<'a> Iterator for VertexAroundFaceIter<'a> {
    type Item = Vertex;

    fn next(&mut self) -> Option<Vertex> {
        self.inner.next().map(|h| self.topol.to_vertex(h))
    }
}

macro_rules! def_element_iter {
    ($name:ident, $handle:ty, $size:ident, $is_deleted:ident) => {
        /// Linear scan over every live (non-deleted) element of this kind.
        pub struct $name<'a> {
            topol: &'a Topology,
            next: u32,
            end: u32,
        }

        impl<'a> $name<'a> {
            pub fn new(topol: &'a Topology) -> Self {
                $name {
                    topol,
                    next: 0,
                    end: topol.$size() as u32,
                }
            }
        }

        impl<'a> Iterator for $name<'a> {
            type Item = $handle;

            fn next(&mut self) -> Option<$handle> {
                while self.next < self.end {
                    let h = <$handle>::new(self.next);
                    self.next += 1;
                    if !self.topol.$is_deleted(h) {
                        return Some(h);
                    }
                }
                None
            }
        }
    };
}

def_element_iter!(VertexIter, Vertex, vertices_size, is_deleted_vertex);
def_element_iter!(FaceIter, Face, faces_size, is_deleted_face);
def_element_iter!(EdgeIter, Edge, edges_size, is_deleted_edge);

/// Halfedges are never independently deleted (their edge is); a live
/// halfedge is one whose edge is not deleted.
pub struct HalfedgeIter<'a> {
    topol: &'a Topology,
    next: u32,
    end: u32,
}

impl<'a> HalfedgeIter<'a> {
    pub fn new(topol: &'a Topology) -> Self {
        HalfedgeIter {
            topol,
            next: 0,
            end: topol.halfedges_size() as u32,
        }
    }
}

impl<'a> Iterator for HalfedgeIter<'a> {
    type Item = Halfedge;

    fn next(&mut self) -> Option<Halfedge> {
        while self.next < self.end {
            let h = Halfedge::new(self.next);
            self.next += 1;
            if !self.topol.is_deleted_edge(h.edge()) {
                return Some(h);
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn halfedge_around_triangle_vertex_has_two_spokes() {
        let mut t = Topology::new();
        let v0 = t.add_vertex().unwrap();
        let v1 = t.add_vertex().unwrap();
        let v2 = t.add_vertex().unwrap();
        t.add_face(&[v0, v1, v2]).unwrap();
        let spokes: Vec<_> = HalfedgeAroundVertexIter::new(&t, v0).collect();
        assert_eq!(spokes.len(), 2);
        for h in spokes {
            assert_eq!(t.from_vertex(h), v0);
        }
    }

    #[test]
    fn vertex_around_face_visits_all_corners_once() {
        let mut t = Topology::new();
        let vs: Vec<_> = (0..5).map(|_| t.add_vertex().unwrap()).collect();
        let f = t.add_face(&vs).unwrap();
        let mut seen: Vec<_> = VertexAroundFaceIter::new(&t, t.face_halfedge(f)).collect();
        seen.sort_by_key(|v| v.index());
        let mut expected = vs.clone();
        expected.sort_by_key(|v| v.index());
        assert_eq!(seen, expected);
    }

    #[test]
    fn element_iter_skips_deleted() {
        let mut t = Topology::new();
        let v0 = t.add_vertex().unwrap();
        let v1 = t.add_vertex().unwrap();
        let v2 = t.add_vertex().unwrap();
        let f = t.add_face(&[v0, v1, v2]).unwrap();
        t.delete_face(f);
        let live: Vec<_> = FaceIter::new(&t).collect();
        assert!(live.is_empty());
        let live_vertices: Vec<_> = VertexIter::new(&t).collect();
        assert_eq!(live_vertices.len(), 3);
    }
}
