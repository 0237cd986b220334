//! Small value-type handles for the four element kinds.
//!
//! Each handle wraps a dense `u32` index. `u32::MAX` is the reserved
//! "invalid" sentinel (spec.md §3.1): it can never be produced by
//! `new()` on a live mesh because the element count is checked against
//! it in `Topology::add_vertex`/`new_face`/`new_edge`.

use std::fmt;

macro_rules! def_handle {
    ($name:ident, $short:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            pub const INVALID: Self = Self(u32::MAX);

            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            pub const fn index(self) -> u32 {
                self.0
            }

            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($short, "{}"), self.0)
                } else {
                    write!(f, concat!($short, "<invalid>"))
                }
            }
        }
    };
}

def_handle!(Vertex, "v");
def_handle!(Halfedge, "h");
def_handle!(Edge, "e");
def_handle!(Face, "f");

impl Edge {
    /// The two halfedges of this edge are `2*e` and `2*e + 1` (spec.md §3.1).
    pub const fn halfedge(self, side: u32) -> Halfedge {
        debug_assert!(side == 0 || side == 1);
        Halfedge::new(self.index() * 2 + side)
    }
}

impl Halfedge {
    /// The edge a halfedge belongs to: `edge(h) = h >> 1`.
    pub const fn edge(self) -> Edge {
        Edge::new(self.index() >> 1)
    }

    /// `opposite(h) = h XOR 1`.
    pub const fn opposite(self) -> Halfedge {
        Halfedge::new(self.index() ^ 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn invalid_sentinel() {
        assert!(!Vertex::INVALID.is_valid());
        assert!(Vertex::new(0).is_valid());
        assert_eq!(Vertex::default(), Vertex::INVALID);
    }

    #[test]
    fn edge_halfedge_pairing() {
        let e = Edge::new(5);
        assert_eq!(e.halfedge(0).index(), 10);
        assert_eq!(e.halfedge(1).index(), 11);
        assert_eq!(e.halfedge(0).edge(), e);
        assert_eq!(e.halfedge(1).edge(), e);
        assert_eq!(e.halfedge(0).opposite(), e.halfedge(1));
        assert_eq!(e.halfedge(1).opposite(), e.halfedge(0));
    }
}
