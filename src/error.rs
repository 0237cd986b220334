//! Error kinds the core signals (spec.md §7).
//!
//! Euler operators validate preconditions and either succeed atomically
//! or report one of these; they never leave the mesh partially
//! modified. The core never logs or prints on failure — errors surface
//! through this type alone.

use thiserror::Error;

use crate::handle::{Halfedge, Vertex};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Preconditions on higher-level collaborator inputs, e.g. "mesh
    /// must be a triangle mesh". Never raised by this crate itself;
    /// reserved for algorithm-layer callers built on top of it.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Attaching a face would produce a non-manifold vertex: the
    /// vertex is already fully surrounded by faces (spec.md §4.4).
    #[error("complex vertex {0:?}: vertex is not on the mesh boundary")]
    ComplexVertex(Vertex),

    /// Attaching a face along an edge that already bounds two faces.
    #[error("complex edge at halfedge {0:?}: edge is not a boundary edge")]
    ComplexEdge(Halfedge),

    /// `add_face` could not find a free boundary gap to relink a patch
    /// into (spec.md §4.4 step 2).
    #[error("failed to relink boundary patch while adding a face")]
    PatchRelinkingFailed,

    /// A topology-modifying operator's precondition did not hold
    /// (e.g. `flip` on a non-flippable edge, `collapse` without
    /// `is_collapse_ok`, `insert_edge` across a non-shared face).
    #[error("topology operation not permitted: {0}")]
    Topology(&'static str),

    /// Element index space exhausted (`u32::MAX` elements of one kind).
    #[error("element allocation exhausted for this handle type")]
    Allocation,

    /// A named property was looked up, or newly added, with a type
    /// that does not match the type it already exists with.
    #[error("property type mismatch for {0:?}")]
    PropertyTypeMismatch(&'static str),

    /// A property handle no longer refers to a live slot (removed, or
    /// from a different container than the one it was created in).
    #[error("property does not exist: {0:?}")]
    PropertyDoesNotExist(&'static str),

    /// `find_halfedge` (or a caller of it) found no halfedge between
    /// the given vertices.
    #[error("halfedge not found between the given vertices")]
    HalfedgeNotFound,
}

impl Error {
    pub const fn is_topology(self) -> bool {
        matches!(
            self,
            Error::ComplexVertex(_)
                | Error::ComplexEdge(_)
                | Error::PatchRelinkingFailed
                | Error::Topology(_)
        )
    }
}
