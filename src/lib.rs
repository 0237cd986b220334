//! Halfedge-based polygon mesh core: a typed property system, element
//! handles, halfedge connectivity, and the Euler operators that keep
//! it manifold.
//!
//! ```
//! use halfmesh::Mesh;
//!
//! let mut mesh = Mesh::new();
//! let v0 = mesh.add_vertex(glam::vec3(0.0, 0.0, 0.0)).unwrap();
//! let v1 = mesh.add_vertex(glam::vec3(1.0, 0.0, 0.0)).unwrap();
//! let v2 = mesh.add_vertex(glam::vec3(0.0, 1.0, 0.0)).unwrap();
//! mesh.add_triangle(v0, v1, v2).unwrap();
//! assert_eq!(mesh.n_faces(), 1);
//! ```

pub mod error;
pub mod handle;
pub mod iterator;
pub mod mesh;
pub mod property;
pub mod topol;

pub use error::Error;
pub use handle::{Edge, Face, Halfedge, Vertex};
pub use mesh::Mesh;
pub use property::{PropertyContainer, PropertyHandle, TPropData};
pub use topol::{GarbageCollectionRemap, Topology};
