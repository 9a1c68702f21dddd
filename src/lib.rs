//! # halfmesh - Half-Edge Triangle Mesh
//!
//! A half-edge triangle mesh with vertex and face circulators and a
//! double-precision vector type. Elements can be deleted and compacted away,
//! and carry status flags plus named, typed properties.
//!
//! ## Quick Start
//!
//! ```rust
//! use halfmesh::{TriMesh, Vec3d};
//!
//! let mut mesh = TriMesh::new();
//! let v0 = mesh.add_vertex(Vec3d::new(0.0, 0.0, 0.0));
//! let v1 = mesh.add_vertex(Vec3d::new(1.0, 0.0, 0.0));
//! let v2 = mesh.add_vertex(Vec3d::new(0.0, 1.0, 0.0));
//! let f0 = mesh.add_face(v0, v1, v2)?;
//!
//! let corners: Vec<_> = mesh.face_vertices(f0)?.collect();
//! assert_eq!(corners, vec![v0, v1, v2]);
//!
//! let [p0, p1, p2] = mesh.face_points(f0)?;
//! assert_eq!(0.5 * ((p1 - p0) % (p2 - p0)).norm(), 0.5);
//! # Ok::<(), halfmesh::MeshError>(())
//! ```

// Re-export types
pub use handles::{BaseHandle, EdgeHandle, ElementHandle, ElementKind, FaceHandle, HalfedgeHandle, VertexHandle};
pub use connectivity::{EdgeIter, FaceIter, HalfedgeIter, HandleIter, TriMesh, VertexIter};
pub use circulators::*;
pub use config::{MeshConfig, MAX_RESERVE};
pub use error::{ConfigError, Handle, MeshError, Result, TopologyError};
pub use geometry::*;
pub use property::{PropHandle, PropertyValue};
pub use status::StatusFlags;
pub use test_data::*;
pub use vector::{cross, dot, Vec3d};
pub use glam::DVec3;

mod handles;
mod items;
mod soa_kernel;
mod connectivity;
mod tri_connectivity;
mod deletion;
mod circulators;
mod vector;
mod geometry;
mod status;
mod property;
mod config;
mod error;
mod test_data;
