//! # Errors
//!
//! Error types returned by mesh construction, navigation and configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::handles::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Any handle kind, used to report which handle was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Vertex(VertexHandle),
    Halfedge(HalfedgeHandle),
    Edge(EdgeHandle),
    Face(FaceHandle),
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handle::Vertex(vh) => write!(f, "vertex {}", vh),
            Handle::Halfedge(heh) => write!(f, "halfedge {}", heh),
            Handle::Edge(eh) => write!(f, "edge {}", eh),
            Handle::Face(fh) => write!(f, "face {}", fh),
        }
    }
}

/// Errors raised by mesh operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("invalid handle: {0}")]
    InvalidHandle(Handle),

    #[error("invalid topology: {0}")]
    InvalidTopology(#[from] TopologyError),

    #[error("property slot {0} is removed or holds another type")]
    InvalidProperty(usize),

    #[error("corrupted connectivity: {0}")]
    Corrupted(String),
}

/// Reasons a face insertion is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("a face needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("vertex {0} is not in the mesh")]
    VertexOutOfRange(VertexHandle),

    #[error("vertex index {0} does not fit a vertex handle")]
    IndexOverflow(usize),

    #[error("vertex {0} is deleted")]
    DeletedVertex(VertexHandle),

    #[error("vertex {0} appears more than once in the face")]
    DuplicateVertex(VertexHandle),

    #[error("complex vertex {0}: it is already surrounded by faces")]
    ComplexVertex(VertexHandle),

    #[error("complex edge {0} -> {1}: halfedge already has a face")]
    ComplexEdge(VertexHandle, VertexHandle),

    #[error("patch re-linking failed around vertex {0}")]
    PatchRelinkFailed(VertexHandle),

    #[error("degenerate face: area {area} below {epsilon}")]
    DegenerateFace { area: f64, epsilon: f64 },
}

/// Errors raised while loading a [`MeshConfig`](crate::MeshConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MeshError::InvalidHandle(Handle::Face(FaceHandle::new(7)));
        assert_eq!(err.to_string(), "invalid handle: face 7");

        let err: MeshError = TopologyError::ComplexEdge(VertexHandle::new(1), VertexHandle::new(2)).into();
        assert!(matches!(err, MeshError::InvalidTopology(TopologyError::ComplexEdge(..))));
        assert_eq!(
            err.to_string(),
            "invalid topology: complex edge 1 -> 2: halfedge already has a face"
        );
    }

    #[test]
    fn test_index_and_property_messages() {
        let err: MeshError = TopologyError::IndexOverflow(usize::MAX).into();
        assert_eq!(
            err.to_string(),
            format!("invalid topology: vertex index {} does not fit a vertex handle", usize::MAX)
        );
        assert_eq!(
            TopologyError::DeletedVertex(VertexHandle::new(4)).to_string(),
            "vertex 4 is deleted"
        );
        assert_eq!(
            MeshError::InvalidProperty(2).to_string(),
            "property slot 2 is removed or holds another type"
        );
    }
}
