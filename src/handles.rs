//! # Handles
//!
//! Handle types for mesh entities (Vertex, Halfedge, Edge, Face).
//! Handles are lightweight references to mesh elements using integer indices.
//! Indices are dense and zero-based; `u32::MAX` marks an invalid handle.

use std::fmt;

use crate::error::Handle;

/// Base handle type for all mesh entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BaseHandle {
    idx: u32,
}

impl BaseHandle {
    /// Create a new handle with the given index
    #[inline]
    pub const fn new(idx: u32) -> Self {
        Self { idx }
    }

    /// Create from usize; indices that do not fit in `u32` give the invalid handle
    #[inline]
    pub fn from_usize(idx: usize) -> Self {
        Self {
            idx: u32::try_from(idx).unwrap_or(u32::MAX),
        }
    }

    /// Get the underlying index
    #[inline]
    pub const fn idx(&self) -> u32 {
        self.idx
    }

    /// Get as usize (for indexing)
    #[inline]
    pub const fn idx_usize(&self) -> usize {
        self.idx as usize
    }

    /// Check if the handle is valid (index != MAX)
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.idx != u32::MAX
    }
}

impl Default for BaseHandle {
    #[inline]
    fn default() -> Self {
        Self::new(u32::MAX)
    }
}

impl fmt::Display for BaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.idx)
        } else {
            f.write_str("<invalid>")
        }
    }
}

macro_rules! entity_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(BaseHandle);

        impl $name {
            /// Create a handle from a raw index
            #[inline]
            pub const fn new(idx: u32) -> Self {
                Self(BaseHandle::new(idx))
            }

            /// Create from usize
            #[inline]
            pub fn from_usize(idx: usize) -> Self {
                Self(BaseHandle::from_usize(idx))
            }

            /// The invalid handle
            #[inline]
            pub const fn invalid() -> Self {
                Self::new(u32::MAX)
            }

            /// Get the underlying index
            #[inline]
            pub const fn idx(&self) -> u32 {
                self.0.idx()
            }

            /// Get as usize (for indexing)
            #[inline]
            pub const fn idx_usize(&self) -> usize {
                self.0.idx_usize()
            }

            /// Check if valid
            #[inline]
            pub const fn is_valid(&self) -> bool {
                self.0.is_valid()
            }
        }

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(idx: u32) -> Self {
                Self::new(idx)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(idx: usize) -> Self {
                Self::from_usize(idx)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

entity_handle!(
    /// Handle referencing a vertex entity
    VertexHandle
);

entity_handle!(
    /// Handle referencing a halfedge entity.
    ///
    /// Halfedges are allocated in pairs, so the opposite of `h` is `h ^ 1`
    /// and its edge is `h >> 1`.
    HalfedgeHandle
);

entity_handle!(
    /// Handle referencing an edge entity
    EdgeHandle
);

entity_handle!(
    /// Handle referencing a face entity
    FaceHandle
);

impl HalfedgeHandle {
    /// Get the opposite halfedge index (xor 1)
    #[inline]
    pub const fn opposite(&self) -> Self {
        Self::new(self.idx() ^ 1)
    }

    /// Get the edge this halfedge belongs to
    #[inline]
    pub const fn edge(&self) -> EdgeHandle {
        EdgeHandle::new(self.idx() >> 1)
    }
}

impl EdgeHandle {
    /// Get one of the two halfedges of this edge (`side` is 0 or 1)
    #[inline]
    pub const fn halfedge(&self, side: u32) -> HalfedgeHandle {
        HalfedgeHandle::new((self.idx() << 1) | (side & 1))
    }
}

/// The four element kinds a mesh stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Vertex,
    Halfedge,
    Edge,
    Face,
}

mod sealed {
    pub trait Sealed {}
}

/// Implemented by the four entity handles so status and property access can
/// be written once for every element kind.
pub trait ElementHandle: Copy + fmt::Debug + fmt::Display + sealed::Sealed {
    const KIND: ElementKind;

    /// Array index of the element
    fn index(self) -> usize;

    /// Tagged form used in error reports
    fn tagged(self) -> Handle;
}

macro_rules! element_handle {
    ($name:ident, $kind:ident) => {
        impl sealed::Sealed for $name {}

        impl ElementHandle for $name {
            const KIND: ElementKind = ElementKind::$kind;

            #[inline]
            fn index(self) -> usize {
                self.idx_usize()
            }

            #[inline]
            fn tagged(self) -> Handle {
                Handle::$kind(self)
            }
        }
    };
}

element_handle!(VertexHandle, Vertex);
element_handle!(HalfedgeHandle, Halfedge);
element_handle!(EdgeHandle, Edge);
element_handle!(FaceHandle, Face);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_validity() {
        let valid = VertexHandle::new(0);
        let invalid = VertexHandle::default();

        assert!(valid.is_valid());
        assert!(!invalid.is_valid());
        assert_eq!(invalid.to_string(), "<invalid>");
        assert_eq!(FaceHandle::from(3usize).to_string(), "3");
    }

    #[test]
    fn test_from_usize_out_of_range_is_invalid() {
        assert!(!VertexHandle::from_usize(usize::MAX).is_valid());
        assert!(!VertexHandle::from_usize(u32::MAX as usize).is_valid());
        assert_eq!(VertexHandle::from_usize(7), VertexHandle::new(7));
    }

    #[test]
    fn test_element_kinds() {
        assert_eq!(<VertexHandle as ElementHandle>::KIND, ElementKind::Vertex);
        assert_eq!(<EdgeHandle as ElementHandle>::KIND, ElementKind::Edge);
        assert_eq!(FaceHandle::new(4).index(), 4);
        assert_eq!(HalfedgeHandle::new(2).tagged(), Handle::Halfedge(HalfedgeHandle::new(2)));
    }

    #[test]
    fn test_halfedge_opposite() {
        let he = HalfedgeHandle::new(5);
        assert_eq!(he.opposite().idx(), 4);
        assert_eq!(he.opposite().opposite(), he);
        assert_eq!(he.edge(), EdgeHandle::new(2));
    }

    #[test]
    fn test_edge_halfedges() {
        let eh = EdgeHandle::new(3);
        assert_eq!(eh.halfedge(0), HalfedgeHandle::new(6));
        assert_eq!(eh.halfedge(1), HalfedgeHandle::new(7));
        assert_eq!(eh.halfedge(1).edge(), eh);
    }
}
