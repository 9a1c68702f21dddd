//! # Properties
//!
//! Named, typed per-element data attached to a mesh at runtime. A property
//! is one array per element kind, kept the same length as the element array:
//! it grows when elements are added, is compacted by garbage collection and
//! is emptied by `clear`.
//!
//! ```rust
//! use halfmesh::{single_triangle, VertexHandle};
//!
//! let mut mesh = single_triangle();
//! let weight = mesh.add_property::<VertexHandle, f64>("weight");
//! mesh.set_property(weight, VertexHandle::new(1), 0.25)?;
//! assert_eq!(*mesh.property(weight, VertexHandle::new(1))?, 0.25);
//! assert_eq!(*mesh.property(weight, VertexHandle::new(0))?, 0.0);
//! # Ok::<(), halfmesh::MeshError>(())
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use crate::connectivity::TriMesh;
use crate::error::{MeshError, Result};
use crate::handles::{ElementHandle, ElementKind};
use crate::status::StatusFlags;

/// Value types that can be stored as a property
pub trait PropertyValue: Clone + Default + Send + Sync + 'static {}

impl<T: Clone + Default + Send + Sync + 'static> PropertyValue for T {}

/// Typed reference to a property on elements of kind `H`
pub struct PropHandle<H, T> {
    slot: usize,
    _marker: PhantomData<fn() -> (H, T)>,
}

impl<H, T> PropHandle<H, T> {
    #[inline]
    pub(crate) fn new(slot: usize) -> Self {
        Self {
            slot,
            _marker: PhantomData,
        }
    }

    /// Slot index inside the element kind's property table
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl<H, T> Clone for PropHandle<H, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H, T> Copy for PropHandle<H, T> {}

impl<H, T> PartialEq for PropHandle<H, T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl<H, T> Eq for PropHandle<H, T> {}

impl<H: ElementHandle, T> fmt::Debug for PropHandle<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropHandle<{:?}, {}>({})", H::KIND, std::any::type_name::<T>(), self.slot)
    }
}

/// Keep `items[i]` iff `keep[i]`, preserving order
pub(crate) fn retain_marked<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    items.retain(|_| {
        let k = keep.get(i).copied().unwrap_or(false);
        i += 1;
        k
    });
}

/// Type-erased property column
trait PropertyArray: Send + Sync {
    fn name(&self) -> &str;
    fn len(&self) -> usize;
    fn push_default(&mut self);
    fn resize(&mut self, n: usize);
    fn retain_marked(&mut self, keep: &[bool]);
    fn clone_box(&self) -> Box<dyn PropertyArray>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct PropertyVec<T> {
    name: String,
    data: Vec<T>,
}

impl<T: PropertyValue> PropertyArray for PropertyVec<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push_default(&mut self) {
        self.data.push(T::default());
    }

    fn resize(&mut self, n: usize) {
        self.data.resize(n, T::default());
    }

    fn retain_marked(&mut self, keep: &[bool]) {
        retain_marked(&mut self.data, keep);
    }

    fn clone_box(&self) -> Box<dyn PropertyArray> {
        Box::new(PropertyVec {
            name: self.name.clone(),
            data: self.data.clone(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All properties of one element kind. Removed properties leave an empty
/// slot so existing handles never alias a newer property.
#[derive(Default)]
pub struct PropertyContainer {
    slots: Vec<Option<Box<dyn PropertyArray>>>,
}

impl PropertyContainer {
    pub fn add<T: PropertyValue>(&mut self, name: &str, n_elements: usize) -> usize {
        let column = PropertyVec {
            name: name.to_owned(),
            data: vec![T::default(); n_elements],
        };
        self.slots.push(Some(Box::new(column)));
        self.slots.len() - 1
    }

    /// First live property with this name and value type
    pub fn find<T: PropertyValue>(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|p| p.name() == name && p.as_any().is::<PropertyVec<T>>())
        })
    }

    pub fn remove(&mut self, slot: usize) -> bool {
        self.slots.get_mut(slot).and_then(Option::take).is_some()
    }

    pub fn get<T: PropertyValue>(&self, slot: usize) -> Option<&[T]> {
        let column = self.slots.get(slot)?.as_ref()?;
        column
            .as_any()
            .downcast_ref::<PropertyVec<T>>()
            .map(|p| p.data.as_slice())
    }

    pub fn get_mut<T: PropertyValue>(&mut self, slot: usize) -> Option<&mut [T]> {
        let column = self.slots.get_mut(slot)?.as_mut()?;
        column
            .as_any_mut()
            .downcast_mut::<PropertyVec<T>>()
            .map(|p| p.data.as_mut_slice())
    }

    /// Names of the live properties, in slot order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().flatten().map(|p| p.name())
    }

    fn columns_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn PropertyArray>> {
        self.slots.iter_mut().flatten()
    }

    pub fn push_default(&mut self) {
        self.columns_mut().for_each(|p| p.push_default());
    }

    pub fn resize(&mut self, n: usize) {
        self.columns_mut().for_each(|p| p.resize(n));
    }

    pub fn retain_marked(&mut self, keep: &[bool]) {
        self.columns_mut().for_each(|p| p.retain_marked(keep));
    }

    #[cfg(test)]
    fn lengths(&self) -> Vec<usize> {
        self.slots.iter().flatten().map(|p| p.len()).collect()
    }
}

impl Clone for PropertyContainer {
    fn clone(&self) -> Self {
        Self {
            slots: self
                .slots
                .iter()
                .map(|slot| slot.as_ref().map(|p| p.clone_box()))
                .collect(),
        }
    }
}

impl fmt::Debug for PropertyContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.slots
                    .iter()
                    .flatten()
                    .map(|p| format!("{}[{}]", p.name(), p.len())),
            )
            .finish()
    }
}

/// Status words and properties for every element of one kind
#[derive(Debug, Clone, Default)]
pub struct ElementAttribs {
    pub status: Vec<StatusFlags>,
    pub props: PropertyContainer,
}

impl ElementAttribs {
    pub fn reserve(&mut self, n: usize) {
        // Capacity is only a hint
        let _ = self.status.try_reserve(n);
    }

    pub fn push(&mut self) {
        self.status.push(StatusFlags::empty());
        self.props.push_default();
    }

    pub fn clear(&mut self) {
        self.status.clear();
        self.props.resize(0);
    }

    pub fn is_deleted(&self, idx: usize) -> bool {
        self.status.get(idx).is_some_and(|s| s.is_deleted())
    }

    pub fn set_deleted(&mut self, idx: usize) {
        if let Some(s) = self.status.get_mut(idx) {
            s.set(StatusFlags::DELETED, true);
        }
    }

    pub fn n_deleted(&self) -> usize {
        self.status.iter().filter(|s| s.is_deleted()).count()
    }

    /// Keep element `i` iff `keep[i]`
    pub fn retain_marked(&mut self, keep: &[bool]) {
        retain_marked(&mut self.status, keep);
        self.props.retain_marked(keep);
    }
}

// ============================================================================
// Mesh property API
// ============================================================================

impl TriMesh {
    /// Attach a new property to every element of kind `H`.
    ///
    /// Existing elements get `T::default()`. Names need not be unique; each
    /// call creates a separate property.
    pub fn add_property<H: ElementHandle, T: PropertyValue>(&mut self, name: &str) -> PropHandle<H, T> {
        let attribs = self.kernel_mut().attribs_mut(H::KIND);
        let n_elements = attribs.status.len();
        PropHandle::new(attribs.props.add::<T>(name, n_elements))
    }

    /// Look up the first property with this name and value type
    pub fn property_handle<H: ElementHandle, T: PropertyValue>(&self, name: &str) -> Option<PropHandle<H, T>> {
        self.kernel()
            .attribs(H::KIND)
            .props
            .find::<T>(name)
            .map(PropHandle::new)
    }

    /// Drop a property; false if it was already removed
    pub fn remove_property<H: ElementHandle, T: PropertyValue>(&mut self, ph: PropHandle<H, T>) -> bool {
        self.kernel_mut().attribs_mut(H::KIND).props.remove(ph.slot())
    }

    /// Names of the live properties on one element kind
    pub fn property_names(&self, kind: ElementKind) -> Vec<String> {
        self.kernel()
            .attribs(kind)
            .props
            .names()
            .map(str::to_owned)
            .collect()
    }

    /// All values of a property, indexed by handle. Slots of deleted
    /// elements are included until garbage collection.
    pub fn property_values<H: ElementHandle, T: PropertyValue>(&self, ph: PropHandle<H, T>) -> Result<&[T]> {
        self.kernel()
            .attribs(H::KIND)
            .props
            .get::<T>(ph.slot())
            .ok_or(MeshError::InvalidProperty(ph.slot()))
    }

    /// Value of a property on one live element
    pub fn property<H: ElementHandle, T: PropertyValue>(&self, ph: PropHandle<H, T>, h: H) -> Result<&T> {
        self.check(h)?;
        self.property_values(ph)?
            .get(h.index())
            .ok_or(MeshError::InvalidHandle(h.tagged()))
    }

    pub fn property_mut<H: ElementHandle, T: PropertyValue>(
        &mut self,
        ph: PropHandle<H, T>,
        h: H,
    ) -> Result<&mut T> {
        self.check(h)?;
        self.kernel_mut()
            .attribs_mut(H::KIND)
            .props
            .get_mut::<T>(ph.slot())
            .ok_or(MeshError::InvalidProperty(ph.slot()))?
            .get_mut(h.index())
            .ok_or(MeshError::InvalidHandle(h.tagged()))
    }

    pub fn set_property<H: ElementHandle, T: PropertyValue>(
        &mut self,
        ph: PropHandle<H, T>,
        h: H,
        value: T,
    ) -> Result<()> {
        *self.property_mut(ph, h)? = value;
        Ok(())
    }
}
