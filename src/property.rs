//! Name-keyed, type-checked, densely indexed per-element arrays
//! (spec.md §4.1).
//!
//! A [`PropertyContainer`] owns every named slot for one element kind
//! (all of a mesh's vertex properties live in one container, its
//! halfedge properties in another, and so on). Every slot shares the
//! container's length: `resize`/`push`/`swap` touch every slot at
//! once, so `v:point`-style builtin properties and user-added ones
//! (normals, uv, quadrics, selection flags) never drift out of sync.
//!
//! Unlike the early prototype this crate grew from, slots here are
//! owned directly by the container rather than shared through
//! `Arc<RwLock<_>>` handles — spec.md §5 is explicit that a mesh is
//! single-writer and the core does no locking of its own, so the
//! extra indirection bought nothing but downcasting through `Any` on
//! every access.

use std::any::Any;
use std::collections::HashMap;

use crate::error::Error;

/// Types storable in a property slot. `'static` keeps property data
/// fully owned, with no borrowed references that could outlive a
/// `swap`/`resize` pass.
pub trait TPropData: Default + Clone + 'static {}

impl<T: Default + Clone + 'static> TPropData for T {}

/// A typed handle into one [`PropertyContainer`]. Carries no
/// information about which container it came from: indexing it into
/// the wrong container, or one where the slot was removed or
/// re-added with a different type, fails loudly rather than silently
/// aliasing unrelated data.
pub struct PropertyHandle<T: TPropData> {
    index: usize,
    _marker: std::marker::PhantomData<fn() -> T>,
}

// Deriving these would bound them on `T: Copy`, which `TPropData`
// does not require; a handle is just an index and is always cheap to
// copy regardless of what it points to.
impl<T: TPropData> Clone for PropertyHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: TPropData> Copy for PropertyHandle<T> {}

impl<T: TPropData> PropertyHandle<T> {
    fn new(index: usize) -> Self {
        PropertyHandle {
            index,
            _marker: std::marker::PhantomData,
        }
    }
}

trait GenericProperty: Any {
    fn reserve(&mut self, n: usize);
    fn resize(&mut self, n: usize);
    fn push(&mut self);
    fn swap(&mut self, i: usize, j: usize);
    fn name(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Slot<T: TPropData> {
    name: String,
    default: T,
    data: Vec<T>,
}

impl<T: TPropData> GenericProperty for Slot<T> {
    fn reserve(&mut self, n: usize) {
        self.data.reserve(n);
    }

    fn resize(&mut self, n: usize) {
        self.data.resize(n, self.default.clone());
    }

    fn push(&mut self) {
        self.data.push(self.default.clone());
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.data.swap(i, j);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Every named property of one element kind (all vertex properties,
/// or all halfedge properties, and so on), sharing one length.
#[derive(Default)]
pub struct PropertyContainer {
    slots: Vec<Option<Box<dyn GenericProperty>>>,
    names: HashMap<String, usize>,
    len: usize,
}

impl PropertyContainer {
    pub fn new() -> Self {
        PropertyContainer {
            slots: Vec::new(),
            names: HashMap::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocates a named slot with `default`. Returns the existing
    /// handle if a slot with this name and type `T` already exists;
    /// fails with [`Error::PropertyTypeMismatch`] if the name exists
    /// with a different type.
    pub fn add<T: TPropData>(
        &mut self,
        name: &str,
        default: T,
    ) -> Result<PropertyHandle<T>, Error> {
        if let Some(&index) = self.names.get(name) {
            return match self.slots[index]
                .as_ref()
                .and_then(|s| s.as_any().downcast_ref::<Slot<T>>())
            {
                Some(_) => Ok(PropertyHandle::new(index)),
                None => Err(Error::PropertyTypeMismatch(
                    "property exists with a different type",
                )),
            };
        }
        let index = self.slots.len();
        self.slots.push(Some(Box::new(Slot {
            name: name.to_string(),
            default: default.clone(),
            data: vec![default; self.len],
        })));
        self.names.insert(name.to_string(), index);
        Ok(PropertyHandle::new(index))
    }

    /// Returns the handle for `name` if it exists and has type `T`.
    pub fn get<T: TPropData>(&self, name: &str) -> Option<PropertyHandle<T>> {
        let &index = self.names.get(name)?;
        self.slots[index]
            .as_ref()?
            .as_any()
            .downcast_ref::<Slot<T>>()?;
        Some(PropertyHandle::new(index))
    }

    pub fn has(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Names of all live properties, in slot order.
    pub fn property_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .flatten()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Invalidates `handle`; subsequent access fails with
    /// [`Error::PropertyDoesNotExist`].
    pub fn remove<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> Result<(), Error> {
        let slot = self
            .slots
            .get_mut(handle.index)
            .ok_or(Error::PropertyDoesNotExist("unknown property handle"))?;
        match slot.take() {
            Some(_) => {
                self.names.retain(|_, &mut i| i != handle.index);
                Ok(())
            }
            None => Err(Error::PropertyDoesNotExist("property already removed")),
        }
    }

    /// Reserves capacity for at least `n` elements total in every
    /// slot, without changing `len`. Mirrors `std::vector::reserve`'s
    /// total-capacity semantics rather than `Vec::reserve`'s
    /// additional-capacity ones, since `n` here is meant as the
    /// expected final element count (spec.md's ported
    /// `surface_mesh.cpp::reserve`).
    pub fn reserve(&mut self, n: usize) {
        let additional = n.saturating_sub(self.len);
        for slot in self.slots.iter_mut().flatten() {
            slot.reserve(additional);
        }
    }

    /// Grows every slot to length `n`, filling with each slot's own
    /// default value.
    pub fn resize(&mut self, n: usize) {
        for slot in self.slots.iter_mut().flatten() {
            slot.resize(n);
        }
        self.len = n;
    }

    /// Grows every slot by one element.
    pub fn push(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.push();
        }
        self.len += 1;
    }

    /// Swaps index `i` with index `j` in every slot. Used by
    /// compaction (spec.md §4.5 `garbage_collection`).
    pub fn swap(&mut self, i: usize, j: usize) {
        for slot in self.slots.iter_mut().flatten() {
            slot.swap(i, j);
        }
    }

    pub fn value<T: TPropData>(&self, handle: PropertyHandle<T>, i: u32) -> T {
        self.slot(handle).data[i as usize].clone()
    }

    pub fn set_value<T: TPropData>(&mut self, handle: PropertyHandle<T>, i: u32, value: T) {
        self.slot_mut(handle).data[i as usize] = value;
    }

    fn slot<T: TPropData>(&self, handle: PropertyHandle<T>) -> &Slot<T> {
        self.slots[handle.index]
            .as_ref()
            .expect("property handle used after removal")
            .as_any()
            .downcast_ref::<Slot<T>>()
            .expect("property handle's type does not match the slot it indexes")
    }

    fn slot_mut<T: TPropData>(&mut self, handle: PropertyHandle<T>) -> &mut Slot<T> {
        self.slots[handle.index]
            .as_mut()
            .expect("property handle used after removal")
            .as_any_mut()
            .downcast_mut::<Slot<T>>()
            .expect("property handle's type does not match the slot it indexes")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reserve_does_not_change_len_or_values() {
        let mut props = PropertyContainer::new();
        let h = props.add::<i32>("v:id", -1).unwrap();
        props.resize(2);
        props.set_value(h, 0, 7);
        props.reserve(64);
        assert_eq!(props.len(), 2);
        assert_eq!(props.value(h, 0), 7);
        assert_eq!(props.value(h, 1), -1);
    }

    #[test]
    fn add_resize_and_index() {
        let mut props = PropertyContainer::new();
        let h = props.add::<f32>("v:quality", 1.0).unwrap();
        props.resize(3);
        assert_eq!(props.value(h, 0), 1.0);
        props.set_value(h, 1, 2.5);
        assert_eq!(props.value(h, 1), 2.5);
        assert_eq!(props.value(h, 2), 1.0);
    }

    #[test]
    fn get_returns_existing_handle_for_same_type() {
        let mut props = PropertyContainer::new();
        let h1 = props.add::<i32>("v:id", -1).unwrap();
        let h2 = props.add::<i32>("v:id", -1).unwrap();
        assert_eq!(h1.index, h2.index);
        assert!(props.get::<i32>("v:id").is_some());
        assert!(props.get::<f32>("v:id").is_none());
    }

    #[test]
    fn add_with_different_type_fails() {
        let mut props = PropertyContainer::new();
        props.add::<i32>("v:flag", 0).unwrap();
        assert!(matches!(
            props.add::<bool>("v:flag", false),
            Err(Error::PropertyTypeMismatch(_))
        ));
    }

    #[test]
    fn swap_moves_values_across_every_slot() {
        let mut props = PropertyContainer::new();
        let a = props.add::<i32>("v:a", 0).unwrap();
        let b = props.add::<i32>("v:b", 0).unwrap();
        props.resize(2);
        props.set_value(a, 0, 10);
        props.set_value(a, 1, 20);
        props.set_value(b, 0, 100);
        props.set_value(b, 1, 200);
        props.swap(0, 1);
        assert_eq!(props.value(a, 0), 20);
        assert_eq!(props.value(a, 1), 10);
        assert_eq!(props.value(b, 0), 200);
        assert_eq!(props.value(b, 1), 100);
    }

    #[test]
    fn remove_invalidates_name_lookup() {
        let mut props = PropertyContainer::new();
        let h = props.add::<i32>("v:tmp", 0).unwrap();
        props.remove(h).unwrap();
        assert!(!props.has("v:tmp"));
        assert!(props.get::<i32>("v:tmp").is_none());
    }
}
