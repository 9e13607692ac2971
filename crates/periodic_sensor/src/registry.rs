//! Generation-checked handle registry
//!
//! 句柄 = (slab 索引, 代数)。销毁后槽位可以复用，但代数不同，
//! 旧句柄因此无法再解析到新实例。

use contracts::SensorHandle;
use slab::Slab;

use crate::error::{Result, SensorError};

struct Slot<T> {
    generation: u32,
    value: T,
}

/// Maps opaque [`SensorHandle`]s to live instances.
///
/// `resolve` succeeds only for handles issued by `insert_with` and not yet
/// passed to `unregister`.
pub struct HandleRegistry<T> {
    slots: Slab<Slot<T>>,
    next_generation: u32,
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: Slab::new(),
            next_generation: 1,
        }
    }

    /// Register a value built from its own handle.
    ///
    /// The handle is reserved before `build` runs so the value can capture it
    /// (push handlers and timer expiry handlers need it). If `build` fails the
    /// slot stays vacant and the generation is not consumed.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` instances are alive at once.
    pub fn insert_with<E>(
        &mut self,
        build: impl FnOnce(SensorHandle) -> std::result::Result<T, E>,
    ) -> std::result::Result<SensorHandle, E> {
        let generation = self.next_generation;
        let entry = self.slots.vacant_entry();
        let index = u32::try_from(entry.key()).expect("sensor registry index space exhausted");
        let handle = SensorHandle::from_parts(index, generation);

        let value = build(handle)?;
        entry.insert(Slot { generation, value });

        // Generation 0 is never issued
        self.next_generation = match generation.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        Ok(handle)
    }

    /// Register a value that does not need its handle
    pub fn register(&mut self, value: T) -> SensorHandle {
        match self.insert_with(|_| Ok::<T, std::convert::Infallible>(value)) {
            Ok(handle) => handle,
            Err(never) => match never {},
        }
    }

    /// Look up a live instance
    pub fn resolve(&self, handle: SensorHandle) -> Result<&T> {
        match self.slots.get(handle.index() as usize) {
            Some(slot) if slot.generation == handle.generation() => Ok(&slot.value),
            _ => Err(SensorError::NotFound(handle)),
        }
    }

    /// Look up a live instance mutably
    pub fn resolve_mut(&mut self, handle: SensorHandle) -> Result<&mut T> {
        match self.slots.get_mut(handle.index() as usize) {
            Some(slot) if slot.generation == handle.generation() => Ok(&mut slot.value),
            _ => Err(SensorError::NotFound(handle)),
        }
    }

    /// Invalidate a handle and hand the instance back to the caller.
    ///
    /// Returns `None` for stale or unknown handles.
    pub fn unregister(&mut self, handle: SensorHandle) -> Option<T> {
        let index = handle.index() as usize;
        match self.slots.get(index) {
            Some(slot) if slot.generation == handle.generation() => {
                Some(self.slots.remove(index).value)
            }
            _ => None,
        }
    }

    pub fn contains(&self, handle: SensorHandle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Handles of every live instance, in slot order
    pub fn handles(&self) -> Vec<SensorHandle> {
        self.slots
            .iter()
            .map(|(index, slot)| SensorHandle::from_parts(index as u32, slot.generation))
            .collect()
    }

    /// Iterate live instances with their handles
    pub fn iter(&self) -> impl Iterator<Item = (SensorHandle, &T)> {
        self.slots.iter().map(|(index, slot)| {
            (
                SensorHandle::from_parts(index as u32, slot.generation),
                &slot.value,
            )
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
