//! Generational handles.
//!
//! A slot's generation is bumped every time it is freed, so a handle kept
//! after its mesh was closed no longer matches and resolves to nothing.

/// Opaque handle to an open mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle {
    index: u32,
    generation: u32,
}

/// Handle to a dataset group: owning mesh plus the group's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupHandle {
    pub mesh: MeshHandle,
    pub group: usize,
}

/// Handle to a dataset: owning mesh, group position and dataset position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DatasetHandle {
    pub mesh: MeshHandle,
    pub group: usize,
    pub dataset: usize,
}

impl GroupHandle {
    pub fn dataset(self, dataset: usize) -> DatasetHandle {
        DatasetHandle {
            mesh: self.mesh,
            group: self.group,
            dataset,
        }
    }
}

impl DatasetHandle {
    pub fn group_handle(self) -> GroupHandle {
        GroupHandle {
            mesh: self.mesh,
            group: self.group,
        }
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage addressed by [`MeshHandle`].
pub(crate) struct HandleArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for HandleArena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> HandleArena<T> {
    pub fn insert(&mut self, value: T) -> MeshHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return MeshHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        MeshHandle { index, generation: 1 }
    }

    fn slot(&self, handle: MeshHandle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&T> {
        self.slot(handle).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: MeshHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Take the value out and invalidate every handle to the slot.
    pub fn remove(&mut self, handle: MeshHandle) -> Option<T> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut arena = HandleArena::default();
        let a = arena.insert("a");
        assert_eq!(arena.get(a), Some(&"a"));

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);

        let b = arena.insert("b");
        assert_eq!(b.index, a.index);
        assert_ne!(b, a);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_get_mut_and_iter() {
        let mut arena = HandleArena::default();
        let a = arena.insert(1);
        let b = arena.insert(2);
        *arena.get_mut(b).unwrap() += 10;
        arena.remove(a);
        assert_eq!(arena.iter().copied().collect::<Vec<_>>(), vec![12]);
    }

    #[test]
    fn test_handle_conversions() {
        let mut arena = HandleArena::default();
        let mesh = arena.insert(());
        let group = GroupHandle { mesh, group: 2 };
        let ds = group.dataset(5);
        assert_eq!(ds.group_handle(), group);
        assert_eq!(ds.dataset, 5);
    }
}
