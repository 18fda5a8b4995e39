use std::marker::PhantomData;

use crate::error::{StageError, StageResult};

/// Index into a [`Pool`], typed so handles for different pools cannot be
/// mixed up, and paired with a generation so a reused slot invalidates every
/// handle that pointed at its previous occupant.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

// Manual impls: derives would bound on `T`, which a handle never contains.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Fixed-capacity slot array. Capacity is set at construction and never
/// grows; a full pool refuses further inserts with `PoolExhausted`.
pub struct Pool<T> {
    name: &'static str,
    slots: Vec<Slot<T>>,
}

impl<T> Pool<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot {
            generation: 0,
            value: None,
        });
        Self { name, slots }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Count of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    /// True iff no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.value.is_none())
    }

    /// Place `value` in a free slot and return its handle.
    ///
    /// Scans from the end; under an append-heavy workload the free region
    /// stays near the tail.
    pub fn insert(&mut self, value: T) -> StageResult<Handle<T>> {
        for index in (0..self.slots.len()).rev() {
            if self.slots[index].value.is_none() {
                self.slots[index].value = Some(value);
                return Ok(Handle {
                    index: index as u32,
                    generation: self.slots[index].generation,
                    _marker: PhantomData,
                });
            }
        }
        Err(StageError::PoolExhausted {
            pool: self.name,
            capacity: self.slots.len(),
        })
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.value.is_some())
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.slot(handle).is_some()
    }

    pub fn get(&self, handle: Handle<T>) -> StageResult<&T> {
        self.slot(handle)
            .and_then(|s| s.value.as_ref())
            .ok_or(StageError::InvalidHandle {
                pool: self.name,
                index: handle.index as usize,
            })
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> StageResult<&mut T> {
        let name = self.name;
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
            .ok_or(StageError::InvalidHandle {
                pool: name,
                index: handle.index as usize,
            })
    }

    /// Clear the slot and return its value. Idempotent: a vacant or stale
    /// handle returns `None`. Releasing bumps the generation, so every
    /// outstanding handle to the slot goes stale.
    pub fn release(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(value)
    }

    /// Iterate over occupied entries.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_release_restores_occupancy() {
        let mut pool = Pool::new("test", 4);
        assert!(pool.is_empty());
        let h = pool.insert(7).unwrap();
        assert!(!pool.is_empty());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.release(h), Some(7));
        assert!(pool.is_empty());
    }

    #[test]
    fn exhaustion_and_recovery() {
        let mut pool = Pool::new("test", 3);
        let handles: Vec<_> = (0..3).map(|i| pool.insert(i).unwrap()).collect();
        let err = pool.insert(99).unwrap_err();
        assert!(matches!(
            err,
            StageError::PoolExhausted {
                pool: "test",
                capacity: 3
            }
        ));

        pool.release(handles[1]);
        assert!(pool.insert(99).is_ok());
    }

    #[test]
    fn get_after_release_is_invalid() {
        let mut pool = Pool::new("test", 2);
        let h = pool.insert("a").unwrap();
        pool.release(h);
        assert!(matches!(pool.get(h), Err(StageError::InvalidHandle { .. })));
        assert!(matches!(
            pool.get_mut(h),
            Err(StageError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn stale_handle_does_not_see_reused_slot() {
        let mut pool = Pool::new("test", 1);
        let old = pool.insert("first").unwrap();
        pool.release(old);
        let new = pool.insert("second").unwrap();
        assert_eq!(old.index(), new.index());

        // same slot, but the stale handle must not resolve to the new value
        assert!(pool.get(old).is_err());
        assert_eq!(*pool.get(new).unwrap(), "second");
        assert!(pool.release(old).is_none());
        assert!(pool.contains(new));
    }

    #[test]
    fn release_is_idempotent() {
        let mut pool = Pool::new("test", 2);
        let h = pool.insert(1).unwrap();
        assert_eq!(pool.release(h), Some(1));
        assert_eq!(pool.release(h), None);
        assert_eq!(pool.release(h), None);
    }

    #[test]
    fn insert_scans_from_the_end() {
        let mut pool = Pool::new("test", 4);
        let h = pool.insert(0).unwrap();
        assert_eq!(h.index(), 3);
        let h = pool.insert(1).unwrap();
        assert_eq!(h.index(), 2);
    }

    #[test]
    fn iter_visits_occupied_only() {
        let mut pool = Pool::new("test", 4);
        let a = pool.insert(1).unwrap();
        let _b = pool.insert(2).unwrap();
        pool.release(a);
        let seen: Vec<_> = pool.iter().copied().collect();
        assert_eq!(seen, vec![2]);
    }
}
