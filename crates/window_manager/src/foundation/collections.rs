//! Specialized collection types

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

/// Numeric handle that can index an [`IdArena`]
pub trait ArenaId: Copy + Eq + fmt::Debug {
    /// Build the handle from a raw slot index
    fn from_index(index: usize) -> Self;

    /// Raw slot index of this handle
    fn index(self) -> usize;
}

/// Dense arena keyed by reusable numeric identifiers
///
/// Identifiers are handed out from 0 upward. Freed identifiers are kept in a
/// sorted set and the smallest one is always reused before the arena grows, so
/// identifiers stay low and reuse is deterministic.
///
/// An identifier can be booked with [`IdArena::allocate`] before its value
/// exists, then filled with [`IdArena::insert_at`]. This lets callers roll the
/// booking back with [`IdArena::free`] when building the value fails.
pub struct IdArena<I, T> {
    slots: Vec<Option<T>>,
    free: BTreeSet<usize>,
    live: usize,
    _id: PhantomData<fn() -> I>,
}

impl<I: ArenaId, T> IdArena<I, T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: BTreeSet::new(),
            live: 0,
            _id: PhantomData,
        }
    }

    /// Book an identifier: the smallest freed one, or the next unused one
    pub fn allocate(&mut self) -> I {
        let index = self.free.pop_first().unwrap_or_else(|| {
            self.slots.push(None);
            self.slots.len() - 1
        });
        I::from_index(index)
    }

    /// Return an identifier for reuse, dropping any value stored at it
    ///
    /// Freeing an identifier that is still in use elsewhere, or freeing it
    /// twice, breaks the uniqueness guarantee. Callers must not do it.
    pub fn free(&mut self, id: I) {
        let index = id.index();
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if slot.take().is_some() {
            self.live -= 1;
        }
        self.free.insert(index);
    }

    /// Store a value at a booked identifier
    ///
    /// Returns the previous value if the identifier was already filled.
    pub fn insert_at(&mut self, id: I, value: T) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        let previous = slot.replace(value);
        if previous.is_none() {
            self.live += 1;
        }
        previous
    }

    /// Book an identifier and store a value at it
    pub fn insert(&mut self, value: T) -> I {
        let id = self.allocate();
        self.insert_at(id, value);
        id
    }

    /// Remove the value at `id` and free the identifier
    pub fn remove(&mut self, id: I) -> Option<T> {
        let value = self.slots.get_mut(id.index())?.take()?;
        self.live -= 1;
        self.free.insert(id.index());
        Some(value)
    }

    /// Get the value stored at `id`
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.index())?.as_ref()
    }

    /// Get a mutable reference to the value stored at `id`
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Whether a value is stored at `id`
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over stored values with their identifiers, in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (I::from_index(index), value)))
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no value is stored
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of identifiers ever handed out and not trimmed (high-water mark)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drop every value and forget every identifier
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}

impl<I: ArenaId, T> Default for IdArena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T: fmt::Debug> fmt::Debug for IdArena<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
