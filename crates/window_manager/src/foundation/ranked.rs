//! Rank-ordered lists of shared objects
//!
//! Windows keep their event handlers and drawables in a [`RankedList`]:
//! ascending by rank, insertion order among equal ranks, and each object
//! present at most once. Objects are identified by the address of their
//! shared allocation, so binding the same `Arc` again moves it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Rank deciding the position of an object in a [`RankedList`]
pub type Rank = i32;

type Position = (Rank, u64);

/// Ordered list of shared objects with O(log n) rebind and unbind
pub struct RankedList<T: ?Sized> {
    order: BTreeMap<Position, Arc<T>>,
    positions: HashMap<usize, Position>,
    next_sequence: u64,
}

fn identity<T: ?Sized>(object: &Arc<T>) -> usize {
    Arc::as_ptr(object).cast::<()>() as usize
}

impl<T: ?Sized> RankedList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            positions: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Bind `object` with `rank`, moving it if it is already bound
    pub fn bind(&mut self, object: Arc<T>, rank: Rank) {
        let key = identity(&object);
        if let Some(old) = self.positions.remove(&key) {
            self.order.remove(&old);
        }
        let position = (rank, self.next_sequence);
        self.next_sequence += 1;
        self.positions.insert(key, position);
        self.order.insert(position, object);
    }

    /// Remove `object`; returns false if it was not bound
    pub fn unbind(&mut self, object: &Arc<T>) -> bool {
        match self.positions.remove(&identity(object)) {
            Some(position) => {
                self.order.remove(&position);
                true
            }
            None => false,
        }
    }

    /// Whether `object` is bound
    pub fn contains(&self, object: &Arc<T>) -> bool {
        self.positions.contains_key(&identity(object))
    }

    /// Rank `object` is bound with
    pub fn rank_of(&self, object: &Arc<T>) -> Option<Rank> {
        self.positions.get(&identity(object)).map(|(rank, _)| *rank)
    }

    /// Iterate in invocation order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
        self.order.values()
    }

    /// Clone the handles out in invocation order
    ///
    /// Callers invoke user code on the snapshot, so a handler may rebind
    /// objects on its own window while it runs.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.order.values().cloned().collect()
    }

    /// Number of bound objects
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<T: ?Sized> Default for RankedList<T> {
    fn default() -> Self {
        Self::new()
    }
}
