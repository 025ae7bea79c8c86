//! Pool of reference-counted recursive locks
//!
//! Every window owns a lock that serializes everything touching its native
//! context. Windows that share a context share the same lock, so the pool
//! hands out slots with a reference count: a window either opens a fresh
//! slot or joins the slot of the window it shares with, and the slot is
//! recycled once the last member releases it.

use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use crate::core::SlotId;
use crate::foundation::IdArena;

/// Handle to a lock slot held by one window
///
/// The lock is recursive: the thread holding it may take it again, which
/// lets handlers and drawables call back into their own window.
#[derive(Clone)]
pub struct SharedMutex {
    slot: SlotId,
    lock: Arc<ReentrantMutex<()>>,
}

impl SharedMutex {
    /// Slot this handle belongs to
    pub const fn slot(&self) -> SlotId {
        self.slot
    }

    /// Take the lock, blocking until it is available
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Whether both handles guard the same lock
    pub fn same_lock(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lock, &other.lock)
    }
}

impl std::fmt::Debug for SharedMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMutex").field("slot", &self.slot).finish_non_exhaustive()
    }
}

struct Slot {
    lock: Arc<ReentrantMutex<()>>,
    holders: usize,
}

/// Reference-counted arena of recursive locks
#[derive(Default)]
pub struct SharedMutexPool {
    slots: Mutex<IdArena<SlotId, Slot>>,
}

impl SharedMutexPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new slot with one holder
    pub fn acquire_new(&self) -> SharedMutex {
        let lock = Arc::new(ReentrantMutex::new(()));
        let slot = self.slots.lock().insert(Slot {
            lock: Arc::clone(&lock),
            holders: 1,
        });
        SharedMutex { slot, lock }
    }

    /// Join an existing slot, adding a holder
    ///
    /// Returns `None` if the slot is not live.
    pub fn acquire_shared(&self, slot: SlotId) -> Option<SharedMutex> {
        let mut slots = self.slots.lock();
        let entry = slots.get_mut(slot)?;
        entry.holders += 1;
        Some(SharedMutex {
            slot,
            lock: Arc::clone(&entry.lock),
        })
    }

    /// Drop one holder of `slot`, recycling the slot when none remain
    ///
    /// Releasing a slot that is not live is ignored.
    pub fn release(&self, slot: SlotId) {
        let mut slots = self.slots.lock();
        let Some(entry) = slots.get_mut(slot) else {
            return;
        };
        entry.holders = entry.holders.saturating_sub(1);
        if entry.holders == 0 {
            slots.remove(slot);
        }
    }

    /// Number of holders of `slot`; zero if it is not live
    pub fn holders(&self, slot: SlotId) -> usize {
        self.slots.lock().get(slot).map_or(0, |entry| entry.holders)
    }

    /// Number of live slots
    pub fn live_slots(&self) -> usize {
        self.slots.lock().len()
    }
}
