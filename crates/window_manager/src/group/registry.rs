//! Registry of window groups and window membership

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::core::{GroupId, WindowId};
use crate::foundation::IdArena;
use crate::group::window_group::WindowGroup;
use crate::update_queue::UpdateQueue;
use crate::window::WindowRegistry;

#[derive(Default)]
struct GroupTable {
    groups: IdArena<GroupId, Arc<WindowGroup>>,
    membership: HashMap<WindowId, GroupId>,
}

/// Registry of window groups
///
/// Keeps the window-to-group map consistent with every group's attached
/// set: a window is in at most one group, and the map and the sets change
/// together under the registry lock. Lock order is registry, then group,
/// then window registry.
pub struct GroupRegistry {
    table: Mutex<GroupTable>,
    windows: Arc<WindowRegistry>,
    updates: Arc<UpdateQueue>,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new(windows: Arc<WindowRegistry>, updates: Arc<UpdateQueue>) -> Self {
        Self {
            table: Mutex::new(GroupTable::default()),
            windows,
            updates,
        }
    }

    /// Create an empty group
    pub fn create(&self) -> Arc<WindowGroup> {
        let mut table = self.table.lock();
        let id = table.groups.allocate();
        let group = Arc::new(WindowGroup::new(id, Arc::clone(&self.windows), Arc::clone(&self.updates)));
        table.groups.insert_at(id, Arc::clone(&group));
        debug!("Created window group {id}");
        group
    }

    /// Destroy a group
    ///
    /// Its render thread is stopped and joined first. Its windows become
    /// ungrouped. Returns false if no such group exists.
    pub fn destroy(&self, id: GroupId) -> bool {
        let Some(group) = self.get(id) else {
            return false;
        };
        group.stop_and_join();

        let mut table = self.table.lock();
        if table.groups.remove(id).is_none() {
            return false;
        }
        for window in group.detach_all() {
            table.membership.remove(&window);
        }
        debug!("Destroyed window group {id}");
        true
    }

    /// Destroy every group
    pub fn destroy_all(&self) {
        for id in self.all_ids() {
            self.destroy(id);
        }
    }

    /// Attach a window to a group, moving it out of its previous group
    ///
    /// Returns false if the group or the window does not exist.
    pub fn attach(&self, group: GroupId, window: WindowId) -> bool {
        let mut table = self.table.lock();
        let Some(target) = table.groups.get(group).cloned() else {
            return false;
        };
        if !self.windows.contains(window) {
            return false;
        }
        if let Some(previous) = table.membership.insert(window, group) {
            if previous != group {
                if let Some(previous) = table.groups.get(previous) {
                    previous.detach_window(window);
                }
            }
        }
        target.attach_window(window);
        true
    }

    /// Detach a window from a group
    ///
    /// Returns false if the window is not attached to that group.
    pub fn detach(&self, group: GroupId, window: WindowId) -> bool {
        let mut table = self.table.lock();
        let detached = table
            .groups
            .get(group)
            .is_some_and(|target| target.detach_window(window));
        if detached {
            table.membership.remove(&window);
        }
        detached
    }

    /// Group a window is attached to, or [`GroupId::NONE`]
    pub fn group_of(&self, window: WindowId) -> GroupId {
        self.table.lock().membership.get(&window).copied().unwrap_or(GroupId::NONE)
    }

    /// Get a live group
    pub fn get(&self, id: GroupId) -> Option<Arc<WindowGroup>> {
        self.table.lock().groups.get(id).cloned()
    }

    /// Identifiers of every live group
    pub fn all_ids(&self) -> HashSet<GroupId> {
        self.table.lock().groups.iter().map(|(id, _)| id).collect()
    }

    /// Number of live groups
    pub fn len(&self) -> usize {
        self.table.lock().groups.len()
    }

    /// Whether there are no live groups
    pub fn is_empty(&self) -> bool {
        self.table.lock().groups.is_empty()
    }

    /// Live windows that are not attached to any group
    pub fn ungrouped_windows(&self) -> HashSet<WindowId> {
        let table = self.table.lock();
        self.windows
            .all_ids()
            .into_iter()
            .filter(|window| !table.membership.contains_key(window))
            .collect()
    }
}
