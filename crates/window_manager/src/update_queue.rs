//! Pending redraw requests for the owning thread
//!
//! Any thread may record that windows of a group need redrawing. The owning
//! thread drains the queue once per iteration of its main loop and routes
//! each request to the group's render loop or draws the windows itself.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::core::{GroupId, WindowId};
use crate::window::EventWaker;

/// One drained redraw request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Group the windows were recorded under; may be a sentinel
    pub group: GroupId,
    /// Windows to redraw; may contain sentinels
    pub windows: HashSet<WindowId>,
}

impl UpdateRequest {
    /// Whether this request asks for every window everywhere
    pub fn is_everything(&self) -> bool {
        self.group == GroupId::ALL && self.windows.contains(&WindowId::ALL)
    }
}

/// Map from group to the windows awaiting redraw
#[derive(Default)]
pub struct UpdateQueue {
    pending: Mutex<HashMap<GroupId, HashSet<WindowId>>>,
    waker: RwLock<Option<Arc<dyn EventWaker>>>,
}

impl UpdateQueue {
    /// Create an empty queue with no waker
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake the owning thread through `waker` on every [`UpdateQueue::notify`]
    pub fn set_waker(&self, waker: Arc<dyn EventWaker>) {
        *self.waker.write() = Some(waker);
    }

    /// Record that `window` of `group` needs redrawing
    pub fn set_to_update(&self, group: GroupId, window: WindowId) {
        self.pending.lock().entry(group).or_default().insert(window);
    }

    /// Record a redraw and wake the owning thread
    pub fn notify(&self, group: GroupId, window: WindowId) {
        self.set_to_update(group, window);
        self.wake();
    }

    /// Wake the owning thread without recording anything
    pub fn wake(&self) {
        if let Some(waker) = self.waker.read().as_ref() {
            waker.wake();
        }
    }

    /// Take one request out of the queue
    ///
    /// If any entry keyed by [`GroupId::ALL`] or [`GroupId::ANY`] asks for
    /// [`WindowId::ALL`], the whole queue is subsumed: it is cleared and a
    /// single everything-request is returned. Otherwise an arbitrary entry
    /// is removed and returned.
    pub fn pop(&self) -> Option<UpdateRequest> {
        let mut pending = self.pending.lock();
        let everything = [GroupId::ALL, GroupId::ANY]
            .iter()
            .any(|group| pending.get(group).is_some_and(|windows| windows.contains(&WindowId::ALL)));
        if everything {
            pending.clear();
            return Some(UpdateRequest {
                group: GroupId::ALL,
                windows: HashSet::from([WindowId::ALL]),
            });
        }

        let group = *pending.keys().next()?;
        let windows = pending.remove(&group)?;
        Some(UpdateRequest { group, windows })
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Drop every pending request
    pub fn clear(&self) {
        self.pending.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingWaker(AtomicUsize);

    impl EventWaker for CountingWaker {
        fn wake(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn drain(queue: &UpdateQueue) -> Vec<UpdateRequest> {
        std::iter::from_fn(|| queue.pop()).collect()
    }

    #[test]
    fn test_pop_empty() {
        assert_eq!(UpdateQueue::new().pop(), None);
    }

    #[test]
    fn test_entries_merge_per_group() {
        let queue = UpdateQueue::new();
        queue.set_to_update(GroupId::new(1), WindowId::new(3));
        queue.set_to_update(GroupId::new(1), WindowId::new(4));
        queue.set_to_update(GroupId::new(1), WindowId::new(3));

        let request = queue.pop().unwrap();
        assert_eq!(request.group, GroupId::new(1));
        assert_eq!(request.windows, HashSet::from([WindowId::new(3), WindowId::new(4)]));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_all_windows_request_subsumes_queue() {
        let queue = UpdateQueue::new();
        queue.set_to_update(GroupId::new(0), WindowId::new(1));
        queue.set_to_update(GroupId::NONE, WindowId::new(2));
        queue.set_to_update(GroupId::ALL, WindowId::ALL);

        let requests = drain(&queue);
        assert_eq!(requests.len(), 1);
        assert!(requests[0].is_everything());
    }

    #[test]
    fn test_any_group_all_windows_subsumes_queue() {
        let queue = UpdateQueue::new();
        queue.set_to_update(GroupId::new(5), WindowId::new(1));
        queue.set_to_update(GroupId::ANY, WindowId::ALL);

        let requests = drain(&queue);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].group, GroupId::ALL);
    }

    #[test]
    fn test_everything_request_wins_when_posted_first() {
        let queue = UpdateQueue::new();
        queue.notify(GroupId::ANY, WindowId::ALL);
        queue.notify(GroupId::new(2), WindowId::new(1));

        let requests = drain(&queue);
        assert_eq!(requests.len(), 1);
        assert!(requests[0].is_everything());
    }

    #[test]
    fn test_each_group_popped_once() {
        let queue = UpdateQueue::new();
        for group in 0..4 {
            queue.set_to_update(GroupId::new(group), WindowId::new(group));
        }

        let mut groups: Vec<_> = drain(&queue).into_iter().map(|r| r.group.raw()).collect();
        groups.sort_unstable();
        assert_eq!(groups, [0, 1, 2, 3]);
    }

    #[test]
    fn test_notify_wakes_owning_thread() {
        let queue = UpdateQueue::new();
        let waker = Arc::new(CountingWaker::default());
        queue.set_to_update(GroupId::ANY, WindowId::new(0));
        queue.set_waker(waker.clone());

        queue.set_to_update(GroupId::ANY, WindowId::new(1));
        assert_eq!(waker.0.load(Ordering::SeqCst), 0);
        queue.notify(GroupId::ANY, WindowId::new(2));
        assert_eq!(waker.0.load(Ordering::SeqCst), 1);
        assert_eq!(queue.pop().unwrap().windows.len(), 3);
    }
}
