//! Window groups and their render loops
//!
//! A group is a set of windows redrawn together. Redraws are either run
//! inline by whoever calls [`WindowGroup::process`], or, once the group runs
//! concurrently, by a dedicated render thread that sleeps until there is work.
//!
//! Pending windows that are not attached to the group are not dropped: a
//! redraw pass forwards them to the owning thread's update queue so they
//! reach whatever group they belong to now.

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info, trace, warn};
use parking_lot::{Condvar, Mutex};

use crate::core::{GroupId, WindowId};
use crate::update_queue::UpdateQueue;
use crate::window::WindowRegistry;

#[derive(Default)]
struct LoopState {
    attached: HashSet<WindowId>,
    pending: HashSet<WindowId>,
}

struct LoopShared {
    id: GroupId,
    state: Mutex<LoopState>,
    wake: Condvar,
    poll: AtomicBool,
    running: AtomicBool,
    windows: Arc<WindowRegistry>,
    updates: Arc<UpdateQueue>,
}

impl LoopShared {
    /// Wake the render thread
    ///
    /// Taking the state lock first orders the wake-up after any change the
    /// sleeper's predicate reads, so it cannot be lost.
    fn notify(&self) {
        let _state = self.state.lock();
        self.wake.notify_one();
    }

    fn wait_for_work(&self) {
        let mut state = self.state.lock();
        while self.running.load(Ordering::Acquire) && !self.poll.load(Ordering::Acquire) && state.pending.is_empty() {
            self.wake.wait(&mut state);
        }
    }

    /// One redraw pass
    ///
    /// Drawing happens after the group lock is released, so attaching,
    /// detaching and marking windows never waits on a slow drawable.
    fn update_windows(&self) {
        let (mut targets, forwarded): (Vec<WindowId>, Vec<WindowId>) = {
            let mut state = self.state.lock();
            let pending = std::mem::take(&mut state.pending);
            if self.poll.load(Ordering::Acquire)
                || pending.contains(&WindowId::WHOLE_GROUP)
                || pending.contains(&WindowId::ALL)
            {
                (state.attached.iter().copied().collect(), Vec::new())
            } else {
                pending.into_iter().partition(|id| state.attached.contains(id))
            }
        };

        for id in forwarded {
            trace!("Group {} forwarding window {} to the owning thread", self.id, id);
            self.updates.notify(GroupId::ANY, id);
        }

        targets.sort_unstable();
        for id in targets {
            if let Some(window) = self.windows.get(id) {
                window.render();
            }
        }
    }

    fn run(&self) {
        info!("Window group {} render loop started", self.id);
        while self.running.load(Ordering::Acquire) {
            self.wait_for_work();
            if !self.running.load(Ordering::Acquire) {
                break;
            }
            self.update_windows();
        }
        info!("Window group {} render loop stopped", self.id);
    }
}

/// A set of windows redrawn together
pub struct WindowGroup {
    shared: Arc<LoopShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl WindowGroup {
    pub(crate) fn new(id: GroupId, windows: Arc<WindowRegistry>, updates: Arc<UpdateQueue>) -> Self {
        Self {
            shared: Arc::new(LoopShared {
                id,
                state: Mutex::new(LoopState::default()),
                wake: Condvar::new(),
                poll: AtomicBool::new(false),
                running: AtomicBool::new(false),
                windows,
                updates,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Identifier of this group
    pub fn id(&self) -> GroupId {
        self.shared.id
    }

    pub(crate) fn attach_window(&self, window: WindowId) {
        self.shared.state.lock().attached.insert(window);
    }

    pub(crate) fn detach_window(&self, window: WindowId) -> bool {
        self.shared.state.lock().attached.remove(&window)
    }

    pub(crate) fn detach_all(&self) -> HashSet<WindowId> {
        std::mem::take(&mut self.shared.state.lock().attached)
    }

    /// Whether `window` is attached to this group
    pub fn contains(&self, window: WindowId) -> bool {
        self.shared.state.lock().attached.contains(&window)
    }

    /// Windows attached to this group
    pub fn attached_windows(&self) -> HashSet<WindowId> {
        self.shared.state.lock().attached.clone()
    }

    /// Whether no window is attached
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().attached.is_empty()
    }

    /// Windows marked for the next redraw pass
    pub fn pending_windows(&self) -> HashSet<WindowId> {
        self.shared.state.lock().pending.clone()
    }

    /// Mark a window for the next redraw pass
    ///
    /// [`WindowId::WHOLE_GROUP`] or [`WindowId::ALL`] redraw every attached
    /// window. Windows that are not attached are forwarded by the pass.
    pub fn set_window_to_update(&self, window: WindowId) {
        self.shared.state.lock().pending.insert(window);
    }

    /// Run a redraw pass now, or wake the render thread to run it
    ///
    /// A polling render thread needs no wake-up.
    pub fn process(&self) {
        if self.is_running_concurrently() {
            if !self.is_polling() {
                self.shared.notify();
            }
        } else {
            self.shared.update_windows();
        }
    }

    /// Redraw every attached window on every pass instead of only pending ones
    ///
    /// Switching a concurrent group to polling wakes its render thread so
    /// it starts spinning right away.
    pub fn set_poll(&self, poll: bool) {
        let was_polling = self.shared.poll.swap(poll, Ordering::AcqRel);
        if poll && !was_polling {
            self.shared.notify();
        }
    }

    /// Whether the group redraws continuously
    pub fn is_polling(&self) -> bool {
        self.shared.poll.load(Ordering::Acquire)
    }

    /// Start the group's render thread
    ///
    /// Does nothing if the thread is already running. A thread that was
    /// stopped but not joined yet is joined before the new one starts.
    pub fn run_concurrently(&self) -> io::Result<()> {
        let stale = {
            let mut worker = self.worker.lock();
            if let Some(handle) = worker.as_ref() {
                if self.shared.running.load(Ordering::Acquire) && !handle.is_finished() {
                    return Ok(());
                }
            }
            worker.take()
        };
        if let Some(stale) = stale {
            self.shared.running.store(false, Ordering::Release);
            self.shared.notify();
            Self::join_worker(self.id(), stale);
        }

        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }
        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("window-group-{}", self.id()))
            .spawn(move || shared.run());
        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                error!("Failed to spawn render thread for window group {}: {}", self.id(), err);
                Err(err)
            }
        }
    }

    /// Whether the render thread is running
    pub fn is_running_concurrently(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
            && self.worker.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Ask the render thread to exit after its current pass
    ///
    /// Windows still pending stay pending; the next [`WindowGroup::process`]
    /// draws them inline.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        self.shared.notify();
    }

    /// Stop the render thread and wait for it to exit
    ///
    /// Called from the render thread itself, this only stops it.
    pub fn stop_and_join(&self) {
        self.stop();
        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            warn!("Window group {} stopped from its own render thread; not joining", self.id());
            return;
        }
        Self::join_worker(self.id(), handle);
    }

    fn join_worker(id: GroupId, handle: JoinHandle<()>) {
        if handle.join().is_err() {
            error!("Render thread of window group {id} panicked");
        }
    }
}

impl Drop for WindowGroup {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl std::fmt::Debug for WindowGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowGroup")
            .field("id", &self.id())
            .field("attached", &self.attached_windows())
            .field("polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}
