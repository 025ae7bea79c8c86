//! Window manager and its owning-thread main loop
//!
//! The [`WindowManager`] owns the platform windowing system, so it lives on
//! the thread that created it: window creation, destruction and the event
//! pump all happen there. Everything other threads may touch is reachable
//! through a cloneable [`ManagerHandle`].
//!
//! Each main-loop iteration:
//! 1. drains the update queue, routing every request to a group render loop
//!    or drawing ungrouped windows directly,
//! 2. pumps native events according to the wait timeout and delivers them,
//! 3. destroys windows that were asked to close.
//!
//! The loop ends once no window is left open.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::ConfigError;
use crate::core::{GroupId, ManagerConfig, WaitPolicy, WindowId};
use crate::foundation::logging;
use crate::events::{Event, EventKind, InputMode};
use crate::group::{GroupRegistry, WindowGroup};
use crate::sync::SharedMutexPool;
use crate::update_queue::UpdateQueue;
use crate::window::{NativeHandle, SystemEvent, Window, WindowDescriptor, WindowError, WindowRegistry, WindowSystem};

/// Window manager errors
#[derive(thiserror::Error, Debug)]
pub enum ManagerError {
    /// Windowing system error
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A group render thread could not be started
    #[error("Failed to spawn render thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// No live window has this identifier
    #[error("Unknown window {0}")]
    UnknownWindow(WindowId),

    /// No live group has this identifier
    #[error("Unknown window group {0}")]
    UnknownGroup(GroupId),
}

/// Thread-safe access to the manager's shared state
///
/// Cheap to clone; hand it to event handlers, drawables and other threads.
#[derive(Clone)]
pub struct ManagerHandle {
    windows: Arc<WindowRegistry>,
    groups: Arc<GroupRegistry>,
    updates: Arc<UpdateQueue>,
    wait_timeout: Arc<AtomicU64>,
}

impl ManagerHandle {
    fn new(wait_policy: WaitPolicy) -> Self {
        let mutexes = Arc::new(SharedMutexPool::new());
        let windows = Arc::new(WindowRegistry::new(mutexes));
        let updates = Arc::new(UpdateQueue::new());
        let groups = Arc::new(GroupRegistry::new(Arc::clone(&windows), Arc::clone(&updates)));
        Self {
            windows,
            groups,
            updates,
            wait_timeout: Arc::new(AtomicU64::new(wait_policy.as_timeout().to_bits())),
        }
    }

    /// Registry of live windows
    pub const fn windows(&self) -> &Arc<WindowRegistry> {
        &self.windows
    }

    /// Registry of window groups
    pub const fn groups(&self) -> &Arc<GroupRegistry> {
        &self.groups
    }

    /// Queue of pending redraw requests
    pub const fn updates(&self) -> &Arc<UpdateQueue> {
        &self.updates
    }

    /// Get a live window
    pub fn window(&self, id: WindowId) -> Option<Arc<Window>> {
        self.windows.get(id)
    }

    /// Get a live group
    pub fn group(&self, id: GroupId) -> Option<Arc<WindowGroup>> {
        self.groups.get(id)
    }

    /// Group a window is attached to, or [`GroupId::NONE`]
    pub fn group_of(&self, window: WindowId) -> GroupId {
        self.groups.group_of(window)
    }

    /// Attach a window to a group, moving it out of its previous group
    pub fn attach(&self, group: GroupId, window: WindowId) -> bool {
        self.groups.attach(group, window)
    }

    /// Detach a window from a group
    pub fn detach(&self, group: GroupId, window: WindowId) -> bool {
        self.groups.detach(group, window)
    }

    /// Ask the owning thread to redraw `window` of `group` and wake it
    ///
    /// Sentinels are accepted: `(GroupId::ALL, WindowId::ALL)` redraws
    /// everything, `(GroupId::ANY, id)` finds the window's group.
    pub fn notify(&self, group: GroupId, window: WindowId) {
        self.updates.notify(group, window);
    }

    /// Schedule a redraw of `window` after it handled an event
    ///
    /// A window in a concurrently running group is handed to the group's
    /// render thread; otherwise the redraw waits in the update queue for the
    /// owning thread's next drain, without waking it.
    pub fn schedule_redraw(&self, window: WindowId) {
        let group_id = self.groups.group_of(window);
        match self.groups.get(group_id) {
            Some(group) if group.is_running_concurrently() => {
                group.set_window_to_update(window);
                group.process();
            }
            _ => self.updates.set_to_update(group_id, window),
        }
    }

    /// Seconds the owning thread blocks waiting for events
    ///
    /// `0` means polling, infinity means waiting without a timeout.
    pub fn wait_timeout(&self) -> f64 {
        f64::from_bits(self.wait_timeout.load(Ordering::Acquire))
    }

    /// Change how long the owning thread blocks waiting for events
    ///
    /// Negative values mean polling, NaN means waiting forever. Switching to
    /// polling requests a full redraw and wakes the owning thread so it
    /// starts right away.
    pub fn set_wait_timeout(&self, seconds: f64) {
        let seconds = if seconds.is_nan() { f64::INFINITY } else { seconds.max(0.0) };
        self.wait_timeout.store(seconds.to_bits(), Ordering::Release);
        if seconds == 0.0 {
            self.updates.notify(GroupId::ALL, WindowId::ALL);
        }
    }

    /// Switch the owning thread between polling and waiting
    pub fn set_poll(&self, poll: bool) {
        self.set_wait_timeout(if poll { 0.0 } else { f64::INFINITY });
    }

    /// Whether the owning thread polls for events
    pub fn is_polling(&self) -> bool {
        self.wait_timeout() == 0.0
    }

    /// Current wait policy
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::from_timeout(self.wait_timeout())
    }

    /// Apply a wait policy
    pub fn set_wait_policy(&self, policy: WaitPolicy) {
        self.set_wait_timeout(policy.as_timeout());
    }
}

/// Owner of the windowing system and driver of the main loop
pub struct WindowManager<S: WindowSystem> {
    system: S,
    handle: ManagerHandle,
    config: ManagerConfig,
    terminated: bool,
}

impl<S: WindowSystem> WindowManager<S> {
    /// Create a manager with the default configuration
    pub fn new(system: S) -> Self {
        let config = ManagerConfig::default();
        let handle = ManagerHandle::new(config.wait_policy);
        handle.updates.set_waker(system.waker());
        Self {
            system,
            handle,
            config,
            terminated: false,
        }
    }

    /// Create a manager from a validated configuration
    ///
    /// A configured log filter installs the logger unless one is already set.
    pub fn with_config(system: S, config: ManagerConfig) -> Result<Self, ManagerError> {
        config.validate()?;
        if let Some(filter) = config.log_filter.as_deref() {
            if !logging::init_with_filter(filter) {
                debug!("Logger already installed; ignoring configured filter \"{filter}\"");
            }
        }
        let mut manager = Self::new(system);
        manager.handle.set_wait_policy(config.wait_policy);
        manager.config = config;
        Ok(manager)
    }

    /// Thread-safe handle to the shared state
    pub const fn handle(&self) -> &ManagerHandle {
        &self.handle
    }

    /// Active configuration
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The windowing system
    pub const fn system(&self) -> &S {
        &self.system
    }

    /// The windowing system, mutably
    pub fn system_mut(&mut self) -> &mut S {
        &mut self.system
    }

    /// Descriptor built from the configured window defaults
    pub fn default_descriptor(&self) -> WindowDescriptor {
        WindowDescriptor::from(&self.config.window)
    }

    /// Create a window
    ///
    /// With `share` the new window shares that window's context and lock.
    /// An unknown `share` window is ignored.
    pub fn create_window(
        &mut self,
        descriptor: &WindowDescriptor,
        share: Option<WindowId>,
    ) -> Result<Arc<Window>, ManagerError> {
        let share_window = share.and_then(|id| {
            let window = self.handle.windows.get(id);
            if window.is_none() {
                warn!("Cannot share context with unknown window {id}; creating an unshared one");
            }
            window
        });
        let window = self
            .handle
            .windows
            .create(&mut self.system, descriptor, share_window.as_deref())?;

        if let Some(interval) = self.config.swap_interval {
            let _context = window.make_context_current();
            self.system.set_swap_interval(interval);
        }
        Ok(window)
    }

    /// Create a window from the configured defaults
    pub fn create_default_window(&mut self) -> Result<Arc<Window>, ManagerError> {
        let descriptor = self.default_descriptor();
        self.create_window(&descriptor, None)
    }

    /// Destroy a window, detaching it from its group first
    ///
    /// Returns false if no such window exists.
    pub fn destroy_window(&mut self, id: WindowId) -> bool {
        let group = self.handle.groups.group_of(id);
        self.handle.groups.detach(group, id);
        self.handle.windows.destroy(&mut self.system, id)
    }

    /// Create an empty group
    pub fn create_group(&mut self) -> Arc<WindowGroup> {
        self.handle.groups.create()
    }

    /// Destroy a group, stopping its render thread first
    pub fn destroy_group(&mut self, id: GroupId) -> bool {
        self.handle.groups.destroy(id)
    }

    /// Start a group's render thread
    pub fn run_group_concurrently(&self, id: GroupId) -> Result<(), ManagerError> {
        let group = self.handle.groups.get(id).ok_or(ManagerError::UnknownGroup(id))?;
        group.run_concurrently()?;
        Ok(())
    }

    /// Attach a window to a group
    pub fn attach(&self, group: GroupId, window: WindowId) -> bool {
        self.handle.attach(group, window)
    }

    /// Detach a window from a group
    pub fn detach(&self, group: GroupId, window: WindowId) -> bool {
        self.handle.detach(group, window)
    }

    /// Run the main loop until no window is left open
    ///
    /// Everything is redrawn once on entry. Returns immediately if there are
    /// no windows at all.
    pub fn main_loop(&mut self) {
        if self.handle.windows.is_empty() {
            warn!("Main loop started without any window; nothing to do");
            return;
        }
        info!("Main loop started with {} window(s)", self.handle.windows.len());
        self.handle.updates.set_to_update(GroupId::ALL, WindowId::ALL);
        while self.run_iteration() {}
        info!("Main loop finished: no open windows left");
    }

    /// Run one main-loop iteration; returns whether any window is still open
    pub fn run_iteration(&mut self) -> bool {
        self.process_updates();
        self.pump_events();
        self.close_windows();
        self.handle.windows.any_open()
    }

    /// Drain the update queue and route every request
    pub fn process_updates(&mut self) {
        let windows = &self.handle.windows;
        let groups = &self.handle.groups;

        while let Some(request) = self.handle.updates.pop() {
            if request.group == GroupId::ALL {
                for id in groups.all_ids() {
                    if let Some(group) = groups.get(id) {
                        group.set_window_to_update(WindowId::WHOLE_GROUP);
                        group.process();
                    }
                }
                let mut ungrouped: Vec<_> = groups.ungrouped_windows().into_iter().collect();
                ungrouped.sort_unstable();
                for id in ungrouped {
                    if let Some(window) = windows.get(id) {
                        window.render();
                    }
                }
            } else if let Some(group) = groups.get(request.group) {
                for id in request.windows {
                    group.set_window_to_update(id);
                }
                group.process();
            } else {
                let mut touched = HashSet::new();
                for id in request.windows {
                    let group_id = groups.group_of(id);
                    if let Some(group) = groups.get(group_id) {
                        group.set_window_to_update(id);
                        touched.insert(group_id);
                    } else if let Some(window) = windows.get(id) {
                        window.render();
                    }
                }
                for group_id in touched {
                    if let Some(group) = groups.get(group_id) {
                        group.process();
                    }
                }
            }
        }
    }

    /// Collect native events according to the wait timeout and deliver them
    ///
    /// When polling, everything is marked for redraw on the next drain.
    pub fn pump_events(&mut self) {
        let timeout = self.handle.wait_timeout();
        let events = if timeout <= 0.0 {
            let events = self.system.poll_events();
            self.handle.updates.set_to_update(GroupId::ALL, WindowId::ALL);
            events
        } else if timeout.is_infinite() {
            self.system.wait_events()
        } else {
            self.system.wait_events_timeout(timeout)
        };

        for event in events {
            self.deliver(event);
        }
    }

    /// Deliver one native event to its window
    ///
    /// A close request sets the window's close flag before handlers run, so
    /// a handler may veto it. Any other event schedules a redraw of the
    /// window afterwards.
    pub fn deliver(&mut self, event: SystemEvent) {
        let SystemEvent { handle, kind } = event;
        let Some(window) = self.lookup(handle) else {
            warn!("{:?} event for unregistered native window {}; discarded", kind.event_type(), handle);
            return;
        };

        let closing = matches!(kind, EventKind::WindowClose);
        if closing {
            window.set_should_close(true);
        }
        let event = Event::new(window.id(), kind);
        {
            let _context = window.make_context_current();
            window.handle_event(&event);
        }
        if !closing {
            self.handle.schedule_redraw(window.id());
        }
    }

    /// Detach and destroy every window that was asked to close
    pub fn close_windows(&mut self) {
        let mut closing: Vec<_> = self.handle.windows.windows_to_close().into_iter().collect();
        closing.sort_unstable();
        for id in closing {
            debug!("Closing window {id}");
            self.destroy_window(id);
        }
    }

    /// Destroy every group and then every window
    ///
    /// Also run on drop. Calling it again does nothing.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.handle.groups.destroy_all();
        self.handle.windows.destroy_all(&mut self.system);
        self.handle.updates.clear();
        info!("Window manager terminated");
    }

    fn lookup(&self, handle: NativeHandle) -> Option<Arc<Window>> {
        let id = self.handle.windows.window_id(handle);
        if id.is_sentinel() {
            return None;
        }
        self.handle.windows.get(id)
    }

    fn live_window(&self, id: WindowId) -> Result<Arc<Window>, ManagerError> {
        self.handle.windows.get(id).ok_or(ManagerError::UnknownWindow(id))
    }

    /// Size of a window's content area
    pub fn window_size(&self, id: WindowId) -> Result<(i32, i32), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.size(window.native_handle())?)
    }

    /// Resize a window's content area
    pub fn set_window_size(&mut self, id: WindowId, width: i32, height: i32) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.set_size(window.native_handle(), width, height)?)
    }

    /// Position of a window
    pub fn window_position(&self, id: WindowId) -> Result<(i32, i32), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.position(window.native_handle())?)
    }

    /// Move a window
    pub fn set_window_position(&mut self, id: WindowId, x: i32, y: i32) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.set_position(window.native_handle(), x, y)?)
    }

    /// Size of a window's framebuffer in pixels
    pub fn framebuffer_size(&self, id: WindowId) -> Result<(i32, i32), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.framebuffer_size(window.native_handle())?)
    }

    /// Change a window's title
    pub fn set_window_title(&mut self, id: WindowId, title: &str) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.set_title(window.native_handle(), title)?)
    }

    /// Show or hide a window
    pub fn set_window_visible(&mut self, id: WindowId, visible: bool) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.set_visible(window.native_handle(), visible)?)
    }

    /// Minimize a window
    pub fn iconify_window(&mut self, id: WindowId) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.iconify(window.native_handle())?)
    }

    /// Restore a minimized or maximized window
    pub fn restore_window(&mut self, id: WindowId) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.restore(window.native_handle())?)
    }

    /// Cursor position over a window
    pub fn cursor_position(&self, id: WindowId) -> Result<(f64, f64), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.cursor_position(window.native_handle())?)
    }

    /// Warp the cursor over a window
    pub fn set_cursor_position(&mut self, id: WindowId, x: f64, y: f64) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.set_cursor_position(window.native_handle(), x, y)?)
    }

    /// Change an input mode of a window
    pub fn set_input_mode(&mut self, id: WindowId, mode: InputMode) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.set_input_mode(window.native_handle(), mode)?)
    }

    /// System clipboard contents
    pub fn clipboard(&self, id: WindowId) -> Result<Option<String>, ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.clipboard(window.native_handle())?)
    }

    /// Replace the system clipboard contents
    pub fn set_clipboard(&mut self, id: WindowId, text: &str) -> Result<(), ManagerError> {
        let window = self.live_window(id)?;
        let _slot = window.lock();
        Ok(self.system.set_clipboard(window.native_handle(), text)?)
    }
}

impl<S: WindowSystem> Drop for WindowManager<S> {
    fn drop(&mut self) {
        self.terminate();
    }
}
