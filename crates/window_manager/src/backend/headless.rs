//! In-memory windowing system
//!
//! Behaves like a native layer without touching the display: surfaces are
//! table entries, contexts count how they are used, and events are injected
//! from any thread through an [`EventInjector`]. Blocking waits park on a
//! condition variable until an event is injected or the waker fires.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use log::trace;
use parking_lot::{Condvar, Mutex};

use crate::events::{EventKind, EventType, InputMode};
use crate::window::{
    EventWaker, NativeHandle, RenderContext, Surface, SystemEvent, WindowDescriptor, WindowError, WindowResult,
    WindowSystem,
};

/// Rendering context of a headless surface
///
/// Records which thread has it current and how often it was used.
#[derive(Debug)]
pub struct HeadlessContext {
    handle: NativeHandle,
    shared_with: Option<NativeHandle>,
    current_on: Mutex<Option<ThreadId>>,
    make_current_calls: AtomicUsize,
    swaps: AtomicUsize,
    swap_threads: Mutex<Vec<ThreadId>>,
}

impl HeadlessContext {
    fn new(handle: NativeHandle, shared_with: Option<NativeHandle>) -> Self {
        Self {
            handle,
            shared_with,
            current_on: Mutex::new(None),
            make_current_calls: AtomicUsize::new(0),
            swaps: AtomicUsize::new(0),
            swap_threads: Mutex::new(Vec::new()),
        }
    }

    /// Surface the context belongs to
    pub const fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Surface whose context this one shares objects with
    pub const fn shared_with(&self) -> Option<NativeHandle> {
        self.shared_with
    }

    /// Thread the context is current on
    pub fn current_thread(&self) -> Option<ThreadId> {
        *self.current_on.lock()
    }

    /// How many times the context was made current
    pub fn make_current_calls(&self) -> usize {
        self.make_current_calls.load(Ordering::SeqCst)
    }

    /// How many frames were presented
    pub fn swap_count(&self) -> usize {
        self.swaps.load(Ordering::SeqCst)
    }

    /// Threads that presented frames, in order
    pub fn swap_threads(&self) -> Vec<ThreadId> {
        self.swap_threads.lock().clone()
    }
}

impl RenderContext for HeadlessContext {
    fn make_current(&self) {
        self.make_current_calls.fetch_add(1, Ordering::SeqCst);
        *self.current_on.lock() = Some(thread::current().id());
    }

    fn release_current(&self) {
        *self.current_on.lock() = None;
    }

    fn swap_buffers(&self) {
        self.swaps.fetch_add(1, Ordering::SeqCst);
        self.swap_threads.lock().push(thread::current().id());
    }
}

#[derive(Default)]
struct Inbox {
    events: VecDeque<SystemEvent>,
    woken: bool,
}

#[derive(Default)]
struct InboxShared {
    inbox: Mutex<Inbox>,
    ready: Condvar,
    wakes: AtomicUsize,
}

/// Pushes events into a [`HeadlessSystem`] from any thread
#[derive(Clone)]
pub struct EventInjector {
    shared: Arc<InboxShared>,
}

impl EventInjector {
    /// Queue a native event and wake a blocked wait
    pub fn push(&self, handle: NativeHandle, kind: EventKind) {
        let mut inbox = self.shared.inbox.lock();
        inbox.events.push_back(SystemEvent { handle, kind });
        self.shared.ready.notify_all();
    }
}

struct HeadlessWaker {
    shared: Arc<InboxShared>,
}

impl EventWaker for HeadlessWaker {
    fn wake(&self) {
        self.shared.wakes.fetch_add(1, Ordering::SeqCst);
        let mut inbox = self.shared.inbox.lock();
        inbox.woken = true;
        self.shared.ready.notify_all();
    }
}

#[derive(Debug)]
struct HeadlessSurface {
    title: String,
    size: (i32, i32),
    position: (i32, i32),
    visible: bool,
    iconified: bool,
    cursor: (f64, f64),
    input_modes: Vec<InputMode>,
    event_types: EventType,
    context: Arc<HeadlessContext>,
}

/// Windowing system without a display
pub struct HeadlessSystem {
    next_handle: u64,
    surfaces: HashMap<NativeHandle, HeadlessSurface>,
    shared: Arc<InboxShared>,
    refuse_creation: bool,
    swap_interval: Option<u32>,
    clipboard: Option<String>,
}

impl HeadlessSystem {
    /// Create a system with no surfaces
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            surfaces: HashMap::new(),
            shared: Arc::new(InboxShared::default()),
            refuse_creation: false,
            swap_interval: None,
            clipboard: None,
        }
    }

    /// Handle for injecting events from other threads
    pub fn injector(&self) -> EventInjector {
        EventInjector {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Make every following surface creation fail, or succeed again
    pub fn refuse_creation(&mut self, refuse: bool) {
        self.refuse_creation = refuse;
    }

    /// Number of live surfaces
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Context of a live surface
    pub fn context(&self, handle: NativeHandle) -> Option<Arc<HeadlessContext>> {
        self.surfaces.get(&handle).map(|surface| Arc::clone(&surface.context))
    }

    /// Title of a live surface
    pub fn title(&self, handle: NativeHandle) -> Option<&str> {
        self.surfaces.get(&handle).map(|surface| surface.title.as_str())
    }

    /// Whether a live surface is shown
    pub fn is_visible(&self, handle: NativeHandle) -> Option<bool> {
        self.surfaces.get(&handle).map(|surface| surface.visible)
    }

    /// Whether a live surface is minimized
    pub fn is_iconified(&self, handle: NativeHandle) -> Option<bool> {
        self.surfaces.get(&handle).map(|surface| surface.iconified)
    }

    /// Input modes applied to a live surface, in order
    pub fn input_modes(&self, handle: NativeHandle) -> Option<&[InputMode]> {
        self.surfaces.get(&handle).map(|surface| surface.input_modes.as_slice())
    }

    /// Swap interval last requested
    pub const fn swap_interval(&self) -> Option<u32> {
        self.swap_interval
    }

    /// How many times the waker fired
    pub fn wake_count(&self) -> usize {
        self.shared.wakes.load(Ordering::SeqCst)
    }

    fn surface(&self, handle: NativeHandle) -> WindowResult<&HeadlessSurface> {
        self.surfaces.get(&handle).ok_or(WindowError::UnknownWindow(handle))
    }

    fn surface_mut(&mut self, handle: NativeHandle) -> WindowResult<&mut HeadlessSurface> {
        self.surfaces.get_mut(&handle).ok_or(WindowError::UnknownWindow(handle))
    }

    /// Take the queued events, dropping those the target surface does not report
    fn drain(&self, inbox: &mut Inbox) -> Vec<SystemEvent> {
        inbox.woken = false;
        inbox
            .events
            .drain(..)
            .filter(|event| {
                self.surfaces
                    .get(&event.handle)
                    .map_or(true, |surface| surface.event_types.intersects(event.kind.event_type()))
            })
            .collect()
    }
}

impl Default for HeadlessSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for HeadlessSystem {
    fn create_surface(&mut self, descriptor: &WindowDescriptor, share: Option<NativeHandle>) -> WindowResult<Surface> {
        if self.refuse_creation {
            return Err(WindowError::CreationFailed("creation refused".to_string()));
        }
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(WindowError::CreationFailed(format!(
                "invalid size {}x{}",
                descriptor.width, descriptor.height
            )));
        }
        if let Some(share) = share {
            self.surface(share)
                .map_err(|_| WindowError::CreationFailed(format!("unknown share window {share}")))?;
        }

        let handle = NativeHandle(self.next_handle);
        self.next_handle += 1;
        let context = Arc::new(HeadlessContext::new(handle, share));
        let size = (
            i32::try_from(descriptor.width).unwrap_or(i32::MAX),
            i32::try_from(descriptor.height).unwrap_or(i32::MAX),
        );
        self.surfaces.insert(
            handle,
            HeadlessSurface {
                title: descriptor.title.clone(),
                size,
                position: (0, 0),
                visible: descriptor.visible,
                iconified: false,
                cursor: (0.0, 0.0),
                input_modes: Vec::new(),
                event_types: descriptor.event_types,
                context: Arc::clone(&context),
            },
        );
        trace!("Headless surface {handle} created");
        Ok(Surface { handle, context })
    }

    fn destroy_surface(&mut self, handle: NativeHandle) {
        if self.surfaces.remove(&handle).is_some() {
            trace!("Headless surface {handle} destroyed");
        }
    }

    fn poll_events(&mut self) -> Vec<SystemEvent> {
        let shared = Arc::clone(&self.shared);
        let mut inbox = shared.inbox.lock();
        self.drain(&mut inbox)
    }

    fn wait_events(&mut self) -> Vec<SystemEvent> {
        let shared = Arc::clone(&self.shared);
        let mut inbox = shared.inbox.lock();
        while inbox.events.is_empty() && !inbox.woken {
            shared.ready.wait(&mut inbox);
        }
        self.drain(&mut inbox)
    }

    fn wait_events_timeout(&mut self, timeout: f64) -> Vec<SystemEvent> {
        // Timeouts too long to represent wait without a deadline
        let deadline = Duration::try_from_secs_f64(timeout.max(0.0))
            .ok()
            .and_then(|timeout| Instant::now().checked_add(timeout));
        let Some(deadline) = deadline else {
            return self.wait_events();
        };
        let shared = Arc::clone(&self.shared);
        let mut inbox = shared.inbox.lock();
        while inbox.events.is_empty() && !inbox.woken {
            if shared.ready.wait_until(&mut inbox, deadline).timed_out() {
                break;
            }
        }
        self.drain(&mut inbox)
    }

    fn waker(&self) -> Arc<dyn EventWaker> {
        Arc::new(HeadlessWaker {
            shared: Arc::clone(&self.shared),
        })
    }

    fn set_swap_interval(&mut self, interval: u32) {
        self.swap_interval = Some(interval);
    }

    fn size(&self, handle: NativeHandle) -> WindowResult<(i32, i32)> {
        Ok(self.surface(handle)?.size)
    }

    fn set_size(&mut self, handle: NativeHandle, width: i32, height: i32) -> WindowResult<()> {
        self.surface_mut(handle)?.size = (width, height);
        Ok(())
    }

    fn position(&self, handle: NativeHandle) -> WindowResult<(i32, i32)> {
        Ok(self.surface(handle)?.position)
    }

    fn set_position(&mut self, handle: NativeHandle, x: i32, y: i32) -> WindowResult<()> {
        self.surface_mut(handle)?.position = (x, y);
        Ok(())
    }

    fn framebuffer_size(&self, handle: NativeHandle) -> WindowResult<(i32, i32)> {
        self.size(handle)
    }

    fn set_title(&mut self, handle: NativeHandle, title: &str) -> WindowResult<()> {
        self.surface_mut(handle)?.title = title.to_string();
        Ok(())
    }

    fn set_visible(&mut self, handle: NativeHandle, visible: bool) -> WindowResult<()> {
        self.surface_mut(handle)?.visible = visible;
        Ok(())
    }

    fn iconify(&mut self, handle: NativeHandle) -> WindowResult<()> {
        self.surface_mut(handle)?.iconified = true;
        Ok(())
    }

    fn restore(&mut self, handle: NativeHandle) -> WindowResult<()> {
        self.surface_mut(handle)?.iconified = false;
        Ok(())
    }

    fn cursor_position(&self, handle: NativeHandle) -> WindowResult<(f64, f64)> {
        Ok(self.surface(handle)?.cursor)
    }

    fn set_cursor_position(&mut self, handle: NativeHandle, x: f64, y: f64) -> WindowResult<()> {
        self.surface_mut(handle)?.cursor = (x, y);
        Ok(())
    }

    fn set_input_mode(&mut self, handle: NativeHandle, mode: InputMode) -> WindowResult<()> {
        self.surface_mut(handle)?.input_modes.push(mode);
        Ok(())
    }

    fn clipboard(&self, handle: NativeHandle) -> WindowResult<Option<String>> {
        self.surface(handle)?;
        Ok(self.clipboard.clone())
    }

    fn set_clipboard(&mut self, handle: NativeHandle, text: &str) -> WindowResult<()> {
        self.surface(handle)?;
        self.clipboard = Some(text.to_string());
        Ok(())
    }
}
