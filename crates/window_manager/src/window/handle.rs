//! A managed window
//!
//! Wraps one native surface together with its lock slot, its rank-ordered
//! event handlers and drawables, and its close flag. Every operation that
//! touches the native context or the per-window lists runs with the slot
//! lock held, so the owning thread and group render threads never use the
//! same context at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::trace;
use parking_lot::{Mutex, ReentrantMutexGuard};

use crate::core::WindowId;
use crate::events::{Event, EventHandler};
use crate::foundation::{Rank, RankedList};
use crate::sync::{SharedMutex, SharedMutexPool};
use crate::window::system::{NativeHandle, RenderContext, Surface, WindowSystem};

/// Something that renders into a window
///
/// Called with the window's context current and its lock held, from
/// whichever thread is redrawing the window.
pub trait Drawable: Send + Sync {
    /// Render the contents of `window`
    fn draw(&self, window: WindowId);
}

/// A live window
pub struct Window {
    id: WindowId,
    handle: NativeHandle,
    mutex: SharedMutex,
    context: Arc<dyn RenderContext>,
    handlers: Mutex<RankedList<dyn EventHandler>>,
    drawables: Mutex<RankedList<dyn Drawable>>,
    should_close: AtomicBool,
    destroyed: AtomicBool,
}

impl Window {
    pub(crate) fn new(id: WindowId, surface: Surface, mutex: SharedMutex) -> Self {
        Self {
            id,
            handle: surface.handle,
            mutex,
            context: surface.context,
            handlers: Mutex::new(RankedList::new()),
            drawables: Mutex::new(RankedList::new()),
            should_close: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Identifier of this window
    pub const fn id(&self) -> WindowId {
        self.id
    }

    /// Native handle of this window
    pub const fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    /// Lock slot shared with every window in the same context family
    pub const fn shared_mutex(&self) -> &SharedMutex {
        &self.mutex
    }

    /// Take the window's lock
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.mutex.lock()
    }

    /// Whether the native window has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Bind an event handler; handlers run in ascending rank order
    ///
    /// Binding a handler that is already bound moves it to the new rank.
    pub fn bind_handler(&self, handler: Arc<dyn EventHandler>, rank: Rank) {
        let _slot = self.mutex.lock();
        self.handlers.lock().bind(handler, rank);
    }

    /// Unbind an event handler; returns false if it was not bound
    pub fn unbind_handler(&self, handler: &Arc<dyn EventHandler>) -> bool {
        let _slot = self.mutex.lock();
        self.handlers.lock().unbind(handler)
    }

    /// Bind a drawable; drawables run in ascending rank order
    pub fn bind_drawable(&self, drawable: Arc<dyn Drawable>, rank: Rank) {
        let _slot = self.mutex.lock();
        self.drawables.lock().bind(drawable, rank);
    }

    /// Unbind a drawable; returns false if it was not bound
    pub fn unbind_drawable(&self, drawable: &Arc<dyn Drawable>) -> bool {
        let _slot = self.mutex.lock();
        self.drawables.lock().unbind(drawable)
    }

    /// Number of bound handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Number of bound drawables
    pub fn drawable_count(&self) -> usize {
        self.drawables.lock().len()
    }

    /// Whether the window has been asked to close
    pub fn should_close(&self) -> bool {
        self.should_close.load(Ordering::Acquire)
    }

    /// Ask the window to close, or cancel the request
    ///
    /// The owning thread destroys closing windows at the end of its
    /// current iteration.
    pub fn set_should_close(&self, close: bool) {
        let _slot = self.mutex.lock();
        self.should_close.store(close, Ordering::Release);
    }

    /// Offer `event` to the bound handlers until one consumes it
    ///
    /// Only handlers whose declared types include the event's type are
    /// offered it. Returns whether a handler consumed the event.
    pub fn handle_event(&self, event: &Event) -> bool {
        let _slot = self.mutex.lock();
        if event.window() != self.id || self.is_destroyed() {
            return false;
        }
        let event_type = event.event_type();
        let handlers = self.handlers.lock().snapshot();
        handlers
            .iter()
            .any(|handler| handler.event_types().intersects(event_type) && handler.on_event(event))
    }

    /// Run every bound drawable
    pub fn draw(&self) {
        let _slot = self.mutex.lock();
        let drawables = self.drawables.lock().snapshot();
        for drawable in &drawables {
            drawable.draw(self.id);
        }
    }

    /// Make the context current and draw, then present
    ///
    /// Does nothing once the window is destroyed.
    pub fn render(&self) {
        let context = self.make_context_current();
        if !context.is_current() {
            return;
        }
        trace!("Rendering window {}", self.id);
        self.draw();
        self.context.swap_buffers();
    }

    /// Lock the window and make its context current on this thread
    ///
    /// The context is released and the lock dropped with the guard.
    pub fn make_context_current(&self) -> ContextGuard<'_> {
        let slot = self.mutex.lock();
        let current = !self.is_destroyed();
        if current {
            self.context.make_current();
        }
        ContextGuard {
            window: self,
            _slot: slot,
            current,
        }
    }

    /// Present the back buffer
    pub fn swap_buffers(&self) {
        let _slot = self.mutex.lock();
        if !self.is_destroyed() {
            self.context.swap_buffers();
        }
    }

    /// Destroy the native window and give back its lock slot
    ///
    /// Waits for any thread currently using the window to finish. Returns
    /// false if the window was already destroyed.
    pub(crate) fn destroy(&self, system: &mut dyn WindowSystem, mutexes: &SharedMutexPool) -> bool {
        {
            let _slot = self.mutex.lock();
            if self.destroyed.swap(true, Ordering::AcqRel) {
                return false;
            }
            system.destroy_surface(self.handle);
        }
        mutexes.release(self.mutex.slot());
        true
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("slot", &self.mutex.slot())
            .field("should_close", &self.should_close())
            .finish_non_exhaustive()
    }
}

/// Holds a window's lock with its context current
///
/// Dropping the guard releases the context and then the lock.
pub struct ContextGuard<'a> {
    window: &'a Window,
    _slot: ReentrantMutexGuard<'a, ()>,
    current: bool,
}

impl ContextGuard<'_> {
    /// Whether the context was made current; false for a destroyed window
    pub const fn is_current(&self) -> bool {
        self.current
    }

    /// Window the guard belongs to
    pub const fn window(&self) -> &Window {
        self.window
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if self.current {
            self.window.context.release_current();
        }
    }
}
