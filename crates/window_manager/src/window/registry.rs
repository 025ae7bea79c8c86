//! Registry of live windows
//!
//! Maps window identifiers to windows and native handles back to
//! identifiers. The registry lock is only held for table lookups and
//! updates; it is never held while a window's own lock is taken, so
//! lookups from render threads never wait on a window that is drawing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, error};
use parking_lot::Mutex;

use crate::core::WindowId;
use crate::events::Event;
use crate::foundation::IdArena;
use crate::sync::SharedMutexPool;
use crate::window::handle::Window;
use crate::window::system::{NativeHandle, WindowDescriptor, WindowResult, WindowSystem};

#[derive(Default)]
struct WindowTable {
    windows: IdArena<WindowId, Arc<Window>>,
    native: HashMap<NativeHandle, WindowId>,
}

/// Registry of live windows
pub struct WindowRegistry {
    table: Mutex<WindowTable>,
    mutexes: Arc<SharedMutexPool>,
}

impl WindowRegistry {
    /// Create an empty registry drawing lock slots from `mutexes`
    pub fn new(mutexes: Arc<SharedMutexPool>) -> Self {
        Self {
            table: Mutex::new(WindowTable::default()),
            mutexes,
        }
    }

    /// Lock pool the registry's windows draw their slots from
    pub fn mutexes(&self) -> &Arc<SharedMutexPool> {
        &self.mutexes
    }

    /// Create a window and its native surface
    ///
    /// A window created with `share` joins that window's lock slot and
    /// shares its context; a destroyed `share` window is ignored. On failure
    /// the identifier and lock slot are given back and nothing is
    /// registered.
    pub fn create(
        &self,
        system: &mut dyn WindowSystem,
        descriptor: &WindowDescriptor,
        share: Option<&Window>,
    ) -> WindowResult<Arc<Window>> {
        let id = self.table.lock().windows.allocate();
        let share = share.filter(|window| !window.is_destroyed());
        let mutex = share
            .and_then(|window| self.mutexes.acquire_shared(window.shared_mutex().slot()))
            .unwrap_or_else(|| self.mutexes.acquire_new());

        let surface = match system.create_surface(descriptor, share.map(Window::native_handle)) {
            Ok(surface) => surface,
            Err(err) => {
                error!("Failed to create window \"{}\": {}", descriptor.title, err);
                self.table.lock().windows.free(id);
                self.mutexes.release(mutex.slot());
                return Err(err);
            }
        };

        let window = Arc::new(Window::new(id, surface, mutex));
        {
            let mut table = self.table.lock();
            table.native.insert(window.native_handle(), id);
            table.windows.insert_at(id, Arc::clone(&window));
        }
        debug!(
            "Created window {} ({}x{} \"{}\") on native {} slot {:?}",
            id,
            descriptor.width,
            descriptor.height,
            descriptor.title,
            window.native_handle(),
            window.shared_mutex().slot()
        );
        Ok(window)
    }

    /// Destroy a window
    ///
    /// The window is unregistered first, then its native surface is
    /// destroyed once no other thread is using it. Returns false if no such
    /// window exists.
    pub fn destroy(&self, system: &mut dyn WindowSystem, id: WindowId) -> bool {
        let window = {
            let mut table = self.table.lock();
            let Some(window) = table.windows.remove(id) else {
                return false;
            };
            table.native.remove(&window.native_handle());
            window
        };
        window.destroy(system, &self.mutexes);
        debug!("Destroyed window {id}");
        true
    }

    /// Destroy every window
    pub fn destroy_all(&self, system: &mut dyn WindowSystem) {
        for id in self.all_ids() {
            self.destroy(system, id);
        }
    }

    /// Get a live window
    pub fn get(&self, id: WindowId) -> Option<Arc<Window>> {
        self.table.lock().windows.get(id).cloned()
    }

    /// Whether a window is live
    pub fn contains(&self, id: WindowId) -> bool {
        self.table.lock().windows.contains(id)
    }

    /// Identifier of the window behind a native handle
    ///
    /// Returns [`WindowId::ALL`] when the handle is not registered.
    pub fn window_id(&self, handle: NativeHandle) -> WindowId {
        self.table.lock().native.get(&handle).copied().unwrap_or(WindowId::ALL)
    }

    /// Identifiers of every live window
    pub fn all_ids(&self) -> HashSet<WindowId> {
        self.table.lock().windows.iter().map(|(id, _)| id).collect()
    }

    /// Number of live windows
    pub fn len(&self) -> usize {
        self.table.lock().windows.len()
    }

    /// Whether there are no live windows
    pub fn is_empty(&self) -> bool {
        self.table.lock().windows.is_empty()
    }

    /// Whether any live window has not been asked to close
    pub fn any_open(&self) -> bool {
        self.snapshot().iter().any(|window| !window.should_close())
    }

    /// Identifiers of the windows that have been asked to close
    pub fn windows_to_close(&self) -> HashSet<WindowId> {
        self.snapshot()
            .iter()
            .filter(|window| window.should_close())
            .map(|window| window.id())
            .collect()
    }

    /// Offer an event to a window's handlers
    ///
    /// Returns false if the window does not exist or no handler consumed it.
    pub fn dispatch(&self, id: WindowId, event: &Event) -> bool {
        self.get(id).is_some_and(|window| window.handle_event(event))
    }

    /// Run a window's drawables
    pub fn draw(&self, id: WindowId) {
        if let Some(window) = self.get(id) {
            window.draw();
        }
    }

    fn snapshot(&self) -> Vec<Arc<Window>> {
        self.table.lock().windows.iter().map(|(_, window)| Arc::clone(window)).collect()
    }
}
