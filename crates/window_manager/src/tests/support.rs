//! Shared fixtures for manager-level tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::backend::HeadlessSystem;
use crate::core::WindowId;
use crate::events::{Event, EventHandler, EventType};
use crate::foundation::logging;
use crate::window::{Drawable, Window, WindowDescriptor};
use crate::WindowManager;

pub type TestManager = WindowManager<HeadlessSystem>;

/// Manager that waits at most a millisecond per iteration
pub fn manager() -> TestManager {
    logging::init();
    let manager = WindowManager::new(HeadlessSystem::new());
    manager.handle().set_wait_timeout(0.001);
    manager
}

/// Create a window with a counting drawable bound at rank 0
pub fn counted_window(manager: &mut TestManager, title: &str) -> (Arc<Window>, Arc<CountingDrawable>) {
    let window = manager
        .create_window(&WindowDescriptor::new(200, 150, title), None)
        .expect("headless window creation");
    let drawable = CountingDrawable::new();
    window.bind_drawable(drawable.clone(), 0);
    (window, drawable)
}

/// Poll `condition` until it holds or two seconds pass
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Drawable counting its invocations and the threads they ran on
#[derive(Default)]
pub struct CountingDrawable {
    draws: AtomicUsize,
    threads: Mutex<Vec<Option<String>>>,
    delay: Option<Duration>,
    started: AtomicUsize,
}

impl CountingDrawable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Drawable that sleeps for `delay` inside every draw
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn count(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Names of the threads that drew, in order
    pub fn thread_names(&self) -> Vec<Option<String>> {
        self.threads.lock().clone()
    }
}

impl Drawable for CountingDrawable {
    fn draw(&self, _window: WindowId) {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.threads.lock().push(thread::current().name().map(String::from));
        self.draws.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handler appending its name to a shared log
pub struct RecordingHandler {
    name: &'static str,
    types: EventType,
    consume: bool,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHandler {
    pub fn new(name: &'static str, types: EventType, consume: bool, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            types,
            consume,
            log: Arc::clone(log),
        })
    }
}

impl EventHandler for RecordingHandler {
    fn event_types(&self) -> EventType {
        self.types
    }

    fn on_event(&self, _event: &Event) -> bool {
        self.log.lock().push(self.name);
        self.consume
    }
}
