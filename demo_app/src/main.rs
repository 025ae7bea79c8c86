//! Spawning windows
//!
//! Opens one window whose group redraws on its own render thread.
//! Left click in any window spawns a slightly smaller window that shares its
//! context and joins its group; right click closes the clicked window. The
//! program exits once every window is closed.
//!
//! Run with `cargo run -p demo_app --features glfw`.

use std::sync::Arc;

use log::{error, info};
use parking_lot::Mutex;
use window_manager::prelude::*;

/// Windows that asked for a child, drained by the owning thread
type SpawnRequests = Arc<Mutex<Vec<WindowId>>>;

struct Spawner {
    manager: ManagerHandle,
    requests: SpawnRequests,
}

impl EventHandler for Spawner {
    fn event_types(&self) -> EventType {
        EventType::MOUSE_BUTTON
    }

    fn on_event(&self, event: &Event) -> bool {
        let EventKind::MouseButton {
            button,
            action: Action::Press,
            ..
        } = event.kind()
        else {
            return false;
        };
        match button {
            MouseButton::Left => self.requests.lock().push(event.window()),
            MouseButton::Right => {
                if let Some(window) = self.manager.window(event.window()) {
                    window.set_should_close(true);
                }
            }
            _ => return false,
        }
        true
    }
}

struct Announce;

impl Drawable for Announce {
    fn draw(&self, window: WindowId) {
        info!("Drawing window {window}");
    }
}

struct Demo {
    manager: WindowManager<GlfwSystem>,
    spawner: Arc<Spawner>,
    announce: Arc<Announce>,
}

impl Demo {
    fn open(
        &mut self,
        descriptor: &WindowDescriptor,
        share: Option<WindowId>,
        group: GroupId,
    ) -> Result<WindowId, ManagerError> {
        let window = self.manager.create_window(descriptor, share)?;
        let id = window.id();
        window.bind_handler(self.spawner.clone(), 0);
        window.bind_drawable(self.announce.clone(), 0);
        self.manager.set_window_title(id, &format!("Window {id}"))?;
        self.manager.attach(group, id);
        self.manager.handle().notify(group, id);
        Ok(id)
    }

    fn spawn_child(&mut self, parent: WindowId) -> Result<(), ManagerError> {
        let (width, height) = self.manager.window_size(parent)?;
        let shrink = |side: i32| u32::try_from(side * 9 / 10).unwrap_or(1).max(1);
        let descriptor = WindowDescriptor::new(shrink(width), shrink(height), "");
        let group = self.manager.handle().group_of(parent);
        let child = self.open(&descriptor, Some(parent), group)?;
        info!("Window {parent} spawned window {child}");
        Ok(())
    }

    fn run(&mut self) {
        self.manager.handle().notify(GroupId::ALL, WindowId::ALL);
        while self.manager.run_iteration() {
            let parents = std::mem::take(&mut *self.spawner.requests.lock());
            for parent in parents {
                if let Err(err) = self.spawn_child(parent) {
                    error!("Could not spawn a window from {parent}: {err}");
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ManagerConfig {
        window: WindowConfig {
            title: "Spawning windows".to_string(),
            ..Default::default()
        },
        log_filter: Some(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())),
        ..Default::default()
    };
    let manager = WindowManager::with_config(GlfwSystem::init()?, config)?;
    let spawner = Arc::new(Spawner {
        manager: manager.handle().clone(),
        requests: Arc::default(),
    });
    let mut demo = Demo {
        manager,
        spawner,
        announce: Arc::new(Announce),
    };

    let group = demo.manager.create_group();
    group.run_concurrently()?;
    let descriptor = demo.manager.default_descriptor();
    demo.open(&descriptor, None, group.id())?;

    demo.run();
    demo.manager.terminate();
    info!("All windows closed");
    Ok(())
}
