//! # Window Manager
//!
//! Multi-window lifecycle and cross-thread render coordination on top of a
//! native windowing layer.
//!
//! ## Features
//!
//! - **Dense identifiers**: windows and groups get small integer ids, reused smallest-first
//! - **Context sharing**: windows that share a context share one recursive lock
//! - **Window groups**: redraw sets of windows inline or on a dedicated render thread
//! - **Update queue**: any thread can request redraws; the owning thread routes them
//! - **Backends**: GLFW (feature `glfw`) and an in-memory headless system
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use window_manager::prelude::*;
//!
//! struct Clear;
//!
//! impl Drawable for Clear {
//!     fn draw(&self, window: WindowId) {
//!         log::info!("Drawing window {window}");
//!     }
//! }
//!
//! fn main() -> Result<(), ManagerError> {
//!     let mut manager = WindowManager::new(HeadlessSystem::new());
//!     let window = manager.create_window(&WindowDescriptor::new(640, 480, "Hello"), None)?;
//!     window.bind_drawable(Arc::new(Clear), 0);
//!
//!     let group = manager.create_group();
//!     manager.attach(group.id(), window.id());
//!     group.run_concurrently()?;
//!
//!     manager.main_loop();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod backend;
pub mod config;
pub mod core;
pub mod events;
pub mod foundation;
pub mod group;
pub mod sync;
pub mod update_queue;
pub mod window;

mod manager;

pub use manager::{ManagerError, ManagerHandle, WindowManager};

#[cfg(test)]
mod tests;

/// Common imports for window manager users
pub mod prelude {
    pub use crate::{
        backend::HeadlessSystem,
        core::{
            config::{Config, ManagerConfig, WaitPolicy, WindowConfig},
            GroupId, WindowId,
        },
        events::{Action, Event, EventHandler, EventKind, EventType, KeyCode, Modifiers, MouseButton},
        group::WindowGroup,
        window::{Drawable, Monitor, Window, WindowDescriptor, WindowError, WindowSystem},
        ManagerError, ManagerHandle, WindowManager,
    };

    #[cfg(feature = "glfw")]
    pub use crate::backend::GlfwSystem;
}
