//! Window abstraction layer
//!
//! - [`system`]: the platform windowing layer the manager drives
//! - [`handle`]: a managed window with its handlers and drawables
//! - [`registry`]: the table of live windows

pub mod handle;
pub mod registry;
pub mod system;

pub use handle::{ContextGuard, Drawable, Window};
pub use registry::WindowRegistry;
pub use system::{
    EventWaker, Monitor, NativeHandle, RenderContext, Surface, SystemEvent, WindowDescriptor, WindowError,
    WindowResult, WindowSystem,
};
