//! Native windowing system abstraction
//!
//! This module defines the trait the window manager drives the platform
//! through. The manager owns exactly one [`WindowSystem`] and only touches it
//! from the owning thread; the pieces that must cross threads (rendering
//! contexts and the event-loop waker) are split out as separate `Send + Sync`
//! objects.

use std::fmt;
use std::sync::Arc;

use crate::core::{ClientApi, WindowConfig};
use crate::events::{EventKind, EventType, InputMode};

/// Errors from the native windowing system
#[derive(thiserror::Error, Debug)]
pub enum WindowError {
    /// The platform layer could not be initialized
    #[error("Windowing system initialization failed: {0}")]
    InitializationFailed(String),

    /// The native window could not be created
    #[error("Window creation failed: {0}")]
    CreationFailed(String),

    /// No live window has this handle
    #[error("Unknown native window {0}")]
    UnknownWindow(NativeHandle),

    /// Error reported by the platform layer
    #[error("Windowing system error: {0}")]
    Backend(String),
}

/// Result type for windowing system calls
pub type WindowResult<T> = Result<T, WindowError>;

/// Opaque identity of a native window inside one [`WindowSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monitor a fullscreen window is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Monitor {
    /// The user's primary monitor
    Primary,
    /// A connected monitor by index, in platform order
    Connected(usize),
}

/// Parameters of a new window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    /// Width in screen coordinates
    pub width: u32,
    /// Height in screen coordinates
    pub height: u32,
    /// Title bar text
    pub title: String,
    /// Fullscreen monitor; `None` for a windowed window
    pub monitor: Option<Monitor>,
    /// Native events to report for this window
    pub event_types: EventType,
    /// Whether the user can resize the window
    pub resizable: bool,
    /// Whether the window is shown when created
    pub visible: bool,
    /// Context API
    pub client_api: ClientApi,
}

impl WindowDescriptor {
    /// Windowed descriptor reporting every event type
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            monitor: None,
            event_types: EventType::all(),
            resizable: true,
            visible: true,
            client_api: ClientApi::OpenGl,
        }
    }

    /// Make the window fullscreen on `monitor`
    #[must_use]
    pub fn fullscreen(mut self, monitor: Monitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Restrict the native events reported for the window
    #[must_use]
    pub fn with_event_types(mut self, event_types: EventType) -> Self {
        self.event_types = event_types;
        self
    }
}

impl From<&WindowConfig> for WindowDescriptor {
    fn from(config: &WindowConfig) -> Self {
        Self {
            resizable: config.resizable,
            visible: config.visible,
            client_api: config.client_api,
            ..Self::new(config.width, config.height, config.title.clone())
        }
    }
}

/// Native rendering context of one window
///
/// Implementations must tolerate calls from any thread; the manager
/// guarantees a context is only used by one thread at a time by holding the
/// window's lock around every call.
pub trait RenderContext: Send + Sync {
    /// Make the context current on the calling thread
    fn make_current(&self);

    /// Detach the context from the calling thread
    fn release_current(&self);

    /// Present the back buffer
    fn swap_buffers(&self);
}

/// Wakes the owning thread out of a blocking event wait
pub trait EventWaker: Send + Sync {
    /// Post an empty event so a blocked wait returns
    fn wake(&self);
}

/// A freshly created native window
pub struct Surface {
    /// Identity of the native window
    pub handle: NativeHandle,
    /// Its rendering context
    pub context: Arc<dyn RenderContext>,
}

/// A native event, still addressed by native handle
#[derive(Debug, Clone, PartialEq)]
pub struct SystemEvent {
    /// Native window the event is for
    pub handle: NativeHandle,
    /// What happened
    pub kind: EventKind,
}

/// Platform windowing layer driven by the window manager
///
/// # Thread Safety
/// Deliberately not `Send`: native windowing calls must happen on the thread
/// that initialized the platform layer. The window manager owns the system
/// and only calls it from that thread.
pub trait WindowSystem {
    /// Create a native window and its context
    ///
    /// When `share` is given the new context shares objects with that
    /// window's context.
    fn create_surface(&mut self, descriptor: &WindowDescriptor, share: Option<NativeHandle>) -> WindowResult<Surface>;

    /// Destroy a native window; unknown handles are ignored
    fn destroy_surface(&mut self, handle: NativeHandle);

    /// Collect pending events without blocking
    fn poll_events(&mut self) -> Vec<SystemEvent>;

    /// Block until at least one event or a wake-up arrives, then collect
    fn wait_events(&mut self) -> Vec<SystemEvent>;

    /// Like [`WindowSystem::wait_events`], giving up after `timeout` seconds
    fn wait_events_timeout(&mut self, timeout: f64) -> Vec<SystemEvent>;

    /// Handle other threads use to interrupt a blocking wait
    fn waker(&self) -> Arc<dyn EventWaker>;

    /// Set the swap interval of the context current on the calling thread
    fn set_swap_interval(&mut self, _interval: u32) {}

    /// Size of the content area in screen coordinates
    fn size(&self, handle: NativeHandle) -> WindowResult<(i32, i32)>;

    /// Resize the content area
    fn set_size(&mut self, handle: NativeHandle, width: i32, height: i32) -> WindowResult<()>;

    /// Position of the content area's upper-left corner
    fn position(&self, handle: NativeHandle) -> WindowResult<(i32, i32)>;

    /// Move the window
    fn set_position(&mut self, handle: NativeHandle, x: i32, y: i32) -> WindowResult<()>;

    /// Size of the framebuffer in pixels
    fn framebuffer_size(&self, handle: NativeHandle) -> WindowResult<(i32, i32)>;

    /// Change the title bar text
    fn set_title(&mut self, handle: NativeHandle, title: &str) -> WindowResult<()>;

    /// Show or hide the window
    fn set_visible(&mut self, handle: NativeHandle, visible: bool) -> WindowResult<()>;

    /// Minimize the window
    fn iconify(&mut self, handle: NativeHandle) -> WindowResult<()>;

    /// Restore a minimized or maximized window
    fn restore(&mut self, handle: NativeHandle) -> WindowResult<()>;

    /// Cursor position relative to the content area
    fn cursor_position(&self, handle: NativeHandle) -> WindowResult<(f64, f64)>;

    /// Warp the cursor
    fn set_cursor_position(&mut self, handle: NativeHandle, x: f64, y: f64) -> WindowResult<()>;

    /// Change an input mode of the window
    fn set_input_mode(&mut self, handle: NativeHandle, mode: InputMode) -> WindowResult<()>;

    /// System clipboard contents
    fn clipboard(&self, handle: NativeHandle) -> WindowResult<Option<String>>;

    /// Replace the system clipboard contents
    fn set_clipboard(&mut self, handle: NativeHandle, text: &str) -> WindowResult<()>;
}
