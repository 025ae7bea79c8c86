//! Window event model
//!
//! Key principles:
//! - Handlers declare the event types they care about up front
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Handlers run in ascending rank order, see [`crate::window::Window::bind_handler`]

pub mod input;

use std::path::PathBuf;

use bitflags::bitflags;

use crate::core::WindowId;
pub use input::{Action, CursorMode, InputMode, KeyCode, Modifiers, MouseButton, Scancode};

bitflags! {
    /// Set of event types
    ///
    /// Used by handlers to declare what they handle, and by window creation
    /// to choose which native events are reported at all.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventType: u32 {
        /// Window moved
        const WINDOW_POSITION = 0x0_0001;
        /// Window resized
        const WINDOW_SIZE = 0x0_0002;
        /// User asked to close the window
        const WINDOW_CLOSE = 0x0_0004;
        /// Window contents need refreshing
        const WINDOW_REFRESH = 0x0_0008;
        /// Window gained or lost focus
        const WINDOW_FOCUS = 0x0_0010;
        /// Window was iconified or restored
        const WINDOW_ICONIFY = 0x0_0020;
        /// Window was maximized or restored
        const WINDOW_MAXIMIZE = 0x0_0040;
        /// Framebuffer resized
        const FRAMEBUFFER_SIZE = 0x0_0080;
        /// Content scale changed
        const CONTENT_SCALE = 0x0_0100;
        /// Unicode character input
        const CHAR = 0x0_0200;
        /// Unicode character input with modifiers
        const CHAR_MODS = 0x0_0400;
        /// Cursor entered or left the content area
        const CURSOR_ENTER = 0x0_0800;
        /// Cursor moved
        const CURSOR_POSITION = 0x0_1000;
        /// Files dropped on the window
        const DROP = 0x0_2000;
        /// Keyboard key
        const KEY = 0x0_4000;
        /// Mouse button
        const MOUSE_BUTTON = 0x0_8000;
        /// Scroll wheel or touchpad
        const SCROLL = 0x1_0000;
    }
}

/// What happened, with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// New position of the upper-left corner of the content area
    WindowPosition {
        #[allow(missing_docs)]
        x: i32,
        #[allow(missing_docs)]
        y: i32,
    },
    /// New size of the content area
    WindowSize {
        #[allow(missing_docs)]
        width: i32,
        #[allow(missing_docs)]
        height: i32,
    },
    /// Close requested
    WindowClose,
    /// Contents damaged
    WindowRefresh,
    /// Focus gained (`true`) or lost
    WindowFocus(bool),
    /// Iconified (`true`) or restored
    WindowIconify(bool),
    /// Maximized (`true`) or restored
    WindowMaximize(bool),
    /// New framebuffer size in pixels
    FramebufferSize {
        #[allow(missing_docs)]
        width: i32,
        #[allow(missing_docs)]
        height: i32,
    },
    /// New content scale
    ContentScale {
        #[allow(missing_docs)]
        x: f32,
        #[allow(missing_docs)]
        y: f32,
    },
    /// Character input
    Char(char),
    /// Character input with the modifiers held
    CharMods {
        #[allow(missing_docs)]
        codepoint: char,
        #[allow(missing_docs)]
        mods: Modifiers,
    },
    /// Cursor entered (`true`) or left the content area
    CursorEnter(bool),
    /// Cursor position relative to the content area
    CursorPosition {
        #[allow(missing_docs)]
        x: f64,
        #[allow(missing_docs)]
        y: f64,
    },
    /// Paths of files dropped on the window
    FileDrop(Vec<PathBuf>),
    /// Keyboard key
    Key {
        #[allow(missing_docs)]
        key: KeyCode,
        #[allow(missing_docs)]
        scancode: Scancode,
        #[allow(missing_docs)]
        action: Action,
        #[allow(missing_docs)]
        mods: Modifiers,
    },
    /// Mouse button
    MouseButton {
        #[allow(missing_docs)]
        button: MouseButton,
        #[allow(missing_docs)]
        action: Action,
        #[allow(missing_docs)]
        mods: Modifiers,
    },
    /// Scroll offset
    Scroll {
        #[allow(missing_docs)]
        x: f64,
        #[allow(missing_docs)]
        y: f64,
    },
}

impl EventKind {
    /// The single event type this kind belongs to
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::WindowPosition { .. } => EventType::WINDOW_POSITION,
            Self::WindowSize { .. } => EventType::WINDOW_SIZE,
            Self::WindowClose => EventType::WINDOW_CLOSE,
            Self::WindowRefresh => EventType::WINDOW_REFRESH,
            Self::WindowFocus(_) => EventType::WINDOW_FOCUS,
            Self::WindowIconify(_) => EventType::WINDOW_ICONIFY,
            Self::WindowMaximize(_) => EventType::WINDOW_MAXIMIZE,
            Self::FramebufferSize { .. } => EventType::FRAMEBUFFER_SIZE,
            Self::ContentScale { .. } => EventType::CONTENT_SCALE,
            Self::Char(_) => EventType::CHAR,
            Self::CharMods { .. } => EventType::CHAR_MODS,
            Self::CursorEnter(_) => EventType::CURSOR_ENTER,
            Self::CursorPosition { .. } => EventType::CURSOR_POSITION,
            Self::FileDrop(_) => EventType::DROP,
            Self::Key { .. } => EventType::KEY,
            Self::MouseButton { .. } => EventType::MOUSE_BUTTON,
            Self::Scroll { .. } => EventType::SCROLL,
        }
    }
}

/// An event delivered to one window
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    window: WindowId,
    kind: EventKind,
}

impl Event {
    /// Create an event addressed to `window`
    pub const fn new(window: WindowId, kind: EventKind) -> Self {
        Self { window, kind }
    }

    /// Window the event is addressed to
    pub const fn window(&self) -> WindowId {
        self.window
    }

    /// What happened
    pub const fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Type of the event, a single bit of [`EventType`]
    pub const fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}

/// Event handler trait
///
/// Returns true if event was consumed (stops forwarding).
/// Returns false to allow forwarding to lower-priority handlers.
///
/// Handlers run on the owning thread, while the target window's context is
/// current and its lock is held.
pub trait EventHandler: Send + Sync {
    /// Event types this handler wants to see
    fn event_types(&self) -> EventType;

    /// Handle an event, return true if consumed
    fn on_event(&self, event: &Event) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_to_single_type() {
        let kinds = [
            EventKind::WindowClose,
            EventKind::Char('x'),
            EventKind::Scroll { x: 0.0, y: 1.0 },
            EventKind::MouseButton {
                button: MouseButton::Left,
                action: Action::Press,
                mods: Modifiers::empty(),
            },
        ];
        for kind in kinds {
            assert_eq!(kind.event_type().bits().count_ones(), 1, "{kind:?}");
        }
        assert_eq!(EventKind::FileDrop(Vec::new()).event_type(), EventType::DROP);
    }

    #[test]
    fn test_type_mask_intersection() {
        let mask = EventType::KEY | EventType::MOUSE_BUTTON;
        let event = Event::new(WindowId::new(0), EventKind::WindowClose);
        assert!(!mask.intersects(event.event_type()));
        assert!(EventType::all().intersects(event.event_type()));
    }
}
