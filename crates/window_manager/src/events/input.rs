//! Keyboard, mouse and cursor input values carried by events

use bitflags::bitflags;

/// Platform-independent key code, using the GLFW key numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub i32);

impl KeyCode {
    /// Key the platform could not identify
    pub const UNKNOWN: Self = Self(-1);
    #[allow(missing_docs)]
    pub const SPACE: Self = Self(32);
    #[allow(missing_docs)]
    pub const ESCAPE: Self = Self(256);
    #[allow(missing_docs)]
    pub const ENTER: Self = Self(257);
    #[allow(missing_docs)]
    pub const TAB: Self = Self(258);
    #[allow(missing_docs)]
    pub const BACKSPACE: Self = Self(259);
    #[allow(missing_docs)]
    pub const RIGHT: Self = Self(262);
    #[allow(missing_docs)]
    pub const LEFT: Self = Self(263);
    #[allow(missing_docs)]
    pub const DOWN: Self = Self(264);
    #[allow(missing_docs)]
    pub const UP: Self = Self(265);

    /// Key code of a letter or digit key
    ///
    /// Letters map case-insensitively, like the printed key caps.
    pub fn from_char(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        (upper.is_ascii_uppercase() || upper.is_ascii_digit()).then(|| Self(upper as i32))
    }
}

/// Platform-specific scancode
pub type Scancode = i32;

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Wheel button
    Middle,
    /// Extra buttons, numbered from 3
    Other(u8),
}

impl MouseButton {
    /// Button from its zero-based index
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Left,
            1 => Self::Right,
            2 => Self::Middle,
            n => Self::Other(n),
        }
    }
}

/// Key or button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    #[allow(missing_docs)]
    Press,
    #[allow(missing_docs)]
    Release,
    /// Key held down long enough to auto-repeat
    Repeat,
}

bitflags! {
    /// Modifier keys held during an input event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        #[allow(missing_docs)]
        const SHIFT = 0x0001;
        #[allow(missing_docs)]
        const CONTROL = 0x0002;
        #[allow(missing_docs)]
        const ALT = 0x0004;
        #[allow(missing_docs)]
        const SUPER = 0x0008;
        #[allow(missing_docs)]
        const CAPS_LOCK = 0x0010;
        #[allow(missing_docs)]
        const NUM_LOCK = 0x0020;
    }
}

/// Cursor behaviour over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorMode {
    /// Visible and free to leave the window
    Normal,
    /// Invisible over the content area
    Hidden,
    /// Hidden and locked to the window, for unbounded motion
    Disabled,
}

/// Per-window input setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputMode {
    #[allow(missing_docs)]
    Cursor(CursorMode),
    /// Keep key presses reported until polled
    StickyKeys(bool),
    /// Keep button presses reported until polled
    StickyMouseButtons(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_code_from_char() {
        assert_eq!(KeyCode::from_char('a'), Some(KeyCode(65)));
        assert_eq!(KeyCode::from_char('Z'), Some(KeyCode(90)));
        assert_eq!(KeyCode::from_char('7'), Some(KeyCode(55)));
        assert_eq!(KeyCode::from_char('#'), None);
    }

    #[test]
    fn test_mouse_button_from_index() {
        assert_eq!(MouseButton::from_index(0), MouseButton::Left);
        assert_eq!(MouseButton::from_index(1), MouseButton::Right);
        assert_eq!(MouseButton::from_index(5), MouseButton::Other(5));
    }
}
