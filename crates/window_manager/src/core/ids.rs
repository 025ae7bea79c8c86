//! Window, group and lock-slot identifiers
//!
//! Real identifiers are dense small integers handed out by the registries.
//! The values at the very top of the range are reserved sentinels, so a
//! sentinel can never collide with a live identifier.

use std::fmt;

use crate::foundation::ArenaId;

/// Identifier of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(usize);

impl WindowId {
    /// Every window, grouped or not
    pub const ALL: Self = Self(usize::MAX);
    /// Every window attached to the group a request is addressed to
    pub const WHOLE_GROUP: Self = Self(usize::MAX - 1);
    /// Largest identifier a real window can get
    pub const LAST: Self = Self(usize::MAX - 2);

    /// Wrap a raw identifier
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Raw identifier
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Whether this is one of the reserved sentinel values
    pub const fn is_sentinel(self) -> bool {
        self.0 > Self::LAST.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ALL => f.write_str("all-windows"),
            Self::WHOLE_GROUP => f.write_str("whole-group"),
            Self(raw) => write!(f, "{raw}"),
        }
    }
}

/// Identifier of a window group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(usize);

impl GroupId {
    /// Every group
    pub const ALL: Self = Self(usize::MAX);
    /// Whatever group the windows of a request belong to
    pub const ANY: Self = Self(usize::MAX - 1);
    /// No group; the answer for windows that are not attached anywhere
    pub const NONE: Self = Self(usize::MAX - 2);
    /// Largest identifier a real group can get
    pub const LAST: Self = Self(usize::MAX - 3);

    /// Wrap a raw identifier
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Raw identifier
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Whether this is one of the reserved sentinel values
    pub const fn is_sentinel(self) -> bool {
        self.0 > Self::LAST.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ALL => f.write_str("all-groups"),
            Self::ANY => f.write_str("any-group"),
            Self::NONE => f.write_str("no-group"),
            Self(raw) => write!(f, "{raw}"),
        }
    }
}

/// Identifier of a slot in the shared lock pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(usize);

impl SlotId {
    /// Raw identifier
    pub const fn raw(self) -> usize {
        self.0
    }
}

macro_rules! impl_arena_id {
    ($($id:ty),*) => {
        $(
            impl ArenaId for $id {
                fn from_index(index: usize) -> Self {
                    Self(index)
                }

                fn index(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

impl_arena_id!(WindowId, GroupId, SlotId);
