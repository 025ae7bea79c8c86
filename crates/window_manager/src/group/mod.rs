//! Window groups
//!
//! Windows attached to a group are redrawn together, either inline or by the
//! group's own render thread.

pub mod registry;
pub mod window_group;

pub use registry::GroupRegistry;
pub use window_group::WindowGroup;
