//! Foundation module - Core utilities and types
//!
//! - Identifier arenas with dense, smallest-first reuse
//! - Rank-ordered lists of shared objects
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod ranked;

pub use collections::{ArenaId, IdArena};
pub use ranked::{Rank, RankedList};
