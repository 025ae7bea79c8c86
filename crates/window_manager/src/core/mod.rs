//! Core types shared by every subsystem

pub mod config;
pub mod ids;

pub use config::{ClientApi, ManagerConfig, WaitPolicy, WindowConfig};
pub use ids::{GroupId, SlotId, WindowId};
