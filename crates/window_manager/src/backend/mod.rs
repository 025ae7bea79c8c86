//! Windowing system backends

pub mod headless;

#[cfg(feature = "glfw")]
pub mod glfw;

pub use headless::{EventInjector, HeadlessContext, HeadlessSystem};

#[cfg(feature = "glfw")]
pub use self::glfw::GlfwSystem;
