//! # Manager Configuration
//!
//! Settings for the window manager and for the default window it creates.
//! Everything is serializable so applications can keep it in a TOML or RON
//! file next to their own settings and load it through [`Config`].
//!
//! ## Wait policy
//!
//! The owning thread either polls for native events (returning immediately
//! and redrawing everything every iteration), blocks until an event or a
//! wake-up arrives, or blocks with a timeout in seconds.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// How the owning thread waits for native events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaitPolicy {
    /// Never block; redraw every window on every iteration
    Poll,
    /// Block until an event or a wake-up arrives
    #[default]
    Wait,
    /// Block for at most this many seconds
    Timeout(f64),
}

impl WaitPolicy {
    /// Wait timeout in seconds: `0` for polling, infinity for waiting
    pub fn as_timeout(self) -> f64 {
        match self {
            Self::Poll => 0.0,
            Self::Wait => f64::INFINITY,
            Self::Timeout(seconds) => seconds,
        }
    }

    /// Policy equivalent to a timeout in seconds
    pub fn from_timeout(seconds: f64) -> Self {
        if seconds <= 0.0 {
            Self::Poll
        } else if seconds.is_infinite() {
            Self::Wait
        } else {
            Self::Timeout(seconds)
        }
    }
}

/// Graphics API the native context is created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientApi {
    /// Desktop OpenGL
    #[default]
    OpenGl,
    /// OpenGL ES
    OpenGlEs,
    /// No client API; the application renders some other way
    NoApi,
}

/// Defaults for newly created windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width in screen coordinates
    pub width: u32,
    /// Height in screen coordinates
    pub height: u32,
    /// Title bar text
    pub title: String,
    /// Whether the user can resize the window
    pub resizable: bool,
    /// Whether the window is shown when created
    pub visible: bool,
    /// Context API
    pub client_api: ClientApi,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            title: "Window".to_string(),
            resizable: true,
            visible: true,
            client_api: ClientApi::OpenGl,
        }
    }
}

/// Window manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ManagerConfig {
    /// Initial wait policy of the owning thread
    pub wait_policy: WaitPolicy,
    /// Swap interval applied to every new context, if any
    pub swap_interval: Option<u32>,
    /// Defaults for new windows
    pub window: WindowConfig,
    /// `env_logger` filter installed by [`crate::WindowManager::with_config`]
    pub log_filter: Option<String>,
}

impl Config for ManagerConfig {}

impl ManagerConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let WaitPolicy::Timeout(seconds) = self.wait_policy {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(ConfigError::Invalid {
                    field: "wait_policy",
                    reason: format!("timeout must be a positive number of seconds, got {seconds}"),
                });
            }
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                reason: format!("size must be non-zero, got {}x{}", self.window.width, self.window.height),
            });
        }
        if self.log_filter.as_deref().is_some_and(|filter| filter.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "log_filter",
                reason: "filter must not be blank".to_string(),
            });
        }
        Ok(())
    }
}
