//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
///
/// Calling it more than once is harmless.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize the logging system with an explicit filter, e.g. `"window_manager=debug"`
///
/// Returns false if a logger was already installed.
pub fn init_with_filter(filter: &str) -> bool {
    env_logger::Builder::new().parse_filters(filter).try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_ignored() {
        init_with_filter("window_manager=debug");
        assert!(!init_with_filter("trace"));
    }
}
