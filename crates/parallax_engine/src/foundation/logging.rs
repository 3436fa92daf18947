//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default filter, still overridable by `RUST_LOG`.
///
/// `filters` uses the `env_logger` syntax, e.g. `"info"` or
/// `"parallax_engine=debug"`. Calling this twice is harmless; the second
/// attempt is ignored.
pub fn init_with_level(filters: &str) {
    let _ = env_logger::Builder::new()
        .parse_filters(filters)
        .parse_env("RUST_LOG")
        .try_init();
}
