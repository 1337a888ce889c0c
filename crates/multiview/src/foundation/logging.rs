//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system with the `info` level as default filter
///
/// `RUST_LOG` always takes precedence over the default.
pub fn init() {
    init_with_level("info");
}

/// Initialize the logging system with a default filter
///
/// Safe to call more than once; later calls are ignored. This matters for
/// test binaries where many tests race to set up logging.
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
    {
        log::debug!("Logging initialized (default filter: {})", level);
    }
}
