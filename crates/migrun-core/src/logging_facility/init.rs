//! Logging initialization

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Logging profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, debug level
    Development,
    /// JSON lines, info level; suited to CI and deployment logs
    Production,
    /// No output; tests install `init_test_capture` instead
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Only the first call has any effect, and a subscriber installed
/// elsewhere (e.g. a test capture) is left in place. `RUST_LOG` overrides
/// the default filter of `migrun=debug` (Development) or `migrun=info`
/// (Production).
///
/// ```
/// use migrun_core::logging_facility::{init, Profile};
///
/// init(Profile::Production);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("migrun=debug")),
                )
                .try_init()
                .ok();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("migrun=info")),
                )
                .try_init()
                .ok();
        }
        Profile::Test => {}
    });
}
