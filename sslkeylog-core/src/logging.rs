//! Diagnostics subscriber.
//!
//! The library lives inside someone else's process, so nothing is installed
//! unless `SSLKEYLOG_LOG` asks for it, and an already-installed global
//! subscriber is left alone.

use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber filtered by `filter`, if one is given.
///
/// Returns whether this call installed the global subscriber.
pub fn init(filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return false;
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
