//! Environment-driven configuration.
//!
//! Everything is read once, on the first intercepted call, and kept for the
//! lifetime of the process.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Path of the key-log output file.
pub const KEYLOG_FILE_ENV: &str = "SSLKEYLOGFILE";

/// Overrides the library loaded when the host has not linked libssl itself.
pub const FALLBACK_LIBRARY_ENV: &str = "SSLKEYLOG_LIBSSL";

/// `tracing` filter directive enabling diagnostics on stderr.
pub const LOG_FILTER_ENV: &str = "SSLKEYLOG_LOG";

/// Library loaded when a symbol is not already present in the process.
///
/// Set `SSLKEYLOG_OPENSSL_SONAME` at build time to bake in another name, e.g.
/// `libssl.so.1.0.0` or `libssl.so.3`.
pub const DEFAULT_FALLBACK_LIBRARY: &str = match option_env!("SSLKEYLOG_OPENSSL_SONAME") {
    Some(name) => name,
    None => "libssl.so",
};

/// Runtime configuration for the interception core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Key-log destination; `None` disables writing entirely
    pub keylog_file: Option<PathBuf>,
    /// Library name handed to the dynamic loader as a last resort
    pub fallback_library: OsString,
    /// Filter for the stderr diagnostics subscriber
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keylog_file: None,
            fallback_library: OsString::from(DEFAULT_FALLBACK_LIBRARY),
            log_filter: None,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            keylog_file: non_empty(KEYLOG_FILE_ENV).map(PathBuf::from),
            fallback_library: non_empty(FALLBACK_LIBRARY_ENV)
                .unwrap_or_else(|| OsString::from(DEFAULT_FALLBACK_LIBRARY)),
            log_filter: non_empty(LOG_FILTER_ENV).map(|value| value.to_string_lossy().into_owned()),
        }
    }
}

static GLOBAL: LazyLock<Config> = LazyLock::new(|| {
    let config = Config::from_env();
    crate::logging::init(config.log_filter.as_deref());
    tracing::debug!(
        keylog_file = ?config.keylog_file,
        fallback_library = ?config.fallback_library,
        "sslkeylog configuration loaded"
    );
    config
});

/// Process-wide configuration, read from the environment on first access.
///
/// Also installs the diagnostics subscriber when `SSLKEYLOG_LOG` is set.
pub fn global() -> &'static Config {
    &GLOBAL
}
