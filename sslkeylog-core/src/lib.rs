//! sslkeylog-core: interception core for the sslkeylog preload library
//!
//! Captures OpenSSL session secrets as they appear and appends them to the
//! file named by `SSLKEYLOGFILE` in NSS key-log format, so tools such as
//! Wireshark can decrypt the traffic.
//!
//! - **Symbol resolution** - [`resolver::SymbolResolver`] and the per-symbol
//!   [`resolver::LazySymbol`] cache find the real libssl functions
//! - **Secret extraction** - [`source::SecretSource`] with one implementation
//!   per OpenSSL ABI, [`source::ActiveSource`] being the one this build uses
//! - **Interception** - [`tap::Tap`] and the [`intercept!`] export macro
//! - **Key log** - [`writer::KeyLogWriter`] and the [`line::KeyLogLine`] encoder
//!
//! # Architecture
//!
//! ```text
//! host ──SSL_read()──► intercept! ──► Tap::intercept
//!                                      │ snapshot   (SecretSource)
//!                                      │ real call  (LazySymbol ─► SymbolResolver)
//!                                      │ observe    (SecretSource)
//!                                      └ on change  (KeyLogWriter ─► SSLKEYLOGFILE)
//! ```

pub mod config;
pub mod errno;
pub mod error;
pub mod line;
pub mod logging;
pub mod resolver;
pub mod secret;
pub mod source;
pub mod tap;
pub mod writer;

pub use config::Config;
pub use error::Error;
pub use line::KeyLogLine;
pub use resolver::{LazySymbol, SymbolResolver};
pub use secret::{
    CLIENT_RANDOM_LEN, ClientRandom, MAX_MASTER_SECRET_LEN, MasterSecret, Ssl, SslSession,
};
pub use source::{AccessorFunctionBased, ActiveSource, DirectFieldAccess, SecretSource};
pub use tap::{Observation, Tap};
pub use writer::{KeyLogSink, KeyLogWriter};
