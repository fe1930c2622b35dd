//! sslkeylog - dump OpenSSL master secrets for traffic decryption
//!
//! Preload this library into any program using OpenSSL and the secrets of
//! its TLS sessions are appended to `SSLKEYLOGFILE`:
//!
//! ```bash
//! cargo build --release
//! SSLKEYLOGFILE=premaster.txt LD_PRELOAD=target/release/libsslkeylog.so openssl s_client ...
//! ```
//!
//! `SSLKEYLOG_LIBSSL` names the library to load when the program does not
//! link libssl itself, and `SSLKEYLOG_LOG=debug` prints diagnostics on stderr.
//! Build with `--features legacy-abi` (or `SSLKEYLOG_OPENSSL_VERSION` below
//! `0x10100000`) for OpenSSL 1.0.x.

use std::ffi::{c_int, c_void};

use sslkeylog_core::intercept;

intercept! {
    /// `int SSL_connect(SSL *ssl)`
    fn SSL_connect(ssl: *mut Ssl) -> c_int;
}

intercept! {
    /// `int SSL_do_handshake(SSL *ssl)`
    fn SSL_do_handshake(ssl: *mut Ssl) -> c_int;
}

intercept! {
    /// `int SSL_accept(SSL *ssl)`
    fn SSL_accept(ssl: *mut Ssl) -> c_int;
}

intercept! {
    /// `int SSL_read(SSL *ssl, void *buf, int num)`
    fn SSL_read(ssl: *mut Ssl, buf: *mut c_void, num: c_int) -> c_int;
}

intercept! {
    /// `int SSL_write(SSL *ssl, const void *buf, int num)`
    fn SSL_write(ssl: *mut Ssl, buf: *const c_void, num: c_int) -> c_int;
}
