//! Build script selecting the OpenSSL ABI the secret extractor targets.
//!
//! OpenSSL 1.1.0 made `SSL` and `SSL_SESSION` opaque, so older releases can only be
//! read through their struct layout. The choice is made once here and surfaces as
//! `cfg(legacy_abi)`.

/// First OpenSSL release that hides its structs behind accessor functions.
const OPAQUE_STRUCTS_VERSION: u64 = 0x1010_0000;

fn parse_version(raw: &str) -> Option<u64> {
    let trimmed = raw.trim().trim_end_matches(['L', 'l']);
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).ok()
}

fn main() {
    println!("cargo::rustc-check-cfg=cfg(legacy_abi)");
    println!("cargo::rerun-if-env-changed=SSLKEYLOG_OPENSSL_VERSION");
    println!("cargo::rerun-if-env-changed=SSLKEYLOG_OPENSSL_SONAME");

    let feature_forced = std::env::var_os("CARGO_FEATURE_LEGACY_ABI").is_some();
    let below_threshold = match std::env::var("SSLKEYLOG_OPENSSL_VERSION") {
        Ok(raw) => match parse_version(&raw) {
            Some(version) => version < OPAQUE_STRUCTS_VERSION,
            None => {
                println!("cargo::warning=ignoring unparsable SSLKEYLOG_OPENSSL_VERSION={raw}");
                false
            }
        },
        Err(_) => false,
    };

    if feature_forced || below_threshold {
        println!("cargo::rustc-cfg=legacy_abi");
    }
}
