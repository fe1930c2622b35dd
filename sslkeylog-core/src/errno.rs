//! Saving and restoring `errno` around key-log bookkeeping.

use std::ffi::c_int;

#[cfg(any(target_os = "linux", target_os = "android"))]
fn errno_location() -> *mut c_int {
    unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
fn errno_location() -> *mut c_int {
    unsafe { libc::__error() }
}

/// `errno` as left by the real libssl call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedErrno(c_int);

impl SavedErrno {
    pub fn save() -> Self {
        // SAFETY: the errno location is valid for the calling thread.
        Self(unsafe { *errno_location() })
    }

    pub fn restore(self) {
        // SAFETY: as above.
        unsafe { *errno_location() = self.0 };
    }

    pub fn value(self) -> c_int {
        self.0
    }
}
