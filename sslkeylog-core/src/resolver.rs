//! Locating the real implementation of an intercepted symbol.
//!
//! Lookup order:
//! 1. `dlsym(RTLD_NEXT, name)`: the next definition after this library, which
//!    is libssl whenever the host links it.
//! 2. The fallback library, loaded by name when the host has not linked libssl.
//!
//! A symbol found in neither place is fatal.

use std::ffi::{CStr, OsString, c_void};
use std::io::Write;
use std::ptr::NonNull;
use std::sync::{LazyLock, OnceLock};

use libloading::os::unix::{Library, RTLD_LAZY};

use crate::error::Error;

/// Resolves symbols against the live process image, then a fallback library.
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    fallback_library: OsString,
}

impl SymbolResolver {
    pub fn new(fallback_library: impl Into<OsString>) -> Self {
        Self {
            fallback_library: fallback_library.into(),
        }
    }

    /// Look `name` up among the objects loaded after this one.
    pub fn lookup_loaded(&self, name: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: `name` is NUL-terminated and RTLD_NEXT is a valid pseudo-handle.
        NonNull::new(unsafe { libc::dlsym(libc::RTLD_NEXT, name.as_ptr()) })
    }

    /// Load the fallback library and look `name` up in it.
    ///
    /// A library that provided the symbol is never unloaded, so the returned
    /// pointer stays valid for the rest of the process.
    pub fn lookup_fallback(&self, name: &CStr) -> Result<NonNull<c_void>, Error> {
        // SAFETY: loading libssl runs its initialisers, which is what the host
        // would have done had it linked the library itself.
        let library = unsafe { Library::open(Some(&self.fallback_library), RTLD_LAZY) }
            .map_err(|source| Error::FallbackLoad {
                library: self.fallback_library.to_string_lossy().into_owned(),
                source,
            })?;

        // SAFETY: the symbol is only read as an address here.
        let found = match unsafe { library.get::<*mut c_void>(name.to_bytes_with_nul()) } {
            Ok(symbol) => NonNull::new(*symbol),
            Err(e) => {
                tracing::debug!(
                    symbol = ?name,
                    error = %e,
                    "symbol missing from fallback library"
                );
                None
            }
        };

        match found {
            Some(symbol) => {
                std::mem::forget(library);
                Ok(symbol)
            }
            None => Err(Error::SymbolNotFound {
                symbol: name.to_string_lossy().into_owned(),
                library: self.fallback_library.to_string_lossy().into_owned(),
            }),
        }
    }

    /// Resolve `name`, trying the process image before the fallback library.
    pub fn resolve(&self, name: &CStr) -> Result<NonNull<c_void>, Error> {
        if let Some(symbol) = self.lookup_loaded(name) {
            tracing::debug!(symbol = ?name, "resolved in process image");
            return Ok(symbol);
        }

        tracing::debug!(
            symbol = ?name,
            library = ?self.fallback_library,
            "symbol not loaded, trying fallback library"
        );
        self.lookup_fallback(name)
    }

    /// Resolve `name` or abort the process.
    ///
    /// An intercepted call without its real implementation cannot be
    /// forwarded, and returning a fake result would break the host silently.
    pub fn resolve_or_abort(&self, name: &CStr) -> NonNull<c_void> {
        match self.resolve(name) {
            Ok(symbol) => symbol,
            Err(e) => {
                tracing::error!(symbol = ?name, error = %e, "symbol lookup failed, aborting");
                let _ = writeln!(std::io::stderr(), "sslkeylog: {e}");
                std::process::abort();
            }
        }
    }
}

static GLOBAL: LazyLock<SymbolResolver> =
    LazyLock::new(|| SymbolResolver::new(crate::config::global().fallback_library.clone()));

/// Process-wide resolver using the configured fallback library.
pub fn global() -> &'static SymbolResolver {
    &GLOBAL
}

/// A typed function pointer resolved on first use and cached for the process.
///
/// `F` must be an `unsafe extern "C" fn` type matching the C declaration of
/// the symbol.
pub struct LazySymbol<F> {
    name: &'static CStr,
    slot: OnceLock<F>,
}

impl<F: Copy> LazySymbol<F> {
    pub const fn new(name: &'static CStr) -> Self {
        Self {
            name,
            slot: OnceLock::new(),
        }
    }

    /// A slot that is already filled, bypassing resolution.
    pub fn resolved(name: &'static CStr, function: F) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(function);
        Self { name, slot }
    }

    pub fn name(&self) -> &'static CStr {
        self.name
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.get().is_some()
    }

    /// The cached function, resolved through the global resolver on first call.
    ///
    /// # Safety
    ///
    /// `F` must be the function pointer type of the named C symbol.
    pub unsafe fn get(&self) -> F {
        unsafe { self.get_with(global()) }
    }

    /// Like [`LazySymbol::get`], resolving through `resolver` on first call.
    ///
    /// # Safety
    ///
    /// `F` must be the function pointer type of the named C symbol.
    pub unsafe fn get_with(&self, resolver: &SymbolResolver) -> F {
        *self.slot.get_or_init(|| {
            let raw = resolver.resolve_or_abort(self.name);
            unsafe { cast_function::<F>(raw) }
        })
    }
}

/// Reinterpret a symbol address as the function pointer type `F`.
unsafe fn cast_function<F: Copy>(raw: NonNull<c_void>) -> F {
    const {
        assert!(
            std::mem::size_of::<F>() == std::mem::size_of::<*mut c_void>(),
            "LazySymbol requires a function pointer type"
        )
    };
    unsafe { std::mem::transmute_copy::<*mut c_void, F>(&raw.as_ptr()) }
}
