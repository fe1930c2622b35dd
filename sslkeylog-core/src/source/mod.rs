//! Reading secrets out of an OpenSSL session.
//!
//! OpenSSL 1.1.0 hid `SSL` and `SSL_SESSION` behind accessor functions. Both
//! ways of reading them are implemented; the build picks one as
//! [`ActiveSource`] and the interception layer never branches per call.

mod accessor;
mod legacy;

pub use accessor::{AccessorFunctionBased, GetClientRandomFn, GetMasterKeyFn, GetSessionFn};
pub use legacy::DirectFieldAccess;

use crate::secret::{ClientRandom, MasterSecret, Ssl};

/// Something that can read the master secret and client random of a session.
pub trait SecretSource {
    /// Current master secret of `ssl`, empty until the handshake derived one.
    ///
    /// # Safety
    ///
    /// `ssl` must be null or point to a live `SSL` of the ABI this source reads.
    unsafe fn master_secret(&self, ssl: *const Ssl) -> MasterSecret;

    /// Client random of `ssl`.
    ///
    /// Only meaningful once [`SecretSource::master_secret`] is non-empty.
    ///
    /// # Safety
    ///
    /// Same contract as [`SecretSource::master_secret`].
    unsafe fn client_random(&self, ssl: *const Ssl) -> Option<ClientRandom>;
}

/// Secret source compiled into this build.
#[cfg(legacy_abi)]
pub type ActiveSource = DirectFieldAccess;

/// Secret source compiled into this build.
#[cfg(not(legacy_abi))]
pub type ActiveSource = AccessorFunctionBased;

static ACTIVE: ActiveSource = ActiveSource::libssl();

/// The process-wide source reading the real libssl.
pub fn active() -> &'static ActiveSource {
    &ACTIVE
}
