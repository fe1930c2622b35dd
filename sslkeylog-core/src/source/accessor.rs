//! OpenSSL >= 1.1.0: secrets through exported accessor functions.

use crate::resolver::LazySymbol;
use crate::secret::{CLIENT_RANDOM_LEN, ClientRandom, MasterSecret, Ssl, SslSession};

use super::SecretSource;

/// `SSL_SESSION *SSL_get_session(const SSL *ssl)`
pub type GetSessionFn = unsafe extern "C" fn(*const Ssl) -> *mut SslSession;

/// `size_t SSL_SESSION_get_master_key(const SSL_SESSION *, unsigned char *out, size_t outlen)`
pub type GetMasterKeyFn = unsafe extern "C" fn(*const SslSession, *mut u8, usize) -> usize;

/// `size_t SSL_get_client_random(const SSL *ssl, unsigned char *out, size_t outlen)`
pub type GetClientRandomFn = unsafe extern "C" fn(*const Ssl, *mut u8, usize) -> usize;

/// Reads secrets through libssl's accessors, each resolved on first use.
pub struct AccessorFunctionBased {
    get_session: LazySymbol<GetSessionFn>,
    get_master_key: LazySymbol<GetMasterKeyFn>,
    get_client_random: LazySymbol<GetClientRandomFn>,
}

impl AccessorFunctionBased {
    /// Accessors looked up in libssl by name.
    pub const fn libssl() -> Self {
        Self {
            get_session: LazySymbol::new(c"SSL_get_session"),
            get_master_key: LazySymbol::new(c"SSL_SESSION_get_master_key"),
            get_client_random: LazySymbol::new(c"SSL_get_client_random"),
        }
    }

    /// Accessors supplied directly, e.g. by an embedding that links libssl.
    pub fn with_functions(
        get_session: GetSessionFn,
        get_master_key: GetMasterKeyFn,
        get_client_random: GetClientRandomFn,
    ) -> Self {
        Self {
            get_session: LazySymbol::resolved(c"SSL_get_session", get_session),
            get_master_key: LazySymbol::resolved(c"SSL_SESSION_get_master_key", get_master_key),
            get_client_random: LazySymbol::resolved(c"SSL_get_client_random", get_client_random),
        }
    }
}

impl SecretSource for AccessorFunctionBased {
    unsafe fn master_secret(&self, ssl: *const Ssl) -> MasterSecret {
        if ssl.is_null() {
            return MasterSecret::EMPTY;
        }

        let session = unsafe { (self.get_session.get())(ssl) };
        if session.is_null() {
            return MasterSecret::EMPTY;
        }

        let get_master_key = unsafe { self.get_master_key.get() };
        MasterSecret::fill_with(|buf| unsafe {
            get_master_key(session, buf.as_mut_ptr(), buf.len())
        })
    }

    unsafe fn client_random(&self, ssl: *const Ssl) -> Option<ClientRandom> {
        if ssl.is_null() {
            return None;
        }

        let mut random = [0u8; CLIENT_RANDOM_LEN];
        let get_client_random = unsafe { self.get_client_random.get() };
        let copied = unsafe { get_client_random(ssl, random.as_mut_ptr(), random.len()) };
        (copied == CLIENT_RANDOM_LEN).then_some(ClientRandom(random))
    }
}
