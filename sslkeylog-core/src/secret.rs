//! Session handles and the secret values extracted from them.

use std::fmt;

/// `SSL3_RANDOM_SIZE`
pub const CLIENT_RANDOM_LEN: usize = 32;

/// `SSL_MAX_MASTER_KEY_LENGTH`
pub const MAX_MASTER_SECRET_LEN: usize = 48;

/// Opaque OpenSSL `SSL` connection handle.
#[repr(C)]
pub struct Ssl {
    _private: [u8; 0],
}

/// Opaque OpenSSL `SSL_SESSION` handle.
#[repr(C)]
pub struct SslSession {
    _private: [u8; 0],
}

/// Master secret captured from a session, at most 48 bytes.
///
/// An empty secret means the handshake has not produced key material yet.
/// Lives on the stack; no allocation.
#[derive(Clone, Copy)]
pub struct MasterSecret {
    bytes: [u8; MAX_MASTER_SECRET_LEN],
    len: usize,
}

impl MasterSecret {
    /// No key material negotiated.
    pub const EMPTY: Self = Self {
        bytes: [0; MAX_MASTER_SECRET_LEN],
        len: 0,
    };

    /// Copy a secret, keeping at most [`MAX_MASTER_SECRET_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut secret = Self::EMPTY;
        let len = bytes.len().min(MAX_MASTER_SECRET_LEN);
        secret.bytes[..len].copy_from_slice(&bytes[..len]);
        secret.len = len;
        secret
    }

    /// Fill the secret in place through an out-parameter style writer.
    ///
    /// `fill` receives the full 48-byte buffer and returns how many bytes it
    /// wrote; anything beyond the buffer is clamped.
    pub fn fill_with(fill: impl FnOnce(&mut [u8; MAX_MASTER_SECRET_LEN]) -> usize) -> Self {
        let mut secret = Self::EMPTY;
        secret.len = fill(&mut secret.bytes).min(MAX_MASTER_SECRET_LEN);
        secret
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for MasterSecret {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PartialEq for MasterSecret {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for MasterSecret {}

// Never print key material.
impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterSecret").field("len", &self.len).finish_non_exhaustive()
    }
}

/// The 32-byte client random of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientRandom(pub [u8; CLIENT_RANDOM_LEN]);

impl ClientRandom {
    pub fn as_bytes(&self) -> &[u8; CLIENT_RANDOM_LEN] {
        &self.0
    }
}
