//! OpenSSL 1.0.x: secrets read straight from the struct layout.
//!
//! The structs below mirror the leading fields of `ssl_st`, `ssl_session_st`
//! and `ssl3_state_st` as declared in the OpenSSL 1.0.1/1.0.2 headers, up to
//! and including the fields read here. Nothing past those fields is touched.

use std::ffi::{c_int, c_long, c_uint, c_void};

use crate::secret::{CLIENT_RANDOM_LEN, ClientRandom, MAX_MASTER_SECRET_LEN, MasterSecret, Ssl};

use super::SecretSource;

const SSL_MAX_SID_CTX_LENGTH: usize = 32;
const SSL_MAX_KEY_ARG_LENGTH: usize = 8;
const EVP_MAX_MD_SIZE: usize = 64;

/// Prefix of `struct ssl_session_st`.
#[allow(dead_code)] // layout only
#[repr(C)]
pub(crate) struct LegacySession {
    ssl_version: c_int,
    key_arg_length: c_uint,
    key_arg: [u8; SSL_MAX_KEY_ARG_LENGTH],
    master_key_length: c_int,
    master_key: [u8; MAX_MASTER_SECRET_LEN],
}

/// Prefix of `struct ssl3_state_st`.
#[allow(dead_code)] // layout only
#[repr(C)]
pub(crate) struct LegacySsl3State {
    flags: c_long,
    delay_buf_pop_ret: c_int,
    read_sequence: [u8; 8],
    read_mac_secret_size: c_int,
    read_mac_secret: [u8; EVP_MAX_MD_SIZE],
    write_sequence: [u8; 8],
    write_mac_secret_size: c_int,
    write_mac_secret: [u8; EVP_MAX_MD_SIZE],
    server_random: [u8; CLIENT_RANDOM_LEN],
    client_random: [u8; CLIENT_RANDOM_LEN],
}

/// Prefix of `struct ssl_st`.
#[allow(dead_code)] // layout only
#[repr(C)]
pub(crate) struct LegacySsl {
    version: c_int,
    type_: c_int,
    method: *const c_void,
    rbio: *mut c_void,
    wbio: *mut c_void,
    bbio: *mut c_void,
    rwstate: c_int,
    in_handshake: c_int,
    handshake_func: Option<unsafe extern "C" fn(*mut c_void) -> c_int>,
    server: c_int,
    new_session: c_int,
    quiet_shutdown: c_int,
    shutdown: c_int,
    state: c_int,
    rstate: c_int,
    init_buf: *mut c_void,
    init_msg: *mut c_void,
    init_num: c_int,
    init_off: c_int,
    packet: *mut u8,
    packet_length: c_uint,
    s2: *mut c_void,
    s3: *mut LegacySsl3State,
    d1: *mut c_void,
    read_ahead: c_int,
    msg_callback: *mut c_void,
    msg_callback_arg: *mut c_void,
    hit: c_int,
    param: *mut c_void,
    cipher_list: *mut c_void,
    cipher_list_by_id: *mut c_void,
    mac_flags: c_int,
    enc_read_ctx: *mut c_void,
    read_hash: *mut c_void,
    expand: *mut c_void,
    enc_write_ctx: *mut c_void,
    write_hash: *mut c_void,
    compress: *mut c_void,
    cert: *mut c_void,
    sid_ctx_length: c_uint,
    sid_ctx: [u8; SSL_MAX_SID_CTX_LENGTH],
    session: *mut LegacySession,
}

/// Reads `ssl->session->master_key` and `ssl->s3->client_random` directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectFieldAccess;

impl DirectFieldAccess {
    pub const fn libssl() -> Self {
        Self
    }
}

impl SecretSource for DirectFieldAccess {
    unsafe fn master_secret(&self, ssl: *const Ssl) -> MasterSecret {
        let Some(ssl) = (unsafe { ssl.cast::<LegacySsl>().as_ref() }) else {
            return MasterSecret::EMPTY;
        };
        let Some(session) = (unsafe { ssl.session.as_ref() }) else {
            return MasterSecret::EMPTY;
        };

        match usize::try_from(session.master_key_length) {
            Ok(len) if len > 0 => {
                MasterSecret::from_bytes(&session.master_key[..len.min(MAX_MASTER_SECRET_LEN)])
            }
            _ => MasterSecret::EMPTY,
        }
    }

    unsafe fn client_random(&self, ssl: *const Ssl) -> Option<ClientRandom> {
        let ssl = unsafe { ssl.cast::<LegacySsl>().as_ref() }?;
        let s3 = unsafe { ssl.s3.as_ref() }?;
        Some(ClientRandom(s3.client_random))
    }
}
