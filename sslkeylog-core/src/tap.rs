//! The interception protocol shared by every exported entry point.
//!
//! Each wrapped call snapshots the session's master secret, runs the real
//! libssl function, then looks again. A line is written only when a non-empty
//! secret appeared or changed during the call, so a session is logged once
//! even though handshake, read and write all pass through here.

use crate::errno::SavedErrno;
use crate::resolver::LazySymbol;
use crate::secret::{MasterSecret, Ssl};
use crate::source::{self, ActiveSource, SecretSource};
use crate::writer::{self, KeyLogSink, KeyLogWriter};

/// What happened to the key log after an intercepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// No master secret yet
    NotReady,
    /// Same secret as before the call
    Unchanged,
    /// Secret present but the client random could not be read
    MissingClientRandom,
    /// New secret, but no key log is configured
    Disabled,
    /// New secret appended to the key log
    Logged,
    /// New secret, but writing it failed
    WriteFailed,
}

/// Couples a secret source with a key-log sink.
pub struct Tap<'a, S: ?Sized, K: ?Sized> {
    source: &'a S,
    sink: &'a K,
}

impl<'a, S, K> Tap<'a, S, K>
where
    S: SecretSource + ?Sized,
    K: KeyLogSink + ?Sized,
{
    pub fn new(source: &'a S, sink: &'a K) -> Self {
        Self { source, sink }
    }

    /// Secret state before the wrapped call.
    ///
    /// # Safety
    ///
    /// `ssl` must be null or a live session of the source's ABI.
    pub unsafe fn snapshot(&self, ssl: *const Ssl) -> MasterSecret {
        unsafe { self.source.master_secret(ssl) }
    }

    /// Compare the current secret with `before` and log it if it is new.
    ///
    /// # Safety
    ///
    /// Same contract as [`Tap::snapshot`].
    pub unsafe fn observe(&self, ssl: *const Ssl, before: &MasterSecret) -> Observation {
        let current = unsafe { self.source.master_secret(ssl) };
        if current.is_empty() {
            return Observation::NotReady;
        }
        if current == *before {
            return Observation::Unchanged;
        }

        let Some(client_random) = (unsafe { self.source.client_random(ssl) }) else {
            tracing::debug!("master secret present without client random, skipping");
            return Observation::MissingClientRandom;
        };

        match self.sink.record(&client_random, &current) {
            Ok(true) => Observation::Logged,
            Ok(false) => Observation::Disabled,
            Err(e) => {
                tracing::warn!(error = %e, "failed to append to key log");
                Observation::WriteFailed
            }
        }
    }

    /// Run `call` between a snapshot and an observation of `ssl`.
    ///
    /// The result of `call` and the `errno` it left behind are handed back
    /// untouched.
    ///
    /// # Safety
    ///
    /// Same contract as [`Tap::snapshot`].
    pub unsafe fn intercept<R>(&self, ssl: *const Ssl, call: impl FnOnce() -> R) -> R {
        let before = unsafe { self.snapshot(ssl) };
        let ret = call();

        let errno = SavedErrno::save();
        let observation = unsafe { self.observe(ssl, &before) };
        tracing::trace!(?observation, "intercepted call observed");
        errno.restore();

        ret
    }

    /// Resolve `real` if needed and run it through [`Tap::intercept`].
    ///
    /// `call` receives the resolved function and forwards the original
    /// arguments to it.
    ///
    /// # Safety
    ///
    /// Same contract as [`Tap::snapshot`], and `F` must be the C signature of
    /// the symbol behind `real`.
    pub unsafe fn call_through<F: Copy, R>(
        &self,
        real: &LazySymbol<F>,
        ssl: *mut Ssl,
        call: impl FnOnce(F) -> R,
    ) -> R {
        let real = unsafe { real.get() };
        unsafe { self.intercept(ssl.cast_const(), || call(real)) }
    }
}

/// Tap reading the real libssl and writing to `SSLKEYLOGFILE`.
pub fn libssl() -> Tap<'static, ActiveSource, KeyLogWriter> {
    Tap::new(source::active(), writer::global())
}

/// Export an interposed libssl entry point.
///
/// The generated `extern "C"` function has the given C signature, resolves
/// the real implementation once, and runs it through [`libssl`]'s tap. The
/// first parameter must be the `SSL *` handle.
///
/// ```ignore
/// use std::ffi::c_int;
/// use sslkeylog_core::intercept;
///
/// intercept! {
///     fn SSL_connect(ssl: *mut Ssl) -> c_int;
/// }
/// ```
#[macro_export]
macro_rules! intercept {
    (
        $(#[$meta:meta])*
        fn $name:ident($ssl:ident: *mut Ssl $(, $arg:ident: $ty:ty)* $(,)?) -> $ret:ty;
    ) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name($ssl: *mut $crate::Ssl $(, $arg: $ty)*) -> $ret {
            type Real = unsafe extern "C" fn(*mut $crate::Ssl $(, $ty)*) -> $ret;

            const NAME: &::core::ffi::CStr = match ::core::ffi::CStr::from_bytes_with_nul(
                concat!(stringify!($name), "\0").as_bytes(),
            ) {
                Ok(name) => name,
                Err(_) => panic!("symbol name contains a NUL byte"),
            };
            static REAL: $crate::resolver::LazySymbol<Real> =
                $crate::resolver::LazySymbol::new(NAME);

            // SAFETY: `Real` is the C signature of the interposed symbol, and the
            // handle and arguments go to libssl exactly as received.
            unsafe {
                $crate::tap::libssl().call_through(&REAL, $ssl, |real| real($ssl $(, $arg)*))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::secret::{CLIENT_RANDOM_LEN, ClientRandom};
    use std::cell::{Cell, RefCell};
    use std::ffi::{c_int, c_void};

    /// A session whose secret the test moves forward by hand.
    struct FakeSession {
        secret: Cell<MasterSecret>,
        random: Option<ClientRandom>,
    }

    impl FakeSession {
        fn new() -> Self {
            Self {
                secret: Cell::new(MasterSecret::EMPTY),
                random: Some(ClientRandom([0x42; CLIENT_RANDOM_LEN])),
            }
        }

        fn as_ssl(&self) -> *const Ssl {
            (self as *const FakeSession).cast()
        }
    }

    struct FakeSource;

    impl SecretSource for FakeSource {
        unsafe fn master_secret(&self, ssl: *const Ssl) -> MasterSecret {
            unsafe { ssl.cast::<FakeSession>().as_ref() }
                .map(|s| s.secret.get())
                .unwrap_or_default()
        }

        unsafe fn client_random(&self, ssl: *const Ssl) -> Option<ClientRandom> {
            unsafe { ssl.cast::<FakeSession>().as_ref() }.and_then(|s| s.random)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: RefCell<Vec<(ClientRandom, Vec<u8>)>>,
        disabled: bool,
        failing: bool,
    }

    impl KeyLogSink for RecordingSink {
        fn record(
            &self,
            client_random: &ClientRandom,
            secret: &MasterSecret,
        ) -> Result<bool, Error> {
            if self.failing {
                // clobbers errno like a failed write(2) would
                let _ = std::fs::metadata("/sslkeylog/definitely/missing");
                return Err(std::io::Error::other("disk full").into());
            }
            if self.disabled {
                return Ok(false);
            }
            self.lines
                .borrow_mut()
                .push((*client_random, secret.as_bytes().to_vec()));
            Ok(true)
        }
    }

    #[test]
    fn test_return_value_passes_through() {
        let session = FakeSession::new();
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);

        let ret = unsafe { tap.intercept(session.as_ssl(), || -1i32) };
        assert_eq!(ret, -1);
        let ret = unsafe { tap.intercept(session.as_ssl(), || 4096usize) };
        assert_eq!(ret, 4096);
    }

    #[test]
    fn test_logged_once_per_transition() {
        let session = FakeSession::new();
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);

        // handshake in progress, handshake completes, then traffic
        for call in 0..6 {
            unsafe {
                tap.intercept(session.as_ssl(), || {
                    if call == 2 {
                        session.secret.set(MasterSecret::from_bytes(&[0xAA; 48]));
                    }
                })
            };
            let expected = if call < 2 { 0 } else { 1 };
            assert_eq!(sink.lines.borrow().len(), expected, "after call {call}");
        }

        let lines = sink.lines.borrow();
        assert_eq!(lines[0].0, ClientRandom([0x42; CLIENT_RANDOM_LEN]));
        assert_eq!(lines[0].1, vec![0xAA; 48]);
    }

    #[test]
    fn test_no_log_before_ready() {
        let session = FakeSession::new();
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);

        let before = unsafe { tap.snapshot(session.as_ssl()) };
        let observation = unsafe { tap.observe(session.as_ssl(), &before) };
        assert_eq!(observation, Observation::NotReady);
        assert!(sink.lines.borrow().is_empty());
    }

    #[test]
    fn test_secret_cleared_during_call_is_not_logged() {
        let session = FakeSession::new();
        session.secret.set(MasterSecret::from_bytes(&[1, 2, 3]));
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);

        let clear_secret = || session.secret.set(MasterSecret::EMPTY);
        unsafe { tap.intercept(session.as_ssl(), clear_secret) };
        assert!(sink.lines.borrow().is_empty());
    }

    #[test]
    fn test_changed_secret_is_logged_again() {
        let session = FakeSession::new();
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);

        for secret in [&[1u8, 2, 3][..], &[1, 2, 4], &[1, 2, 4], &[1, 2]] {
            let set_secret = || session.secret.set(MasterSecret::from_bytes(secret));
            unsafe { tap.intercept(session.as_ssl(), set_secret) };
        }

        let lines = sink.lines.borrow();
        let secrets: Vec<&[u8]> = lines.iter().map(|(_, s)| s.as_slice()).collect();
        assert_eq!(secrets, vec![&[1u8, 2, 3][..], &[1, 2, 4], &[1, 2]]);
    }

    #[test]
    fn test_missing_client_random_skips_write() {
        let mut session = FakeSession::new();
        session.random = None;
        session.secret.set(MasterSecret::from_bytes(&[9]));
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);

        let observation = unsafe { tap.observe(session.as_ssl(), &MasterSecret::EMPTY) };
        assert_eq!(observation, Observation::MissingClientRandom);
        assert!(sink.lines.borrow().is_empty());
    }

    #[test]
    fn test_disabled_and_failing_sinks_do_not_affect_result() {
        let session = FakeSession::new();
        session.secret.set(MasterSecret::from_bytes(&[5; 48]));

        let disabled = RecordingSink {
            disabled: true,
            ..Default::default()
        };
        let tap = Tap::new(&FakeSource, &disabled);
        let observation = unsafe { tap.observe(session.as_ssl(), &MasterSecret::EMPTY) };
        assert_eq!(observation, Observation::Disabled);

        let failing = RecordingSink {
            failing: true,
            ..Default::default()
        };
        let tap = Tap::new(&FakeSource, &failing);
        let observation = unsafe { tap.observe(session.as_ssl(), &MasterSecret::EMPTY) };
        assert_eq!(observation, Observation::WriteFailed);

        let ret = unsafe { tap.intercept(session.as_ssl(), || 7) };
        assert_eq!(ret, 7);
    }

    #[test]
    fn test_null_session_is_transparent() {
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);

        let ret = unsafe { tap.intercept(std::ptr::null(), || 0) };
        assert_eq!(ret, 0);
        assert!(sink.lines.borrow().is_empty());
    }

    type ReadFn = unsafe extern "C" fn(*mut Ssl, *mut c_void, c_int) -> c_int;

    /// Fills `num` bytes of `buf` and finishes the handshake on the way.
    unsafe extern "C" fn fake_read(ssl: *mut Ssl, buf: *mut c_void, num: c_int) -> c_int {
        let session = unsafe { &*ssl.cast::<FakeSession>() };
        session.secret.set(MasterSecret::from_bytes(&[0x33; 48]));
        let len = usize::try_from(num).unwrap_or(0);
        unsafe { std::ptr::write_bytes(buf.cast::<u8>(), 0x5A, len) };
        num
    }

    #[test]
    fn test_call_through_forwards_arguments_and_result() {
        let session = FakeSession::new();
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);
        let real: LazySymbol<ReadFn> = LazySymbol::resolved(c"SSL_read", fake_read);
        let ssl = session.as_ssl().cast_mut();
        let mut buf = [0u8; 16];

        for _ in 0..3 {
            let ret = unsafe {
                tap.call_through(&real, ssl, |read| read(ssl, buf.as_mut_ptr().cast(), 8))
            };
            assert_eq!(ret, 8);
        }

        assert_eq!(&buf[..8], &[0x5A; 8]);
        assert_eq!(&buf[8..], &[0; 8]);
        let lines = sink.lines.borrow();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, vec![0x33; 48]);
    }

    #[test]
    fn test_call_through_keeps_negative_result() {
        unsafe extern "C" fn fake_connect(_ssl: *mut Ssl) -> c_int {
            -1
        }

        let session = FakeSession::new();
        let sink = RecordingSink::default();
        let tap = Tap::new(&FakeSource, &sink);
        let real = LazySymbol::<unsafe extern "C" fn(*mut Ssl) -> c_int>::resolved(
            c"SSL_connect",
            fake_connect,
        );
        let ssl = session.as_ssl().cast_mut();

        let ret = unsafe { tap.call_through(&real, ssl, |connect| connect(ssl)) };
        assert_eq!(ret, -1);
        assert!(sink.lines.borrow().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_errno_from_real_call_survives() {
        let session = FakeSession::new();
        let sink = RecordingSink {
            failing: true,
            ..Default::default()
        };
        let tap = Tap::new(&FakeSource, &sink);

        unsafe {
            tap.intercept(session.as_ssl(), || {
                session.secret.set(MasterSecret::from_bytes(&[1]));
                *libc::__errno_location() = libc::ECONNRESET;
            })
        };
        assert_eq!(std::io::Error::last_os_error().raw_os_error(), Some(libc::ECONNRESET));
    }
}
