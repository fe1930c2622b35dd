//! NSS key-log line encoding.
//!
//! Format reference:
//! <https://developer.mozilla.org/en-US/docs/Mozilla/Projects/NSS/Key_Log_Format>

use crate::error::Error;
use crate::secret::{CLIENT_RANDOM_LEN, ClientRandom, MAX_MASTER_SECRET_LEN, MasterSecret};

/// Label for TLS 1.2 and earlier master secrets.
pub const LABEL: &[u8] = b"CLIENT_RANDOM ";

/// Header written to a freshly created key log.
pub const HEADER: &[u8] = b"# SSL key logfile generated by sslkeylog\n";

/// Longest possible line: label, random, space, 48-byte secret, newline.
pub const MAX_LINE_LEN: usize =
    LABEL.len() + 2 * CLIENT_RANDOM_LEN + 1 + 2 * MAX_MASTER_SECRET_LEN + 1;

/// One encoded `CLIENT_RANDOM` line in a fixed stack buffer.
#[derive(Clone, Copy)]
pub struct KeyLogLine {
    buf: [u8; MAX_LINE_LEN],
    len: usize,
}

impl KeyLogLine {
    /// Encode `CLIENT_RANDOM <random> <secret>\n` with uppercase hex digits.
    pub fn encode(client_random: &ClientRandom, secret: &MasterSecret) -> Result<Self, Error> {
        let mut buf = [0u8; MAX_LINE_LEN];
        let mut pos = 0;

        buf[..LABEL.len()].copy_from_slice(LABEL);
        pos += LABEL.len();

        pos += encode_upper(client_random.as_bytes(), &mut buf[pos..])?;
        buf[pos] = b' ';
        pos += 1;

        pos += encode_upper(secret.as_bytes(), &mut buf[pos..])?;
        buf[pos] = b'\n';
        pos += 1;

        Ok(Self { buf, len: pos })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Hex encode `input` into the front of `out`, returning the bytes written.
fn encode_upper(input: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let written = input.len() * 2;
    let out = &mut out[..written];
    hex::encode_to_slice(input, out)?;
    out.make_ascii_uppercase();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_random() -> ClientRandom {
        let mut bytes = [0u8; CLIENT_RANDOM_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (i + 1) as u8;
        }
        ClientRandom(bytes)
    }

    #[test]
    fn test_encodes_reference_line() {
        let secret = MasterSecret::from_bytes(&[0xAA, 0xBB]);
        let line = KeyLogLine::encode(&sequential_random(), &secret).unwrap();

        assert_eq!(
            line.as_bytes(),
            b"CLIENT_RANDOM 0102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F20 AABB\n"
        );
    }

    #[test]
    fn test_full_length_secret_fills_buffer() {
        let secret = MasterSecret::from_bytes(&[0xFF; MAX_MASTER_SECRET_LEN]);
        let line = KeyLogLine::encode(&ClientRandom([0; CLIENT_RANDOM_LEN]), &secret).unwrap();

        assert_eq!(line.len(), MAX_LINE_LEN);
        assert_eq!(MAX_LINE_LEN, 176);
        assert!(line.as_bytes().ends_with(b"FFFF\n"));
    }

    #[test]
    fn test_hex_digits_are_uppercase() {
        let secret = MasterSecret::from_bytes(&[0xde, 0xad, 0xbe, 0xef]);
        let line = KeyLogLine::encode(&ClientRandom([0xcd; CLIENT_RANDOM_LEN]), &secret).unwrap();
        let text = std::str::from_utf8(line.as_bytes()).unwrap();

        assert!(text.ends_with(" DEADBEEF\n"));
        assert!(!text[LABEL.len()..].chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_header_is_single_line() {
        assert!(HEADER.starts_with(b"# "));
        assert_eq!(HEADER.iter().filter(|&&b| b == b'\n').count(), 1);
        assert!(HEADER.ends_with(b"\n"));
    }
}
