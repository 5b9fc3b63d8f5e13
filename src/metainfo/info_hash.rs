use sha1::{Digest, Sha1};
use std::fmt;
use std::io::Write;

use super::error::MetainfoError;
use crate::bencode::{encode_to, Value};

/// Digest input is fed in chunks of at most this size.
const DIGEST_CHUNK: usize = 64 * 1024;

/// A 20-byte SHA-1 info hash identifying a torrent.
///
/// The info hash is the SHA-1 of the canonical bencode encoding of a
/// torrent's `info` dictionary. It is the torrent's identity on trackers and
/// in the peer handshake.
///
/// The uppercase hex form and the percent-encoded form used in tracker
/// announce URLs are computed once at construction and cached.
///
/// # Examples
///
/// ```
/// use bitwire::metainfo::InfoHash;
///
/// let hash = InfoHash::from_bytes([0xab; 20]);
/// assert_eq!(hash.hex().len(), 40);
/// assert!(hash.url_encoded().starts_with("%AB"));
/// ```
#[derive(Clone)]
pub struct InfoHash {
    bytes: [u8; 20],
    hex: String,
    url_encoded: String,
}

impl InfoHash {
    /// Creates an info hash from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        let hex = bytes.iter().fold(String::with_capacity(40), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{:02X}", b);
            s
        });
        let url_encoded = percent_encode(&bytes);
        Self {
            bytes,
            hex,
            url_encoded,
        }
    }

    /// Creates an info hash from a byte slice, which must be exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Self::from_bytes(arr))
    }

    /// Computes the info hash of a bencode value.
    ///
    /// The value is re-encoded in canonical form directly into the SHA-1
    /// digest; at most 64 KiB are buffered at a time and no encoded copy is
    /// materialized.
    pub fn of_value(value: &Value) -> Result<Self, MetainfoError> {
        let mut sink = DigestSink {
            hasher: Sha1::new(),
        };
        encode_to(value, &mut sink)?;
        let hash: [u8; 20] = sink.hasher.finalize().into();
        Ok(Self::from_bytes(hash))
    }

    /// Returns the raw 20 bytes of the hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.bytes
    }

    /// Returns the cached 40-character uppercase hex form.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Returns the cached percent-encoded form used in announce URLs.
    pub fn url_encoded(&self) -> &str {
        &self.url_encoded
    }
}

impl PartialEq for InfoHash {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for InfoHash {}

impl std::hash::Hash for InfoHash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.hex)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// Percent-encodes raw bytes for use in a URL query string.
///
/// Unreserved characters pass through; every other byte becomes `%XX`.
pub(crate) fn percent_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut s, &b| {
        use std::fmt::Write;
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' || b == b'~' {
            s.push(b as char);
        } else {
            let _ = write!(s, "%{:02X}", b);
        }
        s
    })
}

struct DigestSink {
    hasher: Sha1,
}

impl Write for DigestSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for chunk in buf.chunks(DIGEST_CHUNK) {
            self.hasher.update(chunk);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
