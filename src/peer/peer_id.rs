use rand::Rng as _;
use std::fmt;

use crate::metainfo::percent_encode;

const PEER_ID_PREFIX: &[u8] = b"-BW0001-";

/// A 20-byte peer identifier.
///
/// Presented in the handshake and in tracker announces. The percent-encoded
/// form used in announce URLs is computed once at construction and cached.
#[derive(Clone)]
pub struct PeerId {
    bytes: [u8; 20],
    url_encoded: String,
}

impl PeerId {
    /// Generates a fresh peer id: the Azureus-style client prefix followed
    /// by random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 20];
        bytes[..8].copy_from_slice(PEER_ID_PREFIX);
        rand::rng().fill(&mut bytes[8..]);
        Self::from_array(bytes)
    }

    /// Creates a peer id from a slice, which must be exactly 20 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Self::from_array(arr))
    }

    fn from_array(bytes: [u8; 20]) -> Self {
        let url_encoded = percent_encode(&bytes);
        Self { bytes, url_encoded }
    }

    /// Returns the raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.bytes
    }

    /// Returns the cached percent-encoded form used in announce URLs.
    pub fn url_encoded(&self) -> &str {
        &self.url_encoded
    }

    /// Returns the client tag for Azureus-style ids (`-XX0000-...`).
    pub fn client_id(&self) -> Option<&str> {
        let (frame, _) = self.bytes.split_at(8);
        match frame {
            [b'-', tag @ .., b'-'] => std::str::from_utf8(tag).ok(),
            _ => None,
        }
    }
}

impl PartialEq for PeerId {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for PeerId {}

impl std::hash::Hash for PeerId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.client_id() {
            Some(client) => write!(f, "PeerId({client})"),
            None => {
                write!(f, "PeerId(")?;
                for byte in &self.bytes[..8] {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("..)")
            }
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url_encoded)
    }
}
