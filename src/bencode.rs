//! Bencode encoding and decoding (BEP-3)
//!
//! Bencode is the encoding used by BitTorrent for storing and transmitting
//! loosely structured data: torrent files, tracker responses, and assorted
//! binary payloads.
//!
//! Decoding is strict: dictionary keys must be byte strings and must appear
//! in strictly increasing raw-byte order, with no duplicates. This guarantees
//! that re-encoding a decoded value reproduces the input byte for byte, which
//! is what info-hash computation relies on.

mod decode;
mod encode;
mod error;
mod value;

pub use decode::decode;
pub use encode::{encode, encode_to};
pub use error::BencodeError;
pub use value::Value;

#[cfg(test)]
mod tests;
