//! Torrent metainfo handling (BEP-3)
//!
//! This module parses `.torrent` files into a typed tree, computes the
//! info-hash that identifies a torrent, and derives the bidirectional
//! mapping between fixed-size pieces and the files they cover.

mod error;
mod info_hash;
mod mapping;
mod torrent;

pub use error::MetainfoError;
pub use info_hash::InfoHash;
pub use mapping::{MappingEntry, PieceFileMapping};
pub use torrent::{FileEntry, Info, Metainfo};

pub(crate) use info_hash::percent_encode;

#[cfg(test)]
mod tests;
