use thiserror::Error;

/// Errors produced while parsing torrent metainfo.
#[derive(Debug, Error)]
pub enum MetainfoError {
    /// The underlying bencode could not be decoded.
    #[error("bencode error: {0}")]
    Bencode(#[from] crate::bencode::BencodeError),

    /// A required field is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong type or an invalid value.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// I/O error while reading a torrent file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
