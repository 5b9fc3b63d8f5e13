use thiserror::Error;

/// Errors that can occur during bencode encoding or decoding.
///
/// # Examples
///
/// ```
/// use bitwire::bencode::{decode, BencodeError};
///
/// // Truncated input
/// assert!(matches!(decode(b"i42"), Err(BencodeError::UnexpectedEof)));
///
/// // Leading zeros are rejected
/// assert!(matches!(decode(b"i007e"), Err(BencodeError::InvalidInteger(_))));
///
/// // Dictionary keys must be sorted
/// assert!(matches!(
///     decode(b"d4:spam4:eggs3:cow3:mooe"),
///     Err(BencodeError::UnorderedDictionary)
/// ));
/// ```
#[derive(Debug, Error)]
pub enum BencodeError {
    /// Input ended before a complete value was parsed.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Integer is malformed (empty, `-0`, leading zeros, or overflow).
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Byte string length prefix is not a valid number.
    #[error("invalid string length")]
    InvalidStringLength,

    /// Byte string length exceeds the decoder limit.
    #[error("string length {0} exceeds limit")]
    LengthOverflow(u64),

    /// Dictionary key is not a byte string.
    #[error("dictionary key is not a byte string")]
    InvalidKeyType,

    /// Dictionary keys are not in strictly increasing byte order.
    #[error("unordered dictionary keys")]
    UnorderedDictionary,

    /// The same key appears twice in a dictionary.
    #[error("duplicate dictionary key")]
    DuplicateKey,

    /// Encountered an unexpected byte while parsing.
    #[error("unexpected byte: 0x{0:02x}")]
    UnexpectedByte(u8),

    /// Extra data exists after the bencode value.
    #[error("trailing data after value")]
    TrailingData,

    /// Recursion limit exceeded.
    #[error("nesting too deep")]
    NestingTooDeep,

    /// I/O error during encoding.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
