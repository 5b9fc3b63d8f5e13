use thiserror::Error;

/// Errors produced by the tracker clients.
///
/// These never escape an announce call: they are logged and converted to an
/// absent response at the [`Tracker`](super::Tracker) level.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bencode error: {0}")]
    Bencode(#[from] crate::bencode::BencodeError),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout")]
    Timeout,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("incomplete request: missing {0}")]
    IncompleteRequest(&'static str),
}
