use std::io;
use thiserror::Error;

use crate::types::header_id::HeaderKind;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the SIP message core
///
/// Absence of a header is never an error; lookups return `Option`.
/// Out-of-bounds access on a [`ByteView`](crate::types::ByteView) is a
/// programming error and panics instead of producing a variant here.
#[derive(Error, Debug)]
pub enum Error {
    /// A list accessor was used on a singular header, or the other way around
    #[error("Header type mismatch: {header} is a {actual:?} header")]
    HeaderTypeMismatch {
        /// Canonical name of the header that was accessed
        header: String,
        /// The kind the header actually has
        actual: HeaderKind,
    },

    /// The classic transaction key could not be built from the message
    #[error("Can't build transaction key: {0}")]
    KeyDerivationFailed(String),

    /// The finalized buffer no longer matches the header graph
    #[error("Finalized buffer is stale: a mutation did not invalidate the cache")]
    StaleCacheInvariantViolation,

    /// Grammar error surfaced while parsing a header value or framing a message
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration value out of range or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output error while writing to a sink
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        let detail = match err {
            nom::Err::Incomplete(_) => "incomplete input".to_string(),
            nom::Err::Error(e) | nom::Err::Failure(e) => format!(
                "{:?} at {:?}",
                e.code,
                String::from_utf8_lossy(&e.input[..e.input.len().min(32)])
            ),
        };
        Error::Parse(detail)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
