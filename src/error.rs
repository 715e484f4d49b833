/// Errors surfaced by the reliable handshake layer.
///
/// Malformed incoming fragments are never errors; they are dropped silently
/// by the receive loop. Errors here terminate the association.
#[derive(Debug)]
pub enum Error {
    /// Wire data ended before a complete fragment header.
    ParseIncomplete,
    /// A fragment header failed to parse.
    ParseError(nom::error::ErrorKind),
    /// Fatal protocol failure, to be surfaced to the peer as the given alert.
    FatalAlert(AlertDescription),
    /// The record layer failed to carry a record.
    Transport(String),
    /// The transcript hash was finalized before `notify_hello_complete`
    /// committed it to a concrete algorithm.
    UncommittedTranscript,
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(value: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match value {
            nom::Err::Incomplete(_) => Error::ParseIncomplete,
            nom::Err::Error(x) => Error::ParseError(x.code),
            nom::Err::Failure(x) => Error::ParseError(x.code),
        }
    }
}

/// TLS alert description codes (RFC 5246 section 7.2).
///
/// Only the alerts this layer can originate are named; everything else
/// round-trips through `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDescription {
    /// An internal error unrelated to the peer or protocol correctness.
    InternalError,
    /// Any other alert code.
    Unknown(u8),
}

impl AlertDescription {
    /// Map a wire code to an alert description.
    pub fn from_u8(value: u8) -> Self {
        match value {
            80 => AlertDescription::InternalError,
            _ => AlertDescription::Unknown(value),
        }
    }

    /// The wire code for this alert description.
    pub fn to_u8(&self) -> u8 {
        match self {
            AlertDescription::InternalError => 80,
            AlertDescription::Unknown(value) => *value,
        }
    }
}
