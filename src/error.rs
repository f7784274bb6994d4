use thiserror::Error;

use crate::parse::error::ParsingError;

/// Errors surfaced by the client, the transfer driver and the decoders.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be built or the response was rejected before streaming.
    #[error("Internal HttpClient: {0}")]
    Configuration(String),

    /// The connection or transfer failed. Carries the underlying reason verbatim.
    #[error("Internal HttpClient: {0}")]
    Transport(String),

    /// The server sent bytes that are not valid HTTP.
    #[error("Internal HttpClient: malformed response ({0:?})")]
    Protocol(ParsingError),

    /// A body could not be decoded.
    #[error("{0}")]
    Decoding(String),

    /// The server reported an error record inside the stream.
    #[error("{0}")]
    Server(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParsingError> for Error {
    fn from(err: ParsingError) -> Self {
        Error::Protocol(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::parse::error::ParsingError;

    #[test]
    fn messages() {
        assert_eq!(Error::Configuration("No handle to execute.".into()).to_string(), "Internal HttpClient: No handle to execute.");
        assert_eq!(Error::Decoding("Failed to read events.".into()).to_string(), "Failed to read events.");
        assert_eq!(Error::from(ParsingError::InvalidChunkSize).to_string(), "Internal HttpClient: malformed response (InvalidChunkSize)");
    }
}
