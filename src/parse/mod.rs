/// Parsing errors.
pub mod error;
/// Parse trait and other basic parsing types.
pub mod parse;
/// Parser for the status line and headers of a response.
pub mod head;
/// Streaming decoders for response bodies.
pub mod body;

/// Parser for CRLF lines.
mod line;

/// Utility for testing parsers.
#[cfg(test)]
mod test_util;
