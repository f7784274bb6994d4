use std::cmp::min;
use std::io::{BufRead, Error, ErrorKind};

use crate::common::header::{HeaderMap, HeaderMapOps};
use crate::common::header;
use crate::parse::body::BodyDecoder::{Chunked, Empty, UntilEof, WithSize};
use crate::parse::body::chunked::ChunksDecoder;
use crate::parse::error::ParsingError;
use crate::parse::parse::{ParseResult, ParseStatus};
use crate::parse::parse::ParseStatus::{Done, IoErr};

/// Streaming decoder for a response body. Decoded bytes are handed to a callback as soon as they
/// are read, so the body is never held in memory as a whole.
pub enum BodyDecoder {
    /// Content-Length framing with the number of bytes still expected.
    WithSize(u64),
    /// No framing, the body ends when the connection closes.
    UntilEof,
    Chunked(ChunksDecoder),
    Empty,
}

impl BodyDecoder {
    /// Picks the framing for a response with the given status and headers.
    pub fn new(status_code: u16, headers: &HeaderMap) -> Result<BodyDecoder, ParsingError> {
        if (100..200).contains(&status_code) || status_code == 204 || status_code == 304 {
            Ok(Empty)
        } else if is_chunked_transfer_encoding(headers) {
            Ok(Chunked(ChunksDecoder::new()))
        } else if let Some(size) = get_content_length(headers) {
            match size? {
                0 => Ok(Empty),
                size => Ok(WithSize(size))
            }
        } else {
            Ok(UntilEof)
        }
    }

    /// Reads and forwards body data until the body is complete or an IO error stops it.
    pub fn decode(self, reader: &mut impl BufRead, on_data: &mut impl FnMut(&[u8])) -> ParseResult<(), Self> {
        Ok(match self {
            WithSize(remaining) => read_sized(reader, remaining, on_data).map_blocked(WithSize),
            UntilEof => read_until_eof(reader, on_data),
            Chunked(decoder) => decoder.decode(reader, on_data)?.map_blocked(Chunked),
            Empty => Done(())
        })
    }
}

/// Gets the value of a content-length header from the given header map. May return None if there's
/// no content-length header, or an error if the content-length value can not be parsed.
fn get_content_length(headers: &HeaderMap) -> Option<Result<u64, ParsingError>> {
    headers.get_first_header_value(&header::CONTENT_LENGTH)
        .map(|value| value.trim().parse().map_err(|_| ParsingError::InvalidHeaderValue))
}

/// Checks if the header map has chunked transfer encoding header value.
fn is_chunked_transfer_encoding(headers: &HeaderMap) -> bool {
    headers.get_first_header_value(&header::TRANSFER_ENCODING)
        .map(|v| v.to_ascii_lowercase().contains("chunked")).unwrap_or(false)
}

/// Hands at most limit buffered bytes to on_data. Returns 0 at EOF.
fn forward(reader: &mut impl BufRead, limit: u64, on_data: &mut impl FnMut(&[u8])) -> std::io::Result<usize> {
    let buf = reader.fill_buf()?;
    let amount = min(buf.len() as u64, limit) as usize;
    if amount > 0 {
        on_data(&buf[..amount]);
    }
    reader.consume(amount);
    Ok(amount)
}

fn read_sized(reader: &mut impl BufRead, mut remaining: u64, on_data: &mut impl FnMut(&[u8])) -> ParseStatus<(), u64> {
    while remaining > 0 {
        match forward(reader, remaining, on_data) {
            Ok(0) => return IoErr(remaining, Error::from(ErrorKind::UnexpectedEof)),
            Ok(amount) => remaining -= amount as u64,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return IoErr(remaining, err)
        }
    }
    Done(())
}

fn read_until_eof(reader: &mut impl BufRead, on_data: &mut impl FnMut(&[u8])) -> ParseStatus<(), BodyDecoder> {
    loop {
        match forward(reader, u64::MAX, on_data) {
            Ok(0) => return Done(()),
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            // TLS peers often close without close_notify. For a close-delimited body that is the end.
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Done(()),
            Err(err) => return IoErr(UntilEof, err)
        }
    }
}

/// Chunked transfer-encoding body decoder.
/// A chunked body might look like:
/// A\r\n
/// 0123456789\r\n
/// 0\r\n
/// \r\n
mod chunked {
    use std::io::{BufRead, ErrorKind};

    use crate::parse::body::chunked::State::{Data, Finished, Size, TailingCrlf, Trailers};
    use crate::parse::body::read_sized;
    use crate::parse::line::CrlfLineParser;
    use crate::parse::error::ParsingError;
    use crate::parse::parse::{Parse, ParseResult, ParseStatus};
    use crate::parse::parse::ParseStatus::{Done, IoErr};

    /// A decoder for a chunked transfer-encoding body.
    pub struct ChunksDecoder {
        state: State,
    }

    /// The state of the chunk decoder.
    enum State {
        /// The size of the chunk is being parsed.
        Size(CrlfLineParser),
        /// The content of the chunk is being forwarded. Holds the bytes left in the chunk.
        Data(u64),
        /// The tailing CRLF after the data is being parsed.
        TailingCrlf(CrlfLineParser),
        /// Trailer lines after the last chunk, up to the terminating empty line.
        Trailers(CrlfLineParser),
        /// A 0 length chunk and its trailers have been parsed.
        Finished,
    }

    impl ChunksDecoder {
        pub fn new() -> ChunksDecoder {
            ChunksDecoder { state: Size(CrlfLineParser::new()) }
        }

        pub fn decode(self, reader: &mut impl BufRead, on_data: &mut impl FnMut(&[u8])) -> ParseResult<(), Self> {
            let mut state = self.state;

            loop {
                let result = match state {
                    Size(parser) => size_state(reader, parser)?,
                    Data(remaining) => data_state(reader, remaining, on_data),
                    TailingCrlf(parser) => tailing_crlf_state(reader, parser)?,
                    Trailers(parser) => trailers_state(reader, parser)?,
                    Finished => return Ok(Done(()))
                };

                state = match result {
                    Done(state) => state,
                    IoErr(state, err) => return Ok(IoErr(Self { state }, err))
                }
            }
        }
    }

    /// Parses the size of a chunk. A zero size moves on to the trailers.
    fn size_state(reader: &mut impl BufRead, parser: CrlfLineParser) -> ParseResult<State, State> {
        Ok(match parser.parse(reader)? {
            Done(raw) => match parse_chunk_size(&raw)? {
                0 => Done(Trailers(CrlfLineParser::new())),
                size => Done(Data(size))
            },
            IoErr(parser, err) => IoErr(Size(parser), err)
        })
    }

    /// Forwards the content of a chunk.
    fn data_state(reader: &mut impl BufRead, remaining: u64, on_data: &mut impl FnMut(&[u8])) -> ParseStatus<State, State> {
        match read_sized(reader, remaining, on_data) {
            Done(()) => Done(TailingCrlf(CrlfLineParser::new())),
            IoErr(remaining, err) => IoErr(Data(remaining), err)
        }
    }

    /// Parses the CRLF after a chunk's content. Any extra data before it is a syntax error.
    fn tailing_crlf_state(reader: &mut impl BufRead, parser: CrlfLineParser) -> ParseResult<State, State> {
        Ok(match parser.parse(reader)? {
            Done(line) if !line.is_empty() => Err(ParsingError::BadSyntax)?,
            Done(_) => Done(Size(CrlfLineParser::new())),
            IoErr(parser, err) => IoErr(TailingCrlf(parser), err)
        })
    }

    /// Skips trailer lines until the empty line that ends the body.
    fn trailers_state(reader: &mut impl BufRead, parser: CrlfLineParser) -> ParseResult<State, State> {
        Ok(match parser.parse(reader)? {
            Done(line) if line.is_empty() => Done(Finished),
            Done(_) => Done(Trailers(CrlfLineParser::new())),
            IoErr(parser, err) if err.kind() == ErrorKind::UnexpectedEof && parser.read_so_far() == 0 => {
                // Some servers close right after the last chunk size line.
                Done(Finished)
            }
            IoErr(parser, err) => IoErr(Trailers(parser), err)
        })
    }

    /// Parses the chunk size from the given line, ignoring chunk extensions.
    fn parse_chunk_size(raw: &str) -> Result<u64, ParsingError> {
        let size = raw.split(';').next().unwrap_or("").trim();
        u64::from_str_radix(size, 16).map_err(|_| ParsingError::InvalidChunkSize)
    }
}
