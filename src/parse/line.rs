use std::io::{BufRead, ErrorKind, Read};

use crate::parse::error::ParsingError;
use crate::parse::parse::{Parse, ParseResult};
use crate::parse::parse::ParseStatus::{Done, IoErr};

/// Longest accepted status, header or chunk-size line in bytes, terminator included.
pub const MAX_LINE_SIZE: usize = 8192;

/// Parses a CRLF terminated line.
///
/// Bytes are collected raw until the '\n', so a read that blocks in the middle of a multi-byte
/// character loses nothing. EOF before the '\n' is reported as UnexpectedEof.
pub struct CrlfLineParser {
    line: Vec<u8>,
}

impl CrlfLineParser {
    pub fn new() -> CrlfLineParser {
        CrlfLineParser { line: vec![] }
    }

    /// Returns how many bytes of the line have been read so far.
    pub fn read_so_far(&self) -> usize {
        self.line.len()
    }
}

impl Parse<String> for CrlfLineParser {
    fn parse(mut self, reader: &mut impl BufRead) -> ParseResult<String, Self> {
        let limit = (MAX_LINE_SIZE - self.line.len()) as u64;
        if let Err(err) = reader.by_ref().take(limit).read_until(b'\n', &mut self.line) {
            return Ok(IoErr(self, err));
        }

        match self.line.last() {
            Some(b'\n') => {
                self.line.pop();
                Ok(Done(decode_line(self.line)?))
            }
            _ if self.line.len() >= MAX_LINE_SIZE => Err(ParsingError::LineTooLong),
            _ => Ok(IoErr(self, ErrorKind::UnexpectedEof.into()))
        }
    }
}

/// Strips the '\r' left after the '\n' was removed, then decodes the line as UTF-8.
fn decode_line(mut line: Vec<u8>) -> Result<String, ParsingError> {
    match line.pop() {
        Some(b'\r') => String::from_utf8(line).map_err(|_| ParsingError::InvalidUtf8),
        _ => Err(ParsingError::BadSyntax)
    }
}
