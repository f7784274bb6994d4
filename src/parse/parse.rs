use std::io::BufRead;

use crate::parse::error::ParsingError;
use crate::parse::parse::ParseStatus::{Done, IoErr};

/// The result of a parse call: a parsing error, a finished value, or a parser to resume later.
pub type ParseResult<T, R> = Result<ParseStatus<T, R>, ParsingError>;

/// An incremental parser over a non-blocking reader.
pub trait Parse<T>: Sized {
    /// Reads until a value is complete. If the reader fails first, typically with WouldBlock, the
    /// parser comes back with everything it has read so far so the call can be repeated once more
    /// data is available.
    fn parse(self, reader: &mut impl BufRead) -> ParseResult<T, Self>;
}

/// Where a parse call stopped.
pub enum ParseStatus<T, R> {
    Done(T),
    /// The parser to resume and the IO error that interrupted it.
    IoErr(R, std::io::Error),
}

impl<T, R> ParseStatus<T, R> {
    /// Maps the state of a blocked parser, leaving a finished value untouched.
    pub fn map_blocked<V>(self, mapper: impl FnOnce(R) -> V) -> ParseStatus<T, V> {
        match self {
            Done(value) => Done(value),
            IoErr(state, err) => IoErr(mapper(state), err)
        }
    }
}
