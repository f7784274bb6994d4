use std::fmt::Debug;
use std::io::{BufReader, ErrorKind, Read};

use crate::parse::error::ParsingError;
use crate::parse::parse::{Parse, ParseResult};
use crate::parse::parse::ParseStatus::{Done, IoErr};
use crate::util::mock::{EndlessMockReader, MockReader};

/// The outcome of one parse call, in a form assertions can compare.
#[derive(Debug, Eq, PartialEq)]
pub enum TestParseResult<T> {
    Value(T),
    IoErr(ErrorKind),
    ParseErr(ParsingError),
}

impl<T> TestParseResult<T> {
    pub fn map<V>(self, f: impl FnOnce(T) -> V) -> TestParseResult<V> {
        match self {
            TestParseResult::Value(value) => TestParseResult::Value(f(value)),
            TestParseResult::IoErr(kind) => TestParseResult::IoErr(kind),
            TestParseResult::ParseErr(err) => TestParseResult::ParseErr(err)
        }
    }
}

impl<T> From<ErrorKind> for TestParseResult<T> {
    fn from(kind: ErrorKind) -> Self {
        TestParseResult::IoErr(kind)
    }
}

/// Runs the parser in steps against a reader that blocks whenever it runs dry. Each step hands
/// the reader more fragments (an empty fragment means EOF) and checks what the parse call returns.
/// A parser that blocked is resumed in the next step.
pub fn test_blocking<T: Debug + PartialEq>(parser: impl Parse<T>, steps: Vec<(Vec<&[u8]>, TestParseResult<T>)>) {
    let mut reader = MockReader::from_bytes(vec![]);
    reader.return_would_block_when_empty = true;
    let mut reader = BufReader::new(reader);

    let mut parser = Some(parser);
    for (step, (fragments, expected)) in steps.into_iter().enumerate() {
        let current = parser.take().unwrap_or_else(|| panic!("parser finished before step {}", step));
        reader.get_mut().data.extend(fragments.into_iter().map(<[u8]>::to_vec));

        let (actual, blocked) = outcome(current.parse(&mut reader));
        assert_eq!(actual, expected, "step {}", step);
        parser = blocked;
    }
}

/// Parses everything in one call. The reader reports EOF after the data.
pub fn parse_to_eof<T>(parser: impl Parse<T>, data: Vec<&str>) -> TestParseResult<T> {
    parse_once(parser, MockReader::from_strs(data))
}

/// Parses in one call from a reader that repeats `endless` forever after the data.
pub fn parse_endless<T>(parser: impl Parse<T>, data: Vec<&[u8]>, endless: &[u8]) -> TestParseResult<T> {
    parse_once(parser, EndlessMockReader::from_bytes(data, endless))
}

fn parse_once<T>(parser: impl Parse<T>, reader: impl Read) -> TestParseResult<T> {
    outcome(parser.parse(&mut BufReader::new(reader))).0
}

fn outcome<T, R>(result: ParseResult<T, R>) -> (TestParseResult<T>, Option<R>) {
    match result {
        Err(err) => (TestParseResult::ParseErr(err), None),
        Ok(Done(value)) => (TestParseResult::Value(value), None),
        Ok(IoErr(parser, err)) => (TestParseResult::IoErr(err.kind()), Some(parser))
    }
}
