use std::io::BufRead;

use crate::common::header::{HeaderMap, HeaderMapOps};
use crate::common::version;
use crate::parse::error::ParsingError;
use crate::parse::head::State::{Headers, StatusLine};
use crate::parse::line::CrlfLineParser;
use crate::parse::parse::{Parse, ParseResult};
use crate::parse::parse::ParseStatus::{Done, IoErr};

/// Max size in bytes for a response head, counting complete lines.
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// A fully received response head.
#[derive(Debug, Eq, PartialEq)]
pub struct ResponseHead {
    /// Protocol token from the status line, e.g. "HTTP/1.1".
    pub version: String,
    pub status_code: u16,
    /// The status line followed by every header line, as received and without line terminators.
    pub lines: Vec<String>,
    pub headers: HeaderMap,
}

/// Parser for the status line and headers of a response.
pub struct HeadParser {
    state: State,
    lines: Vec<String>,
    read: usize,
}

enum State {
    StatusLine(CrlfLineParser),
    Headers(String, u16, CrlfLineParser),
}

impl HeadParser {
    pub fn new() -> HeadParser {
        HeadParser { state: StatusLine(CrlfLineParser::new()), lines: vec![], read: 0 }
    }

    /// Returns true once any byte of the head has been consumed.
    pub fn has_started(&self) -> bool {
        match &self.state {
            StatusLine(inner) => self.read > 0 || inner.read_so_far() > 0,
            Headers(..) => true
        }
    }
}

impl Parse<ResponseHead> for HeadParser {
    fn parse(self, reader: &mut impl BufRead) -> ParseResult<ResponseHead, Self> {
        let Self { mut state, mut lines, mut read } = self;

        loop {
            if read > MAX_HEAD_SIZE {
                return Err(ParsingError::HeadTooLarge);
            }

            state = match state {
                StatusLine(inner) => match inner.parse(reader)? {
                    // Stray CRLFs before the status line are skipped.
                    Done(line) if line.is_empty() => {
                        read += 2;
                        StatusLine(CrlfLineParser::new())
                    }
                    Done(line) => {
                        read += line.len() + 2;
                        let (version, status_code) = parse_status_line(&line)?;
                        lines.push(line);
                        Headers(version, status_code, CrlfLineParser::new())
                    }
                    IoErr(inner, err) => return Ok(IoErr(HeadParser { state: StatusLine(inner), lines, read }, err))
                },
                Headers(version, status_code, inner) => match inner.parse(reader)? {
                    Done(line) if line.is_empty() => {
                        let headers = HeaderMap::from_lines(&lines[1..]);
                        return Ok(Done(ResponseHead { version, status_code, lines, headers }));
                    }
                    Done(line) => {
                        read += line.len() + 2;
                        if !line.contains(':') {
                            return Err(ParsingError::BadSyntax);
                        }
                        lines.push(line);
                        Headers(version, status_code, CrlfLineParser::new())
                    }
                    IoErr(inner, err) => return Ok(IoErr(HeadParser { state: Headers(version, status_code, inner), lines, read }, err))
                }
            }
        }
    }
}

/// Parses "HTTP/1.1 200 OK" into its version and status code. The reason phrase is optional.
fn parse_status_line(line: &str) -> Result<(String, u16), ParsingError> {
    let mut split = line.split_whitespace();

    let version = split.next().ok_or(ParsingError::BadSyntax)?;
    if !version::is_supported(version) {
        return Err(ParsingError::InvalidHttpVersion);
    }

    let code = split.next().ok_or(ParsingError::BadSyntax)?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParsingError::InvalidStatusCode);
    }
    let code = code.parse().map_err(|_| ParsingError::InvalidStatusCode)?;

    Ok((version.to_string(), code))
}
