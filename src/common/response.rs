use crate::common::header::{Header, HeaderMap, HeaderMapOps};
use crate::common::status::Status;
use crate::error::Error;
use crate::stream::Stream;

/// An HTTP response whose body is still being received.
pub struct Response {
    /// The status.
    pub status: Status,
    /// The headers.
    pub headers: HeaderMap,
    /// The protocol version, like "1.1".
    pub version: String,
    stream: Stream,
}

impl Response {
    /// Creates a response from the raw head lines. Status lines among them are ignored, so the
    /// whole header queue can be passed in.
    pub fn new<S: AsRef<str>>(status_code: u16, lines: impl IntoIterator<Item=S>, stream: Stream, version: impl Into<String>) -> Result<Response, Error> {
        let status = Status::from_code(status_code).ok_or_else(|| {
            Error::Configuration(format!("The status code {} must be one of the defined HTTP status codes.", status_code))
        })?;

        let lines = lines.into_iter().filter(|line| !line.as_ref().starts_with("HTTP/"));
        Ok(Response { status, headers: HeaderMap::from_lines(lines), version: version.into(), stream })
    }

    pub fn status_code(&self) -> u16 {
        self.status.code
    }

    pub fn reason_phrase(&self) -> &'static str {
        self.status.reason
    }

    pub fn protocol_version(&self) -> &str {
        &self.version
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&Header::from(name))
    }

    /// All values of the header joined with ", ". Empty if the header is missing.
    pub fn header_line(&self, name: &str) -> String {
        self.headers.get_header_line(&Header::from(name))
    }

    pub fn stream_mut(&mut self) -> &mut Stream {
        &mut self.stream
    }

    pub fn into_stream(self) -> Stream {
        self.stream
    }
}
