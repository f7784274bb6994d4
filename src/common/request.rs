use crate::common::header::{Header, HeaderMap, HeaderMapOps, split_header_line};
use crate::common::method::Method;
use crate::common::upload::FileUpload;
use crate::common::uri::Uri;
use crate::common::version::Version;
use crate::error::Error;

/// The body of an outgoing request.
#[derive(Debug)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    /// Streamed from disk line by line while the request is sent.
    Upload(FileUpload),
}

impl Body {
    /// The number of bytes the body will put on the wire.
    pub fn len(&self) -> u64 {
        match self {
            Body::Empty => 0,
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::Upload(upload) => upload.size()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An HTTP request.
#[derive(Debug)]
pub struct Request {
    /// The URI.
    pub uri: Uri,
    /// The method.
    pub method: Method,
    /// The headers.
    pub headers: HeaderMap,
    /// The body.
    pub body: Body,
    /// The requested protocol version.
    pub version: Version,
}

impl Request {
    /// Builds a request from a method name, a URI string and raw "Name: value" header lines.
    pub fn new<S: AsRef<str>>(method: &str, uri: &str, header_lines: impl IntoIterator<Item=S>, body: Body, version: Version) -> Result<Request, Error> {
        let method = Method::parse(method)?;
        let uri = Uri::parse(uri)?;

        let mut headers = HeaderMap::new();
        for line in header_lines {
            let (header, value) = split_header_line(line.as_ref())
                .ok_or_else(|| Error::Configuration(format!("Invalid header line: '{}'", line.as_ref())))?;
            headers.add_header(header, value);
        }

        Ok(Request { uri, method, headers, body, version })
    }

    pub fn has_header(&self, header: &Header) -> bool {
        self.headers.contains_key(header)
    }

    pub fn header_line(&self, header: &Header) -> String {
        self.headers.get_header_line(header)
    }
}
