use std::io::{ErrorKind, Result, Write};

use crate::common::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, USER_AGENT};
use crate::common::method::Method;
use crate::common::request::{Body, Request};
use crate::common::upload::FileUpload;

/// Initial capacity of the send buffer.
const BUFFER_CAPACITY: usize = 8 * 1024;

/// The serialized request waiting to be written to a non-blocking socket.
/// WouldBlock errors simply stop a send, and unwritten data stays in the buffer for the next one.
/// An upload body is read from disk one line at a time, only when the buffer has drained.
pub struct Outbound {
    buf: Vec<u8>,
    pos: usize,
    upload: Option<FileUpload>,
    upload_remaining: u64,
}

impl Outbound {
    /// Serializes the request head and, for in-memory bodies, the body.
    pub fn new(request: Request) -> Outbound {
        let Request { uri, method, headers, body, version } = request;

        let mut buf = Vec::with_capacity(BUFFER_CAPACITY);
        let mut head = format!("{} {} {}\r\n", method, uri.request_target(), version.wire());

        if !headers.contains_key(&HOST) {
            head.push_str(&format!("{}: {}\r\n", HOST, uri.host_header()));
        }
        if !headers.contains_key(&USER_AGENT) {
            head.push_str(&format!("{}: eventsourcingdb-rust/{}\r\n", USER_AGENT, env!("CARGO_PKG_VERSION")));
        }
        for (header, values) in &headers {
            if *header == CONTENT_LENGTH || *header == CONNECTION {
                continue;
            }
            for value in values {
                head.push_str(&format!("{}: {}\r\n", header, value));
            }
        }
        if let Body::Upload(upload) = &body {
            if !headers.contains_key(&CONTENT_TYPE) {
                head.push_str(&format!("{}: {}\r\n", CONTENT_TYPE, upload.content_type()));
            }
        }
        if method == Method::POST || !body.is_empty() {
            head.push_str(&format!("{}: {}\r\n", CONTENT_LENGTH, body.len()));
        }
        head.push_str(&format!("{}: close\r\n\r\n", CONNECTION));
        buf.extend_from_slice(head.as_bytes());

        let (upload, upload_remaining) = match body {
            Body::Empty => (None, 0),
            Body::Bytes(bytes) => {
                buf.extend_from_slice(&bytes);
                (None, 0)
            }
            Body::Upload(upload) => {
                let size = upload.size();
                (Some(upload), size)
            }
        };

        Outbound { buf, pos: 0, upload, upload_remaining }
    }

    /// Writes as much as the writer accepts. Returns true once the whole request is written and flushed.
    pub fn send(&mut self, writer: &mut impl Write) -> Result<bool> {
        loop {
            if self.pos < self.buf.len() {
                self.pos += write_until_blocked(writer, &self.buf[self.pos..])?;
                if self.pos < self.buf.len() {
                    return Ok(false);
                }
            }
            self.buf.clear();
            self.pos = 0;

            if !self.refill()? {
                break;
            }
        }

        match writer.flush() {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(false),
            Err(err) => Err(err)
        }
    }

    /// Loads the next upload line into the empty buffer. Returns false once the upload is exhausted.
    /// Never sends more than the Content-Length announced in the head, even if the file grew.
    fn refill(&mut self) -> Result<bool> {
        let upload = match self.upload.as_mut() {
            Some(upload) if self.upload_remaining > 0 => upload,
            _ => {
                self.upload = None;
                return Ok(false);
            }
        };

        let mut line = upload.read()?;
        if line.is_empty() {
            return Err(std::io::Error::new(ErrorKind::UnexpectedEof, "upload file shrank while it was being sent"));
        }
        line.truncate(self.upload_remaining.min(line.len() as u64) as usize);
        self.upload_remaining -= line.len() as u64;
        self.buf.extend_from_slice(&line);
        Ok(true)
    }
}

/// Writes the given data to the given writer until completion or until the writer blocks.
fn write_until_blocked<W: Write>(writer: &mut W, buf: &[u8]) -> Result<usize> {
    let mut pos = 0;
    while pos != buf.len() {
        match writer.write(&buf[pos..]) {
            Ok(0) => return Err(ErrorKind::WriteZero.into()),
            Ok(amount) => pos += amount,
            Err(error) if error.kind() == ErrorKind::WouldBlock => return Ok(pos),
            Err(error) if error.kind() == ErrorKind::Interrupted => {}
            Err(error) => return Err(error)
        }
    }
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::common::request::{Body, Request};
    use crate::common::upload::FileUpload;
    use crate::common::version::Version;
    use crate::transfer::outbound::Outbound;
    use crate::util::mock::MockWriter;

    fn request(method: &str, body: Body) -> Request {
        Request::new(method, "http://localhost:3000/api/v1/ping?x=1", ["Authorization: Bearer secret"], body, Version::Http11).unwrap()
    }

    fn head_lines(bytes: &[u8]) -> Vec<String> {
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let head = text.split("\r\n\r\n").next().unwrap();
        head.split("\r\n").map(String::from).collect()
    }

    #[test]
    fn get_request_head() {
        let mut writer = MockWriter::new();
        let mut outbound = Outbound::new(request("GET", Body::Empty));
        assert!(outbound.send(&mut writer).unwrap());

        let lines = head_lines(&writer.all_bytes());
        assert_eq!(lines[0], "GET /api/v1/ping?x=1 HTTP/1.1");
        assert!(lines.contains(&"Host: localhost:3000".to_string()));
        assert!(lines.contains(&"Authorization: Bearer secret".to_string()));
        assert!(lines.contains(&"Connection: close".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Content-Length")));
        assert!(writer.all_bytes().ends_with(b"\r\n\r\n"));
    }

    #[test]
    fn post_carries_body_and_length() {
        let mut writer = MockWriter::new();
        let mut outbound = Outbound::new(request("POST", Body::Bytes(b"{\"a\":1}".to_vec())));
        assert!(outbound.send(&mut writer).unwrap());

        let bytes = writer.all_bytes();
        assert!(head_lines(&bytes).contains(&"Content-Length: 7".to_string()));
        assert!(bytes.ends_with(b"\r\n\r\n{\"a\":1}"));
    }

    #[test]
    fn resumes_after_blocking() {
        let mut writer = MockWriter::with_budget(10);
        let mut outbound = Outbound::new(request("POST", Body::Bytes(b"{}".to_vec())));

        assert!(!outbound.send(&mut writer).unwrap());
        assert_eq!(writer.all_bytes().len(), 10);

        writer.budget = None;
        assert!(outbound.send(&mut writer).unwrap());
        assert!(writer.all_bytes().starts_with(b"POST /api/v1/ping?x=1 HTTP/1.1\r\n"));
        assert!(writer.all_bytes().ends_with(b"{}"));
    }

    #[test]
    fn streams_upload() {
        let path = std::env::temp_dir().join(format!("esdb-outbound-{}", std::process::id()));
        fs::write(&path, "{\"a\":1}\n{\"b\":2}\n").unwrap();

        let mut writer = MockWriter::new();
        let mut outbound = Outbound::new(request("POST", Body::Upload(FileUpload::open(&path).unwrap())));
        assert!(outbound.send(&mut writer).unwrap());

        let bytes = writer.all_bytes();
        let lines = head_lines(&bytes);
        assert!(lines.contains(&"Content-Length: 16".to_string()));
        assert!(lines.contains(&"Content-Type: application/x-ndjson".to_string()));
        assert!(bytes.ends_with(b"\r\n\r\n{\"a\":1}\n{\"b\":2}\n"));

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn http_1_0_request_line() {
        let request = Request::new("GET", "http://example.com", Vec::<String>::new(), Body::Empty, Version::Http10).unwrap();
        let mut writer = MockWriter::new();
        Outbound::new(request).send(&mut writer).unwrap();
        assert_eq!(head_lines(&writer.all_bytes())[0], "GET / HTTP/1.0");
        assert!(head_lines(&writer.all_bytes()).contains(&"Host: example.com".to_string()));
    }
}
