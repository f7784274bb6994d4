use once_cell::sync::Lazy;
use regex::Regex;

use crate::transfer::Queue;

static STATUS_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^HTTP/(\d(?:\.\d)?)\s+(\d{3})").expect("status line pattern"));
static CONTENT_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Content-Type:\s*(.+)$").expect("content type pattern"));
static CONTENT_LENGTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Content-Length:\s*(\d+)$").expect("content length pattern"));

/// Response content types the client hands out as a stream.
pub const SUPPORTED_CONTENT_TYPES: [&str; 3] = ["application/json", "application/x-ndjson", "text/plain"];

/// Checks the content type against the supported ones. Parameters like a charset are allowed.
pub fn is_content_type_supported(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    SUPPORTED_CONTENT_TYPES.iter().any(|supported| content_type.starts_with(supported))
}

/// The parts of a response head the client cares about.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResponseHeader {
    pub status_code: u16,
    pub http_version: String,
    pub content_type: String,
    pub content_length: u64,
}

impl Default for ResponseHeader {
    fn default() -> Self {
        ResponseHeader {
            status_code: 418,
            http_version: "1.1".to_string(),
            content_type: "text/plain".to_string(),
            content_length: 0,
        }
    }
}

impl ResponseHeader {
    /// Scans the raw head lines. When a value appears more than once, the last one wins.
    pub fn from_queue(queue: &Queue<String>) -> ResponseHeader {
        let mut header = ResponseHeader::default();
        for line in queue.iter() {
            if let Some(captures) = STATUS_LINE.captures(line) {
                header.http_version = captures[1].trim().to_string();
                if let Ok(code) = captures[2].parse() {
                    header.status_code = code;
                }
            }
            if let Some(captures) = CONTENT_TYPE.captures(line) {
                header.content_type = captures[1].trim().to_string();
            }
            if let Some(captures) = CONTENT_LENGTH.captures(line) {
                if let Ok(length) = captures[1].parse() {
                    header.content_length = length;
                }
            }
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use crate::client::header::{is_content_type_supported, ResponseHeader};
    use crate::transfer::Queue;

    fn queue(lines: Vec<&str>) -> Queue<String> {
        let mut queue = Queue::new();
        for line in lines {
            queue.write(line.to_string());
        }
        queue
    }

    #[test]
    fn defaults_for_empty_queue() {
        let header = ResponseHeader::from_queue(&Queue::new());
        assert_eq!(header, ResponseHeader {
            status_code: 418,
            http_version: "1.1".to_string(),
            content_type: "text/plain".to_string(),
            content_length: 0,
        });
    }

    #[test]
    fn reads_status_type_and_length() {
        let header = ResponseHeader::from_queue(&queue(vec![
            "HTTP/1.1 200 OK",
            "Content-Type: application/json",
            "Content-Length: 123",
        ]));
        assert_eq!(header.status_code, 200);
        assert_eq!(header.http_version, "1.1");
        assert_eq!(header.content_type, "application/json");
        assert_eq!(header.content_length, 123);
    }

    #[test]
    fn case_insensitive_and_last_wins() {
        let header = ResponseHeader::from_queue(&queue(vec![
            "http/1.0 404 Not Found",
            "content-type:   text/plain; charset=utf-8  ",
            "HTTP/2 201",
            "CONTENT-LENGTH: 7",
            "X-Other: Content-Type: nope",
        ]));
        assert_eq!(header.status_code, 201);
        assert_eq!(header.http_version, "2");
        assert_eq!(header.content_type, "text/plain; charset=utf-8");
        assert_eq!(header.content_length, 7);
    }

    #[test]
    fn supported_content_types() {
        assert!(is_content_type_supported("application/json; charset=utf-8"));
        assert!(is_content_type_supported("Application/X-NDJSON"));
        assert!(is_content_type_supported("text/plain"));
        assert!(!is_content_type_supported("text/x-ndjson"));
        assert!(!is_content_type_supported("text/html"));
    }
}
