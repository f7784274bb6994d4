use std::fmt::{Display, Formatter};

/// HTTP version "HTTP/1.0"
pub const HTTP_VERSION_1_0: &str = "HTTP/1.0";
/// HTTP version "HTTP/1.1"
pub const HTTP_VERSION_1_1: &str = "HTTP/1.1";

/// Checks if the given raw version string is supported on the wire.
pub fn is_supported(raw: &str) -> bool {
    HTTP_VERSION_1_1.eq(raw) || HTTP_VERSION_1_0.eq(raw)
}

/// The protocol version requested by the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
    /// Accepted as a hint only. Requests are still written as HTTP/1.1.
    Http2,
}

impl Default for Version {
    fn default() -> Self {
        Version::Http11
    }
}

impl Version {
    /// Maps a caller supplied hint to a version. "2" and "2.0" select HTTP/2, "1.1" selects HTTP/1.1
    /// and everything else falls back to HTTP/1.0.
    pub fn from_hint(hint: &str) -> Version {
        match hint.trim() {
            "2" | "2.0" => Version::Http2,
            "1.1" => Version::Http11,
            _ => Version::Http10
        }
    }

    /// The version token written into the request line.
    pub fn wire(&self) -> &'static str {
        match self {
            Version::Http10 => HTTP_VERSION_1_0,
            Version::Http11 | Version::Http2 => HTTP_VERSION_1_1
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Version::Http10 => "1.0",
            Version::Http11 => "1.1",
            Version::Http2 => "2"
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::common::version::{is_supported, Version};

    #[test]
    fn hints() {
        assert_eq!(Version::from_hint("2"), Version::Http2);
        assert_eq!(Version::from_hint("2.0"), Version::Http2);
        assert_eq!(Version::from_hint("1.1"), Version::Http11);
        assert_eq!(Version::from_hint("1.0"), Version::Http10);
        assert_eq!(Version::from_hint("3"), Version::Http10);
    }

    #[test]
    fn wire() {
        assert_eq!(Version::Http2.wire(), "HTTP/1.1");
        assert_eq!(Version::Http10.wire(), "HTTP/1.0");
        assert!(is_supported(Version::default().wire()));
    }
}
