use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use crate::common::header::Header::{Custom, Standard};

/// A header. Is either a "Standard" header with a static string, or a "Custom" header with a uniquely allocated String.
/// Names compare case-insensitively, but a custom header keeps the case it was created with.
#[derive(Debug, Clone)]
pub enum Header {
    Standard(&'static str),
    Custom(String),
}

impl Header {
    pub fn as_str(&self) -> &str {
        match self {
            Standard(str) => str,
            Custom(str) => str.as_str()
        }
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl Eq for Header {}

impl Hash for Header {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.as_str().bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! standard_headers {
    (
        $(
            $(#[$docs:meta])*
            ($name:ident, $value:expr);
        )+
    ) => {
        $(
            $(#[$docs])*
            pub const $name: Header = Header::Standard($value);
        )+


        impl From<String> for Header {
            /// Gets a header from the given string representing the header name.
            fn from(value: String) -> Header {
                $(
                if value.eq_ignore_ascii_case($value) {
                    return $name;
                }
                )+
                Header::Custom(value)
            }
        }
    }
}

impl From<&str> for Header {
    /// Gets a header from the given string representing the header name.
    fn from(value: &str) -> Header {
        Header::from(value.to_string())
    }
}


standard_headers! {
    (ACCEPT, "Accept");
    (ACCEPT_ENCODING, "Accept-Encoding");
    (AUTHORIZATION, "Authorization");
    (CACHE_CONTROL, "Cache-Control");
    (CONNECTION, "Connection");
    (CONTENT_ENCODING, "Content-Encoding");
    (CONTENT_LENGTH, "Content-Length");
    (CONTENT_TYPE, "Content-Type");
    (DATE, "Date");
    (EXPECT, "Expect");
    (HOST, "Host");
    (LOCATION, "Location");
    (RETRY_AFTER, "Retry-After");
    (SERVER, "Server");
    (TRANSFER_ENCODING, "Transfer-Encoding");
    (USER_AGENT, "User-Agent");
    (VARY, "Vary");
    (WWW_AUTHENTICATE, "WWW-Authenticate");
}

/// Creates a map of headers.
/// ```
/// use eventsourcingdb::common::header::{AUTHORIZATION, CONTENT_TYPE, Header, HeaderMapOps};
/// use eventsourcingdb::header_map;
///
/// let headers = header_map![
///    (AUTHORIZATION, "Bearer secret"),
///    ("X-Request-Id", "42"),
///    ("coNtEnt-TyPE", "application/x-ndjson"),
/// ];
///
/// assert!(headers.contains_header_value(&AUTHORIZATION, "Bearer secret"));
/// assert!(headers.contains_header_value(&CONTENT_TYPE, "application/x-ndjson"));
/// assert!(headers.contains_header_value(&Header::from("x-request-id"), "42"));
/// ```
#[macro_export]
macro_rules! header_map {
    () => { $crate::common::header::HeaderMap::new() };
    ($(($header:expr, $value:expr)),+ $(,)?) => {
        <$crate::common::header::HeaderMap as $crate::common::header::HeaderMapOps>::from_pairs(vec![
            $(($header.into(), $value.into()),)+
        ])
    }
}

/// Operations for a header map.
pub trait HeaderMapOps: Sized {
    /// Gets a header map from the given vector of header value and key pairs.
    fn from_pairs(header_values: Vec<(Header, String)>) -> Self;
    /// Gets a header map from raw "Name: value" lines. Lines without a colon are skipped.
    fn from_lines<S: AsRef<str>>(lines: impl IntoIterator<Item=S>) -> Self;
    /// Adds a header to the map.
    fn add_header(&mut self, k: Header, v: String);
    /// Checks if the map contains the given header and corresponding header value.
    fn contains_header_value(&self, k: &Header, v: &str) -> bool;
    /// Gets the first value for the given header.
    fn get_first_header_value(&self, k: &Header) -> Option<&String>;
    /// Gets all values for the given header joined with ", ". Empty if the header is missing.
    fn get_header_line(&self, k: &Header) -> String;
}

/// A multimap of headers to values.
pub type HeaderMap = HashMap<Header, Vec<String>>;

impl HeaderMapOps for HeaderMap {
    fn from_pairs(header_values: Vec<(Header, String)>) -> HeaderMap {
        header_values.into_iter().fold(HashMap::new(), |mut m, (header, value)| {
            m.add_header(header, value);
            m
        })
    }

    fn from_lines<S: AsRef<str>>(lines: impl IntoIterator<Item=S>) -> HeaderMap {
        lines.into_iter()
            .filter_map(|line| split_header_line(line.as_ref()))
            .fold(HashMap::new(), |mut m, (header, value)| {
                m.add_header(header, value);
                m
            })
    }

    fn add_header(&mut self, k: Header, v: String) {
        self.entry(k).or_insert(Vec::new()).push(v)
    }

    fn contains_header_value(&self, k: &Header, v: &str) -> bool {
        if let Some(values) = self.get(k) {
            return values.iter().any(|value| value == v);
        }
        false
    }

    fn get_first_header_value(&self, k: &Header) -> Option<&String> {
        self.get(k)?.get(0)
    }

    fn get_header_line(&self, k: &Header) -> String {
        self.get(k).map(|values| values.join(", ")).unwrap_or_default()
    }
}

/// Splits a raw header line at the first ':' and trims both sides.
pub fn split_header_line(line: &str) -> Option<(Header, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((Header::from(name), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use crate::common::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, Header, HeaderMap, HeaderMapOps, split_header_line, VARY};

    #[test]
    fn multiple_values() {
        let mut headers = HeaderMap::new();
        headers.add_header(Header::from("Vary"), String::from("Accept"));
        headers.add_header(VARY, String::from("Authorization"));
        headers.add_header(CONTENT_LENGTH, String::from("42"));

        assert!(headers.contains_header_value(&VARY, "Accept"));
        assert!(headers.contains_header_value(&VARY, "Authorization"));
        assert!(!headers.contains_header_value(&CONTENT_LENGTH, "41"));

        assert_eq!(headers.get_first_header_value(&VARY).unwrap(), "Accept");
        assert_eq!(headers.get_header_line(&VARY), "Accept, Authorization");
        assert_eq!(headers.get_header_line(&AUTHORIZATION), "");
    }

    #[test]
    fn macro_merges_names_case_insensitively() {
        let headers = header_map![
            (AUTHORIZATION, "Bearer secret"),
            ("x-request-id", "7"),
            ("authorization", "Bearer other"),
        ];

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_header_line(&AUTHORIZATION), "Bearer secret, Bearer other");
        assert!(headers.contains_header_value(&Header::from("X-Request-Id"), "7"));
        assert!(header_map![].is_empty());
    }

    #[test]
    fn from_str() {
        assert_eq!(Header::from("ContenT-leNgth"), CONTENT_LENGTH);
        assert_eq!(Header::from("content-length").as_str(), "Content-Length");
        assert_eq!(Header::from("X-Custom").as_str(), "X-Custom");
        assert_eq!(Header::from("X-Custom"), Header::from("x-custom"));
    }

    #[test]
    fn from_lines() {
        let headers = HeaderMap::from_lines(vec![
            "HTTP/1.1 200 OK",
            "Content-Type: application/x-ndjson",
            "X-Trace:  a:b:c ",
            "set-cookie: one",
            "Set-Cookie: two",
        ]);

        assert_eq!(headers.get_first_header_value(&CONTENT_TYPE).unwrap(), "application/x-ndjson");
        assert_eq!(headers.get_first_header_value(&Header::from("x-trace")).unwrap(), "a:b:c");
        assert_eq!(headers.get_header_line(&Header::from("Set-Cookie")), "one, two");
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn split_line() {
        assert_eq!(split_header_line("Host: localhost:3000"), Some((Header::from("host"), "localhost:3000".to_string())));
        assert_eq!(split_header_line("no colon here"), None);
        assert_eq!(split_header_line(": value"), None);
    }
}
