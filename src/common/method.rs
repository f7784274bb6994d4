use std::fmt::{Display, Formatter};

use crate::error::Error;

/// An HTTP method supported by the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET method.
    GET,
    /// POST method.
    POST,
}

/// All supported methods, in the order they are listed in error messages.
pub const SUPPORTED_METHODS: [Method; 2] = [Method::GET, Method::POST];

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Method {
    /// Converts the given string to a method, ignoring case. Returns None if no Method matches.
    pub fn try_from_str(s: &str) -> Option<Method> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            _ => None
        }
    }

    /// Like try_from_str, but fails with a configuration error naming the supported methods.
    pub fn parse(s: &str) -> Result<Method, Error> {
        Method::try_from_str(s).ok_or_else(|| {
            let expected: Vec<String> = SUPPORTED_METHODS.iter().map(Method::to_string).collect();
            Error::Configuration(format!("got Request Method '{}', expected one of: {}.", s, expected.join(", ")))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::common::method::Method;

    #[test]
    fn case_insensitive() {
        assert_eq!(Method::try_from_str("get"), Some(Method::GET));
        assert_eq!(Method::try_from_str("Post"), Some(Method::POST));
        assert_eq!(Method::try_from_str("PUT"), None);
    }

    #[test]
    fn unsupported_method_message() {
        let err = Method::parse("DELETE").unwrap_err();
        assert_eq!(err.to_string(), "Internal HttpClient: got Request Method 'DELETE', expected one of: GET, POST.");
    }
}
