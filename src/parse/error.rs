/// Error for when an HTTP response can't be parsed.
#[derive(Debug, Eq, PartialEq)]
pub enum ParsingError {
    /// Invalid syntax in the message.
    BadSyntax,
    /// Message has wrong HTTP version.
    InvalidHttpVersion,
    /// Status line carries a status code that is not three digits.
    InvalidStatusCode,
    /// Header has invalid value.
    InvalidHeaderValue,
    /// Size of chunk in chunked transfer encoding can not be parsed as a number.
    InvalidChunkSize,
    /// Data is not valid UTF8.
    InvalidUtf8,
    /// A status, header or chunk-size line is longer than the line limit.
    LineTooLong,
    /// The response head is larger than the head limit.
    HeadTooLarge,
}
