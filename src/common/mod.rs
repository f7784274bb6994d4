/// HTTP header data types and functions.
pub mod header;
/// HTTP method data type and functions.
pub mod method;
/// HTTP request data type and functions.
pub mod request;
/// HTTP response data type and functions
pub mod response;
/// HTTP status data type and functions.
pub mod status;
/// Request bodies streamed from files.
pub mod upload;
/// URI parsing and formatting.
pub mod uri;
/// HTTP version constants and functions.
pub mod version;
