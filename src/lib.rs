pub use client::{Config, HttpClient};
pub use error::{Error, Result};
pub use parse::error::ParsingError;

/// Command-line argument parser
pub mod args;
/// The HTTP client facade.
pub mod client;
/// HTTP data types.
pub mod common;
/// The crate error type.
pub mod error;
/// Response bodies and NDJSON decoding.
pub mod stream;
/// Components for driving a single non-blocking HTTP transfer.
pub mod transfer;

/// Utility components.
pub(crate) mod util;

/// Components for parsing HTTP responses.
pub(crate) mod parse;
