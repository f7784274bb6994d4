pub use config::*;
pub use http_client::*;

/// Config for a client.
mod config;
/// Summary of a response head and the content type allow-list.
pub mod header;
/// The client sending requests and handing out responses.
mod http_client;
