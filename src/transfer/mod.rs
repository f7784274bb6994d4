pub use config::Config;
pub use driver::{ContentIter, TransferDriver};
pub use queue::Queue;

/// Transfer driver and its body chunk iterator.
pub mod driver;
/// Bounded and unbounded chunk queues.
pub mod queue;
/// Transfer configuration.
pub mod config;

/// Non-blocking client connection, plain or TLS.
mod connection;
/// Serialized outgoing request and its non-blocking writer.
mod outbound;
/// Socket readiness polling.
mod poll;
/// Byte budget for one body step.
mod step;
/// TLS client configuration.
mod tls;
