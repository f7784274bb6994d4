use std::io::ErrorKind;
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};
use mio::net::TcpStream;

/// The number of IO events processed at a time. A transfer only ever owns one socket.
const POLL_EVENT_CAPACITY: usize = 8;

/// Token used for the transfer's socket.
const SOCKET_TOKEN: Token = Token(0);

/// Readiness notification for the socket of a single transfer.
pub struct Poller {
    poll: Poll,
    events: Events,
}

impl Poller {
    pub fn new() -> std::io::Result<Poller> {
        Ok(Poller { poll: Poll::new()?, events: Events::with_capacity(POLL_EVENT_CAPACITY) })
    }

    /// Registers the socket for both read and write readiness.
    pub fn register(&self, stream: &mut TcpStream) -> std::io::Result<()> {
        self.poll.registry().register(stream, SOCKET_TOKEN, Interest::READABLE | Interest::WRITABLE)
    }

    pub fn deregister(&self, stream: &mut TcpStream) -> std::io::Result<()> {
        self.poll.registry().deregister(stream)
    }

    /// Blocks until the socket becomes ready or the timeout passes. Returns true if any event arrived.
    /// Readiness is edge triggered, so callers always retry IO after waking up, whatever the result.
    pub fn wait(&mut self, timeout: Duration) -> std::io::Result<bool> {
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => Ok(!self.events.is_empty()),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(false),
            Err(err) => Err(err)
        }
    }
}
