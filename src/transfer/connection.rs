use std::collections::VecDeque;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use mio::net::TcpStream;
use rustls::{ClientConfig, ClientConnection, StreamOwned};
use rustls::pki_types::ServerName;

use crate::error::Error;
use crate::transfer::poll::Poller;

/// Where a transfer connects to.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsTarget>,
}

/// TLS settings for an https target.
#[derive(Debug, Clone)]
pub struct TlsTarget {
    pub config: Arc<ClientConfig>,
    pub name: ServerName<'static>,
}

/// The socket of a connection, plain or wrapped in TLS.
pub enum Socket {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Socket {
    fn tcp_mut(&mut self) -> &mut TcpStream {
        match self {
            Socket::Plain(stream) => stream,
            Socket::Tls(stream) => &mut stream.sock
        }
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Socket::Plain(stream) => stream.read(buf),
            Socket::Tls(stream) => stream.read(buf)
        }
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Socket::Plain(stream) => stream.write(buf),
            Socket::Tls(stream) => stream.write(buf)
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Socket::Plain(stream) => stream.flush(),
            Socket::Tls(stream) => stream.flush()
        }
    }
}

/// A non-blocking connection to a server. Connecting happens in the background and is finished
/// by polling is_connected.
pub struct Connection {
    poller: Poller,
    reader: BufReader<Socket>,
    target: Target,
    candidates: VecDeque<SocketAddr>,
    connect_deadline: Instant,
    connected: bool,
}

impl Connection {
    /// Resolves the target and starts connecting to the first address that accepts a connect call.
    pub fn open(target: Target, connect_timeout: Duration) -> Result<Connection, Error> {
        let mut candidates: VecDeque<SocketAddr> = resolve(&target)?.into();
        let poller = Poller::new().map_err(|err| transfer_error(&err))?;

        let socket = connect_next(&mut candidates, &target, &poller)?;

        Ok(Connection {
            poller,
            reader: BufReader::new(socket),
            target,
            candidates,
            connect_deadline: Instant::now() + connect_timeout,
            connected: false,
        })
    }

    /// Checks whether the TCP connection is established, moving on to the next resolved address
    /// if the current one failed.
    pub fn is_connected(&mut self) -> Result<bool, Error> {
        while !self.connected {
            let tcp = self.reader.get_mut().tcp_mut();
            let failure = match tcp.take_error() {
                Ok(Some(err)) | Err(err) => Some(err),
                Ok(None) => match tcp.peer_addr() {
                    Ok(addr) => {
                        debug!("Connected to {}", addr);
                        self.connected = true;
                        None
                    }
                    Err(err) if err.kind() == ErrorKind::NotConnected => None,
                    Err(err) => Some(err)
                }
            };

            match failure {
                Some(err) if self.candidates.is_empty() => {
                    return Err(Error::Transport(format!("Failed to connect to {}:{}: {}", self.target.host, self.target.port, err)));
                }
                Some(err) => {
                    debug!("Connection attempt failed ({}), trying next address", err);
                    let mut previous = std::mem::replace(self.reader.get_mut(), connect_next(&mut self.candidates, &self.target, &self.poller)?);
                    let _ = self.poller.deregister(previous.tcp_mut());
                }
                None if self.connected => {}
                None if Instant::now() >= self.connect_deadline => {
                    return Err(Error::Transport(format!("Connection to {}:{} timed out", self.target.host, self.target.port)));
                }
                None => return Ok(false)
            }
        }
        Ok(true)
    }

    pub fn reader(&mut self) -> &mut BufReader<Socket> {
        &mut self.reader
    }

    /// Writes go straight to the socket. The read buffer is unaffected.
    pub fn writer(&mut self) -> &mut Socket {
        self.reader.get_mut()
    }

    /// Waits for readiness on the socket, at most for the given time.
    pub fn wait(&mut self, timeout: Duration) -> Result<(), Error> {
        self.poller.wait(timeout).map(|_| ()).map_err(|err| transfer_error(&err))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.poller.deregister(self.reader.get_mut().tcp_mut());
    }
}

/// Formats an IO failure of a running transfer, keeping the reason verbatim.
pub fn transfer_error(err: &std::io::Error) -> Error {
    Error::Transport(format!("transfer failed with error: {}", err))
}

fn resolve(target: &Target) -> Result<Vec<SocketAddr>, Error> {
    let host = target.host.trim_start_matches('[').trim_end_matches(']');
    let addrs: Vec<SocketAddr> = (host, target.port).to_socket_addrs()
        .map_err(|err| Error::Transport(format!("Could not resolve host '{}': {}", host, err)))?
        .collect();

    if addrs.is_empty() {
        return Err(Error::Transport(format!("Could not resolve host '{}': no addresses found", host)));
    }
    Ok(addrs)
}

/// Starts a connect to the next candidate address that doesn't fail immediately.
fn connect_next(candidates: &mut VecDeque<SocketAddr>, target: &Target, poller: &Poller) -> Result<Socket, Error> {
    let mut last_error = None;

    while let Some(addr) = candidates.pop_front() {
        debug!("Connecting to {}", addr);
        match TcpStream::connect(addr) {
            Ok(mut stream) => {
                poller.register(&mut stream).map_err(|err| transfer_error(&err))?;
                return wrap(stream, target);
            }
            Err(err) => last_error = Some(err)
        }
    }

    Err(Error::Transport(match last_error {
        Some(err) => format!("Failed to connect to {}:{}: {}", target.host, target.port, err),
        None => format!("Failed to connect to {}:{}: no addresses left to try", target.host, target.port)
    }))
}

fn wrap(stream: TcpStream, target: &Target) -> Result<Socket, Error> {
    match &target.tls {
        None => Ok(Socket::Plain(stream)),
        Some(tls) => {
            let connection = ClientConnection::new(tls.config.clone(), tls.name.clone())
                .map_err(|err| Error::Configuration(format!("Failed to set up TLS: {}", err)))?;
            Ok(Socket::Tls(Box::new(StreamOwned::new(connection, stream))))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use crate::transfer::connection::{Connection, Target};

    fn target(port: u16) -> Target {
        Target { host: "127.0.0.1".to_string(), port, tls: None }
    }

    fn connect(port: u16) -> Result<bool, crate::error::Error> {
        let mut connection = Connection::open(target(port), Duration::from_secs(5))?;
        for _ in 0..500 {
            if connection.is_connected()? {
                return Ok(true);
            }
            connection.wait(Duration::from_millis(10))?;
        }
        Ok(false)
    }

    #[test]
    fn connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        assert!(connect(listener.local_addr().unwrap().port()).unwrap());
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let err = connect(port).unwrap_err();
        assert!(err.to_string().starts_with("Internal HttpClient: Failed to connect to 127.0.0.1:"), "{}", err);
    }

    #[test]
    fn unresolvable_host() {
        let target = Target { host: "host.invalid".to_string(), port: 80, tls: None };
        let err = Connection::open(target, Duration::from_secs(1)).err().unwrap();
        assert!(err.to_string().starts_with("Internal HttpClient: Could not resolve host 'host.invalid'"));
    }
}
