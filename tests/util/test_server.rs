use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{spawn, JoinHandle};

/// A request as the test server received it.
pub struct Received {
    /// The request line followed by the header lines, without line endings.
    pub head: Vec<String>,
    pub body: Vec<u8>,
}

impl Received {
    pub fn has_line(&self, line: &str) -> bool {
        self.head.iter().any(|l| l == line)
    }
}

/// Starts a server on a random local port that accepts a single connection, reads one request
/// and hands it to the handler to write the response. Returns the base URL and a handle that
/// yields the received request once the handler is done.
pub fn test_server<F>(handler: F) -> (String, JoinHandle<Received>)
where
    F: FnOnce(&Received, &mut TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let received = read_request(&stream);
        handler(&received, &mut stream);
        received
    });

    (base_url, handle)
}

/// Writes a complete response with a Content-Length.
pub fn respond(stream: &mut TcpStream, status_line: &str, content_type: &str, body: &[u8]) {
    let head = format!("{}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n", status_line, content_type, body.len());
    stream.write_all(head.as_bytes()).unwrap();
    stream.write_all(body).unwrap();
    stream.flush().unwrap();
}

/// A local port nothing listens on.
pub fn closed_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

fn read_request(stream: &TcpStream) -> Received {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut head = vec![];
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if line.is_empty() {
            break;
        }
        head.push(line);
    }

    let length = head.iter()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .map(|(_, value)| value.trim().parse::<usize>().unwrap())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).unwrap();

    Received { head, body }
}
