use std::io::ErrorKind;
use std::mem;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::common::header::{CONTENT_TYPE, HeaderMapOps};
use crate::common::request::Request;
use crate::common::status::Status;
use crate::error::Error;
use crate::parse::body::BodyDecoder;
use crate::parse::head::HeadParser;
use crate::parse::parse::Parse;
use crate::parse::parse::ParseStatus::{Done, IoErr};
use crate::transfer::config::Config;
use crate::transfer::connection::{Connection, Target, TlsTarget, transfer_error};
use crate::transfer::outbound::Outbound;
use crate::transfer::queue::Queue;
use crate::transfer::step::{BODY_STEP_BYTES, StepReader};
use crate::transfer::tls;

/// Drives a single HTTP exchange over a non-blocking socket and buffers what arrives into two
/// queues: the lines of the response head, and the body chunks.
///
/// The lifecycle is add_handle, then execute (returns once the head is in), then content_iterator
/// to pull body chunks. The socket is released when the body ends, when an abort deadline passes,
/// on error, or when the driver is dropped.
pub struct TransferDriver {
    config: Config,
    state: State,
    header_queue: Option<Queue<String>>,
    write_queue: Option<Queue<Vec<u8>>>,
    abort_in: Duration,
    window_start: Instant,
}

enum State {
    /// Nothing configured.
    Idle,
    /// A request is configured but nothing was sent yet.
    Armed(Handle),
    Running(Transfer),
    /// The transfer was released. Iterating yields nothing.
    Closed,
}

/// A prepared request.
struct Handle {
    target: Target,
    outbound: Outbound,
}

impl TransferDriver {
    pub fn new(config: Config) -> TransferDriver {
        TransferDriver {
            config,
            state: State::Idle,
            header_queue: None,
            write_queue: None,
            abort_in: Duration::ZERO,
            window_start: Instant::now(),
        }
    }

    /// Prepares the transfer for the request and creates fresh queues. Replaces any earlier transfer.
    pub fn add_handle(&mut self, request: Request) -> Result<(), Error> {
        self.release();

        let uri = &request.uri;
        let tls = match uri.scheme() {
            "https" => Some(TlsTarget { config: tls::client_config(self.config.verify_tls), name: tls::server_name(uri.host())? }),
            "http" => None,
            scheme => return Err(Error::Configuration(format!("Unsupported URI scheme '{}', expected http or https.", scheme)))
        };
        let target = Target { host: uri.host().to_string(), port: uri.port_or_default(), tls };
        debug!("{} {} (HTTP/{})", request.method, uri, request.version);

        self.state = State::Armed(Handle { target, outbound: Outbound::new(request) });
        self.header_queue = Some(Queue::with_max_size(self.config.header_queue_depth));
        self.write_queue = Some(Queue::new());
        Ok(())
    }

    /// Connects, sends the request and drives the transfer until the response head has arrived or
    /// the transfer stopped. On failure the transfer is released.
    pub fn execute(&mut self) -> Result<(), Error> {
        let result = self.run_until_head();
        if result.is_err() {
            self.release();
        }
        result
    }

    fn run_until_head(&mut self) -> Result<(), Error> {
        let handle = match mem::replace(&mut self.state, State::Idle) {
            State::Armed(handle) => handle,
            other => {
                self.state = other;
                return Err(Error::Configuration("No handle to execute.".to_string()));
            }
        };
        let (header_queue, write_queue) = match (self.header_queue.as_mut(), self.write_queue.as_mut()) {
            (Some(header_queue), Some(write_queue)) => (header_queue, write_queue),
            (None, _) => return Err(Error::Configuration("No header queue available.".to_string())),
            (_, None) => return Err(Error::Configuration("No write queue available.".to_string()))
        };

        let connection = Connection::open(handle.target, self.config.connect_timeout)?;
        let mut transfer = Transfer::new(connection, handle.outbound);

        loop {
            let progress = transfer.advance(header_queue, write_queue)?;
            if !header_queue.is_empty() || progress == Progress::Finished {
                break;
            }
            if progress == Progress::Blocked {
                transfer.connection.wait(self.config.poll_interval)?;
            }
        }

        if header_queue.is_empty() {
            return Err(Error::Transport("transfer failed with error: no response head received".to_string()));
        }
        self.state = State::Running(transfer);
        Ok(())
    }

    /// The lines of the response head: the status line first, then one entry per header line.
    pub fn header_queue(&self) -> Result<&Queue<String>, Error> {
        self.header_queue.as_ref().ok_or_else(|| Error::Configuration("No header queue available.".to_string()))
    }

    /// Body chunks received but not yet pulled by an iterator.
    pub fn write_queue(&self) -> Result<&Queue<Vec<u8>>, Error> {
        self.write_queue.as_ref().ok_or_else(|| Error::Configuration("No write queue available.".to_string()))
    }

    /// Stops iteration once the given number of seconds has passed since iteration started or since
    /// this call. Zero, negative and non-finite values disable the deadline.
    pub fn abort_in(&mut self, seconds: f64) {
        self.abort_in = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::ZERO);
        self.window_start = Instant::now();
    }

    /// Iterates the body chunks as they arrive.
    pub fn content_iterator(&mut self) -> ContentIter<'_> {
        ContentIter { driver: self, started: false, finished: false }
    }

    /// Whether the transfer has been released.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    fn deadline_passed(&self) -> bool {
        !self.abort_in.is_zero() && self.window_start.elapsed() >= self.abort_in
    }

    /// Time to wait for readiness, bounded by the poll interval and the abort deadline.
    fn wait_budget(&self) -> Duration {
        if self.abort_in.is_zero() {
            return self.config.poll_interval;
        }
        let remaining = self.abort_in.saturating_sub(self.window_start.elapsed());
        remaining.min(self.config.poll_interval)
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, Error> {
        loop {
            let finished = match &self.state {
                State::Running(transfer) => transfer.is_finished(),
                State::Closed => return Ok(None),
                State::Idle | State::Armed(_) => return Err(Error::Configuration("No multi handle to execute.".to_string()))
            };

            if self.deadline_passed() {
                debug!("Abort deadline of {:?} reached", self.abort_in);
                self.release();
                return Ok(None);
            }

            if let Some(write_queue) = self.write_queue.as_mut() {
                if !write_queue.is_empty() {
                    let chunk = write_queue.read();
                    trace!("Yielding {} body bytes", chunk.len());
                    return Ok(Some(chunk));
                }
            }
            if finished {
                self.release();
                return Ok(None);
            }

            let wait = self.wait_budget();
            if let Err(err) = self.step(wait) {
                self.release();
                return Err(err);
            }
        }
    }

    /// Advances the running transfer once and waits for readiness if nothing new arrived.
    fn step(&mut self, wait: Duration) -> Result<(), Error> {
        let (transfer, header_queue, write_queue) = match (&mut self.state, self.header_queue.as_mut(), self.write_queue.as_mut()) {
            (State::Running(transfer), Some(header_queue), Some(write_queue)) => (transfer, header_queue, write_queue),
            _ => return Err(Error::Configuration("No multi handle to execute.".to_string()))
        };

        let progress = transfer.advance(header_queue, write_queue)?;
        if progress == Progress::Blocked && write_queue.is_empty() {
            transfer.connection.wait(wait)?;
        }
        Ok(())
    }

    /// Drops the socket and the queues. Safe to call in any state.
    fn release(&mut self) {
        if let State::Running(_) = mem::replace(&mut self.state, State::Closed) {
            debug!("Released transfer");
        }
        self.header_queue = None;
        self.write_queue = None;
    }
}

impl Drop for TransferDriver {
    fn drop(&mut self) {
        self.release();
    }
}

/// Iterator over body chunks. Stops at the end of the body, at the abort deadline, or after
/// yielding an error.
pub struct ContentIter<'a> {
    driver: &'a mut TransferDriver,
    started: bool,
    finished: bool,
}

impl ContentIter<'_> {
    /// Same as TransferDriver::abort_in.
    pub fn abort_in(&mut self, seconds: f64) {
        self.driver.abort_in(seconds);
    }
}

impl Iterator for ContentIter<'_> {
    type Item = Result<Vec<u8>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            self.driver.window_start = Instant::now();
        }

        match self.driver.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// The phase of a running transfer.
enum Phase {
    Connecting,
    Sending,
    Head(HeadParser),
    Body(BodyDecoder),
    Finished,
}

/// Outcome of one phase step.
enum Step {
    Next(Phase),
    /// Waiting for the socket.
    Blocked(Phase),
    /// Stopped with work left, so the caller gets a say before the next step.
    Pause(Phase),
}

/// How far a call to advance got.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Progress {
    Blocked,
    Paused,
    Finished,
}

/// A request in flight on an open connection.
struct Transfer {
    connection: Connection,
    outbound: Outbound,
    phase: Phase,
    sink: BodySink,
}

impl Transfer {
    fn new(connection: Connection, outbound: Outbound) -> Transfer {
        Transfer { connection, outbound, phase: Phase::Connecting, sink: BodySink::default() }
    }

    fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Makes progress until the socket blocks, the head is complete, or one body step is done.
    fn advance(&mut self, header_queue: &mut Queue<String>, write_queue: &mut Queue<Vec<u8>>) -> Result<Progress, Error> {
        loop {
            let step = match mem::replace(&mut self.phase, Phase::Finished) {
                Phase::Connecting => self.connecting()?,
                Phase::Sending => self.sending()?,
                Phase::Head(parser) => self.receiving_head(parser, header_queue)?,
                Phase::Body(decoder) => self.receiving_body(decoder, write_queue)?,
                Phase::Finished => return Ok(Progress::Finished)
            };

            match step {
                Step::Next(phase) => self.phase = phase,
                Step::Blocked(phase) => {
                    self.phase = phase;
                    return Ok(Progress::Blocked);
                }
                Step::Pause(phase) => {
                    self.phase = phase;
                    return Ok(Progress::Paused);
                }
            }
        }
    }

    fn connecting(&mut self) -> Result<Step, Error> {
        Ok(match self.connection.is_connected()? {
            true => Step::Next(Phase::Sending),
            false => Step::Blocked(Phase::Connecting)
        })
    }

    fn sending(&mut self) -> Result<Step, Error> {
        match self.outbound.send(self.connection.writer()) {
            Ok(true) => {
                trace!("Request sent");
                Ok(Step::Next(Phase::Head(HeadParser::new())))
            }
            Ok(false) => Ok(Step::Blocked(Phase::Sending)),
            Err(err) => Err(transfer_error(&err))
        }
    }

    fn receiving_head(&mut self, parser: HeadParser, header_queue: &mut Queue<String>) -> Result<Step, Error> {
        let head = match parser.parse(self.connection.reader())? {
            Done(head) => head,
            IoErr(parser, err) if err.kind() == ErrorKind::WouldBlock => return Ok(Step::Blocked(Phase::Head(parser))),
            IoErr(parser, err) if err.kind() == ErrorKind::UnexpectedEof => {
                return Err(Error::Transport(if parser.has_started() {
                    "transfer failed with error: connection closed before the response head was complete".to_string()
                } else {
                    "transfer failed with error: Empty reply from server".to_string()
                }));
            }
            IoErr(_, err) => return Err(transfer_error(&err))
        };

        if Status::is_informational(head.status_code) {
            debug!("Skipping interim response {}", head.status_code);
            return Ok(Step::Next(Phase::Head(HeadParser::new())));
        }
        debug!("Response head received: {}", head.lines.first().map(String::as_str).unwrap_or(""));

        self.sink.line_aligned = head.headers.get_first_header_value(&CONTENT_TYPE)
            .map(|value| value.trim().to_ascii_lowercase().starts_with("application/x-ndjson"))
            .unwrap_or(false);
        let decoder = BodyDecoder::new(head.status_code, &head.headers)?;
        let line_count = head.lines.len();
        for line in head.lines {
            header_queue.write(line);
        }
        if header_queue.len() < line_count {
            warn!("Response head has {} lines, only the newest {} are kept", line_count, header_queue.len());
        }
        Ok(Step::Pause(Phase::Body(decoder)))
    }

    fn receiving_body(&mut self, decoder: BodyDecoder, write_queue: &mut Queue<Vec<u8>>) -> Result<Step, Error> {
        let sink = &mut self.sink;
        let mut reader = StepReader::new(self.connection.reader(), BODY_STEP_BYTES);
        let status = decoder.decode(&mut reader, &mut |data: &[u8]| sink.write(data, write_queue))?;
        let spent = reader.is_spent();

        match status {
            Done(()) => {
                self.sink.finish(write_queue);
                trace!("Response body complete");
                Ok(Step::Next(Phase::Finished))
            }
            IoErr(decoder, err) if err.kind() == ErrorKind::WouldBlock && spent => Ok(Step::Pause(Phase::Body(decoder))),
            IoErr(decoder, err) if err.kind() == ErrorKind::WouldBlock => Ok(Step::Blocked(Phase::Body(decoder))),
            IoErr(_, err) if err.kind() == ErrorKind::UnexpectedEof => {
                Err(Error::Transport("transfer failed with error: connection closed before the response body was complete".to_string()))
            }
            IoErr(_, err) => Err(transfer_error(&err))
        }
    }
}

/// Moves decoded body bytes into the write queue. For NDJSON bodies, bytes are held back until a
/// newline so every queued chunk ends on a record boundary.
#[derive(Default)]
struct BodySink {
    line_aligned: bool,
    pending: Vec<u8>,
}

impl BodySink {
    fn write(&mut self, data: &[u8], write_queue: &mut Queue<Vec<u8>>) {
        if !self.line_aligned {
            write_queue.write(data.to_vec());
            return;
        }

        self.pending.extend_from_slice(data);
        if let Some(end) = self.pending.iter().rposition(|byte| *byte == b'\n') {
            let rest = self.pending.split_off(end + 1);
            write_queue.write(mem::replace(&mut self.pending, rest));
        }
    }

    /// Queues whatever is left once the body is complete.
    fn finish(&mut self, write_queue: &mut Queue<Vec<u8>>) {
        if !self.pending.is_empty() {
            write_queue.write(mem::take(&mut self.pending));
        }
    }
}
