use std::io::{BufRead, ErrorKind};
use std::mem;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::stream::Stream;
use crate::transfer::ContentIter;

/// The record types an event-sourcing server sends in its streams.
pub const RECORD_TYPES: [&str; 6] = ["event", "error", "heartbeat", "row", "subject", "eventType"];

/// One decoded NDJSON line: a type tag and its opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Map<String, Value>,
}

impl LineRecord {
    /// Sorts out the control records of a stream. Heartbeats give None, error records become a
    /// server error, and any type in `accepted` is passed on. Every other type is an error.
    pub fn dispatch(self, accepted: &[&str]) -> Result<Option<LineRecord>> {
        match self.kind.as_str() {
            "heartbeat" => Ok(None),
            "error" => Err(Error::Server(match self.payload.get("error").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => "Failed to read events, the server sent an error without a message.".to_string()
            })),
            kind if accepted.contains(&kind) => Ok(Some(self)),
            kind => Err(Error::Decoding(format!("Failed to read events, got unexpected type '{}'.", kind)))
        }
    }
}

/// Decodes a single line. Blank lines give None.
pub fn decode_line(line: &[u8]) -> Result<Option<LineRecord>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(line)
        .map_err(|_| Error::Decoding("Failed to read events.".to_string()))?;
    let mut item = match value {
        Value::Object(item) => item,
        _ => return Err(Error::Decoding("Failed to read events, expected an object.".to_string()))
    };

    let kind = match item.remove("type") {
        None | Some(Value::Null) => "unknown".to_string(),
        Some(Value::String(kind)) => kind,
        Some(_) => return Err(Error::Decoding("Failed to read events.".to_string()))
    };
    let payload = match item.remove("payload") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(payload)) => payload,
        Some(_) => return Err(Error::Decoding("Failed to read events, expected an object.".to_string()))
    };

    Ok(Some(LineRecord { kind, payload }))
}

/// Splits a sequence of byte chunks into lines and decodes each one.
///
/// Chunk boundaries don't need to line up with newlines. A last line without a trailing newline
/// is decoded once the chunks run out. After yielding an error the iterator is finished.
pub struct NdJson<I> {
    chunks: I,
    buffer: Vec<u8>,
    exhausted: bool,
    failed: bool,
}

impl<I: Iterator<Item = Result<Vec<u8>>>> NdJson<I> {
    pub fn from_chunks(chunks: I) -> NdJson<I> {
        NdJson { chunks, buffer: Vec::new(), exhausted: false, failed: false }
    }

    /// The next complete line, or the remainder once the chunks are exhausted.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        if let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let rest = self.buffer.split_off(end + 1);
            return Some(mem::replace(&mut self.buffer, rest));
        }
        if self.exhausted && !self.buffer.is_empty() {
            return Some(mem::take(&mut self.buffer));
        }
        None
    }

    fn fail(&mut self, err: Error) -> Option<Result<LineRecord>> {
        self.failed = true;
        self.buffer.clear();
        Some(Err(err))
    }
}

impl<'a> NdJson<ContentIter<'a>> {
    /// Decodes the body of a response while it is being received.
    pub fn decode(stream: &'a mut Stream) -> NdJson<ContentIter<'a>> {
        NdJson::from_chunks(stream.chunks())
    }

    /// Restarts the abort window of the underlying stream.
    pub fn abort_in(&mut self, seconds: f64) {
        self.chunks.abort_in(seconds);
    }
}

impl<R: BufRead> NdJson<ReaderChunks<R>> {
    /// Decodes NDJSON from any buffered reader.
    pub fn read_lines(reader: R) -> NdJson<ReaderChunks<R>> {
        NdJson::from_chunks(ReaderChunks { reader })
    }
}

impl<I: Iterator<Item = Result<Vec<u8>>>> Iterator for NdJson<I> {
    type Item = Result<LineRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.failed {
            let line = match self.take_line() {
                Some(line) => line,
                None if self.exhausted => return None,
                None => {
                    match self.chunks.next() {
                        Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                        Some(Err(err)) => return self.fail(err),
                        None => self.exhausted = true
                    }
                    continue;
                }
            };

            match decode_line(&line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {}
                Err(err) => return self.fail(err)
            }
        }
        None
    }
}

/// Reads a buffered reader one buffer fill at a time.
pub struct ReaderChunks<R> {
    reader: R,
}

impl<R: BufRead> Iterator for ReaderChunks<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let chunk = match self.reader.fill_buf() {
                Ok([]) => return None,
                Ok(data) => data.to_vec(),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Some(Err(err.into()))
            };
            self.reader.consume(chunk.len());
            return Some(Ok(chunk));
        }
    }
}
