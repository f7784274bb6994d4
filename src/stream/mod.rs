pub mod ndjson;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::transfer::{ContentIter, TransferDriver};

/// The body of a response, pulled from the driver that is still receiving it.
///
/// Nothing is read past the response head until the stream is iterated. Draining the stream is
/// destructive: once the transfer is finished or aborted, every further iteration is empty.
pub struct Stream {
    driver: TransferDriver,
}

impl Stream {
    pub(crate) fn new(driver: TransferDriver) -> Stream {
        Stream { driver }
    }

    /// Body chunks in the order they arrived.
    pub fn chunks(&mut self) -> ContentIter<'_> {
        self.driver.content_iterator()
    }

    /// Drains the stream and concatenates all chunks.
    pub fn contents(&mut self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        for chunk in self.chunks() {
            contents.extend_from_slice(&chunk?);
        }
        Ok(contents)
    }

    /// Drains the stream as text. Invalid UTF-8 is replaced.
    pub fn text(&mut self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.contents()?).into_owned())
    }

    /// Drains the stream and parses it as a JSON object. An empty body is an empty object.
    pub fn json_data(&mut self) -> Result<Map<String, Value>> {
        let contents = self.contents()?;
        parse_json_object(&contents)
    }

    /// Stops draining once the given number of seconds has passed. Calling it again while
    /// iterating restarts the window.
    pub fn abort_timeout(&mut self, seconds: f64) {
        self.driver.abort_in(seconds);
    }

    /// Same as abort_timeout.
    pub fn cancel(&mut self, seconds: f64) {
        self.abort_timeout(seconds);
    }

    pub fn is_closed(&self) -> bool {
        self.driver.is_closed()
    }
}

fn parse_json_object(contents: &[u8]) -> Result<Map<String, Value>> {
    if contents.is_empty() {
        return Ok(Map::new());
    }

    let value: Value = serde_json::from_slice(contents)
        .map_err(|_| Error::Decoding("invalid json string".to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::Decoding(format!("json data is from type '{}', expected an object", json_type(&other))))
    }
}

/// Name of a JSON value's type, as used in error messages.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object"
    }
}
