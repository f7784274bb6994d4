use log::debug;
use serde::Serialize;

use crate::client::config::Config;
use crate::client::header::{is_content_type_supported, ResponseHeader, SUPPORTED_CONTENT_TYPES};
use crate::common::header::{AUTHORIZATION, CONTENT_TYPE};
use crate::common::request::{Body, Request};
use crate::common::response::Response;
use crate::common::upload::FileUpload;
use crate::error::Error;
use crate::stream::Stream;
use crate::transfer::TransferDriver;

/// Sends one request at a time and returns as soon as the response head is in. The body is left
/// on the wire until the response's stream is iterated.
pub struct HttpClient {
    config: Config,
    abort_in: f64,
}

impl HttpClient {
    pub fn new(config: Config) -> HttpClient {
        HttpClient { config, abort_in: 0.0 }
    }

    /// Sets the abort timeout applied to the streams of all following responses. Zero disables it.
    pub fn cancel_stream_after(&mut self, seconds: f64) {
        self.abort_in = seconds;
    }

    /// Joins the base URL and the given path with exactly one slash.
    pub fn build_uri(&self, uri: &str) -> String {
        match &self.config.base_url {
            Some(base_url) => format!("{}/{}", base_url.trim_end_matches('/'), uri.trim_start_matches('/')),
            None => uri.trim_start_matches('/').to_string()
        }
    }

    pub fn get(&self, uri: &str, token: Option<&str>) -> Result<Response, Error> {
        self.request("GET", uri, auth_lines(token), Body::Empty)
    }

    /// Sends the value as a JSON body.
    pub fn post<T: Serialize + ?Sized>(&self, uri: &str, token: Option<&str>, body: &T) -> Result<Response, Error> {
        let body = serde_json::to_vec(body)
            .map_err(|err| Error::Configuration(format!("Failed to encode request body: {}", err)))?;
        let mut lines = auth_lines(token);
        lines.push(format!("{}: application/json", CONTENT_TYPE));
        self.request("POST", uri, lines, Body::Bytes(body))
    }

    /// Sends the file as the request body. It's read line by line while the request is written.
    pub fn post_upload(&self, uri: &str, token: Option<&str>, upload: FileUpload) -> Result<Response, Error> {
        let mut lines = auth_lines(token);
        lines.push(format!("{}: {}", CONTENT_TYPE, upload.content_type()));
        self.request("POST", uri, lines, Body::Upload(upload))
    }

    /// Builds a request for a path relative to the base URL and sends it.
    pub fn request(&self, method: &str, uri: &str, header_lines: Vec<String>, body: Body) -> Result<Response, Error> {
        let request = Request::new(method, &self.build_uri(uri), header_lines, body, self.config.version)?;
        self.send_request(request)
    }

    /// Sends the request on a fresh driver and waits for the response head.
    pub fn send_request(&self, request: Request) -> Result<Response, Error> {
        let mut driver = TransferDriver::new(self.config.transfer.clone());
        driver.add_handle(request)?;
        driver.execute()?;

        let header = ResponseHeader::from_queue(driver.header_queue()?);
        if !is_content_type_supported(&header.content_type) {
            return Err(Error::Configuration(format!(
                "got Content-Type '{}', expected one of: {}",
                header.content_type,
                SUPPORTED_CONTENT_TYPES.join(", ")
            )));
        }
        debug!("Response {} ({}, {} bytes announced)", header.status_code, header.content_type, header.content_length);

        let lines: Vec<String> = driver.header_queue()?.iter().cloned().collect();
        driver.abort_in(self.abort_in);
        Response::new(header.status_code, lines, Stream::new(driver), header.http_version)
    }
}

fn auth_lines(token: Option<&str>) -> Vec<String> {
    token.map(|token| format!("{}: Bearer {}", AUTHORIZATION, token)).into_iter().collect()
}
