use std::time::Duration;

/// The config for a transfer driver.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on a single wait for socket readiness. Also how often an abort deadline is checked.
    pub poll_interval: Duration,
    /// How long connecting to the server may take, across all resolved addresses.
    pub connect_timeout: Duration,
    /// The number of response head lines kept. Older lines are evicted first, zero keeps all.
    pub header_queue_depth: usize,
    /// Verify the server certificate on https. Off by default, matching local development servers
    /// with self-signed certificates.
    pub verify_tls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poll_interval: Duration::from_millis(10),
            connect_timeout: Duration::from_secs(300),
            header_queue_depth: 100,
            verify_tls: false,
        }
    }
}
