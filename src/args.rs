use std::path::PathBuf;

use clap::Parser;

/// Sends a single request to an EventSourcingDB server and prints the response. NDJSON streams
/// are printed one record per line.
#[derive(Parser)]
#[command(version, about)]
pub struct Args {
    /// Request path, like /api/v1/read-events.
    pub path: String,
    /// (Optional) Base URL of the server.
    #[arg(long, default_value_t = String::from("http://localhost:3000"))]
    pub url: String,
    /// (Optional) API token sent as a bearer token.
    #[arg(long, env = "ESDB_API_TOKEN")]
    pub token: Option<String>,
    /// (Optional) JSON body. Sends a POST request.
    #[arg(short, long, conflicts_with = "upload")]
    pub data: Option<String>,
    /// (Optional) NDJSON file streamed as the body of a POST request.
    #[arg(long)]
    pub upload: Option<PathBuf>,
    /// (Optional) Stop reading the response after this many seconds.
    #[arg(short, long)]
    pub timeout: Option<f64>,
    /// (Optional) Requested HTTP version: 1.0, 1.1 or 2.
    #[arg(long, default_value_t = String::from("1.1"))]
    pub http_version: String,
    /// (Optional) Verify the server certificate on https.
    #[arg(long)]
    pub verify_tls: bool,
    /// (Optional) More output. Repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
