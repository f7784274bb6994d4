use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use log::info;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

use eventsourcingdb::{Config, Error, HttpClient};
use eventsourcingdb::args::Args;
use eventsourcingdb::common::upload::FileUpload;
use eventsourcingdb::common::version::Version;
use eventsourcingdb::stream::ndjson::{NdJson, RECORD_TYPES};

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    if let Err(err) = TermLogger::init(level, simplelog::Config::default(), TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("esdb: could not set up logging: {}", err);
    }

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("esdb: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, Error> {
    let mut config = Config::with_base_url(&args.url);
    config.version = Version::from_hint(&args.http_version);
    config.transfer.verify_tls = args.verify_tls;

    let mut client = HttpClient::new(config);
    if let Some(timeout) = args.timeout {
        client.cancel_stream_after(timeout);
    }

    let token = args.token.as_deref();
    let mut response = match (&args.data, &args.upload) {
        (Some(data), _) => {
            let body: serde_json::Value = serde_json::from_str(data)
                .map_err(|err| Error::Configuration(format!("--data is not valid JSON: {}", err)))?;
            client.post(&args.path, token, &body)?
        }
        (None, Some(path)) => client.post_upload(&args.path, token, FileUpload::open(path)?)?,
        (None, None) => client.get(&args.path, token)?
    };
    info!("{} (HTTP/{})", response.status, response.protocol_version());

    let ndjson = response.header_line("Content-Type").to_ascii_lowercase().starts_with("application/x-ndjson");
    let mut out = io::stdout().lock();
    if ndjson {
        for record in NdJson::decode(response.stream_mut()) {
            if let Some(record) = record?.dispatch(&RECORD_TYPES)? {
                let line = serde_json::to_string(&record).map_err(|err| Error::Decoding(err.to_string()))?;
                writeln!(out, "{}", line)?;
            }
        }
    } else {
        for chunk in response.stream_mut().chunks() {
            out.write_all(&chunk?)?;
        }
    }
    out.flush()?;

    Ok(if response.status_code() < 400 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
