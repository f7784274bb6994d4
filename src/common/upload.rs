use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;

/// Content types a file upload may be sent as.
pub const SUPPORTED_UPLOAD_CONTENT_TYPES: [&str; 1] = ["application/x-ndjson"];

/// A readable file that is streamed as the request body, one line at a time.
#[derive(Debug)]
pub struct FileUpload {
    reader: BufReader<File>,
    size: u64,
    content_type: &'static str,
}

impl FileUpload {
    /// Opens the file as an NDJSON upload.
    pub fn open(path: impl AsRef<Path>) -> Result<FileUpload, Error> {
        FileUpload::with_content_type(path, SUPPORTED_UPLOAD_CONTENT_TYPES[0])
    }

    /// Opens the file for upload with the given content type, which must be one of SUPPORTED_UPLOAD_CONTENT_TYPES.
    pub fn with_content_type(path: impl AsRef<Path>, content_type: &str) -> Result<FileUpload, Error> {
        let content_type = SUPPORTED_UPLOAD_CONTENT_TYPES.iter()
            .find(|supported| **supported == content_type)
            .copied()
            .ok_or_else(|| Error::Configuration(format!(
                "Unsupported content type: '{}', expected '{}'.", content_type, SUPPORTED_UPLOAD_CONTENT_TYPES.join("', '"))))?;

        let unreadable = |_| Error::Configuration("The file must be readable.".to_string());
        let file = File::open(path.as_ref()).map_err(unreadable)?;
        let metadata = file.metadata().map_err(unreadable)?;
        if !metadata.is_file() {
            return Err(Error::Configuration("The file must be readable.".to_string()));
        }

        Ok(FileUpload { reader: BufReader::new(file), size: metadata.len(), content_type })
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Size of the file in bytes, sent as the Content-Length of the request.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads the next line including its '\n'. Returns an empty vector at end of file.
    pub fn read(&mut self) -> std::io::Result<Vec<u8>> {
        let mut line = vec![];
        self.reader.read_until(b'\n', &mut line)?;
        Ok(line)
    }
}
