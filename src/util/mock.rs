use std::cmp::min;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};

/// A reader serving the given fragments, at most one fragment per read call. An empty fragment
/// reads as EOF once. When all fragments are used up it reports EOF, or WouldBlock like a
/// non-blocking socket if return_would_block_when_empty is set.
pub struct MockReader {
    pub return_would_block_when_empty: bool,
    pub data: Vec<Vec<u8>>,
}

impl MockReader {
    pub fn from_strs(data: Vec<&str>) -> MockReader {
        MockReader::from_bytes(data.into_iter().map(str::as_bytes).collect())
    }

    pub fn from_bytes(data: Vec<&[u8]>) -> MockReader {
        MockReader { data: data.into_iter().map(<[u8]>::to_vec).collect(), return_would_block_when_empty: false }
    }
}

impl Read for MockReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.data.is_empty() {
            return match self.return_would_block_when_empty {
                true => Err(ErrorKind::WouldBlock.into()),
                false => Ok(0)
            };
        }

        let fragment = &mut self.data[0];
        let amount = min(buf.len(), fragment.len());
        buf[..amount].copy_from_slice(&fragment[..amount]);
        fragment.drain(..amount);

        if fragment.is_empty() {
            self.data.remove(0);
        }
        Ok(amount)
    }
}

/// Serves the given fragments, then repeats a byte sequence forever. Stands in for a server that
/// never stops sending.
pub struct EndlessMockReader {
    finite: MockReader,
    repeated: VecDeque<u8>,
}

impl EndlessMockReader {
    pub fn from_bytes(finite_data: Vec<&[u8]>, sequence: &[u8]) -> EndlessMockReader {
        EndlessMockReader { finite: MockReader::from_bytes(finite_data), repeated: sequence.iter().copied().collect() }
    }
}

impl Read for EndlessMockReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.finite.data.is_empty() {
            return self.finite.read(buf);
        }

        let amount = min(buf.len(), self.repeated.len());
        for byte in buf.iter_mut().take(amount) {
            let next = self.repeated.pop_front().unwrap_or_default();
            *byte = next;
            self.repeated.push_back(next);
        }
        Ok(amount)
    }
}

/// Records everything written. With a budget set, accepts only that many bytes before returning
/// WouldBlock, like a socket whose send buffer is full.
pub struct MockWriter {
    pub written: Vec<u8>,
    pub flushes: usize,
    pub budget: Option<usize>,
}

impl MockWriter {
    pub fn new() -> MockWriter {
        MockWriter { written: vec![], flushes: 0, budget: None }
    }

    pub fn with_budget(budget: usize) -> MockWriter {
        MockWriter { budget: Some(budget), ..MockWriter::new() }
    }

    /// Everything written so far, flushed or not.
    pub fn all_bytes(&self) -> Vec<u8> {
        self.written.clone()
    }
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let amount = match self.budget {
            Some(0) => return Err(ErrorKind::WouldBlock.into()),
            Some(budget) => min(budget, buf.len()),
            None => buf.len()
        };
        if let Some(budget) = self.budget.as_mut() {
            *budget -= amount;
        }
        self.written.extend_from_slice(&buf[..amount]);
        Ok(amount)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{ErrorKind, Read, Write};

    use crate::util::mock::{EndlessMockReader, MockReader, MockWriter};

    fn read(reader: &mut impl Read, buf_size: usize) -> String {
        let mut buf = vec![0u8; buf_size];
        let len = reader.read(&mut buf).unwrap();
        String::from_utf8_lossy(&buf[..len]).to_string()
    }

    #[test]
    fn reader_blocks_when_drained() {
        let mut reader = MockReader::from_strs(vec!["HTTP/1.1", " 200"]);
        reader.return_would_block_when_empty = true;

        assert_eq!(read(&mut reader, 4), "HTTP");
        assert_eq!(read(&mut reader, 100), "/1.1");
        assert_eq!(read(&mut reader, 100), " 200");
        assert_eq!(reader.read(&mut [0u8; 8]).unwrap_err().kind(), ErrorKind::WouldBlock);
    }

    #[test]
    fn endless_reader_repeats() {
        let mut reader = EndlessMockReader::from_bytes(vec![b"head\n"], b"{}\n");

        assert_eq!(read(&mut reader, 10), "head\n");
        assert_eq!(read(&mut reader, 2), "{}");
        assert_eq!(read(&mut reader, 10), "\n{}");
        for _ in 0..100 {
            assert_eq!(read(&mut reader, 3), "\n{}");
        }
    }

    #[test]
    fn writer_budget() {
        let mut writer = MockWriter::with_budget(3);
        assert_eq!(writer.write(b"hello").unwrap(), 3);
        assert_eq!(writer.write(b"lo").unwrap_err().kind(), ErrorKind::WouldBlock);
        writer.flush().unwrap();
        assert_eq!(writer.all_bytes(), b"hel");
        assert_eq!(writer.flushes, 1);
    }
}
